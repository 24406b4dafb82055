//! Authentication Types
//!
//! Descriptor telling the dispatch layer that a request must be signed.

use secrecy::SecretString;
use std::sync::Arc;

use crate::token::PrivateTokenData;

/// Factors a signature is computed with.
#[derive(Clone, Debug, Default)]
pub struct SignatureFactors {
    /// Use the possession factor (device key).
    pub possession: bool,
    /// Knowledge factor: the user's password or PIN.
    pub password: Option<SecretString>,
    /// Use the biometry factor.
    pub biometry: bool,
}

impl SignatureFactors {
    /// Possession factor only.
    pub fn possession() -> Self {
        Self {
            possession: true,
            ..Default::default()
        }
    }

    /// Possession and knowledge factors.
    pub fn possession_with_password(password: impl Into<String>) -> Self {
        Self {
            possession: true,
            password: Some(SecretString::new(password.into())),
            biometry: false,
        }
    }

    /// Possession and biometry factors.
    pub fn possession_with_biometry() -> Self {
        Self {
            possession: true,
            password: None,
            biometry: true,
        }
    }

    /// Returns true if no factor is selected.
    pub fn is_empty(&self) -> bool {
        !self.possession && self.password.is_none() && !self.biometry
    }

    /// Signature type label, e.g. `possession_knowledge`.
    pub fn label(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if self.possession {
            parts.push("possession");
        }
        if self.password.is_some() {
            parts.push("knowledge");
        }
        if self.biometry {
            parts.push("biometry");
        }
        parts.join("_")
    }
}

/// Authentication descriptor attached to a signed request.
#[derive(Clone, Debug, Default)]
pub struct Authentication {
    /// Access token the request is signed with, if any.
    pub credential: Option<Arc<PrivateTokenData>>,
    /// Signing policy.
    pub factors: SignatureFactors,
}

impl Authentication {
    /// Sign with the given factors.
    pub fn new(factors: SignatureFactors) -> Self {
        Self {
            credential: None,
            factors,
        }
    }

    /// Sign with an access token, using the possession factor.
    pub fn with_token(token: Arc<PrivateTokenData>) -> Self {
        Self {
            credential: Some(token),
            factors: SignatureFactors::possession(),
        }
    }
}
