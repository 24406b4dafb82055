//! Token Data
//!
//! Private data of an access token and its compact storage encoding.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// Required length of a token secret, in bytes.
pub const SECRET_LENGTH: usize = 16;

const FIELD_SEPARATOR: char = ',';

// Padded on encode, padding optional on decode. The output never wraps.
const TOKEN_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Private data of an access token: symbolic name, server-issued identifier
/// and the shared secret.
///
/// A value is never modified after construction. Callers must check
/// [`PrivateTokenData::is_valid`] before using the secret; the dispatch layer
/// and [`TokenStore`](crate::token::TokenStore) refuse invalid data.
///
/// Equality only holds between valid records, so an invalid record is not
/// equal to a copy of itself.
#[derive(Clone)]
pub struct PrivateTokenData {
    name: String,
    identifier: String,
    secret: Vec<u8>,
}

impl PrivateTokenData {
    /// Create token data. The result may be invalid.
    pub fn new(
        name: impl Into<String>,
        identifier: impl Into<String>,
        secret: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Token's symbolic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Token's identifier, issued by the server.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Token's secret.
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Returns true when name and identifier are non-empty and the secret
    /// has exactly [`SECRET_LENGTH`] bytes.
    pub fn is_valid(&self) -> bool {
        self.secret.len() == SECRET_LENGTH && !self.identifier.is_empty() && !self.name.is_empty()
    }

    /// Encode the data for persistent storage.
    ///
    /// The format is a single ASCII line
    /// `<identifier>,<base64(secret)>,<base64(utf8(name))>`.
    /// Returns `None` for invalid data.
    pub fn serialize(&self) -> Option<Vec<u8>> {
        if !self.is_valid() {
            return None;
        }
        let secret_b64 = TOKEN_BASE64.encode(&self.secret);
        let name_b64 = TOKEN_BASE64.encode(self.name.as_bytes());
        let line = format!(
            "{}{sep}{}{sep}{}",
            self.identifier,
            secret_b64,
            name_b64,
            sep = FIELD_SEPARATOR
        );
        // Identifiers come from the server and are expected to be ASCII.
        if !line.is_ascii() {
            return None;
        }
        Some(line.into_bytes())
    }

    /// Decode data produced by [`PrivateTokenData::serialize`].
    ///
    /// Returns `None` when the input is not ASCII, does not split into exactly
    /// three comma separated fields, fails to decode, or decodes into invalid
    /// data.
    pub fn deserialize(data: &[u8]) -> Option<Self> {
        if !data.is_ascii() {
            return None;
        }
        let line = std::str::from_utf8(data).ok()?;

        let components: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        let [identifier, secret_b64, name_b64] = components.as_slice() else {
            return None;
        };

        let secret = TOKEN_BASE64.decode(secret_b64).ok()?;
        let name = String::from_utf8(TOKEN_BASE64.decode(name_b64).ok()?).ok()?;

        let token = Self::new(name, *identifier, secret);
        token.is_valid().then_some(token)
    }
}

impl PartialEq for PrivateTokenData {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.is_valid()
            && other.is_valid()
            && self.name == other.name
            && self.identifier == other.identifier
            && self.secret == other.secret
    }
}

impl std::fmt::Debug for PrivateTokenData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateTokenData")
            .field("name", &self.name)
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
