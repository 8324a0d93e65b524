/// Errors that can occur while establishing or ratcheting a session.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// Public key bytes were malformed or unusable for key agreement.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A parameter bundle was built without one of its required keys.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The requested protocol version is outside the configured range.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    /// A key derivation primitive failed.
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    /// Random number generation failed.
    #[error("Random number generation failed")]
    Random,
}

impl From<hkdf::InvalidLength> for Error {
    fn from(_: hkdf::InvalidLength) -> Self {
        Self::Crypto("HKDF output length exceeds 255 blocks".to_string())
    }
}

impl From<hmac::digest::InvalidLength> for Error {
    fn from(_: hmac::digest::InvalidLength) -> Self {
        Self::Crypto("HMAC key has an invalid length".to_string())
    }
}
