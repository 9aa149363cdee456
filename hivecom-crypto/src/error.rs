use thiserror::Error;

/// Errors surfaced by the primitive wrappers.
///
/// Every variant here corresponds to a "primitive failure" in the node's
/// error taxonomy: KEM/signature engine errors, AEAD tamper detection, and
/// malformed Base64 input.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("post-quantum primitive failed: {0}")]
    Primitive(&'static str),

    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("AEAD open/seal failed")]
    Aead,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
