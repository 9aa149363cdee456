//! Fixed sizes recognized by the implementation.

pub const KEM_PUBLIC_KEY_SIZE: usize = 1184;
pub const KEM_SECRET_KEY_SIZE: usize = 2400;
pub const KEM_CIPHERTEXT_SIZE: usize = 1088;
pub const KEM_SHARED_SECRET_SIZE: usize = 32;

pub const SIGNATURE_SIZE: usize = 3293;
pub const SIGNATURE_PUBLIC_KEY_SIZE: usize = 1952;
pub const SIGNATURE_SECRET_KEY_SIZE: usize = 4000;

pub const AEAD_BLOCK_SIZE: usize = 32;

/// Certificate validity window, in months.
pub const CERTIFICATE_VALIDITY_MONTHS: i64 = 6;
