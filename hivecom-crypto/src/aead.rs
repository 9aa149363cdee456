//! Session-level AEAD encryption.
//!
//! Key = the 32-byte KEM shared secret, IV and associated data are fixed
//! literals. Plaintext is zero-padded to the AEAD block size
//! before encryption; trailing padding is stripped on decryption by scanning
//! backwards for the first non-zero byte. This is a known weakness (a
//! plaintext that legitimately ends in zero bytes loses them) preserved for
//! compatibility with the reference design rather than fixed here.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{AesGcm, Aes256};

use crate::error::{CryptoError, CryptoResult};
use crate::sizes::AEAD_BLOCK_SIZE;

/// Fixed 128-bit IV used for every session.
pub const SESSION_IV: &[u8; 16] = b"0123456789012345";

/// Fixed associated data used for every session.
pub const SESSION_AAD: &[u8] = b"Hello World";

type NonceSize = aes_gcm::aead::consts::U16;
type Aes256Gcm16 = AesGcm<Aes256, NonceSize>;

fn pad_to_block(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    let remainder = padded.len() % AEAD_BLOCK_SIZE;
    if remainder != 0 {
        padded.resize(padded.len() + (AEAD_BLOCK_SIZE - remainder), 0);
    }
    padded
}

fn strip_padding(data: &[u8]) -> Vec<u8> {
    let mut end = data.len();
    while end > 0 && data[end - 1] == 0 {
        end -= 1;
    }
    data[..end].to_vec()
}

/// Encrypt `plaintext` under the session key, zero-padding to the AEAD
/// block size first.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm16::new_from_slice(key).map_err(|_| CryptoError::Aead)?;
    let nonce = GenericArray::from_slice(SESSION_IV);
    let padded = pad_to_block(plaintext);
    cipher
        .encrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: &padded,
                aad: SESSION_AAD,
            },
        )
        .map_err(|_| CryptoError::Aead)
}

/// Decrypt `ciphertext` under the session key and strip the zero padding.
pub fn decrypt(key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm16::new_from_slice(key).map_err(|_| CryptoError::Aead)?;
    let nonce = GenericArray::from_slice(SESSION_IV);
    let padded = cipher
        .decrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: ciphertext,
                aad: SESSION_AAD,
            },
        )
        .map_err(|_| CryptoError::Aead)?;
    Ok(strip_padding(&padded))
}
