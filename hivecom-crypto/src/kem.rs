//! ML-KEM (Kyber768) key encapsulation, the reference KEM primitive.

use std::sync::Once;

use oqs::kem;

use crate::error::{CryptoError, CryptoResult};
use crate::sizes::{KEM_CIPHERTEXT_SIZE, KEM_PUBLIC_KEY_SIZE, KEM_SECRET_KEY_SIZE, KEM_SHARED_SECRET_SIZE};

pub(crate) fn ensure_liboqs_init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        oqs::init();
    });
}

/// A generated KEM key pair.
#[derive(Clone)]
pub struct KemKeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
}

/// Ciphertext plus shared secret produced by encapsulation.
#[derive(Clone)]
pub struct KemEncapsulation {
    pub ciphertext: Vec<u8>,
    pub shared_secret: Vec<u8>,
}

/// Abstract KEM capability. The node and certificate authority depend only
/// on this trait, never on a concrete algorithm.
pub trait Kem: Send + Sync {
    fn keygen(&self) -> CryptoResult<KemKeyPair>;
    fn encapsulate(&self, public_key: &[u8]) -> CryptoResult<KemEncapsulation>;
    fn decapsulate(&self, secret_key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;
}

pub(crate) fn map_oqs_error(op: &'static str, _err: oqs::Error) -> CryptoError {
    CryptoError::Primitive(op)
}

/// Kyber768 KEM, backed by liboqs via the `oqs` crate.
pub struct Kyber768Kem;

impl Kyber768Kem {
    pub fn new() -> Self {
        ensure_liboqs_init();
        Self
    }

    fn instantiate(&self) -> CryptoResult<kem::Kem> {
        kem::Kem::new(kem::Algorithm::Kyber768).map_err(|err| map_oqs_error("kem::new", err))
    }
}

impl Default for Kyber768Kem {
    fn default() -> Self {
        Self::new()
    }
}

impl Kem for Kyber768Kem {
    fn keygen(&self) -> CryptoResult<KemKeyPair> {
        let kem = self.instantiate()?;
        let (public_key, secret_key) = kem.keypair().map_err(|err| map_oqs_error("kem::keypair", err))?;
        let public_key = public_key.into_vec();
        let secret_key = secret_key.into_vec();
        debug_assert_eq!(public_key.len(), KEM_PUBLIC_KEY_SIZE);
        debug_assert_eq!(secret_key.len(), KEM_SECRET_KEY_SIZE);
        Ok(KemKeyPair { public_key, secret_key })
    }

    fn encapsulate(&self, public_key: &[u8]) -> CryptoResult<KemEncapsulation> {
        if public_key.len() != KEM_PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidLength {
                expected: KEM_PUBLIC_KEY_SIZE,
                got: public_key.len(),
            });
        }
        let kem = self.instantiate()?;
        let pk_ref = kem
            .public_key_from_bytes(public_key)
            .ok_or(CryptoError::Primitive("kem public key length mismatch"))?;
        let (ciphertext, shared_secret) = kem
            .encapsulate(pk_ref)
            .map_err(|err| map_oqs_error("kem::encapsulate", err))?;
        let ciphertext = ciphertext.into_vec();
        let shared_secret = shared_secret.into_vec();
        debug_assert_eq!(ciphertext.len(), KEM_CIPHERTEXT_SIZE);
        debug_assert_eq!(shared_secret.len(), KEM_SHARED_SECRET_SIZE);
        Ok(KemEncapsulation { ciphertext, shared_secret })
    }

    fn decapsulate(&self, secret_key: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let kem = self.instantiate()?;
        let sk_ref = kem
            .secret_key_from_bytes(secret_key)
            .ok_or(CryptoError::Primitive("kem secret key length mismatch"))?;
        let ct_ref = kem
            .ciphertext_from_bytes(ciphertext)
            .ok_or(CryptoError::Primitive("kem ciphertext length mismatch"))?;
        let shared_secret = kem
            .decapsulate(sk_ref, ct_ref)
            .map_err(|err| map_oqs_error("kem::decapsulate", err))?;
        Ok(shared_secret.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encapsulation_and_decapsulation_agree() {
        let kem = Kyber768Kem::new();
        let pair = kem.keygen().unwrap();
        let encapsulation = kem.encapsulate(&pair.public_key).unwrap();
        let recovered = kem.decapsulate(&pair.secret_key, &encapsulation.ciphertext).unwrap();
        assert_eq!(recovered, encapsulation.shared_secret);
    }

    #[test]
    fn rejects_wrong_size_public_key() {
        let kem = Kyber768Kem::new();
        let err = kem.encapsulate(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidLength { .. }));
    }
}
