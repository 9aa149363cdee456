//! ML-DSA (Dilithium3) digital signatures, the reference signature primitive.

use oqs::sig;

use crate::error::{CryptoError, CryptoResult};
use crate::kem::{ensure_liboqs_init, map_oqs_error};
use crate::sizes::{SIGNATURE_PUBLIC_KEY_SIZE, SIGNATURE_SECRET_KEY_SIZE, SIGNATURE_SIZE};

/// A generated signing key pair.
#[derive(Clone)]
pub struct SignatureKeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
}

/// Abstract signature capability.
pub trait Signer: Send + Sync {
    fn keygen(&self) -> CryptoResult<SignatureKeyPair>;
    fn sign(&self, secret_key: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>>;
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()>;
}

/// Dilithium3 signatures, backed by liboqs via the `oqs` crate.
pub struct Dilithium3Signer;

impl Dilithium3Signer {
    pub fn new() -> Self {
        ensure_liboqs_init();
        Self
    }

    fn instantiate(&self) -> CryptoResult<sig::Sig> {
        sig::Sig::new(sig::Algorithm::Dilithium3).map_err(|err| map_oqs_error("sig::new", err))
    }
}

impl Default for Dilithium3Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for Dilithium3Signer {
    fn keygen(&self) -> CryptoResult<SignatureKeyPair> {
        let sig = self.instantiate()?;
        let (public_key, secret_key) = sig.keypair().map_err(|err| map_oqs_error("sig::keypair", err))?;
        let public_key = public_key.into_vec();
        let secret_key = secret_key.into_vec();
        debug_assert_eq!(public_key.len(), SIGNATURE_PUBLIC_KEY_SIZE);
        debug_assert_eq!(secret_key.len(), SIGNATURE_SECRET_KEY_SIZE);
        Ok(SignatureKeyPair { public_key, secret_key })
    }

    fn sign(&self, secret_key: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>> {
        let sig = self.instantiate()?;
        let sk_ref = sig
            .secret_key_from_bytes(secret_key)
            .ok_or(CryptoError::Primitive("signature secret key length mismatch"))?;
        let signature = sig
            .sign(message, sk_ref)
            .map_err(|err| map_oqs_error("sig::sign", err))?;
        let signature = signature.into_vec();
        debug_assert_eq!(signature.len(), SIGNATURE_SIZE);
        Ok(signature)
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        let sig = self.instantiate()?;
        let pk_ref = sig
            .public_key_from_bytes(public_key)
            .ok_or(CryptoError::Primitive("signature public key length mismatch"))?;
        let sig_ref = sig
            .signature_from_bytes(signature)
            .ok_or(CryptoError::Primitive("signature length mismatch"))?;
        sig.verify(message, sig_ref, pk_ref)
            .map_err(|_err| CryptoError::Primitive("signature verification failed"))
    }
}
