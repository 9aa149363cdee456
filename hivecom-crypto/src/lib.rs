//! Post-quantum primitives treated as external collaborators by the mesh
//! layer: KEM, signatures, AEAD, Base64 and SHA-256. Every concrete
//! algorithm sits behind a small trait so `hivecom-mesh` never depends on
//! liboqs or `aes-gcm` directly.

pub mod aead;
pub mod b64;
pub mod digest;
pub mod error;
pub mod kem;
pub mod signature;
pub mod sizes;

pub use error::{CryptoError, CryptoResult};
pub use kem::{Kem, KemEncapsulation, KemKeyPair, Kyber768Kem};
pub use signature::{Dilithium3Signer, SignatureKeyPair, Signer};
