//! Process-wide certificate authority singleton.
//!
//! Lazily constructed on first use; the lock exists only to serialize
//! signing/verification on the underlying primitive, not to guard any
//! subsequently-mutated state; the key pair never changes after init.

use std::sync::{Mutex, OnceLock};

use hivecom_crypto::{Dilithium3Signer, SignatureKeyPair, Signer};

use crate::certificate::Certificate;

const ISSUER_NAME: &str = "HiveCom::CertificateAuthority";

struct CaState {
    signer: Dilithium3Signer,
    keys: SignatureKeyPair,
}

static CA: OnceLock<Mutex<CaState>> = OnceLock::new();

fn ca() -> &'static Mutex<CaState> {
    CA.get_or_init(|| {
        let signer = Dilithium3Signer::new();
        let keys = signer.keygen().expect("certificate authority root key generation failed");
        Mutex::new(CaState { signer, keys })
    })
}

/// Mint a certificate for `public_key`, signed by the CA's root key.
///
/// Fills in `version=1`, `serial="1"`, fixed issuer name, `now`
/// timestamp.
pub fn mint(public_key: &[u8]) -> Certificate {
    let guard = ca().lock().expect("certificate authority lock poisoned");
    Certificate::mint(1, "1", ISSUER_NAME, public_key, &guard.keys.secret_key, &guard.signer)
}

/// Parse and verify `text` against the CA's own public key.
pub fn parse(text: &str) -> Certificate {
    let guard = ca().lock().expect("certificate authority lock poisoned");
    Certificate::parse(text, &guard.keys.public_key, &guard.signer)
}

/// The CA's public key, for callers that need to embed it (e.g. test setup
/// that wants to build a certificate by hand).
pub fn public_key() -> Vec<u8> {
    let guard = ca().lock().expect("certificate authority lock poisoned");
    guard.keys.public_key.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_certificates_parse_as_valid() {
        let public_key = vec![3u8; hivecom_crypto::sizes::KEM_PUBLIC_KEY_SIZE];
        let cert = mint(&public_key);
        let parsed = parse(&cert.to_text());
        assert!(parsed.is_valid);
        assert_eq!(parsed.public_key, public_key);
    }

    #[test]
    fn tampered_public_key_byte_invalidates() {
        let public_key = vec![3u8; hivecom_crypto::sizes::KEM_PUBLIC_KEY_SIZE];
        let cert = mint(&public_key);
        let mut text = cert.to_text();
        // Flip a byte inside the base64(public_key) line (line index 4).
        let mut lines: Vec<String> = text.lines().map(String::from).collect();
        let mut chars: Vec<char> = lines[4].chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        lines[4] = chars.into_iter().collect();
        text = lines.join("\n") + "\n";

        let parsed = parse(&text);
        assert!(!parsed.is_valid);
    }
}
