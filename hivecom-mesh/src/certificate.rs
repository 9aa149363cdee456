//! Signed identity record binding an issuer, serial, timestamp and KEM
//! public key.

use std::time::{SystemTime, UNIX_EPOCH};

use hivecom_crypto::sizes::CERTIFICATE_VALIDITY_MONTHS;
use hivecom_crypto::{b64, Signer};

/// Certificate validity window, in seconds, derived from
/// `CERTIFICATE_VALIDITY_MONTHS` (approximated as 30-day months, matching the
/// reference implementation's calendar-month check closely enough for the
/// boundary tests).
pub const VALIDITY_SECONDS: u64 = CERTIFICATE_VALIDITY_MONTHS as u64 * 30 * 24 * 60 * 60;

/// Current time as nanoseconds since the Unix epoch, decimal.
pub fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_nanos() as u64
}

#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    pub version: u32,
    pub serial: String,
    pub issuer_name: String,
    /// Nanoseconds since epoch, decimal, as text (matches the wire format).
    pub timestamp: String,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
    pub is_valid: bool,
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("version", &self.version)
            .field("serial", &self.serial)
            .field("issuer_name", &self.issuer_name)
            .field("timestamp", &self.timestamp)
            .field("public_key", &format!("{}B", self.public_key.len()))
            .field("signature", &format!("{}B", self.signature.len()))
            .field("is_valid", &self.is_valid)
            .finish()
    }
}

impl Certificate {
    fn invalid() -> Self {
        Self {
            version: 0,
            serial: String::new(),
            issuer_name: String::new(),
            timestamp: String::new(),
            public_key: Vec::new(),
            signature: Vec::new(),
            is_valid: false,
        }
    }

    /// Build the five-line region the signature covers (trailing `\n`
    /// included on each line).
    fn signed_region(version: u32, serial: &str, issuer_name: &str, timestamp: &str, public_key_b64: &str) -> String {
        let mut region = String::new();
        region.push_str(&version.to_string());
        region.push('\n');
        region.push_str(serial);
        region.push('\n');
        region.push_str(issuer_name);
        region.push('\n');
        region.push_str(timestamp);
        region.push('\n');
        region.push_str(public_key_b64);
        region.push('\n');
        region
    }

    /// Mint a new, self-consistent certificate, signing it with `ca_secret_key`.
    pub fn mint(
        version: u32,
        serial: &str,
        issuer_name: &str,
        public_key: &[u8],
        ca_secret_key: &[u8],
        signer: &dyn Signer,
    ) -> Self {
        let timestamp = now_ns().to_string();
        let public_key_b64 = b64::encode(public_key);
        let region = Self::signed_region(version, serial, issuer_name, &timestamp, &public_key_b64);
        let signature = signer
            .sign(ca_secret_key, region.as_bytes())
            .expect("certificate authority signing primitive failed");

        Self {
            version,
            serial: serial.to_string(),
            issuer_name: issuer_name.to_string(),
            timestamp,
            public_key: public_key.to_vec(),
            signature,
            is_valid: true,
        }
    }

    /// Render the six-line wire form.
    pub fn to_text(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n",
            self.version,
            self.serial,
            self.issuer_name,
            self.timestamp,
            b64::encode(&self.public_key),
            b64::encode(&self.signature),
        )
    }

    /// Parse and verify a certificate against the CA's public key.
    ///
    /// Never errors: a structurally malformed, tampered, or expired
    /// certificate comes back with `is_valid = false` rather than a `Result`:
    /// a certificate whose either check fails has `is_valid = false`.
    pub fn parse(text: &str, ca_public_key: &[u8], signer: &dyn Signer) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        if lines.len() < 6 {
            tracing::warn!("malformed certificate: fewer than 6 lines");
            return Self::invalid();
        }

        let version = match lines[0].parse::<u32>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!("malformed certificate: bad version field");
                return Self::invalid();
            }
        };
        let serial = lines[1].to_string();
        let issuer_name = lines[2].to_string();
        let timestamp = lines[3].to_string();

        let public_key = match b64::decode(lines[4]) {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::warn!("malformed certificate: bad public key encoding");
                return Self::invalid();
            }
        };
        let signature = match b64::decode(lines[5]) {
            Ok(bytes) => bytes,
            Err(_) => {
                tracing::warn!("malformed certificate: bad signature encoding");
                return Self::invalid();
            }
        };

        let region = Self::signed_region(version, &serial, &issuer_name, &timestamp, lines[4]);
        let signature_ok = signer.verify(ca_public_key, region.as_bytes(), &signature).is_ok();
        let period_ok = is_period_valid(&timestamp);

        Self {
            version,
            serial,
            issuer_name,
            timestamp,
            public_key,
            signature,
            is_valid: signature_ok && period_ok,
        }
    }
}

fn is_period_valid(timestamp: &str) -> bool {
    let Ok(issued_ns) = timestamp.parse::<u64>() else {
        return false;
    };
    let now = now_ns();
    let age_secs = now.saturating_sub(issued_ns) / 1_000_000_000;
    age_secs <= VALIDITY_SECONDS
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivecom_crypto::Dilithium3Signer;

    fn signer() -> Dilithium3Signer {
        Dilithium3Signer::new()
    }

    #[test]
    fn mint_then_parse_round_trips() {
        let dsa = signer();
        let ca_pair = dsa.keygen().unwrap();
        let public_key = vec![9u8; hivecom_crypto::sizes::KEM_PUBLIC_KEY_SIZE];

        let cert = Certificate::mint(1, "1", "HiveCom::CertificateAuthority", &public_key, &ca_pair.secret_key, &dsa);
        let parsed = Certificate::parse(&cert.to_text(), &ca_pair.public_key, &dsa);

        assert!(parsed.is_valid);
        assert_eq!(parsed.public_key, public_key);
    }

    #[test]
    fn tampered_signature_region_is_invalid() {
        let dsa = signer();
        let ca_pair = dsa.keygen().unwrap();
        let public_key = vec![9u8; hivecom_crypto::sizes::KEM_PUBLIC_KEY_SIZE];

        let cert = Certificate::mint(1, "1", "HiveCom::CertificateAuthority", &public_key, &ca_pair.secret_key, &dsa);
        let mut text = cert.to_text();
        text = text.replacen("HiveCom::CertificateAuthority", "HiveCom::Impostor", 1);

        let parsed = Certificate::parse(&text, &ca_pair.public_key, &dsa);
        assert!(!parsed.is_valid);
    }

    #[test]
    fn expired_timestamp_is_invalid() {
        let dsa = signer();
        let ca_pair = dsa.keygen().unwrap();
        let public_key = vec![9u8; hivecom_crypto::sizes::KEM_PUBLIC_KEY_SIZE];

        let ancient_ns = now_ns() - (VALIDITY_SECONDS + 1) * 1_000_000_000;
        let public_key_b64 = hivecom_crypto::b64::encode(&public_key);
        let region = Certificate::signed_region(1, "1", "HiveCom::CertificateAuthority", &ancient_ns.to_string(), &public_key_b64);
        let signature = dsa.sign(&ca_pair.secret_key, region.as_bytes()).unwrap();
        let cert = Certificate {
            version: 1,
            serial: "1".into(),
            issuer_name: "HiveCom::CertificateAuthority".into(),
            timestamp: ancient_ns.to_string(),
            public_key,
            signature,
            is_valid: true,
        };

        let parsed = Certificate::parse(&cert.to_text(), &ca_pair.public_key, &dsa);
        assert!(!parsed.is_valid);
    }

    #[test]
    fn too_few_lines_is_invalid() {
        let dsa = signer();
        let ca_pair = dsa.keygen().unwrap();
        let parsed = Certificate::parse("1\n2\n3\n", &ca_pair.public_key, &dsa);
        assert!(!parsed.is_valid);
    }
}
