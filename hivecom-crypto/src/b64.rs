//! Base64 text encoding, standard alphabet.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CryptoResult;

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn decode(text: &str) -> CryptoResult<Vec<u8>> {
    Ok(STANDARD.decode(text.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let data = b"hivecom certificate bytes";
        assert_eq!(decode(&encode(data)).unwrap(), data);
    }

    #[test]
    fn rejects_invalid_text() {
        assert!(decode("not-valid-base64!!").is_err());
    }
}
