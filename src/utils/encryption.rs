use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::Aes256Gcm;
use rand::RngCore;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;

type Nonce = [u8; 12];

const FORMAT_VERSION: u8 = 0x01;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Encryption failed: {0}")]
    Encryption(String),
    #[error("Decryption failed: {0}")]
    Decryption(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Base64 decode error: {0}")]
    Base64Decode(String),
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(String),
}

/// Parse a 64-char hex string into an AES-256 key
pub fn parse_key(key_hex: &str) -> Result<[u8; 32], CryptoError> {
    let key_bytes = hex::decode(key_hex.trim())
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    key_bytes.try_into().map_err(|_| {
        CryptoError::InvalidKey("Session key must be 32 bytes (64 hex characters)".to_string())
    })
}

/// Seal a session blob with AES256-GCM
/// Returns base64-encoded data: `[version_byte][nonce(12)][ciphertext]`
pub fn seal(plaintext: &str, key: &[u8; 32]) -> Result<String, CryptoError> {
    let cipher = Aes256Gcm::new(&(*key).into());

    let mut nonce_bytes: Nonce = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt((&nonce_bytes).into(), plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut sealed = Vec::with_capacity(1 + 12 + ciphertext.len());
    sealed.push(FORMAT_VERSION);
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(sealed))
}

/// Open a blob produced by [`seal`]
pub fn open(sealed_b64: &str, key: &[u8; 32]) -> Result<String, CryptoError> {
    let sealed = BASE64
        .decode(sealed_b64.trim())
        .map_err(|e| CryptoError::Base64Decode(e.to_string()))?;

    if sealed.len() < 13 {
        return Err(CryptoError::InvalidData(
            "Sealed data too short (need at least 1 + 12 bytes for version + nonce)".to_string(),
        ));
    }

    if sealed[0] != FORMAT_VERSION {
        return Err(CryptoError::InvalidData(format!(
            "Unsupported session format version: {}",
            sealed[0]
        )));
    }

    let nonce: Nonce = sealed[1..13]
        .try_into()
        .map_err(|_| CryptoError::InvalidData("Failed to extract nonce".to_string()))?;

    let cipher = Aes256Gcm::new(&(*key).into());
    let plaintext = cipher
        .decrypt((&nonce).into(), &sealed[13..])
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::Utf8Error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HEX: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    #[test]
    fn test_seal_open() {
        let key = parse_key(KEY_HEX).expect("key");
        let sealed = seal(r#"{"access_token":"t"}"#, &key).expect("seal");
        assert_eq!(open(&sealed, &key).expect("open"), r#"{"access_token":"t"}"#);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = parse_key(KEY_HEX).expect("key");
        let other = parse_key(&"ab".repeat(32)).expect("key");
        let sealed = seal("secret", &key).expect("seal");

        assert!(matches!(open(&sealed, &other), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(matches!(parse_key("abcd"), Err(CryptoError::InvalidKey(_))));
        assert!(matches!(parse_key("zz"), Err(CryptoError::InvalidKey(_))));
    }
}
