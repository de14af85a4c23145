//! AES-256-GCM encryption for sealed storage entries.
//!
//! Each write is encrypted with a fresh nonce. The seal key must be 32 bytes
//! (256 bits) and is supplied base64-encoded from the environment at startup.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Size of the seal key in bytes (256 bits)
const KEY_SIZE: usize = 32;

/// Size of the nonce in bytes (96 bits, standard for GCM)
const NONCE_SIZE: usize = 12;

/// Decodes a base64 seal key and checks it is exactly 32 bytes.
pub fn validate_key(key_base64: &str) -> Result<Vec<u8>> {
    let key_bytes = BASE64
        .decode(key_base64.trim())
        .context("Failed to decode base64 seal key")?;

    if key_bytes.len() != KEY_SIZE {
        return Err(anyhow!(
            "Seal key must be {} bytes (256 bits), got {} bytes",
            KEY_SIZE,
            key_bytes.len()
        ));
    }

    Ok(key_bytes)
}

/// Encrypts `plaintext` with a random nonce.
///
/// Returns `(ciphertext, nonce)`, both base64-encoded.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<(String, String)> {
    let cipher = cipher(key)?;

    // Never reuse a nonce under the same key.
    let nonce_bytes = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext_bytes = cipher
        .encrypt(&nonce_bytes, plaintext)
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    Ok((BASE64.encode(ciphertext_bytes), BASE64.encode(nonce_bytes)))
}

/// Decrypts a `(ciphertext, nonce)` pair produced by [`encrypt`].
///
/// Fails on a wrong key, a wrong nonce, or tampered data.
pub fn decrypt(ciphertext: &str, nonce: &str, key: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher(key)?;

    let ciphertext_bytes = BASE64
        .decode(ciphertext)
        .context("Failed to decode ciphertext")?;
    let nonce_bytes = BASE64.decode(nonce).context("Failed to decode nonce")?;

    if nonce_bytes.len() != NONCE_SIZE {
        return Err(anyhow!(
            "Invalid nonce size: expected {}, got {}",
            NONCE_SIZE,
            nonce_bytes.len()
        ));
    }

    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext_bytes.as_ref())
        .map_err(|e| anyhow!("Decryption failed (wrong key or corrupted data): {}", e))
}

fn cipher(key: &[u8]) -> Result<Aes256Gcm> {
    if key.len() != KEY_SIZE {
        return Err(anyhow!("Seal key must be {} bytes", KEY_SIZE));
    }
    Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(validate_key(&BASE64.encode([0u8; 32])).is_ok());
        assert!(validate_key(&BASE64.encode([0u8; 16])).is_err());
        assert!(validate_key(&BASE64.encode([0u8; 64])).is_err());
        assert!(validate_key("not-valid-base64!@#$").is_err());
    }

    #[test]
    fn test_sealed_config_document_decrypts() {
        let key = [7u8; 32];
        let document = br#"{"api_token":"tok-123"}"#;

        let (ciphertext, nonce) = encrypt(document, &key).expect("Encryption failed");
        assert!(!ciphertext.contains("tok-123"));

        let opened = decrypt(&ciphertext, &nonce, &key).expect("Decryption failed");
        assert_eq!(opened, document);
    }

    #[test]
    fn test_nonce_is_fresh_per_write() {
        let key = [0u8; 32];
        let (c1, n1) = encrypt(b"same", &key).unwrap();
        let (c2, n2) = encrypt(b"same", &key).unwrap();
        assert_ne!(n1, n2);
        assert_ne!(c1, c2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let (ciphertext, nonce) = encrypt(b"secret", &[0u8; 32]).unwrap();
        assert!(decrypt(&ciphertext, &nonce, &[1u8; 32]).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = [0u8; 32];
        let (mut ciphertext, nonce) = encrypt(b"secret", &key).unwrap();
        ciphertext.push('X');
        assert!(decrypt(&ciphertext, &nonce, &key).is_err());
    }
}
