//! At-rest encryption of secrets stored in the configuration file
//!
//! Session tokens and API keys written to `config.yaml` are stored as
//! `encrypted:BASE64`. The AES-256-GCM key is derived from the machine id,
//! so an encrypted configuration file only decrypts on the machine that
//! wrote it. Plain values are still accepted when reading.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::Engine;
use sha2::{Digest, Sha256};

/// Prefix identifying encrypted values
const ENCRYPTED_PREFIX: &str = "encrypted:";

const KEY_SALT: &[u8] = b"choirportal-config-encryption-v1";
const NONCE_SALT: &[u8] = b"choirportal-nonce-v1";

/// Reads the machine id used as key material
///
/// On Linux, uses `/etc/machine-id` or `/var/lib/dbus/machine-id`.
/// On macOS, uses `ioreg -d2 -c IOPlatformExpertDevice`.
/// On Windows, uses `wmic csproduct get UUID`.
fn get_machine_id() -> Result<String> {
    #[cfg(target_os = "linux")]
    {
        use std::fs;

        for candidate in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(candidate) {
                let id = id.trim();
                if !id.is_empty() {
                    return Ok(id.to_string());
                }
            }
        }

        Err(anyhow!("Failed to read machine-id"))
    }

    #[cfg(target_os = "macos")]
    {
        use std::process::Command;

        let output = Command::new("ioreg")
            .args(["-d2", "-c", "IOPlatformExpertDevice"])
            .output()?;
        let output_str = String::from_utf8_lossy(&output.stdout);

        // Line format: "IOPlatformUUID" = "XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX"
        output_str
            .lines()
            .filter(|line| line.contains("IOPlatformUUID"))
            .find_map(|line| line.split('"').nth(3).map(str::to_string))
            .ok_or_else(|| anyhow!("Failed to extract IOPlatformUUID from ioreg"))
    }

    #[cfg(target_os = "windows")]
    {
        use std::process::Command;

        let output = Command::new("wmic")
            .args(["csproduct", "get", "UUID"])
            .output()?;
        let output_str = String::from_utf8_lossy(&output.stdout);

        output_str
            .lines()
            .nth(1)
            .map(|uuid| uuid.trim().to_string())
            .ok_or_else(|| anyhow!("Failed to extract UUID from wmic"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        Err(anyhow!("Unsupported platform for machine id extraction"))
    }
}

/// Derives an AES-256 key from arbitrary key material
fn derive_key_from(material: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hasher.update(KEY_SALT);

    let result = hasher.finalize();
    let mut key = [0u8; 32];
    key.copy_from_slice(&result);
    key
}

fn machine_key() -> Result<[u8; 32]> {
    Ok(derive_key_from(&get_machine_id()?))
}

/// Encrypts `secret` with an explicit key
///
/// The nonce is derived from the secret so the same secret always produces
/// the same ciphertext and an unchanged value does not rewrite the file.
/// Encoded layout: nonce (12 bytes) followed by the ciphertext.
pub fn encrypt_with_key(secret: &str, key: &[u8; 32]) -> Result<String> {
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(NONCE_SALT);
    let nonce_hash = hasher.finalize();
    let nonce_bytes: [u8; 12] = nonce_hash[..12]
        .try_into()
        .map_err(|_| anyhow!("Nonce derivation failed"))?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, secret.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut combined = Vec::with_capacity(12 + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(format!(
        "{}{}",
        ENCRYPTED_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&combined)
    ))
}

/// Decrypts an `encrypted:BASE64` value with an explicit key
pub fn decrypt_with_key(encrypted: &str, key: &[u8; 32]) -> Result<String> {
    let base64_data = encrypted
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or_else(|| anyhow!("Invalid encrypted value format (missing prefix)"))?;

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!("Failed to create cipher: {}", e))?;

    let combined = base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| anyhow!("Invalid base64: {}", e))?;

    if combined.len() < 12 {
        return Err(anyhow!("Invalid ciphertext (too short)"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(12);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

/// Encrypts a secret with the machine-derived key
pub fn encrypt_secret(secret: &str) -> Result<String> {
    encrypt_with_key(secret, &machine_key()?)
}

/// Decrypts a secret with the machine-derived key
pub fn decrypt_secret(encrypted: &str) -> Result<String> {
    decrypt_with_key(encrypted, &machine_key()?)
}

/// Returns `true` if the value carries the `encrypted:` prefix
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Returns the clear value, decrypting it when needed
pub fn reveal_secret(value: &str) -> Result<String> {
    if is_encrypted(value) {
        decrypt_secret(value)
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        derive_key_from("test-machine")
    }

    #[test]
    fn test_encrypt_decrypt() {
        let token = "eyJhbGciOiJIUzI1NiJ9.session";

        let encrypted = encrypt_with_key(token, &test_key()).unwrap();
        assert!(encrypted.starts_with(ENCRYPTED_PREFIX));
        assert_ne!(encrypted, token);

        let decrypted = decrypt_with_key(&encrypted, &test_key()).unwrap();
        assert_eq!(decrypted, token);
    }

    #[test]
    fn test_encryption_is_deterministic() {
        let a = encrypt_with_key("same", &test_key()).unwrap();
        let b = encrypt_with_key("same", &test_key()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt_with_key("secret", &test_key()).unwrap();
        let other = derive_key_from("another-machine");
        assert!(decrypt_with_key(&encrypted, &other).is_err());
    }

    #[test]
    fn test_missing_prefix_is_rejected() {
        assert!(decrypt_with_key("SGVsbG8=", &test_key()).is_err());
    }

    #[test]
    fn test_is_encrypted() {
        assert!(is_encrypted("encrypted:SGVsbG8="));
        assert!(!is_encrypted("plaintext"));
        assert!(!is_encrypted(""));
    }

    #[test]
    fn test_reveal_plain_value() {
        assert_eq!(reveal_secret("plaintext").unwrap(), "plaintext");
    }
}
