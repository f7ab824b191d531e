//! Sealed mappings
//!
//! The guard keeps no state between calls, so the caller carries the
//! mapping across the external call. When that trip goes through untrusted
//! hands (a browser, a queue, a cookie), seal the mapping first: the
//! envelope is AES-256-GCM ciphertext and only a holder of the key can open
//! it. Supports key rotation via key IDs.

use crate::error::{GuardError, Result};
use crate::mapping::Mapping;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Encrypted mapping envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedMapping {
    /// Identifies which key sealed the mapping
    pub key_id: String,

    /// Base64-encoded 96-bit nonce
    pub nonce: String,

    /// Base64-encoded ciphertext of the JSON mapping
    pub ciphertext: String,
}

/// Trait for sealing and opening mappings
pub trait MappingSealer: Send + Sync {
    /// Encrypt a mapping with the active key
    fn seal(&self, mapping: &Mapping) -> Result<SealedMapping>;

    /// Decrypt an envelope back into the mapping
    fn open(&self, sealed: &SealedMapping) -> Result<Mapping>;

    /// The key ID used for new seals
    fn active_key_id(&self) -> &str;
}

/// AES-256-GCM sealer with key rotation support
///
/// Seals with the active key, opens with any registered key.
pub struct Aes256GcmSealer {
    active_key_id: String,

    /// All registered keys (key_id → cipher)
    keys: RwLock<HashMap<String, Aes256Gcm>>,
}

impl Aes256GcmSealer {
    /// Create a sealer with a single 256-bit key
    pub fn new(key_id: impl Into<String>, key: &[u8; 32]) -> Self {
        let key_id = key_id.into();
        let mut keys = HashMap::new();
        keys.insert(key_id.clone(), Aes256Gcm::new(&(*key).into()));

        Self {
            active_key_id: key_id,
            keys: RwLock::new(keys),
        }
    }

    /// Register a key for opening envelopes sealed before a rotation
    pub fn add_key(&self, key_id: impl Into<String>, key: &[u8; 32]) -> Result<()> {
        let mut keys = self
            .keys
            .write()
            .map_err(|e| GuardError::Seal(format!("Failed to acquire key lock: {}", e)))?;
        keys.insert(key_id.into(), Aes256Gcm::new(&(*key).into()));
        Ok(())
    }

    /// Switch the active key; it must already be registered
    pub fn rotate_to(&mut self, key_id: &str) -> Result<()> {
        let keys = self
            .keys
            .read()
            .map_err(|e| GuardError::Seal(format!("Failed to acquire key lock: {}", e)))?;
        if !keys.contains_key(key_id) {
            return Err(GuardError::Seal(format!(
                "Key '{}' not registered, add it first",
                key_id
            )));
        }
        drop(keys);
        self.active_key_id = key_id.to_string();
        Ok(())
    }

    /// List all registered key IDs
    pub fn key_ids(&self) -> Vec<String> {
        self.keys
            .read()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl MappingSealer for Aes256GcmSealer {
    fn seal(&self, mapping: &Mapping) -> Result<SealedMapping> {
        let plaintext = serde_json::to_vec(mapping)?;

        let keys = self
            .keys
            .read()
            .map_err(|e| GuardError::Seal(format!("Failed to acquire key lock: {}", e)))?;
        let cipher = keys.get(&self.active_key_id).ok_or_else(|| {
            GuardError::Seal(format!("Active key '{}' not found", self.active_key_id))
        })?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| GuardError::Seal(format!("Encryption failed: {}", e)))?;

        Ok(SealedMapping {
            key_id: self.active_key_id.clone(),
            nonce: BASE64.encode(nonce),
            ciphertext: BASE64.encode(ciphertext),
        })
    }

    fn open(&self, sealed: &SealedMapping) -> Result<Mapping> {
        let keys = self
            .keys
            .read()
            .map_err(|e| GuardError::Seal(format!("Failed to acquire key lock: {}", e)))?;
        let cipher = keys.get(&sealed.key_id).ok_or_else(|| {
            GuardError::Seal(format!("Key '{}' not registered", sealed.key_id))
        })?;

        let nonce_bytes = BASE64
            .decode(&sealed.nonce)
            .map_err(|e| GuardError::Seal(format!("Invalid nonce encoding: {}", e)))?;
        if nonce_bytes.len() != 12 {
            return Err(GuardError::Seal(format!(
                "Invalid nonce length: {} bytes",
                nonce_bytes.len()
            )));
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = BASE64
            .decode(&sealed.ciphertext)
            .map_err(|e| GuardError::Seal(format!("Invalid ciphertext encoding: {}", e)))?;

        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|e| GuardError::Seal(format!("Decryption failed: {}", e)))?;

        serde_json::from_slice(&plaintext).map_err(Into::into)
    }

    fn active_key_id(&self) -> &str {
        &self.active_key_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        [0x42; 32]
    }

    fn test_key_2() -> [u8; 32] {
        [0x7A; 32]
    }

    fn sample_mapping() -> Mapping {
        [
            ("<THAI_ID_1>", "1234567890123"),
            ("<EMAIL_ADDRESS_1>", "somchai@example.co.th"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_seal_open() {
        let sealer = Aes256GcmSealer::new("key-1", &test_key());
        let sealed = sealer.seal(&sample_mapping()).unwrap();

        assert_eq!(sealed.key_id, "key-1");
        assert!(!sealed.ciphertext.contains("1234567890123"));
        assert_eq!(sealer.open(&sealed).unwrap(), sample_mapping());
    }

    #[test]
    fn test_envelope_json_shape() {
        let sealer = Aes256GcmSealer::new("key-1", &test_key());
        let sealed = sealer.seal(&sample_mapping()).unwrap();
        let json = serde_json::to_value(&sealed).unwrap();

        assert_eq!(json["keyId"], "key-1");
        assert!(json["nonce"].is_string());
        assert!(json["ciphertext"].is_string());
        assert!(!json.to_string().contains("somchai"));
    }

    #[test]
    fn test_key_rotation() {
        let mut sealer = Aes256GcmSealer::new("key-1", &test_key());
        let sealed_v1 = sealer.seal(&sample_mapping()).unwrap();

        sealer.add_key("key-2", &test_key_2()).unwrap();
        sealer.rotate_to("key-2").unwrap();
        assert_eq!(sealer.active_key_id(), "key-2");
        let sealed_v2 = sealer.seal(&sample_mapping()).unwrap();

        assert_eq!(sealed_v2.key_id, "key-2");
        assert_eq!(sealer.open(&sealed_v1).unwrap(), sample_mapping());
        assert_eq!(sealer.open(&sealed_v2).unwrap(), sample_mapping());

        let mut ids = sealer.key_ids();
        ids.sort();
        assert_eq!(ids, vec!["key-1", "key-2"]);
    }

    #[test]
    fn test_rotate_to_unknown_key_fails() {
        let mut sealer = Aes256GcmSealer::new("key-1", &test_key());
        assert!(sealer.rotate_to("nope").is_err());
        assert_eq!(sealer.active_key_id(), "key-1");
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let a = Aes256GcmSealer::new("key-1", &test_key());
        let b = Aes256GcmSealer::new("key-2", &test_key_2());
        b.add_key("key-1", &[0xFF; 32]).unwrap();

        let sealed = a.seal(&sample_mapping()).unwrap();
        assert!(matches!(b.open(&sealed), Err(GuardError::Seal(_))));
    }

    #[test]
    fn test_tampered_envelope_fails() {
        let sealer = Aes256GcmSealer::new("key-1", &test_key());
        let mut sealed = sealer.seal(&sample_mapping()).unwrap();
        let mut bytes = BASE64.decode(&sealed.ciphertext).unwrap();
        bytes[0] ^= 0x01;
        sealed.ciphertext = BASE64.encode(bytes);
        assert!(sealer.open(&sealed).is_err());

        sealed.nonce = BASE64.encode([0u8; 4]);
        assert!(matches!(sealer.open(&sealed), Err(GuardError::Seal(_))));
    }

    #[test]
    fn test_each_seal_unique_nonce() {
        let sealer = Aes256GcmSealer::new("key-1", &test_key());
        let a = sealer.seal(&sample_mapping()).unwrap();
        let b = sealer.seal(&sample_mapping()).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }
}
