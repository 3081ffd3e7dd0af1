//! Encryption capability for the mapping store
//!
//! The store seals its table through the [`MappingCipher`] trait. Two
//! constructions exist: AES-256-GCM authenticated encryption, and an
//! explicit base64 codec for the degraded unencrypted mode. The choice is
//! made once at store construction; processing code never feature-detects.

use crate::domain::{Result, ShroudError};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// AES-GCM nonce length in bytes
const NONCE_SIZE: usize = 12;

/// Sealing capability for the mapping table blob.
pub trait MappingCipher: Send + Sync {
    /// Seal serialized table bytes into an at-rest payload.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Open an at-rest payload back into serialized table bytes.
    ///
    /// Any authentication or decode failure is `ShroudError::Crypto`.
    fn open(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Scheme byte written into the blob header.
    fn scheme_id(&self) -> u8;

    /// Human-readable scheme name for logs.
    fn name(&self) -> &'static str;
}

/// AES-256-GCM authenticated encryption.
///
/// The cipher key is the SHA-256 digest of the configured key material; the
/// random 96-bit nonce is prepended to each sealed payload.
pub struct AesGcmCipher {
    key: [u8; 32],
}

impl AesGcmCipher {
    /// Scheme byte for AES-256-GCM payloads
    pub const SCHEME_ID: u8 = 0x01;

    /// Derive the cipher key from opaque key material.
    pub fn from_key_material(material: &[u8]) -> Self {
        let digest = Sha256::digest(material);
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }
}

impl MappingCipher for AesGcmCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| ShroudError::Crypto(format!("Failed to initialize cipher: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| ShroudError::Crypto(format!("Encryption failed: {e}")))?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(payload)
    }

    fn open(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < NONCE_SIZE {
            return Err(ShroudError::Crypto(
                "Sealed payload is truncated (missing nonce)".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| ShroudError::Crypto(format!("Failed to initialize cipher: {e}")))?;

        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher.decrypt(nonce, ciphertext).map_err(|_| {
            ShroudError::Crypto(
                "Failed to decrypt mapping store: wrong key or corrupted file".to_string(),
            )
        })
    }

    fn scheme_id(&self) -> u8 {
        Self::SCHEME_ID
    }

    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }
}

/// Explicit degraded mode: base64 without confidentiality.
///
/// Selected only when encryption is disabled in configuration; construction
/// of the store logs a loud warning in that case.
pub struct PlainCodec;

impl PlainCodec {
    /// Scheme byte for base64 payloads
    pub const SCHEME_ID: u8 = 0x00;
}

impl MappingCipher for PlainCodec {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        Ok(BASE64.encode(plaintext).into_bytes())
    }

    fn open(&self, payload: &[u8]) -> Result<Vec<u8>> {
        BASE64
            .decode(payload)
            .map_err(|e| ShroudError::Crypto(format!("Failed to decode mapping store: {e}")))
    }

    fn scheme_id(&self) -> u8 {
        Self::SCHEME_ID
    }

    fn name(&self) -> &'static str {
        "plain-base64"
    }
}
