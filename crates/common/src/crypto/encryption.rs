//! AES-256-GCM sealing for stored refresh credentials.
//!
//! Key derivation and nonce generation are standalone primitives so they can
//! be tested independently of the cipher, and the sealed payload layout
//! (`base64(nonce || tag || ciphertext)`) is stable: rows written by earlier
//! versions of the dashboard remain readable.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{CommonError, CommonResult};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Derive a 32-byte AES key from an operator-supplied secret.
///
/// SHA-256 of the raw secret bytes, matching the layout existing credential
/// rows were sealed with.
pub fn derive_key(secret: &str) -> [u8; KEY_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Generate a random 12-byte nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// AES-256-GCM cipher for sealing and opening secret strings.
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").field("key", &"[REDACTED]").finish()
    }
}

impl TokenCipher {
    /// Create a cipher from a raw 32-byte key.
    pub fn new(key: &[u8]) -> CommonResult<Self> {
        if key.len() != KEY_LEN {
            return Err(CommonError::Crypto(format!(
                "sealing key must be exactly {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CommonError::Crypto(format!("failed to initialize cipher: {e}")))?;
        Ok(Self { cipher })
    }

    /// Create a cipher whose key is derived from an operator secret.
    pub fn from_secret(secret: &str) -> CommonResult<Self> {
        Self::new(&derive_key(secret))
    }

    /// Seal a plaintext string into `base64(nonce || tag || ciphertext)`.
    pub fn seal(&self, plaintext: &str) -> CommonResult<String> {
        let nonce = generate_nonce();
        self.seal_with_nonce(plaintext, &nonce)
    }

    /// Seal with a caller-provided nonce. The nonce must never be reused
    /// with the same key; production code goes through [`TokenCipher::seal`].
    pub fn seal_with_nonce(&self, plaintext: &str, nonce: &[u8; NONCE_LEN]) -> CommonResult<String> {
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(nonce), Payload::from(plaintext.as_bytes()))
            .map_err(|e| CommonError::Crypto(format!("encryption failed: {e}")))?;

        // aes-gcm appends the tag to the ciphertext; reorder to the stored
        // layout nonce || tag || ciphertext.
        let split = sealed.len().checked_sub(TAG_LEN).ok_or_else(|| {
            CommonError::Internal("ciphertext shorter than authentication tag".to_string())
        })?;
        let (ciphertext, tag) = sealed.split_at(split);

        let mut packed = Vec::with_capacity(NONCE_LEN + TAG_LEN + ciphertext.len());
        packed.extend_from_slice(nonce);
        packed.extend_from_slice(tag);
        packed.extend_from_slice(ciphertext);
        Ok(BASE64.encode(packed))
    }

    /// Open a payload produced by [`TokenCipher::seal`].
    pub fn open(&self, payload: &str) -> CommonResult<String> {
        let raw = BASE64
            .decode(payload)
            .map_err(|e| CommonError::Crypto(format!("invalid base64 payload: {e}")))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CommonError::Crypto("sealed payload is truncated".to_string()));
        }

        let (nonce, rest) = raw.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        let mut joined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        joined.extend_from_slice(ciphertext);
        joined.extend_from_slice(tag);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), joined.as_ref())
            .map_err(|e| CommonError::Crypto(format!("decryption failed: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| CommonError::Crypto(format!("sealed value is not valid UTF-8: {e}")))
    }
}
