//! Cryptographic primitives for sealing secrets at rest.

pub mod encryption;

pub use encryption::{derive_key, generate_nonce, TokenCipher, KEY_LEN, NONCE_LEN, TAG_LEN};
