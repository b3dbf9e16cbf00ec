//! Symmetric encryption primitives for podlock.
//!
//! Provides the cipher layer the keystore subsystem builds on:
//! - ChaCha20-Poly1305 for authenticated encryption of strings and blobs
//! - Argon2id for password hashing and key derivation
//! - Random per-resource key generation with zeroization
//!
//! Keys are never derived from user input: every resource and every
//! keystore gets an independent random key. The master password only ever
//! produces a local authentication hash and the key that unlocks the
//! registry's own metadata index, limiting blast radius if the hash leaks.

mod cipher;
mod error;
mod key;

pub use cipher::{
    decrypt_blob, decrypt_string, encrypt_blob, encrypt_string, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, salted_hash, SymmetricKey, KEY_SIZE, SALT_SIZE};
