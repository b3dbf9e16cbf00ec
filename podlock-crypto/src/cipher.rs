//! Authenticated symmetric encryption of strings and binary blobs.
//!
//! Ciphertext framing is `nonce (12 bytes) || ChaCha20-Poly1305 ciphertext`
//! where the AEAD output already carries the 16-byte Poly1305 tag. String
//! ciphertext is the base64 encoding of the same framing. Zero-length
//! plaintext is valid: the AEAD of an empty message is a tag-only
//! ciphertext and round-trips byte-for-byte.

use crate::error::{CryptoError, CryptoResult};
use crate::key::SymmetricKey;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

/// ChaCha20-Poly1305 nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts a binary blob, returning `nonce || ciphertext+tag`.
pub fn encrypt_blob(plaintext: &[u8], key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::InvalidContent(format!("encryption failed: {e}")))?;

    let mut framed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    framed.extend_from_slice(&nonce_bytes);
    framed.extend_from_slice(&ciphertext);
    Ok(framed)
}

/// Decrypts a blob produced by [`encrypt_blob`]. Round-trips byte-for-byte,
/// including the zero-length blob.
///
/// Authentication failure is `WrongKey`; input too short to carry a nonce
/// and tag is `InvalidContent`.
pub fn decrypt_blob(ciphertext: &[u8], key: &SymmetricKey) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidContent(format!(
            "ciphertext too short: {} bytes",
            ciphertext.len()
        )));
    }

    let (nonce_bytes, body) = ciphertext.split_at(NONCE_SIZE);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), body)
        .map_err(|_| CryptoError::WrongKey)
}

/// Encrypts a string, returning base64 ciphertext.
pub fn encrypt_string(plaintext: &str, key: &SymmetricKey) -> CryptoResult<String> {
    let framed = encrypt_blob(plaintext.as_bytes(), key)?;
    Ok(BASE64.encode(framed))
}

/// Decrypts base64 ciphertext produced by [`encrypt_string`].
///
/// An empty or non-UTF-8 result is reported as `WrongKey`, not as empty
/// plaintext: callers must not pass genuinely empty plaintext through this
/// path, since empty-after-decrypt is indistinguishable from failure.
pub fn decrypt_string(ciphertext: &str, key: &SymmetricKey) -> CryptoResult<String> {
    let framed = BASE64
        .decode(ciphertext)
        .map_err(|e| CryptoError::InvalidContent(format!("bad base64: {e}")))?;

    let plaintext = decrypt_blob(&framed, key)?;
    if plaintext.is_empty() {
        return Err(CryptoError::WrongKey);
    }
    String::from_utf8(plaintext).map_err(|_| CryptoError::WrongKey)
}
