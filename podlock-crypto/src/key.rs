//! Symmetric key material and password-based derivation.

use crate::error::{CryptoError, CryptoResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key length in bytes (ChaCha20-Poly1305).
pub const KEY_SIZE: usize = 32;

/// Argon2id salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// Fixed application-wide salt for the master-password authentication hash.
///
/// Acceptable because the hash is only a local authentication check; the
/// real encryption keys are independent random values.
const AUTH_HASH_SALT: &[u8; SALT_SIZE] = b"podlock-auth-slt";

/// An opaque 256-bit symmetric secret.
///
/// Generated fresh per resource or per keystore, never reused across
/// unrelated resources and never derived from user input. Zeroized on drop.
/// Serializes as base64 so it can travel inside encrypted indices and
/// sharing links.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    /// Generates a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Encodes the key as base64 (sharing links, serialized metadata).
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Decodes a key from its base64 encoding.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidContent(format!("bad key encoding: {e}")))?;
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidContent(format!(
                "invalid key length: expected {KEY_SIZE}, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

// Key material never appears in logs or debug output.
impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

impl Serialize for SymmetricKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for SymmetricKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(D::Error::custom)
    }
}

/// Derives a 256-bit key from a secret string with Argon2id.
///
/// Used only for the registry metadata key (derived from the master-password
/// hash with a domain salt), never for per-resource keys.
pub fn derive_key(secret: &str, salt: &[u8; SALT_SIZE]) -> CryptoResult<SymmetricKey> {
    let mut out = [0u8; KEY_SIZE];
    argon2::Argon2::default()
        .hash_password_into(secret.as_bytes(), salt, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(SymmetricKey::from_bytes(out))
}

/// Deterministic salted hash of the master password.
///
/// The hash gates access to the registry metadata; it is held only in the
/// login session and never transmitted.
pub fn salted_hash(password: &str) -> CryptoResult<String> {
    let mut out = [0u8; KEY_SIZE];
    argon2::Argon2::default()
        .hash_password_into(password.as_bytes(), AUTH_HASH_SALT, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(BASE64.encode(out))
}
