//! Content encryption using AES-256-GCM
//!
//! A [`Secret`] is the symmetric key that encrypts every file in one upload.
//! It is never generated at random: it is derived by hashing a wallet
//! signature over the purpose's message and a random per-upload [`Salt`].
//! The salt is stored in the manifest, so the owner can re-derive the key
//! later by signing again, while two uploads never share a key. Recipients
//! receive it wrapped in a [`SecretShare`](super::SecretShare).
//!
//! Each encryption draws a fresh 12-byte nonce. The nonce travels in the
//! clear next to the ciphertext (in the manifest), and the 16-byte GCM tag
//! is appended to the ciphertext.

use std::fmt;
use std::ops::Deref;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Size of the AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the AES-256 key in bytes
pub const SECRET_SIZE: usize = 32;
/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;
/// Size of the per-upload key-derivation salt in bytes
pub const SALT_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
}

/// What a derived key is used for.
///
/// Each purpose has its own fixed message for the wallet to sign, so batch
/// shares and registered documents never share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    /// Files shared with a single recipient via a batch share
    Batch,
    /// Files registered as a document with an access list
    Document,
}

impl KeyPurpose {
    /// The message the wallet signs to derive the key for this purpose
    pub fn message(&self) -> &'static [u8] {
        match self {
            KeyPurpose::Batch => b"batch-encryption-key",
            KeyPurpose::Document => b"doc-encryption-key",
        }
    }

    /// The message signed for one upload: `<message>:<hex salt>`
    pub fn salted_message(&self, salt: &Salt) -> Vec<u8> {
        let mut message = self.message().to_vec();
        message.push(b':');
        message.extend_from_slice(salt.to_hex().as_bytes());
        message
    }
}

/// Random bytes mixed into the signed message of a single upload
///
/// Serialized as a hex string.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Draw a fresh salt from the system RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut bytes = [0u8; SALT_SIZE];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate salt: {}", e))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(raw: &str) -> Result<Self, SecretError> {
        let bytes = hex::decode(raw).map_err(|e| anyhow::anyhow!("invalid salt hex: {}", e))?;
        let bytes: [u8; SALT_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            anyhow::anyhow!("invalid salt size, expected {}, got {}", SALT_SIZE, b.len())
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; SALT_SIZE]> for Salt {
    fn from(bytes: [u8; SALT_SIZE]) -> Self {
        Salt(bytes)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", self.to_hex())
    }
}

impl Serialize for Salt {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as Deserialize>::deserialize(deserializer)?;
        Salt::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// A per-encryption AES-GCM nonce
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Draw a fresh nonce from the system RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

impl From<[u8; NONCE_SIZE]> for Nonce {
    fn from(bytes: [u8; NONCE_SIZE]) -> Self {
        Nonce(bytes)
    }
}

impl TryFrom<&[u8]> for Nonce {
    type Error = SecretError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; NONCE_SIZE] = bytes.try_into().map_err(|_| {
            anyhow::anyhow!(
                "invalid nonce size, expected {}, got {}",
                NONCE_SIZE,
                bytes.len()
            )
        })?;
        Ok(Nonce(bytes))
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", hex::encode(self.0))
    }
}

/// A 256-bit symmetric key for file encryption
///
/// # Examples
///
/// ```ignore
/// let salt = Salt::generate()?;
/// let signature = wallet.sign_message(&KeyPurpose::Batch.salted_message(&salt));
/// let secret = Secret::from_signature(&signature);
///
/// let (nonce, ciphertext) = secret.encrypt(b"sensitive data")?;
/// let recovered = secret.decrypt(&ciphertext, &nonce)?;
/// ```
#[derive(PartialEq, Eq, Clone)]
pub struct Secret([u8; SECRET_SIZE]);

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl Secret {
    /// Derive a key from arbitrary key material with SHA-256
    ///
    /// This is the only way key material becomes a `Secret`; raw input is
    /// never used as the key directly.
    pub fn derive(material: &[u8]) -> Self {
        let digest = Sha256::digest(material);
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(&digest);
        Self(buff)
    }

    /// Derive a key from a wallet signature over a fixed message
    pub fn from_signature(signature: &ed25519_dalek::Signature) -> Self {
        Self::derive(&signature.to_bytes())
    }

    /// Create a secret from a byte slice
    ///
    /// Used for unwrapped key shares, which already carry exactly
    /// `SECRET_SIZE` bytes of derived key.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(anyhow::anyhow!(
                "invalid secret size, expected {}, got {}",
                SECRET_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()))
    }

    /// Encrypt data with AES-256-GCM under a freshly generated nonce
    ///
    /// Returns the nonce and `ciphertext || tag`.
    pub fn encrypt(&self, data: &[u8]) -> Result<(Nonce, Vec<u8>), SecretError> {
        let nonce = Nonce::generate()?;
        let ciphertext = self
            .cipher()
            .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), data)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;
        Ok((nonce, ciphertext))
    }

    /// Decrypt `ciphertext || tag` produced by [`Secret::encrypt`]
    ///
    /// # Errors
    ///
    /// Fails if the ciphertext, tag or nonce were altered, or if this is not
    /// the key the data was encrypted with.
    pub fn decrypt(&self, data: &[u8], nonce: &Nonce) -> Result<Vec<u8>, SecretError> {
        if data.len() < TAG_SIZE {
            return Err(anyhow::anyhow!("data too short for authentication tag").into());
        }
        let plaintext = self
            .cipher()
            .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), data)
            .map_err(|_| anyhow::anyhow!("decrypt error"))?;
        Ok(plaintext)
    }
}
