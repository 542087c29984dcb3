//! Key sharing using ECDH + AES Key Wrap
//!
//! A file key is derived from the *sender's* wallet signature, which no
//! recipient can reproduce. To let a recipient decrypt, the sender wraps the
//! key for the recipient's wallet public key and stores the wrap in the
//! manifest's `keys` map.
//!
//! # Protocol Overview
//!
//! To share a secret with a wallet:
//! 1. **Generate ephemeral keypair**: Create a temporary Ed25519 keypair
//! 2. **Perform ECDH**: Convert keys to X25519 and compute shared secret
//! 3. **Wrap key**: Use AES-KW to encrypt the secret with the shared secret
//! 4. **Package**: `[ephemeral_pubkey || wrapped_secret]`
//!
//! The recipient reverses the process with their own secret key. AES-KW
//! authenticates the wrap, so a share addressed to someone else fails to
//! unwrap instead of yielding a wrong key.

use std::fmt;
use std::str::FromStr;

use aes_kw::KekAes256 as Kek;
use serde::{Deserialize, Serialize};

use super::keys::{KeyError, PublicKey, SecretKey, PUBLIC_KEY_SIZE};
use super::secret::{Secret, SecretError, SECRET_SIZE};

/// Size of AES Key Wrap integrity block in bytes
pub const KW_NONCE_SIZE: usize = 8;
/// Total size of a share in bytes
///
/// Layout: ephemeral_pubkey (32) || wrapped_secret (40) = 72 bytes
pub const SECRET_SHARE_SIZE: usize = PUBLIC_KEY_SIZE + SECRET_SIZE + KW_NONCE_SIZE;

/// Errors that can occur during share creation or recovery
#[derive(Debug, thiserror::Error)]
pub enum SecretShareError {
    #[error("share error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// A file key wrapped for one specific wallet
///
/// Serialized as a hex string so it reads naturally inside the manifest JSON.
///
/// # Wire Format
///
/// ```text
/// [ ephemeral_pubkey: 32 bytes ][ wrapped_secret: 40 bytes ]
/// ```
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct SecretShare([u8; SECRET_SHARE_SIZE]);

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretShare({})", self.to_hex())
    }
}

impl Serialize for SecretShare {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SecretShare {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        SecretShare::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl From<[u8; SECRET_SHARE_SIZE]> for SecretShare {
    fn from(bytes: [u8; SECRET_SHARE_SIZE]) -> Self {
        SecretShare(bytes)
    }
}

impl TryFrom<&[u8]> for SecretShare {
    type Error = SecretShareError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; SECRET_SHARE_SIZE] = bytes.try_into().map_err(|_| {
            anyhow::anyhow!(
                "invalid share size, expected {}, got {}",
                SECRET_SHARE_SIZE,
                bytes.len()
            )
        })?;
        Ok(SecretShare(bytes))
    }
}

impl FromStr for SecretShare {
    type Err = SecretShareError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl SecretShare {
    /// Parse a share from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, SecretShareError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; SECRET_SHARE_SIZE];
        hex::decode_to_slice(hex, &mut buff).map_err(|_| anyhow::anyhow!("hex decode error"))?;
        Ok(SecretShare::from(buff))
    }

    /// Convert share to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Wrap `secret` so that only the holder of `recipient`'s secret key can
    /// recover it
    pub fn new(secret: &Secret, recipient: &PublicKey) -> Result<Self, SecretShareError> {
        let ephemeral_private = SecretKey::generate();
        let ephemeral_public = ephemeral_private.public();

        let shared_secret = ephemeral_private
            .to_x25519()
            .diffie_hellman(&recipient.to_x25519());

        let kek = Kek::from(*shared_secret.as_bytes());
        let wrapped = kek
            .wrap_vec(secret.bytes())
            .map_err(|_| anyhow::anyhow!("AES-KW wrap error"))?;

        if PUBLIC_KEY_SIZE + wrapped.len() != SECRET_SHARE_SIZE {
            return Err(anyhow::anyhow!("expected share size is incorrect").into());
        };

        let mut share = [0u8; SECRET_SHARE_SIZE];
        share[..PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral_public.to_bytes());
        share[PUBLIC_KEY_SIZE..].copy_from_slice(&wrapped);

        Ok(SecretShare(share))
    }

    /// Recover the wrapped secret using the recipient's secret key
    ///
    /// # Errors
    ///
    /// Fails if the share was made for a different wallet or was corrupted.
    pub fn recover(&self, recipient_secret: &SecretKey) -> Result<Secret, SecretShareError> {
        let ephemeral_public = PublicKey::try_from(&self.0[..PUBLIC_KEY_SIZE])?;

        let shared_secret = recipient_secret
            .to_x25519()
            .diffie_hellman(&ephemeral_public.to_x25519());

        let kek = Kek::from(*shared_secret.as_bytes());
        let unwrapped = kek
            .unwrap_vec(&self.0[PUBLIC_KEY_SIZE..])
            .map_err(|_| anyhow::anyhow!("AES-KW unwrap error"))?;

        Ok(Secret::from_slice(&unwrapped)?)
    }

    /// Get a reference to the raw share bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_share_secret() {
        let secret = Secret::derive(b"file key");
        let private_key = SecretKey::generate();
        let share = SecretShare::new(&secret, &private_key.public()).unwrap();
        let recovered_secret = share.recover(&private_key).unwrap();
        assert_eq!(secret, recovered_secret);
    }

    #[test]
    fn test_share_wrong_recipient() {
        let secret = Secret::derive(b"file key");
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();

        let share = SecretShare::new(&secret, &alice.public()).unwrap();
        assert_eq!(share.recover(&alice).unwrap(), secret);
        assert!(share.recover(&bob).is_err());
    }

    #[test]
    fn test_share_json_is_hex_string() {
        let secret = Secret::derive(b"file key");
        let private_key = SecretKey::generate();
        let share = SecretShare::new(&secret, &private_key.public()).unwrap();

        let json = serde_json::to_string(&share).unwrap();
        assert_eq!(json, format!("\"{}\"", share.to_hex()));

        let parsed: SecretShare = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.recover(&private_key).unwrap(), secret);
    }

    #[test]
    fn test_share_rejects_bad_length() {
        assert!(SecretShare::try_from(&[0u8; SECRET_SHARE_SIZE - 1][..]).is_err());
        assert!(SecretShare::from_hex("abcd").is_err());
        assert!(serde_json::from_str::<SecretShare>("\"00ff\"").is_err());
    }

    #[test]
    fn test_corrupted_share_fails() {
        let secret = Secret::derive(b"file key");
        let private_key = SecretKey::generate();
        let share = SecretShare::new(&secret, &private_key.public()).unwrap();

        let mut bytes = [0u8; SECRET_SHARE_SIZE];
        bytes.copy_from_slice(share.bytes());
        bytes[SECRET_SHARE_SIZE - 1] ^= 0xFF;
        assert!(SecretShare::from(bytes).recover(&private_key).is_err());
    }
}
