use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, SecretKey};

pub const ADDRESS_SIZE: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("invalid base58 address {0}: {1}")]
    Base58(String, String),
    #[error("invalid address length, expected {ADDRESS_SIZE}, got {0}")]
    Length(usize),
}

/// A ledger account address
///
/// Unlike a wallet [`PublicKey`], an account address need not be a valid
/// curve point (program ids and derived addresses usually are not), so it is
/// kept as plain bytes and rendered as base58.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// The native system program, which allocates new accounts
    pub const SYSTEM_PROGRAM: Address = Address([0; ADDRESS_SIZE]);

    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; ADDRESS_SIZE] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl From<PublicKey> for Address {
    fn from(key: PublicKey) -> Self {
        Address(key.to_bytes())
    }
}

impl From<&SecretKey> for Address {
    fn from(key: &SecretKey) -> Self {
        key.public().into()
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = AddressError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; ADDRESS_SIZE] = bytes
            .try_into()
            .map_err(|_| AddressError::Length(bytes.len()))?;
        Ok(Address(bytes))
    }
}

impl FromStr for Address {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| AddressError::Base58(s.to_string(), e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
