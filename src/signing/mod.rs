//! Recoverable ECDSA Signatures
//!
//! Deterministic (RFC 6979), low-s, recoverable secp256k1 signatures over
//! 32-byte hashes, and the EIP-191 signed-data envelopes built on them.

pub mod ecdsa;
pub mod eip191;

pub use ecdsa::*;
pub use eip191::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::decode_hex;

/// Offset added to the recovery id in the 65-byte wire form
pub const V_OFFSET: u8 = 27;

/// secp256k1 group order divided by two, big-endian
pub const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Error types for signing and recovery
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Address recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

pub type SigningResult<T> = Result<T, SigningError>;

/// Recoverable signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1
    pub recovery_id: u8,
}

impl Signature {
    /// `27 + recovery_id`
    pub fn v(&self) -> u8 {
        V_OFFSET + self.recovery_id
    }

    /// `s` lies in the lower half of the group order
    pub fn is_low_s(&self) -> bool {
        self.s <= HALF_ORDER
    }

    /// `r || s`
    pub fn to_compact(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    /// `r || s || v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&self.to_compact());
        bytes[64] = self.v();
        bytes
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parse `r || s || v` with `v` in {0, 1, 27, 28}
    pub fn from_bytes(bytes: &[u8]) -> SigningResult<Self> {
        if bytes.len() != 65 {
            return Err(SigningError::InvalidSignature(format!(
                "Expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let recovery_id = match bytes[64] {
            0 | 1 => bytes[64],
            27 | 28 => bytes[64] - V_OFFSET,
            v => {
                return Err(SigningError::InvalidSignature(format!(
                    "Invalid v value: {}",
                    v
                )))
            }
        };

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(Self { r, s, recovery_id })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s)
            .map_err(|e| SigningError::InvalidSignature(format!("Invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
