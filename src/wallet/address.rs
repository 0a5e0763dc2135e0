//! Ethereum Addresses
//!
//! Address derivation from secp256k1 public keys and EIP-55 mixed-case
//! checksum encoding.

use std::fmt;
use std::str::FromStr;

use secp256k1::PublicKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::keccak256;

pub const ADDRESS_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Address must be 40 hex digits, got {0} characters")]
    InvalidLength(usize),

    #[error("Address contains non-hex characters: {0}")]
    InvalidHex(String),

    #[error("Invalid EIP-55 checksum for {0}")]
    ChecksumMismatch(String),
}

/// 20-byte account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Low 20 bytes of keccak256(x || y)
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash[12..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// EIP-55 checksum encoding, `0x`-prefixed
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());

        let mut result = String::with_capacity(2 + lower.len());
        result.push_str("0x");
        for (i, ch) in lower.chars().enumerate() {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

            if ch.is_ascii_alphabetic() && nibble >= 8 {
                result.push(ch.to_ascii_uppercase());
            } else {
                result.push(ch);
            }
        }

        result
    }

    /// Parse 40 hex digits (optional `0x`) without looking at letter case
    pub(crate) fn parse_ignoring_case(text: &str) -> Result<Self, AddressError> {
        let trimmed = text.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength(hex_part.len()));
        }
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex(trimmed.to_string()));
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

/// Accepts all-lowercase, all-uppercase or correctly checksummed text. Mixed
/// case with a wrong checksum is rejected.
impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = Self::parse_ignoring_case(s)?;

        let trimmed = s.trim();
        let hex_part = &trimmed[trimmed.len() - ADDRESS_LEN * 2..];
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());

        if has_lower && has_upper && address.to_checksum()[2..] != *hex_part {
            return Err(AddressError::ChecksumMismatch(trimmed.to_string()));
        }

        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Apply EIP-55 casing to any 40-hex-digit string
pub fn to_checksum_address(text: &str) -> Result<String, AddressError> {
    Address::parse_ignoring_case(text).map(|a| a.to_checksum())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EIP55_VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_eip55_vectors() {
        for expected in EIP55_VECTORS {
            assert_eq!(to_checksum_address(&expected.to_lowercase()).unwrap(), expected);
            assert_eq!(to_checksum_address(&expected[2..].to_uppercase()).unwrap(), expected);
        }
    }

    #[test]
    fn test_checksum_idempotent() {
        for expected in EIP55_VECTORS {
            let once = to_checksum_address(expected).unwrap();
            assert_eq!(to_checksum_address(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_from_public_key() {
        let secp = secp256k1::Secp256k1::new();
        let secret = secp256k1::SecretKey::from_slice(
            &hex::decode("1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727").unwrap(),
        )
        .unwrap();
        let public = PublicKey::from_secret_key(&secp, &secret);
        assert_eq!(
            Address::from_public_key(&public).to_string(),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        // flip the case of one letter
        let bad = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(matches!(bad.parse::<Address>(), Err(AddressError::ChecksumMismatch(_))));
        assert!(EIP55_VECTORS[0].parse::<Address>().is_ok());
        assert!(EIP55_VECTORS[0].to_lowercase().parse::<Address>().is_ok());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("0x1234".parse::<Address>(), Err(AddressError::InvalidLength(4)));
        assert!(matches!(
            "0xzz5aeb6053f3e94c9b9a09f33669435e7ef1beae".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_uses_checksum() {
        let address: Address = EIP55_VECTORS[1].to_lowercase().parse().unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", EIP55_VECTORS[1]));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }
}
