//! EIP-191 Signed Data
//!
//! Reference: https://eips.ethereum.org/EIPS/eip-191
//!
//! Format: `0x19 || version || header || body`, hashed with keccak256.

use secp256k1::SecretKey;

use crate::utils::{decode_hex, keccak256_concat};
use crate::wallet::Address;

use super::{recover_address, sign_hash_with_key, Signature, SigningError, SigningResult};

const EIP191_PREFIX: u8 = 0x19;

/// Version byte `E`: the rest of the personal_sign prefix follows it
const PERSONAL_HEADER: &str = "thereum Signed Message:\n";

/// A message ready for hashing under one of the EIP-191 versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableMessage {
    /// Version 0x00: data for a specific validator contract
    IntendedValidator { validator: Address, data: Vec<u8> },
    /// Version 0x01: EIP-712 structured data
    Structured {
        domain_separator: [u8; 32],
        struct_hash: [u8; 32],
    },
    /// Version 0x45 (`E`): personal_sign
    Personal(Vec<u8>),
}

impl SignableMessage {
    /// personal_sign over UTF-8 text
    pub fn personal_text(text: &str) -> Self {
        SignableMessage::Personal(text.as_bytes().to_vec())
    }

    /// personal_sign over hex-encoded bytes
    pub fn personal_hex(hex_message: &str) -> SigningResult<Self> {
        let bytes = decode_hex(hex_message)
            .map_err(|e| SigningError::InvalidMessage(format!("Invalid hex: {}", e)))?;
        Ok(SignableMessage::Personal(bytes))
    }

    pub fn version(&self) -> u8 {
        match self {
            SignableMessage::IntendedValidator { .. } => 0x00,
            SignableMessage::Structured { .. } => 0x01,
            SignableMessage::Personal(_) => b'E',
        }
    }

    pub fn header(&self) -> Vec<u8> {
        match self {
            SignableMessage::IntendedValidator { validator, .. } => validator.as_bytes().to_vec(),
            SignableMessage::Structured { domain_separator, .. } => domain_separator.to_vec(),
            SignableMessage::Personal(body) => {
                format!("{}{}", PERSONAL_HEADER, body.len()).into_bytes()
            }
        }
    }

    pub fn body(&self) -> &[u8] {
        match self {
            SignableMessage::IntendedValidator { data, .. } => data,
            SignableMessage::Structured { struct_hash, .. } => struct_hash,
            SignableMessage::Personal(body) => body,
        }
    }

    /// keccak256(0x19 || version || header || body)
    pub fn hash(&self) -> [u8; 32] {
        let header = self.header();
        keccak256_concat(&[&[EIP191_PREFIX, self.version()][..], &header[..], self.body()])
    }
}

/// Hash of a personal_sign message
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    SignableMessage::Personal(message.to_vec()).hash()
}

pub fn sign_message(private_key: &SecretKey, message: &SignableMessage) -> Signature {
    sign_hash_with_key(private_key, &message.hash())
}

pub fn recover_message(message: &SignableMessage, signature: &Signature) -> SigningResult<Address> {
    recover_address(&message.hash(), signature)
}
