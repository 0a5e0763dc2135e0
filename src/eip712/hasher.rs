//! EIP-712 Hashing
//!
//! Implements domain separator and struct hashing for EIP-712.

use serde_json::Value;

use super::encoder::{encode_data, type_hash};
use super::types::*;
use crate::log_debug;
use crate::signing::SignableMessage;
use crate::utils::{keccak256, keccak256_concat};

/// Magic prefix for EIP-712 encoding
const EIP712_PREFIX: &[u8] = b"\x19\x01";

/// hashStruct(s) = keccak256(typeHash || encodeData(s))
pub fn hash_struct(type_name: &str, types: &Types, data: &Value) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(&encode_data(type_name, types, data, 0)?))
}

/// Calculate the domain separator hash
///
/// domainSeparator = hashStruct(eip712Domain), where the `EIP712Domain`
/// type lists only the domain keys that are present
pub fn domain_separator(domain: &Eip712Domain) -> Result<[u8; 32], Eip712Error> {
    let mut types = Types::new();
    types.insert(EIP712_DOMAIN.to_string(), domain.domain_type());
    hash_struct(EIP712_DOMAIN, &types, &domain.to_value()?)
}

/// Type hash of the domain struct for this domain's key set
pub fn domain_type_hash(domain: &Eip712Domain) -> Result<[u8; 32], Eip712Error> {
    let mut types = Types::new();
    types.insert(EIP712_DOMAIN.to_string(), domain.domain_type());
    type_hash(EIP712_DOMAIN, &types)
}

/// hashStruct of the message under its primary type
pub fn message_hash(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    let primary_type = typed_data.primary_type()?;
    hash_struct(&primary_type, &typed_data.types, &typed_data.message)
}

/// Intermediate hashes of an EIP-712 signing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreImage {
    pub domain_separator: [u8; 32],
    pub struct_hash: [u8; 32],
    /// keccak256(0x19 0x01 || domain_separator || struct_hash)
    pub final_hash: [u8; 32],
}

impl PreImage {
    /// The 66 bytes that get hashed
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(66);
        bytes.extend_from_slice(EIP712_PREFIX);
        bytes.extend_from_slice(&self.domain_separator);
        bytes.extend_from_slice(&self.struct_hash);
        bytes
    }
}

pub fn get_pre_image(typed_data: &TypedData) -> Result<PreImage, Eip712Error> {
    typed_data.validate()?;

    let domain_separator = domain_separator(&typed_data.domain)?;
    let struct_hash = message_hash(typed_data)?;
    let final_hash = keccak256_concat(&[EIP712_PREFIX, &domain_separator[..], &struct_hash[..]]);

    log_debug!(
        "eip712",
        "Hashed typed data",
        domain_separator = hex::encode(domain_separator),
        struct_hash = hex::encode(struct_hash),
        digest = hex::encode(final_hash)
    );

    Ok(PreImage {
        domain_separator,
        struct_hash,
        final_hash,
    })
}

/// The 32-byte digest that is actually signed
pub fn hash_typed_data(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    Ok(get_pre_image(typed_data)?.final_hash)
}

/// The document as an EIP-191 version 0x01 message
pub fn to_signable_message(typed_data: &TypedData) -> Result<SignableMessage, Eip712Error> {
    let pre_image = get_pre_image(typed_data)?;
    Ok(SignableMessage::Structured {
        domain_separator: pre_image.domain_separator,
        struct_hash: pre_image.struct_hash,
    })
}
