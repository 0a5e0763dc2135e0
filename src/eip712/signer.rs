//! EIP-712 Signing
//!
//! ECDSA signing and verification for EIP-712 typed data.

use secp256k1::SecretKey;

use super::hasher::hash_typed_data;
use super::types::*;
use crate::log_info;
use crate::signing::{self, Signature};
use crate::wallet::Address;

/// Sign EIP-712 typed data
///
/// Returns a signature with v, r, s components.
pub fn sign_typed_data(
    typed_data: &TypedData,
    private_key: &SecretKey,
) -> Result<Signature, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    let signature = signing::sign_hash_with_key(private_key, &hash);

    log_info!(
        "eip712",
        "Signed typed data",
        primary_type = typed_data.primary_type()?,
        signer = signing::address_from_private_key(private_key)
    );

    Ok(signature)
}

/// Same as [`sign_typed_data`] with a raw 32-byte key
pub fn sign_typed_data_raw(
    typed_data: &TypedData,
    private_key: &[u8],
) -> Result<Signature, Eip712Error> {
    let secret = signing::parse_private_key(private_key)?;
    sign_typed_data(typed_data, &secret)
}

/// Address that produced `signature` over the typed data
pub fn recover_typed_data_signer(
    typed_data: &TypedData,
    signature: &Signature,
) -> Result<Address, Eip712Error> {
    let hash = hash_typed_data(typed_data)?;
    Ok(signing::recover_address(&hash, signature)?)
}

/// Verify an EIP-712 signature
///
/// Returns true if the signature recovers to `expected`.
pub fn verify_typed_data(
    typed_data: &TypedData,
    signature: &Signature,
    expected: &Address,
) -> Result<bool, Eip712Error> {
    Ok(recover_typed_data_signer(typed_data, signature)? == *expected)
}
