//! secp256k1 Hash Signing and Recovery

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::log_debug;
use crate::utils::{decode_hex, SECP};
use crate::wallet::Address;

use super::{Signature, SigningError, SigningResult};

/// Parse a 32-byte private key. Zero and values at or above the group order
/// are rejected.
pub fn parse_private_key(private_key: &[u8]) -> SigningResult<SecretKey> {
    if private_key.len() != 32 {
        return Err(SigningError::InvalidPrivateKey(format!(
            "Expected 32 bytes, got {}",
            private_key.len()
        )));
    }

    SecretKey::from_slice(private_key)
        .map_err(|_| SigningError::InvalidPrivateKey("not a valid secp256k1 scalar".to_string()))
}

/// Hex private key, with or without `0x`
pub fn parse_private_key_hex(private_key: &str) -> SigningResult<SecretKey> {
    let bytes = Zeroizing::new(
        decode_hex(private_key)
            .map_err(|e| SigningError::InvalidPrivateKey(format!("Invalid hex: {}", e)))?,
    );
    parse_private_key(&bytes)
}

/// Address controlled by a private key
pub fn address_from_private_key(private_key: &SecretKey) -> Address {
    Address::from_public_key(&PublicKey::from_secret_key(&SECP, private_key))
}

/// Sign a 32-byte hash with a raw private key
pub fn sign_hash(private_key: &[u8], hash: &[u8; 32]) -> SigningResult<Signature> {
    let secret = parse_private_key(private_key)?;
    Ok(sign_hash_with_key(&secret, hash))
}

/// RFC 6979 deterministic, low-s recoverable signature
pub fn sign_hash_with_key(private_key: &SecretKey, hash: &[u8; 32]) -> Signature {
    let message = Message::from_digest(*hash);
    let sig = SECP.sign_ecdsa_recoverable(&message, private_key);
    let (recovery_id, compact) = sig.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    let signature = Signature {
        r,
        s,
        recovery_id: recovery_id.to_i32() as u8,
    };
    log_debug!("ecdsa", "Signed hash", hash = hex::encode(hash), v = signature.v());
    signature
}

/// Public key that produced `signature` over `hash`. High-s signatures are
/// rejected.
pub fn recover_public_key(hash: &[u8; 32], signature: &Signature) -> SigningResult<PublicKey> {
    if !signature.is_low_s() {
        return Err(SigningError::InvalidSignature(
            "s is in the upper half of the curve order".to_string(),
        ));
    }

    let recovery_id = RecoveryId::from_i32(i32::from(signature.recovery_id))
        .map_err(|e| SigningError::InvalidSignature(format!("Invalid recovery id: {}", e)))?;

    let recoverable = RecoverableSignature::from_compact(&signature.to_compact(), recovery_id)
        .map_err(|e| SigningError::InvalidSignature(e.to_string()))?;

    SECP.recover_ecdsa(&Message::from_digest(*hash), &recoverable)
        .map_err(|e| SigningError::RecoveryFailed(e.to_string()))
}

pub fn recover_address(hash: &[u8; 32], signature: &Signature) -> SigningResult<Address> {
    recover_public_key(hash, signature).map(|pk| Address::from_public_key(&pk))
}

/// True when `signature` over `hash` recovers to `expected`
pub fn verify_hash(hash: &[u8; 32], signature: &Signature, expected: &Address) -> SigningResult<bool> {
    Ok(recover_address(hash, signature)? == *expected)
}
