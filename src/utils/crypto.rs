//! Hash and Encoding Helpers
//!
//! Small wrappers over the hash primitives shared by the wallet, signing
//! and EIP-712 modules.

use lazy_static::lazy_static;
use ripemd::Ripemd160;
use secp256k1::{All, Secp256k1};
use sha2::{Digest, Sha256};
use tiny_keccak::{Hasher, Keccak};

lazy_static! {
    /// Shared signing and verification context
    pub static ref SECP: Secp256k1<All> = Secp256k1::new();
}

/// Keccak256 hash (used for Ethereum addresses and EIP-712)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Keccak256 over several byte slices, without concatenating them first
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// RIPEMD160(SHA256(data)), the BIP-32 key identifier
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// Base58Check encoding: payload || first 4 bytes of double SHA-256
pub fn base58check_encode(payload: &[u8]) -> String {
    bs58::encode(payload).with_check().into_string()
}

/// Strip an optional `0x` / `0X` prefix
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode a hex string with or without `0x` prefix
pub fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(strip_hex_prefix(s.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256() {
        let hash = keccak256(b"hello");
        assert_eq!(
            hex::encode(hash),
            "1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn test_keccak256_concat_matches_single_pass() {
        assert_eq!(keccak256_concat(&[b"hel", b"lo"]), keccak256(b"hello"));
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_base58check_appends_double_sha256_checksum() {
        let payload = [0x00u8, 0x01, 0x02];
        let encoded = base58check_encode(&payload);

        let decoded = bs58::decode(&encoded).into_vec().unwrap();
        let checksum = sha256(&sha256(&payload));
        assert_eq!(&decoded[..3], &payload);
        assert_eq!(&decoded[3..], &checksum[..4]);
        assert_eq!(
            bs58::decode(&encoded).with_check(None).into_vec().unwrap(),
            payload.to_vec()
        );
    }

    #[test]
    fn test_decode_hex_prefixes() {
        assert_eq!(decode_hex("0xdead").unwrap(), vec![0xde, 0xad]);
        assert_eq!(decode_hex("0XDEAD").unwrap(), vec![0xde, 0xad]);
        assert_eq!(decode_hex("dead").unwrap(), vec![0xde, 0xad]);
        assert!(decode_hex("0xzz").is_err());
    }
}
