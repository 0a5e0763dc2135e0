//! BIP-32 Hierarchical Deterministic Keys
//!
//! Master key generation from a seed, private and public child derivation,
//! key fingerprints and `xprv`/`xpub` serialization over secp256k1.
//!
//! SECURITY: `derive_child` consumes its parent so intermediate private keys
//! along a path never outlive the step that used them, and every private
//! scalar and chain code is wiped when its node is dropped.

use std::fmt;

use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, SecretKey};
use zeroize::{Zeroize, Zeroizing};

use crate::log_debug;
use crate::utils::{base58check_encode, hash160, SECP};

use super::address::Address;
use super::derivation_path::{DerivationPath, HARDENED};

type HmacSha512 = Hmac<sha2::Sha512>;

/// Key used for the master HMAC
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Mainnet serialization versions
pub const XPRV_VERSION: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
pub const XPUB_VERSION: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];

pub const MIN_SEED_LEN: usize = 16;
pub const MAX_SEED_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerivationError {
    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Derived key is not a valid secp256k1 scalar: {0}")]
    InvalidScalar(String),

    #[error("Invalid seed length {0}: expected 16 to 64 bytes")]
    InvalidSeedLength(usize),

    #[error("Child index {0} does not fit in 31 bits")]
    InvalidChildIndex(u32),

    #[error("Cannot derive hardened child {0}' from a public key")]
    HardenedFromPublic(u32),
}

/// A node of the BIP-32 key tree
pub struct ExtendedKey {
    private_key: Option<SecretKey>,
    public_key: PublicKey,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
}

impl ExtendedKey {
    /// Master node: HMAC-SHA512("Bitcoin seed", seed)
    pub fn master(seed: &[u8]) -> Result<Self, DerivationError> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(DerivationError::InvalidSeedLength(seed.len()));
        }

        let output = hmac_sha512(MASTER_HMAC_KEY, &[seed])?;
        let (il, ir) = output.split_at(32);

        let private_key = SecretKey::from_slice(il)
            .map_err(|e| DerivationError::InvalidScalar(format!("master key: {}", e)))?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(Self {
            public_key: PublicKey::from_secret_key(&SECP, &private_key),
            private_key: Some(private_key),
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
        })
    }

    /// CKDpriv / CKDpub. `index` is the 31-bit index; `hardened` sets the
    /// high bit of the child number.
    pub fn derive_child(self, index: u32, hardened: bool) -> Result<Self, DerivationError> {
        if index >= HARDENED {
            return Err(DerivationError::InvalidChildIndex(index));
        }
        let depth = self.depth.checked_add(1).ok_or_else(|| {
            DerivationError::InvalidPath("key tree depth exceeds 255".to_string())
        })?;
        let child_number = if hardened { index | HARDENED } else { index };

        let output = match (&self.private_key, hardened) {
            (Some(secret), true) => {
                let secret_bytes = Zeroizing::new(secret.secret_bytes());
                hmac_sha512(
                    &self.chain_code,
                    &[&[0x00u8][..], &secret_bytes[..], &child_number.to_be_bytes()[..]],
                )?
            }
            (None, true) => return Err(DerivationError::HardenedFromPublic(index)),
            (_, false) => hmac_sha512(
                &self.chain_code,
                &[&self.public_key.serialize()[..], &child_number.to_be_bytes()[..]],
            )?,
        };

        let (il, ir) = output.split_at(32);
        let mut tweak_bytes = Zeroizing::new([0u8; 32]);
        tweak_bytes.copy_from_slice(il);

        let tweak = Scalar::from_be_bytes(*tweak_bytes).map_err(|_| {
            DerivationError::InvalidScalar(format!(
                "IL is not below the curve order at child {:#010x}",
                child_number
            ))
        })?;

        let (private_key, public_key) = match &self.private_key {
            Some(secret) => {
                let child = secret.add_tweak(&tweak).map_err(|_| {
                    DerivationError::InvalidScalar(format!(
                        "child key is zero at child {:#010x}",
                        child_number
                    ))
                })?;
                (Some(child), PublicKey::from_secret_key(&SECP, &child))
            }
            None => {
                let child = self.public_key.add_exp_tweak(&SECP, &tweak).map_err(|_| {
                    DerivationError::InvalidScalar(format!(
                        "child point is at infinity at child {:#010x}",
                        child_number
                    ))
                })?;
                (None, child)
            }
        };

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(ir);

        Ok(Self {
            private_key,
            public_key,
            chain_code,
            depth,
            parent_fingerprint: self.fingerprint(),
            child_number,
        })
    }

    /// Master key followed by one derivation per path component
    pub fn derive_path(seed: &[u8], path: &DerivationPath) -> Result<Self, DerivationError> {
        let node = path
            .components()
            .iter()
            .try_fold(Self::master(seed)?, |node, component| {
                node.derive_child(component.index, component.hardened)
            })?;

        log_debug!("hd_key", "Derived key", path = path, depth = node.depth);
        Ok(node)
    }

    /// Public-only copy of this node
    pub fn neuter(&self) -> Self {
        Self {
            private_key: None,
            public_key: self.public_key,
            chain_code: self.chain_code,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
        }
    }

    /// First four bytes of HASH160(compressed public key)
    pub fn fingerprint(&self) -> [u8; 4] {
        let id = hash160(&self.public_key.serialize());
        [id[0], id[1], id[2], id[3]]
    }

    pub fn is_private(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn private_key(&self) -> Option<&SecretKey> {
        self.private_key.as_ref()
    }

    pub fn private_key_bytes(&self) -> Option<Zeroizing<[u8; 32]>> {
        self.private_key.map(|k| Zeroizing::new(k.secret_bytes()))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Base58Check `xprv`, or `None` for a public-only node
    pub fn to_xprv(&self) -> Option<Zeroizing<String>> {
        let secret = self.private_key.as_ref()?;
        let mut key_data = Zeroizing::new([0u8; 33]);
        key_data[1..].copy_from_slice(&secret.secret_bytes());

        let payload = self.serialize(XPRV_VERSION, &key_data);
        Some(Zeroizing::new(base58check_encode(&payload)))
    }

    /// Base58Check `xpub`
    pub fn to_xpub(&self) -> String {
        let payload = self.serialize(XPUB_VERSION, &self.public_key.serialize());
        base58check_encode(&payload)
    }

    fn serialize(&self, version: [u8; 4], key_data: &[u8; 33]) -> Zeroizing<Vec<u8>> {
        let mut data = Zeroizing::new(Vec::with_capacity(78));
        data.extend_from_slice(&version);
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        data.extend_from_slice(key_data);
        data
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        if let Some(secret) = self.private_key.as_mut() {
            secret.non_secure_erase();
        }
        self.chain_code.zeroize();
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("private_key", &self.private_key.map(|_| "[REDACTED]"))
            .field("public_key", &hex::encode(self.public_key.serialize()))
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}

fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<[u8; 64]>, DerivationError> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| DerivationError::InvalidScalar(format!("HMAC key rejected: {}", e)))?;
    for part in parts {
        mac.update(part);
    }

    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector1_seed() -> Vec<u8> {
        hex::decode("000102030405060708090a0b0c0d0e0f").unwrap()
    }

    #[test]
    fn test_master_vector1() {
        let master = ExtendedKey::master(&vector1_seed()).unwrap();

        assert_eq!(
            hex::encode(*master.private_key_bytes().unwrap()),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );
        assert_eq!(
            hex::encode(master.chain_code()),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(
            hex::encode(master.public_key().serialize()),
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        );
        assert_eq!(hex::encode(master.fingerprint()), "3442193e");
        assert_eq!(master.depth(), 0);
        assert_eq!(master.parent_fingerprint(), [0u8; 4]);
        assert_eq!(
            master.to_xprv().unwrap().as_str(),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.to_xpub(),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
    }

    #[test]
    fn test_hardened_child_vector1() {
        let child = ExtendedKey::master(&vector1_seed())
            .unwrap()
            .derive_child(0, true)
            .unwrap();

        assert_eq!(
            hex::encode(*child.private_key_bytes().unwrap()),
            "edb2e14f9ee77d26dd93b4ecede8d16ed408ce149b6cd80b0715a2d911a0afea"
        );
        assert_eq!(
            hex::encode(child.chain_code()),
            "47fdacbd0f1097043b78c63c20c34ef4ed9a111d980047ad16282c7ae6236141"
        );
        assert_eq!(
            hex::encode(child.public_key().serialize()),
            "035a784662a4a20a65bf6aab9ae98a6c068a81c52e4b032c0fb5400c706cfccc56"
        );
        assert_eq!(hex::encode(child.parent_fingerprint()), "3442193e");
        assert_eq!(child.child_number(), 0x8000_0000);
        assert_eq!(child.depth(), 1);
    }

    #[test]
    fn test_derive_path_matches_stepwise() {
        let seed = vector1_seed();
        let path: DerivationPath = "m/0'/1/2'".parse().unwrap();
        let by_path = ExtendedKey::derive_path(&seed, &path).unwrap();

        let stepwise = ExtendedKey::master(&seed)
            .unwrap()
            .derive_child(0, true)
            .unwrap()
            .derive_child(1, false)
            .unwrap()
            .derive_child(2, true)
            .unwrap();

        assert_eq!(by_path.public_key(), stepwise.public_key());
        assert_eq!(by_path.chain_code(), stepwise.chain_code());
        assert_eq!(by_path.depth(), 3);
    }

    #[test]
    fn test_derive_path_is_order_sensitive() {
        let seed = vector1_seed();
        for (first, second) in [
            ("m/1/2", "m/2/1"),
            ("m/44'/60'/0'/0/0", "m/60'/44'/0'/0/0"),
            ("m/0'/1", "m/1/0'"),
        ] {
            let a = ExtendedKey::derive_path(&seed, &first.parse().unwrap()).unwrap();
            let b = ExtendedKey::derive_path(&seed, &second.parse().unwrap()).unwrap();
            assert_ne!(a.public_key(), b.public_key(), "{} vs {}", first, second);
            assert_ne!(a.address(), b.address(), "{} vs {}", first, second);
        }
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let seed = vector1_seed();
        let parent = ExtendedKey::master(&seed).unwrap().derive_child(0, true).unwrap();
        let public_parent = parent.neuter();
        assert!(!public_parent.is_private());
        assert!(public_parent.to_xprv().is_none());

        let private_child = parent.derive_child(1, false).unwrap();
        let public_child = public_parent.derive_child(1, false).unwrap();

        assert_eq!(private_child.public_key(), public_child.public_key());
        assert_eq!(private_child.chain_code(), public_child.chain_code());
        assert_eq!(private_child.to_xpub(), public_child.to_xpub());
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let public = ExtendedKey::master(&vector1_seed()).unwrap().neuter();
        assert_eq!(
            public.derive_child(0, true).unwrap_err(),
            DerivationError::HardenedFromPublic(0)
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let master = ExtendedKey::master(&vector1_seed()).unwrap();
        assert_eq!(
            master.derive_child(HARDENED, false).unwrap_err(),
            DerivationError::InvalidChildIndex(HARDENED)
        );
    }

    #[test]
    fn test_seed_length_bounds() {
        assert_eq!(
            ExtendedKey::master(&[0u8; 15]).unwrap_err(),
            DerivationError::InvalidSeedLength(15)
        );
        assert_eq!(
            ExtendedKey::master(&[0u8; 65]).unwrap_err(),
            DerivationError::InvalidSeedLength(65)
        );
        assert!(ExtendedKey::master(&[0u8; 64]).is_ok());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let master = ExtendedKey::master(&vector1_seed()).unwrap();
        let debug = format!("{:?}", master);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("e8f32e72"));
    }
}
