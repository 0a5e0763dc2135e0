//! hdsign Core Library
//!
//! Offline Ethereum key derivation and typed-data signing.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: BIP-39 phrases, BIP-32 key trees, EIP-55 addresses
//! - **eip712**: Typed structured data hashing and signing
//! - **signing**: Recoverable secp256k1 signatures and EIP-191 envelopes
//! - **config**: Per-invocation settings for the `hdsign` binary
//!
//! # Security
//!
//! This crate uses `zeroize` to securely clear sensitive data from memory.
//! Phrases, seeds and private keys are zeroed when dropped and never logged.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdsign::wallet::{derive_address, wordlist, DerivationPath, Language};
//!
//! let path: DerivationPath = "m/44'/60'/0'/0/0".parse()?;
//! let address = derive_address(phrase, wordlist::wordlist(Language::English), "", &path)?;
//! println!("{}", address);
//! ```

pub mod config;
pub mod eip712;
pub mod error;
pub mod signing;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use error::{ErrorCategory, ErrorCode, HdSignError, HdSignResult};
pub use eip712::{hash_typed_data, sign_typed_data, Eip712Domain, TypedData};
pub use signing::{Signature, SignableMessage};
pub use utils::keccak256;
pub use wallet::{
    derive_account, derive_address, Address, DerivationPath, DerivedAccount, ExtendedKey,
    Language,
};
