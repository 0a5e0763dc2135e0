//! Wallet Module
//!
//! BIP-39 phrases, BIP-32 key trees and Ethereum addresses.

pub mod address;
pub mod derivation_path;
pub mod hd_key;
pub mod keygen;
pub mod mnemonic;
pub mod wordlist;

pub use address::{to_checksum_address, Address, AddressError};
pub use derivation_path::{DerivationComponent, DerivationPath, DEFAULT_PATH, HARDENED};
pub use hd_key::{DerivationError, ExtendedKey};
pub use keygen::{create_account, derive_account, derive_address, DerivedAccount};
pub use mnemonic::{MnemonicError, Seed, ValidatedPhrase};
pub use wordlist::{detect_language, resolve, resolve_or_default, Language, Wordlist, WordlistError};
