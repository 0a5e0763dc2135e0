//! Account Derivation
//!
//! Runs the full phrase -> seed -> key tree -> address pipeline.
//!
//! SECURITY: the seed lives only inside `derive_account` and is zeroized on
//! drop; intermediate key-tree nodes are consumed along the path.

use crate::error::HdSignResult;
use crate::{log_info, log_warn};

use super::address::Address;
use super::derivation_path::DerivationPath;
use super::hd_key::ExtendedKey;
use super::mnemonic::{self, ValidatedPhrase};
use super::wordlist::Wordlist;

/// The final node of a derivation, plus where it came from
#[derive(Debug)]
pub struct DerivedAccount {
    pub path: DerivationPath,
    pub address: Address,
    pub key: ExtendedKey,
}

/// Validate `phrase`, stretch it with `passphrase` and walk `path`
pub fn derive_account(
    phrase: &str,
    wordlist: &Wordlist,
    passphrase: &str,
    path: &DerivationPath,
) -> HdSignResult<DerivedAccount> {
    let validated = mnemonic::validate(phrase, wordlist)?;
    derive_from_validated(&validated, passphrase, path)
}

/// Same as [`derive_account`] for a phrase that is already validated
pub fn derive_from_validated(
    phrase: &ValidatedPhrase,
    passphrase: &str,
    path: &DerivationPath,
) -> HdSignResult<DerivedAccount> {
    for warning in path.warnings() {
        log_warn!("keygen", "Non-standard derivation path", path = path, reason = warning);
    }

    let seed = mnemonic::to_seed(phrase, passphrase);
    let key = ExtendedKey::derive_path(seed.as_ref(), path)?;
    let address = key.address();

    log_info!(
        "keygen",
        "Derived account",
        path = path,
        language = phrase.language(),
        address = address
    );

    Ok(DerivedAccount {
        path: path.clone(),
        address,
        key,
    })
}

/// Address only, for callers that do not need the key
pub fn derive_address(
    phrase: &str,
    wordlist: &Wordlist,
    passphrase: &str,
    path: &DerivationPath,
) -> HdSignResult<Address> {
    derive_account(phrase, wordlist, passphrase, path).map(|account| account.address)
}

/// Fresh phrase from OS entropy and the account at `path`
pub fn create_account(
    word_count: usize,
    wordlist: &Wordlist,
    path: &DerivationPath,
) -> HdSignResult<(ValidatedPhrase, DerivedAccount)> {
    let phrase = mnemonic::generate(word_count, wordlist)?;
    let account = derive_from_validated(&phrase, "", path)?;
    Ok((phrase, account))
}
