//! BIP-39 Mnemonic Codec
//!
//! Validates phrases against a wordlist and its embedded checksum, converts
//! entropy to phrases, and stretches a validated phrase into a 64-byte seed.
//!
//! SECURITY: phrase text, entropy and seeds are zeroized on drop and never
//! appear in `Debug` output.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::log_debug;

use super::wordlist::{Language, Wordlist};

/// Allowed phrase lengths
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

pub const SEED_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MnemonicError {
    #[error("Invalid word count {0}: expected 12, 15, 18, 21 or 24 words")]
    InvalidWordCount(usize),

    #[error("Unknown word '{word}' at position {position}")]
    UnknownWord { word: String, position: usize },

    #[error("Mnemonic checksum mismatch")]
    ChecksumMismatch,

    #[error("Invalid entropy length {0} bytes: expected 16, 20, 24, 28 or 32")]
    InvalidEntropyLength(usize),

    #[error("Mnemonic rejected: {0}")]
    Rejected(String),
}

/// A phrase that passed word and checksum validation
pub struct ValidatedPhrase {
    mnemonic: Zeroizing<bip39::Mnemonic>,
    /// NFKD text, words joined by single spaces
    normalized: Zeroizing<String>,
    entropy: Zeroizing<Vec<u8>>,
    language: Language,
    word_count: usize,
}

impl ValidatedPhrase {
    fn from_mnemonic(mnemonic: Zeroizing<bip39::Mnemonic>, language: Language) -> Self {
        let words: Vec<&str> = mnemonic.words().collect();
        Self {
            normalized: Zeroizing::new(words.join(" ")),
            entropy: Zeroizing::new(mnemonic.to_entropy()),
            word_count: words.len(),
            language,
            mnemonic,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    /// Normalized phrase, the PBKDF2 password
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Phrase rendered with the language's word separator
    pub fn phrase(&self) -> Zeroizing<String> {
        let separator = self.language.word_separator();
        Zeroizing::new(
            self.normalized
                .split(' ')
                .collect::<Vec<_>>()
                .join(separator),
        )
    }
}

impl fmt::Debug for ValidatedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedPhrase")
            .field("language", &self.language)
            .field("word_count", &self.word_count)
            .finish_non_exhaustive()
    }
}

/// 64-byte BIP-39 seed
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed([REDACTED])")
    }
}

/// Validate `phrase` against `wordlist`
pub fn validate(phrase: &str, wordlist: &Wordlist) -> Result<ValidatedPhrase, MnemonicError> {
    let normalized: Zeroizing<String> = Zeroizing::new(phrase.nfkd().collect());
    let words: Vec<&str> = normalized.split_whitespace().collect();

    // Word count is checked here so that unsupported lengths are reported
    // before any membership error
    if !VALID_WORD_COUNTS.contains(&words.len()) {
        return Err(MnemonicError::InvalidWordCount(words.len()));
    }

    let language = wordlist.language();
    let mnemonic = bip39::Mnemonic::parse_in_normalized(language.bip39_language(), &normalized)
        .map_err(|e| map_bip39_error(e, &words))?;

    log_debug!(
        "mnemonic",
        "Phrase validated",
        words = words.len(),
        language = language
    );

    Ok(ValidatedPhrase::from_mnemonic(Zeroizing::new(mnemonic), language))
}

/// Encode entropy as a phrase
pub fn from_entropy(entropy: &[u8], wordlist: &Wordlist) -> Result<ValidatedPhrase, MnemonicError> {
    let language = wordlist.language();
    let mnemonic = bip39::Mnemonic::from_entropy_in(language.bip39_language(), entropy)
        .map_err(|e| match e {
            bip39::Error::BadEntropyBitCount(_) => {
                MnemonicError::InvalidEntropyLength(entropy.len())
            }
            other => map_bip39_error(other, &[]),
        })?;

    Ok(ValidatedPhrase::from_mnemonic(Zeroizing::new(mnemonic), language))
}

/// Fresh phrase from OS randomness
pub fn generate(word_count: usize, wordlist: &Wordlist) -> Result<ValidatedPhrase, MnemonicError> {
    if !VALID_WORD_COUNTS.contains(&word_count) {
        return Err(MnemonicError::InvalidWordCount(word_count));
    }

    let mut entropy = Zeroizing::new(vec![0u8; word_count * 4 / 3]);
    OsRng.fill_bytes(entropy.as_mut_slice());

    from_entropy(&entropy, wordlist)
}

/// PBKDF2-HMAC-SHA512 seed (2048 rounds) from a validated phrase and
/// optional passphrase
pub fn to_seed(phrase: &ValidatedPhrase, passphrase: &str) -> Seed {
    let passphrase: Zeroizing<String> = Zeroizing::new(passphrase.nfkd().collect());
    Seed(phrase.mnemonic.to_seed_normalized(&passphrase))
}

fn map_bip39_error(error: bip39::Error, words: &[&str]) -> MnemonicError {
    match error {
        bip39::Error::BadWordCount(count) => MnemonicError::InvalidWordCount(count),
        bip39::Error::UnknownWord(index) => MnemonicError::UnknownWord {
            word: words.get(index).map(|w| w.to_string()).unwrap_or_default(),
            position: index + 1,
        },
        bip39::Error::BadEntropyBitCount(bits) => MnemonicError::InvalidEntropyLength(bits / 8),
        bip39::Error::InvalidChecksum => MnemonicError::ChecksumMismatch,
        other => MnemonicError::Rejected(other.to_string()),
    }
}
