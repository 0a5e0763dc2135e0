//! Per-invocation Settings
//!
//! No config files and no environment variables: every setting arrives on
//! the command line (or through the builder methods, for library callers)
//! and secrets are held as [`SecretString`] until the moment they are used.

use secrecy::{ExposeSecret, SecretString};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::eip712::{self, TypedData};
use crate::error::{HdSignError, HdSignResult};
use crate::signing::{self, Signature};
use crate::wallet::{self, DerivationPath, DerivedAccount, Language, ValidatedPhrase, DEFAULT_PATH};

/// Where a typed-data document is read from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentSource {
    #[default]
    Stdin,
    File(PathBuf),
}

impl DocumentSource {
    pub fn from_option(path: Option<PathBuf>) -> Self {
        path.map(DocumentSource::File).unwrap_or_default()
    }

    pub fn read_to_string(&self) -> HdSignResult<String> {
        match self {
            DocumentSource::Stdin => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                Ok(buffer)
            }
            DocumentSource::File(path) => fs::read_to_string(path).map_err(|e| {
                HdSignError::from(e).with_details(path.display().to_string())
            }),
        }
    }

    /// Read and parse the document
    pub fn load(&self) -> HdSignResult<TypedData> {
        Ok(TypedData::from_json(&self.read_to_string()?)?)
    }
}

/// Settings for `derive`
#[derive(Debug)]
pub struct DeriveConfig {
    pub phrase: SecretString,
    /// Unrecognized tags fall back to English with a warning
    pub language: Option<String>,
    pub path: DerivationPath,
    pub passphrase: SecretString,
}

impl DeriveConfig {
    /// Default path, English, empty passphrase
    pub fn new(phrase: &str) -> HdSignResult<Self> {
        Ok(Self {
            phrase: secret(phrase),
            language: None,
            path: DEFAULT_PATH.parse()?,
            passphrase: SecretString::from(String::new()),
        })
    }

    /// Words given as separate arguments
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> HdSignResult<Self> {
        let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
        let joined = Zeroizing::new(words.join(" "));
        Self::new(&joined)
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_path(mut self, path: &str) -> HdSignResult<Self> {
        self.path = path.parse()?;
        Ok(self)
    }

    pub fn with_passphrase(mut self, passphrase: &str) -> Self {
        self.passphrase = secret(passphrase);
        self
    }

    pub fn run(&self) -> HdSignResult<DerivedAccount> {
        let wordlist = wallet::resolve_or_default(self.language.as_deref());
        wallet::derive_account(
            self.phrase.expose_secret(),
            wordlist,
            self.passphrase.expose_secret(),
            &self.path,
        )
    }
}

/// Settings for `sign`
#[derive(Debug)]
pub struct SignConfig {
    pub private_key: SecretString,
    pub document: DocumentSource,
}

impl SignConfig {
    pub fn new(private_key: &str) -> Self {
        Self {
            private_key: secret(private_key),
            document: DocumentSource::Stdin,
        }
    }

    pub fn with_document(mut self, document: DocumentSource) -> Self {
        self.document = document;
        self
    }

    pub fn run(&self) -> HdSignResult<Signature> {
        let key = signing::parse_private_key_hex(self.private_key.expose_secret())?;
        let typed_data = self.document.load()?;
        Ok(eip712::sign_typed_data(&typed_data, &key)?)
    }
}

/// `to_owned` leaves len == capacity, so boxing the string does not reallocate
fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

/// Settings for `generate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    pub word_count: usize,
    pub language: Option<String>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            word_count: 12,
            language: None,
        }
    }
}

impl GenerateConfig {
    pub fn run(&self) -> HdSignResult<ValidatedPhrase> {
        let wordlist = wallet::resolve_or_default(self.language.as_deref());
        Ok(wallet::mnemonic::generate(self.word_count, wordlist)?)
    }

    pub fn language(&self) -> Language {
        wallet::resolve_or_default(self.language.as_deref()).language()
    }
}
