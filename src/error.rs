//! Unified error types for hdsign
//!
//! Module-level errors (`MnemonicError`, `DerivationError`, `Eip712Error`, ...)
//! all convert into [`HdSignError`], which carries a stable [`ErrorCode`] and
//! the category the failure belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::eip712::Eip712Error;
use crate::signing::SigningError;
use crate::wallet::{AddressError, DerivationError, MnemonicError, WordlistError};

/// Main error type for all hdsign operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdSignError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl HdSignError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDocument, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for HdSignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for HdSignError {}

/// Broad failure classes. None of them is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InputValidation,
    CryptographicDerivation,
    Schema,
    Internal,
}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidWordCount,
    UnknownWord,
    ChecksumMismatch,
    UnsupportedLanguage,
    AmbiguousLanguage,
    InvalidEntropy,
    InvalidPath,
    InvalidDocument,
    InvalidAddress,
    InvalidSignature,
    InvalidHex,
    InvalidInput,

    // Crypto errors
    InvalidScalar,
    InvalidPrivateKey,
    InvalidSeed,
    InvalidChildIndex,
    HardenedFromPublic,

    // Schema errors
    UnknownType,
    CyclicTypeReference,
    FieldValueMismatch,
    MissingField,

    // Internal
    Internal,
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::InvalidWordCount
            | ErrorCode::UnknownWord
            | ErrorCode::ChecksumMismatch
            | ErrorCode::UnsupportedLanguage
            | ErrorCode::AmbiguousLanguage
            | ErrorCode::InvalidEntropy
            | ErrorCode::InvalidPath
            | ErrorCode::InvalidDocument
            | ErrorCode::InvalidAddress
            | ErrorCode::InvalidSignature
            | ErrorCode::InvalidHex
            | ErrorCode::InvalidInput => ErrorCategory::InputValidation,

            ErrorCode::InvalidScalar
            | ErrorCode::InvalidPrivateKey
            | ErrorCode::InvalidSeed
            | ErrorCode::InvalidChildIndex
            | ErrorCode::HardenedFromPublic => ErrorCategory::CryptographicDerivation,

            ErrorCode::UnknownType
            | ErrorCode::CyclicTypeReference
            | ErrorCode::FieldValueMismatch
            | ErrorCode::MissingField => ErrorCategory::Schema,

            ErrorCode::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable snake_case name, as used in CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidWordCount => "invalid_word_count",
            ErrorCode::UnknownWord => "unknown_word",
            ErrorCode::ChecksumMismatch => "checksum_mismatch",
            ErrorCode::UnsupportedLanguage => "unsupported_language",
            ErrorCode::AmbiguousLanguage => "ambiguous_language",
            ErrorCode::InvalidEntropy => "invalid_entropy",
            ErrorCode::InvalidPath => "invalid_path",
            ErrorCode::InvalidDocument => "invalid_document",
            ErrorCode::InvalidAddress => "invalid_address",
            ErrorCode::InvalidSignature => "invalid_signature",
            ErrorCode::InvalidHex => "invalid_hex",
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::InvalidScalar => "invalid_scalar",
            ErrorCode::InvalidPrivateKey => "invalid_private_key",
            ErrorCode::InvalidSeed => "invalid_seed",
            ErrorCode::InvalidChildIndex => "invalid_child_index",
            ErrorCode::HardenedFromPublic => "hardened_from_public",
            ErrorCode::UnknownType => "unknown_type",
            ErrorCode::CyclicTypeReference => "cyclic_type_reference",
            ErrorCode::FieldValueMismatch => "field_value_mismatch",
            ErrorCode::MissingField => "missing_field",
            ErrorCode::Internal => "internal",
        }
    }
}

/// Result type alias for hdsign operations
pub type HdSignResult<T> = Result<T, HdSignError>;

// Conversions from module errors

impl From<WordlistError> for HdSignError {
    fn from(e: WordlistError) -> Self {
        let code = match e {
            WordlistError::UnsupportedLanguage(_) => ErrorCode::UnsupportedLanguage,
            WordlistError::AmbiguousLanguage(_) => ErrorCode::AmbiguousLanguage,
            WordlistError::LanguageNotDetected(_) => ErrorCode::UnknownWord,
        };
        HdSignError::new(code, e.to_string())
    }
}

impl From<MnemonicError> for HdSignError {
    fn from(e: MnemonicError) -> Self {
        let code = match e {
            MnemonicError::InvalidWordCount(_) => ErrorCode::InvalidWordCount,
            MnemonicError::UnknownWord { .. } => ErrorCode::UnknownWord,
            MnemonicError::ChecksumMismatch => ErrorCode::ChecksumMismatch,
            MnemonicError::InvalidEntropyLength(_) => ErrorCode::InvalidEntropy,
            MnemonicError::Rejected(_) => ErrorCode::InvalidInput,
        };
        HdSignError::new(code, e.to_string())
    }
}

impl From<DerivationError> for HdSignError {
    fn from(e: DerivationError) -> Self {
        let code = match e {
            DerivationError::InvalidPath(_) => ErrorCode::InvalidPath,
            DerivationError::InvalidScalar(_) => ErrorCode::InvalidScalar,
            DerivationError::InvalidSeedLength(_) => ErrorCode::InvalidSeed,
            DerivationError::InvalidChildIndex(_) => ErrorCode::InvalidChildIndex,
            DerivationError::HardenedFromPublic(_) => ErrorCode::HardenedFromPublic,
        };
        HdSignError::new(code, e.to_string())
    }
}

impl From<AddressError> for HdSignError {
    fn from(e: AddressError) -> Self {
        HdSignError::new(ErrorCode::InvalidAddress, e.to_string())
    }
}

impl From<Eip712Error> for HdSignError {
    fn from(e: Eip712Error) -> Self {
        let code = match e {
            Eip712Error::InvalidJson(_) | Eip712Error::InvalidDocument(_) => {
                ErrorCode::InvalidDocument
            }
            Eip712Error::UnknownType(_) | Eip712Error::InvalidType(_) => ErrorCode::UnknownType,
            Eip712Error::CyclicTypeReference(_) => ErrorCode::CyclicTypeReference,
            Eip712Error::FieldValueMismatch { .. } => ErrorCode::FieldValueMismatch,
            Eip712Error::MissingField(_) => ErrorCode::MissingField,
            Eip712Error::Signing(ref inner) => return HdSignError::from(inner.clone()),
        };
        HdSignError::new(code, e.to_string())
    }
}

impl From<SigningError> for HdSignError {
    fn from(e: SigningError) -> Self {
        let code = match e {
            SigningError::InvalidPrivateKey(_) => ErrorCode::InvalidPrivateKey,
            SigningError::InvalidSignature(_) | SigningError::RecoveryFailed(_) => {
                ErrorCode::InvalidSignature
            }
            SigningError::InvalidMessage(_) => ErrorCode::InvalidInput,
        };
        HdSignError::new(code, e.to_string())
    }
}

impl From<serde_json::Error> for HdSignError {
    fn from(e: serde_json::Error) -> Self {
        HdSignError::new(ErrorCode::InvalidDocument, e.to_string())
    }
}

impl From<hex::FromHexError> for HdSignError {
    fn from(e: hex::FromHexError) -> Self {
        HdSignError::new(ErrorCode::InvalidHex, e.to_string())
    }
}

impl From<std::io::Error> for HdSignError {
    fn from(e: std::io::Error) -> Self {
        HdSignError::new(ErrorCode::Internal, e.to_string())
    }
}
