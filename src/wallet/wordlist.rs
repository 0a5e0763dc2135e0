//! BIP-39 Wordlist Catalog
//!
//! The nine standard 2048-word lists, NFKD-normalized once and indexed for
//! word lookup. The word data itself comes from the `bip39` crate.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use unicode_normalization::UnicodeNormalization;

use crate::log_warn;

/// Number of words in every BIP-39 wordlist
pub const WORDLIST_SIZE: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordlistError {
    #[error("Unsupported mnemonic language: {0}")]
    UnsupportedLanguage(String),

    #[error("Mnemonic words match several languages: {0}")]
    AmbiguousLanguage(String),

    #[error("No wordlist contains every word of the phrase (first unmatched word: {0})")]
    LanguageNotDetected(String),
}

/// Supported wordlist languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    English,
    Spanish,
    French,
    Italian,
    Czech,
    Japanese,
    Korean,
    ChineseSimplified,
    ChineseTraditional,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::Italian,
        Language::Czech,
        Language::Japanese,
        Language::Korean,
        Language::ChineseSimplified,
        Language::ChineseTraditional,
    ];

    /// Canonical tag, as accepted by `--language`
    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Spanish => "spanish",
            Language::French => "french",
            Language::Italian => "italian",
            Language::Czech => "czech",
            Language::Japanese => "japanese",
            Language::Korean => "korean",
            Language::ChineseSimplified => "chinese-simplified",
            Language::ChineseTraditional => "chinese-traditional",
        }
    }

    /// Separator used when rendering a phrase in this language
    pub fn word_separator(&self) -> &'static str {
        match self {
            Language::Japanese => "\u{3000}",
            _ => " ",
        }
    }

    pub(crate) fn bip39_language(&self) -> bip39::Language {
        match self {
            Language::English => bip39::Language::English,
            Language::Spanish => bip39::Language::Spanish,
            Language::French => bip39::Language::French,
            Language::Italian => bip39::Language::Italian,
            Language::Czech => bip39::Language::Czech,
            Language::Japanese => bip39::Language::Japanese,
            Language::Korean => bip39::Language::Korean,
            Language::ChineseSimplified => bip39::Language::SimplifiedChinese,
            Language::ChineseTraditional => bip39::Language::TraditionalChinese,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = WordlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        match normalized.as_str() {
            "default" | "english" => Ok(Language::English),
            "spanish" => Ok(Language::Spanish),
            "french" => Ok(Language::French),
            "italian" => Ok(Language::Italian),
            "czech" => Ok(Language::Czech),
            "japanese" => Ok(Language::Japanese),
            "korean" => Ok(Language::Korean),
            "chinese-simplified" => Ok(Language::ChineseSimplified),
            "chinese-traditional" => Ok(Language::ChineseTraditional),
            _ => Err(WordlistError::UnsupportedLanguage(s.trim().to_string())),
        }
    }
}

/// An immutable, NFKD-normalized 2048-word list
#[derive(Debug)]
pub struct Wordlist {
    language: Language,
    words: Vec<String>,
    index: HashMap<String, u16>,
}

impl Wordlist {
    fn load(language: Language) -> Self {
        let words: Vec<String> = language
            .bip39_language()
            .word_list()
            .iter()
            .map(|w| w.nfkd().collect::<String>())
            .collect();

        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u16))
            .collect();

        Self { language, words, index }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Position of an NFKD-normalized word
    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.index.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Word at `index`; indices are 11-bit so anything above 2047 wraps
    pub fn word(&self, index: u16) -> &str {
        &self.words[usize::from(index) % WORDLIST_SIZE]
    }

    /// The unique word starting with `prefix`, or `prefix` itself when the
    /// prefix is an exact word, matches nothing, or matches several words
    pub fn expand_word<'a>(&'a self, prefix: &'a str) -> &'a str {
        if self.contains(prefix) {
            return prefix;
        }

        let mut matches = self.words.iter().filter(|w| w.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(word), None) => word.as_str(),
            _ => prefix,
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

lazy_static! {
    static ref CATALOG: Vec<Wordlist> = Language::ALL.iter().map(|l| Wordlist::load(*l)).collect();
}

/// Wordlist for a known language
pub fn wordlist(language: Language) -> &'static Wordlist {
    // CATALOG follows Language::ALL, which follows declaration order
    &CATALOG[language as usize]
}

/// Resolve a language tag. A missing or blank tag selects English; a
/// non-empty tag that names no wordlist is rejected.
pub fn resolve(tag: Option<&str>) -> Result<&'static Wordlist, WordlistError> {
    match tag.map(str::trim) {
        None | Some("") => Ok(wordlist(Language::default())),
        Some(t) => Ok(wordlist(t.parse()?)),
    }
}

/// Like [`resolve`], but an unknown tag falls back to English with a warning
pub fn resolve_or_default(tag: Option<&str>) -> &'static Wordlist {
    match resolve(tag) {
        Ok(list) => list,
        Err(e) => {
            log_warn!("wordlist", "Unknown language, using english", reason = e);
            wordlist(Language::default())
        }
    }
}

/// Find the single language whose wordlist contains every word of `phrase`
pub fn detect_language(phrase: &str) -> Result<Language, WordlistError> {
    let normalized: String = phrase.nfkd().collect();
    let words: Vec<&str> = normalized.split_whitespace().collect();

    let first_word = words.first().map(|w| w.to_string()).unwrap_or_default();
    let mut candidates: Vec<Language> = Language::ALL.to_vec();

    for word in &words {
        candidates.retain(|l| wordlist(*l).contains(word));
        if candidates.is_empty() {
            return Err(WordlistError::LanguageNotDetected(word.to_string()));
        }
    }

    match candidates.as_slice() {
        [] => Err(WordlistError::LanguageNotDetected(first_word)),
        [single] => Ok(*single),
        [Language::ChineseSimplified, Language::ChineseTraditional] => {
            Ok(Language::ChineseSimplified)
        }
        many => Err(WordlistError::AmbiguousLanguage(
            many.iter().map(|l| l.tag()).collect::<Vec<_>>().join(", "),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_lists_have_2048_unique_words() {
        for language in Language::ALL {
            let list = wordlist(language);
            assert_eq!(list.len(), WORDLIST_SIZE, "{}", language);
            assert_eq!(list.index.len(), WORDLIST_SIZE, "{} has duplicates", language);
            assert_eq!(list.language(), language);
        }
    }

    #[test]
    fn test_english_lookup() {
        let list = wordlist(Language::English);
        assert_eq!(list.word(0), "abandon");
        assert_eq!(list.word(2047), "zoo");
        assert_eq!(list.index_of("about"), Some(3));
        assert_eq!(list.index_of("notaword"), None);
    }

    #[test]
    fn test_resolve_tags() {
        assert_eq!(resolve(None).unwrap().language(), Language::English);
        assert_eq!(resolve(Some("")).unwrap().language(), Language::English);
        assert_eq!(resolve(Some("  ")).unwrap().language(), Language::English);
        assert_eq!(resolve(Some("default")).unwrap().language(), Language::English);
        assert_eq!(resolve(Some("Japanese")).unwrap().language(), Language::Japanese);
        assert_eq!(
            resolve(Some("chinese_traditional")).unwrap().language(),
            Language::ChineseTraditional
        );
    }

    #[test]
    fn test_resolve_unknown_tag() {
        assert_eq!(
            resolve(Some("klingon")).unwrap_err(),
            WordlistError::UnsupportedLanguage("klingon".to_string())
        );
        assert_eq!(resolve_or_default(Some("klingon")).language(), Language::English);
    }

    #[test]
    fn test_expand_word() {
        let list = wordlist(Language::English);
        assert_eq!(list.expand_word("abando"), "abandon");
        assert_eq!(list.expand_word("zoo"), "zoo");
        // "ab" prefixes several words
        assert_eq!(list.expand_word("ab"), "ab");
        assert_eq!(list.expand_word("qqq"), "qqq");
    }

    #[test]
    fn test_detect_language() {
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        assert_eq!(detect_language(phrase).unwrap(), Language::English);

        assert!(matches!(
            detect_language("abandon notaword"),
            Err(WordlistError::LanguageNotDetected(w)) if w == "notaword"
        ));
    }

    #[test]
    fn test_detect_language_prefers_simplified_chinese() {
        // 的 appears in both Chinese lists
        assert_eq!(detect_language("的 的 的").unwrap(), Language::ChineseSimplified);
    }
}
