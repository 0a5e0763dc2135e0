//! Key Derivation Paths
//!
//! Parses and renders BIP-32 paths such as `m/44'/60'/0'/0/0`, and flags
//! paths that depart from the BIP-44 Ethereum layout.

use std::fmt;
use std::str::FromStr;

use super::hd_key::DerivationError;

/// Standard BIP purposes
pub mod bip_purposes {
    pub const BIP44: u32 = 44;
}

/// Coin types from SLIP-0044
pub mod coin_types {
    pub const ETHEREUM: u32 = 60;
}

/// Hardened offset for BIP-32 derivation
pub const HARDENED: u32 = 0x80000000;

/// First Ethereum account, external chain
pub const DEFAULT_PATH: &str = "m/44'/60'/0'/0/0";

/// Single component of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationComponent {
    pub index: u32,
    pub hardened: bool,
}

impl DerivationComponent {
    pub fn new(index: u32, hardened: bool) -> Self {
        Self { index, hardened }
    }

    pub fn normal(index: u32) -> Self {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Self {
        Self::new(index, true)
    }

    /// Get the full index including hardened bit
    pub fn full_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }
}

impl fmt::Display for DerivationComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for DerivationComponent {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DerivationError::InvalidPath("empty path component".to_string()));
        }

        let (number_str, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(rest) => (rest, true),
            None => (s, false),
        };

        if number_str.is_empty() || !number_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DerivationError::InvalidPath(format!(
                "invalid path component '{}'",
                s
            )));
        }

        let index: u32 = number_str.parse().map_err(|_| {
            DerivationError::InvalidPath(format!("path component '{}' is out of range", s))
        })?;

        if index >= HARDENED {
            return Err(DerivationError::InvalidPath(format!(
                "path component {} exceeds maximum value {}",
                index,
                HARDENED - 1
            )));
        }

        Ok(DerivationComponent::new(index, hardened))
    }
}

/// Parsed derivation path
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: Vec<DerivationComponent>,
}

impl DerivationPath {
    /// The master path `m`
    pub fn master() -> Self {
        Self::default()
    }

    pub fn from_components(components: Vec<DerivationComponent>) -> Self {
        Self { components }
    }

    /// `m/44'/60'/0'/0/{account_index}`
    pub fn ethereum(account_index: u32) -> Self {
        Self::from_components(vec![
            DerivationComponent::hardened(bip_purposes::BIP44),
            DerivationComponent::hardened(coin_types::ETHEREUM),
            DerivationComponent::hardened(0),
            DerivationComponent::normal(0),
            DerivationComponent::normal(account_index & !HARDENED),
        ])
    }

    pub fn components(&self) -> &[DerivationComponent] {
        &self.components
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn is_master(&self) -> bool {
        self.components.is_empty()
    }

    /// Append one component
    pub fn child(&self, component: DerivationComponent) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Self { components }
    }

    pub fn purpose(&self) -> Option<u32> {
        self.components.first().map(|c| c.index)
    }

    pub fn coin_type(&self) -> Option<u32> {
        self.components.get(1).map(|c| c.index)
    }

    /// Ways this path departs from the BIP-44 Ethereum layout. An empty list
    /// means the path is standard; none of these make the path unusable.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(purpose) = self.purpose() {
            if purpose != bip_purposes::BIP44 {
                warnings.push(format!("Non-standard purpose: {}. Ethereum uses 44", purpose));
            }
        }

        if let Some(coin_type) = self.coin_type() {
            if coin_type != coin_types::ETHEREUM {
                warnings.push(format!(
                    "Coin type {} is not standard for Ethereum (expected {})",
                    coin_type,
                    coin_types::ETHEREUM
                ));
            }
        }

        if self.components.len() >= 3 && self.components.iter().take(3).any(|c| !c.hardened) {
            warnings.push("Purpose, coin type, and account should be hardened (')".to_string());
        }

        if let Some(change) = self.components.get(3) {
            if change.index > 1 {
                warnings.push(format!(
                    "Non-standard change value: {}. Should be 0 (external) or 1 (internal)",
                    change.index
                ));
            }
        }

        warnings
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();

        let rest = trimmed
            .strip_prefix('m')
            .or_else(|| trimmed.strip_prefix('M'))
            .ok_or_else(|| {
                DerivationError::InvalidPath(format!(
                    "derivation path '{}' must start with 'm'",
                    trimmed
                ))
            })?;

        if rest.is_empty() {
            return Ok(Self::master());
        }

        let rest = rest.strip_prefix('/').ok_or_else(|| {
            DerivationError::InvalidPath(format!("expected '/' after 'm' in '{}'", trimmed))
        })?;

        let components = rest
            .split('/')
            .map(str::parse)
            .collect::<Result<Vec<DerivationComponent>, _>>()?;

        Ok(Self { components })
    }
}
