//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data: the JSON document, the
//! signing domain and the parsed field-type descriptor.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::signing::SigningError;

/// Name of the implicit domain struct
pub const EIP712_DOMAIN: &str = "EIP712Domain";

/// Type schema: struct name -> ordered fields
pub type Types = HashMap<String, Vec<TypedDataField>>;

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "Person[]")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The EIP-712 domain separator data
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The current major version of the signing domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The EIP-155 chain ID, as a number, decimal string or hex string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<serde_json::Value>,

    /// The address of the contract that will verify the signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    /// An optional disambiguating salt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// Fields of the domain struct, in the fixed EIP-712 order, for the keys
    /// that are present
    pub fn domain_type(&self) -> Vec<TypedDataField> {
        let candidates = [
            ("name", "string", self.name.is_some()),
            ("version", "string", self.version.is_some()),
            ("chainId", "uint256", self.chain_id.is_some()),
            ("verifyingContract", "address", self.verifying_contract.is_some()),
            ("salt", "bytes32", self.salt.is_some()),
        ];

        candidates
            .iter()
            .filter(|(_, _, present)| *present)
            .map(|(name, type_name, _)| TypedDataField::new(*name, *type_name))
            .collect()
    }

    /// The domain as a JSON object, for hashing as a struct
    pub fn to_value(&self) -> Result<serde_json::Value, Eip712Error> {
        serde_json::to_value(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }
}

/// Complete EIP-712 typed data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields), without `EIP712Domain`
    pub types: Types,

    /// The name of the primary type being signed; inferred when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,

    /// The EIP-712 domain
    pub domain: Eip712Domain,

    /// The actual message data to sign
    pub message: serde_json::Value,
}

impl TypedData {
    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))?;
        Self::from_value(value)
    }

    /// Build from an already parsed JSON document
    pub fn from_value(value: serde_json::Value) -> Result<Self, Eip712Error> {
        let mut typed_data: TypedData = serde_json::from_value(value)
            .map_err(|e| Eip712Error::InvalidDocument(e.to_string()))?;
        // The domain type is always derived from the domain keys
        typed_data.types.remove(EIP712_DOMAIN);
        Ok(typed_data)
    }

    /// Assemble a document from its parts
    pub fn from_parts(
        domain: Eip712Domain,
        mut types: Types,
        primary_type: Option<String>,
        message: serde_json::Value,
    ) -> Self {
        types.remove(EIP712_DOMAIN);
        Self {
            types,
            primary_type,
            domain,
            message,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// The explicit primary type, or the single type no other type references
    pub fn primary_type(&self) -> Result<String, Eip712Error> {
        match &self.primary_type {
            Some(name) => Ok(name.clone()),
            None => infer_primary_type(&self.types),
        }
    }

    /// Validate the typed data structure
    pub fn validate(&self) -> Result<(), Eip712Error> {
        let primary_type = self.primary_type()?;
        if !self.types.contains_key(&primary_type) {
            return Err(Eip712Error::UnknownType(primary_type));
        }

        for (type_name, fields) in &self.types {
            let mut seen = HashSet::new();
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(Eip712Error::InvalidDocument(format!(
                        "duplicate field '{}' in type {}",
                        field.name, type_name
                    )));
                }
                FieldType::parse(&field.type_name, &self.types)?;
            }
        }

        Ok(())
    }
}

/// The unique struct type that no other struct type references
pub fn infer_primary_type(types: &Types) -> Result<String, Eip712Error> {
    let referenced: HashSet<&str> = types
        .iter()
        .flat_map(|(owner, fields)| {
            fields
                .iter()
                .map(|f| core_type(&f.type_name))
                .filter(move |core| *core != owner.as_str())
        })
        .filter(|core| types.contains_key(*core))
        .collect();

    let mut candidates: Vec<&String> = types
        .keys()
        .filter(|name| !referenced.contains(name.as_str()))
        .collect();

    match candidates.len() {
        1 => Ok(candidates.remove(0).clone()),
        _ => Err(Eip712Error::InvalidDocument(
            "Unable to determine primary type".to_string(),
        )),
    }
}

/// Strip every array suffix: `Person[][3]` -> `Person`
pub fn core_type(type_name: &str) -> &str {
    match type_name.find('[') {
        Some(pos) => &type_name[..pos],
        None => type_name,
    }
}

/// Fixed-size types that encode directly into one 32-byte slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomicType {
    Address,
    Bool,
    /// Bit width, 8..=256 in steps of 8
    Uint(u16),
    Int(u16),
    /// Byte width, 1..=32
    FixedBytes(u8),
}

/// Variable-length types, encoded as the keccak256 of their content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicType {
    Bytes,
    String,
}

/// Parsed EIP-712 field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Atomic(AtomicType),
    Dynamic(DynamicType),
    Struct(String),
    Array {
        element: Box<FieldType>,
        length: Option<usize>,
    },
}

impl FieldType {
    /// Parse a type string against the schema. Only the last array suffix is
    /// peeled per level, so `uint8[2][]` is a dynamic array of `uint8[2]`.
    pub fn parse(type_name: &str, types: &Types) -> Result<Self, Eip712Error> {
        if let Some(stripped) = type_name.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;
            let length = match &stripped[open + 1..] {
                "" => None,
                digits => Some(
                    digits
                        .parse::<usize>()
                        .map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?,
                ),
            };
            let element = Self::parse(&stripped[..open], types)?;
            return Ok(FieldType::Array {
                element: Box::new(element),
                length,
            });
        }

        match type_name {
            "address" => return Ok(FieldType::Atomic(AtomicType::Address)),
            "bool" => return Ok(FieldType::Atomic(AtomicType::Bool)),
            "bytes" => return Ok(FieldType::Dynamic(DynamicType::Bytes)),
            "string" => return Ok(FieldType::Dynamic(DynamicType::String)),
            _ => {}
        }

        if let Some(bits) = type_name.strip_prefix("uint").and_then(parse_int_width) {
            return Ok(FieldType::Atomic(AtomicType::Uint(bits)));
        }
        if let Some(bits) = type_name.strip_prefix("int").and_then(parse_int_width) {
            return Ok(FieldType::Atomic(AtomicType::Int(bits)));
        }
        if let Some(size) = type_name.strip_prefix("bytes").and_then(parse_bytes_width) {
            return Ok(FieldType::Atomic(AtomicType::FixedBytes(size)));
        }

        if types.contains_key(type_name) {
            return Ok(FieldType::Struct(type_name.to_string()));
        }

        Err(Eip712Error::UnknownType(type_name.to_string()))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Atomic(AtomicType::Address) => write!(f, "address"),
            FieldType::Atomic(AtomicType::Bool) => write!(f, "bool"),
            FieldType::Atomic(AtomicType::Uint(bits)) => write!(f, "uint{}", bits),
            FieldType::Atomic(AtomicType::Int(bits)) => write!(f, "int{}", bits),
            FieldType::Atomic(AtomicType::FixedBytes(size)) => write!(f, "bytes{}", size),
            FieldType::Dynamic(DynamicType::Bytes) => write!(f, "bytes"),
            FieldType::Dynamic(DynamicType::String) => write!(f, "string"),
            FieldType::Struct(name) => write!(f, "{}", name),
            FieldType::Array { element, length: Some(n) } => write!(f, "{}[{}]", element, n),
            FieldType::Array { element, length: None } => write!(f, "{}[]", element),
        }
    }
}

/// `""` (alias for 256) or a multiple of 8 in 8..=256
fn parse_int_width(suffix: &str) -> Option<u16> {
    if suffix.is_empty() {
        return Some(256);
    }
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let bits: u16 = suffix.parse().ok()?;
    (bits >= 8 && bits <= 256 && bits % 8 == 0).then_some(bits)
}

/// 1..=32
fn parse_bytes_width(suffix: &str) -> Option<u8> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let size: u8 = suffix.parse().ok()?;
    (1..=32).contains(&size).then_some(size)
}

/// Errors that can occur during EIP-712 operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid typed data document: {0}")]
    InvalidDocument(String),

    #[error("No definition of type {0}")]
    UnknownType(String),

    #[error("Malformed type: {0}")]
    InvalidType(String),

    #[error("Struct nesting too deep at type {0}; the schema is likely cyclic")]
    CyclicTypeReference(String),

    #[error("Invalid value for {field} of type {type_name}: {reason}")]
    FieldValueMismatch {
        field: String,
        type_name: String,
        reason: String,
    },

    #[error("Missing value for field {0}")]
    MissingField(String),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

#[cfg(test)]
mod type_tests {
    use super::*;

    fn schema() -> Types {
        let mut types = Types::new();
        types.insert(
            "Person".to_string(),
            vec![
                TypedDataField::new("name", "string"),
                TypedDataField::new("wallet", "address"),
            ],
        );
        types.insert(
            "Mail".to_string(),
            vec![
                TypedDataField::new("from", "Person"),
                TypedDataField::new("to", "Person[]"),
                TypedDataField::new("contents", "string"),
            ],
        );
        types
    }

    #[test]
    fn test_parse_atomic_types() {
        let types = Types::new();
        assert_eq!(
            FieldType::parse("address", &types).unwrap(),
            FieldType::Atomic(AtomicType::Address)
        );
        assert_eq!(
            FieldType::parse("uint8", &types).unwrap(),
            FieldType::Atomic(AtomicType::Uint(8))
        );
        assert_eq!(
            FieldType::parse("uint", &types).unwrap(),
            FieldType::Atomic(AtomicType::Uint(256))
        );
        assert_eq!(
            FieldType::parse("int256", &types).unwrap(),
            FieldType::Atomic(AtomicType::Int(256))
        );
        assert_eq!(
            FieldType::parse("bytes32", &types).unwrap(),
            FieldType::Atomic(AtomicType::FixedBytes(32))
        );
        assert_eq!(
            FieldType::parse("bytes", &types).unwrap(),
            FieldType::Dynamic(DynamicType::Bytes)
        );
    }

    #[test]
    fn test_parse_rejects_bad_widths() {
        let types = Types::new();
        for bad in ["uint7", "uint257", "int0", "bytes0", "bytes33", "uint+8"] {
            assert!(FieldType::parse(bad, &types).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_parse_arrays() {
        let types = schema();
        assert_eq!(
            FieldType::parse("Person[]", &types).unwrap(),
            FieldType::Array {
                element: Box::new(FieldType::Struct("Person".to_string())),
                length: None
            }
        );

        let nested = FieldType::parse("uint8[2][]", &types).unwrap();
        assert_eq!(nested.to_string(), "uint8[2][]");
        match nested {
            FieldType::Array { element, length: None } => {
                assert_eq!(element.to_string(), "uint8[2]");
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            FieldType::parse("uint8[x]", &types),
            Err(Eip712Error::InvalidType(_))
        ));
    }

    #[test]
    fn test_unknown_struct() {
        assert_eq!(
            FieldType::parse("Animal", &schema()).unwrap_err(),
            Eip712Error::UnknownType("Animal".to_string())
        );
    }

    #[test]
    fn test_infer_primary_type() {
        assert_eq!(infer_primary_type(&schema()).unwrap(), "Mail");

        let mut two_roots = schema();
        two_roots.insert("Other".to_string(), vec![TypedDataField::new("x", "uint256")]);
        assert!(matches!(
            infer_primary_type(&two_roots),
            Err(Eip712Error::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_domain_type_order() {
        let domain = Eip712Domain {
            salt: Some("0x00".to_string()),
            name: Some("Test".to_string()),
            chain_id: Some(serde_json::json!(1)),
            ..Default::default()
        };
        let names: Vec<String> = domain.domain_type().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["name", "chainId", "salt"]);
    }

    #[test]
    fn test_domain_rejects_unknown_keys() {
        let json = r#"{
            "types": {"T": [{"name": "x", "type": "uint256"}]},
            "primaryType": "T",
            "domain": {"name": "A", "color": "blue"},
            "message": {"x": 1}
        }"#;
        assert!(matches!(
            TypedData::from_json(json),
            Err(Eip712Error::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_domain_entry_in_types_is_dropped() {
        let json = r#"{
            "types": {
                "EIP712Domain": [{"name": "name", "type": "string"}],
                "T": [{"name": "x", "type": "uint256"}]
            },
            "domain": {"name": "A"},
            "message": {"x": 1}
        }"#;
        let typed_data = TypedData::from_json(json).unwrap();
        assert!(!typed_data.types.contains_key(EIP712_DOMAIN));
        assert_eq!(typed_data.primary_type().unwrap(), "T");
        typed_data.validate().unwrap();
    }

    #[test]
    fn test_validate_reports_duplicate_fields() {
        let mut types = Types::new();
        types.insert(
            "T".to_string(),
            vec![TypedDataField::new("x", "uint256"), TypedDataField::new("x", "bool")],
        );
        let typed_data = TypedData::from_parts(
            Eip712Domain::default(),
            types,
            Some("T".to_string()),
            serde_json::json!({}),
        );
        assert!(matches!(
            typed_data.validate(),
            Err(Eip712Error::InvalidDocument(_))
        ));
    }
}
