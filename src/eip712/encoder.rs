//! EIP-712 Type Encoding
//!
//! Implements the encoding rules for EIP-712 typed data: the canonical type
//! string, and the 32-byte slot each field value contributes to `encodeData`.

use ethers_core::types::U256;
use serde_json::Value;
use std::collections::BTreeSet;

use super::types::*;
use crate::utils::{decode_hex, keccak256};
use crate::wallet::Address;

/// Struct nesting beyond this depth is treated as a runaway cyclic schema
pub const MAX_DEPTH: usize = 64;

/// Encode a type string for a struct type
/// Format: "TypeName(type1 name1,type2 name2,...)" followed by every
/// referenced struct type, sorted by name
pub fn encode_type(type_name: &str, types: &Types) -> Result<String, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::UnknownType(type_name.to_string()))?;

    let mut result = format_type_string(type_name, fields);

    // BTreeSet iterates in sorted order
    for dep in find_type_dependencies(type_name, types)? {
        if dep == type_name {
            continue;
        }
        if let Some(dep_fields) = types.get(&dep) {
            result.push_str(&format_type_string(&dep, dep_fields));
        }
    }

    Ok(result)
}

/// Format a single type string
fn format_type_string(type_name: &str, fields: &[TypedDataField]) -> String {
    let field_strs: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect();

    format!("{}({})", type_name, field_strs.join(","))
}

/// Every struct type reachable from `type_name`, itself included
pub fn find_type_dependencies(
    type_name: &str,
    types: &Types,
) -> Result<BTreeSet<String>, Eip712Error> {
    let mut dependencies = BTreeSet::new();
    let mut to_visit = vec![type_name.to_string()];

    while let Some(current) = to_visit.pop() {
        if dependencies.contains(&current) {
            continue;
        }

        let fields = types
            .get(&current)
            .ok_or_else(|| Eip712Error::UnknownType(current.clone()))?;

        for field in fields {
            let core = core_type(&field.type_name);
            if is_solidity_type(core) {
                continue;
            }
            if !types.contains_key(core) {
                return Err(Eip712Error::UnknownType(core.to_string()));
            }
            if !dependencies.contains(core) {
                to_visit.push(core.to_string());
            }
        }

        dependencies.insert(current);
    }

    Ok(dependencies)
}

/// Built-in EIP-712 types, without array suffixes
pub fn is_solidity_type(type_name: &str) -> bool {
    matches!(
        FieldType::parse(type_name, &Types::new()),
        Ok(FieldType::Atomic(_)) | Ok(FieldType::Dynamic(_))
    )
}

/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, types: &Types) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(encode_type(type_name, types)?.as_bytes()))
}

/// encodeData: typeHash followed by one 32-byte slot per field
pub fn encode_data(
    type_name: &str,
    types: &Types,
    data: &Value,
    depth: usize,
) -> Result<Vec<u8>, Eip712Error> {
    encode_struct(type_name, type_name, types, data, depth)
}

/// `path` names the value for error reporting, e.g. `Mail.from`
fn encode_struct(
    path: &str,
    type_name: &str,
    types: &Types,
    data: &Value,
    depth: usize,
) -> Result<Vec<u8>, Eip712Error> {
    if depth > MAX_DEPTH {
        return Err(Eip712Error::CyclicTypeReference(type_name.to_string()));
    }

    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::UnknownType(type_name.to_string()))?;

    let object = data.as_object().ok_or_else(|| Eip712Error::FieldValueMismatch {
        field: path.to_string(),
        type_name: type_name.to_string(),
        reason: "expected an object".to_string(),
    })?;

    let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
    encoded.extend_from_slice(&type_hash(type_name, types)?);

    for field in fields {
        let field_type = FieldType::parse(&field.type_name, types)?;
        let field_path = format!("{}.{}", path, field.name);
        let slot = encode_field(&field_path, &field_type, object.get(&field.name), types, depth)?;
        encoded.extend_from_slice(&slot);
    }

    Ok(encoded)
}

/// The 32-byte slot for one value. `None` and JSON `null` both count as
/// absent: absent structs, strings and bytes encode as zero, anything else
/// absent is an error.
pub fn encode_field(
    path: &str,
    field_type: &FieldType,
    value: Option<&Value>,
    types: &Types,
    depth: usize,
) -> Result<[u8; 32], Eip712Error> {
    let value = match value {
        Some(Value::Null) | None => {
            return match field_type {
                FieldType::Struct(_) | FieldType::Dynamic(_) => Ok([0u8; 32]),
                _ => Err(Eip712Error::MissingField(path.to_string())),
            };
        }
        Some(v) => v,
    };

    match field_type {
        FieldType::Struct(name) => {
            let encoded = encode_struct(path, name, types, value, depth + 1)?;
            Ok(keccak256(&encoded))
        }
        FieldType::Dynamic(DynamicType::String) => match value {
            Value::String(s) => Ok(keccak256(s.as_bytes())),
            _ => Err(mismatch(path, field_type, "expected a string")),
        },
        FieldType::Dynamic(DynamicType::Bytes) => {
            let bytes = parse_hex_bytes(path, field_type, value)?;
            Ok(keccak256(&bytes))
        }
        FieldType::Array { element, length } => {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch(path, field_type, "expected an array"))?;

            if let Some(expected) = length {
                if items.len() != *expected {
                    return Err(mismatch(
                        path,
                        field_type,
                        &format!("expected {} elements, got {}", expected, items.len()),
                    ));
                }
            }

            let mut concatenated = Vec::with_capacity(32 * items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                concatenated.extend_from_slice(&encode_field(
                    &item_path,
                    element,
                    Some(item),
                    types,
                    depth,
                )?);
            }
            Ok(keccak256(&concatenated))
        }
        FieldType::Atomic(atomic) => encode_atomic(path, field_type, *atomic, value),
    }
}

fn encode_atomic(
    path: &str,
    field_type: &FieldType,
    atomic: AtomicType,
    value: &Value,
) -> Result<[u8; 32], Eip712Error> {
    let mut slot = [0u8; 32];

    match atomic {
        AtomicType::Address => {
            let text = value
                .as_str()
                .ok_or_else(|| mismatch(path, field_type, "expected a hex string"))?;
            let address = Address::parse_ignoring_case(text)
                .map_err(|e| mismatch(path, field_type, &e.to_string()))?;
            slot[12..].copy_from_slice(address.as_bytes());
        }
        AtomicType::Bool => {
            if coerce_bool(value).ok_or_else(|| mismatch(path, field_type, "not a boolean"))? {
                slot[31] = 1;
            }
        }
        AtomicType::Uint(bits) => {
            let (negative, magnitude) = parse_integer(path, field_type, value)?;
            if negative && !magnitude.is_zero() {
                return Err(mismatch(path, field_type, "negative value for unsigned type"));
            }
            if magnitude.bits() > usize::from(bits) {
                return Err(mismatch(path, field_type, "value out of range"));
            }
            magnitude.to_big_endian(&mut slot);
        }
        AtomicType::Int(bits) => {
            let (negative, magnitude) = parse_integer(path, field_type, value)?;
            let limit = U256::one() << (usize::from(bits) - 1);
            let in_range = if negative {
                magnitude <= limit
            } else {
                magnitude < limit
            };
            if !in_range {
                return Err(mismatch(path, field_type, "value out of range"));
            }
            // Two's complement over the full 256-bit word
            let word = if negative {
                (!magnitude).overflowing_add(U256::one()).0
            } else {
                magnitude
            };
            word.to_big_endian(&mut slot);
        }
        AtomicType::FixedBytes(size) => {
            let bytes = parse_hex_bytes(path, field_type, value)?;
            if bytes.len() > usize::from(size) {
                return Err(mismatch(
                    path,
                    field_type,
                    &format!("expected at most {} bytes, got {}", size, bytes.len()),
                ));
            }
            slot[..bytes.len()].copy_from_slice(&bytes);
        }
    }

    Ok(slot)
}

/// true/false, 0/1, and the strings "true", "false", "1", "0", "0x1", "0x0"
/// in any letter case
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "0x1" => Some(true),
            "false" | "0" | "0x0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Sign and magnitude of a JSON number, decimal string or `0x` hex string
fn parse_integer(
    path: &str,
    field_type: &FieldType,
    value: &Value,
) -> Result<(bool, U256), Eip712Error> {
    match value {
        Value::Number(n) => {
            // Numbers keep their source text, so integers wider than u64
            // arrive intact
            let text = n.to_string();
            let (negative, digits) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, text.as_str()),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(mismatch(path, field_type, "not an integer"));
            }
            let magnitude = U256::from_dec_str(digits)
                .map_err(|_| mismatch(path, field_type, "value out of range"))?;
            Ok((negative && !magnitude.is_zero(), magnitude))
        }
        Value::String(s) => {
            let text = s.trim();
            let (negative, digits) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, text),
            };

            let magnitude = match digits
                .strip_prefix("0x")
                .or_else(|| digits.strip_prefix("0X"))
            {
                Some("") => U256::zero(),
                Some(hex_digits) => U256::from_str_radix(hex_digits, 16)
                    .map_err(|_| mismatch(path, field_type, "invalid hex integer"))?,
                None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                    U256::from_dec_str(digits)
                        .map_err(|_| mismatch(path, field_type, "value out of range"))?
                }
                None => return Err(mismatch(path, field_type, "invalid decimal integer")),
            };

            Ok((negative, magnitude))
        }
        _ => Err(mismatch(path, field_type, "expected a number or numeric string")),
    }
}

fn parse_hex_bytes(
    path: &str,
    field_type: &FieldType,
    value: &Value,
) -> Result<Vec<u8>, Eip712Error> {
    let text = value
        .as_str()
        .ok_or_else(|| mismatch(path, field_type, "expected a hex string"))?;
    decode_hex(text).map_err(|e| mismatch(path, field_type, &format!("invalid hex: {}", e)))
}

fn mismatch(path: &str, field_type: &FieldType, reason: &str) -> Eip712Error {
    Eip712Error::FieldValueMismatch {
        field: path.to_string(),
        type_name: field_type.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod encoder_tests {
    use super::*;
    use serde_json::json;

    fn slot(type_name: &str, value: Value) -> Result<[u8; 32], Eip712Error> {
        let types = Types::new();
        let field_type = FieldType::parse(type_name, &types)?;
        encode_field("T.x", &field_type, Some(&value), &types, 0)
    }

    #[test]
    fn test_uint_forms_agree() {
        let a = slot("uint256", json!(255)).unwrap();
        let b = slot("uint256", json!("255")).unwrap();
        let c = slot("uint256", json!("0xff")).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a[31], 0xff);
        assert!(a[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_uint_number_wider_than_u64() {
        let literal: Value = serde_json::from_str("100000000000000000000").unwrap();
        let a = slot("uint256", literal).unwrap();
        let b = slot("uint256", json!("100000000000000000000")).unwrap();
        let c = slot("uint256", json!("0x56bc75e2d63100000")).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);

        let negative: Value = serde_json::from_str("-100000000000000000000").unwrap();
        assert_eq!(
            slot("int256", negative).unwrap(),
            slot("int256", json!("-100000000000000000000")).unwrap()
        );
    }

    #[test]
    fn test_uint_rejects_fraction_and_exponent() {
        for literal in ["1.5", "1e3", "2.0"] {
            let value: Value = serde_json::from_str(literal).unwrap();
            assert!(
                matches!(
                    slot("uint256", value),
                    Err(Eip712Error::FieldValueMismatch { .. })
                ),
                "{} accepted",
                literal
            );
        }
    }

    #[test]
    fn test_uint_range() {
        assert!(slot("uint8", json!(255)).is_ok());
        assert!(matches!(
            slot("uint8", json!(256)),
            Err(Eip712Error::FieldValueMismatch { .. })
        ));
        assert!(slot("uint8", json!(-1)).is_err());
        assert!(slot("uint256", json!("abc")).is_err());
    }

    #[test]
    fn test_int_twos_complement() {
        let minus_one = slot("int8", json!(-1)).unwrap();
        assert_eq!(minus_one, [0xff; 32]);

        assert!(slot("int8", json!(127)).is_ok());
        assert!(slot("int8", json!(-128)).is_ok());
        assert!(slot("int8", json!(128)).is_err());
        assert!(slot("int8", json!(-129)).is_err());

        assert_eq!(slot("int256", json!("-1")).unwrap(), [0xff; 32]);
    }

    #[test]
    fn test_bool_coercion() {
        let truthy = slot("bool", json!(true)).unwrap();
        assert_eq!(truthy[31], 1);
        for v in [json!(1), json!("TRUE"), json!("0x1"), json!("1")] {
            assert_eq!(slot("bool", v).unwrap(), truthy);
        }
        for v in [json!(false), json!(0), json!("False"), json!("0x0")] {
            assert_eq!(slot("bool", v).unwrap(), [0u8; 32]);
        }
        assert!(slot("bool", json!("yes")).is_err());
        assert!(slot("bool", json!(2)).is_err());
    }

    #[test]
    fn test_fixed_bytes_right_padded() {
        let encoded = slot("bytes4", json!("0xdeadbeef")).unwrap();
        assert_eq!(&encoded[..4], &[0xde, 0xad, 0xbe, 0xef]);
        assert!(encoded[4..].iter().all(|b| *b == 0));
        assert!(slot("bytes2", json!("0xdeadbeef")).is_err());
    }

    #[test]
    fn test_dynamic_values_hashed() {
        assert_eq!(slot("string", json!("Hello")).unwrap(), keccak256(b"Hello"));
        assert_eq!(slot("bytes", json!("0x0102")).unwrap(), keccak256(&[1, 2]));
    }

    #[test]
    fn test_address_ignores_case() {
        let lower = slot("address", json!("0xcd2a3d9f938e13cd947ec05abc7fe734df8dd826")).unwrap();
        let mixed = slot("address", json!("0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826")).unwrap();
        assert_eq!(lower, mixed);
        assert!(lower[..12].iter().all(|b| *b == 0));
        assert!(slot("address", json!("0x1234")).is_err());
    }

    #[test]
    fn test_fixed_array_length_checked() {
        assert!(slot("uint8[2]", json!([1, 2])).is_ok());
        let err = slot("uint8[2]", json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, Eip712Error::FieldValueMismatch { .. }));
    }

    #[test]
    fn test_array_element_error_path() {
        let err = slot("uint8[]", json!([1, 300])).unwrap_err();
        match err {
            Eip712Error::FieldValueMismatch { field, .. } => assert_eq!(field, "T.x[1]"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_absent_values() {
        let types = Types::new();
        let string_type = FieldType::parse("string", &types).unwrap();
        assert_eq!(
            encode_field("T.s", &string_type, None, &types, 0).unwrap(),
            [0u8; 32]
        );

        let uint_type = FieldType::parse("uint256", &types).unwrap();
        assert_eq!(
            encode_field("T.n", &uint_type, Some(&Value::Null), &types, 0).unwrap_err(),
            Eip712Error::MissingField("T.n".to_string())
        );
    }

    #[test]
    fn test_dependencies_reject_undefined_types() {
        let mut types = Types::new();
        types.insert("A".to_string(), vec![TypedDataField::new("b", "B[]")]);
        assert_eq!(
            find_type_dependencies("A", &types).unwrap_err(),
            Eip712Error::UnknownType("B".to_string())
        );
    }

    #[test]
    fn test_solidity_types() {
        assert!(is_solidity_type("uint256"));
        assert!(is_solidity_type("bytes32"));
        assert!(is_solidity_type("string"));
        assert!(!is_solidity_type("Person"));
        assert!(!is_solidity_type("uint9"));
    }
}
