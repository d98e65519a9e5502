//! Value to [`TypedField`] encoding.
//!
//! Missing data never fails to encode:
//! - `Int64` / `Float32`: `Null` and NaN become [`SENTINEL`];
//! - `Bytes`: `Null` becomes an empty byte string.
//!
//! Scalars are wrapped into one-element lists; list inputs are mapped element-wise.

use crate::error::{Error, Result};
use crate::record::TypedField;
use crate::schema::FeatureType;
use crate::value::Value;

/// Stand-in for missing or not-a-number numeric values.
pub const SENTINEL: i64 = -999;

#[allow(clippy::cast_precision_loss)]
const SENTINEL_F32: f32 = SENTINEL as f32;

/// Encode one cell as a feature of `feature_type`.
///
/// # Errors
/// `UnsupportedType` naming `column` when the value cannot be coerced (text in a
/// numeric column, or a list nested inside a list).
pub fn encode(column: &str, value: &Value, feature_type: FeatureType) -> Result<TypedField> {
    let items = match value {
        Value::List(items) => items.as_slice(),
        scalar => std::slice::from_ref(scalar),
    };
    match feature_type {
        FeatureType::Int64 => items
            .iter()
            .map(|v| to_int(column, v))
            .collect::<Result<_>>()
            .map(TypedField::Int64),
        FeatureType::Float32 => items
            .iter()
            .map(|v| to_float(column, v))
            .collect::<Result<_>>()
            .map(TypedField::Float32),
        FeatureType::Bytes => items
            .iter()
            .map(|v| to_bytes(column, v))
            .collect::<Result<_>>()
            .map(TypedField::Bytes),
    }
}

/// Encode a sequence cell as one feature per step.
///
/// A missing cell is an empty sequence and a bare scalar is a one-step sequence.
///
/// # Errors
/// Same as [`encode`], per step.
pub fn encode_steps(
    column: &str,
    value: &Value,
    feature_type: FeatureType,
) -> Result<Vec<TypedField>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::List(steps) => steps
            .iter()
            .map(|step| encode(column, step, feature_type))
            .collect(),
        scalar => Ok(vec![encode(column, scalar, feature_type)?]),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_int(column: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Null => Ok(SENTINEL),
        Value::Float(f) if f.is_nan() => Ok(SENTINEL),
        Value::Float(f) => Ok(*f as i64),
        Value::Int(i) => Ok(*i),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(Error::unsupported_type(column, other.type_name())),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn to_float(column: &str, value: &Value) -> Result<f32> {
    match value {
        Value::Null => Ok(SENTINEL_F32),
        Value::Float(f) if f.is_nan() => Ok(SENTINEL_F32),
        Value::Float(f) => Ok(*f as f32),
        Value::Int(i) => Ok(*i as f32),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(Error::unsupported_type(column, other.type_name())),
    }
}

fn to_bytes(column: &str, value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Text(s) => Ok(s.as_bytes().to_vec()),
        Value::Bytes(b) => Ok(b.clone()),
        Value::Int(i) => Ok(i.to_string().into_bytes()),
        // Debug keeps the decimal point, so `1.0` does not read back as an integer.
        Value::Float(f) => Ok(format!("{f:?}").into_bytes()),
        Value::Bool(b) => Ok(b.to_string().into_bytes()),
        Value::List(_) => Err(Error::unsupported_type(column, "nested list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_int_sentinel() {
        assert_eq!(
            encode("c", &Value::Null, FeatureType::Int64).unwrap(),
            TypedField::Int64(vec![-999])
        );
        assert_eq!(
            encode("c", &Value::Float(f64::NAN), FeatureType::Int64).unwrap(),
            TypedField::Int64(vec![-999])
        );
        assert_eq!(
            encode(
                "c",
                &Value::List(vec![Value::Int(1), Value::Null, Value::Float(2.9)]),
                FeatureType::Int64
            )
            .unwrap(),
            TypedField::Int64(vec![1, -999, 2])
        );
    }

    #[test]
    fn test_float_sentinel() {
        assert_eq!(
            encode("c", &Value::Float(f64::NAN), FeatureType::Float32).unwrap(),
            TypedField::Float32(vec![-999.0])
        );
        assert_eq!(
            encode("c", &Value::Int(3), FeatureType::Float32).unwrap(),
            TypedField::Float32(vec![3.0])
        );
    }

    #[test]
    fn test_bytes_wraps_scalars() {
        assert_eq!(
            encode("c", &Value::Null, FeatureType::Bytes).unwrap(),
            TypedField::Bytes(vec![Vec::new()])
        );
        assert_eq!(
            encode("c", &Value::from("abc"), FeatureType::Bytes).unwrap(),
            TypedField::Bytes(vec![b"abc".to_vec()])
        );
        assert_eq!(
            encode("c", &Value::Int(12), FeatureType::Bytes).unwrap(),
            TypedField::Bytes(vec![b"12".to_vec()])
        );
    }

    #[test]
    fn test_float_text_keeps_decimal_point() {
        assert_eq!(
            encode("c", &Value::Float(1.0), FeatureType::Bytes).unwrap(),
            TypedField::Bytes(vec![b"1.0".to_vec()])
        );
        assert_eq!(
            encode("c", &Value::Float(2.5), FeatureType::Bytes).unwrap(),
            TypedField::Bytes(vec![b"2.5".to_vec()])
        );
        assert_eq!(
            crate::codec::coerce(b"1.0"),
            crate::codec::Coerced::Float(1.0)
        );
    }

    #[test]
    fn test_text_in_numeric_column_fails() {
        let err = encode("price", &Value::from("cheap"), FeatureType::Float32).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedType);
        assert!(err.message.contains("price"));
    }

    #[test]
    fn test_steps() {
        let steps = encode_steps(
            "s",
            &Value::List(vec![Value::Int(1), Value::List(vec![Value::Int(2), Value::Int(3)])]),
            FeatureType::Int64,
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![TypedField::Int64(vec![1]), TypedField::Int64(vec![2, 3])]
        );
        assert!(encode_steps("s", &Value::Null, FeatureType::Int64).unwrap().is_empty());
    }
}
