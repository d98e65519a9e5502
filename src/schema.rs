//! Column schema: which feature type each column encodes to, and whether it is
//! a per-row scalar (context feature) or a per-row sequence (feature list).
//!
//! A schema is derived once per conversion and then threaded, unchanged, through
//! every row:
//! - encoding derives it from the first row ([`infer_encode_schema`]) unless one is supplied;
//! - decoding derives it from the first record ([`infer_decode_schema`]) unless one is supplied.
//!
//! Schemas round-trip through JSON. Scalar columns are written as a type name and
//! list columns as a one-element array, e.g. `{"id": "int64", "tags": ["bytes"]}`.

use crate::error::{Error, Result};
use crate::record::{Record, TypedField};
use crate::table::Row;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    #[serde(alias = "int", alias = "bool")]
    Int64,
    #[serde(alias = "float", alias = "double")]
    Float32,
    #[serde(alias = "str", alias = "string")]
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Scalar,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SpecRepr", into = "SpecRepr")]
pub struct ColumnSpec {
    pub feature_type: FeatureType,
    pub cardinality: Cardinality,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SpecRepr {
    Scalar(FeatureType),
    List([FeatureType; 1]),
}

impl From<SpecRepr> for ColumnSpec {
    fn from(repr: SpecRepr) -> Self {
        match repr {
            SpecRepr::Scalar(t) => Self::scalar(t),
            SpecRepr::List([t]) => Self::list(t),
        }
    }
}

impl From<ColumnSpec> for SpecRepr {
    fn from(spec: ColumnSpec) -> Self {
        match spec.cardinality {
            Cardinality::Scalar => Self::Scalar(spec.feature_type),
            Cardinality::List => Self::List([spec.feature_type]),
        }
    }
}

impl ColumnSpec {
    #[must_use]
    pub const fn scalar(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            cardinality: Cardinality::Scalar,
        }
    }

    #[must_use]
    pub const fn list(feature_type: FeatureType) -> Self {
        Self {
            feature_type,
            cardinality: Cardinality::List,
        }
    }

    #[must_use]
    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::List
    }
}

/// Column name to [`ColumnSpec`], ordered by column name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: BTreeMap<String, ColumnSpec>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, spec: ColumnSpec) {
        self.columns.insert(column.into(), spec);
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>, spec: ColumnSpec) -> Self {
        self.insert(column, spec);
        self
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnSpec> {
        self.columns.get(column)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnSpec)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// True when at least one column is a sequence column.
    #[must_use]
    pub fn has_sequence(&self) -> bool {
        self.columns.values().any(ColumnSpec::is_list)
    }

    /// Declared schema from SQL-style type names such as `bigint`, `double` or `string`.
    ///
    /// Any name containing `int` maps to [`FeatureType::Int64`], any containing
    /// `float` or `double` to [`FeatureType::Float32`], everything else to
    /// [`FeatureType::Bytes`]. All columns are scalar.
    pub fn from_type_names<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let columns = pairs
            .into_iter()
            .map(|(name, type_name)| {
                let t = type_name.as_ref().to_ascii_lowercase();
                let feature_type = if t.contains("int") {
                    FeatureType::Int64
                } else if t.contains("float") || t.contains("double") {
                    FeatureType::Float32
                } else {
                    FeatureType::Bytes
                };
                (name.into(), ColumnSpec::scalar(feature_type))
            })
            .collect();
        Self { columns }
    }

    /// # Errors
    /// `SchemaMismatch` if the document is not a valid schema.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::schema_mismatch("invalid schema document").caused_by(e))
    }

    /// # Errors
    /// Only fails if serialization itself fails, which a valid schema never does.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<K: Into<String>> FromIterator<(K, ColumnSpec)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, ColumnSpec)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Map one native value to its feature type.
///
/// Missing values type as integers, since they encode as the integer sentinel.
///
/// # Errors
/// `UnsupportedType` for lists (callers unwrap those first).
pub fn feature_type_of(column: &str, value: &Value) -> Result<FeatureType> {
    match value {
        Value::Text(_) | Value::Bytes(_) => Ok(FeatureType::Bytes),
        Value::Null | Value::Bool(_) | Value::Int(_) => Ok(FeatureType::Int64),
        Value::Float(_) => Ok(FeatureType::Float32),
        Value::List(_) => Err(Error::unsupported_type(column, "nested list")),
    }
}

fn infer_column(column: &str, value: &Value) -> Result<ColumnSpec> {
    let Value::List(items) = value else {
        return feature_type_of(column, value).map(ColumnSpec::scalar);
    };
    // Sequence steps may themselves hold several values; type by the innermost first one.
    let first = match items.first() {
        Some(Value::List(step)) => step.first(),
        other => other,
    };
    let first = first.ok_or_else(|| Error::unsupported_type(column, "empty list"))?;
    feature_type_of(column, first).map(ColumnSpec::list)
}

/// Derive the encode schema from one representative row.
///
/// List values produce `List` columns typed by their first element; everything
/// else is a `Scalar` column. When `columns` is given, only those columns are
/// typed; the rest are left out of the schema.
///
/// # Errors
/// `UnsupportedType` naming the column when a value cannot be typed.
pub fn infer_encode_schema(sample: &Row<'_>, columns: Option<&[String]>) -> Result<Schema> {
    let mut schema = Schema::new();
    for (name, value) in sample.iter() {
        if columns.is_some_and(|allow| !allow.iter().any(|c| c == name)) {
            continue;
        }
        schema.insert(name, infer_column(name, value)?);
    }
    Ok(schema)
}

/// Type carried by the first non-empty step of a feature list.
fn list_type(steps: &[TypedField]) -> Option<FeatureType> {
    steps
        .iter()
        .find(|step| !step.is_empty())
        .map(TypedField::feature_type)
}

/// Derive the decode schema from one parsed record.
///
/// Context fields become `Scalar` columns and feature lists become `List` columns;
/// the type comes from whichever typed list the wire field carries. A feature
/// list with no values carries no type: it is provisionally read as bytes and
/// reported in [`InferredSchema::untyped`] until a later record settles it.
#[must_use]
pub fn infer_decode_schema(record: &Record) -> InferredSchema {
    let mut inferred = InferredSchema::default();
    for (name, field) in &record.context {
        inferred
            .schema
            .insert(name.clone(), ColumnSpec::scalar(field.feature_type()));
    }
    for (name, steps) in &record.sequence {
        let feature_type = list_type(steps).unwrap_or_else(|| {
            inferred.untyped.insert(name.clone());
            FeatureType::Bytes
        });
        inferred.schema.insert(name.clone(), ColumnSpec::list(feature_type));
    }
    inferred
}

/// A schema read off a record, plus the list columns whose type is still open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferredSchema {
    pub schema: Schema,
    pub untyped: BTreeSet<String>,
}

impl InferredSchema {
    /// Fix the type of any open list column that `record` carries values for.
    pub fn settle(&mut self, record: &Record) {
        if self.untyped.is_empty() {
            return;
        }
        let schema = &mut self.schema;
        self.untyped.retain(|name| {
            let Some(feature_type) = record.sequence.get(name).and_then(|s| list_type(s)) else {
                return true;
            };
            schema.insert(name.clone(), ColumnSpec::list(feature_type));
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        let schema = Schema::from_type_names([
            ("id", "bigint"),
            ("score", "double"),
            ("ratio", "float"),
            ("name", "string"),
        ]);
        assert_eq!(schema.get("id"), Some(&ColumnSpec::scalar(FeatureType::Int64)));
        assert_eq!(schema.get("score"), Some(&ColumnSpec::scalar(FeatureType::Float32)));
        assert_eq!(schema.get("ratio"), Some(&ColumnSpec::scalar(FeatureType::Float32)));
        assert_eq!(schema.get("name"), Some(&ColumnSpec::scalar(FeatureType::Bytes)));
    }

    #[test]
    fn test_json_shape() {
        let schema = Schema::new()
            .with_column("id", ColumnSpec::scalar(FeatureType::Int64))
            .with_column("tags", ColumnSpec::list(FeatureType::Bytes));
        let json = schema.to_json_string().unwrap();
        assert_eq!(json, r#"{"id":"int64","tags":["bytes"]}"#);
        assert_eq!(Schema::from_json_str(&json).unwrap(), schema);
    }

    #[test]
    fn test_json_aliases() {
        let schema = Schema::from_json_str(r#"{"a": "int", "b": ["float"], "c": "str"}"#).unwrap();
        assert_eq!(schema.get("a"), Some(&ColumnSpec::scalar(FeatureType::Int64)));
        assert_eq!(schema.get("b"), Some(&ColumnSpec::list(FeatureType::Float32)));
        assert_eq!(schema.get("c"), Some(&ColumnSpec::scalar(FeatureType::Bytes)));
        assert!(Schema::from_json_str(r#"{"a": "complex"}"#).is_err());
    }

    fn sample() -> crate::table::Table {
        crate::table::Table::from_rows(vec![vec![
            ("id", Value::Int(1)),
            ("flag", Value::Bool(true)),
            ("missing", Value::Null),
            ("score", Value::Float(0.5)),
            ("name", Value::from("x")),
            ("tags", Value::from(vec!["a"])),
            (
                "steps",
                Value::List(vec![Value::from(vec![1.0_f64, 2.0]), Value::from(vec![3.0_f64])]),
            ),
        ]])
    }

    #[test]
    fn test_infer_encode_schema() {
        let table = sample();
        let row = table.row(0).unwrap();
        let schema = infer_encode_schema(&row, None).unwrap();

        assert_eq!(schema.get("id"), Some(&ColumnSpec::scalar(FeatureType::Int64)));
        assert_eq!(schema.get("flag"), Some(&ColumnSpec::scalar(FeatureType::Int64)));
        assert_eq!(schema.get("missing"), Some(&ColumnSpec::scalar(FeatureType::Int64)));
        assert_eq!(schema.get("score"), Some(&ColumnSpec::scalar(FeatureType::Float32)));
        assert_eq!(schema.get("name"), Some(&ColumnSpec::scalar(FeatureType::Bytes)));
        assert_eq!(schema.get("tags"), Some(&ColumnSpec::list(FeatureType::Bytes)));
        assert_eq!(schema.get("steps"), Some(&ColumnSpec::list(FeatureType::Float32)));
        assert!(schema.has_sequence());

        // Same row, same answer.
        assert_eq!(infer_encode_schema(&row, None).unwrap(), schema);
    }

    #[test]
    fn test_infer_with_filter() {
        let table = sample();
        let row = table.row(0).unwrap();
        let only = ["id".to_string(), "nope".to_string()];
        let schema = infer_encode_schema(&row, Some(&only)).unwrap();
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_infer_rejects_empty_list() {
        let table = crate::table::Table::from_rows(vec![vec![("e", Value::List(Vec::new()))]]);
        let err = infer_encode_schema(&table.row(0).unwrap(), None).unwrap_err();
        assert!(err.is(crate::error::ErrorKind::UnsupportedType));
        assert!(err.message.contains("'e'"));
    }

    #[test]
    fn test_infer_decode_schema() {
        let mut record = Record::new();
        record.context.insert("id".into(), TypedField::Int64(vec![1]));
        record
            .sequence
            .insert("tags".into(), vec![TypedField::Bytes(vec![b"a".to_vec()])]);
        record.sequence.insert("none".into(), Vec::new());

        let inferred = infer_decode_schema(&record);
        let schema = &inferred.schema;
        assert_eq!(schema.get("id"), Some(&ColumnSpec::scalar(FeatureType::Int64)));
        assert_eq!(schema.get("tags"), Some(&ColumnSpec::list(FeatureType::Bytes)));
        assert_eq!(schema.get("none"), Some(&ColumnSpec::list(FeatureType::Bytes)));
        assert_eq!(inferred.untyped.iter().collect::<Vec<_>>(), vec!["none"]);
    }

    #[test]
    fn test_empty_list_type_settles_later() {
        let mut first = Record::new();
        first.sequence.insert("ids".into(), Vec::new());
        first.sequence.insert("tags".into(), vec![TypedField::Bytes(Vec::new())]);
        let mut inferred = infer_decode_schema(&first);
        assert_eq!(inferred.untyped.len(), 2);

        let mut second = Record::new();
        second
            .sequence
            .insert("ids".into(), vec![TypedField::Int64(Vec::new()), TypedField::Int64(vec![1, 2])]);
        inferred.settle(&second);
        assert_eq!(
            inferred.schema.get("ids"),
            Some(&ColumnSpec::list(FeatureType::Int64))
        );
        assert_eq!(inferred.untyped.iter().collect::<Vec<_>>(), vec!["tags"]);

        // Once settled, later records cannot change the type.
        let mut third = Record::new();
        third.sequence.insert("ids".into(), vec![TypedField::Float32(vec![1.0])]);
        inferred.settle(&third);
        assert_eq!(
            inferred.schema.get("ids"),
            Some(&ColumnSpec::list(FeatureType::Int64))
        );
    }
}
