//! Row codec: table rows to [`Record`]s and parsed records back to rows.
//!
//! Encoding goes through a [`RowEncoder`] bound to one schema. [`RecordStream`]
//! wraps it into a lazy, single-pass iterator over a table's rows; iterating again
//! means building a new stream from the table.
//!
//! Decoding optionally runs byte-string values through the cast ladder
//! (integer, then float, then UTF-8 text, else raw bytes).

use crate::error::{Error, Result};
use crate::feature::{encode, encode_steps};
use crate::record::{Record, TypedField};
use crate::schema::{Cardinality, ColumnSpec, Schema};
use crate::table::Row;
use crate::value::Value;
use std::collections::BTreeSet;

/// Encodes rows against a fixed schema.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    schema: Schema,
    ignored: BTreeSet<String>,
}

impl RowEncoder {
    /// Strict encoder: every column of every row must be in `schema`.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ignored: BTreeSet::new(),
        }
    }

    /// Skip these columns instead of failing on them.
    #[must_use]
    pub fn ignoring<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(columns.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Encode one row.
    ///
    /// # Errors
    /// - `SchemaMismatch` if the row has a column the schema lacks (and it is not ignored)
    /// - `UnsupportedType` if a value cannot be coerced to its column's feature type
    pub fn encode_row(&self, row: &Row<'_>) -> Result<Record> {
        let mut record = Record::new();
        for (name, value) in row.iter() {
            let Some(spec) = self.schema.get(name) else {
                if self.ignored.contains(name) {
                    continue;
                }
                return Err(Error::schema_mismatch(format!(
                    "column '{name}' is not in the schema"
                )));
            };
            match spec.cardinality {
                Cardinality::Scalar => {
                    let field = encode(name, value, spec.feature_type)?;
                    record.context.insert(name.to_string(), field);
                }
                Cardinality::List => {
                    let steps = encode_steps(name, value, spec.feature_type)?;
                    record.sequence.insert(name.to_string(), steps);
                }
            }
        }
        Ok(record)
    }
}

/// Lazy stream of encoded records, one per input row.
pub struct RecordStream<'a, I> {
    rows: I,
    encoder: &'a RowEncoder,
}

impl<'a, 'r, I> RecordStream<'a, I>
where
    I: Iterator<Item = Row<'r>>,
{
    pub const fn new(rows: I, encoder: &'a RowEncoder) -> Self {
        Self { rows, encoder }
    }

    /// Serialize each record as it is produced.
    pub fn serialized(self) -> impl Iterator<Item = Result<Vec<u8>>> {
        self.map(|record| record.map(|r| r.to_bytes()))
    }
}

impl<'r, I> Iterator for RecordStream<'_, I>
where
    I: Iterator<Item = Row<'r>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| self.encoder.encode_row(&row))
    }
}

/// Outcome of the cast ladder for one byte string.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Int(i64),
    Float(f64),
    Text(String),
    Raw(Vec<u8>),
}

impl From<Coerced> for Value {
    fn from(c: Coerced) -> Self {
        match c {
            Coerced::Int(i) => Self::Int(i),
            Coerced::Float(f) => Self::Float(f),
            Coerced::Text(s) => Self::Text(s),
            Coerced::Raw(b) => Self::Bytes(b),
        }
    }
}

type Attempt = fn(&[u8]) -> Option<Coerced>;

/// Coercions tried in order; the first success wins.
const CAST_LADDER: [Attempt; 3] = [as_int, as_float, as_text];

fn as_int(raw: &[u8]) -> Option<Coerced> {
    std::str::from_utf8(raw)
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(Coerced::Int)
}

fn as_float(raw: &[u8]) -> Option<Coerced> {
    std::str::from_utf8(raw)
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(Coerced::Float)
}

fn as_text(raw: &[u8]) -> Option<Coerced> {
    std::str::from_utf8(raw)
        .ok()
        .map(|s| Coerced::Text(s.to_string()))
}

/// Run one byte string through the cast ladder.
#[must_use]
pub fn coerce(raw: &[u8]) -> Coerced {
    CAST_LADDER
        .iter()
        .find_map(|attempt| attempt(raw))
        .unwrap_or_else(|| Coerced::Raw(raw.to_vec()))
}

fn field_values(field: TypedField, cast: bool) -> Vec<Value> {
    match field {
        TypedField::Bytes(values) if cast => values.iter().map(|b| coerce(b).into()).collect(),
        other => other.into_values(),
    }
}

fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.swap_remove(0)
    } else {
        Value::List(values)
    }
}

fn check_type(name: &str, spec: &ColumnSpec, field: &TypedField) -> Result<()> {
    if field.is_empty() || field.feature_type() == spec.feature_type {
        return Ok(());
    }
    Err(Error::schema_mismatch(format!(
        "column '{name}' is {:?} in the record but {:?} in the schema",
        field.feature_type(),
        spec.feature_type
    )))
}

/// Decode a parsed record into `(column, value)` pairs in schema order.
///
/// Columns the record lacks decode as `Null`. A scalar column holding exactly one
/// value yields that value; otherwise it yields a list. A sequence column yields a
/// list with one entry per step.
///
/// # Errors
/// `SchemaMismatch` if a field's wire type disagrees with the schema.
pub fn decode_record(
    mut record: Record,
    schema: &Schema,
    cast: bool,
) -> Result<Vec<(String, Value)>> {
    let mut row = Vec::with_capacity(schema.len());
    for (name, spec) in schema.iter() {
        let value = match spec.cardinality {
            Cardinality::Scalar => match record.context.remove(name) {
                Some(field) => {
                    check_type(name, spec, &field)?;
                    collapse(field_values(field, cast))
                }
                None => Value::Null,
            },
            Cardinality::List => match record.sequence.remove(name) {
                Some(steps) => {
                    let mut out = Vec::with_capacity(steps.len());
                    for step in steps {
                        check_type(name, spec, &step)?;
                        out.push(collapse(field_values(step, cast)));
                    }
                    Value::List(out)
                }
                None => Value::Null,
            },
        };
        row.push((name.to_string(), value));
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::FeatureType;
    use crate::table::Table;

    #[test]
    fn test_cast_ladder_order() {
        assert_eq!(coerce(b"42"), Coerced::Int(42));
        assert_eq!(coerce(b"-7"), Coerced::Int(-7));
        assert_eq!(coerce(b"2.5"), Coerced::Float(2.5));
        assert_eq!(coerce(b"hello"), Coerced::Text("hello".into()));
        assert_eq!(coerce(b""), Coerced::Text(String::new()));
        assert_eq!(coerce(&[0xff, 0xfe]), Coerced::Raw(vec![0xff, 0xfe]));
    }

    #[test]
    fn test_strict_encoder_rejects_unknown_column() {
        let table = Table::from_rows(vec![vec![("id", Value::Int(1)), ("x", Value::Int(2))]]);
        let schema = Schema::new().with_column("id", ColumnSpec::scalar(FeatureType::Int64));

        let strict = RowEncoder::new(schema.clone());
        let err = strict.encode_row(&table.row(0).unwrap()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SchemaMismatch);

        let lenient = RowEncoder::new(schema).ignoring(["x"]);
        let record = lenient.encode_row(&table.row(0).unwrap()).unwrap();
        assert_eq!(record.context.len(), 1);
    }

    #[test]
    fn test_decode_without_cast_keeps_bytes() {
        let mut record = Record::new();
        record
            .context
            .insert("n".into(), TypedField::Bytes(vec![b"5".to_vec()]));
        let schema = Schema::new().with_column("n", ColumnSpec::scalar(FeatureType::Bytes));

        let raw = decode_record(record.clone(), &schema, false).unwrap();
        assert_eq!(raw, vec![("n".to_string(), Value::Bytes(b"5".to_vec()))]);

        let cast = decode_record(record, &schema, true).unwrap();
        assert_eq!(cast, vec![("n".to_string(), Value::Int(5))]);
    }

    #[test]
    fn test_decode_missing_and_mismatched() {
        let mut record = Record::new();
        record.context.insert("a".into(), TypedField::Int64(vec![1]));
        let schema = Schema::new()
            .with_column("a", ColumnSpec::scalar(FeatureType::Int64))
            .with_column("b", ColumnSpec::scalar(FeatureType::Float32));
        let row = decode_record(record.clone(), &schema, true).unwrap();
        assert_eq!(row[1], ("b".to_string(), Value::Null));

        let wrong = Schema::new().with_column("a", ColumnSpec::scalar(FeatureType::Bytes));
        let err = decode_record(record, &wrong, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SchemaMismatch);
    }

    #[test]
    fn test_record_stream_is_lazy() {
        let table = Table::from_rows(vec![
            vec![("id", Value::Int(1))],
            vec![("id", Value::from("oops"))],
        ]);
        let schema = Schema::new().with_column("id", ColumnSpec::scalar(FeatureType::Int64));
        let encoder = RowEncoder::new(schema);
        let mut stream = RecordStream::new(table.rows(), &encoder);
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }
}
