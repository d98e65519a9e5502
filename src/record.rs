//! In-memory record: typed context fields plus optional feature lists.
//!
//! A record with no feature lists is written as a flat `Example`; otherwise it is
//! written as a `SequenceExample`. The choice is made per record from its own
//! fields. Parsing always goes through `SequenceExample`, which also accepts
//! flat `Example` bytes.

use crate::error::Result;
use crate::proto::{
    BytesList, Example, Feature, FeatureList, FeatureLists, Features, FloatList, Int64List,
    SequenceExample, feature::Kind,
};
use crate::schema::FeatureType;
use crate::value::Value;
use prost::Message;
use std::collections::BTreeMap;

/// One wire-level feature: a list of values of a single type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedField {
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Bytes(Vec<Vec<u8>>),
}

impl TypedField {
    #[must_use]
    pub const fn feature_type(&self) -> FeatureType {
        match self {
            Self::Int64(_) => FeatureType::Int64,
            Self::Float32(_) => FeatureType::Float32,
            Self::Bytes(_) => FeatureType::Bytes,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Bytes(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unpack into native values without any coercion.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Int64(v) => v.into_iter().map(Value::Int).collect(),
            Self::Float32(v) => v.into_iter().map(|f| Value::Float(f64::from(f))).collect(),
            Self::Bytes(v) => v.into_iter().map(Value::Bytes).collect(),
        }
    }

    fn to_proto(&self) -> Feature {
        let kind = match self {
            Self::Int64(value) => Kind::Int64List(Int64List {
                value: value.clone(),
            }),
            Self::Float32(value) => Kind::FloatList(FloatList {
                value: value.clone(),
            }),
            Self::Bytes(value) => Kind::BytesList(BytesList {
                value: value.clone(),
            }),
        };
        Feature { kind: Some(kind) }
    }

    fn from_proto(feature: Feature) -> Self {
        match feature.kind {
            Some(Kind::Int64List(list)) => Self::Int64(list.value),
            Some(Kind::FloatList(list)) => Self::Float32(list.value),
            Some(Kind::BytesList(list)) => Self::Bytes(list.value),
            // An unset feature is an empty list of any type.
            None => Self::Bytes(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    Flat,
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub context: BTreeMap<String, TypedField>,
    pub sequence: BTreeMap<String, Vec<TypedField>>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shape(&self) -> RecordShape {
        if self.sequence.is_empty() {
            RecordShape::Flat
        } else {
            RecordShape::Sequence
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.context.is_empty() && self.sequence.is_empty()
    }

    fn context_proto(&self) -> Features {
        Features {
            feature: self
                .context
                .iter()
                .map(|(name, field)| (name.clone(), field.to_proto()))
                .collect(),
        }
    }

    /// Serialize as `Example` (flat) or `SequenceExample` (sequence).
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.shape() {
            RecordShape::Flat => Example {
                features: Some(self.context_proto()),
            }
            .encode_to_vec(),
            RecordShape::Sequence => SequenceExample {
                context: Some(self.context_proto()),
                feature_lists: Some(FeatureLists {
                    feature_list: self
                        .sequence
                        .iter()
                        .map(|(name, steps)| {
                            let feature = steps.iter().map(TypedField::to_proto).collect();
                            (name.clone(), FeatureList { feature })
                        })
                        .collect(),
                }),
            }
            .encode_to_vec(),
        }
    }

    /// Parse serialized `Example` or `SequenceExample` bytes.
    ///
    /// # Errors
    /// `MalformedRecord` if the bytes are not a valid message.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let parsed = SequenceExample::decode(bytes)?;
        let context = parsed
            .context
            .map(|f| f.feature)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, feature)| (name, TypedField::from_proto(feature)))
            .collect();
        let sequence = parsed
            .feature_lists
            .map(|f| f.feature_list)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, list)| {
                let steps = list.feature.into_iter().map(TypedField::from_proto).collect();
                (name, steps)
            })
            .collect();
        Ok(Self { context, sequence })
    }
}
