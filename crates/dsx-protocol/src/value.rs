//! Property values.
//!
//! The emulator encodes a value as an object with exactly one `*Value` member
//! next to optional `meaning` and `excludeFromIndexes`. Values are carried
//! verbatim; nothing here interprets property semantics.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::key::Key;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    #[serde(flatten)]
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_from_indexes: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(#[serde(with = "int64_string")] i64),
    DoubleValue(f64),
    /// RFC 3339 timestamp, kept as the server's string.
    TimestampValue(String),
    StringValue(String),
    BlobValue(#[serde(with = "base64_bytes")] Vec<u8>),
    EntityValue(Entity),
    ArrayValue(ArrayValue),
    KeyValue(Key),
    GeoPointValue(GeoPoint),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            meaning: None,
            exclude_from_indexes: None,
        }
    }

    pub fn null() -> Self {
        Self::new(ValueKind::NullValue(()))
    }

    pub fn timestamp(rfc3339: impl Into<String>) -> Self {
        Self::new(ValueKind::TimestampValue(rfc3339.into()))
    }

    pub fn blob(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ValueKind::BlobValue(bytes.into()))
    }

    pub fn geo_point(latitude: f64, longitude: f64) -> Self {
        Self::new(ValueKind::GeoPointValue(GeoPoint {
            latitude,
            longitude,
        }))
    }

    pub fn array(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(ValueKind::ArrayValue(ArrayValue {
            values: values.into_iter().collect(),
        }))
    }

    pub fn unindexed(mut self) -> Self {
        self.exclude_from_indexes = Some(true);
        self
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::StringValue(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.kind {
            ValueKind::IntegerValue(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::new(ValueKind::BooleanValue(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::new(ValueKind::IntegerValue(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::new(ValueKind::DoubleValue(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new(ValueKind::StringValue(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::new(ValueKind::StringValue(value))
    }
}

impl From<Key> for Value {
    fn from(value: Key) -> Self {
        Self::new(ValueKind::KeyValue(value))
    }
}

impl From<Entity> for Value {
    fn from(value: Entity) -> Self {
        Self::new(ValueKind::EntityValue(value))
    }
}

/// int64 travels as a decimal string; accept bare numbers too.
mod int64_string {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        struct Int64Visitor;

        impl Visitor<'_> for Int64Visitor {
            type Value = i64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an int64 as a decimal string or number")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
                value.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
                Ok(value)
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
                i64::try_from(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Int64Visitor)
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
