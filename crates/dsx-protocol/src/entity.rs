use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::value::Value;

/// A key plus its property bag, in server order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Value>,
}

impl Entity {
    pub fn new(key: Key) -> Self {
        Self {
            key: Some(key),
            properties: IndexMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.key.as_ref().and_then(Key::kind)
    }

    pub fn database_id(&self) -> &str {
        self.key.as_ref().map(Key::database_id).unwrap_or_default()
    }

    pub fn namespace_id(&self) -> &str {
        self.key.as_ref().map(Key::namespace_id).unwrap_or_default()
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}
