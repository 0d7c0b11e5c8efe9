//! Keys, path elements and partitions.

use serde::{Deserialize, Serialize};

/// Scope a key lives in.
///
/// An absent `databaseId` and an empty one both mean the default database when
/// the server returns them; only the emulator ever fills this in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionId {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
}

impl PartitionId {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            namespace_id: None,
            database_id: None,
        }
    }

    pub fn with_namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = Some(namespace_id.into());
        self
    }

    pub fn with_database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = Some(database_id.into());
        self
    }

    pub fn namespace_id(&self) -> &str {
        self.namespace_id.as_deref().unwrap_or_default()
    }

    pub fn database_id(&self) -> &str {
        self.database_id.as_deref().unwrap_or_default()
    }
}

/// One `{kind, id|name}` segment of a key path.
///
/// `id` is an int64 the emulator serializes as a decimal string. A segment
/// with neither `id` nor `name` is incomplete and asks the server to allocate
/// an id on insert.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathElement {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PathElement {
    pub fn id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id: Some(id.to_string()),
            name: None,
        }
    }

    pub fn name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            name: Some(name.into()),
        }
    }

    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            name: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.id.is_some() || self.name.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<PartitionId>,
    #[serde(default)]
    pub path: Vec<PathElement>,
}

impl Key {
    pub fn new(partition_id: PartitionId, path: Vec<PathElement>) -> Self {
        Self {
            partition_id: Some(partition_id),
            path,
        }
    }

    /// Kind of the entity this key names: the last path element's kind.
    pub fn kind(&self) -> Option<&str> {
        self.path.last().map(|element| element.kind.as_str())
    }

    pub fn project_id(&self) -> Option<&str> {
        self.partition_id
            .as_ref()
            .map(|partition| partition.project_id.as_str())
    }

    pub fn namespace_id(&self) -> &str {
        self.partition_id
            .as_ref()
            .map(PartitionId::namespace_id)
            .unwrap_or_default()
    }

    /// Database embedded in the partition; absent reads as `""`.
    pub fn database_id(&self) -> &str {
        self.partition_id
            .as_ref()
            .map(PartitionId::database_id)
            .unwrap_or_default()
    }

    /// Copy of this key with the partition's database field removed.
    pub fn without_database(&self) -> Self {
        let mut key = self.clone();
        if let Some(partition) = key.partition_id.as_mut() {
            partition.database_id = None;
        }
        key
    }

    pub fn is_complete(&self) -> bool {
        !self.path.is_empty() && self.path.iter().all(PathElement::is_complete)
    }
}
