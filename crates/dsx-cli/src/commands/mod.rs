//! CLI command handlers.

pub mod databases;
pub mod delete;
pub mod entities;
pub mod export;
pub mod kinds;
pub mod namespaces;
pub mod ping;

use clap::Args;
use dsx_client::dsx_protocol::{Key, PartitionId, PathElement};

/// Addresses one entity by kind and id or name.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Entity kind
    pub kind: String,

    /// Numeric id or key name; digits are read as an id
    pub id_or_name: String,

    /// Namespace (default namespace when omitted)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Database id (default database when omitted)
    #[arg(long)]
    pub database: Option<String>,
}

impl KeyArgs {
    pub fn to_key(&self, project_id: &str) -> Key {
        let mut partition = PartitionId::new(project_id);
        if let Some(namespace) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            partition = partition.with_namespace(namespace);
        }
        if let Some(database) = self.database.as_deref() {
            partition = partition.with_database(database);
        }
        let element = match self.id_or_name.parse::<i64>() {
            Ok(id) => PathElement::id(&self.kind, id),
            Err(_) => PathElement::name(&self.kind, &self.id_or_name),
        };
        Key::new(partition, vec![element])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(id_or_name: &str, namespace: Option<&str>) -> KeyArgs {
        KeyArgs {
            kind: "Task".into(),
            id_or_name: id_or_name.into(),
            namespace: namespace.map(Into::into),
            database: None,
        }
    }

    #[test]
    fn digits_become_ids_and_everything_else_names() {
        let key = args("42", None).to_key("p");
        assert_eq!(key.path[0].id.as_deref(), Some("42"));
        assert_eq!(key.path[0].name, None);

        let key = args("task-42", Some("tenant")).to_key("p");
        assert_eq!(key.path[0].name.as_deref(), Some("task-42"));
        assert_eq!(key.namespace_id(), "tenant");
    }

    #[test]
    fn empty_namespace_stays_default() {
        let key = args("a", Some("")).to_key("p");
        assert_eq!(key.partition_id.unwrap().namespace_id, None);
    }
}
