//! Wire types for the entity-store emulator's JSON API (`/v1/projects/{id}:{method}`).
//!
//! Field names follow the emulator verbatim (camelCase). Nothing in this crate
//! performs I/O.

pub mod entity;
pub mod key;
pub mod rpc;
pub mod value;

pub use entity::*;
pub use key::*;
pub use rpc::*;
pub use value::*;

/// Reserved meta-kind enumerating every kind in a namespace.
pub const KIND_META_KIND: &str = "__kind__";
/// Reserved meta-kind enumerating every namespace in a project.
pub const NAMESPACE_META_KIND: &str = "__namespace__";

/// Kinds named `__…__` are synthesized by the server and never hold user data.
pub fn is_reserved_kind(name: &str) -> bool {
    name.len() >= 4 && name.starts_with("__") && name.ends_with("__")
}
