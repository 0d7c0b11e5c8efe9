//! Catalog reconstruction on top of run-query.
//!
//! The emulator has no "list kinds/namespaces/databases" RPC. Kinds and
//! namespaces come from the reserved meta-kinds; databases are only visible in
//! the partitions of keys the server returns, so database-scoped listings
//! sample real entities. Every public `list_*` is best-effort and falls back
//! to an empty/default listing; the matching `fetch_*` returns the error.

mod databases;
mod kinds;
mod namespaces;

pub use databases::DATABASE_SAMPLE_KINDS;

use dsx_protocol::Entity;

/// Name carried by a meta-kind row: the first path element's `name`. The
/// default namespace comes back with a numeric id instead, which reads as `""`.
fn meta_entity_name(entity: &Entity) -> Option<String> {
    let element = entity.key.as_ref()?.path.first()?;
    Some(element.name.clone().unwrap_or_default())
}
