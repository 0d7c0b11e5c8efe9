//! `dsx delete` and `dsx delete-kind` commands.

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::KeyArgs;
use crate::opts::{EmulatorOpts, connect};
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub key: KeyArgs,
}

#[derive(Args, Debug)]
pub struct DeleteKindArgs {
    /// Entity kind
    pub kind: String,

    /// Namespace (default namespace when omitted)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Database id; only the default database can be deleted from
    #[arg(long)]
    pub database: Option<String>,
}

pub async fn cmd_delete(opts: &EmulatorOpts, args: &DeleteArgs) -> Result<()> {
    let session = connect(opts)?;
    let key = args.key.to_key(&session.project_id);
    session.client.delete_entity(&session.project_id, &key).await?;
    print_json(opts, &json!({ "deleted": 1, "key": key }))
}

pub async fn cmd_delete_kind(opts: &EmulatorOpts, args: &DeleteKindArgs) -> Result<()> {
    let session = connect(opts)?;
    let deleted = session
        .client
        .delete_kind(
            &session.project_id,
            &args.kind,
            args.namespace.as_deref(),
            args.database.as_deref(),
        )
        .await?;
    print_json(opts, &json!({ "kind": args.kind, "deleted": deleted }))
}
