//! `dsx kinds` command.

use anyhow::Result;
use clap::Args;

use crate::opts::{EmulatorOpts, connect};
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct KindsArgs {
    /// Namespace (default namespace when omitted)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Only kinds whose entities live in this database
    #[arg(long)]
    pub database: Option<String>,

    /// Include entity counts (capped at 100+)
    #[arg(long)]
    pub counts: bool,
}

pub async fn cmd_kinds(opts: &EmulatorOpts, args: &KindsArgs) -> Result<()> {
    let session = connect(opts)?;
    let project_id = session.project_id.as_str();
    let namespace = args.namespace.as_deref();
    let database = args.database.as_deref();

    if !args.counts {
        let kinds = session.client.list_kinds(project_id, namespace, database).await;
        return print_json(opts, &kinds);
    }

    let seeded = session
        .client
        .list_kind_metadata(project_id, namespace, database)
        .await;
    let names = seeded.iter().map(|kind| kind.name.clone()).collect();
    session
        .client
        .refine_kind_counts(project_id, namespace, database, names)
        .await?;

    let table = session.client.kind_metadata();
    let kinds: Vec<_> = seeded
        .into_iter()
        .map(|kind| {
            table
                .get(project_id, &kind.namespace, &kind.name)
                .unwrap_or(kind)
        })
        .collect();
    print_json(opts, &kinds)
}
