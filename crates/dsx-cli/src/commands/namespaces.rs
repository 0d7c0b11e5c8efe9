//! `dsx namespaces` command.

use anyhow::Result;
use clap::Args;

use crate::opts::{EmulatorOpts, connect};
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct NamespacesArgs {
    /// Only namespaces that have data in this database
    #[arg(long)]
    pub database: Option<String>,
}

pub async fn cmd_namespaces(opts: &EmulatorOpts, args: &NamespacesArgs) -> Result<()> {
    let session = connect(opts)?;
    let namespaces = session
        .client
        .list_namespaces(&session.project_id, args.database.as_deref())
        .await;
    print_json(opts, &namespaces)
}
