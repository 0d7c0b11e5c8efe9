//! `dsx databases` command.

use anyhow::Result;
use clap::Args;

use crate::opts::{EmulatorOpts, connect};
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct DatabasesArgs {
    /// Namespace to sample (all namespaces when omitted)
    #[arg(long)]
    pub namespace: Option<String>,
}

pub async fn cmd_databases(opts: &EmulatorOpts, args: &DatabasesArgs) -> Result<()> {
    let session = connect(opts)?;
    let databases = session
        .client
        .list_databases(&session.project_id, args.namespace.as_deref())
        .await;
    print_json(opts, &databases)
}
