//! `dsx export` command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::opts::{EmulatorOpts, connect};
use crate::output::{print_json, to_json};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export only this namespace
    #[arg(long)]
    pub namespace: Option<String>,

    /// Write the document to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn cmd_export(opts: &EmulatorOpts, args: &ExportArgs) -> Result<()> {
    let session = connect(opts)?;
    let export = session
        .client
        .export_entities_as_json(&session.project_id, args.namespace.as_deref())
        .await
        .context("export failed")?;

    let Some(out) = &args.out else {
        return print_json(opts, &export);
    };
    fs::write(out, to_json(opts, &export)?)
        .with_context(|| format!("write {}", out.display()))?;
    print_json(
        opts,
        &json!({
            "out": out.display().to_string(),
            "namespaces": export.namespaces.len(),
            "entities": export.entity_count(),
        }),
    )
}
