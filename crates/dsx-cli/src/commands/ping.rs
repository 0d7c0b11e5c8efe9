//! `dsx ping` command.

use anyhow::{Result, bail};
use serde_json::json;

use crate::opts::EmulatorOpts;
use crate::output::print_json;

pub async fn cmd_ping(opts: &EmulatorOpts) -> Result<()> {
    let config = opts.client_config()?;
    let client = dsx_client::DatastoreClient::from_config(&config)?;
    if !client.health_check().await {
        bail!("emulator at {} is not reachable", config.base_url);
    }
    print_json(opts, &json!({ "emulator": config.base_url, "healthy": true }))
}
