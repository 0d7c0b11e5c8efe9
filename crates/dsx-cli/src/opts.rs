//! Global CLI options and client resolution.

use anyhow::Result;
use clap::Args;
use dsx_client::{ClientConfig, DatastoreClient};

/// Options shared by every command. Flags win over environment variables.
#[derive(Args, Debug, Clone)]
pub struct EmulatorOpts {
    /// Emulator host, `host:port` or a URL (env: DATASTORE_EMULATOR_HOST)
    #[arg(long, global = true, env = "DATASTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,

    /// Project id (env: DATASTORE_PROJECT_ID)
    #[arg(short = 'p', long, global = true, env = "DATASTORE_PROJECT_ID")]
    pub project: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

impl EmulatorOpts {
    /// Environment config with the emulator host flag applied on top.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(host) = self.emulator_host.as_deref().filter(|host| !host.is_empty()) {
            config.base_url = ClientConfig::new(host).base_url;
        }
        Ok(config)
    }
}

/// A connected client plus the project every call targets.
pub struct Session {
    pub client: DatastoreClient,
    pub project_id: String,
    pub base_url: String,
}

pub fn connect(opts: &EmulatorOpts) -> Result<Session> {
    let config = opts.client_config()?;
    let project_id = config.resolve_project(opts.project.as_deref())?;
    let client = DatastoreClient::from_config(&config)?;
    tracing::debug!(base_url = %config.base_url, %project_id, "connected");
    Ok(Session {
        client,
        project_id,
        base_url: config.base_url,
    })
}
