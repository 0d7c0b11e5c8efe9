use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Load `.env` from the working directory without overriding existing
/// environment variables.
pub fn load_dotenv() -> Result<()> {
    let env_path = Path::new(".env");
    if env_path.exists() {
        for item in dotenvy::from_path_iter(env_path).context("load .env")? {
            let (key, val) = item?;
            if std::env::var_os(&key).is_none() {
                unsafe {
                    std::env::set_var(&key, &val);
                }
            }
        }
    }
    Ok(())
}

/// `RUST_LOG` filtered logging to stderr, `warn` when unset.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();
}
