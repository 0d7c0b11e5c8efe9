use std::time::Duration;

use crate::errors::{DatastoreError, Result};

pub const DEFAULT_EMULATOR_URL: &str = "http://localhost:8081";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_FAN_OUT_CONCURRENCY: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportTimeout {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for TransportTimeout {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    /// Emulator root, e.g. `http://localhost:8081`.
    pub base_url: String,
    /// Project used when a caller does not name one.
    pub project_id: Option<String>,
    pub timeout: TransportTimeout,
    pub cache_ttl: Duration,
    /// Upper bound on concurrent sampling queries during discovery.
    pub fan_out_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EMULATOR_URL.to_string(),
            project_id: None,
            timeout: TransportTimeout::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }
}

impl ClientConfig {
    pub fn new(emulator_host: impl AsRef<str>) -> Self {
        Self {
            base_url: normalize_base_url(emulator_host.as_ref()),
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Reads `DATASTORE_EMULATOR_HOST`, `DATASTORE_PROJECT_ID`,
    /// `DSX_CACHE_TTL_MS` and `DSX_FAN_OUT_CONCURRENCY`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(host) = lookup("DATASTORE_EMULATOR_HOST").filter(|host| !host.is_empty()) {
            config.base_url = normalize_base_url(&host);
        }
        config.project_id = lookup("DATASTORE_PROJECT_ID").filter(|project| !project.is_empty());
        if let Some(raw) = lookup("DSX_CACHE_TTL_MS") {
            config.cache_ttl = Duration::from_millis(parse_number("DSX_CACHE_TTL_MS", &raw)?);
        }
        if let Some(raw) = lookup("DSX_FAN_OUT_CONCURRENCY") {
            let value = parse_number("DSX_FAN_OUT_CONCURRENCY", &raw)?;
            if value == 0 {
                return Err(DatastoreError::Configuration(
                    "DSX_FAN_OUT_CONCURRENCY must be at least 1".into(),
                ));
            }
            config.fan_out_concurrency = usize::try_from(value).map_err(|error| {
                DatastoreError::Configuration(format!("DSX_FAN_OUT_CONCURRENCY: {error}"))
            })?;
        }
        Ok(config)
    }

    /// Project to use, preferring an explicit argument.
    pub fn resolve_project(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .or(self.project_id.as_deref())
            .filter(|project| !project.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| {
                DatastoreError::Configuration(
                    "no project id given and DATASTORE_PROJECT_ID is not set".into(),
                )
            })
    }
}

fn parse_number(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| DatastoreError::Configuration(format!("invalid {name} '{raw}': {error}")))
}

/// `localhost:8081` becomes `http://localhost:8081`; trailing slashes go.
fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ClientConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.cache_ttl, Duration::from_millis(30_000));
    }

    #[test]
    fn emulator_host_without_scheme_gets_http() {
        let config = ClientConfig::from_lookup(env(&[
            ("DATASTORE_EMULATOR_HOST", "127.0.0.1:8432/"),
            ("DATASTORE_PROJECT_ID", "demo"),
            ("DSX_CACHE_TTL_MS", "500"),
            ("DSX_FAN_OUT_CONCURRENCY", "3"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8432");
        assert_eq!(config.project_id.as_deref(), Some("demo"));
        assert_eq!(config.cache_ttl, Duration::from_millis(500));
        assert_eq!(config.fan_out_concurrency, 3);
    }

    #[test]
    fn malformed_numbers_are_configuration_errors() {
        let error = ClientConfig::from_lookup(env(&[("DSX_CACHE_TTL_MS", "soon")])).unwrap_err();
        assert!(matches!(error, DatastoreError::Configuration(_)));

        let error =
            ClientConfig::from_lookup(env(&[("DSX_FAN_OUT_CONCURRENCY", "0")])).unwrap_err();
        assert!(matches!(error, DatastoreError::Configuration(_)));
    }

    #[test]
    fn resolve_project_prefers_explicit_value() {
        let config = ClientConfig::new("https://emulator.local").with_project("fallback");
        assert_eq!(config.base_url, "https://emulator.local");
        assert_eq!(config.resolve_project(Some("given")).unwrap(), "given");
        assert_eq!(config.resolve_project(None).unwrap(), "fallback");
        assert!(ClientConfig::default().resolve_project(None).is_err());
    }
}
