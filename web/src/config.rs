use anyhow::{Context, Result, anyhow};
use libsample::core::database::PoolSettings;
use serde::{Deserialize, Deserializer};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ListenConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
}

const DEFAULT_HTTP_PORT: u16 = 80;
const DEFAULT_HOST: &str = "0.0.0.0";
fn default_listen() -> ListenConfig {
    ListenConfig {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_HTTP_PORT,
    }
}

// This handles the case where the `listen` block is PRESENT, but a field may be missing.
fn deserialize_listen_with_default_port<'de, D>(deserializer: D) -> Result<ListenConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct PartialListenConfig {
        host: Option<String>,
        port: Option<u16>,
    }

    let partial_config = PartialListenConfig::deserialize(deserializer)?;

    Ok(ListenConfig {
        host: partial_config
            .host
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: partial_config.port.unwrap_or(DEFAULT_HTTP_PORT),
    })
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    #[serde(default = "default_listen")]
    #[serde(deserialize_with = "deserialize_listen_with_default_port")]
    pub(crate) listen: ListenConfig,
    pub(crate) database: String,
    #[serde(default)]
    pub(crate) max_connections: Option<u32>,
    /// seconds before a request to the database is abandoned
    #[serde(default)]
    pub(crate) request_timeout: Option<u64>,
}

impl EnvConfig {
    pub(crate) fn pool_settings(&self) -> PoolSettings {
        let mut settings = PoolSettings::default();
        if let Some(max) = self.max_connections {
            settings.max_connections = max;
        }
        settings
    }

    pub(crate) fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout.map(Duration::from_secs)
    }
}

/// The config file used when none is given on the command line
pub(crate) fn default_config_file() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("org", "example", "sampleweb")
        .ok_or_else(|| anyhow!("Cannot find default project config directory"))?;
    Ok(project_dirs.config_dir().join("config.yaml"))
}

/// Parse a yaml document that maps environment names to [EnvConfig] objects
/// and pick out the one named `envname`
pub(crate) fn parse_config(yaml: &str, envname: &str) -> Result<EnvConfig> {
    let mut configs: HashMap<String, EnvConfig> =
        serde_yaml::from_str(yaml).with_context(|| "Failed to parse config file")?;
    configs
        .remove(envname)
        .ok_or_else(|| anyhow!("No configuration found for environment '{envname}'"))
}

pub(crate) async fn load_config(path: &Path, envname: &str) -> Result<EnvConfig> {
    debug!(?path, envname, "Loading configuration");
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config(&contents, envname)
}

#[cfg(test)]
mod test {
    use super::*;

    const YAML: &str = r#"dev:
  database: dev-database.sqlite
  listen: &LISTEN
    host: "127.0.0.1"
    port: 8080
prod:
  database: /srv/sampleweb/prod.sqlite
  max_connections: 20
  request_timeout: 10
  listen: *LISTEN
partial:
  database: partial.sqlite
  listen:
    host: "0.0.0.0"
bare:
  database: bare.sqlite"#;

    #[test]
    fn test_parse_config() {
        assert_eq!(
            parse_config(YAML, "dev").expect("no dev config"),
            EnvConfig {
                listen: ListenConfig {
                    host: "127.0.0.1".to_string(),
                    port: 8080,
                },
                database: "dev-database.sqlite".to_string(),
                max_connections: None,
                request_timeout: None,
            }
        );

        let prod = parse_config(YAML, "prod").expect("no prod config");
        assert_eq!(prod.database, "/srv/sampleweb/prod.sqlite");
        assert_eq!(prod.listen.port, 8080);
        assert_eq!(prod.pool_settings().max_connections, 20);
        assert_eq!(prod.request_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_default_listen() {
        let partial = parse_config(YAML, "partial").expect("no partial config");
        assert_eq!(partial.listen.port, 80);
        let bare = parse_config(YAML, "bare").expect("no bare config");
        assert_eq!(bare.listen, default_listen());
        assert_eq!(bare.pool_settings(), PoolSettings::default());
        assert_eq!(bare.request_timeout(), None);
    }

    #[test]
    fn test_unknown_environment_or_field() {
        assert!(parse_config(YAML, "staging").is_err());
        assert!(parse_config("dev:\n  database: x\n  colour: blue\n", "dev").is_err());
    }
}
