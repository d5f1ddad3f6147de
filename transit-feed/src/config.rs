//! Startup configuration: the network list and runner settings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{NetworkConfig, NetworkId};
use crate::http::ClientConfig;
use crate::poller::{PollMode, PollerConfig};

/// Default location of the network list.
pub const DEFAULT_NETWORKS_PATH: &str = "networks.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("network {0} is configured more than once")]
    DuplicateNetwork(NetworkId),

    #[error("config lists no networks")]
    NoNetworks,

    #[error("invalid {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },
}

/// Shape of the network list file.
#[derive(Debug, Deserialize)]
struct NetworksFile {
    networks: Vec<NetworkConfig>,
}

/// Load and validate the network list.
pub fn load_networks(path: impl AsRef<Path>) -> Result<Vec<NetworkConfig>, ConfigError> {
    let content =
        std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read(e.to_string()))?;
    parse_networks(&content)
}

/// Parse a network list. Each entry is validated, and ids must be unique.
pub fn parse_networks(content: &str) -> Result<Vec<NetworkConfig>, ConfigError> {
    let file: NetworksFile =
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if file.networks.is_empty() {
        return Err(ConfigError::NoNetworks);
    }

    let mut seen = HashSet::new();
    for network in &file.networks {
        if !seen.insert(&network.id) {
            return Err(ConfigError::DuplicateNetwork(network.id.clone()));
        }
    }

    Ok(file.networks)
}

/// Runner settings read from the environment.
///
/// | Variable                 | Meaning                                  |
/// |--------------------------|------------------------------------------|
/// | `TRANSIT_NETWORKS`       | network list path (`networks.json`)      |
/// | `TRANSIT_COOKIE`         | session cookie sent upstream             |
/// | `TRANSIT_POLL_MODE`      | `all` (default) or `active`              |
/// | `TRANSIT_ACTIVE_NETWORK` | initially selected network               |
/// | `TRANSIT_POLLING_URL`    | long-polling endpoint override           |
#[derive(Debug, Clone)]
pub struct Settings {
    pub networks_path: PathBuf,
    pub cookie: Option<String>,
    pub polling_url: Option<String>,
    pub mode: PollMode,
    pub active_network: Option<NetworkId>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mode = match get("TRANSIT_POLL_MODE") {
            Some(mode) => mode.parse::<PollMode>().map_err(|e| {
                ConfigError::InvalidSetting {
                    name: "TRANSIT_POLL_MODE",
                    message: e.to_string(),
                }
            })?,
            None => PollMode::default(),
        };

        let active_network = get("TRANSIT_ACTIVE_NETWORK")
            .map(|id| NetworkId::parse(id.trim()))
            .transpose()
            .map_err(|e| ConfigError::InvalidSetting {
                name: "TRANSIT_ACTIVE_NETWORK",
                message: e.to_string(),
            })?;

        Ok(Self {
            networks_path: get("TRANSIT_NETWORKS")
                .unwrap_or_else(|| DEFAULT_NETWORKS_PATH.to_string())
                .into(),
            cookie: get("TRANSIT_COOKIE"),
            polling_url: get("TRANSIT_POLLING_URL"),
            mode,
            active_network,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        if let Some(url) = &self.polling_url {
            config = config.with_polling_url(url);
        }
        if let Some(cookie) = &self.cookie {
            config = config.with_cookie(cookie);
        }
        config
    }

    pub fn poller_config(&self) -> PollerConfig {
        let config = PollerConfig::new().with_mode(self.mode);
        match &self.active_network {
            Some(id) => config.with_active_network(id.clone()),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const TWO_NETWORKS: &str = r#"{
        "networks": [
            {
                "id": "wroclaw",
                "stops_url": "https://czynaczas.pl/api/wroclaw/transport",
                "referer": "https://czynaczas.pl/wroclaw"
            },
            {
                "id": "gzm",
                "channel": "gzm",
                "stops_url": "https://czynaczas.pl/api/gzm/transport",
                "referer": "https://czynaczas.pl/gzm",
                "cookie": "session=abc"
            }
        ]
    }"#;

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_NETWORKS.as_bytes()).unwrap();

        let networks = load_networks(file.path()).unwrap();
        assert_eq!(networks.len(), 2);
        assert_eq!(networks[0].id.as_str(), "wroclaw");
        assert_eq!(networks[0].channel.as_str(), "wroclaw");
        assert_eq!(networks[1].cookie.as_deref(), Some("session=abc"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_networks(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn invalid_entry_is_parse_error() {
        let content = r#"{"networks":[{"id":"a","channel":"a/b","stops_url":"https://x.test/","referer":""}]}"#;
        let err = parse_networks(content).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("channel"));

        let err = parse_networks(r#"{"networks":[{"id":"a","stops_url":"not a url","referer":""}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let content = r#"{"networks":[
            {"id":"a","stops_url":"https://x.test/a","referer":""},
            {"id":"a","stops_url":"https://x.test/b","referer":""}
        ]}"#;
        let err = parse_networks(content).unwrap_err();
        assert_eq!(err.to_string(), "network a is configured more than once");
    }

    #[test]
    fn empty_list_rejected() {
        let err = parse_networks(r#"{"networks":[]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoNetworks));
    }

    #[test]
    fn shipped_network_list_is_valid() {
        let content = include_str!("../networks.json");
        let networks = parse_networks(content).unwrap();
        assert_eq!(networks.len(), 14);
        assert!(networks.iter().any(|n| n.id.as_str() == "zielonagora"));
    }

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn settings_defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.networks_path, PathBuf::from(DEFAULT_NETWORKS_PATH));
        assert_eq!(settings.mode, PollMode::AllNetworks);
        assert!(settings.cookie.is_none());
        assert!(settings.active_network.is_none());

        let client = settings.client_config();
        assert_eq!(client.polling_url, crate::http::DEFAULT_POLLING_URL);
    }

    #[test]
    fn settings_from_variables() {
        let settings = settings(&[
            ("TRANSIT_NETWORKS", "/etc/transit/networks.json"),
            ("TRANSIT_COOKIE", "sid=1"),
            ("TRANSIT_POLL_MODE", "active"),
            ("TRANSIT_ACTIVE_NETWORK", "poznan"),
            ("TRANSIT_POLLING_URL", "http://localhost:3000/socket.io/?EIO=4&transport=polling"),
        ])
        .unwrap();

        assert_eq!(settings.networks_path, PathBuf::from("/etc/transit/networks.json"));
        assert_eq!(settings.mode, PollMode::ActiveNetwork);

        let client = settings.client_config();
        assert_eq!(client.cookie.as_deref(), Some("sid=1"));
        assert!(client.polling_url.starts_with("http://localhost:3000"));

        let poller = settings.poller_config();
        assert_eq!(poller.mode, PollMode::ActiveNetwork);
        assert_eq!(poller.active_network.unwrap().as_str(), "poznan");
    }

    #[test]
    fn empty_variables_are_unset() {
        let settings = settings(&[("TRANSIT_COOKIE", ""), ("TRANSIT_POLL_MODE", " ")]).unwrap();
        assert!(settings.cookie.is_none());
        assert_eq!(settings.mode, PollMode::AllNetworks);
    }

    #[test]
    fn bad_mode_is_rejected() {
        let err = settings(&[("TRANSIT_POLL_MODE", "sometimes")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                name: "TRANSIT_POLL_MODE",
                ..
            }
        ));
    }
}
