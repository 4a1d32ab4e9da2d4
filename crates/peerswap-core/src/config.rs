use crate::resolver::DEFAULT_PROTOCOL;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the local packument directory.
pub const REGISTRY_ENV: &str = "PEERSWAP_REGISTRY";

/// Environment variable overriding the protocol tag.
pub const PROTOCOL_ENV: &str = "PEERSWAP_PROTOCOL";

/// Runtime configuration for the peerswap CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory; the manifest is read from here.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,

    /// Protocol tag recognized by the peer edit resolver, with its `:`.
    pub protocol: String,

    /// Directory of packuments used as the upstream registry.
    pub registry_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            protocol: DEFAULT_PROTOCOL.to_string(),
            registry_dir: None,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Defaults overridden by `PEERSWAP_PROTOCOL` and `PEERSWAP_REGISTRY`.
    ///
    /// Empty variables are ignored.
    #[must_use]
    pub fn from_env(cwd: PathBuf) -> Self {
        let mut config = Self::new(cwd);
        if let Some(protocol) = non_empty_var(PROTOCOL_ENV) {
            config = config.with_protocol(protocol);
        }
        if let Some(dir) = non_empty_var(REGISTRY_ENV) {
            config.registry_dir = Some(PathBuf::from(dir));
        }
        config
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }

    /// Set the protocol tag. A missing trailing `:` is added.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        let mut protocol = protocol.into();
        if !protocol.ends_with(':') {
            protocol.push(':');
        }
        self.protocol = protocol;
        self
    }

    /// Set the registry directory.
    #[must_use]
    pub fn with_registry_dir(mut self, dir: PathBuf) -> Self {
        self.registry_dir = Some(dir);
        self
    }

    /// Registry directory, relative to `cwd` when not absolute.
    #[must_use]
    pub fn registry_dir(&self) -> Option<PathBuf> {
        self.registry_dir.as_ref().map(|dir| self.cwd.join(dir))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
