//! Controller configuration.
//!
//! Values come from three layers, highest precedence first: command-line
//! flags (each with an environment variable), an optional YAML file, and the
//! built-in defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Command-line interface.
#[derive(Debug, Clone, Parser)]
#[command(name = "podsentry", version, about = "Alert on failing pods via Slack")]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(long, env = "PODSENTRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Slack incoming-webhook URL
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Only watch this namespace (default: all namespaces)
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub namespace: Option<String>,

    /// Minimum seconds between two alerts for the same pod and reason
    #[arg(long, env = "DEBOUNCE_WINDOW_SECONDS")]
    pub debounce_window_seconds: Option<u64>,

    /// Address for the health endpoints
    #[arg(long, env = "HEALTH_ADDR")]
    pub health_addr: Option<String>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    /// Suppression window per (pod, reason)
    pub debounce_window_seconds: u64,

    /// Delay before retrying a failed dispatch
    pub retry_delay_seconds: u64,

    /// Delay before retrying after a pod fetch error
    pub error_requeue_seconds: u64,

    /// How often expired debounce entries are purged
    pub sweep_interval_seconds: u64,

    /// Namespace to watch; `None` watches the whole cluster
    pub namespace: Option<String>,

    /// Listen address for `/health` and `/ready`
    pub health_addr: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce_window_seconds: 600,
            retry_delay_seconds: 300,
            error_requeue_seconds: 30,
            sweep_interval_seconds: 600,
            namespace: None,
            health_addr: "0.0.0.0:8081".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load from a YAML file on disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| Error::Config(format!("Failed to parse config YAML: {e}")))
    }

    /// Resolve the effective configuration for `cli`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(namespace) = &cli.namespace {
            self.namespace = Some(namespace.clone());
        }
        if let Some(window) = cli.debounce_window_seconds {
            self.debounce_window_seconds = window;
        }
        if let Some(addr) = &cli.health_addr {
            self.health_addr.clone_from(addr);
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("debounceWindowSeconds", self.debounce_window_seconds),
            ("retryDelaySeconds", self.retry_delay_seconds),
            ("errorRequeueSeconds", self.error_requeue_seconds),
            ("sweepIntervalSeconds", self.sweep_interval_seconds),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }

        if self.namespace.as_deref().is_some_and(str::is_empty) {
            return Err(Error::Config("namespace must not be empty".to_string()));
        }

        self.health_socket_addr()?;
        Ok(())
    }

    pub fn health_socket_addr(&self) -> Result<SocketAddr> {
        self.health_addr
            .parse()
            .map_err(|e| Error::Config(format!("Invalid healthAddr '{}': {e}", self.health_addr)))
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_secs(self.debounce_window_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("podsentry").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce_window(), Duration::from_secs(600));
        assert_eq!(config.retry_delay(), Duration::from_secs(300));
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ControllerConfig::from_yaml("debounceWindowSeconds: 120\nnamespace: shop\n").unwrap();
        assert_eq!(config.debounce_window_seconds, 120);
        assert_eq!(config.namespace.as_deref(), Some("shop"));
        assert_eq!(config.retry_delay_seconds, 300);
        assert_eq!(config.health_addr, "0.0.0.0:8081");
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = ControllerConfig::from_yaml("debounceWindowSeconds: [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = ControllerConfig {
            debounce_window_seconds: 0,
            ..ControllerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("debounceWindowSeconds"));
    }

    #[test]
    fn test_bad_health_addr_rejected() {
        let config = ControllerConfig {
            health_addr: "not-an-addr".to_string(),
            ..ControllerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debounceWindowSeconds: 120\nretryDelaySeconds: 60\nnamespace: shop").unwrap();

        let cli = cli(&[
            "--config",
            file.path().to_str().unwrap(),
            "--namespace",
            "payments",
            "--debounce-window-seconds",
            "900",
        ]);
        let config = ControllerConfig::load(&cli).unwrap();

        assert_eq!(config.namespace.as_deref(), Some("payments"));
        assert_eq!(config.debounce_window_seconds, 900);
        assert_eq!(config.retry_delay_seconds, 60);
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let cli = cli(&["--config", "/nonexistent/podsentry.yaml"]);
        assert!(matches!(ControllerConfig::load(&cli), Err(Error::Io(_))));
    }
}
