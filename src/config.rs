//! Configuration management for ProofLedger

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub miner: MinerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Coins minted to the issuing authority by the genesis block.
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_supply: default_initial_supply(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MinerConfig {
    /// Upper bound on a single proof-of-work search; 0 disables the limit.
    #[serde(default)]
    pub timeout_secs: u64,
}

impl MinerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn from_toml_str(config_str: &str) -> Result<Self, ChainError> {
        let config: Config = toml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        if self.ledger.initial_supply == 0 {
            return Err(ChainError::ConfigError(
                "ledger.initial_supply must be greater than zero".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ChainError::ConfigError(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file, falling back to defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => Config::from_toml_str(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

fn default_initial_supply() -> u64 {
    1000
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ledger.initial_supply, 1000);
        assert_eq!(config.miner.timeout(), None);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("[miner]\ntimeout_secs = 5\n").unwrap();
        assert_eq!(config.ledger.initial_supply, 1000);
        assert_eq!(config.miner.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_supply_rejected() {
        let result = Config::from_toml_str("[ledger]\ninitial_supply = 0\n");
        assert!(matches!(result, Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = Config::from_toml_str("[ledger\ninitial_supply = ");
        assert!(matches!(result, Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proofledger.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[ledger]\ninitial_supply = 5000\n\n[logging]\nfilter = \"debug\"").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.ledger.initial_supply, 5000);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ledger.initial_supply, 1000);
    }
}
