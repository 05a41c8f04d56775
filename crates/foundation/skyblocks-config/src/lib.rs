//! # SkyBlocks Config
//!
//! One immutable [`LedgerConfig`] per process. It is loaded once, validated,
//! wrapped in an `Arc` and handed to every ledger component at construction.
//!
//! Load order:
//! 1. file named by `SKYBLOCKS_CONFIG`, else `<config_dir>/skyblocks/config.yaml`
//! 2. built-in defaults for anything missing
//! 3. `SKYBLOCKS_*` environment overrides
//! 4. [`LedgerConfig::validate`]

pub mod network;

pub use network::{ChainParams, CurrencyConfig, NetworkConfig};

use serde::{Deserialize, Serialize};
use skyblocks_core::{parse_units, Address, U256};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

// 0x92c49128C4a8F379CA22777e1342a2e335444d27
const DEFAULT_CONTRACT: [u8; 20] = [
    0x92, 0xc4, 0x91, 0x28, 0xc4, 0xa8, 0xf3, 0x79, 0xca, 0x22, 0x77, 0x7e, 0x13, 0x42, 0xa2,
    0xe3, 0x35, 0x44, 0x4d, 0x27,
];

/// Everything the client needs to know about the ledger it talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Deployed floor contract
    pub contract_address: Address,
    pub network: NetworkConfig,
    /// Shown (and attached) when the live cost cannot be read
    pub fallback_cost: String,
    pub gas_limit: u64,
    pub confirmation: ConfirmationConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            contract_address: Address::from(DEFAULT_CONTRACT),
            network: NetworkConfig::default(),
            fallback_cost: "0.01".to_string(),
            gas_limit: 300_000,
            confirmation: ConfirmationConfig::default(),
        }
    }
}

/// How long to watch a sent transaction before giving up locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            poll_interval_ms: 1_500,
        }
    }
}

impl ConfirmationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl LedgerConfig {
    /// Load from file + environment, then validate
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// `SKYBLOCKS_CONFIG`, else the per-user config file location
    pub fn config_path() -> Option<PathBuf> {
        std::env::var_os("SKYBLOCKS_CONFIG")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("skyblocks").join("config.yaml")))
    }

    /// Read a YAML (or JSON) file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded ledger config");
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `SKYBLOCKS_*` overrides from a key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(rpc) = lookup("SKYBLOCKS_RPC") {
            self.network.rpc_url = rpc;
        }
        if let Some(chain) = lookup("SKYBLOCKS_CHAIN_ID") {
            self.network.chain_id = chain
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("SKYBLOCKS_CHAIN_ID={chain}")))?;
        }
        if let Some(contract) = lookup("SKYBLOCKS_CONTRACT") {
            self.contract_address = parse_address(&contract)?;
        }
        if let Some(secs) = lookup("SKYBLOCKS_CONFIRM_TIMEOUT_SECS") {
            self.confirmation.timeout_secs = secs.parse().map_err(|_| {
                ConfigError::Invalid(format!("SKYBLOCKS_CONFIRM_TIMEOUT_SECS={secs}"))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.network.rpc_url)
            .map_err(|e| ConfigError::Invalid(format!("rpc_url {}: {e}", self.network.rpc_url)))?;
        if self.network.currency.decimals > 77 {
            return Err(ConfigError::Invalid(format!(
                "currency decimals {} exceed 77",
                self.network.currency.decimals
            )));
        }
        self.fallback_cost_units()?;
        if self.gas_limit == 0 {
            return Err(ConfigError::Invalid("gas_limit must be non-zero".into()));
        }
        if self.confirmation.timeout_secs == 0 || self.confirmation.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "confirmation timeout and poll interval must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Fallback cost in the smallest currency unit
    pub fn fallback_cost_units(&self) -> Result<U256> {
        parse_units(&self.fallback_cost, self.network.currency.decimals)
            .map_err(|e| ConfigError::Invalid(format!("fallback_cost: {e}")))
    }
}

fn parse_address(raw: &str) -> Result<Address> {
    let hex_part = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(hex_part)
        .map_err(|e| ConfigError::Invalid(format!("address {raw}: {e}")))?;
    if bytes.len() != 20 {
        return Err(ConfigError::Invalid(format!(
            "address {raw}: expected 20 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = LedgerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.chain_id, 5_042_002);
        assert_eq!(
            format!("{:#x}", config.contract_address),
            "0x92c49128c4a8f379ca22777e1342a2e335444d27"
        );
        assert_eq!(config.fallback_cost_units().unwrap(), U256::exp10(16));
        assert_eq!(config.confirmation.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = LedgerConfig::from_yaml_str(
            "network:\n  chain_id: 31337\n  rpc_url: http://127.0.0.1:8545\ngas_limit: 500000\n",
        )
        .unwrap();
        assert_eq!(config.network.chain_id, 31337);
        assert_eq!(config.network.name, "Arc Testnet");
        assert_eq!(config.gas_limit, 500_000);
        assert_eq!(config.fallback_cost, "0.01");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "contract_address: \"0x00000000000000000000000000000000000000aa\"\nfallback_cost: \"0.5\""
        )
        .unwrap();
        let config = LedgerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.contract_address, Address::from_low_u64_be(0xaa));
        assert_eq!(config.fallback_cost_units().unwrap(), U256::exp10(17) * 5);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = LedgerConfig::from_file(Path::new("/nonexistent/skyblocks.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SKYBLOCKS_RPC", "http://localhost:8545"),
            ("SKYBLOCKS_CHAIN_ID", "1"),
            ("SKYBLOCKS_CONTRACT", "0x00000000000000000000000000000000000000bb"),
            ("SKYBLOCKS_CONFIRM_TIMEOUT_SECS", "30"),
        ]
        .into_iter()
        .collect();

        let mut config = LedgerConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.network.rpc_url, "http://localhost:8545");
        assert_eq!(config.network.chain_id, 1);
        assert_eq!(config.contract_address, Address::from_low_u64_be(0xbb));
        assert_eq!(config.confirmation.timeout_secs, 30);
    }

    #[test]
    fn test_bad_overrides_rejected() {
        let mut config = LedgerConfig::default();
        assert!(config
            .apply_overrides(|k| (k == "SKYBLOCKS_CHAIN_ID").then(|| "arc".to_string()))
            .is_err());
        assert!(config
            .apply_overrides(|k| (k == "SKYBLOCKS_CONTRACT").then(|| "0x1234".to_string()))
            .is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LedgerConfig::default();
        config.network.rpc_url = "not a url".into();
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.fallback_cost = "cheap".into();
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.confirmation.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
