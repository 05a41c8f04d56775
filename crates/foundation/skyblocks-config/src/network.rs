//! Network identity and wallet-facing chain parameters

use serde::{Deserialize, Serialize};

/// The one network every read and write targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    /// JSON-RPC endpoint used for all reads
    pub rpc_url: String,
    pub explorer_url: Option<String>,
    pub currency: CurrencyConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 5_042_002,
            name: "Arc Testnet".to_string(),
            rpc_url: "https://rpc.testnet.arc.network".to_string(),
            explorer_url: Some("https://testnet.arcscan.app".to_string()),
            currency: CurrencyConfig::default(),
        }
    }
}

impl NetworkConfig {
    /// Parameters for a wallet's add/switch-network request
    pub fn chain_params(&self) -> ChainParams {
        ChainParams {
            chain_id: format!("{:#x}", self.chain_id),
            chain_name: self.name.clone(),
            native_currency: self.currency.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: self.explorer_url.iter().cloned().collect(),
        }
    }

    /// Block explorer link for a transaction hash
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

/// Native currency of the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            name: "USDC".to_string(),
            symbol: "USDC".to_string(),
            decimals: skyblocks_core::ETHER_DECIMALS,
        }
    }
}

/// `wallet_addEthereumChain` parameter object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    /// `0x`-prefixed hex chain id
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: CurrencyConfig,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_params_hex_id() {
        let params = NetworkConfig::default().chain_params();
        assert_eq!(params.chain_id, "0x4cef52");
        assert_eq!(params.rpc_urls, vec!["https://rpc.testnet.arc.network"]);
        assert_eq!(params.block_explorer_urls.len(), 1);
        assert_eq!(params.native_currency.decimals, 18);
    }

    #[test]
    fn test_explorer_url() {
        let mut net = NetworkConfig::default();
        assert_eq!(
            net.explorer_tx_url("0xabc").as_deref(),
            Some("https://testnet.arcscan.app/tx/0xabc")
        );
        net.explorer_url = None;
        assert!(net.explorer_tx_url("0xabc").is_none());
    }
}
