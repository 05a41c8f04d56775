//! Wallet capability seam
//!
//! The client never holds keys. A wallet is anything that can report its
//! network, switch networks on request, and sign-and-send a transaction after
//! its holder approves it.

use async_trait::async_trait;
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use skyblocks_config::ChainParams;
use skyblocks_core::TxHash;

/// Signing capability supplied by the caller
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Network the wallet is currently attached to
    async fn chain_id(&self) -> Result<u64, SignerError>;

    /// Ask the holder to sign and broadcast. Resolves once the transaction
    /// has a hash, or fails with [`SignerError::Rejected`] if they decline.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, SignerError>;

    /// Ask the wallet to add (if needed) and switch to a network
    async fn switch_chain(&self, params: &ChainParams) -> Result<(), SignerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    #[error("request rejected by the wallet holder")]
    Rejected,

    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Other(String),
}

/// A fee-paying contract call, ready for the wallet to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub to: Address,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Attached payment in the smallest currency unit
    pub value: U256,
    pub gas_limit: u64,
    pub chain_id: u64,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(d)?;
        hex::decode(raw.strip_prefix("0x").unwrap_or(&raw)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_like_a_wallet_call() {
        let tx = TransactionRequest {
            to: Address::from_low_u64_be(1),
            data: vec![0xde, 0xad],
            value: U256::exp10(16),
            gas_limit: 300_000,
            chain_id: 5_042_002,
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], "0xdead");
        assert_eq!(json["value"], "0x2386f26fc10000");
        assert_eq!(json["gasLimit"], 300_000);

        let back: TransactionRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }
}
