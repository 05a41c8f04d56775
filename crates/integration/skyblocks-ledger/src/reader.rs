//! Ledger reader
//!
//! Read-only calls: floor history and the current build cost. Both are
//! idempotent and hold no state between calls, so they can run concurrently
//! with each other and with a pending submission.
//!
//! The plain `fetch_*` methods never fail. A broken read degrades to an empty
//! tower or the configured fallback cost and is reported through `tracing`.
//! Callers that need to tell "no floors yet" from "could not read" use the
//! `try_*` variants.

use crate::abi::{self, RawFloor};
use crate::rpc::{self, LedgerTransport};
use crate::{Error, Result};
use ethereum_types::U256;
use skyblocks_config::LedgerConfig;
use skyblocks_core::{format_units, Floor};
use std::sync::Arc;

/// 0.01 in 18-decimal units, used if the configured fallback is unusable
const DEFAULT_FALLBACK_COST: u64 = 10_000_000_000_000_000;

/// A build cost ready for display and for attaching to a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuote {
    /// Smallest currency unit
    pub units: U256,
    pub display: String,
    /// True when the live read failed and the fallback was used
    pub is_fallback: bool,
}

#[derive(Clone)]
pub struct LedgerReader {
    config: Arc<LedgerConfig>,
    transport: Arc<dyn LedgerTransport>,
}

impl LedgerReader {
    pub fn new(config: Arc<LedgerConfig>, transport: Arc<dyn LedgerTransport>) -> Self {
        Self { config, transport }
    }

    /// All floors, newest first. Empty if the ledger could not be read.
    pub async fn fetch_all_floors(&self) -> Vec<Floor> {
        match self.try_fetch_all_floors().await {
            Ok(floors) => floors,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch floors, showing an empty tower");
                Vec::new()
            }
        }
    }

    /// All floors, newest first
    pub async fn try_fetch_all_floors(&self) -> Result<Vec<Floor>> {
        let data = self.call(abi::GET_ALL_FLOORS).await?;
        let floors = floors_from_return_data(&data)?;
        tracing::debug!(count = floors.len(), "fetched floors");
        Ok(floors)
    }

    /// Current build cost as a decimal string, or the fallback cost on error
    pub async fn fetch_build_cost(&self) -> String {
        self.quote_build_cost().await.display
    }

    /// Current build cost in the smallest currency unit
    pub async fn try_fetch_cost(&self) -> Result<U256> {
        let data = self.call(abi::COST).await?;
        abi::decode_uint(&data)
    }

    pub async fn quote_build_cost(&self) -> CostQuote {
        let decimals = self.config.network.currency.decimals;
        match self.try_fetch_cost().await {
            Ok(units) => CostQuote {
                units,
                display: format_units(units, decimals),
                is_fallback: false,
            },
            Err(e) => {
                let units = self.fallback_cost();
                tracing::warn!(
                    error = %e,
                    fallback = %self.config.fallback_cost,
                    "failed to fetch build cost, using fallback"
                );
                CostQuote {
                    units,
                    display: format_units(units, decimals),
                    is_fallback: true,
                }
            }
        }
    }

    fn fallback_cost(&self) -> U256 {
        self.config
            .fallback_cost_units()
            .unwrap_or_else(|_| U256::from(DEFAULT_FALLBACK_COST))
    }

    async fn call(&self, signature: &str) -> Result<Vec<u8>> {
        rpc::eth_call(
            self.transport.as_ref(),
            self.config.contract_address,
            &abi::encode_call(signature),
        )
        .await
    }
}

/// Decode a `getAllFloors()` response into display order (newest first)
pub fn floors_from_return_data(data: &[u8]) -> Result<Vec<Floor>> {
    let mut floors = abi::decode_floors(data)?
        .into_iter()
        .map(normalize)
        .collect::<Result<Vec<_>>>()?;
    floors.reverse();
    Ok(floors)
}

/// Map one raw tuple onto the domain record
pub fn normalize(raw: RawFloor) -> Result<Floor> {
    if raw.timestamp.bits() > 64 {
        return Err(Error::Decode(format!("timestamp {} out of range", raw.timestamp)));
    }
    Ok(Floor {
        builder: raw.builder,
        message: raw.message,
        twitter_handle: raw.twitter_handle,
        theme_id: raw.theme_id,
        timestamp: raw.timestamp.low_u64(),
    })
}
