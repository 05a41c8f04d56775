//! Session facade
//!
//! Wires the reader, guard and submitter from one configuration so a UI
//! layer has a single handle to hold. All display state lives here only for
//! the session; nothing is persisted.

use crate::guard::{GuardState, NetworkGuard};
use crate::reader::LedgerReader;
use crate::rpc::{JsonRpcClient, LedgerTransport, TransactionReceipt};
use crate::signer::WalletSigner;
use crate::submitter::{SubmissionState, TransactionSubmitter};
use crate::Result;
use skyblocks_config::LedgerConfig;
use skyblocks_core::{Floor, FloorRequest};
use std::sync::Arc;
use tokio::sync::watch;

/// Everything the UI renders, captured at one moment
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    /// Newest first
    pub floors: Vec<Floor>,
    pub cost: String,
    pub guard: GuardState,
    pub submission: SubmissionState,
}

impl DisplaySnapshot {
    /// Tower height
    pub fn height(&self) -> usize {
        self.floors.len()
    }
}

pub struct FloorClient {
    config: Arc<LedgerConfig>,
    reader: LedgerReader,
    guard: Arc<NetworkGuard>,
    submitter: TransactionSubmitter,
}

impl FloorClient {
    /// Client reading over HTTP JSON-RPC from the configured endpoint
    pub fn connect(config: Arc<LedgerConfig>) -> Self {
        let transport = Arc::new(JsonRpcClient::new(config.network.rpc_url.clone()));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: Arc<LedgerConfig>, transport: Arc<dyn LedgerTransport>) -> Self {
        let reader = LedgerReader::new(config.clone(), transport.clone());
        let guard = Arc::new(NetworkGuard::new(&config));
        let submitter =
            TransactionSubmitter::new(config.clone(), guard.clone(), reader.clone(), transport);
        tracing::debug!(
            chain_id = config.network.chain_id,
            contract = ?config.contract_address,
            "floor client ready"
        );
        Self {
            config,
            reader,
            guard,
            submitter,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn reader(&self) -> &LedgerReader {
        &self.reader
    }

    pub fn guard(&self) -> &NetworkGuard {
        &self.guard
    }

    pub fn submitter(&self) -> &TransactionSubmitter {
        &self.submitter
    }

    pub fn connect_wallet(&self, signer: Arc<dyn WalletSigner>) {
        self.guard.connect(signer);
    }

    pub fn disconnect_wallet(&self) {
        self.guard.disconnect();
    }

    pub async fn fetch_all_floors(&self) -> Vec<Floor> {
        self.reader.fetch_all_floors().await
    }

    pub async fn fetch_build_cost(&self) -> String {
        self.reader.fetch_build_cost().await
    }

    pub async fn guard_state(&self) -> GuardState {
        self.guard.current_state().await
    }

    pub async fn submit(&self, request: FloorRequest) -> Result<TransactionReceipt> {
        self.submitter.submit(request).await
    }

    pub fn submissions(&self) -> watch::Receiver<SubmissionState> {
        self.submitter.subscribe()
    }

    /// Read floors, cost and guard state concurrently
    pub async fn snapshot(&self) -> DisplaySnapshot {
        let (floors, cost, guard) = tokio::join!(
            self.reader.fetch_all_floors(),
            self.reader.fetch_build_cost(),
            self.guard.current_state(),
        );
        DisplaySnapshot {
            floors,
            cost,
            guard,
            submission: self.submitter.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::RawFloor;
    use crate::testing::{ReceiptScript, ScriptedSigner, ScriptedTransport};
    use crate::Error;
    use ethereum_types::{Address, U256};
    use skyblocks_core::ThemeId;

    fn client(floors: Vec<RawFloor>) -> FloorClient {
        let transport = ScriptedTransport::ledger(floors, U256::exp10(16), ReceiptScript::Success);
        FloorClient::with_transport(Arc::new(LedgerConfig::default()), Arc::new(transport))
    }

    #[tokio::test]
    async fn test_snapshot_without_wallet() {
        let client = client(vec![RawFloor {
            builder: Address::from_low_u64_be(0xAA),
            message: "first".into(),
            twitter_handle: "@aa".into(),
            theme_id: U256::from(1),
            timestamp: U256::from(100),
        }]);

        let snap = client.snapshot().await;
        assert_eq!(snap.height(), 1);
        assert_eq!(snap.floors[0].theme().id, ThemeId::Lava);
        assert_eq!(snap.floors[0].handle(), Some("aa"));
        assert_eq!(snap.cost, "0.01");
        assert_eq!(snap.guard, GuardState::Disconnected);
        assert_eq!(snap.submission, SubmissionState::Idle);
    }

    #[tokio::test]
    async fn test_wallet_on_wrong_network_blocks_writes_not_reads() {
        let client = client(vec![]);
        client.connect_wallet(Arc::new(ScriptedSigner::new(1)));

        assert_eq!(client.guard_state().await, GuardState::WrongNetwork { actual: 1 });
        assert_eq!(client.fetch_build_cost().await, "0.01");
        assert!(client.fetch_all_floors().await.is_empty());
        assert!(matches!(
            client.submit(FloorRequest::new("gm")).await,
            Err(Error::WrongNetwork { .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_then_refetch() {
        let client = client(vec![]);
        let wallet = Arc::new(ScriptedSigner::new(client.config().network.chain_id));
        client.connect_wallet(wallet.clone());
        let updates = client.submissions();

        client.submit(FloorRequest::new("gm").theme(ThemeId::Luxury)).await.unwrap();
        assert!(matches!(*updates.borrow(), SubmissionState::Confirmed { .. }));
        assert_eq!(wallet.sent().len(), 1);

        client.disconnect_wallet();
        assert_eq!(client.snapshot().await.guard, GuardState::Disconnected);
    }
}
