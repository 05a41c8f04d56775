//! Network guard
//!
//! Gates every write behind "a wallet is connected and it is on the required
//! chain". State is never cached: each query asks the connected wallet for
//! its network, so a network switch is visible on the next query with no
//! other input.

use crate::signer::WalletSigner;
use crate::{Error, Result};
use skyblocks_config::{ChainParams, LedgerConfig};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Guard verdict for the current wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No signing capability available
    Disconnected,
    /// Wallet is attached to some other network
    WrongNetwork { actual: u64 },
    Ready,
}

impl GuardState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::WrongNetwork { actual } => write!(f, "wrong network ({actual})"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

type SignerSlot = Option<Arc<dyn WalletSigner>>;

pub struct NetworkGuard {
    required_chain: u64,
    chain_params: ChainParams,
    signer: watch::Sender<SignerSlot>,
}

impl NetworkGuard {
    pub fn new(config: &LedgerConfig) -> Self {
        let (signer, _) = watch::channel(None);
        Self {
            required_chain: config.network.chain_id,
            chain_params: config.network.chain_params(),
            signer,
        }
    }

    pub fn required_chain(&self) -> u64 {
        self.required_chain
    }

    /// Wallet connected. Replaces any previous wallet.
    pub fn connect(&self, signer: Arc<dyn WalletSigner>) {
        tracing::info!("wallet connected");
        self.signer.send_replace(Some(signer));
    }

    pub fn disconnect(&self) {
        if self.signer.send_replace(None).is_some() {
            tracing::info!("wallet disconnected");
        }
    }

    /// Currently connected wallet, if any
    pub fn signer(&self) -> Option<Arc<dyn WalletSigner>> {
        self.signer.borrow().clone()
    }

    /// Notified on every connect/disconnect
    pub fn subscribe(&self) -> watch::Receiver<SignerSlot> {
        self.signer.subscribe()
    }

    pub async fn current_state(&self) -> GuardState {
        self.check().await.0
    }

    /// The connected wallet if it is on the required chain, else `WrongNetwork`
    pub async fn ensure_ready(&self) -> Result<Arc<dyn WalletSigner>> {
        match self.check().await {
            (GuardState::Ready, Some(signer)) => Ok(signer),
            (GuardState::WrongNetwork { actual }, _) => Err(Error::WrongNetwork {
                expected: self.required_chain,
                actual: Some(actual),
            }),
            _ => Err(Error::WrongNetwork {
                expected: self.required_chain,
                actual: None,
            }),
        }
    }

    /// Ask the wallet to add/switch to the required network. Does nothing
    /// when already ready.
    pub async fn request_switch(&self) -> Result<GuardState> {
        let signer = match self.check().await {
            (GuardState::Ready, _) => return Ok(GuardState::Ready),
            (_, Some(signer)) => signer,
            (_, None) => {
                return Err(Error::WrongNetwork {
                    expected: self.required_chain,
                    actual: None,
                })
            }
        };

        tracing::info!(chain_id = self.required_chain, "requesting network switch");
        signer.switch_chain(&self.chain_params).await.map_err(|e| match e {
            crate::SignerError::Rejected => Error::UserRejected,
            other => Error::Signer(other.to_string()),
        })?;
        Ok(self.current_state().await)
    }

    async fn check(&self) -> (GuardState, SignerSlot) {
        // clone out of the channel so the borrow is not held across the await
        let Some(signer) = self.signer() else {
            return (GuardState::Disconnected, None);
        };

        let state = match signer.chain_id().await {
            Ok(chain) if chain == self.required_chain => GuardState::Ready,
            Ok(chain) => GuardState::WrongNetwork { actual: chain },
            Err(e) => {
                tracing::warn!(error = %e, "wallet did not report its network");
                GuardState::Disconnected
            }
        };
        (state, Some(signer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSigner;

    const ARC: u64 = 5_042_002;

    fn guard() -> NetworkGuard {
        NetworkGuard::new(&LedgerConfig::default())
    }

    #[tokio::test]
    async fn test_disconnected_without_wallet() {
        let guard = guard();
        assert_eq!(guard.current_state().await, GuardState::Disconnected);
        assert_eq!(
            guard.ensure_ready().await.err(),
            Some(Error::WrongNetwork { expected: ARC, actual: None })
        );
    }

    #[tokio::test]
    async fn test_network_change_is_seen_without_other_input() {
        let guard = guard();
        let wallet = Arc::new(ScriptedSigner::new(1));
        guard.connect(wallet.clone());
        assert_eq!(guard.current_state().await, GuardState::WrongNetwork { actual: 1 });
        assert!(guard.ensure_ready().await.is_err());

        wallet.set_chain_id(ARC);
        assert_eq!(guard.current_state().await, GuardState::Ready);
        assert!(guard.ensure_ready().await.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect() {
        let guard = guard();
        let mut events = guard.subscribe();
        guard.connect(Arc::new(ScriptedSigner::new(ARC)));
        assert!(events.has_changed().unwrap());
        assert!(guard.current_state().await.is_ready());

        events.borrow_and_update();
        guard.disconnect();
        assert!(events.has_changed().unwrap());
        assert_eq!(guard.current_state().await, GuardState::Disconnected);
    }

    #[tokio::test]
    async fn test_unreachable_wallet_reads_as_disconnected() {
        let guard = guard();
        let wallet = Arc::new(ScriptedSigner::new(ARC));
        wallet.fail_chain_id("extension locked");
        guard.connect(wallet);
        assert_eq!(guard.current_state().await, GuardState::Disconnected);
    }

    #[tokio::test]
    async fn test_request_switch() {
        let guard = guard();
        let wallet = Arc::new(ScriptedSigner::new(1));
        guard.connect(wallet.clone());

        assert_eq!(guard.request_switch().await.unwrap(), GuardState::Ready);
        let requests = wallet.switch_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].chain_id, "0x4cef52");

        // already ready: no second prompt
        guard.request_switch().await.unwrap();
        assert_eq!(wallet.switch_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_request_switch_rejected() {
        let guard = guard();
        let wallet = Arc::new(ScriptedSigner::new(1));
        wallet.reject_switch();
        guard.connect(wallet);
        assert_eq!(guard.request_switch().await, Err(Error::UserRejected));
        assert_eq!(guard.current_state().await, GuardState::WrongNetwork { actual: 1 });
    }
}
