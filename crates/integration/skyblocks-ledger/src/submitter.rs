//! Floor submission lifecycle
//!
//! ```text
//! Idle -> Validating -> AwaitingSignature -> Pending -> Confirmed
//!            |                 |               |
//!            +-----------------+---------------+--> Failed
//! ```
//!
//! One submission at a time per session. A second `submit` while one is in
//! flight is refused with [`Error::SubmissionInProgress`] and does not touch
//! the running one. Nothing in this path is ever retried: the call carries a
//! payment, so every failure is terminal and the caller decides whether to
//! start over.

use crate::abi;
use crate::guard::NetworkGuard;
use crate::reader::LedgerReader;
use crate::rpc::{self, LedgerTransport, TransactionReceipt};
use crate::signer::{SignerError, TransactionRequest};
use crate::{Error, Result};
use skyblocks_config::LedgerConfig;
use skyblocks_core::{FloorRequest, TxHash};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

/// Where the current (or last) submission stands
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Validating,
    AwaitingSignature,
    Pending { hash: TxHash },
    Confirmed { hash: TxHash, block_number: u64 },
    Failed(Error),
}

impl SubmissionState {
    /// A submission owns the slot
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Validating | Self::AwaitingSignature | Self::Pending { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed(_))
    }

    /// Cause string for a failed submission
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Failed(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::AwaitingSignature => write!(f, "awaiting signature"),
            Self::Pending { hash } => write!(f, "pending {hash:#x}"),
            Self::Confirmed { hash, block_number } => {
                write!(f, "confirmed {hash:#x} in block {block_number}")
            }
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// How long and how often to look for the receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ConfirmationPolicy {
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            timeout: config.confirmation.timeout(),
            poll_interval: config.confirmation.poll_interval(),
        }
    }
}

pub struct TransactionSubmitter {
    config: Arc<LedgerConfig>,
    guard: Arc<NetworkGuard>,
    reader: LedgerReader,
    transport: Arc<dyn LedgerTransport>,
    policy: ConfirmationPolicy,
    state: watch::Sender<SubmissionState>,
}

impl TransactionSubmitter {
    pub fn new(
        config: Arc<LedgerConfig>,
        guard: Arc<NetworkGuard>,
        reader: LedgerReader,
        transport: Arc<dyn LedgerTransport>,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            policy: ConfirmationPolicy::from_config(&config),
            config,
            guard,
            reader,
            transport,
            state,
        }
    }

    /// Override the configured confirmation policy
    pub fn with_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    /// Lifecycle updates for display
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Clear a finished submission back to `Idle`. No-op while one is active.
    pub fn reset(&self) {
        self.state.send_if_modified(|state| {
            if state.is_terminal() {
                *state = SubmissionState::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Append a floor and wait for the ledger to include it.
    ///
    /// On success the caller should re-read the floor list; the submitter
    /// keeps no copy of it.
    pub async fn submit(&self, request: FloorRequest) -> Result<TransactionReceipt> {
        let claimed = self.state.send_if_modified(|state| {
            if state.is_active() {
                false
            } else {
                *state = SubmissionState::Validating;
                true
            }
        });
        if !claimed {
            return Err(Error::SubmissionInProgress);
        }

        let mut slot = SlotGuard {
            state: &self.state,
            finished: false,
        };
        let outcome = self.drive(request).await;
        slot.finished = true;

        match &outcome {
            Ok(receipt) => {
                let block_number = receipt.block_number.map(|b| b.as_u64()).unwrap_or_default();
                tracing::info!(hash = ?receipt.transaction_hash, block_number, "floor confirmed");
                self.state.send_replace(SubmissionState::Confirmed {
                    hash: receipt.transaction_hash,
                    block_number,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "floor submission failed");
                self.state.send_replace(SubmissionState::Failed(e.clone()));
            }
        }
        outcome
    }

    async fn drive(&self, request: FloorRequest) -> Result<TransactionReceipt> {
        request.validate()?;
        let signer = self.guard.ensure_ready().await?;

        let quote = self.reader.quote_build_cost().await;
        let tx = TransactionRequest {
            to: self.config.contract_address,
            data: abi::encode_build_floor(
                &request.message,
                &request.twitter_handle,
                request.theme_id.as_raw(),
            ),
            value: quote.units,
            gas_limit: self.config.gas_limit,
            chain_id: self.guard.required_chain(),
        };

        self.state.send_replace(SubmissionState::AwaitingSignature);
        tracing::debug!(cost = %quote.display, fallback = quote.is_fallback, "requesting signature");
        let hash = signer.send_transaction(tx).await.map_err(|e| match e {
            SignerError::Rejected => Error::UserRejected,
            other => Error::Signer(other.to_string()),
        })?;

        self.state.send_replace(SubmissionState::Pending { hash });
        tracing::info!(hash = ?hash, "floor transaction sent");
        self.await_confirmation(hash).await
    }

    async fn await_confirmation(&self, hash: TxHash) -> Result<TransactionReceipt> {
        let poll = async {
            let mut ticker = time::interval(self.policy.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match rpc::transaction_receipt(self.transport.as_ref(), hash).await {
                    Ok(Some(receipt)) if receipt.is_included() => return receipt,
                    Ok(_) => {}
                    // observing only; a failed poll is not a resend
                    Err(e) => tracing::debug!(error = %e, hash = ?hash, "receipt poll failed"),
                }
            }
        };

        let receipt = time::timeout(self.policy.timeout, poll)
            .await
            .map_err(|_| Error::TransactionTimeout {
                hash,
                waited: self.policy.timeout,
            })?;

        if receipt.succeeded() {
            Ok(receipt)
        } else {
            Err(Error::TransactionReverted { hash })
        }
    }
}

/// Marks the submission abandoned if `submit` is dropped mid-flight, so the
/// slot does not stay claimed forever
struct SlotGuard<'a> {
    state: &'a watch::Sender<SubmissionState>,
    finished: bool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("floor submission dropped before finishing");
            self.state.send_replace(SubmissionState::Failed(Error::Abandoned));
        }
    }
}
