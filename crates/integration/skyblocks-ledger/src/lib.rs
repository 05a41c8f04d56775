//! SkyBlocks Ledger Client
//!
//! Everything that talks to the floor contract. Reads go straight to the
//! configured RPC endpoint; writes go through whatever wallet the caller
//! connected, and only after the network guard says it is on the right chain.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  skyblocks-ledger                    │
//! ├──────────────────────────────────────────────────────┤
//! │  abi.rs        │ selectors, calldata, return decoding │
//! │  rpc.rs        │ JSON-RPC transport (reqwest)         │
//! │  signer.rs     │ wallet capability seam               │
//! │  guard.rs      │ Disconnected / WrongNetwork / Ready  │
//! │  reader.rs     │ floor history + build cost           │
//! │  submitter.rs  │ buildFloor lifecycle state machine   │
//! │  client.rs     │ session facade for the UI layer      │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod abi;
pub mod client;
pub mod guard;
pub mod reader;
pub mod rpc;
pub mod signer;
pub mod submitter;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{DisplaySnapshot, FloorClient};
pub use guard::{GuardState, NetworkGuard};
pub use reader::{CostQuote, LedgerReader};
pub use rpc::{JsonRpcClient, LedgerTransport, TransactionReceipt};
pub use signer::{SignerError, TransactionRequest, WalletSigner};
pub use submitter::{ConfirmationPolicy, SubmissionState, TransactionSubmitter};

use skyblocks_core::TxHash;
use std::time::Duration;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger client errors. `Display` is the cause string shown to users.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(#[from] skyblocks_core::Error),

    #[error("wrong network: chain {expected} is required, {}", describe_wallet(.actual))]
    WrongNetwork { expected: u64, actual: Option<u64> },

    #[error("signature request was rejected")]
    UserRejected,

    #[error("transaction {hash:#x} was reverted by the ledger")]
    TransactionReverted { hash: TxHash },

    #[error("stopped waiting for transaction {hash:#x} after {waited:?}; it may still confirm")]
    TransactionTimeout { hash: TxHash, waited: Duration },

    #[error("a floor submission is already in progress")]
    SubmissionInProgress,

    #[error("network fetch failed: {0}")]
    NetworkFetch(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("could not decode ledger response: {0}")]
    Decode(String),

    #[error("wallet error: {0}")]
    Signer(String),

    #[error("submission was abandoned before it finished")]
    Abandoned,
}

fn describe_wallet(actual: &Option<u64>) -> String {
    match actual {
        Some(chain) => format!("wallet is on chain {chain}"),
        None => "no wallet is connected".to_string(),
    }
}

impl Error {
    /// Terminal errors that were decided before anything reached the network
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::WrongNetwork { .. } | Self::SubmissionInProgress
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::NetworkFetch(e.to_string())
    }
}
