//! # SkyBlocks Core
//!
//! Pure domain model for the SkyBlocks tower. A tower is an append-only list
//! of floors kept by a contract; this crate only knows what a floor *is*.
//!
//! - **Floor**: one immutable append record, as read from the ledger
//! - **Theme**: closed table of block materials, with a GRASS fallback
//! - **Units**: lossless conversion between smallest-unit integers and
//!   decimal display strings
//!
//! No I/O happens here. See `skyblocks-ledger` for the chain side.

pub mod floor;
pub mod theme;
pub mod units;

pub use ethereum_types::{Address, H256, U256};
pub use floor::{normalize_handle, validate_message, Floor, FloorRequest, MAX_MESSAGE_LEN};
pub use theme::{resolve_theme, Theme, ThemeId};
pub use units::{format_ether, format_units, parse_ether, parse_units, ETHER_DECIMALS};

/// Transaction handle returned by a wallet once a call reaches the network
pub type TxHash = H256;

/// Result type for domain operations
pub type Result<T> = std::result::Result<T, Error>;

/// Domain-level errors. The message variants are the client's validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("message is required")]
    EmptyMessage,

    #[error("message is {len} characters long, the limit is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl Error {
    /// True for errors caused by caller input rather than amounts/config
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyMessage | Self::MessageTooLong { .. })
    }
}
