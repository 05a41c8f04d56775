//! Floor records
//!
//! A floor is written once by the contract and never changes afterwards.
//! `builder` and `timestamp` are assigned by the ledger; the client only
//! chooses the message, the handle and the theme.

use crate::theme::{resolve_theme, Theme, ThemeId};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Longest accepted message, in UTF-16 code units
pub const MAX_MESSAGE_LEN: usize = 50;

/// One appended floor, as stored on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub builder: Address,
    pub message: String,
    /// Stored as typed by the builder, possibly with a leading `@`
    pub twitter_handle: String,
    /// Raw theme value. Kept verbatim even when it is not a known theme.
    pub theme_id: U256,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
}

impl Floor {
    /// Theme used to draw this floor
    pub fn theme(&self) -> &'static Theme {
        resolve_theme(self.theme_id)
    }

    /// Known theme id, or `None` if the stored value is unrecognized
    pub fn known_theme(&self) -> Option<ThemeId> {
        ThemeId::from_raw(self.theme_id)
    }

    /// Handle without its leading `@`, or `None` when no handle was given
    pub fn handle(&self) -> Option<&str> {
        normalize_handle(&self.twitter_handle)
    }

    pub fn twitter_url(&self) -> Option<String> {
        self.handle().map(|h| format!("https://twitter.com/{h}"))
    }

    /// Canonical lowercase `0x` rendering of the builder address
    pub fn builder_hex(&self) -> String {
        format!("{:#x}", self.builder)
    }

    /// Builder address shortened to `0x1234...abcd`
    pub fn short_builder(&self) -> String {
        let hex = self.builder_hex();
        format!("{}...{}", &hex[..6], &hex[hex.len() - 4..])
    }

    /// Append time as a UTC datetime
    pub fn appended_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Caller input for a new floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorRequest {
    pub message: String,
    #[serde(default)]
    pub twitter_handle: String,
    #[serde(default)]
    pub theme_id: ThemeId,
}

impl FloorRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            twitter_handle: String::new(),
            theme_id: ThemeId::Grass,
        }
    }

    pub fn twitter_handle(mut self, handle: impl Into<String>) -> Self {
        self.twitter_handle = handle.into();
        self
    }

    pub fn theme(mut self, theme: ThemeId) -> Self {
        self.theme_id = theme;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_message(&self.message)
    }
}

/// Check that a message is 1 to [`MAX_MESSAGE_LEN`] UTF-16 code units long
pub fn validate_message(message: &str) -> Result<()> {
    let len = message.encode_utf16().count();
    if len == 0 {
        return Err(Error::EmptyMessage);
    }
    if len > MAX_MESSAGE_LEN {
        return Err(Error::MessageTooLong {
            len,
            max: MAX_MESSAGE_LEN,
        });
    }
    Ok(())
}

/// Strip at most one leading `@`. An empty handle means "no handle".
pub fn normalize_handle(handle: &str) -> Option<&str> {
    let stripped = handle.strip_prefix('@').unwrap_or(handle);
    if stripped.is_empty() {
        None
    } else {
        Some(stripped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn floor(theme: u64, handle: &str) -> Floor {
        Floor {
            builder: Address::from_low_u64_be(0xAA),
            message: "hello".to_string(),
            twitter_handle: handle.to_string(),
            theme_id: U256::from(theme),
            timestamp: 1_704_067_200,
        }
    }

    #[test]
    fn test_message_bounds() {
        assert_eq!(validate_message(""), Err(Error::EmptyMessage));
        assert!(validate_message("a").is_ok());
        assert!(validate_message(&"a".repeat(50)).is_ok());
        assert_eq!(
            validate_message(&"a".repeat(51)),
            Err(Error::MessageTooLong { len: 51, max: 50 })
        );
    }

    #[test]
    fn test_message_counts_utf16_units() {
        // each emoji is a surrogate pair
        assert!(validate_message(&"😀".repeat(25)).is_ok());
        assert!(validate_message(&"😀".repeat(26)).is_err());
        // 50 chars, each a single unit despite being multi-byte UTF-8
        assert!(validate_message(&"é".repeat(50)).is_ok());
    }

    #[test]
    fn test_normalize_handle() {
        assert_eq!(normalize_handle("@alice"), Some("alice"));
        assert_eq!(normalize_handle("alice"), Some("alice"));
        assert_eq!(normalize_handle("@@alice"), Some("@alice"));
        assert_eq!(normalize_handle(""), None);
        assert_eq!(normalize_handle("@"), None);
    }

    #[test]
    fn test_unknown_theme_kept_verbatim() {
        let f = floor(9, "");
        assert_eq!(f.theme().id, ThemeId::Grass);
        assert_eq!(f.known_theme(), None);
        assert_eq!(f.theme_id, U256::from(9));

        let json = serde_json::to_value(&f).unwrap();
        let back: Floor = serde_json::from_value(json).unwrap();
        assert_eq!(back.theme_id, U256::from(9));
    }

    #[test]
    fn test_display_helpers() {
        let f = floor(2, "@builder");
        assert_eq!(f.theme().name, "Ice");
        assert_eq!(f.handle(), Some("builder"));
        assert_eq!(f.twitter_url().as_deref(), Some("https://twitter.com/builder"));
        assert_eq!(f.builder_hex(), format!("0x{}aa", "0".repeat(38)));
        assert_eq!(f.short_builder(), "0x0000...00aa");
        assert_eq!(f.appended_at().unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(floor(0, "").twitter_url().is_none());
    }

    #[test]
    fn test_request_builder() {
        let req = FloorRequest::new("gm").twitter_handle("@me").theme(ThemeId::Lava);
        assert!(req.validate().is_ok());
        assert_eq!(req.theme_id.as_raw(), U256::from(1));
        assert!(FloorRequest::new("").validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_ascii_messages_within_limit_pass(msg in "[a-zA-Z0-9 !?]{1,50}") {
            prop_assert!(validate_message(&msg).is_ok());
        }

        #[test]
        fn prop_ascii_messages_over_limit_fail(msg in "[a-zA-Z0-9 !?]{51,120}") {
            let rejected = matches!(validate_message(&msg), Err(Error::MessageTooLong { .. }));
            prop_assert!(rejected);
        }
    }
}
