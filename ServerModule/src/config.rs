//! # Synchronization Configuration
//!
//! Per-session settings of the protocol core. Every field has a default, so a
//! partial JSON document is enough to override one setting.

use serde::{Deserialize, Serialize};
use std::path::Path;

use rwt_shared::constants;

use crate::error::{SyncError, SyncResult};

/// How the identity registry builds ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// `prefix + counter`, e.g. `w1`, `w2`
    Sequential,
    /// `prefix + counter + "_" + random suffix`
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub id_scheme: IdScheme,

    /// Prefix used for widget ids and as fallback for invalid prefixes
    pub widget_id_prefix: String,

    /// Length of the random id suffix (random scheme only)
    pub random_suffix_len: usize,

    /// Reject inbound messages whose request counter is out of sequence
    pub validate_request_counter: bool,

    /// Check ordering invariants of every outbound message before it is flushed
    pub verify_message_order: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            id_scheme: IdScheme::Sequential,
            widget_id_prefix: constants::ids::WIDGET_PREFIX.to_string(),
            random_suffix_len: 8,
            validate_request_counter: true,
            verify_message_order: true,
        }
    }
}

impl SyncConfig {
    pub fn from_json_str(text: &str) -> SyncResult<Self> {
        let config: SyncConfig = serde_json::from_str(text)
            .map_err(|e| SyncError::Config(format!("failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if !is_valid_prefix(&self.widget_id_prefix) {
            return Err(SyncError::Config(format!(
                "widget_id_prefix '{}' must be non-empty ASCII letters",
                self.widget_id_prefix
            )));
        }
        if self.id_scheme == IdScheme::Random && self.random_suffix_len == 0 {
            return Err(SyncError::Config(
                "random_suffix_len must be positive for the random id scheme".to_string(),
            ));
        }
        Ok(())
    }
}

/// Prefixes are letters only, so `prefix + digits` parses back uniquely
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_alphabetic())
}
