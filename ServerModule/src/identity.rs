//! # Identity Registry
//!
//! Issues session-unique object ids. One generator lives in each session
//! context; nothing here is process-wide.

use log::warn;
use rand::distributions::Alphanumeric;
use rand::Rng;

use rwt_shared::ObjectId;

use crate::config::{is_valid_prefix, IdScheme, SyncConfig};

/// Generates ids that are never repeated within the owning session
#[derive(Debug)]
pub struct IdGenerator {
    scheme: IdScheme,
    fallback_prefix: String,
    suffix_len: usize,
    counter: u64,
}

impl IdGenerator {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            scheme: config.id_scheme,
            fallback_prefix: config.widget_id_prefix.clone(),
            suffix_len: config.random_suffix_len.max(1),
            counter: 0,
        }
    }

    /// Next id for `prefix`
    ///
    /// The counter is shared by all prefixes and the prefix is letters only,
    /// so two ids can only be equal if they were built from the same counter
    /// value. Invalid prefixes are replaced rather than rejected.
    pub fn new_id(&mut self, prefix: &str) -> ObjectId {
        let prefix = if is_valid_prefix(prefix) {
            prefix
        } else {
            warn!(
                "Invalid id prefix '{}', using '{}'",
                prefix, self.fallback_prefix
            );
            self.fallback_prefix.as_str()
        };
        self.counter += 1;
        let id = match self.scheme {
            IdScheme::Sequential => format!("{}{}", prefix, self.counter),
            IdScheme::Random => {
                let suffix: String = rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(self.suffix_len)
                    .map(char::from)
                    .collect();
                format!("{}{}_{}", prefix, self.counter, suffix)
            }
        };
        ObjectId::new(id)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.counter
    }
}
