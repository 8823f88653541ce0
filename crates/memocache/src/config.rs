//! Memoizer configuration

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of memoized results per function
pub const DEFAULT_MAX_LEN: usize = 128;

pub(crate) const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_MAX_LEN) {
    Some(capacity) => capacity,
    None => panic!("DEFAULT_MAX_LEN must be non-zero"),
};

/// Settings for one memoized function
///
/// Deserializes from any serde format; missing fields take their defaults:
///
/// ```
/// let config: memocache::MemoConfig = serde_json::from_str(r#"{"max_len": 16}"#).unwrap();
/// assert_eq!(config.max_len, 16);
/// assert!(!config.ignore_kwargs);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// Maximum number of memoized results
    pub max_len: usize,
    /// Leave keyword arguments out of the key
    pub ignore_kwargs: bool,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            ignore_kwargs: false,
        }
    }
}

impl MemoConfig {
    /// Config with the given capacity and keyword arguments keyed
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            max_len,
            ..Self::default()
        }
    }

    /// Set whether keyword arguments are left out of the key
    pub fn ignore_kwargs(mut self, ignore: bool) -> Self {
        self.ignore_kwargs = ignore;
        self
    }

    /// Reject a zero capacity
    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 {
            return Err(Error::InvalidConfiguration {
                max_len: self.max_len,
            });
        }
        Ok(())
    }
}
