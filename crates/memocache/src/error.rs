//! Error types for memocache

use thiserror::Error;

/// Result type alias for memocache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a cache
///
/// Lookups never fail: a miss is reported as `None` by [`LruMap`](crate::LruMap)
/// and turned into a call of the wrapped function by the memoizers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Capacity must be a positive integer
    #[error("invalid configuration: max_len must be greater than 0 (got {max_len})")]
    InvalidConfiguration {
        /// The rejected capacity
        max_len: usize,
    },
}
