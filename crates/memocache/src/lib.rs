//! # memocache
//!
//! Size-bounded LRU memoization for synchronous and asynchronous functions.
//!
//! ## Architecture
//! - **LruMap**: AHash index over a slab-backed recency list, O(1) get/put/evict
//! - **Keys**: function identity plus one canonical part per argument, joined by `:`
//! - **Memoizers**: [`Memoized`] for plain functions, [`AsyncMemoized`] for
//!   functions returning futures
//! - **Invalidation**: by argument list, by key substring, or everything
//!
//! ```
//! use memocache::{fn_name, MemoConfig, Memoized};
//!
//! let square = Memoized::with_config(fn_name!(square), MemoConfig::with_max_len(2), |x: i64| x * x)
//!     .unwrap();
//!
//! assert_eq!(square.call(4), 16);
//! assert_eq!(square.call(4), 16);
//! assert_eq!(square.stats().hits(), 1);
//!
//! // Results for 4 are stale now
//! assert!(square.invalidate(&4));
//! assert!(!square.invalidate(&4));
//! ```

#![warn(missing_docs)]

mod async_memo;
mod config;
mod error;
mod key;
mod lru;
mod memo;
mod stats;

pub use async_memo::AsyncMemoized;
pub use config::{MemoConfig, DEFAULT_MAX_LEN};
pub use error::{Error, Result};
pub use key::{
    resolve_key, CacheArgs, KeyBuilder, KeyPart, Named, TypeOnly, DELIMITER,
    KEYWORD_MARK,
};
pub use lru::LruMap;
pub use memo::Memoized;
pub use stats::{CacheStats, StatsSnapshot};
