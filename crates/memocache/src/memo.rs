//! Synchronous memoizer and the store shared with the async variant

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::{MemoConfig, DEFAULT_CAPACITY};
use crate::error::Result;
use crate::key::{self, CacheArgs};
use crate::lru::LruMap;
use crate::stats::CacheStats;

/// Memoized results of one function, keyed by resolved call keys
pub(crate) struct MemoStore<V> {
    name: Cow<'static, str>,
    config: MemoConfig,
    map: Mutex<LruMap<String, V>>,
    stats: CacheStats,
}

impl<V: Clone> MemoStore<V> {
    pub(crate) fn new(name: Cow<'static, str>) -> Self {
        Self {
            name,
            config: MemoConfig::default(),
            map: Mutex::new(LruMap::with_capacity(DEFAULT_CAPACITY)),
            stats: CacheStats::new(),
        }
    }

    pub(crate) fn with_config(name: Cow<'static, str>, config: MemoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            map: Mutex::new(LruMap::new(config.max_len)?),
            name,
            config,
            stats: CacheStats::new(),
        })
    }

    pub(crate) fn key<A: CacheArgs + ?Sized>(&self, args: &A) -> String {
        key::resolve_key(&self.name, args, self.config.ignore_kwargs)
    }

    pub(crate) fn lookup(&self, key: &String) -> Option<V> {
        let found = self.map.lock().get(key).cloned();
        if found.is_some() {
            trace!("{}: hit {}", self.name, key);
            self.stats.record_hit();
        } else {
            trace!("{}: miss {}", self.name, key);
            self.stats.record_miss();
        }
        found
    }

    pub(crate) fn insert(&self, key: String, value: V) {
        let evicted = self.map.lock().put(key, value);
        self.stats.record_insert();
        if let Some((old_key, _)) = evicted {
            debug!("{}: evicted {}", self.name, old_key);
            self.stats.record_eviction();
        }
    }

    pub(crate) fn invalidate<A: CacheArgs + ?Sized>(&self, args: &A) -> bool {
        if key::is_bare(args) {
            return self.invalidate_all();
        }

        let key = self.key(args);
        let removed = self.map.lock().remove(&key).is_some();
        if removed {
            debug!("{}: invalidated {}", self.name, key);
            self.stats.record_invalidations(1);
        }
        removed
    }

    pub(crate) fn invalidate_all(&self) -> bool {
        let removed = {
            let mut map = self.map.lock();
            let len = map.len();
            map.clear();
            len
        };
        debug!("{}: cleared {} entries", self.name, removed);
        self.stats.record_invalidations(removed as u64);
        true
    }

    pub(crate) fn invalidate_containing(&self, needle: &str) -> usize {
        let removed = {
            let mut map = self.map.lock();
            let doomed: Vec<String> = map
                .keys()
                .into_iter()
                .filter(|key| key.contains(needle))
                .collect();
            for key in &doomed {
                map.remove(key);
            }
            doomed.len()
        };
        if removed > 0 {
            debug!("{}: invalidated {} entries containing {:?}", self.name, removed, needle);
            self.stats.record_invalidations(removed as u64);
        }
        removed
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn config(&self) -> &MemoConfig {
        &self.config
    }

    pub(crate) fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub(crate) fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.map.lock().keys()
    }
}

impl<V> fmt::Debug for MemoStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoStore")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("len", &self.map.lock().len())
            .finish()
    }
}

/// Methods shared by [`Memoized`] and [`AsyncMemoized`](crate::AsyncMemoized)
macro_rules! memo_accessors {
    () => {
        /// Drop the entry for `args`
        ///
        /// Returns whether an entry was removed. An argument list with no parts
        /// at all, such as `()`, clears the whole cache and returns `true`.
        pub fn invalidate(&self, args: &A) -> bool {
            self.store.invalidate(args)
        }

        /// Drop every entry
        pub fn invalidate_all(&self) -> bool {
            self.store.invalidate_all()
        }

        /// Drop every entry whose key contains `needle` as a literal substring
        ///
        /// Scans the whole key set. Returns how many entries were removed.
        pub fn invalidate_containing(&self, needle: &str) -> usize {
            self.store.invalidate_containing(needle)
        }

        /// The key a call with `args` resolves to
        pub fn get_key(&self, args: &A) -> String {
            self.store.key(args)
        }

        /// Function identity prefixed to every key
        pub fn name(&self) -> &str {
            self.store.name()
        }

        /// Active configuration
        pub fn config(&self) -> &$crate::MemoConfig {
            self.store.config()
        }

        /// Hit/miss counters
        pub fn stats(&self) -> &$crate::CacheStats {
            self.store.stats()
        }

        /// Number of memoized results
        pub fn len(&self) -> usize {
            self.store.len()
        }

        /// Whether nothing is memoized
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Maximum number of memoized results
        pub fn capacity(&self) -> usize {
            self.store.config().max_len
        }

        /// Snapshot of keys from least to most recently used
        pub fn keys(&self) -> Vec<String> {
            self.store.keys()
        }
    };
}

pub(crate) use memo_accessors;

/// A synchronous function wrapped in an LRU memoization cache
///
/// ```
/// use memocache::Memoized;
///
/// let double = Memoized::new("math::double", |x: u64| x * 2);
/// assert_eq!(double.call(21), 42);
/// assert_eq!(double.stats().misses(), 1);
/// assert_eq!(double.call(21), 42);
/// assert_eq!(double.stats().hits(), 1);
/// ```
pub struct Memoized<A, V, F> {
    store: MemoStore<V>,
    func: F,
    _args: PhantomData<fn(A)>,
}

impl<A, V, F> Memoized<A, V, F>
where
    A: CacheArgs,
    V: Clone,
{
    /// Wrap `func` with the default configuration
    ///
    /// # Arguments
    /// * `name` - Function identity prefixed to every key, usually from [`fn_name!`](crate::fn_name)
    /// * `func` - The function whose results are memoized
    ///
    /// # Returns
    /// A memoizer holding up to 128 results, with keyword arguments included in the key
    pub fn new(name: impl Into<Cow<'static, str>>, func: F) -> Self {
        Self {
            store: MemoStore::new(name.into()),
            func,
            _args: PhantomData,
        }
    }

    /// Wrap `func` with `config`
    ///
    /// # Arguments
    /// * `name` - Function identity prefixed to every key
    /// * `config` - Capacity and keyword handling
    /// * `func` - The function whose results are memoized
    ///
    /// # Returns
    /// The memoizer, or [`Error::InvalidConfiguration`](crate::Error) when
    /// `config.max_len` is zero.
    pub fn with_config(
        name: impl Into<Cow<'static, str>>,
        config: MemoConfig,
        func: F,
    ) -> Result<Self> {
        Ok(Self {
            store: MemoStore::with_config(name.into(), config)?,
            func,
            _args: PhantomData,
        })
    }

    /// Return the memoized result for `args`, running the function on a miss
    pub fn call(&self, args: A) -> V
    where
        F: Fn(A) -> V,
    {
        let key = self.store.key(&args);
        if let Some(value) = self.store.lookup(&key) {
            return value;
        }

        let value = (self.func)(args);
        self.store.insert(key, value.clone());
        value
    }

    /// Like [`call`](Self::call) for fallible functions
    ///
    /// Only `Ok` results are memoized; an `Err` is returned unchanged and
    /// leaves the cache untouched.
    pub fn try_call<E>(&self, args: A) -> std::result::Result<V, E>
    where
        F: Fn(A) -> std::result::Result<V, E>,
    {
        let key = self.store.key(&args);
        if let Some(value) = self.store.lookup(&key) {
            return Ok(value);
        }

        let value = (self.func)(args)?;
        self.store.insert(key, value.clone());
        Ok(value)
    }

    memo_accessors!();
}

impl<A, V, F> fmt::Debug for Memoized<A, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
