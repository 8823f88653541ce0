//! Asynchronous memoizer
//!
//! The cache lookup happens when `call` is invoked; the returned future
//! resolves immediately on a hit. On a miss the wrapped function is invoked
//! right away and its future is driven by the caller, and the result is stored
//! when that future completes. A future dropped before completion stores
//! nothing.
//!
//! Concurrent misses for the same key are not merged: each runs the wrapped
//! function and the last one to finish overwrites the entry.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use futures::future::{self, Either};

use crate::config::MemoConfig;
use crate::error::Result;
use crate::key::CacheArgs;
use crate::memo::{memo_accessors, MemoStore};

/// An async function wrapped in an LRU memoization cache
///
/// ```
/// use memocache::AsyncMemoized;
///
/// # futures::executor::block_on(async {
/// let fetch = AsyncMemoized::new("users::fetch", |id: u64| async move { format!("user-{}", id) });
/// assert_eq!(fetch.call(7).await, "user-7");
/// assert_eq!(fetch.call(7).await, "user-7");
/// assert_eq!(fetch.stats().hits(), 1);
/// # });
/// ```
pub struct AsyncMemoized<A, V, F> {
    store: MemoStore<V>,
    func: F,
    _args: PhantomData<fn(A)>,
}

impl<A, V, F> AsyncMemoized<A, V, F>
where
    A: CacheArgs,
    V: Clone,
{
    /// Wrap `func` with the default configuration
    ///
    /// # Arguments
    /// * `name` - Function identity prefixed to every key, usually from [`fn_name!`](crate::fn_name)
    /// * `func` - The async function whose results are memoized
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
    /// * `func` - The async function whose results are memoized
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

    /// Memoized result for `args`
    ///
    /// Always returns a future, ready on a hit.
    pub fn call<'a, Fut>(&'a self, args: A) -> impl Future<Output = V> + 'a
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = V> + 'a,
    {
        let key = self.store.key(&args);
        match self.store.lookup(&key) {
            Some(value) => Either::Left(future::ready(value)),
            None => {
                let pending = (self.func)(args);
                Either::Right(async move {
                    let value = pending.await;
                    self.store.insert(key, value.clone());
                    value
                })
            }
        }
    }

    /// Like [`call`](Self::call) for fallible functions
    ///
    /// Only `Ok` results are memoized; an `Err` is returned unchanged and
    /// leaves the cache untouched.
    pub fn try_call<'a, Fut, E>(
        &'a self,
        args: A,
    ) -> impl Future<Output = std::result::Result<V, E>> + 'a
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<V, E>> + 'a,
        E: 'a,
    {
        let key = self.store.key(&args);
        match self.store.lookup(&key) {
            Some(value) => Either::Left(future::ready(Ok(value))),
            None => {
                let pending = (self.func)(args);
                Either::Right(async move {
                    let value = pending.await?;
                    self.store.insert(key, value.clone());
                    Ok(value)
                })
            }
        }
    }

    memo_accessors!();
}

impl<A, V, F> fmt::Debug for AsyncMemoized<A, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncMemoized")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
