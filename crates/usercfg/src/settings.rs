//! Settings service: memoized reads, invalidating writes

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use memocache::{fn_name, AsyncMemoized, CacheStats, MemoConfig, DELIMITER};
use tracing::debug;

use crate::error::Result;
use crate::repository::{ConfigRepository, UserConfig};
use crate::theme::Theme;

type FetchFn = Box<dyn Fn(u64) -> BoxFuture<'static, Result<Option<UserConfig>>> + Send + Sync>;

/// Per-user settings backed by a [`ConfigRepository`]
///
/// Reads go through a memoization cache keyed by user id. Every write
/// invalidates that user's entry before returning, so a following read sees
/// the new value.
pub struct Settings<R> {
    repo: Arc<R>,
    fetch: AsyncMemoized<u64, Option<UserConfig>, FetchFn>,
}

impl<R> Settings<R>
where
    R: ConfigRepository + 'static,
{
    /// Build the service over `repo`
    pub fn new(repo: Arc<R>, config: MemoConfig) -> Result<Self> {
        let source = Arc::clone(&repo);
        let fetch: FetchFn = Box::new(move |user_id: u64| {
            let repo = Arc::clone(&source);
            async move {
                let record = repo.fetch_config(user_id).await?;
                record.map(UserConfig::from_record).transpose()
            }
            .boxed()
        });

        Ok(Self {
            repo,
            fetch: AsyncMemoized::with_config(fn_name!(fetch_config), config, fetch)?,
        })
    }

    /// Stored configuration for `user_id`, `None` if they never saved one
    pub async fn fetch_config(&self, user_id: u64) -> Result<Option<UserConfig>> {
        self.fetch.try_call(user_id).await
    }

    /// Theme for `user_id`, falling back to the default
    pub async fn theme_for(&self, user_id: u64) -> Result<Theme> {
        Ok(self
            .fetch_config(user_id)
            .await?
            .map(|config| config.theme)
            .unwrap_or_default())
    }

    /// Persist `theme` for `user_id`
    pub async fn set_theme(&self, user_id: u64, theme: Theme) -> Result<UserConfig> {
        self.repo.upsert_theme(user_id, Some(theme.id())).await?;
        self.fetch.invalidate(&user_id);
        debug!("user {} theme set to {}", user_id, theme);

        Ok(UserConfig { id: user_id, theme })
    }

    /// Go back to the default theme for `user_id`
    pub async fn reset_theme(&self, user_id: u64) -> Result<()> {
        self.repo.upsert_theme(user_id, None).await?;
        self.fetch.invalidate(&user_id);
        debug!("user {} theme reset", user_id);
        Ok(())
    }

    /// Drop everything cached for `user_id`
    ///
    /// Removes the user's own entry and any key extending it, without
    /// touching users whose id merely shares a prefix (forgetting `1`
    /// leaves `10` cached). Returns how many entries were removed.
    pub fn forget_user(&self, user_id: u64) -> usize {
        let key = self.cache_key(user_id);
        let exact = usize::from(self.fetch.invalidate(&user_id));
        let extended = self
            .fetch
            .invalidate_containing(&format!("{}{}", key, DELIMITER));
        debug!("forgot user {} ({} entries)", user_id, exact + extended);
        exact + extended
    }

    /// Drop every cached entry whose key contains `needle`
    pub fn forget_matching(&self, needle: &str) -> usize {
        self.fetch.invalidate_containing(needle)
    }

    /// Drop every cached entry
    pub fn flush(&self) {
        self.fetch.invalidate_all();
    }

    /// Keys currently memoized, least recently used first
    pub fn cached_keys(&self) -> Vec<String> {
        self.fetch.keys()
    }

    /// Cache key for `user_id`
    pub fn cache_key(&self, user_id: u64) -> String {
        self.fetch.get_key(&user_id)
    }

    /// Read cache counters
    pub fn stats(&self) -> &CacheStats {
        self.fetch.stats()
    }

    /// Underlying repository
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SettingsError;
    use crate::repository::{ConfigRecord, MemoryRepository};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts reads and can be told to fail
    #[derive(Default)]
    struct CountingRepository {
        inner: MemoryRepository,
        reads: AtomicUsize,
        down: AtomicBool,
    }

    #[async_trait]
    impl ConfigRepository for CountingRepository {
        async fn fetch_config(&self, user_id: u64) -> Result<Option<ConfigRecord>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(SettingsError::Storage("connection refused".to_string()));
            }
            self.inner.fetch_config(user_id).await
        }

        async fn upsert_theme(&self, user_id: u64, theme: Option<i16>) -> Result<()> {
            self.inner.upsert_theme(user_id, theme).await
        }
    }

    fn settings() -> (Arc<CountingRepository>, Settings<CountingRepository>) {
        let repo = Arc::new(CountingRepository::default());
        let settings = Settings::new(Arc::clone(&repo), MemoConfig::default()).unwrap();
        (repo, settings)
    }

    #[tokio::test]
    async fn test_reads_are_memoized() {
        let (repo, settings) = settings();

        assert_eq!(settings.fetch_config(42).await.unwrap(), None);
        assert_eq!(settings.theme_for(42).await.unwrap(), Theme::Light);
        assert_eq!(repo.reads.load(Ordering::SeqCst), 1);
        assert_eq!(settings.stats().hits(), 1);
    }

    #[tokio::test]
    async fn test_write_invalidates() {
        let (repo, settings) = settings();

        assert_eq!(settings.theme_for(7).await.unwrap(), Theme::Light);
        settings.set_theme(7, Theme::Dark).await.unwrap();
        assert_eq!(settings.theme_for(7).await.unwrap(), Theme::Dark);
        assert_eq!(repo.reads.load(Ordering::SeqCst), 2);

        settings.reset_theme(7).await.unwrap();
        assert_eq!(
            settings.fetch_config(7).await.unwrap(),
            Some(UserConfig { id: 7, theme: Theme::Light })
        );
        assert_eq!(repo.reads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_storage_errors_not_cached() {
        let (repo, settings) = settings();

        repo.down.store(true, Ordering::SeqCst);
        assert!(matches!(
            settings.fetch_config(1).await,
            Err(SettingsError::Storage(_))
        ));
        assert!(settings.cached_keys().is_empty());

        repo.down.store(false, Ordering::SeqCst);
        assert_eq!(settings.fetch_config(1).await.unwrap(), None);
        assert_eq!(settings.cached_keys(), vec![settings.cache_key(1)]);
    }

    #[tokio::test]
    async fn test_keys_and_bulk_invalidation() {
        let (_, settings) = settings();

        for id in [1, 2, 10] {
            settings.fetch_config(id).await.unwrap();
        }

        let key = settings.cache_key(10);
        assert!(key.starts_with("usercfg::settings::fetch_config:"));
        assert!(key.ends_with(":10"));

        assert_eq!(settings.forget_matching("1"), 2);
        assert_eq!(settings.cached_keys(), vec![settings.cache_key(2)]);

        settings.flush();
        assert!(settings.cached_keys().is_empty());
    }

    #[tokio::test]
    async fn test_forget_user_spares_shared_prefixes() {
        let (repo, settings) = settings();

        for id in [1, 2, 10] {
            settings.fetch_config(id).await.unwrap();
        }

        assert_eq!(settings.forget_user(1), 1);
        assert_eq!(
            settings.cached_keys(),
            vec![settings.cache_key(2), settings.cache_key(10)]
        );
        assert_eq!(settings.forget_user(1), 0);

        // Only the forgotten user goes back to the repository
        settings.fetch_config(10).await.unwrap();
        settings.fetch_config(1).await.unwrap();
        assert_eq!(repo.reads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_invalid_capacity() {
        let repo = Arc::new(MemoryRepository::new());
        let result = Settings::new(repo, MemoConfig::with_max_len(0));
        assert!(matches!(
            result,
            Err(SettingsError::Cache(memocache::Error::InvalidConfiguration { max_len: 0 }))
        ));
    }
}
