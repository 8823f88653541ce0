//! Storage seam for user configuration rows

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::Result;
use crate::theme::Theme;

/// One row of the `user_config` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRecord {
    /// User id
    pub id: u64,
    /// Theme id, NULL for the default theme
    pub theme: Option<i16>,
}

/// A user's resolved configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserConfig {
    /// User id
    pub id: u64,
    /// Chosen theme
    pub theme: Theme,
}

impl UserConfig {
    /// Resolve a stored row
    pub fn from_record(record: ConfigRecord) -> Result<Self> {
        Ok(Self {
            id: record.id,
            theme: Theme::from_id(record.theme)?,
        })
    }
}

/// Backend holding user configuration rows
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Row for `user_id`, if the user ever saved a setting
    async fn fetch_config(&self, user_id: u64) -> Result<Option<ConfigRecord>>;

    /// Insert or update the theme column for `user_id`
    async fn upsert_theme(&self, user_id: u64, theme: Option<i16>) -> Result<()>;
}

/// In-process backend
#[derive(Debug, Default)]
pub struct MemoryRepository {
    rows: RwLock<HashMap<u64, ConfigRecord>>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether no row is stored
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

#[async_trait]
impl ConfigRepository for MemoryRepository {
    async fn fetch_config(&self, user_id: u64) -> Result<Option<ConfigRecord>> {
        Ok(self.rows.read().get(&user_id).copied())
    }

    async fn upsert_theme(&self, user_id: u64, theme: Option<i16>) -> Result<()> {
        self.rows
            .write()
            .insert(user_id, ConfigRecord { id: user_id, theme });
        Ok(())
    }
}
