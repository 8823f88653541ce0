//! Error types for usercfg

use thiserror::Error;

/// Result type alias for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors raised by the settings layer
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Cache could not be built
    #[error(transparent)]
    Cache(#[from] memocache::Error),

    /// Theme name did not match any known theme
    #[error("invalid theme provided: {0:?}")]
    UnknownTheme(String),

    /// Stored theme id has no theme
    #[error("stored theme id {0} is not a known theme")]
    UnknownThemeId(i16),

    /// Backend failure
    #[error("storage error: {0}")]
    Storage(String),
}
