//! # usercfg
//!
//! Per-user settings for chart rendering, read through a [`memocache`]
//! memoizer and invalidated on every write.

#![warn(missing_docs)]

mod error;
mod repository;
mod settings;
mod theme;

pub use error::{Result, SettingsError};
pub use repository::{ConfigRecord, ConfigRepository, MemoryRepository, UserConfig};
pub use settings::Settings;
pub use theme::{Rgb, Theme};
