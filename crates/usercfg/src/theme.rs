//! Rendering themes a user can pick

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, SettingsError};

/// 8-bit RGB colour
pub type Rgb = (u8, u8, u8);

/// Colour scheme used when drawing charts for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark background, light text
    Dark,
    /// Light background, dark text
    #[default]
    Light,
}

impl Theme {
    /// Every theme, in display order
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Id persisted in the theme column
    pub fn id(self) -> i16 {
        match self {
            Theme::Dark => 0,
            Theme::Light => 1,
        }
    }

    /// Theme for a persisted column value; NULL means the default
    pub fn from_id(id: Option<i16>) -> Result<Self> {
        match id {
            None => Ok(Theme::default()),
            Some(0) => Ok(Theme::Dark),
            Some(1) => Ok(Theme::Light),
            Some(other) => Err(SettingsError::UnknownThemeId(other)),
        }
    }

    /// Text colour
    pub fn primary(self) -> Rgb {
        match self {
            Theme::Dark => (255, 255, 255),
            Theme::Light => (0, 0, 0),
        }
    }

    /// Secondary text colour
    pub fn secondary(self) -> Rgb {
        match self {
            Theme::Dark => (185, 185, 185),
            Theme::Light => (64, 64, 64),
        }
    }

    /// Canvas colour
    pub fn background(self) -> Rgb {
        match self {
            Theme::Dark => (54, 57, 63),
            Theme::Light => (255, 255, 255),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Theme {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.name() == wanted)
            .ok_or_else(|| SettingsError::UnknownTheme(s.to_string()))
    }
}
