//! Theme catalog and theme selection.
//!
//! A predefined theme is submitted by its id. The `custom` entry of the
//! catalog stands for free text typed by the player.

use serde::{Deserialize, Serialize};

use crate::error::ThemeError;

/// Catalog id of the free-text entry.
pub const CUSTOM_THEME_ID: &str = "custom";

/// One entry of the theme catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredefinedTheme {
    /// Id sent to the generation service.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// One-line pitch.
    pub description: &'static str,
    /// Icon shown on the theme card.
    pub emoji: &'static str,
}

impl PredefinedTheme {
    /// Whether this entry asks for free text instead of naming a theme.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_THEME_ID
    }
}

/// The theme catalog, in display order. The custom entry comes last.
pub const PREDEFINED_THEMES: &[PredefinedTheme] = &[
    PredefinedTheme {
        id: "fantasy",
        name: "Fantasy Adventure",
        description: "Dragons, magic, and mystical lands",
        emoji: "🐉",
    },
    PredefinedTheme {
        id: "scifi",
        name: "Sci-Fi Odyssey",
        description: "Space exploration and futuristic technology",
        emoji: "🚀",
    },
    PredefinedTheme {
        id: "mystery",
        name: "Mystery Detective",
        description: "Solve crimes and uncover secrets",
        emoji: "🔍",
    },
    PredefinedTheme {
        id: "horror",
        name: "Horror Survival",
        description: "Face your darkest fears",
        emoji: "👻",
    },
    PredefinedTheme {
        id: "adventure",
        name: "Action Adventure",
        description: "Treasure hunts and daring escapes",
        emoji: "⚔️",
    },
    PredefinedTheme {
        id: CUSTOM_THEME_ID,
        name: "Custom Theme",
        description: "Create your own adventure",
        emoji: "✨",
    },
];

/// Looks up a catalog entry by id.
#[must_use]
pub fn find_theme(id: &str) -> Option<&'static PredefinedTheme> {
    PREDEFINED_THEMES.iter().find(|theme| theme.id == id)
}

/// A theme chosen by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Theme {
    /// A catalog entry, by id.
    Predefined(String),
    /// Free text.
    Custom(String),
}

impl Theme {
    /// Builds a theme from a catalog selection. Selecting the custom entry
    /// takes `custom_text`; any other id ignores it.
    #[must_use]
    pub fn from_selection(id: &str, custom_text: &str) -> Self {
        if id == CUSTOM_THEME_ID {
            Self::Custom(custom_text.to_owned())
        } else {
            Self::Predefined(id.to_owned())
        }
    }

    /// The string submitted to the generation service.
    ///
    /// # Errors
    ///
    /// Returns `ThemeError::UnknownTheme` for an id outside the catalog (the
    /// custom entry included) and `ThemeError::EmptyCustomTheme` for blank
    /// free text.
    pub fn resolve(&self) -> Result<String, ThemeError> {
        match self {
            Self::Predefined(id) => find_theme(id)
                .filter(|theme| !theme.is_custom())
                .map(|theme| theme.id.to_owned())
                .ok_or_else(|| ThemeError::UnknownTheme(id.clone())),
            Self::Custom(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Err(ThemeError::EmptyCustomTheme)
                } else {
                    Ok(text.to_owned())
                }
            }
        }
    }
}
