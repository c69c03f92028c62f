//! User display settings.
//!
//! Passed explicitly to whatever renders data; the store and analytics never
//! look at it.

use serde::{Deserialize, Serialize};

/// How deck lists are laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    #[default]
    Default,
    List,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,

    #[serde(default)]
    pub display_style: DisplayStyle,
}

impl Settings {
    /// Flip dark mode, returning the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }
}
