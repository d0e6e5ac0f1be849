//! Notifier configuration: the resolved [`Options`] value object, the partial
//! [`OptionsPatch`] overlay, and loading/saving of preset patches as a
//! `toastling.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use toastling::config;
//!
//! // Load the user preset (if any) and tweak it
//! let preset = config::load()
//!     .unwrap_or_default()
//!     .with_message("Upload complete")
//!     .with_duration_ms(1500);
//!
//! // Persist the tweaked preset for the next run
//! config::save(&preset).expect("Failed to save preset");
//! ```

pub mod defaults;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use defaults::{DEFAULT_DURATION_MS, DEFAULT_MESSAGE, DEFAULT_POSITION};

const PRESET_FILE: &str = "toastling.toml";
const APP_NAME: &str = "toastling";

/// Resolved notification configuration.
///
/// Seeded from defaults at construction time and overridden by patches;
/// immutable between merges. `styles` is replaced as a whole map on merge,
/// never deep-merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Content shown in the message element.
    pub message: String,
    /// Time until auto-removal. Ignored when `infinite` is set.
    pub duration: Duration,
    /// Suppresses auto-removal entirely.
    pub infinite: bool,
    /// Placement classifier, applied verbatim as class tokens.
    pub position: String,
    /// Interpret `message` as a markup fragment instead of literal text.
    ///
    /// Markup mode inserts caller-supplied content as structured markup
    /// without sanitization. Callers must not pass untrusted content here.
    pub render_html: bool,
    /// Adds the `error` display classifier to the root element.
    pub is_error: bool,
    /// Inline style overrides for the root element.
    pub styles: BTreeMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            message: DEFAULT_MESSAGE.to_string(),
            duration: Duration::from_millis(DEFAULT_DURATION_MS),
            infinite: false,
            position: DEFAULT_POSITION.to_string(),
            render_html: false,
            is_error: false,
            styles: BTreeMap::new(),
        }
    }
}

impl Options {
    /// Builds options by applying `patch` over the defaults.
    #[must_use]
    pub fn from_patch(patch: &OptionsPatch) -> Self {
        let mut options = Self::default();
        options.apply(patch);
        options
    }

    /// Shallow-merges `patch` into these options.
    ///
    /// Present fields overwrite, absent fields are preserved. One level deep
    /// only: a present `styles` map replaces the previous map wholesale.
    pub fn apply(&mut self, patch: &OptionsPatch) {
        if let Some(message) = &patch.message {
            self.message = message.clone();
        }
        if let Some(ms) = patch.duration_ms {
            self.duration = Duration::from_millis(ms);
        }
        if let Some(infinite) = patch.infinite {
            self.infinite = infinite;
        }
        if let Some(position) = &patch.position {
            self.position = position.clone();
        }
        if let Some(render_html) = patch.render_html {
            self.render_html = render_html;
        }
        if let Some(is_error) = patch.is_error {
            self.is_error = is_error;
        }
        if let Some(styles) = &patch.styles {
            self.styles = styles.clone();
        }
    }
}

/// Partial configuration overlay.
///
/// Every field is optional; absent fields leave the corresponding option
/// untouched when merged. This is also the on-disk preset format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsPatch {
    /// Content shown in the message element.
    pub message: Option<String>,
    /// Time until auto-removal, in milliseconds.
    pub duration_ms: Option<u64>,
    /// Suppresses auto-removal entirely.
    pub infinite: Option<bool>,
    /// Placement classifier.
    pub position: Option<String>,
    /// Interpret `message` as a markup fragment.
    pub render_html: Option<bool>,
    /// Adds the `error` display classifier.
    pub is_error: Option<bool>,
    /// Inline style overrides, replacing the whole map on merge.
    pub styles: Option<BTreeMap<String, String>>,
}

impl OptionsPatch {
    /// Creates an empty patch that changes nothing when merged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message content.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the auto-removal duration in milliseconds.
    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Enables or disables infinite display.
    #[must_use]
    pub fn with_infinite(mut self, infinite: bool) -> Self {
        self.infinite = Some(infinite);
        self
    }

    /// Sets the position classifier.
    #[must_use]
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Enables or disables markup interpretation of the message.
    #[must_use]
    pub fn with_render_html(mut self, render_html: bool) -> Self {
        self.render_html = Some(render_html);
        self
    }

    /// Enables or disables the `error` display classifier.
    #[must_use]
    pub fn with_is_error(mut self, is_error: bool) -> Self {
        self.is_error = Some(is_error);
        self
    }

    /// Adds a single inline style property, accumulating with previous
    /// `with_style` calls on this patch.
    #[must_use]
    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles
            .get_or_insert_with(BTreeMap::new)
            .insert(property.into(), value.into());
        self
    }

    /// Sets the whole inline style map at once.
    #[must_use]
    pub fn with_styles(mut self, styles: BTreeMap<String, String>) -> Self {
        self.styles = Some(styles);
        self
    }
}

/// Platform location of the user preset, `None` when the platform has no
/// config directory.
pub fn default_preset_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(PRESET_FILE);
        path
    })
}

/// Loads the user preset from the platform config directory.
///
/// Returns an empty patch if no preset file exists.
pub fn load() -> Result<OptionsPatch> {
    if let Some(path) = default_preset_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(OptionsPatch::default())
}

/// Saves `patch` as the user preset in the platform config directory.
pub fn save(patch: &OptionsPatch) -> Result<()> {
    if let Some(path) = default_preset_path() {
        return save_to_path(patch, &path);
    }
    Ok(())
}

/// Loads a preset patch from an explicit path.
///
/// I/O errors propagate; unparseable TOML yields an empty patch.
pub fn load_from_path(path: &Path) -> Result<OptionsPatch> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_default())
}

/// Saves a preset patch to an explicit path, creating parent directories.
pub fn save_to_path(patch: &OptionsPatch, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(patch)?;
    fs::write(path, content)?;
    Ok(())
}
