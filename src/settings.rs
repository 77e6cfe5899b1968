//! TOML settings for base directories, rendering options and a default view
//!
//! ```toml
//! base_directories = ["templates", "/srv/shared/templates"]
//! verbose = false
//! escape_html = true
//! diagnostic_class = "volta"
//! inline_diagnostics = true
//! max_include_depth = 16
//!
//! [view]
//! layout = "layout.html"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::renderer::RenderConfig;
use crate::template::{TemplateError, ViewSpec};

/// Errors that can occur when loading settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse settings TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Loaded settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Base directories in search order
    pub base_directories: Vec<PathBuf>,
    pub render: RenderConfig,
    pub view: Option<ViewSpec>,
}

/// TOML structure for deserializing settings
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSettings {
    #[serde(default)]
    base_directories: Vec<PathBuf>,
    verbose: Option<bool>,
    escape_html: Option<bool>,
    diagnostic_class: Option<String>,
    inline_diagnostics: Option<bool>,
    max_include_depth: Option<usize>,
    view: Option<ViewSpec>,
}

impl Settings {
    /// Load settings from a TOML file
    ///
    /// Relative base directories are taken relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_str(&content)?;
        if let Some(dir) = path.parent() {
            for base in &mut settings.base_directories {
                if base.is_relative() {
                    *base = dir.join(&*base);
                }
            }
        }
        Ok(settings)
    }

    /// Load settings from a TOML string; relative directories stay as written
    pub fn from_str(content: &str) -> Result<Self, SettingsError> {
        let parsed: TomlSettings = toml::from_str(content)?;

        let defaults = RenderConfig::default();
        let render = RenderConfig {
            verbose: parsed.verbose.unwrap_or(defaults.verbose),
            escape_html: parsed.escape_html.unwrap_or(defaults.escape_html),
            diagnostic_class: parsed.diagnostic_class.unwrap_or(defaults.diagnostic_class),
            inline_diagnostics: parsed.inline_diagnostics.unwrap_or(defaults.inline_diagnostics),
            max_include_depth: parsed.max_include_depth.unwrap_or(defaults.max_include_depth),
        };

        Ok(Settings {
            base_directories: parsed.base_directories,
            render,
            view: parsed.view,
        })
    }
}
