//! Shared rendering environment: file locator, renderer and configuration

use std::sync::Arc;

use crate::locator::FileLocator;
use crate::renderer::{RenderConfig, Renderer, TagRenderer};
use crate::settings::{Settings, SettingsError};
use crate::template::{Placeholders, Template, TemplateError};

/// Everything a template tree needs besides its own nodes
///
/// Configured once at startup and shared read-only by every tree through an
/// `Arc`.
pub struct Environment {
    locator: FileLocator,
    renderer: Box<dyn Renderer>,
    config: RenderConfig,
}

impl Environment {
    /// Environment using the built-in tag renderer and default configuration
    pub fn new(locator: FileLocator) -> Self {
        Self {
            locator,
            renderer: Box::new(TagRenderer),
            config: RenderConfig::default(),
        }
    }

    /// Build from loaded settings, validating the base directories
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let locator = FileLocator::new(&settings.base_directories)?;
        Ok(Self::new(locator).with_config(settings.render.clone()))
    }

    /// Replace the renderer
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Replace the render configuration
    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Construct a standalone template in this environment
    pub fn template(
        self: &Arc<Self>,
        file: &str,
        placeholders: Placeholders,
    ) -> Result<Template, TemplateError> {
        Template::new(Arc::clone(self), file, placeholders)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("locator", &self.locator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
