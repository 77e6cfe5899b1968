//! Configuration for rendering

/// Configuration options for rendering template trees
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Verbosity of newly constructed nodes (start/end marker comments)
    pub verbose: bool,

    /// Whether placeholder values are HTML-escaped on output
    pub escape_html: bool,

    /// CSS class put on every diagnostic element
    pub diagnostic_class: String,

    /// Whether errors render as visible markup or as empty text
    pub inline_diagnostics: bool,

    /// Maximum nesting of `include(file)` calls
    pub max_include_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            escape_html: true,
            diagnostic_class: "template-diagnostic".to_string(),
            inline_diagnostics: true,
            max_include_depth: 32,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default verbosity of new nodes
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set whether values are HTML-escaped
    pub fn with_escape_html(mut self, escape: bool) -> Self {
        self.escape_html = escape;
        self
    }

    /// Set the diagnostic CSS class
    pub fn with_diagnostic_class(mut self, class: impl Into<String>) -> Self {
        self.diagnostic_class = class.into();
        self
    }

    /// Set whether diagnostics are rendered inline
    pub fn with_inline_diagnostics(mut self, inline: bool) -> Self {
        self.inline_diagnostics = inline;
        self
    }

    /// Set the maximum `include` nesting
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert!(!config.verbose);
        assert!(config.escape_html);
        assert!(config.inline_diagnostics);
        assert_eq!(config.diagnostic_class, "template-diagnostic");
        assert_eq!(config.max_include_depth, 32);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RenderConfig::new()
            .with_verbose(true)
            .with_escape_html(false)
            .with_diagnostic_class("volta")
            .with_inline_diagnostics(false)
            .with_max_include_depth(4);

        assert!(config.verbose);
        assert!(!config.escape_html);
        assert!(!config.inline_diagnostics);
        assert_eq!(config.diagnostic_class, "volta");
        assert_eq!(config.max_include_depth, 4);
    }
}
