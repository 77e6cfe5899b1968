//! Inline diagnostic markup for recoverable render errors
//!
//! Errors caught at a render boundary become a `<span>` in the page instead
//! of aborting the whole tree, so one broken fragment stays visible without
//! blanking out its siblings.

use std::borrow::Cow;
use std::path::Path;

use super::config::RenderConfig;
use super::error::ExecutionError;
use crate::template::TemplateError;

/// Formats errors and undefined placeholders as inline markup
#[derive(Debug, Clone, Copy)]
pub struct ErrorReporter<'a> {
    config: &'a RenderConfig,
}

impl<'a> ErrorReporter<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Marker for a placeholder resolved nowhere in the chain
    pub fn undefined(&self, key: &str) -> String {
        if !self.config.inline_diagnostics {
            return String::new();
        }
        format!(
            r#"<span class="{} template-undefined">{}</span>"#,
            escape_html(&self.config.diagnostic_class),
            escape_html(key)
        )
    }

    pub fn execution_error(&self, err: &ExecutionError) -> String {
        self.error_span(err.code.as_str(), Some(&err.file), err.line, &err.message)
    }

    pub fn template_error(&self, err: &TemplateError) -> String {
        self.error_span(err.code(), None, None, &err.to_string())
    }

    fn error_span(&self, code: &str, file: Option<&Path>, line: Option<usize>, message: &str) -> String {
        if !self.config.inline_diagnostics {
            return String::new();
        }
        let mut attrs = format!(r#" data-code="{}""#, escape_html(code));
        if let Some(file) = file {
            attrs.push_str(&format!(
                r#" data-file="{}""#,
                escape_html(&file.display().to_string())
            ));
        }
        if let Some(line) = line {
            attrs.push_str(&format!(r#" data-line="{}""#, line));
        }
        format!(
            r#"<span class="{} template-error"{}>{}</span>"#,
            escape_html(&self.config.diagnostic_class),
            attrs,
            escape_html(message)
        )
    }
}

/// Start/end comments wrapped around a verbose node's output
pub fn wrap_verbose(file: &Path, qualified_name: &str, body: &str) -> String {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    format!(
        "\n<!-- START: \"{file}\" ({name}) -->\n{body}\n<!-- END: \"{file}\" ({name}) -->\n",
        file = file_name,
        name = qualified_name,
        body = body
    )
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
