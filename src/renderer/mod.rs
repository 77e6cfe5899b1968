//! Rendering of template files
//!
//! A [`Renderer`] turns one resolved template file into text. It receives a
//! [`RenderScope`] giving it the flattened variables of the node being
//! rendered and the callbacks a body needs: lazy placeholder lookup and the
//! two inclusion forms.

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod tags;

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::template::{Lookup, NodeId, Placeholders, Template};

pub use config::RenderConfig;
pub use diagnostic::ErrorReporter;
pub use error::{ErrorCode, ExecutionError};
pub use tags::TagRenderer;

/// Sanitized variable name -> value, flattened from root to the rendered node
pub type Variables = IndexMap<String, Value>;

/// Executes a template file with the variables of one node in scope
pub trait Renderer: Send + Sync {
    fn execute(&self, file: &Path, scope: &mut RenderScope<'_>) -> Result<String, ExecutionError>;
}

/// The node being rendered, as seen from inside its template body
pub struct RenderScope<'a> {
    template: &'a mut Template,
    node: NodeId,
    variables: Variables,
}

impl<'a> RenderScope<'a> {
    pub(crate) fn new(template: &'a mut Template, node: NodeId, variables: Variables) -> Self {
        Self {
            template,
            node,
            variables,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Effective placeholders of the node with sanitized keys
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn config(&self) -> &RenderConfig {
        self.template.environment().config()
    }

    pub fn qualified_name(&self) -> String {
        self.template.qualified_name(self.node).unwrap_or_default()
    }

    /// Resolve `key` through the node's inheritance chain
    pub fn get(&self, key: &str, default: Option<Value>) -> Lookup {
        self.template
            .get(self.node, key, default)
            .unwrap_or_else(|_| Lookup::Undefined(key.to_string()))
    }

    /// Render a named child of this node; failures become inline markup
    pub fn include_child(&mut self, name: &str, overrides: &Placeholders) -> String {
        self.template.include_child(self.node, name, overrides)
    }

    /// Render an independent template with no inherited placeholders
    pub fn include(&self, file: &str, placeholders: Placeholders) -> String {
        self.template.include(file, placeholders)
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
