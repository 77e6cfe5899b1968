//! Declarative composition of a whole page
//!
//! A view names a layout file and the children to attach below it, so a page
//! can be described in configuration instead of built call by call:
//!
//! ```toml
//! [view]
//! layout = "layout.html"
//! placeholders = { title = "Home" }
//!
//! [[view.children]]
//! name = "header"
//! file = "header.html"
//! ```

use std::sync::Arc;

use serde::Deserialize;

use super::error::TemplateError;
use super::placeholders::Placeholders;
use super::tree::{NodeId, Template};
use crate::environment::Environment;

/// Layout file plus the child templates attached below it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewSpec {
    pub layout: String,
    pub placeholders: Placeholders,
    pub children: Vec<ChildSpec>,
}

/// One named child, possibly with children of its own
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChildSpec {
    pub name: String,
    pub file: String,
    pub placeholders: Placeholders,
    pub children: Vec<ChildSpec>,
}

impl ViewSpec {
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: ChildSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Construct the tree, stopping at the first hard error
    pub fn build(&self, env: Arc<Environment>) -> Result<Template, TemplateError> {
        let mut template = Template::new(env, &self.layout, self.placeholders.clone())?;
        let root = template.root();
        attach(&mut template, root, &self.children)?;
        Ok(template)
    }
}

impl ChildSpec {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn with_placeholder(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.placeholders.set(key, value);
        self
    }

    pub fn with_child(mut self, child: ChildSpec) -> Self {
        self.children.push(child);
        self
    }
}

fn attach(template: &mut Template, parent: NodeId, children: &[ChildSpec]) -> Result<(), TemplateError> {
    for spec in children {
        template.add_child_by_file(parent, spec.name.as_str(), &spec.file, spec.placeholders.clone())?;
        let id = template.child(parent, &spec.name)?;
        attach(template, id, &spec.children)?;
    }
    Ok(())
}
