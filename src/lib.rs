//! Template Tree - hierarchical composition of text templates
//!
//! Pages are assembled from a tree of template files. Each node holds its own
//! placeholders and inherits the placeholders of its ancestors, so a value set
//! once on the layout flows down to every fragment beneath it. Rendering is
//! fault-isolating: a broken fragment renders as an inline diagnostic while
//! the rest of the page is still produced.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use template_tree::{Environment, FileLocator, Placeholders};
//!
//! let env = Arc::new(Environment::new(FileLocator::new(["templates"])?));
//!
//! let mut page = env.template("layout.html", [("title", "Root Template")].into_iter().collect())?;
//! let root = page.root();
//! page.add_child_by_file(root, "header", "header.html", Placeholders::new())?
//!     .add_child_by_file(root, "main", "main.html", Placeholders::new())?;
//!
//! println!("{}", page.render_root(&Placeholders::new()));
//! # Ok::<(), template_tree::TemplateError>(())
//! ```
//!
//! Template files use `{{ ... }}` tags:
//!
//! ```text
//! <h1>{{ get("title", "Untitled") }}</h1>
//! {{ include_child("header") }}
//! {{ include("partial.html", title: "MAIN ARTICLE") }}
//! ```

pub mod environment;
pub mod error;
pub mod locator;
pub mod parser;
pub mod renderer;
pub mod settings;
pub mod template;

use std::sync::Arc;

pub use environment::Environment;
pub use error::ParseError;
pub use locator::FileLocator;
pub use parser::{parse, Document};
pub use renderer::{
    ErrorCode, ErrorReporter, ExecutionError, RenderConfig, RenderScope, Renderer, TagRenderer,
};
pub use serde_json::Value;
pub use settings::{Settings, SettingsError};
pub use template::{
    ChildSpec, Lookup, NodeId, Placeholders, Template, TemplateError, TemplateNode, ViewSpec,
};

/// Render a single template file with `placeholders`
///
/// Shorthand for constructing a standalone tree and rendering its root once.
/// Only a missing file is a hard error; everything else renders inline.
pub fn render_file(
    env: &Arc<Environment>,
    file: &str,
    placeholders: &Placeholders,
) -> Result<String, TemplateError> {
    Template::render_file(Arc::clone(env), file, placeholders)
}
