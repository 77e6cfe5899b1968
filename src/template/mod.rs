//! Template trees and their placeholder stores
//!
//! A [`Template`] is a tree of template files. Each node has a local
//! [`Placeholders`] store; lookups fall back to the ancestors, so a value set
//! on the layout is visible to every fragment below it unless shadowed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use template_tree::{Environment, FileLocator, Placeholders};
//!
//! let env = Arc::new(Environment::new(FileLocator::new(["templates"])?));
//! let mut page = env.template("layout.html", [("title", "Home")].into_iter().collect())?;
//! let root = page.root();
//! page.add_child_by_file(root, "header", "header.html", Placeholders::new())?;
//! let html = page.render_root(&Placeholders::new());
//! # Ok::<(), template_tree::TemplateError>(())
//! ```

mod error;
mod placeholders;
mod tree;
mod view;

pub use error::TemplateError;
pub use placeholders::{Lookup, Placeholders};
pub use tree::{NodeId, Template, TemplateNode};
pub use view::{ChildSpec, ViewSpec};
