//! Template trees: composition, placeholder inheritance and rendering
//!
//! A [`Template`] owns every node of one tree in an arena. Parents own their
//! children through a name -> [`NodeId`] map and children point back with a
//! plain id, so there is no ownership cycle. Attaching a child moves the whole
//! child tree into the parent's arena.
//!
//! Cycles cannot be built through [`Template::add_child`] since it consumes
//! the child tree; keeping composition acyclic is otherwise up to the caller.
//!
//! A [`NodeId`] is only valid for the tree that issued it. Ids carry the tree
//! they belong to and the generation of their slot, so an id from another
//! tree, from a child tree before it was attached, or of a removed node is
//! rejected with [`TemplateError::NodeNotFound`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::TemplateError;
use super::placeholders::{Lookup, Placeholders};
use crate::environment::Environment;
use crate::renderer::diagnostic::{self, ErrorReporter};
use crate::renderer::{sanitize_key, ErrorCode, ExecutionError, RenderScope, Variables};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

fn next_tree_id() -> u64 {
    NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle of a node inside the [`Template`] that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: u64,
    index: usize,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{} of tree {}", self.index, self.generation, self.tree)
    }
}

/// Arena slot; the generation is bumped each time the slot is freed
#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<TemplateNode>,
}

/// A template file with its local placeholders and named children
#[derive(Debug, Clone)]
pub struct TemplateNode {
    file: PathBuf,
    name: String,
    parent: Option<NodeId>,
    children: IndexMap<String, NodeId>,
    placeholders: Placeholders,
    verbose: bool,
}

impl TemplateNode {
    /// Resolved absolute path, fixed at construction
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Local name, unique among siblings
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in attachment order
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    pub fn placeholders_mut(&mut self) -> &mut Placeholders {
        &mut self.placeholders
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, verbose: bool) -> &mut Self {
        self.verbose = verbose;
        self
    }
}

/// A tree of template nodes sharing one [`Environment`]
pub struct Template {
    id: u64,
    env: Arc<Environment>,
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    include_depth: usize,
}

impl Template {
    /// Create a standalone single-node tree
    ///
    /// The root is named after the file stem (`layout.html` -> `layout`).
    pub fn new(
        env: Arc<Environment>,
        file: &str,
        placeholders: Placeholders,
    ) -> Result<Self, TemplateError> {
        let path = env.locator().resolve(file)?;
        let name = Path::new(file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string());
        let verbose = env.config().verbose;

        let root = TemplateNode {
            file: path,
            name,
            parent: None,
            children: IndexMap::new(),
            placeholders,
            verbose,
        };
        Ok(Self::with_nodes(env, next_tree_id(), vec![root]))
    }

    /// Tree whose slots hold `nodes` in order, the first being the root
    fn with_nodes(env: Arc<Environment>, id: u64, nodes: Vec<TemplateNode>) -> Self {
        Self {
            id,
            env,
            slots: nodes
                .into_iter()
                .map(|node| Slot {
                    generation: 0,
                    node: Some(node),
                })
                .collect(),
            free: Vec::new(),
            root: NodeId {
                tree: id,
                index: 0,
                generation: 0,
            },
            include_depth: 0,
        }
    }

    /// Construct `file`, render it once with `placeholders` as overrides
    pub fn render_file(
        env: Arc<Environment>,
        file: &str,
        placeholders: &Placeholders,
    ) -> Result<String, TemplateError> {
        let mut template = Self::new(env, file, Placeholders::new())?;
        Ok(template.render_root(placeholders))
    }

    /// Rename the root node
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let root = self.root;
        if let Ok(node) = self.node_mut(root) {
            node.name = name.into();
        }
        self
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Result<&TemplateNode, TemplateError> {
        self.slots
            .get(id.index)
            .filter(|slot| id.tree == self.id && slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(TemplateError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut TemplateNode, TemplateError> {
        let tree = self.id;
        self.slots
            .get_mut(id.index)
            .filter(|slot| id.tree == tree && slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(TemplateError::NodeNotFound(id))
    }

    /// Id for an empty slot, reusing freed slots first
    fn reserve(&mut self) -> NodeId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: None,
                });
                self.slots.len() - 1
            }
        };
        NodeId {
            tree: self.id,
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Take the node out of its slot and invalidate every id pointing at it
    fn release(&mut self, id: NodeId) -> Option<TemplateNode> {
        let tree = self.id;
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| id.tree == tree && slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    pub fn file(&self, id: NodeId) -> Result<&Path, TemplateError> {
        Ok(self.node(id)?.file())
    }

    pub fn set_verbose(&mut self, id: NodeId, verbose: bool) -> Result<&mut Self, TemplateError> {
        self.node_mut(id)?.verbose = verbose;
        Ok(self)
    }

    // Structure

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TemplateError> {
        Ok(self.node(id)?.parent)
    }

    pub fn has_parent(&self, id: NodeId) -> Result<bool, TemplateError> {
        Ok(self.parent(id)?.is_some())
    }

    pub fn is_root(&self, id: NodeId) -> Result<bool, TemplateError> {
        Ok(!self.has_parent(id)?)
    }

    /// Slash-joined names from the root down to `id`
    pub fn qualified_name(&self, id: NodeId) -> Result<String, TemplateError> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur)?;
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        Ok(names.join("/"))
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Result<NodeId, TemplateError> {
        self.node(parent)?
            .children
            .get(name)
            .copied()
            .ok_or_else(|| {
                TemplateError::child_not_found(self.qualified_name(parent).unwrap_or_default(), name)
            })
    }

    pub fn has_child(&self, parent: NodeId, name: &str) -> Result<bool, TemplateError> {
        Ok(self.node(parent)?.children.contains_key(name))
    }

    /// Attach `child` under `parent` as `name`
    ///
    /// The child root takes the name, the parent link and the parent's
    /// current verbosity. Returns the tree for chaining further attachments.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        child: Template,
    ) -> Result<&mut Self, TemplateError> {
        let name = name.into();
        let verbose = {
            let parent_node = self.node(parent)?;
            if parent_node.children.contains_key(&name) {
                return Err(TemplateError::duplicate(self.qualified_name(parent)?, name));
            }
            parent_node.verbose
        };

        // Child ids are reissued by this tree; the old ones stay foreign
        let Template {
            slots,
            root: child_root,
            ..
        } = child;
        if slots
            .get(child_root.index)
            .map_or(true, |slot| slot.node.is_none())
        {
            return Err(TemplateError::NodeNotFound(child_root));
        }

        let mut remap = vec![None; slots.len()];
        for (old, slot) in slots.iter().enumerate() {
            if slot.node.is_some() {
                remap[old] = Some(self.reserve());
            }
        }
        let new_root = remap[child_root.index].ok_or(TemplateError::NodeNotFound(child_root))?;

        for (old, slot) in slots.into_iter().enumerate() {
            let (Some(mut node), Some(new_id)) = (slot.node, remap[old]) else {
                continue;
            };
            node.parent = node.parent.and_then(|p| remap.get(p.index).copied().flatten());
            for id in node.children.values_mut() {
                if let Some(new_id) = remap.get(id.index).copied().flatten() {
                    *id = new_id;
                }
            }
            self.slots[new_id.index].node = Some(node);
        }

        let root_node = self.node_mut(new_root)?;
        root_node.parent = Some(parent);
        root_node.name = name.clone();
        root_node.verbose = verbose;
        self.node_mut(parent)?.children.insert(name.clone(), new_root);

        debug!(
            parent = %self.qualified_name(parent).unwrap_or_default(),
            child = %name,
            "attached child template"
        );
        Ok(self)
    }

    /// Resolve `file` into a new node and attach it under `parent`
    pub fn add_child_by_file(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        file: &str,
        placeholders: Placeholders,
    ) -> Result<&mut Self, TemplateError> {
        let child = Template::new(Arc::clone(&self.env), file, placeholders)?;
        self.add_child(parent, name, child)
    }

    /// Detach a child subtree and return it as a standalone tree
    ///
    /// Ids of the removed nodes become invalid in this tree and their slots
    /// are reused by later attachments. The detached tree issues new ids.
    pub fn remove_child(&mut self, parent: NodeId, name: &str) -> Result<Template, TemplateError> {
        let id = self.child(parent, name)?;
        self.node_mut(parent)?.children.shift_remove(name);

        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            order.push(cur);
            if let Ok(node) = self.node(cur) {
                stack.extend(node.children.values().rev().copied());
            }
        }

        let tree = next_tree_id();
        let remap: IndexMap<NodeId, NodeId> = order
            .iter()
            .enumerate()
            .map(|(index, old)| {
                let new_id = NodeId {
                    tree,
                    index,
                    generation: 0,
                };
                (*old, new_id)
            })
            .collect();
        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            if let Some(mut node) = self.release(*old) {
                node.parent = node.parent.and_then(|p| remap.get(&p).copied());
                for child_id in node.children.values_mut() {
                    if let Some(new_id) = remap.get(child_id) {
                        *child_id = *new_id;
                    }
                }
                nodes.push(node);
            }
        }

        debug!(
            parent = %self.qualified_name(parent).unwrap_or_default(),
            child = name,
            nodes = nodes.len(),
            "removed child template"
        );
        Ok(Self::with_nodes(Arc::clone(&self.env), tree, nodes))
    }

    // Placeholders

    /// Resolve `key` locally, then through the ancestors up to the root
    pub fn get(
        &self,
        id: NodeId,
        key: &str,
        default: Option<Value>,
    ) -> Result<Lookup, TemplateError> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur)?;
            if let Some(value) = node.placeholders.get(key) {
                return Ok(Lookup::Found(value.clone()));
            }
            current = node.parent;
        }
        Ok(match default {
            Some(value) => Lookup::UsedDefault(value),
            None => Lookup::Undefined(key.to_string()),
        })
    }

    pub fn set(
        &mut self,
        id: NodeId,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self, TemplateError> {
        self.node_mut(id)?.placeholders.set(key, value);
        Ok(self)
    }

    /// Local-only existence check
    pub fn has(&self, id: NodeId, key: &str) -> Result<bool, TemplateError> {
        Ok(self.node(id)?.placeholders.has(key))
    }

    pub fn unset(&mut self, id: NodeId, key: &str) -> Result<&mut Self, TemplateError> {
        self.node_mut(id)?.placeholders.unset(key);
        Ok(self)
    }

    pub fn placeholders(&self, id: NodeId) -> Result<&Placeholders, TemplateError> {
        Ok(self.node(id)?.placeholders())
    }

    /// Placeholders of the whole chain flattened root-first, keys sanitized
    pub fn variables(&self, id: NodeId) -> Result<Variables, TemplateError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur)?;
            chain.push(node);
            current = node.parent;
        }

        let mut variables = Variables::new();
        for node in chain.into_iter().rev() {
            for (key, value) in node.placeholders.iter() {
                variables.insert(sanitize_key(key), value.clone());
            }
        }
        Ok(variables)
    }

    // Rendering

    /// Render one node with `overrides` layered over its local placeholders
    ///
    /// The overrides last for this call only; the local store is restored
    /// afterwards whatever the outcome, a panicking renderer included.
    /// Renderer failures are turned into inline markup, so the only error is
    /// an invalid `id`.
    pub fn render(&mut self, id: NodeId, overrides: &Placeholders) -> Result<String, TemplateError> {
        let saved = {
            let node = self.node_mut(id)?;
            let saved = node.placeholders.clone();
            node.placeholders.merge(overrides);
            saved
        };

        let mut guard = RestoreStore {
            template: self,
            id,
            saved: Some(saved),
        };
        let output = guard.template.execute(id);
        drop(guard);
        output
    }

    /// Render the root node
    pub fn render_root(&mut self, overrides: &Placeholders) -> String {
        let root = self.root;
        self.render(root, overrides)
            .unwrap_or_else(|err| ErrorReporter::new(self.env.config()).template_error(&err))
    }

    /// Render the child `name` of `parent`, turning any failure into markup
    pub fn include_child(&mut self, parent: NodeId, name: &str, overrides: &Placeholders) -> String {
        let result = self
            .child(parent, name)
            .and_then(|child| self.render(child, overrides));
        match result {
            Ok(output) => output,
            Err(err) => {
                warn!(child = name, error = %err, "child template not rendered");
                ErrorReporter::new(self.env.config()).template_error(&err)
            }
        }
    }

    /// Render `file` as an independent tree that inherits nothing from this one
    pub fn include(&self, file: &str, placeholders: Placeholders) -> String {
        let reporter = ErrorReporter::new(self.env.config());
        let depth = self.include_depth + 1;
        let max_depth = self.env.config().max_include_depth;
        if depth > max_depth {
            let err = ExecutionError::new(
                ErrorCode::IncludeDepth,
                file,
                format!("maximum include depth of {} exceeded", max_depth),
            );
            warn!(error = %err, "template not included");
            return reporter.execution_error(&err);
        }

        match Template::new(Arc::clone(&self.env), file, placeholders) {
            Ok(mut included) => {
                included.include_depth = depth;
                included.render_root(&Placeholders::new())
            }
            Err(err) => {
                warn!(file, error = %err, "template not included");
                reporter.template_error(&err)
            }
        }
    }

    fn execute(&mut self, id: NodeId) -> Result<String, TemplateError> {
        let env = Arc::clone(&self.env);
        let (file, verbose) = {
            let node = self.node(id)?;
            (node.file.clone(), node.verbose)
        };
        let qualified_name = self.qualified_name(id)?;
        let variables = self.variables(id)?;

        debug!(template = %qualified_name, file = %file.display(), "rendering template");
        let result = {
            let mut scope = RenderScope::new(self, id, variables);
            env.renderer().execute(&file, &mut scope)
        };

        let body = match result {
            Ok(text) => text,
            Err(err) => {
                warn!(template = %qualified_name, error = %err, "template execution failed");
                ErrorReporter::new(env.config()).execution_error(&err)
            }
        };

        Ok(if verbose {
            diagnostic::wrap_verbose(&file, &qualified_name, &body)
        } else {
            body
        })
    }
}

/// Puts a node's saved placeholder store back when dropped
struct RestoreStore<'t> {
    template: &'t mut Template,
    id: NodeId,
    saved: Option<Placeholders>,
}

impl Drop for RestoreStore<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            if let Ok(node) = self.template.node_mut(self.id) {
                node.placeholders = saved;
            }
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("slots", &self.slots)
            .field("include_depth", &self.include_depth)
            .finish_non_exhaustive()
    }
}
