use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::error::{Error, LoadError, MalformedInputError};

/// One element of the raw input document: `{ name, value?, children? }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub children: Option<Vec<InputNode>>,
}

impl InputNode {
    pub fn branch(name: &str, children: Vec<InputNode>) -> Self {
        Self {
            name: Some(name.to_string()),
            value: None,
            children: Some(children),
        }
    }

    pub fn leaf(name: &str, value: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            value: Some(Value::from(value)),
            children: None,
        }
    }
}

/// Index of a node inside its [`Hierarchy`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    /// Value as declared in the input; only leaves are required to carry one.
    pub value: Option<f64>,
    /// Sorted descending by `aggregated_value`, ties in input order.
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub aggregated_value: f64,
    /// Ordinal color slot of the top-level ancestor. `None` for the root.
    pub category: Option<usize>,
    /// Position among siblings in the input document.
    pub input_index: usize,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-backed tree built from an [`InputNode`] document.
///
/// Node ids are assigned in input pre-order, so the root is always the first node.
/// Parent links are plain indices; nothing is ever removed from the arena.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    nodes: Vec<TreeNode>,
    categories: Vec<String>,
}

impl Hierarchy {
    #[instrument(level = "debug", skip_all)]
    pub fn build(raw: &InputNode) -> Result<Self, MalformedInputError> {
        let categories = category_domain(raw);
        let mut builder = Builder {
            nodes: Vec::new(),
            categories: &categories,
        };
        builder.visit(raw, None, 0, 0, None, "")?;
        let nodes = builder.nodes;
        debug!(
            nodes = nodes.len(),
            total = nodes[0].aggregated_value,
            categories = categories.len(),
            "built hierarchy"
        );
        Ok(Self { nodes, categories })
    }

    pub fn from_json_str(input: &str) -> Result<Self, Error> {
        let raw: InputNode = serde_json::from_str(input).map_err(LoadError::Parse)?;
        Ok(Self::build(&raw)?)
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        let raw: InputNode = serde_json::from_value(value).map_err(LoadError::Parse)?;
        Ok(Self::build(&raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Panics if `id` was not produced by this hierarchy.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (NodeId(idx), node))
    }

    /// Ordinal color domain: the root's child names in input order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Walks parent links from `id` (exclusive) up to the root (inclusive).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |current| {
            self.node(*current).parent
        })
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    /// Pre-order walk of the subtree rooted at `id`, following sorted child order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.node(current).children.iter().rev().copied());
        }
        out
    }

    pub fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let node = self.node(current);
            match node.depth {
                0 => return None,
                1 => return Some(current),
                _ => current = node.parent?,
            }
        }
    }

    /// Slash-joined names from the first level down, e.g. `A/A1`. Empty for the root.
    pub fn path(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|current| self.node(*current).depth > 0)
            .map(|current| self.node(current).name.as_str())
            .collect();
        names.reverse();
        names.join("/")
    }

    /// Resolves a slash-joined name path relative to the root. The empty path is the root.
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for segment in path.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            current = self
                .node(current)
                .children
                .iter()
                .copied()
                .find(|child| self.node(*child).name == segment)?;
        }
        Some(current)
    }
}

struct Builder<'a> {
    nodes: Vec<TreeNode>,
    categories: &'a [String],
}

impl Builder<'_> {
    fn visit(
        &mut self,
        raw: &InputNode,
        parent: Option<NodeId>,
        depth: usize,
        input_index: usize,
        category: Option<usize>,
        parent_path: &str,
    ) -> Result<NodeId, MalformedInputError> {
        let name = raw
            .name
            .clone()
            .ok_or_else(|| MalformedInputError::MissingName {
                path: display_path(parent_path),
            })?;
        // Same convention as `Hierarchy::path`: root excluded, empty for the root itself.
        let path = match depth {
            0 => String::new(),
            1 => name.clone(),
            _ => format!("{parent_path}/{name}"),
        };
        let value = parse_value(raw.value.as_ref(), &display_path(&path))?;

        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            name,
            value,
            children: Vec::new(),
            parent,
            depth,
            aggregated_value: 0.0,
            category,
            input_index,
        });

        let raw_children = raw.children.as_deref().unwrap_or(&[]);
        let mut children = Vec::with_capacity(raw_children.len());
        for (idx, child) in raw_children.iter().enumerate() {
            let child_category = if depth == 0 {
                child
                    .name
                    .as_ref()
                    .and_then(|name| self.categories.iter().position(|c| c == name))
            } else {
                category
            };
            children.push(self.visit(child, Some(id), depth + 1, idx, child_category, &path)?);
        }

        let aggregated = if children.is_empty() {
            match value {
                Some(value) => value,
                None if depth == 0 => 0.0,
                None => {
                    return Err(MalformedInputError::MissingValue {
                        path: display_path(&path),
                    });
                }
            }
        } else {
            let sum: f64 = children
                .iter()
                .map(|child| self.nodes[child.0].aggregated_value)
                .sum();
            if let Some(declared) = value
                && (declared - sum).abs() > f64::EPSILON * sum.max(1.0)
            {
                debug!(%path, declared, sum, "declared value differs from children sum");
            }
            sum
        };

        children.sort_by(|a, b| {
            self.nodes[b.0]
                .aggregated_value
                .partial_cmp(&self.nodes[a.0].aggregated_value)
                .unwrap_or(Ordering::Equal)
        });
        trace!(%path, aggregated, children = children.len(), "visited node");

        let node = &mut self.nodes[id.0];
        node.aggregated_value = aggregated;
        node.children = children;
        Ok(id)
    }
}

fn parse_value(raw: Option<&Value>, path: &str) -> Result<Option<f64>, MalformedInputError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value = raw
        .as_f64()
        .ok_or_else(|| MalformedInputError::InvalidValue {
            path: path.to_string(),
        })?;
    if !value.is_finite() {
        return Err(MalformedInputError::NonFiniteValue {
            path: path.to_string(),
        });
    }
    if value < 0.0 {
        return Err(MalformedInputError::NegativeValue {
            path: path.to_string(),
            value,
        });
    }
    Ok(Some(value))
}

fn category_domain(raw: &InputNode) -> Vec<String> {
    let mut domain: Vec<String> = Vec::new();
    for child in raw.children.as_deref().unwrap_or(&[]) {
        if let Some(name) = &child.name
            && !domain.contains(name)
        {
            domain.push(name.clone());
        }
    }
    domain
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
