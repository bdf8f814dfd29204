//! Goal graph assembly
//!
//! Builds the per-pass forest from the document set in two passes: first a
//! bare node per in-scope document, then child lists, which can only be
//! filled once every node exists.

use crate::bag::PropertyBag;
use crate::config::GoalSettings;
use crate::extract::PropertyExtractor;
use crate::link::LinkNamespace;
use crate::types::{GoalNode, NodeId};
use indexmap::IndexMap;

/// One document handed over by the host
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document identifier (vault-relative path)
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Parsed frontmatter
    pub properties: PropertyBag,
}

impl Document {
    /// Create document; the display name is the identifier's file stem
    #[must_use]
    pub fn new(id: impl Into<NodeId>, properties: PropertyBag) -> Self {
        let id = id.into();
        let name = id.basename().to_string();
        Self {
            id,
            name,
            properties,
        }
    }
}

/// Forest of goal nodes keyed by identifier, in document scan order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalGraph {
    nodes: IndexMap<NodeId, GoalNode>,
}

impl GoalGraph {
    /// Empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build graph from fully formed nodes, filling child lists from parents
    ///
    /// Existing child lists are discarded.
    #[must_use]
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = GoalNode>,
    {
        let mut graph = Self {
            nodes: nodes
                .into_iter()
                .map(|mut node| {
                    node.children.clear();
                    (node.id.clone(), node)
                })
                .collect(),
        };
        graph.link_children();
        graph
    }

    /// Node by identifier
    #[inline]
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&GoalNode> {
        self.nodes.get(id)
    }

    /// Whether the identifier names a node
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Parent node, if the parent identifier resolves inside the graph
    #[must_use]
    pub fn parent_of(&self, id: &NodeId) -> Option<&GoalNode> {
        self.get(id)?.parent.as_ref().and_then(|p| self.get(p))
    }

    /// Identifiers in scan order
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Nodes in scan order
    pub fn nodes(&self) -> impl Iterator<Item = &GoalNode> {
        self.nodes.values()
    }

    /// Nodes without a resolvable parent
    pub fn roots(&self) -> impl Iterator<Item = &GoalNode> {
        self.nodes
            .values()
            .filter(|n| n.parent.as_ref().map_or(true, |p| !self.contains(p)))
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn link_children(&mut self) {
        let edges: Vec<(NodeId, NodeId)> = self
            .nodes
            .values()
            .filter_map(|node| {
                let parent = node.parent.as_ref()?;
                self.nodes
                    .contains_key(parent)
                    .then(|| (parent.clone(), node.id.clone()))
            })
            .collect();

        for (parent, child) in edges {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children.push(child);
            }
        }
    }
}

/// Assembles a [`GoalGraph`] from documents
#[derive(Debug, Clone, Copy)]
pub struct GraphBuilder<'a> {
    settings: &'a GoalSettings,
}

impl<'a> GraphBuilder<'a> {
    /// Create builder over settings
    #[inline]
    #[must_use]
    pub fn new(settings: &'a GoalSettings) -> Self {
        Self { settings }
    }

    /// Whether a document identifier lies in the goals scope
    ///
    /// Markdown documents in the goals folder or below it; an empty folder
    /// selects every markdown document.
    #[must_use]
    pub fn in_scope(&self, id: &NodeId) -> bool {
        if id.extension() != Some("md") {
            return false;
        }
        let folder = self.settings.goals_folder.trim_matches('/');
        if folder.is_empty() {
            return true;
        }
        let path = id.as_str();
        path.strip_prefix(folder)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Build the forest
    ///
    /// A parent link that does not resolve in `namespace` keeps its raw
    /// target as parent identifier, which the validator reports as orphaned.
    #[must_use]
    pub fn build<N>(&self, documents: &[Document], namespace: &N) -> GoalGraph
    where
        N: LinkNamespace + ?Sized,
    {
        let extractor = PropertyExtractor::new(self.settings);

        let nodes = documents
            .iter()
            .filter(|doc| self.in_scope(&doc.id))
            .map(|doc| {
                let mut node = extractor.extract(doc.id.clone(), doc.name.clone(), &doc.properties);
                node.parent = extractor.parent_target(&doc.properties).map(|target| {
                    namespace
                        .resolve(&target, &doc.id)
                        .unwrap_or_else(|| NodeId::new(target))
                });
                node
            });

        let graph = GoalGraph::from_nodes(nodes);
        tracing::debug!(
            "Built goal graph: {} nodes from {} documents",
            graph.len(),
            documents.len()
        );
        graph
    }
}
