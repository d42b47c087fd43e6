use std::borrow::Cow;

use super::{EdgeRef, HeapGraph, NodeId, NodeOrdinal, NodeType};
use crate::constants::CONTEXT_CLASS;

/// How a node is described to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Plain,
    Closure,
    /// A function context, described through the closure that owns it
    Context,
    Native,
}

/// A node of a [`HeapGraph`] paired with the graph it lives in
pub struct HeapNode<'g, G: HeapGraph> {
    graph: &'g G,
    ordinal: NodeOrdinal,
}

impl<G: HeapGraph> Clone for HeapNode<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: HeapGraph> Copy for HeapNode<'_, G> {}

impl<G: HeapGraph> PartialEq for HeapNode<'_, G> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.ordinal == other.ordinal
    }
}

impl<G: HeapGraph> std::fmt::Debug for HeapNode<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapNode")
            .field("ordinal", &self.ordinal.0)
            .field("id", &self.id().0)
            .field("name", &self.name())
            .finish()
    }
}

impl<'g, G: HeapGraph> HeapNode<'g, G> {
    pub fn new(graph: &'g G, ordinal: NodeOrdinal) -> Self {
        HeapNode { graph, ordinal }
    }

    pub fn graph(&self) -> &'g G {
        self.graph
    }

    pub fn ordinal(&self) -> NodeOrdinal {
        self.ordinal
    }

    /// Offset of the node in the flat node array
    pub fn node_index(&self) -> usize {
        self.ordinal.offset()
    }

    pub fn id(&self) -> NodeId {
        self.graph.id(self.ordinal)
    }

    pub fn name(&self) -> &'g str {
        self.graph.name(self.ordinal)
    }

    pub fn class_name(&self) -> Cow<'g, str> {
        self.graph.class_name(self.ordinal)
    }

    pub fn node_type(&self) -> NodeType {
        self.graph.node_type(self.ordinal)
    }

    pub fn self_size(&self) -> u64 {
        self.graph.self_size(self.ordinal)
    }

    pub fn retained_size(&self) -> u64 {
        self.graph.retained_size(self.ordinal)
    }

    pub fn edges_count(&self) -> usize {
        self.graph.edges_count(self.ordinal)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'g>> + 'g {
        self.graph.edges(self.ordinal)
    }

    pub fn kind(&self) -> NodeKind {
        if self.name() == CONTEXT_CLASS {
            return NodeKind::Context;
        }
        match self.node_type() {
            NodeType::Closure => NodeKind::Closure,
            NodeType::Native => NodeKind::Native,
            _ => NodeKind::Plain,
        }
    }

    /// First child reached through a string-named edge called `name`
    pub fn child_by_edge_name(&self, name: &str) -> Option<HeapNode<'g, G>> {
        let graph = self.graph;
        self.edges()
            .find(|e| e.name.is(name))
            .map(|e| HeapNode::new(graph, e.to))
    }
}
