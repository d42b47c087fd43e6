use crate::graph::*;
use crate::snapshot::{SnapshotBuilder, SnapshotGraph};

/// Terse graph construction for unit tests
///
/// Ids are handed out sequentially, edges are labelled with strings (element
/// and hidden edges must use numeric strings).
pub(crate) struct TestGraph {
    builder: SnapshotBuilder,
    next_id: u64,
}

impl TestGraph {
    pub(crate) fn new() -> Self {
        TestGraph {
            builder: SnapshotBuilder::new(),
            next_id: 1,
        }
    }

    pub(crate) fn node(&mut self, node_type: NodeType, name: &str, retained: u64) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 2;
        self.builder
            .add_node(id, node_type, name, retained.min(32), retained)
            .unwrap();
        id
    }

    pub(crate) fn object(&mut self, name: &str, retained: u64) -> NodeId {
        self.node(NodeType::Object, name, retained)
    }

    pub(crate) fn edge(&mut self, from: NodeId, edge_type: EdgeType, name: &str, to: NodeId) {
        self.builder
            .add_edge(from, edge_type, name.into(), to)
            .unwrap();
    }

    pub(crate) fn property(&mut self, from: NodeId, name: &str, to: NodeId) {
        self.edge(from, EdgeType::Property, name, to);
    }

    pub(crate) fn dominate(&mut self, dominator: NodeId, node: NodeId) {
        self.builder.set_dominator(node, dominator).unwrap();
    }

    /// Adds an ownership edge that is also the dominator edge
    pub(crate) fn own(&mut self, owner: NodeId, name: &str, owned: NodeId) {
        self.property(owner, name, owned);
        self.dominate(owner, owned);
    }

    pub(crate) fn build(mut self, root: NodeId) -> SnapshotGraph {
        self.builder.set_root(root);
        self.builder.build().unwrap()
    }

    pub(crate) fn build_with_total(mut self, root: NodeId, total: u64) -> SnapshotGraph {
        self.builder.set_total_size(total);
        self.build(root)
    }
}

/// Ordinal of `id`, panicking if it is missing
pub(crate) fn ordinal(graph: &SnapshotGraph, id: NodeId) -> NodeOrdinal {
    graph.find_by_id(id).unwrap()
}
