use std::collections::HashMap;
use std::ops::Range;

use anyhow::{anyhow, bail, Result};
use smallvec::SmallVec;

use crate::constants::*;
use crate::graph::*;

/// In-memory heap graph laid out like a V8 heap snapshot
///
/// Nodes and edges live in flat `u64` arrays with a fixed number of fields per
/// entry, names are indices into a shared string table. Retained sizes and the
/// dominator tree are supplied by whoever built the snapshot.
#[derive(Debug)]
pub struct SnapshotGraph {
    nodes: Vec<u64>,
    edges: Vec<u64>,
    strings: Vec<String>,
    /// Edge ordinal of each node's first edge, plus a trailing sentinel
    first_edge: Vec<usize>,
    retained_sizes: Vec<u64>,
    /// Same layout as `first_edge`, indexing into `dominated`
    first_dominated: Vec<usize>,
    dominated: Vec<NodeOrdinal>,
    root: NodeOrdinal,
    total_size: u64,
}

impl SnapshotGraph {
    fn node_field(&self, node: NodeOrdinal, field: usize) -> u64 {
        self.nodes[node.offset() + field]
    }

    fn edge_field(&self, edge: usize, field: usize) -> u64 {
        self.edges[edge * EDGE_FIELD_COUNT + field]
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() / EDGE_FIELD_COUNT
    }

    /// Ordinal of the node with the given id, by linear scan
    pub fn find_by_id(&self, id: NodeId) -> Option<NodeOrdinal> {
        (0..self.node_count())
            .map(NodeOrdinal)
            .find(|n| self.node_field(*n, NODE_ID_OFFSET) == id.0)
    }
}

impl HeapGraph for SnapshotGraph {
    fn root(&self) -> NodeOrdinal {
        self.root
    }

    fn node_count(&self) -> usize {
        self.nodes.len() / NODE_FIELD_COUNT
    }

    fn id(&self, node: NodeOrdinal) -> NodeId {
        NodeId(self.node_field(node, NODE_ID_OFFSET))
    }

    fn name(&self, node: NodeOrdinal) -> &str {
        &self.strings[self.node_field(node, NODE_NAME_OFFSET) as usize]
    }

    fn node_type(&self, node: NodeOrdinal) -> NodeType {
        // The builder only stores valid type indices
        NodeType::from_index(self.node_field(node, NODE_TYPE_OFFSET)).unwrap_or(NodeType::Hidden)
    }

    fn self_size(&self, node: NodeOrdinal) -> u64 {
        self.node_field(node, NODE_SELF_SIZE_OFFSET)
    }

    fn retained_size(&self, node: NodeOrdinal) -> u64 {
        self.retained_sizes[node.0]
    }

    fn edges_count(&self, node: NodeOrdinal) -> usize {
        self.node_field(node, NODE_EDGE_COUNT_OFFSET) as usize
    }

    fn edge_range(&self, node: NodeOrdinal) -> Range<usize> {
        self.first_edge[node.0]..self.first_edge[node.0 + 1]
    }

    fn edge(&self, edge: usize) -> EdgeRef<'_> {
        let edge_type = EdgeType::from_index(self.edge_field(edge, EDGE_TYPE_OFFSET))
            .unwrap_or(EdgeType::Hidden);
        let raw_name = self.edge_field(edge, EDGE_NAME_OFFSET);
        let name = if edge_type.is_indexed() {
            EdgeName::Index(raw_name)
        } else {
            EdgeName::Name(&self.strings[raw_name as usize])
        };
        let to = self.edge_field(edge, EDGE_TO_NODE_OFFSET) as usize;
        EdgeRef {
            ordinal: edge,
            edge_type,
            name,
            to: NodeOrdinal(to / NODE_FIELD_COUNT),
        }
    }

    fn dominated(&self, node: NodeOrdinal) -> &[NodeOrdinal] {
        &self.dominated[self.first_dominated[node.0]..self.first_dominated[node.0 + 1]]
    }

    fn total_size(&self) -> u64 {
        self.total_size
    }
}

#[derive(Debug)]
struct PendingNode {
    id: NodeId,
    node_type: NodeType,
    name: u64,
    self_size: u64,
    retained_size: u64,
    dominator: Option<NodeId>,
}

#[derive(Debug, Clone)]
struct PendingEdge {
    edge_type: EdgeType,
    name: u64,
    to: NodeId,
}

/// Collects nodes, edges and dominators in any order and lays them out as a
/// [`SnapshotGraph`]
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    strings: Vec<String>,
    string_ids: HashMap<String, u64>,
    nodes: Vec<PendingNode>,
    ordinals: HashMap<NodeId, NodeOrdinal>,
    edges: HashMap<NodeId, SmallVec<[PendingEdge; 4]>>,
    edge_count: usize,
    root: Option<NodeId>,
    total_size: Option<u64>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    fn intern(&mut self, s: &str) -> u64 {
        if let Some(id) = self.string_ids.get(s) {
            return *id;
        }
        let id = self.strings.len() as u64;
        self.strings.push(s.to_string());
        self.string_ids.insert(s.to_string(), id);
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// The root defaults to the first node added
    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// Defaults to the retained size of the root
    pub fn set_total_size(&mut self, total_size: u64) {
        self.total_size = Some(total_size);
    }

    pub fn add_node(
        &mut self,
        id: NodeId,
        node_type: NodeType,
        name: &str,
        self_size: u64,
        retained_size: u64,
    ) -> Result<NodeOrdinal> {
        if self.ordinals.contains_key(&id) {
            bail!("Duplicate node id {}", id);
        }
        let ordinal = NodeOrdinal(self.nodes.len());
        let name = self.intern(name);
        self.nodes.push(PendingNode {
            id,
            node_type,
            name,
            self_size,
            retained_size,
            dominator: None,
        });
        self.ordinals.insert(id, ordinal);
        Ok(ordinal)
    }

    /// Record the immediate dominator of an already added node
    pub fn set_dominator(&mut self, id: NodeId, dominator: NodeId) -> Result<()> {
        if id == dominator {
            bail!("Node {} cannot dominate itself", id);
        }
        let ordinal = self
            .ordinals
            .get(&id)
            .ok_or_else(|| anyhow!("Dominator set for unknown node {}", id))?;
        self.nodes[ordinal.0].dominator = Some(dominator);
        Ok(())
    }

    /// Edges of one owner keep the order they were added in
    pub fn add_edge(
        &mut self,
        from: NodeId,
        edge_type: EdgeType,
        label: EdgeLabel,
        to: NodeId,
    ) -> Result<()> {
        let name = match (edge_type.is_indexed(), label) {
            (true, EdgeLabel::Index(i)) => i,
            (true, EdgeLabel::Name(n)) => n.parse().map_err(|_| {
                anyhow!("{} edge from {} needs an index, got {:?}", edge_type, from, n)
            })?,
            (false, EdgeLabel::Name(n)) => self.intern(&n),
            (false, EdgeLabel::Index(i)) => self.intern(&i.to_string()),
        };
        self.edges.entry(from).or_default().push(PendingEdge {
            edge_type,
            name,
            to,
        });
        self.edge_count += 1;
        Ok(())
    }

    fn ordinal_of(&self, id: NodeId, what: &str) -> Result<NodeOrdinal> {
        self.ordinals
            .get(&id)
            .copied()
            .ok_or_else(|| anyhow!("{} refers to unknown node {}", what, id))
    }

    pub fn build(mut self) -> Result<SnapshotGraph> {
        let root_id = match self.root {
            Some(id) => id,
            None => self
                .nodes
                .first()
                .map(|n| n.id)
                .ok_or_else(|| anyhow!("Snapshot has no nodes"))?,
        };
        let root = self.ordinal_of(root_id, "Root")?;
        for id in self.edges.keys() {
            self.ordinal_of(*id, "Edge owner")?;
        }

        let node_count = self.nodes.len();
        let mut nodes = Vec::with_capacity(node_count * NODE_FIELD_COUNT);
        let mut edges = Vec::with_capacity(self.edge_count * EDGE_FIELD_COUNT);
        let mut first_edge = Vec::with_capacity(node_count + 1);
        let mut retained_sizes = Vec::with_capacity(node_count);
        let mut children: Vec<SmallVec<[NodeOrdinal; 4]>> = vec![SmallVec::new(); node_count];

        for (ordinal, node) in self.nodes.iter().enumerate() {
            let owned = self.edges.remove(&node.id).unwrap_or_default();
            first_edge.push(edges.len() / EDGE_FIELD_COUNT);
            nodes.extend_from_slice(&[
                node.node_type.index(),
                node.name,
                node.id.0,
                node.self_size,
                owned.len() as u64,
            ]);
            retained_sizes.push(node.retained_size);
            for edge in owned {
                let to = self.ordinal_of(edge.to, "Edge target")?;
                edges.extend_from_slice(&[edge.edge_type.index(), edge.name, to.offset() as u64]);
            }
            if let Some(dominator) = node.dominator {
                let dominator = self.ordinal_of(dominator, "Dominator")?;
                children[dominator.0].push(NodeOrdinal(ordinal));
            }
        }
        first_edge.push(edges.len() / EDGE_FIELD_COUNT);

        let mut first_dominated = Vec::with_capacity(node_count + 1);
        let mut dominated = Vec::with_capacity(node_count);
        for list in &children {
            first_dominated.push(dominated.len());
            dominated.extend_from_slice(list);
        }
        first_dominated.push(dominated.len());

        let total_size = self
            .total_size
            .unwrap_or(retained_sizes[root.0]);
        debug!(
            "Built snapshot graph with {} nodes, {} edges, {} strings",
            node_count,
            edges.len() / EDGE_FIELD_COUNT,
            self.strings.len()
        );
        Ok(SnapshotGraph {
            nodes,
            edges,
            strings: self.strings,
            first_edge,
            retained_sizes,
            first_dominated,
            dominated,
            root,
            total_size,
        })
    }
}
