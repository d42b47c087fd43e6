use serde::Serialize;

use crate::format::describe_node;
use crate::graph::*;
use crate::path::LeakPath;
use crate::record::SuspectRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub node_index: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub class_name: String,
    pub description: String,
    pub edges_count: usize,
    pub retained_size: u64,
    pub self_size: u64,
    pub id: NodeId,
}

impl NodeDescriptor {
    pub fn new<G: HeapGraph>(node: &HeapNode<'_, G>) -> Self {
        NodeDescriptor {
            node_index: node.node_index(),
            name: node.name().to_string(),
            node_type: node.node_type(),
            class_name: node.class_name().into_owned(),
            description: describe_node(node),
            edges_count: node.edges_count(),
            retained_size: node.retained_size(),
            self_size: node.self_size(),
            id: node.id(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescriptor {
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub edge_index: usize,
    pub description: String,
}

impl EdgeDescriptor {
    pub fn new(edge: &EdgeRef<'_>) -> Self {
        EdgeDescriptor {
            edge_type: edge.edge_type,
            edge_index: edge.edge_index(),
            description: edge.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEntryDescriptor {
    pub node: NodeDescriptor,
    pub edge: Option<EdgeDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDescriptor {
    pub path: Vec<PathEntryDescriptor>,
    pub suspect: usize,
    pub accumulation_point: Option<usize>,
    pub reached_max_depth: bool,
}

impl PathDescriptor {
    pub fn new<G: HeapGraph>(graph: &G, path: &LeakPath) -> Self {
        let entries = path
            .entries
            .iter()
            .map(|e| PathEntryDescriptor {
                node: NodeDescriptor::new(&graph.node(e.node)),
                edge: e.edge.map(|edge| EdgeDescriptor::new(&graph.edge(edge))),
            })
            .collect();
        PathDescriptor {
            path: entries,
            suspect: path.suspect,
            accumulation_point: path.accumulation_point,
            reached_max_depth: path.reached_max_depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationDescriptor {
    pub object: NodeDescriptor,
    pub reached_max_depth: bool,
}

/// Serializable summary of one [`SuspectRecord`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspectReport {
    pub suspect: NodeDescriptor,
    pub suspect_retained: u64,
    pub accumulation_point: Option<AccumulationDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathDescriptor>,
}

impl SuspectReport {
    pub fn new<G: HeapGraph>(graph: &G, record: &SuspectRecord, path: Option<&LeakPath>) -> Self {
        SuspectReport {
            suspect: NodeDescriptor::new(&graph.node(record.suspect)),
            suspect_retained: record.suspect_retained,
            accumulation_point: record.accumulation_point.map(|p| AccumulationDescriptor {
                object: NodeDescriptor::new(&graph.node(p.object)),
                reached_max_depth: p.reached_max_depth,
            }),
            path: path.map(|p| PathDescriptor::new(graph, p)),
        }
    }
}
