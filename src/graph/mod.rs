use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::constants::NODE_FIELD_COUNT;

mod edge;
mod node;
pub use edge::{EdgeLabel, EdgeName, EdgeRef};
pub use node::{HeapNode, NodeKind};

/// Position of a node in the provider's node table
///
/// Only meaningful for the graph that produced it. Use [`NodeId`] to
/// identify an object across snapshots or traversals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeOrdinal(pub usize);

impl NodeOrdinal {
    /// Offset of the node's first field in a flat node array
    pub const fn offset(&self) -> usize {
        self.0 * NODE_FIELD_COUNT
    }

    pub const fn from_offset(offset: usize) -> Option<Self> {
        if offset % NODE_FIELD_COUNT == 0 {
            Some(NodeOrdinal(offset / NODE_FIELD_COUNT))
        } else {
            None
        }
    }
}

/// Stable object identity assigned by the heap profiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal,)* }) => {
        $(#[$meta])*
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }

            pub fn from_index(index: u64) -> Option<Self> {
                Self::ALL.get(index as usize).copied()
            }

            pub fn index(&self) -> u64 {
                *self as u64
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Node types in the order V8 lists them in snapshot metadata
    NodeType {
        Hidden => "hidden",
        Array => "array",
        String => "string",
        Object => "object",
        Code => "code",
        Closure => "closure",
        RegExp => "regexp",
        Number => "number",
        Native => "native",
        Synthetic => "synthetic",
        ConcatenatedString => "concatenated string",
        SlicedString => "sliced string",
        Symbol => "symbol",
        BigInt => "bigint",
        ObjectShape => "object shape",
    }
);

string_enum!(
    /// Edge types in the order V8 lists them in snapshot metadata
    EdgeType {
        Context => "context",
        Element => "element",
        Property => "property",
        Internal => "internal",
        Hidden => "hidden",
        Shortcut => "shortcut",
        Weak => "weak",
    }
);

impl EdgeType {
    /// Element and hidden edges carry an index instead of a string name
    pub fn is_indexed(&self) -> bool {
        matches!(self, EdgeType::Element | EdgeType::Hidden)
    }
}

/// A fully built heap graph together with its dominator tree
///
/// The analysis only ever reads from a provider. Retained sizes and the
/// dominator relation are computed upstream, retained size never grows when
/// walking down the dominator tree.
pub trait HeapGraph {
    fn root(&self) -> NodeOrdinal;
    fn node_count(&self) -> usize;
    fn id(&self, node: NodeOrdinal) -> NodeId;
    fn name(&self, node: NodeOrdinal) -> &str;
    fn node_type(&self, node: NodeOrdinal) -> NodeType;
    fn self_size(&self, node: NodeOrdinal) -> u64;
    fn retained_size(&self, node: NodeOrdinal) -> u64;
    /// Edge ordinals owned by `node`, in snapshot order
    fn edge_range(&self, node: NodeOrdinal) -> Range<usize>;
    fn edge(&self, edge: usize) -> EdgeRef<'_>;
    /// Nodes whose immediate dominator is `node`
    fn dominated(&self, node: NodeOrdinal) -> &[NodeOrdinal];
    /// Retained size of the whole graph
    fn total_size(&self) -> u64;

    fn edges_count(&self, node: NodeOrdinal) -> usize {
        self.edge_range(node).len()
    }

    fn edges(&self, node: NodeOrdinal) -> impl Iterator<Item = EdgeRef<'_>> + '_ {
        self.edge_range(node).map(move |e| self.edge(e))
    }

    fn class_name(&self, node: NodeOrdinal) -> Cow<'_, str> {
        match self.node_type(node) {
            NodeType::Hidden => Cow::Borrowed("(system)"),
            NodeType::Object | NodeType::Native => Cow::Borrowed(self.name(node)),
            NodeType::Code => Cow::Borrowed("(compiled code)"),
            t => Cow::Owned(format!("({})", t)),
        }
    }

    /// Resolve a flat-array offset back to a node
    fn node_at_offset(&self, offset: usize) -> Option<NodeOrdinal> {
        NodeOrdinal::from_offset(offset).filter(|n| n.0 < self.node_count())
    }

    fn node(&self, ordinal: NodeOrdinal) -> HeapNode<'_, Self>
    where
        Self: Sized,
    {
        HeapNode::new(self, ordinal)
    }
}

/// Order nodes by descending retained size, equal sizes keep their order
pub fn sort_by_retained_size<G: HeapGraph>(graph: &G, nodes: &mut [NodeOrdinal]) {
    nodes.sort_by(|a, b| graph.retained_size(*b).cmp(&graph.retained_size(*a)));
}

/// Immediately dominated nodes of `node`, largest first
pub fn dominated_by_size<G: HeapGraph>(graph: &G, node: NodeOrdinal) -> Vec<NodeOrdinal> {
    let mut dominated = graph.dominated(node).to_vec();
    sort_by_retained_size(graph, &mut dominated);
    dominated
}
