use std::fmt;

use serde::Deserialize;

use super::{EdgeType, NodeOrdinal};
use crate::constants::EDGE_FIELD_COUNT;

/// Name of an edge as supplied to a graph builder
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EdgeLabel {
    Index(u64),
    Name(String),
}

impl From<&str> for EdgeLabel {
    fn from(name: &str) -> Self {
        EdgeLabel::Name(name.to_string())
    }
}

impl From<u64> for EdgeLabel {
    fn from(index: u64) -> Self {
        EdgeLabel::Index(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeName<'a> {
    Index(u64),
    Name(&'a str),
}

impl EdgeName<'_> {
    pub fn is(&self, name: &str) -> bool {
        matches!(self, EdgeName::Name(n) if *n == name)
    }
}

impl fmt::Display for EdgeName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeName::Index(i) => write!(f, "{}", i),
            EdgeName::Name(n) => f.write_str(n),
        }
    }
}

/// A borrowed view of one ownership edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef<'a> {
    pub ordinal: usize,
    pub edge_type: EdgeType,
    pub name: EdgeName<'a>,
    /// The owned node
    pub to: NodeOrdinal,
}

impl EdgeRef<'_> {
    /// Offset of the edge's first field in a flat edge array
    pub fn edge_index(&self) -> usize {
        self.ordinal * EDGE_FIELD_COUNT
    }
}

/// Renders the edge the way DevTools prints retaining paths
impl fmt::Display for EdgeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name;
        match (self.edge_type, name) {
            (EdgeType::Context, _) => write!(f, "->{}", name),
            (EdgeType::Element, _) => write!(f, "[{}]", name),
            (EdgeType::Weak, _) => write!(f, "[[{}]]", name),
            (EdgeType::Property | EdgeType::Shortcut, EdgeName::Name(n)) => {
                if n.contains(' ') {
                    write!(f, "[\"{}\"]", n)
                } else {
                    write!(f, ".{}", n)
                }
            }
            (EdgeType::Property | EdgeType::Shortcut, EdgeName::Index(i)) => write!(f, "[{}]", i),
            (EdgeType::Internal | EdgeType::Hidden, _) => write!(f, "{{{}}}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(edge_type: EdgeType, name: EdgeName<'_>) -> EdgeRef<'_> {
        EdgeRef {
            ordinal: 2,
            edge_type,
            name,
            to: NodeOrdinal(0),
        }
    }

    #[test]
    fn test_edge_strings() {
        let cases = [
            (edge(EdgeType::Context, EdgeName::Name("leak")), "->leak"),
            (edge(EdgeType::Element, EdgeName::Index(7)), "[7]"),
            (edge(EdgeType::Weak, EdgeName::Name("map")), "[[map]]"),
            (edge(EdgeType::Property, EdgeName::Name("items")), ".items"),
            (edge(EdgeType::Property, EdgeName::Name("a b")), "[\"a b\"]"),
            (edge(EdgeType::Shortcut, EdgeName::Index(3)), "[3]"),
            (edge(EdgeType::Internal, EdgeName::Name("map")), "{map}"),
            (edge(EdgeType::Hidden, EdgeName::Index(1)), "{1}"),
        ];
        for (e, expected) in cases {
            assert_eq!(e.to_string(), expected);
        }
    }

    #[test]
    fn test_edge_index() {
        assert_eq!(edge(EdgeType::Context, EdgeName::Index(0)).edge_index(), 6);
    }

    #[test]
    fn test_edge_label_deserialize() {
        let labels: Vec<EdgeLabel> = serde_json::from_str(r#"[3, "closure"]"#).unwrap();
        assert_eq!(labels, vec![EdgeLabel::Index(3), EdgeLabel::from("closure")]);
        assert!(EdgeName::Name("closure").is("closure"));
        assert!(!EdgeName::Index(0).is("0"));
    }
}
