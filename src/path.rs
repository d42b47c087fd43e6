use fixedbitset::FixedBitSet;

use crate::accumulation::AccumulationPoint;
use crate::format::describe_node;
use crate::graph::*;

/// Sink for the arrow-annotated text rendering of a leak path
pub trait PathLog {
    fn line(&mut self, line: &str);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLog;

impl PathLog for NoopLog {
    fn line(&mut self, _line: &str) {}
}

/// Forwards every line to the `log` facade at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPathLog;

impl PathLog for LogPathLog {
    fn line(&mut self, line: &str) {
        info!("{}", line);
    }
}

impl PathLog for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeakPathEntry {
    pub node: NodeOrdinal,
    /// Edge ordinal leading to the next entry, `None` on the last one
    pub edge: Option<usize>,
}

/// Ownership path from a suspect towards its accumulation point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakPath {
    pub entries: Vec<LeakPathEntry>,
    /// Index of the suspect in `entries`, always the head
    pub suspect: usize,
    /// Index of the accumulation point, `None` if the walk dead-ended first
    pub accumulation_point: Option<usize>,
    pub reached_max_depth: bool,
}

impl LeakPath {
    fn new(head: NodeOrdinal) -> Self {
        LeakPath {
            entries: vec![LeakPathEntry {
                node: head,
                edge: None,
            }],
            suspect: 0,
            accumulation_point: None,
            reached_max_depth: false,
        }
    }

    fn add(&mut self, edge: &EdgeRef<'_>) {
        if let Some(last) = self.entries.last_mut() {
            last.edge = Some(edge.ordinal);
        }
        self.entries.push(LeakPathEntry {
            node: edge.to,
            edge: None,
        });
    }

    fn mark_accumulation_point(&mut self) {
        self.accumulation_point = Some(self.entries.len() - 1);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeOrdinal> + '_ {
        self.entries.iter().map(|e| e.node)
    }
}

/// Unvisited child of `node` with the largest retained size
///
/// The first child wins ties. Children retaining nothing are never picked.
pub fn find_biggest_child<'g, G: HeapGraph>(
    graph: &'g G,
    node: NodeOrdinal,
    visited: &FixedBitSet,
) -> Option<EdgeRef<'g>> {
    let mut max_retained_size = 0;
    let mut result = None;
    for edge in graph.edges(node) {
        if visited.contains(edge.to.0) {
            continue;
        }
        let retained_size = graph.retained_size(edge.to);
        if retained_size > max_retained_size {
            max_retained_size = retained_size;
            result = Some(edge);
        }
    }
    result
}

fn show_path<G: HeapGraph>(graph: &G, edge: &EdgeRef<'_>, hint: &str, log: &mut dyn PathLog) {
    log.line("  |");
    log.line(&format!("  | {}", edge));
    log.line("  v");
    log.line(&format!("{}{}", describe_node(&graph.node(edge.to)), hint));
}

/// Walk ownership edges from `suspect` to `point`, always taking the biggest
/// unvisited child, then one hop past the accumulation point
///
/// The visited set is local to the call, so repeated calls on the same graph
/// return identical paths and every node appears at most once.
pub fn reconstruct_path<G: HeapGraph>(
    graph: &G,
    suspect: NodeOrdinal,
    point: Option<&AccumulationPoint>,
    log: &mut dyn PathLog,
) -> LeakPath {
    let mut visited = FixedBitSet::with_capacity(graph.node_count());
    let mut current = suspect;
    let mut result = LeakPath::new(current);
    visited.insert(current.0);

    log.line(&format!(
        "{} <--- Suspect",
        describe_node(&graph.node(suspect))
    ));

    let Some(point) = point else {
        return result;
    };
    let mut acc_hint = String::from(" <--- Accumulation Point");
    if point.reached_max_depth {
        result.reached_max_depth = true;
        acc_hint += " (reached maximum depth)";
    }

    let dest = point.object;
    if suspect == dest {
        log.line("^");
        log.line("|");
        log.line("Accumulation Point");
    } else {
        while current != dest && graph.edges_count(current) > 0 {
            let Some(edge) = find_biggest_child(graph, current, &visited) else {
                log.line("...end...");
                return result;
            };
            visited.insert(edge.to.0);
            result.add(&edge);
            let hint = if edge.to == dest { acc_hint.as_str() } else { "" };
            show_path(graph, &edge, hint, log);
            current = edge.to;
        }
        if current != dest {
            log.line("...end...");
            return result;
        }
    }
    result.mark_accumulation_point();

    // One more child beyond the accumulation point, if it has any
    if graph.edges_count(dest) > 0 {
        let Some(edge) = find_biggest_child(graph, current, &visited) else {
            log.line("...end...");
            return result;
        };
        visited.insert(edge.to.0);
        result.add(&edge);
        show_path(graph, &edge, "", log);
        log.line("............");
    }
    result
}
