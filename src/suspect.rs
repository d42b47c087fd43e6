use std::collections::HashSet;

use crate::config::Config;
use crate::graph::*;

/// Outcome of suspect selection
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SuspectSelection {
    /// Suspects in the order they were accepted
    pub suspects: Vec<NodeOrdinal>,
    /// Class names of accepted suspects, kept for de-duplicating against a
    /// per-class aggregate report
    pub class_names: HashSet<String>,
    pub threshold: f64,
}

/// Children of the root node through its outgoing edges, largest first
///
/// A node reached through several root edges is listed once.
pub fn roots<G: HeapGraph>(graph: &G) -> Vec<NodeOrdinal> {
    let mut seen = HashSet::new();
    let mut roots: Vec<NodeOrdinal> = graph
        .edges(graph.root())
        .map(|e| e.to)
        .filter(|n| seen.insert(*n))
        .collect();
    sort_by_retained_size(graph, &mut roots);
    roots
}

/// The dominator tree layer directly below the roots, one group per root
///
/// Each group is sorted by descending retained size; groups follow root order.
pub fn top_dominators<G: HeapGraph>(graph: &G) -> Vec<Vec<NodeOrdinal>> {
    roots(graph)
        .into_iter()
        .map(|root| dominated_by_size(graph, root))
        .collect()
}

/// Pick the top dominators retaining more than the configured share of heap
///
/// Groups are only sorted locally, so scanning of a group stops at its first
/// node below the threshold while later groups are still examined.
pub fn select_suspects<G: HeapGraph>(graph: &G, config: &Config) -> SuspectSelection {
    let threshold = config.threshold(graph.total_size());
    let mut selection = SuspectSelection {
        threshold,
        ..Default::default()
    };
    for group in top_dominators(graph) {
        for node in group {
            let retained = graph.retained_size(node);
            if retained as f64 <= threshold {
                break;
            }
            trace!(
                "Suspect {} @{} retains {} bytes",
                graph.name(node),
                graph.id(node),
                retained
            );
            selection
                .class_names
                .insert(graph.class_name(node).into_owned());
            selection.suspects.push(node);
        }
    }
    debug!(
        "Selected {} suspects above {} bytes",
        selection.suspects.len(),
        threshold
    );
    selection
}
