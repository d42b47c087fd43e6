use crate::config::Config;
use crate::graph::*;

/// Where retained size stops concentrating below a suspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulationPoint {
    pub object: NodeOrdinal,
    /// The descent ran out of depth or of dominated nodes before seeing a
    /// big drop
    pub reached_max_depth: bool,
}

/// Greedy descent through the dominator tree
///
/// Only the largest dominated child is ever followed. The descent stops at the
/// first dominator whose largest child retains less than `big_drop_ratio` of
/// it, which is then reported as the accumulation point.
pub struct AccumulationLocator<'g, G: HeapGraph> {
    graph: &'g G,
    max_depth: usize,
    big_drop_ratio: f64,
}

impl<'g, G: HeapGraph> AccumulationLocator<'g, G> {
    pub fn new(graph: &'g G, config: &Config) -> Self {
        AccumulationLocator {
            graph,
            max_depth: config.max_depth,
            big_drop_ratio: config.big_drop_ratio,
        }
    }

    pub fn locate(&self, suspect: NodeOrdinal) -> AccumulationPoint {
        self.descend(suspect).0
    }

    /// Like [`AccumulationLocator::locate`], also returning every dominator
    /// visited on the way down, starting with the suspect
    pub fn descend(&self, suspect: NodeOrdinal) -> (AccumulationPoint, Vec<NodeOrdinal>) {
        let graph = self.graph;
        let mut dominator = suspect;
        let mut dominator_retained_size = graph.retained_size(suspect);
        let mut trail = vec![suspect];
        let mut depth = 0;
        while depth < self.max_depth {
            let Some(child) = dominated_by_size(graph, dominator).first().copied() else {
                break;
            };
            let child_retained_size = graph.retained_size(child);
            // A zero baseline yields NaN or infinity, neither of which stops
            // the descent
            let ratio = child_retained_size as f64 / dominator_retained_size as f64;
            if ratio < self.big_drop_ratio {
                trace!(
                    "Retained size drops to {:.3} below {} @{} at depth {}",
                    ratio,
                    graph.name(dominator),
                    graph.id(dominator),
                    depth
                );
                return (
                    AccumulationPoint {
                        object: dominator,
                        reached_max_depth: false,
                    },
                    trail,
                );
            }
            dominator = child;
            dominator_retained_size = child_retained_size;
            trail.push(child);
            depth += 1;
        }
        (
            AccumulationPoint {
                object: dominator,
                reached_max_depth: true,
            },
            trail,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    /// root -> r -> n0 -> n1 -> ... each dominating the next
    fn chain(sizes: &[u64]) -> (crate::SnapshotGraph, Vec<NodeId>) {
        let mut g = TestGraph::new();
        let root = g.node(NodeType::Synthetic, "", sizes[0] * 2);
        let r = g.node(NodeType::Synthetic, "(roots)", sizes[0] * 2);
        g.own(root, "r", r);
        let mut ids = vec![];
        let mut owner = r;
        for (i, size) in sizes.iter().enumerate() {
            let n = g.object(&format!("N{}", i), *size);
            g.own(owner, "next", n);
            ids.push(n);
            owner = n;
        }
        (g.build(root), ids)
    }

    #[test]
    fn test_stops_at_big_drop() {
        let (graph, ids) = chain(&[1000, 900, 800, 100, 50]);
        let locator = AccumulationLocator::new(&graph, &Config::default());
        let (point, trail) = locator.descend(ordinal(&graph, ids[0]));
        assert_eq!(point.object, ordinal(&graph, ids[2]));
        assert!(!point.reached_max_depth);
        assert_eq!(trail.len(), 3);
        for pair in trail.windows(2) {
            assert!(graph.retained_size(pair[0]) >= graph.retained_size(pair[1]));
        }
        let stop_child = dominated_by_size(&graph, point.object)[0];
        assert!(
            (graph.retained_size(stop_child) as f64 / graph.retained_size(point.object) as f64)
                < 0.5
        );
    }

    #[test]
    fn test_runs_out_of_dominated_nodes() {
        let (graph, ids) = chain(&[1000, 900, 800]);
        let point =
            AccumulationLocator::new(&graph, &Config::default()).locate(ordinal(&graph, ids[0]));
        assert_eq!(point.object, ordinal(&graph, ids[2]));
        assert!(point.reached_max_depth);
    }

    #[test]
    fn test_bounded_by_max_depth() {
        let (graph, ids) = chain(&[1000, 990, 980, 970, 960]);
        let config = Config::default().with_max_depth(2);
        let point = AccumulationLocator::new(&graph, &config).locate(ordinal(&graph, ids[0]));
        assert_eq!(point.object, ordinal(&graph, ids[2]));
        assert!(point.reached_max_depth);
    }

    #[test]
    fn test_immediate_drop_keeps_suspect() {
        let (graph, ids) = chain(&[1000, 10]);
        let point =
            AccumulationLocator::new(&graph, &Config::default()).locate(ordinal(&graph, ids[0]));
        assert_eq!(point.object, ordinal(&graph, ids[0]));
        assert!(!point.reached_max_depth);
    }

    #[test]
    fn test_follows_only_the_largest_child() {
        let mut g = TestGraph::new();
        let root = g.node(NodeType::Synthetic, "", 2000);
        let s = g.object("Suspect", 1000);
        let small = g.object("Small", 400);
        let big = g.object("Big", 600);
        let deep = g.object("Deep", 590);
        g.own(root, "s", s);
        g.own(s, "small", small);
        g.own(s, "big", big);
        g.own(big, "deep", deep);
        let graph = g.build(root);
        let locator = AccumulationLocator::new(&graph, &Config::default());
        let (point, trail) = locator.descend(ordinal(&graph, s));
        assert_eq!(
            trail,
            vec![ordinal(&graph, s), ordinal(&graph, big), ordinal(&graph, deep)]
        );
        assert!(point.reached_max_depth);
    }

    #[test]
    fn test_zero_sized_dominator_does_not_stop() {
        let (graph, ids) = chain(&[0, 0, 0]);
        let point =
            AccumulationLocator::new(&graph, &Config::default()).locate(ordinal(&graph, ids[0]));
        assert_eq!(point.object, ordinal(&graph, ids[2]));
        assert!(point.reached_max_depth);
    }
}
