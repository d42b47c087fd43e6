use std::io::Read;

use anyhow::Result;

use crate::accumulation::AccumulationLocator;
use crate::config::Config;
use crate::graph::HeapGraph;
use crate::ingest::{load_stream, SnapshotLoader};
use crate::record::SuspectRecord;
use crate::snapshot::SnapshotGraph;
use crate::suspect::{select_suspects, SuspectSelection};

/// A loaded heap graph together with the settings to analyze it with
pub struct HeapSnapshotAnalyzer<G: HeapGraph = SnapshotGraph> {
    config: Config,
    graph: G,
}

impl HeapSnapshotAnalyzer<SnapshotGraph> {
    pub fn load_stream<R: Read>(config: Config, reader: R, chunk_size: usize) -> Result<Self> {
        config.validate()?;
        let graph = load_stream(reader, chunk_size)?;
        Ok(HeapSnapshotAnalyzer { config, graph })
    }

    /// Load from text already split into chunks, e.g. as received from a
    /// debugger protocol
    pub fn load_chunks<I, S>(config: Config, chunks: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        config.validate()?;
        let mut loader = SnapshotLoader::new();
        for chunk in chunks {
            loader.write(chunk.as_ref())?;
        }
        let graph = loader.finish()?;
        Ok(HeapSnapshotAnalyzer { config, graph })
    }
}

impl<G: HeapGraph> HeapSnapshotAnalyzer<G> {
    pub fn from_graph(config: Config, graph: G) -> Result<Self> {
        config.validate()?;
        Ok(HeapSnapshotAnalyzer { config, graph })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn select_suspects(&self) -> SuspectSelection {
        select_suspects(&self.graph, &self.config)
    }

    /// One record per suspect, in selection order
    pub fn analyze(&self) -> Vec<SuspectRecord> {
        let selection = self.select_suspects();
        let locator = AccumulationLocator::new(&self.graph, &self.config);
        let records: Vec<SuspectRecord> = selection
            .suspects
            .iter()
            .map(|&suspect| {
                let point = locator.locate(suspect);
                debug!(
                    "Suspect {} @{}: accumulation point {} @{}{}",
                    self.graph.name(suspect),
                    self.graph.id(suspect),
                    self.graph.name(point.object),
                    self.graph.id(point.object),
                    if point.reached_max_depth {
                        " (reached maximum depth)"
                    } else {
                        ""
                    }
                );
                SuspectRecord::new(suspect, self.graph.retained_size(suspect), Some(point))
            })
            .collect();
        info!(
            "Found {} leak suspects in a heap of {} bytes",
            records.len(),
            self.graph.total_size()
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::graph::*;
    use crate::path::NoopLog;
    use crate::testutil::*;

    /// root -> (roots) -> n0 -> ... -> n4, retaining 1.0, 0.9, 0.8, 0.1 and
    /// 0.05 of n0, plus a small unrelated object under (roots)
    fn leaky_chain() -> (SnapshotGraph, Vec<NodeId>) {
        let mut g = TestGraph::new();
        let root = g.node(NodeType::Synthetic, "", 10000);
        let roots = g.node(NodeType::Synthetic, "(roots)", 10000);
        g.own(root, "roots", roots);
        let mut ids = vec![];
        let mut owner = roots;
        for (i, size) in [8000, 7200, 6400, 800, 400].into_iter().enumerate() {
            let n = g.object(&format!("Chain{}", i), size);
            g.own(owner, "next", n);
            ids.push(n);
            owner = n;
        }
        let small = g.object("Small", 100);
        g.own(roots, "small", small);
        (g.build(root), ids)
    }

    #[test]
    fn test_end_to_end_chain() {
        let (graph, ids) = leaky_chain();
        let analyzer = HeapSnapshotAnalyzer::from_graph(Config::default(), graph).unwrap();
        let records = analyzer.analyze();
        assert_eq!(records.len(), 1);
        let record = records[0];
        let graph = analyzer.graph();
        assert_eq!(graph.id(record.suspect), ids[0]);
        assert_eq!(record.suspect_retained, 8000);
        let point = record.accumulation_point.unwrap();
        assert_eq!(graph.id(point.object), ids[2]);
        assert!(!point.reached_max_depth);

        let path = record.leak_path(graph, &mut NoopLog);
        let path_ids: Vec<NodeId> = path.nodes().map(|n| graph.id(n)).collect();
        assert_eq!(path_ids, vec![ids[0], ids[1], ids[2], ids[3]]);
        assert_eq!(path.accumulation_point, Some(2));
        let unique: HashSet<NodeId> = path_ids.iter().copied().collect();
        assert_eq!(unique.len(), path_ids.len());
    }

    #[test]
    fn test_no_suspects_below_threshold() {
        let (graph, _) = leaky_chain();
        let config = Config::default().with_threshold_percent(90.0);
        let analyzer = HeapSnapshotAnalyzer::from_graph(config, graph).unwrap();
        assert!(analyzer.analyze().is_empty());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let (graph, _) = leaky_chain();
        let config = Config::default().with_big_drop_ratio(0.0);
        assert!(HeapSnapshotAnalyzer::from_graph(config, graph).is_err());
    }

    const SNAPSHOT: &str = concat!(
        r#"{"node": {"id": 1, "type": "synthetic", "retained_size": 1000}}"#,
        r#"{"node": {"id": 3, "type": "synthetic", "name": "(roots)", "retained_size": 1000, "dominator": 1}}"#,
        r#"{"node": {"id": 5, "type": "object", "name": "Leak", "self_size": 16, "retained_size": 600, "dominator": 3}}"#,
        r#"{"node": {"id": 7, "type": "array", "self_size": 500, "retained_size": 500, "dominator": 5}}"#,
        r#"{"edge": {"from": 1, "to": 3, "type": "element", "name": 1}}"#,
        r#"{"edge": {"from": 3, "to": 5, "type": "property", "name": "leak"}}"#,
        r#"{"edge": {"from": 5, "to": 7, "type": "property", "name": "items"}}"#,
    );

    #[test]
    fn test_load_chunks_and_stream_agree() {
        let chunks: Vec<&str> = SNAPSHOT
            .as_bytes()
            .chunks(13)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect();
        let from_chunks = HeapSnapshotAnalyzer::load_chunks(Config::default(), chunks).unwrap();
        let from_stream =
            HeapSnapshotAnalyzer::load_stream(Config::default(), SNAPSHOT.as_bytes(), 5).unwrap();
        let a = from_chunks.analyze();
        let b = from_stream.analyze();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        let graph = from_chunks.graph();
        assert_eq!(graph.name(a[0].suspect), "Leak");
        let point = a[0].accumulation_point.unwrap();
        assert_eq!(graph.id(point.object), NodeId(7));
        assert!(point.reached_max_depth);
    }
}
