use crate::accumulation::AccumulationPoint;
use crate::graph::*;
use crate::path::*;
use crate::report::SuspectReport;

/// A suspect and the accumulation point found beneath it
///
/// Records hold no reference to the graph. The leak path is recomputed from
/// the graph whenever it is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuspectRecord {
    pub suspect: NodeOrdinal,
    pub suspect_retained: u64,
    pub accumulation_point: Option<AccumulationPoint>,
}

impl SuspectRecord {
    pub fn new(
        suspect: NodeOrdinal,
        suspect_retained: u64,
        accumulation_point: Option<AccumulationPoint>,
    ) -> Self {
        SuspectRecord {
            suspect,
            suspect_retained,
            accumulation_point,
        }
    }

    pub fn leak_path<G: HeapGraph>(&self, graph: &G, log: &mut dyn PathLog) -> LeakPath {
        reconstruct_path(
            graph,
            self.suspect,
            self.accumulation_point.as_ref(),
            log,
        )
    }

    /// Print the leak path through the `log` facade
    pub fn log_path<G: HeapGraph>(&self, graph: &G) -> LeakPath {
        self.leak_path(graph, &mut LogPathLog)
    }

    pub fn report<G: HeapGraph>(&self, graph: &G, with_path: bool) -> SuspectReport {
        let path = with_path.then(|| self.leak_path(graph, &mut NoopLog));
        SuspectReport::new(graph, self, path.as_ref())
    }
}
