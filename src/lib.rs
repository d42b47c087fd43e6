#[macro_use]
extern crate log;

pub mod accumulation;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod constants;
pub mod format;
pub mod graph;
pub mod ingest;
pub mod path;
pub mod record;
pub mod report;
pub mod snapshot;
pub mod suspect;
pub mod tokenizer;

#[cfg(test)]
mod testutil;

pub use crate::accumulation::{AccumulationLocator, AccumulationPoint};
pub use crate::analyzer::HeapSnapshotAnalyzer;
pub use crate::config::Config;
pub use crate::format::{describe_node, format_size};
pub use crate::graph::{
    EdgeLabel, EdgeName, EdgeRef, EdgeType, HeapGraph, HeapNode, NodeId, NodeKind, NodeOrdinal,
    NodeType,
};
pub use crate::ingest::{load_file, load_stream, SnapshotLoader};
pub use crate::path::{reconstruct_path, LeakPath, LeakPathEntry, LogPathLog, NoopLog, PathLog};
pub use crate::record::SuspectRecord;
pub use crate::report::SuspectReport;
pub use crate::snapshot::{SnapshotBuilder, SnapshotGraph};
pub use crate::suspect::{select_suspects, SuspectSelection};
pub use crate::tokenizer::StreamTokenizer;
