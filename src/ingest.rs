use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::graph::*;
use crate::snapshot::{SnapshotBuilder, SnapshotGraph};
use crate::tokenizer::StreamTokenizer;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
struct MetaRecord {
    root: NodeId,
    #[serde(default)]
    total_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    name: String,
    #[serde(default)]
    self_size: u64,
    retained_size: u64,
    #[serde(default)]
    dominator: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    from: NodeId,
    to: NodeId,
    #[serde(rename = "type")]
    edge_type: EdgeType,
    name: EdgeLabel,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Record {
    Meta(MetaRecord),
    Node(NodeRecord),
    Edge(EdgeRecord),
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

fn apply(builder: &mut SnapshotBuilder, value: &str) -> Result<()> {
    let record: Record = serde_json::from_str(value.trim_start_matches(is_separator))?;
    match record {
        Record::Meta(meta) => {
            builder.set_root(meta.root);
            if let Some(total_size) = meta.total_size {
                builder.set_total_size(total_size);
            }
        }
        Record::Node(node) => {
            builder.add_node(
                node.id,
                node.node_type,
                &node.name,
                node.self_size,
                node.retained_size,
            )?;
            if let Some(dominator) = node.dominator {
                builder.set_dominator(node.id, dominator)?;
            }
        }
        Record::Edge(edge) => {
            builder.add_edge(edge.from, edge.edge_type, edge.name, edge.to)?;
        }
    }
    Ok(())
}

/// Builds a [`SnapshotGraph`] from a record stream pushed in chunks
///
/// Records are decoded as soon as the tokenizer closes them, so memory use is
/// bounded by the graph itself plus one partial record.
#[derive(Debug, Default)]
pub struct SnapshotLoader {
    tokenizer: StreamTokenizer,
    builder: SnapshotBuilder,
    /// Trailing bytes of an incomplete UTF-8 sequence
    pending: Vec<u8>,
    bytes: usize,
    chunks: usize,
    records: usize,
}

impl SnapshotLoader {
    pub fn new() -> Self {
        SnapshotLoader {
            tokenizer: StreamTokenizer::new(true),
            ..Default::default()
        }
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Feed raw bytes, which may end in the middle of a UTF-8 sequence
    pub fn write_bytes(&mut self, chunk: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(chunk);
        let valid_len = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => bail!(
                "Snapshot is not valid UTF-8 at byte {}",
                self.bytes + e.valid_up_to()
            ),
        };
        let rest = self.pending.split_off(valid_len);
        let text = String::from_utf8(std::mem::replace(&mut self.pending, rest))?;
        self.write(&text)
    }

    /// Feed one chunk of text, decoding every record it completes
    pub fn write(&mut self, chunk: &str) -> Result<()> {
        let SnapshotLoader {
            tokenizer,
            builder,
            records,
            ..
        } = self;
        let mut error = None;
        let balanced = tokenizer.write(chunk, |value| {
            if error.is_some() {
                return;
            }
            match apply(builder, value) {
                Ok(()) => *records += 1,
                Err(e) => error = Some(e),
            }
        });
        self.bytes += chunk.len();
        self.chunks += 1;
        if let Some(e) = error {
            return Err(e.context(format!("Bad record #{}", self.records + 1)));
        }
        if !balanced {
            bail!(
                "Malformed snapshot: unbalanced value near byte {}",
                self.bytes - self.tokenizer.remainder().len()
            );
        }
        trace!(
            "Chunk #{}: {} bytes, {} records so far",
            self.chunks,
            chunk.len(),
            self.records
        );
        Ok(())
    }

    pub fn finish(self) -> Result<SnapshotGraph> {
        if !self.pending.is_empty() {
            bail!("Snapshot ends inside a UTF-8 sequence");
        }
        let rest = self.tokenizer.remainder();
        if self.tokenizer.in_value() || !rest.trim_matches(is_separator).is_empty() {
            bail!(
                "Snapshot ends with an unterminated value ({} bytes)",
                rest.len()
            );
        }
        debug!(
            "Read {} records in {} chunks ({} bytes)",
            self.records, self.chunks, self.bytes
        );
        let graph = self
            .builder
            .build()
            .context("Failed to build snapshot graph")?;
        info!(
            "Loaded snapshot with {} nodes, {} edges, total size {}",
            graph.node_count(),
            graph.edge_count(),
            graph.total_size()
        );
        Ok(graph)
    }
}

/// Drain `reader` in chunks of `chunk_size` bytes into a graph
pub fn load_stream<R: Read>(mut reader: R, chunk_size: usize) -> Result<SnapshotGraph> {
    let mut loader = SnapshotLoader::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("Failed to read snapshot"),
        };
        loader.write_bytes(&buf[..n])?;
    }
    loader.finish()
}

/// Load a snapshot file, decompressing it first if it ends in `.zst`
pub fn load_file(path: impl AsRef<Path>, chunk_size: usize) -> Result<SnapshotGraph> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let graph = if path.extension().map_or(false, |ext| ext == "zst") {
        load_stream(zstd::Decoder::new(file)?, chunk_size)
    } else {
        load_stream(file, chunk_size)
    };
    graph.with_context(|| format!("Failed to load {}", path.display()))
}
