#[macro_use]
extern crate log;

use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use heapleak::cli::{Args, OutputFormat};
use heapleak::*;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.config();
    config.validate()?;

    for path in &args.paths {
        let start = Instant::now();
        let graph = load_file(path, args.chunk_size)?;
        info!(
            "Finish loading {} in {} ms",
            path,
            start.elapsed().as_micros() as f64 / 1000f64
        );
        let analyzer = HeapSnapshotAnalyzer::from_graph(config, graph)?;
        let records = analyzer.analyze();
        let graph = analyzer.graph();
        match args.format {
            OutputFormat::Text => {
                for (i, record) in records.iter().enumerate() {
                    info!("Leak suspect #{} in {}", i + 1, path);
                    record.log_path(graph);
                }
            }
            OutputFormat::Json => {
                let reports: Vec<SuspectReport> =
                    records.iter().map(|r| r.report(graph, true)).collect();
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
    }
    Ok(())
}
