use clap::Parser;
use housing_pipeline::cli::{cmd_ingest, IngestArgs};

fn main() -> anyhow::Result<()> {
    let args = IngestArgs::parse();
    cmd_ingest(&args)
}
