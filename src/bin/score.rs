use clap::Parser;
use housing_pipeline::cli::{cmd_score, ScoreArgs};

fn main() -> anyhow::Result<()> {
    let args = ScoreArgs::parse();
    cmd_score(&args)
}
