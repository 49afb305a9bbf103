use clap::Parser;
use housing_pipeline::cli::{cmd_train, TrainArgs};

fn main() -> anyhow::Result<()> {
    let args = TrainArgs::parse();
    cmd_train(&args)
}
