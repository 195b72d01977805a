//! Postdex CLI: `index` posts into documents, `score` documents against a query.

use anyhow::Result;
use clap::Parser;
use postdex::engine::arg_parser::Cli;
use postdex::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
