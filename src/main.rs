//! splitrun CLI: split input, run a program on every chunk in parallel, merge in order.

use anyhow::Result;
use clap::Parser;
use splitrun::engine::arg_parser::Cli;
use splitrun::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
