//! locpipe CLI: count lines of code under a directory; --files for per-file records.

use anyhow::Result;
use clap::Parser;
use locpipe::engine::arg_parser::Cli;
use locpipe::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
