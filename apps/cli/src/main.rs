//! asrskit CLI — ASRS incident extraction and HFACS classification.
//!
//! Turns printable ASRS HTML exports into JSON records and enriches them with
//! HFACS classifications from a remote model.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
