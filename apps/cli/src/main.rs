//! bmad-convert CLI: converts a BMAD installation into the agent and skill
//! file conventions of opencode, Claude Code, or the generic `.agents` layout.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
