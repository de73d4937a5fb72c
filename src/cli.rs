use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal to-do manager CLI.
/// Data lives in ~/.todo or a directory passed via --data-dir.
#[derive(Parser)]
#[command(name = "todo", version, about = "Personal task manager CLI")]
pub struct Cli {
    /// Directory holding the JSON data files.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
