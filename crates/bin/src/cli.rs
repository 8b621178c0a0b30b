//! CLI argument definitions for the kvdoc binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Reply rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// redis-cli style lines
    Human,
    /// One JSON value per reply
    Json,
}

/// kvdoc: mergeable JSON-like documents behind a key-value command surface
#[derive(Parser, Debug)]
#[command(name = "kvdoc")]
#[command(about = "Run kvdoc document commands against a local state file")]
#[command(version)]
pub struct Cli {
    /// State file holding documents, index configuration and shadow records
    #[arg(short, long, default_value = "kvdoc-state.json", env = "KVDOC_STATE", global = true)]
    pub state: PathBuf,

    /// Output format for replies
    #[arg(short, long, default_value = "human", global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read commands from stdin, one per line (the default)
    Shell,
    /// Run a single command, e.g. `kvdoc exec PUTTEXT doc title "Hello"`
    Exec(ExecArgs),
}

/// Arguments for the exec command
#[derive(clap::Args, Debug)]
pub struct ExecArgs {
    /// Command name followed by its arguments; LOAD/APPLY payloads are base64
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true, trailing_var_arg = true)]
    pub args: Vec<String>,
}
