//! One-shot command execution.

use std::path::Path;

use crate::{cli::ExecArgs, cli::Format, state};

/// Run the exec command. State is written back only when the command succeeds.
pub fn run(args: &ExecArgs, state_path: &Path, format: Format) -> Result<bool, Box<dyn std::error::Error>> {
    let (mut keyspace, mut host) = state::load(state_path)?;
    let ok = super::run_words(&mut keyspace, &mut host, &args.args, format);
    if ok {
        state::save(state_path, &keyspace, &host)?;
    }
    Ok(ok)
}
