//! Subcommands and the glue they share.

pub mod exec;
pub mod shell;

use base64ct::{Base64, Encoding};
use kvdoc::{
    commands::{Keyspace, MemoryHost, Reply},
    constants::COMMAND_PREFIX,
};

use crate::{cli::Format, output};

/// Turn command words into an argument vector.
///
/// The payload arguments of LOAD and APPLY are binary, so they are given as
/// base64 and decoded here.
pub fn to_argv(words: &[String]) -> Result<Vec<Vec<u8>>, String> {
    let Some(name) = words.first() else {
        return Ok(Vec::new());
    };
    let lowered = name.to_ascii_lowercase();
    let binary_from = match lowered.strip_prefix(COMMAND_PREFIX).unwrap_or(&lowered) {
        "load" | "apply" => 2,
        _ => usize::MAX,
    };
    words
        .iter()
        .enumerate()
        .map(|(index, word)| {
            if index >= binary_from {
                Base64::decode_vec(word).map_err(|e| format!("argument {index} is not base64: {e}"))
            } else {
                Ok(word.as_bytes().to_vec())
            }
        })
        .collect()
}

/// Run one command and print its reply. Returns whether it succeeded.
pub fn run_words(
    keyspace: &mut Keyspace,
    host: &mut MemoryHost,
    words: &[String],
    format: Format,
) -> bool {
    let argv = match to_argv(words) {
        Ok(argv) => argv,
        Err(message) => {
            output::print_error(&message, format);
            return false;
        }
    };
    let result = keyspace.execute(host, argv.as_slice());
    report_side_effects(host);
    match result {
        Ok(reply) => {
            output::print_reply(&reply, format);
            true
        }
        Err(err) => {
            output::print_error(&err.to_string(), format);
            false
        }
    }
}

/// Log what a real server would have sent to its clients.
fn report_side_effects(host: &mut MemoryHost) {
    let (events, messages) = host.drain();
    for (command, argv) in host.take_replicated() {
        tracing::debug!(%command, args = argv.len(), "replicated");
    }
    for (event, key) in events {
        tracing::info!(%event, %key, "keyspace event");
    }
    for (channel, payload) in messages {
        tracing::info!(
            %channel,
            change = %output::human(&Reply::Binary(payload)),
            "published"
        );
    }
}
