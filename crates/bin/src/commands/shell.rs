//! Interactive command shell.
//!
//! Each input line is one command. Words are separated by whitespace; a word
//! in double quotes may contain spaces and the escapes `\n`, `\r`, `\t`, `\"`
//! and `\\`. Lines starting with `.` are shell meta-commands.

use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::Path,
};

use crate::{cli::Format, output, state};

type BoxError = Box<dyn std::error::Error>;

/// Run the shell until `.quit` or end of input, saving state after every command.
pub fn run(state_path: &Path, format: Format) -> Result<(), BoxError> {
    let (mut keyspace, mut host) = state::load(state_path)?;
    let interactive = io::stdin().is_terminal();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if interactive {
            print!("kvdoc> ");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let words = match split_words(&line) {
            Ok(words) => words,
            Err(message) => {
                output::print_error(&message, format);
                continue;
            }
        };
        let Some(first) = words.first() else {
            continue;
        };

        match first.as_str() {
            ".quit" | ".exit" => break,
            ".shadow" => match words.get(1) {
                Some(key) => output::print_shadow(key, host.shadow(key), format),
                None => output::print_error("usage: .shadow <key>", format),
            },
            ".keys" => {
                for (key, document) in keyspace.documents() {
                    println!("{key} ({} changes)", document.num_changes());
                }
            }
            meta if meta.starts_with('.') => {
                output::print_error(&format!("unknown shell command '{meta}'"), format);
            }
            _ => {
                if super::run_words(&mut keyspace, &mut host, &words, format) {
                    state::save(state_path, &keyspace, &host)?;
                }
            }
        }
    }
    Ok(())
}

/// Split a command line into words.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };
        let mut word = String::new();
        if first == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => word.push('\n'),
                        Some('r') => word.push('\r'),
                        Some('t') => word.push('\t'),
                        Some(other) => word.push(other),
                        None => return Err("unfinished escape at end of line".to_string()),
                    },
                    _ => word.push(c),
                }
            }
            if !closed {
                return Err("unbalanced quotes".to_string());
            }
            if chars.peek().is_some_and(|c| !c.is_whitespace()) {
                return Err("closing quote must be followed by a space".to_string());
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
        }
        words.push(word);
    }
    Ok(words)
}
