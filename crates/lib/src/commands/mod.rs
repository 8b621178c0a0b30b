//! The command surface a key-value server exposes for document values.
//!
//! A [`Keyspace`] owns the documents stored under each key together with the
//! shadow index configuration, and executes one command per call. Commands
//! are argument vectors in the usual server shape: the name, then the key,
//! then command specific arguments. Names are case-insensitive and may carry
//! an `AM.` prefix, so `AM.PUTTEXT`, `puttext` and `PutText` are the same
//! command.
//!
//! Every successful mutation:
//!
//! 1. publishes the produced change on `changes:<key>` as raw bytes,
//! 2. replicates the command as received,
//! 3. emits the keyspace event `am.<command>` for the key,
//! 4. re-projects the key's shadow record when an enabled index matches it.
//!
//! `LOAD` and `APPLY` replay existing history, so they only replicate and
//! emit the event.
//! Shadow projection never fails a command: errors are logged and dropped.

mod errors;
mod host;

use std::collections::BTreeMap;

pub use errors::CommandError;
pub use host::{Host, MemoryHost};

use crate::{
    Change, ChangeHash, Document,
    constants::{COMMAND_PREFIX, changes_channel},
    index::{self, IndexRegistry},
};

/// A reply to a client.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Null,
    Integer(i64),
    Double(f64),
    Bulk(String),
    Binary(Vec<u8>),
    Array(Vec<Reply>),
}

type CommandResult = std::result::Result<Reply, CommandError>;

/// Documents by key plus the shadow index registry.
#[derive(Debug, Default)]
pub struct Keyspace {
    documents: BTreeMap<String, Document>,
    indexes: IndexRegistry,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted index registry.
    pub fn with_indexes(indexes: IndexRegistry) -> Self {
        Self {
            documents: BTreeMap::new(),
            indexes,
        }
    }

    pub fn indexes(&self) -> &IndexRegistry {
        &self.indexes
    }

    pub fn document(&self, key: &str) -> Option<&Document> {
        self.documents.get(key)
    }

    /// Store `document` under `key` without any side effects.
    pub fn insert(&mut self, key: impl Into<String>, document: Document) -> Option<Document> {
        self.documents.insert(key.into(), document)
    }

    pub fn remove(&mut self, key: &str) -> Option<Document> {
        self.documents.remove(key)
    }

    pub fn documents(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.documents.iter().map(|(key, doc)| (key.as_str(), doc))
    }

    /// Execute one command.
    pub fn execute<A: AsRef<[u8]>>(&mut self, host: &mut dyn Host, argv: &[A]) -> CommandResult {
        let values: Vec<&[u8]> = argv.iter().map(AsRef::as_ref).collect();
        let Some((name, rest)) = values.split_first() else {
            return Err(CommandError::UnknownCommand {
                name: String::new(),
            });
        };
        let lowered = utf8(name, "command")?.to_ascii_lowercase();
        let command = lowered.strip_prefix(COMMAND_PREFIX).unwrap_or(&lowered);
        let args = Args {
            command,
            values: rest,
        };
        tracing::debug!(command, args = rest.len(), "execute");

        match command {
            "new" => self.new_document(host, &args),
            "load" => self.load(host, &args),
            "save" => {
                args.exact(1)?;
                Ok(Reply::Binary(self.get(args.text(0, "key")?)?.save()?))
            }
            "fromjson" => self.from_json(host, &args),
            "tojson" => {
                args.between(1, 2)?;
                let pretty = match args.values.len() {
                    2 if args.text(1, "pretty flag")?.eq_ignore_ascii_case("pretty") => true,
                    2 => args.boolean(1)?,
                    _ => false,
                };
                Ok(Reply::Bulk(self.get(args.text(0, "key")?)?.to_json(pretty)?))
            }

            "puttext" => {
                args.exact(3)?;
                let value = args.text(2, "value")?;
                self.mutate(host, &args, |doc, path| doc.put_text(path, value))
            }
            "putint" => {
                args.exact(3)?;
                let value = args.int(2)?;
                self.mutate(host, &args, |doc, path| doc.put_int(path, value))
            }
            "putdouble" => {
                args.exact(3)?;
                let value = args.double(2)?;
                self.mutate(host, &args, |doc, path| doc.put_double(path, value))
            }
            "putbool" => {
                args.exact(3)?;
                let value = args.boolean(2)?;
                self.mutate(host, &args, |doc, path| doc.put_bool(path, value))
            }
            "putcounter" => {
                args.exact(3)?;
                let value = args.int(2)?;
                self.mutate(host, &args, |doc, path| doc.put_counter(path, value))
            }
            "inccounter" => {
                args.exact(3)?;
                let delta = args.int(2)?;
                self.mutate(host, &args, |doc, path| doc.inc_counter(path, delta))
            }
            "puttimestamp" => {
                args.exact(3)?;
                let value = args.int(2)?;
                self.mutate(host, &args, |doc, path| doc.put_timestamp(path, value))
            }
            "createlist" => {
                args.exact(2)?;
                self.mutate(host, &args, |doc, path| doc.create_list(path))
            }
            "appendtext" => {
                args.exact(3)?;
                let value = args.text(2, "value")?;
                self.mutate(host, &args, |doc, path| doc.append_text(path, value))
            }
            "appendint" => {
                args.exact(3)?;
                let value = args.int(2)?;
                self.mutate(host, &args, |doc, path| doc.append_int(path, value))
            }
            "appenddouble" => {
                args.exact(3)?;
                let value = args.double(2)?;
                self.mutate(host, &args, |doc, path| doc.append_double(path, value))
            }
            "appendbool" => {
                args.exact(3)?;
                let value = args.boolean(2)?;
                self.mutate(host, &args, |doc, path| doc.append_bool(path, value))
            }
            "putdiff" => {
                args.exact(3)?;
                let diff = args.text(2, "diff")?;
                self.mutate(host, &args, |doc, path| doc.put_diff(path, diff))
            }
            "splicetext" => {
                args.exact(5)?;
                let pos = args.count(2, "position")?;
                let del = args.count(3, "delete count")?;
                let insert = args.text(4, "text")?;
                self.mutate(host, &args, |doc, path| doc.splice_text(path, pos, del, insert))
            }

            "gettext" => self.read(&args, |doc, path| {
                Ok(doc.get_text(path)?.map(Reply::Bulk))
            }),
            "getint" => self.read(&args, |doc, path| {
                Ok(doc.get_int(path)?.map(Reply::Integer))
            }),
            "getdouble" => self.read(&args, |doc, path| {
                Ok(doc.get_double(path)?.map(Reply::Double))
            }),
            "getbool" => self.read(&args, |doc, path| {
                Ok(doc.get_bool(path)?.map(|v| Reply::Integer(i64::from(v))))
            }),
            "getcounter" => self.read(&args, |doc, path| {
                Ok(doc.get_counter(path)?.map(Reply::Integer))
            }),
            "gettimestamp" => self.read(&args, |doc, path| {
                Ok(doc.get_timestamp(path)?.map(Reply::Integer))
            }),
            "listlen" => self.read(&args, |doc, path| {
                Ok(doc.list_len(path)?.map(len_reply))
            }),
            "maplen" => self.read(&args, |doc, path| {
                Ok(doc.map_len(path)?.map(len_reply))
            }),

            "changes" => {
                args.at_least(1)?;
                let mut have = Vec::with_capacity(args.values.len() - 1);
                for index in 1..args.values.len() {
                    let hash = args.text(index, "change hash")?;
                    have.push(
                        hash.parse::<ChangeHash>()
                            .map_err(|e| CommandError::invalid("change hash", e.to_string()))?,
                    );
                }
                let changes = self.get(args.text(0, "key")?)?.changes(&have)?;
                Ok(Reply::Array(
                    changes
                        .into_iter()
                        .map(|change| Reply::Binary(change.bytes().to_vec()))
                        .collect(),
                ))
            }
            "numchanges" => {
                args.exact(1)?;
                Ok(len_reply(self.get(args.text(0, "key")?)?.num_changes()))
            }
            "apply" => self.apply(host, &args),

            "index.configure" => {
                args.at_least(2)?;
                let pattern = args.text(0, "pattern")?;
                let paths = (1..args.values.len())
                    .map(|index| args.text(index, "path"))
                    .collect::<Result<Vec<_>, _>>()?;
                self.indexes.configure(pattern, paths)?;
                Ok(Reply::Ok)
            }
            "index.enable" => {
                args.exact(1)?;
                self.indexes.enable(args.text(0, "pattern")?)?;
                Ok(Reply::Ok)
            }
            "index.disable" => {
                args.exact(1)?;
                self.indexes.disable(args.text(0, "pattern")?)?;
                Ok(Reply::Ok)
            }
            "index.status" => {
                args.exact(1)?;
                let status = self.indexes.status(args.text(0, "pattern")?);
                Ok(status.map_or(Reply::Null, |config| {
                    Reply::Array(vec![
                        Reply::Bulk("pattern".to_string()),
                        Reply::Bulk(config.pattern.clone()),
                        Reply::Bulk("enabled".to_string()),
                        Reply::Integer(i64::from(config.enabled)),
                        Reply::Bulk("paths".to_string()),
                        Reply::Array(config.paths.iter().cloned().map(Reply::Bulk).collect()),
                    ])
                }))
            }
            "index.reindex" => {
                args.exact(1)?;
                let key = args.text(0, "key")?;
                self.get(key)?;
                Ok(Reply::Integer(i64::from(self.project(host, key)?)))
            }

            _ => Err(CommandError::UnknownCommand {
                name: command.to_string(),
            }),
        }
    }

    fn get(&self, key: &str) -> Result<&Document, CommandError> {
        self.documents
            .get(key)
            .ok_or_else(|| CommandError::NoSuchKey {
                key: key.to_string(),
            })
    }

    fn new_document(&mut self, host: &mut dyn Host, args: &Args<'_>) -> CommandResult {
        args.exact(1)?;
        let key = args.text(0, "key")?;
        self.documents.insert(key.to_string(), Document::new());
        tracing::info!(key, "created document");
        replicate(host, args);
        notify(host, args.command, key);
        self.project_quietly(host, key);
        Ok(Reply::Ok)
    }

    fn load(&mut self, host: &mut dyn Host, args: &Args<'_>) -> CommandResult {
        args.exact(2)?;
        let key = args.text(0, "key")?;
        let document = Document::load(args.values[1])?;
        self.documents.insert(key.to_string(), document);
        replicate(host, args);
        notify(host, args.command, key);
        Ok(Reply::Ok)
    }

    fn from_json(&mut self, host: &mut dyn Host, args: &Args<'_>) -> CommandResult {
        args.exact(2)?;
        let key = args.text(0, "key")?;
        let document = Document::from_json(args.text(1, "json")?)?;
        let channel = changes_channel(key);
        for change in document.all_changes() {
            host.publish(&channel, change.bytes());
        }
        self.documents.insert(key.to_string(), document);
        replicate(host, args);
        notify(host, args.command, key);
        self.project_quietly(host, key);
        Ok(Reply::Ok)
    }

    fn apply(&mut self, host: &mut dyn Host, args: &Args<'_>) -> CommandResult {
        args.at_least(2)?;
        let key = args.text(0, "key")?;
        let document = self
            .documents
            .get_mut(key)
            .ok_or_else(|| CommandError::NoSuchKey {
                key: key.to_string(),
            })?;
        let records = &args.values[1..];
        let report = document.apply_encoded(records.iter().map(|record| record.to_vec()));
        tracing::debug!(
            key,
            applied = report.applied.len(),
            duplicates = report.duplicates,
            rejected = report.rejected.len(),
            "applied changes"
        );
        if !report.applied.is_empty() {
            replicate(host, args);
            notify(host, args.command, key);
        }
        match report.rejected.first() {
            None => Ok(Reply::Ok),
            Some((index, err)) => Err(CommandError::ApplyRejected {
                rejected: report.rejected.len(),
                total: records.len(),
                first: format!("change {index}: {err}"),
            }),
        }
    }

    /// Run a mutation against the document at `args[0]`, with `args[1]` as path.
    fn mutate<F>(&mut self, host: &mut dyn Host, args: &Args<'_>, edit: F) -> CommandResult
    where
        F: FnOnce(&mut Document, &str) -> crate::Result<Change>,
    {
        let key = args.text(0, "key")?;
        let path = args.text(1, "path")?;
        let document = self
            .documents
            .get_mut(key)
            .ok_or_else(|| CommandError::NoSuchKey {
                key: key.to_string(),
            })?;
        let change = edit(document, path)?;
        tracing::debug!(
            command = args.command,
            key,
            hash = %change.hash(),
            ops = change.len(),
            "mutated document"
        );
        host.publish(&changes_channel(key), change.bytes());
        replicate(host, args);
        notify(host, args.command, key);
        self.project_quietly(host, key);
        Ok(Reply::Ok)
    }

    /// Run a read against the document at `args[0]`, with `args[1]` as path.
    fn read<F>(&self, args: &Args<'_>, lookup: F) -> CommandResult
    where
        F: FnOnce(&Document, &str) -> crate::Result<Option<Reply>>,
    {
        args.exact(2)?;
        let document = self.get(args.text(0, "key")?)?;
        Ok(lookup(document, args.text(1, "path")?)?.unwrap_or(Reply::Null))
    }

    /// Write the shadow record for `key` if an enabled index matches it.
    fn project(&self, host: &mut dyn Host, key: &str) -> Result<bool, CommandError> {
        let Some(config) = self.indexes.matching(key) else {
            return Ok(false);
        };
        let record = index::project(self.get(key)?, config)?;
        host.write_shadow(key, &record)?;
        tracing::debug!(key, pattern = %config.pattern, fields = record.len(), "projected shadow record");
        Ok(true)
    }

    fn project_quietly(&self, host: &mut dyn Host, key: &str) {
        if let Err(err) = self.project(host, key) {
            tracing::warn!(key, error = %err, "shadow projection failed");
        }
    }
}

fn replicate(host: &mut dyn Host, args: &Args<'_>) {
    host.replicate(&format!("{COMMAND_PREFIX}{}", args.command), args.values);
}

fn notify(host: &mut dyn Host, command: &str, key: &str) {
    host.notify_keyspace_event(&format!("{COMMAND_PREFIX}{command}"), key);
}

fn len_reply(len: usize) -> Reply {
    Reply::Integer(i64::try_from(len).unwrap_or(i64::MAX))
}

fn utf8<'a>(value: &'a [u8], name: &'static str) -> Result<&'a str, CommandError> {
    std::str::from_utf8(value).map_err(|_| CommandError::invalid(name, "must be utf-8"))
}

/// The arguments after the command name.
struct Args<'a> {
    command: &'a str,
    values: &'a [&'a [u8]],
}

impl Args<'_> {
    fn exact(&self, n: usize) -> Result<(), CommandError> {
        self.between(n, n)
    }

    fn at_least(&self, n: usize) -> Result<(), CommandError> {
        self.between(n, usize::MAX)
    }

    fn between(&self, min: usize, max: usize) -> Result<(), CommandError> {
        if (min..=max).contains(&self.values.len()) {
            Ok(())
        } else {
            Err(CommandError::WrongArity {
                command: self.command.to_string(),
            })
        }
    }

    fn text(&self, index: usize, name: &'static str) -> Result<&str, CommandError> {
        match self.values.get(index) {
            Some(value) => utf8(value, name),
            None => Err(CommandError::WrongArity {
                command: self.command.to_string(),
            }),
        }
    }

    fn int(&self, index: usize) -> Result<i64, CommandError> {
        let text = self.text(index, "integer")?;
        text.trim()
            .parse()
            .map_err(|_| CommandError::invalid("integer", format!("'{text}' is not an integer")))
    }

    fn double(&self, index: usize) -> Result<f64, CommandError> {
        let text = self.text(index, "double")?;
        text.trim()
            .parse()
            .map_err(|_| CommandError::invalid("double", format!("'{text}' is not a number")))
    }

    fn count(&self, index: usize, name: &'static str) -> Result<usize, CommandError> {
        let text = self.text(index, name)?;
        text.trim()
            .parse()
            .map_err(|_| CommandError::invalid(name, format!("'{text}' is not a non-negative integer")))
    }

    fn boolean(&self, index: usize) -> Result<bool, CommandError> {
        let text = self.text(index, "boolean")?;
        match text.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(CommandError::invalid("boolean", "value must be true/false or 1/0")),
        }
    }
}
