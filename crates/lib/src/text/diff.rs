//! Unified diff parsing and replay.
//!
//! Parsing is a small state machine over the diff's lines: anything before
//! the first `@@` header (file names, `diff --git`, `index` lines) is skipped,
//! then each header opens a hunk that collects context, removed and added
//! lines until its declared line counts are met. A `\ No newline at end of
//! file` marker strips the newline from the line before it.
//!
//! Replay checks every hunk's old lines against the current text and turns
//! each run of removed/added lines into one [`Splice`]. Nothing is applied
//! here; a stale hunk fails the whole diff before any edit is made.

use super::{Splice, TextError};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HunkLine {
    Context(String),
    Remove(String),
    Add(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    fn old_seen(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| !matches!(line, HunkLine::Add(_)))
            .count()
    }

    fn new_seen(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| !matches!(line, HunkLine::Remove(_)))
            .count()
    }

    fn is_complete(&self) -> bool {
        self.old_seen() == self.old_len && self.new_seen() == self.new_len
    }
}

enum State {
    Scanning,
    InHunk(Hunk),
}

/// Split a unified diff into hunks.
pub(crate) fn parse(diff: &str) -> Result<Vec<Hunk>, TextError> {
    let mut hunks = Vec::new();
    let mut state = State::Scanning;

    let mut number = 0;

    // Only `\n` ends a line; a `\r` before it belongs to the line's content.
    for line in diff.split_inclusive('\n') {
        number += 1;
        let line = line.strip_suffix('\n').unwrap_or(line);
        state = match state {
            State::Scanning => {
                if line.starts_with("@@") {
                    State::InHunk(parse_header(line, number)?)
                } else {
                    State::Scanning
                }
            }
            State::InHunk(mut hunk) => {
                if let Some(marker) = line.strip_prefix('\\') {
                    strip_last_newline(&mut hunk, number, marker)?;
                    State::InHunk(hunk)
                } else if line.starts_with("@@") {
                    finish(hunk, number, &mut hunks)?;
                    State::InHunk(parse_header(line, number)?)
                } else if hunk.is_complete() {
                    // Trailing text after a finished hunk, e.g. the next file's header.
                    finish(hunk, number, &mut hunks)?;
                    State::Scanning
                } else {
                    let entry = match line.chars().next() {
                        None => HunkLine::Context("\n".to_string()),
                        Some(' ') => HunkLine::Context(format!("{}\n", &line[1..])),
                        Some('-') => HunkLine::Remove(format!("{}\n", &line[1..])),
                        Some('+') => HunkLine::Add(format!("{}\n", &line[1..])),
                        Some(other) => {
                            return Err(TextError::MalformedDiff {
                                line: number,
                                reason: format!("unexpected line prefix '{other}' inside hunk"),
                            });
                        }
                    };
                    hunk.lines.push(entry);
                    if hunk.old_seen() > hunk.old_len || hunk.new_seen() > hunk.new_len {
                        return Err(TextError::MalformedDiff {
                            line: number,
                            reason: "hunk is longer than its header declares".to_string(),
                        });
                    }
                    State::InHunk(hunk)
                }
            }
        };
    }

    if let State::InHunk(hunk) = state {
        finish(hunk, number + 1, &mut hunks)?;
    }
    Ok(hunks)
}

fn finish(hunk: Hunk, line: usize, hunks: &mut Vec<Hunk>) -> Result<(), TextError> {
    if !hunk.is_complete() {
        return Err(TextError::MalformedDiff {
            line,
            reason: format!(
                "hunk @@ -{},{} +{},{} @@ ends after {} old and {} new lines",
                hunk.old_start,
                hunk.old_len,
                hunk.new_start,
                hunk.new_len,
                hunk.old_seen(),
                hunk.new_seen()
            ),
        });
    }
    hunks.push(hunk);
    Ok(())
}

fn strip_last_newline(hunk: &mut Hunk, line: usize, marker: &str) -> Result<(), TextError> {
    let last = match hunk.lines.last_mut() {
        Some(HunkLine::Context(text) | HunkLine::Remove(text) | HunkLine::Add(text)) => text,
        None => {
            return Err(TextError::MalformedDiff {
                line,
                reason: format!("'\\{marker}' marker before any hunk line"),
            });
        }
    };
    if last.ends_with('\n') {
        last.pop();
    }
    Ok(())
}

fn parse_header(line: &str, number: usize) -> Result<Hunk, TextError> {
    let malformed = |reason: &str| TextError::MalformedDiff {
        line: number,
        reason: format!("{reason} in hunk header '{line}'"),
    };
    let body = line
        .strip_prefix("@@ ")
        .and_then(|rest| rest.split_once(" @@"))
        .map(|(ranges, _section)| ranges)
        .ok_or_else(|| malformed("missing '@@' delimiters"))?;
    let mut parts = body.split_whitespace();
    let old = parts
        .next()
        .and_then(|part| part.strip_prefix('-'))
        .ok_or_else(|| malformed("missing old range"))?;
    let new = parts
        .next()
        .and_then(|part| part.strip_prefix('+'))
        .ok_or_else(|| malformed("missing new range"))?;
    if parts.next().is_some() {
        return Err(malformed("unexpected text"));
    }
    let (old_start, old_len) = parse_range(old).ok_or_else(|| malformed("bad old range"))?;
    let (new_start, new_len) = parse_range(new).ok_or_else(|| malformed("bad new range"))?;
    if old_start == 0 && old_len > 0 {
        return Err(malformed("old range starts at line 0"));
    }
    Ok(Hunk {
        old_start,
        old_len,
        new_start,
        new_len,
        lines: Vec::new(),
    })
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Check `hunks` against `text` and compute the splices that apply them in order.
///
/// Splice positions account for the splices before them, so they can be
/// applied one after the other to the evolving text.
///
/// A final text line without a newline also matches a diff line that has
/// one. The text then keeps ending without a newline: whatever replaces that
/// line, or is added after it, drops its own trailing newline.
pub(crate) fn replay(text: &str, hunks: &[Hunk]) -> Result<Vec<Splice>, TextError> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut starts = Vec::with_capacity(lines.len() + 1);
    let mut offset = 0;
    for line in &lines {
        starts.push(offset);
        offset += line.chars().count();
    }
    starts.push(offset);

    let open_tail = !text.is_empty() && !text.ends_with('\n');
    let mut splices = Vec::new();
    // Characters inserted minus characters deleted so far.
    let mut shift: isize = 0;
    let mut floor = 0;

    for (number, hunk) in hunks.iter().enumerate() {
        let number = number + 1;
        let mismatch = |reason: String| TextError::HunkMismatch {
            hunk: number,
            reason,
        };
        let mut index = if hunk.old_len == 0 {
            hunk.old_start
        } else {
            hunk.old_start - 1
        };
        if index < floor {
            return Err(mismatch("overlaps the previous hunk".to_string()));
        }
        match index.checked_add(hunk.old_len) {
            Some(end) if end <= lines.len() => {}
            Some(end) => {
                return Err(mismatch(format!(
                    "old range ends at line {end} but the text has {} lines",
                    lines.len()
                )));
            }
            None => {
                return Err(mismatch(format!(
                    "old range starting at line {} is out of bounds",
                    hunk.old_start
                )));
            }
        }

        // Set once the unterminated last line matched a line that has a newline.
        let mut tail_matched_loosely = false;
        let mut run: Option<Splice> = None;
        for entry in &hunk.lines {
            match entry {
                HunkLine::Context(expected) => {
                    tail_matched_loosely |=
                        expect_line(&lines, index, expected, open_tail).map_err(&mismatch)?;
                    if let Some(done) = run.take() {
                        shift += done.insert.chars().count() as isize - done.del as isize;
                        splices.push(done);
                    }
                    index += 1;
                }
                HunkLine::Remove(expected) => {
                    tail_matched_loosely |=
                        expect_line(&lines, index, expected, open_tail).map_err(&mismatch)?;
                    let pos = (starts[index] as isize + shift) as usize;
                    run.get_or_insert_with(|| Splice::at(pos)).del += lines[index].chars().count();
                    index += 1;
                }
                HunkLine::Add(added) => {
                    let pos = (starts[index] as isize + shift) as usize;
                    run.get_or_insert_with(|| Splice::at(pos))
                        .insert
                        .push_str(added);
                }
            }
        }
        if let Some(mut done) = run.take() {
            if open_tail && index == lines.len() {
                if done.del == 0 {
                    done.insert.insert(0, '\n');
                }
                if tail_matched_loosely && done.insert.ends_with('\n') {
                    done.insert.pop();
                }
            }
            shift += done.insert.chars().count() as isize - done.del as isize;
            splices.push(done);
        }
        floor = index;
    }
    Ok(splices)
}

/// Compare text line `index` with a diff line.
///
/// Returns whether the match only held because `open_tail` lets the last
/// line ignore the diff line's trailing newline.
fn expect_line(
    lines: &[&str],
    index: usize,
    expected: &str,
    open_tail: bool,
) -> Result<bool, String> {
    match lines.get(index) {
        Some(actual) if *actual == expected => Ok(false),
        Some(actual)
            if open_tail
                && index + 1 == lines.len()
                && expected.strip_suffix('\n') == Some(*actual) =>
        {
            Ok(true)
        }
        Some(actual) => Err(format!(
            "line {} is {:?}, diff expects {:?}",
            index + 1,
            actual,
            expected
        )),
        None => Err(format!("line {} is past the end of the text", index + 1)),
    }
}
