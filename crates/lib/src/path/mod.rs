//! Path expressions for addressing nodes inside a document.
//!
//! A path is a sequence of [`PathSegment`]s. The text form separates map keys
//! with `.` and addresses list elements with `[N]` suffixes:
//!
//! ```rust
//! use kvdoc::path::{Path, PathSegment};
//!
//! let path = Path::parse("$.users[2].name")?;
//! assert_eq!(
//!     path.segments(),
//!     &[
//!         PathSegment::Key("users".into()),
//!         PathSegment::Index(2),
//!         PathSegment::Key("name".into()),
//!     ]
//! );
//! assert_eq!(path.to_string(), "users[2].name");
//! # Ok::<(), kvdoc::path::PathError>(())
//! ```
//!
//! A leading `$.` (or a lone `$`) is accepted for JSONPath familiarity and
//! ignored. Empty components produced by stray dots are dropped, so
//! `"a..b"`, `".a.b"` and `"a.b."` all name the same node as `"a.b"`.
//! The empty string and `"$"` name the root map.

mod errors;
pub(crate) mod resolve;

use std::{fmt, str::FromStr};

pub use errors::PathError;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Member of a map.
    Key(String),
    /// Visible position in a list.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The path naming the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path expression.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let body = strip_root_marker(input);
        let base = input.len() - body.len();
        let mut segments = Vec::new();
        let mut key = String::new();
        // Set right after a `]`; the next character must start a new segment.
        let mut after_index = false;
        let mut chars = body.char_indices();

        while let Some((offset, ch)) = chars.next() {
            match ch {
                '.' => {
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    after_index = false;
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(inner);
                    }
                    if !closed {
                        return Err(PathError::UnclosedBracket {
                            path: input.to_string(),
                            offset: base + offset,
                        });
                    }
                    let index = parse_index(&digits).ok_or_else(|| PathError::InvalidIndex {
                        path: input.to_string(),
                        index: digits.clone(),
                    })?;
                    segments.push(PathSegment::Index(index));
                    after_index = true;
                }
                ']' => {
                    return Err(PathError::UnexpectedBracket {
                        path: input.to_string(),
                        offset: base + offset,
                    });
                }
                _ => {
                    if after_index {
                        return Err(PathError::MissingSeparator {
                            path: input.to_string(),
                            offset: base + offset,
                        });
                    }
                    key.push(ch);
                }
            }
        }
        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }
        Ok(Self { segments })
    }

    /// The segments in order from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this path names the root.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Splits off the final segment, if any.
    pub fn split_last(&self) -> Option<(&PathSegment, &[PathSegment])> {
        self.segments.split_last()
    }

    /// Append a map key segment.
    pub fn push_key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append a list index segment.
    pub fn push_index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, PathSegment::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

fn strip_root_marker(input: &str) -> &str {
    if let Some(rest) = input.strip_prefix("$.") {
        rest
    } else if input == "$" {
        ""
    } else {
        input
    }
}

fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
