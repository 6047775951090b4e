//! Error type definitions for lmb

use crate::reader::SourceLoc;
use std::error::Error as StdError;
use std::fmt;

/// What went wrong.
///
/// Only `UnresolvedIdentifier` and `Syntax` are user errors. `Internal`
/// signals a broken invariant inside the compiler or evaluator and `Io` a
/// failing host stream; both end the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Free names of a top-level statement that no global binds
    UnresolvedIdentifier { names: Vec<String> },
    /// Front end rejected the token stream
    Syntax { message: String },
    /// Compiler or evaluator invariant violation
    Internal { message: String },
    /// Host bit source or sink failed
    Io { message: String },
}

/// An error with an optional source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LError {
    pub kind: ErrorKind,
    pub location: Option<SourceLoc>,
}

/// Result alias used throughout the crate
pub type LResult<T> = Result<T, LError>;

impl LError {
    pub fn new(kind: ErrorKind) -> Self {
        LError {
            kind,
            location: None,
        }
    }

    /// Attach a source location (keeps an existing one)
    pub fn with_location(mut self, loc: SourceLoc) -> Self {
        if self.location.is_none() {
            self.location = Some(loc);
        }
        self
    }

    /// Fatal errors abort the whole run; the rest only skip one statement.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::Internal { .. } | ErrorKind::Io { .. })
    }

    pub fn description(&self) -> String {
        let body = match &self.kind {
            ErrorKind::UnresolvedIdentifier { names } => {
                let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
                format!(
                    "Reference error: unresolved identifier{} {}",
                    if names.len() == 1 { "" } else { "s" },
                    quoted.join(", ")
                )
            }
            ErrorKind::Syntax { message } => format!("Syntax error: {}", message),
            ErrorKind::Internal { message } => format!("Internal error: {}", message),
            ErrorKind::Io { message } => format!("I/O error: {}", message),
        };
        match &self.location {
            Some(loc) => format!("{} (at {})", body, loc),
            None => body,
        }
    }
}

impl fmt::Display for LError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl StdError for LError {}

impl From<std::io::Error> for LError {
    fn from(err: std::io::Error) -> Self {
        LError::io(err.to_string())
    }
}
