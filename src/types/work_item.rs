// ABOUTME: Opaque identifier for one unit of batch work.
// ABOUTME: Holds a remote image hash or a local file path; meaning is up to the operation.

use std::fmt;

/// One identifier flowing from a scanner to the worker pool.
///
/// The pool never interprets the value. A copy operation reads it as an
/// image hash, an upload operation as a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkItem(String);

impl WorkItem {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkItem {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for WorkItem {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for WorkItem {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
