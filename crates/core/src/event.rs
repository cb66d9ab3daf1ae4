//! Change notification types shared by the notifier and the coordinator

use std::fmt;
use std::path::PathBuf;
use tokio::time::Instant;

/// Kind of change reported for the watched path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// File content written
    Write,
    /// File created
    Create,
    /// File deleted
    Remove,
    /// File renamed or moved
    Rename,
    /// Permissions or other metadata changed
    Chmod,
    /// Anything the backend could not classify
    Other,
}

impl OpKind {
    /// Only content writes are replicated
    pub fn is_write(self) -> bool {
        matches!(self, OpKind::Write)
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Write => "WRITE",
            OpKind::Create => "CREATE",
            OpKind::Remove => "REMOVE",
            OpKind::Rename => "RENAME",
            OpKind::Chmod => "CHMOD",
            OpKind::Other => "OTHER",
        };
        f.write_str(name)
    }
}

/// One notification for the watched path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: OpKind,
    /// When the notifier observed the change
    pub observed_at: Instant,
}

impl ChangeEvent {
    /// Create an event stamped with the current instant
    pub fn now(path: impl Into<PathBuf>, kind: OpKind) -> Self {
        Self::at(path, kind, Instant::now())
    }

    pub fn at(path: impl Into<PathBuf>, kind: OpKind, observed_at: Instant) -> Self {
        Self {
            path: path.into(),
            kind,
            observed_at,
        }
    }
}
