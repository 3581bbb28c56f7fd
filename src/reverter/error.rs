//! Error type for the reverter subsystem.

use std::path::PathBuf;

use thiserror::Error;

/// A single error kind for every failure the reverter detects, distinguished
/// by variant/message rather than by a hierarchy of error types.
#[derive(Debug, Error)]
pub enum ReverterError {
    /// Any I/O failure during capture, restore, or directory bookkeeping.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path was registered for creation but also appears (or is being
    /// added) as a backed-up path in the same checkpoint.
    #[error("{0} is registered as a new file and cannot also be backed up")]
    AlreadyRegisteredNew(PathBuf),

    /// `backup/` contains an entry that is neither the well-known
    /// in-progress directory nor a numeric checkpoint name.
    #[error("inconsistent backup directory: unexpected entry {0}")]
    InconsistentBackupDir(PathBuf),

    /// `rollback_checkpoints` was given a negative, non-numeric, or
    /// otherwise malformed count.
    #[error("invalid rollback count: {0}")]
    InvalidRollbackCount(String),

    /// `register_file_creation` was called with no paths, or with a
    /// malformed flag argument (e.g. a path where the `temporary` bool
    /// belongs — the historical foot-gun this variant exists to catch).
    #[error("register_file_creation requires a boolean flag and at least one path")]
    BadRegistration,

    /// An enhancement with no registered handler was requested.
    #[error("unsupported enhancement: {0}")]
    UnsupportedEnhancement(String),
}

impl ReverterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReverterError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReverterError>;
