//! Error types for mailbox transport operations

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while sending or receiving messages
#[derive(Error, Debug)]
pub enum TransportError {
    /// No message file is currently present in the mailbox
    #[error("No message available in {mailbox}")]
    NoMessage { mailbox: PathBuf },

    /// File I/O error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Recipient name cannot be used as a sibling directory name
    #[error("Invalid recipient name: {name:?}")]
    InvalidRecipient { name: String },

    /// Waiting for a message exceeded the configured deadline
    #[error("Timed out after {waited:?} waiting for a message in {mailbox}")]
    Timeout { mailbox: PathBuf, waited: Duration },
}

impl TransportError {
    /// True for the "nothing yet" condition that polling retries on
    pub fn is_no_message(&self) -> bool {
        matches!(self, TransportError::NoMessage { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransportError::Io {
            path: path.into(),
            source,
        }
    }
}
