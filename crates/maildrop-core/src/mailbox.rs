//! Mailbox directories: staged delivery and claim-based consumption
//!
//! Delivery writes the body under a hidden name and renames it into view, so
//! a receiver sees either nothing or the complete file. Consumption renames
//! the visible file to a hidden claim name before reading it, so two racing
//! receivers never return the same message.

use crate::error::TransportError;
use crate::message_id::{MessageId, EXTENSION};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Order in which visible message files are considered for receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiveOrder {
    /// Sort by file name, which is send order for generated identifiers
    #[default]
    Oldest,
    /// Whatever order the directory listing returns
    Listing,
}

impl std::str::FromStr for ReceiveOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oldest" => Ok(ReceiveOrder::Oldest),
            "listing" => Ok(ReceiveOrder::Listing),
            other => Err(format!("unknown receive order '{other}' (expected oldest or listing)")),
        }
    }
}

/// A directory that receives message files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    dir: PathBuf,
}

impl Mailbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Mailbox of `recipient`, a sibling of `base` (`base/../recipient`)
    pub fn for_recipient(base: &Path, recipient: &str) -> Result<Self, TransportError> {
        validate_recipient(recipient)?;
        let parent = match base.parent() {
            Some(p) if !p.as_os_str().is_empty() && base.file_name().is_some() => p.to_path_buf(),
            // ".", "..", "/" and bare names: let the filesystem resolve ".."
            _ => base.join(".."),
        };
        Ok(Self::new(parent.join(recipient)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `body` as a new message file and make it visible atomically
    ///
    /// The mailbox directory must already exist. With `sync` set, the staged
    /// file is flushed to disk before the rename and the directory after it.
    pub fn deliver(&self, id: MessageId, body: &str, sync: bool) -> Result<PathBuf, TransportError> {
        let staging_path = self.dir.join(id.staging_name());
        let final_path = self.dir.join(id.file_name());

        // An existing staging file belongs to another writer; leave it alone
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staging_path)
            .map_err(|e| TransportError::io(&staging_path, e))?;

        if let Err(e) = write_staged(&mut file, &staging_path, body, sync) {
            drop(file);
            remove_staging(&staging_path);
            return Err(e);
        }
        drop(file);

        if let Err(e) = fs::rename(&staging_path, &final_path) {
            remove_staging(&staging_path);
            return Err(TransportError::io(&final_path, e));
        }

        if sync {
            sync_dir(&self.dir)?;
        }

        debug!(path = %final_path.display(), bytes = body.len(), "delivered message");
        Ok(final_path)
    }

    /// Visible message files in receive order, without consuming them
    pub fn pending(&self, order: ReceiveOrder) -> Result<Vec<PathBuf>, TransportError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TransportError::io(&self.dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TransportError::io(&self.dir, e))?;
            let path = entry.path();
            let is_message = entry
                .file_name()
                .to_str()
                .is_some_and(is_visible_message_name);
            if is_message && path.is_file() {
                files.push(path);
            }
        }

        if order == ReceiveOrder::Oldest {
            // Generated ids in id order, then any hand-dropped files by name
            files.sort_by_cached_key(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let id = MessageId::from_file_name(&name);
                (id.is_none(), id, name)
            });
        }
        Ok(files)
    }

    /// Return claimed but unconsumed messages to the visible set
    ///
    /// A receiver that dies between claiming and deleting a message leaves a
    /// `.{name}.claimed` file behind that no receiver will pick up. Only call
    /// this while no receiver is active on the mailbox, or an in-flight claim
    /// will be delivered twice. Returns the number of messages revived.
    pub fn recover_claims(&self) -> Result<usize, TransportError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| TransportError::io(&self.dir, e))?;

        let mut revived = 0;
        for entry in entries {
            let entry = entry.map_err(|e| TransportError::io(&self.dir, e))?;
            let name = entry.file_name();
            let Some(original) = name.to_str().and_then(claimed_original_name) else {
                continue;
            };

            let target = self.dir.join(original);
            match fs::rename(entry.path(), &target) {
                Ok(()) => {
                    debug!(path = %target.display(), "revived claimed message");
                    revived += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(TransportError::io(entry.path(), e)),
            }
        }
        Ok(revived)
    }

    /// Consume the next message: claim it, read it, delete it
    ///
    /// Returns [`TransportError::NoMessage`] when nothing is available,
    /// including when every candidate was claimed by another receiver first.
    /// If the process dies after the claim, the message stays hidden until
    /// [`Mailbox::recover_claims`] runs.
    pub fn take_next(&self, order: ReceiveOrder) -> Result<String, TransportError> {
        for candidate in self.pending(order)? {
            let Some(claim_path) = claim_path_for(&candidate) else {
                continue;
            };

            match fs::rename(&candidate, &claim_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %candidate.display(), "message taken by another receiver");
                    continue;
                }
                Err(e) => return Err(TransportError::io(&candidate, e)),
            }

            let body = match fs::read_to_string(&claim_path) {
                Ok(body) => body,
                Err(e) => {
                    // Put it back so the message is not silently lost
                    if let Err(restore) = fs::rename(&claim_path, &candidate) {
                        warn!("Failed to restore claimed message {claim_path:?}: {restore}");
                    }
                    return Err(TransportError::io(&candidate, e));
                }
            };

            fs::remove_file(&claim_path).map_err(|e| TransportError::io(&claim_path, e))?;

            debug!(path = %candidate.display(), bytes = body.len(), "received message");
            return Ok(body);
        }

        Err(TransportError::NoMessage {
            mailbox: self.dir.clone(),
        })
    }
}

/// Matches `*.eml` the way a shell glob does: hidden names never match
pub fn is_visible_message_name(name: &str) -> bool {
    !name.starts_with('.')
        && name
            .strip_suffix(EXTENSION)
            .is_some_and(|stem| stem.ends_with('.'))
}

fn validate_recipient(name: &str) -> Result<(), TransportError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains(std::path::MAIN_SEPARATOR)
        || name.contains('\0');
    if invalid {
        return Err(TransportError::InvalidRecipient {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn claim_path_for(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    Some(path.with_file_name(format!(".{name}.claimed")))
}

/// `.{name}.claimed` -> `{name}`, for visible message names only
fn claimed_original_name(claimed: &str) -> Option<&str> {
    let original = claimed.strip_prefix('.')?.strip_suffix(".claimed")?;
    is_visible_message_name(original).then_some(original)
}

fn remove_staging(path: &Path) {
    if let Err(cleanup) = fs::remove_file(path) {
        if cleanup.kind() != ErrorKind::NotFound {
            warn!("Failed to remove staging file {path:?}: {cleanup}");
        }
    }
}

fn write_staged(file: &mut fs::File, path: &Path, body: &str, sync: bool) -> Result<(), TransportError> {
    file.write_all(body.as_bytes())
        .map_err(|e| TransportError::io(path, e))?;

    if sync {
        file.sync_all().map_err(|e| TransportError::io(path, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), TransportError> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| TransportError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), TransportError> {
    Ok(())
}
