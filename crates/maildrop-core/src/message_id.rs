//! Message identifiers and file naming
//!
//! An identifier is a 96-bit value rendered as 24 lowercase hex digits:
//!
//! ```text
//! 0018a3f2c4e1b000  7c21d9e4
//! |- ns since epoch -|- random -|
//! ```
//!
//! The timestamp prefix makes lexicographic filename order match send order;
//! the random suffix keeps two processes writing in the same nanosecond from
//! colliding. Within one process [`IdGenerator`] never issues the same
//! timestamp twice.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Extension of delivered message files
pub const EXTENSION: &str = "eml";

/// Number of hex digits in a rendered identifier
pub const ID_WIDTH: usize = 24;

/// A 96-bit message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u128);

impl MessageId {
    /// Build an identifier from a timestamp in nanoseconds and a suffix
    pub fn from_parts(ticks: u64, suffix: u32) -> Self {
        MessageId((u128::from(ticks) << 32) | u128::from(suffix))
    }

    /// Timestamp part (nanoseconds since the UNIX epoch)
    pub fn ticks(&self) -> u64 {
        (self.0 >> 32) as u64
    }

    /// Parse exactly 24 lowercase hex digits
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != ID_WIDTH
            || !s
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return None;
        }
        u128::from_str_radix(s, 16).ok().map(MessageId)
    }

    /// Recognize a delivered message file name (`{id}.eml`)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(EXTENSION)?.strip_suffix('.')?;
        Self::parse(stem)
    }

    /// Visible file name: `{id}.eml`
    pub fn file_name(&self) -> String {
        format!("{self}.{EXTENSION}")
    }

    /// Hidden file name used while the body is being written: `.{id}.eml`
    pub fn staging_name(&self) -> String {
        format!(".{self}.{EXTENSION}")
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:024x}", self.0)
    }
}

/// Issues identifiers with strictly increasing timestamps within a process
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Mutex<u64>,
}

static GLOBAL: IdGenerator = IdGenerator::new();

impl IdGenerator {
    pub const fn new() -> Self {
        Self {
            last: Mutex::new(0),
        }
    }

    /// Process-wide generator used by [`crate::Transport`]
    pub fn global() -> &'static IdGenerator {
        &GLOBAL
    }

    /// Generate the next identifier from the wall clock
    pub fn next_id(&self) -> MessageId {
        self.next_at(now_nanos())
    }

    /// Generate the next identifier as if the clock read `now` nanoseconds
    pub fn next_at(&self, now: u64) -> MessageId {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let ticks = if now > *last { now } else { *last + 1 };
        *last = ticks;
        MessageId::from_parts(ticks, rand::random::<u32>())
    }
}

fn now_nanos() -> u64 {
    // A clock before the epoch degrades to counter mode via `next_at`
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
