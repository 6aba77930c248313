//! Core library for maildrop (directory mailboxes for test fixtures)
//!
//! A mailbox is a plain directory. Senders drop one `{id}.eml` file per
//! message into the recipient's directory; receivers take the next file out of
//! their own directory, reading and deleting it.
//!
//! Layout is relative to the process working directory: the mailbox of
//! recipient `bob` is `../bob`, and a receiver's working directory is its own
//! mailbox.
//!
//! ```text
//! harness/
//!   alice/                     <- alice runs here, receives from "."
//!   bob/                       <- bob's mailbox
//!     .00181f...a3c9.eml       (being written, invisible)
//!     00181f...77e0.eml        (delivered)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use maildrop_core::{recv_once, send};
//!
//! // From alice's directory
//! send("bob", "hello").unwrap();
//!
//! // From bob's directory
//! let body = recv_once().unwrap();
//! assert_eq!(body, "hello");
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod mailbox;
pub mod message_id;
pub mod poll;
pub mod transport;

pub use error::TransportError;
pub use mailbox::{Mailbox, ReceiveOrder};
pub use message_id::{IdGenerator, MessageId};
pub use poll::PollPolicy;
pub use transport::{recv_once, send, wait_and_recv, Transport};
