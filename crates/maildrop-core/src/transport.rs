//! Send and receive operations
//!
//! The free functions [`send`], [`recv_once`] and [`wait_and_recv`] work
//! relative to the process working directory with default settings. A
//! [`Transport`] does the same relative to an explicit directory and carries
//! its own polling, ordering and durability settings.

use crate::config::Config;
use crate::error::TransportError;
use crate::mailbox::{Mailbox, ReceiveOrder};
use crate::message_id::IdGenerator;
use crate::poll::PollPolicy;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Messaging endpoint rooted at one working directory
///
/// The directory is this endpoint's own mailbox; recipients are its siblings.
#[derive(Debug, Clone)]
pub struct Transport {
    home: PathBuf,
    policy: PollPolicy,
    order: ReceiveOrder,
    sync: bool,
}

impl Transport {
    /// Endpoint rooted at `home` with default settings
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            policy: PollPolicy::default(),
            order: ReceiveOrder::default(),
            sync: false,
        }
    }

    /// Endpoint rooted at the process working directory
    pub fn from_current_dir() -> Result<Self, TransportError> {
        let cwd = std::env::current_dir().map_err(|e| TransportError::io(".", e))?;
        Ok(Self::new(cwd))
    }

    /// Endpoint rooted at `home` using resolved configuration
    pub fn from_config(home: impl Into<PathBuf>, config: &Config) -> Self {
        Self::new(home)
            .with_policy(config.polling.policy())
            .with_order(config.receive.order)
            .with_sync(config.delivery.sync)
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_order(mut self, order: ReceiveOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// This endpoint's own mailbox
    pub fn mailbox(&self) -> Mailbox {
        Mailbox::new(&self.home)
    }

    /// Deliver `body` to the sibling mailbox named `recipient`
    ///
    /// Returns the path of the delivered file. The mailbox must exist; a
    /// failed delivery is not retried.
    pub fn send(&self, recipient: &str, body: &str) -> Result<PathBuf, TransportError> {
        let mailbox = Mailbox::for_recipient(&self.home, recipient)?;
        let id = IdGenerator::global().next_id();
        debug!(recipient, id = %id, "sending message");
        mailbox.deliver(id, body, self.sync)
    }

    /// Take the next message from this endpoint's mailbox, if any
    pub fn recv_once(&self) -> Result<String, TransportError> {
        self.mailbox().take_next(self.order)
    }

    /// Block until a message arrives, following the polling policy
    pub fn wait_and_recv(&self) -> Result<String, TransportError> {
        let mailbox = self.mailbox();
        self.policy
            .run(mailbox.dir(), || mailbox.take_next(self.order))
    }

    /// Delivered but unconsumed messages, in receive order
    pub fn pending(&self) -> Result<Vec<PathBuf>, TransportError> {
        self.mailbox().pending(self.order)
    }
}

/// Send `body` to `../recipient` relative to the working directory
pub fn send(recipient: &str, body: &str) -> Result<(), TransportError> {
    Transport::from_current_dir()?.send(recipient, body)?;
    Ok(())
}

/// Take the next message from the working directory
///
/// Fails with [`TransportError::NoMessage`] when the mailbox is empty.
pub fn recv_once() -> Result<String, TransportError> {
    Transport::from_current_dir()?.recv_once()
}

/// Wait for and take the next message from the working directory
///
/// Checks once per second with no deadline; other errors end the wait.
pub fn wait_and_recv() -> Result<String, TransportError> {
    Transport::from_current_dir()?.wait_and_recv()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup_pair() -> (TempDir, Transport, Transport) {
        let temp_dir = TempDir::new().unwrap();
        let alice = temp_dir.path().join("alice");
        let bob = temp_dir.path().join("bob");
        fs::create_dir_all(&alice).unwrap();
        fs::create_dir_all(&bob).unwrap();
        (temp_dir, Transport::new(alice), Transport::new(bob))
    }

    fn eml_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "eml"))
            .collect()
    }

    #[test]
    fn test_send_hello_to_bob() {
        let (_temp_dir, alice, bob) = setup_pair();

        let path = alice.send("bob", "hello").unwrap();

        let files = eml_files(bob.home());
        assert_eq!(files, vec![path.clone()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        assert_eq!(bob.recv_once().unwrap(), "hello");
        assert!(fs::read_dir(bob.home()).unwrap().next().is_none());
    }

    #[test]
    fn test_body_preserved_exactly() {
        let (_temp_dir, alice, bob) = setup_pair();
        let body = "  line one\r\nline two\t\n\nüñíçødé 📬\n";

        alice.send("bob", body).unwrap();

        assert_eq!(bob.recv_once().unwrap(), body);
    }

    #[test]
    fn test_empty_body() {
        let (_temp_dir, alice, bob) = setup_pair();

        alice.send("bob", "").unwrap();

        assert_eq!(bob.recv_once().unwrap(), "");
        assert!(bob.recv_once().unwrap_err().is_no_message());
    }

    #[test]
    fn test_recv_once_empty_is_no_message() {
        let (_temp_dir, _alice, bob) = setup_pair();

        let err = bob.recv_once().unwrap_err();
        assert!(err.is_no_message());
    }

    #[test]
    fn test_send_to_missing_mailbox_is_io_error() {
        let (_temp_dir, alice, _bob) = setup_pair();

        let err = alice.send("carol", "anyone?").unwrap_err();
        assert!(matches!(err, TransportError::Io { .. }));
    }

    #[test]
    fn test_send_rejects_path_like_recipient() {
        let (_temp_dir, alice, _bob) = setup_pair();

        let err = alice.send("../bob", "sneaky").unwrap_err();
        assert!(matches!(err, TransportError::InvalidRecipient { .. }));
    }

    #[test]
    fn test_quick_succession_distinct_and_ordered() {
        let (_temp_dir, alice, bob) = setup_pair();

        let first = alice.send("bob", "one").unwrap();
        let second = alice.send("bob", "two").unwrap();

        assert_ne!(first, second);
        assert_eq!(eml_files(bob.home()).len(), 2);
        assert_eq!(bob.recv_once().unwrap(), "one");
        assert_eq!(bob.recv_once().unwrap(), "two");
    }

    #[test]
    fn test_self_send_via_own_name() {
        let (_temp_dir, alice, _bob) = setup_pair();

        alice.send("alice", "note to self").unwrap();

        assert_eq!(alice.recv_once().unwrap(), "note to self");
    }

    #[test]
    fn test_wait_and_recv_picks_up_late_message() {
        let (_temp_dir, alice, bob) = setup_pair();
        let bob = bob.with_policy(
            PollPolicy::fixed(Duration::from_millis(50)).with_timeout(Duration::from_secs(10)),
        );

        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            alice.send("bob", "late arrival").unwrap();
        });

        assert_eq!(bob.wait_and_recv().unwrap(), "late arrival");
        sender.join().unwrap();
    }

    #[test]
    fn test_wait_and_recv_default_policy_picks_up_message() {
        let (_temp_dir, alice, bob) = setup_pair();

        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(1200));
            alice.send("bob", "after a second").unwrap();
        });

        assert_eq!(bob.wait_and_recv().unwrap(), "after a second");
        sender.join().unwrap();
    }

    #[test]
    fn test_wait_and_recv_times_out() {
        let (_temp_dir, _alice, bob) = setup_pair();
        let bob = bob.with_policy(
            PollPolicy::fixed(Duration::from_millis(20)).with_timeout(Duration::from_millis(150)),
        );

        let err = bob.wait_and_recv().unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }));
    }

    #[test]
    fn test_wait_and_recv_propagates_missing_mailbox() {
        let temp_dir = TempDir::new().unwrap();
        let ghost = Transport::new(temp_dir.path().join("ghost"))
            .with_policy(PollPolicy::fixed(Duration::from_millis(10)));

        let err = ghost.wait_and_recv().unwrap_err();
        assert!(matches!(err, TransportError::Io { .. }));
    }

    #[test]
    fn test_from_config_applies_settings() {
        let mut config = Config::default();
        config.polling.interval_ms = 25;
        config.polling.timeout_secs = Some(2);
        config.receive.order = ReceiveOrder::Listing;
        config.delivery.sync = true;

        let transport = Transport::from_config("/tmp/x", &config);

        assert_eq!(transport.policy().interval, Duration::from_millis(25));
        assert_eq!(transport.policy().timeout, Some(Duration::from_secs(2)));
        assert_eq!(transport.order, ReceiveOrder::Listing);
        assert!(transport.sync);
    }
}
