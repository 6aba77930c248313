//! Tests for the working-directory based `send` / `recv_once` / `wait_and_recv`
//!
//! Every test changes the process working directory, so all of them run
//! serially and restore the original directory afterwards.

use maildrop_core::{recv_once, send, wait_and_recv, TransportError};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Restores the working directory on drop, even if the test panics
struct CwdGuard {
    original: PathBuf,
}

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let original = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        Self { original }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.original);
    }
}

fn setup_harness() -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let alice = temp_dir.path().join("alice");
    let bob = temp_dir.path().join("bob");
    fs::create_dir_all(&alice).unwrap();
    fs::create_dir_all(&bob).unwrap();
    (temp_dir, alice, bob)
}

fn eml_names(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".eml"))
        .collect()
}

#[test]
#[serial]
fn test_send_then_recv_from_sibling_dirs() {
    let (_temp_dir, alice, bob) = setup_harness();

    {
        let _cwd = CwdGuard::enter(&alice);
        send("bob", "hello").unwrap();
    }

    let names = eml_names(&bob);
    assert_eq!(names.len(), 1);
    let name = &names[0];
    assert_eq!(name.len(), 24 + ".eml".len());
    assert!(name[..24].bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
    assert_eq!(fs::read_to_string(bob.join(name)).unwrap(), "hello");

    {
        let _cwd = CwdGuard::enter(&bob);
        assert_eq!(recv_once().unwrap(), "hello");
    }

    assert!(fs::read_dir(&bob).unwrap().next().is_none());
}

#[test]
#[serial]
fn test_recv_once_empty_mailbox() {
    let (_temp_dir, _alice, bob) = setup_harness();
    let _cwd = CwdGuard::enter(&bob);

    match recv_once() {
        Err(TransportError::NoMessage { .. }) => {}
        other => panic!("expected NoMessage, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_send_to_missing_mailbox_fails() {
    let (_temp_dir, alice, _bob) = setup_harness();
    let _cwd = CwdGuard::enter(&alice);

    let err = send("nobody", "hello?").unwrap_err();
    assert!(matches!(err, TransportError::Io { .. }));
    assert!(!err.is_no_message());
}

#[test]
#[serial]
fn test_messages_received_in_send_order() {
    let (_temp_dir, alice, bob) = setup_harness();

    {
        let _cwd = CwdGuard::enter(&alice);
        for i in 0..10 {
            send("bob", &format!("message {i}")).unwrap();
        }
    }
    assert_eq!(eml_names(&bob).len(), 10);

    let _cwd = CwdGuard::enter(&bob);
    for i in 0..10 {
        assert_eq!(recv_once().unwrap(), format!("message {i}"));
    }
    assert!(recv_once().unwrap_err().is_no_message());
}

#[test]
#[serial]
fn test_wait_and_recv_gets_message_sent_later() {
    let (_temp_dir, _alice, bob) = setup_harness();
    let bob_for_sender = bob.clone();

    // The sender writes into bob's directory directly, as another process would
    let sender = thread::spawn(move || {
        thread::sleep(Duration::from_millis(1500));
        let staged = bob_for_sender.join(".0000000000000000000000ff.eml");
        fs::write(&staged, "eventually").unwrap();
        fs::rename(&staged, bob_for_sender.join("0000000000000000000000ff.eml")).unwrap();
    });

    let _cwd = CwdGuard::enter(&bob);
    let start = Instant::now();
    assert_eq!(wait_and_recv().unwrap(), "eventually");
    assert!(start.elapsed() < Duration::from_secs(10));

    sender.join().unwrap();
}
