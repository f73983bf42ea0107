//! Persistence tests for PKI identity and root secrets
//!
//! These tests verify behavior across manager open/reopen cycles against one
//! secrets directory, simulating server restarts.

use chrono::{TimeZone, Utc};
use std::fs;
use tempfile::tempdir;
use timelock_core::{codec, KeyManager, PkiOptions, TimelockError};
use uuid::Uuid;

fn options(name: &str, id: Option<Uuid>) -> PkiOptions {
    PkiOptions {
        name: Some(name.into()),
        id,
        min_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        max_time: Utc.with_ymd_and_hms(2049, 12, 31, 23, 59, 59).unwrap(),
    }
}

#[test]
fn restart_returns_identical_public_keys() {
    let dir = tempdir().unwrap();
    let t = Utc.with_ymd_and_hms(2024, 9, 1, 23, 29, 33).unwrap();

    let first = KeyManager::open(options("Restart Test", None), dir.path()).unwrap();
    let pem_before = codec::encode_public_key_pem(&first.key_for_time(t).unwrap().public_key()).unwrap();
    drop(first);

    let second = KeyManager::open(options("Restart Test", None), dir.path()).unwrap();
    let pem_after = codec::encode_public_key_pem(&second.key_for_time(t).unwrap().public_key()).unwrap();

    assert_eq!(pem_before, pem_after);
}

#[test]
fn conflicting_name_fails_second_start() {
    let dir = tempdir().unwrap();

    KeyManager::open(options("First Name", None), dir.path()).unwrap();
    let err = KeyManager::open(options("Second Name", None), dir.path()).unwrap_err();
    assert!(matches!(err, TimelockError::ConfigConflict { .. }));
}

#[test]
fn conflicting_id_fails_second_start() {
    let dir = tempdir().unwrap();

    KeyManager::open(options("Stable", Some(Uuid::new_v4())), dir.path()).unwrap();
    let err = KeyManager::open(options("Stable", Some(Uuid::new_v4())), dir.path()).unwrap_err();
    assert!(matches!(err, TimelockError::ConfigConflict { .. }));
}

#[test]
fn pinned_id_is_adopted_and_persisted() {
    let dir = tempdir().unwrap();
    let id = Uuid::new_v4();

    let manager = KeyManager::open(options("Pinned", Some(id)), dir.path()).unwrap();
    assert_eq!(manager.pki_id(), id);

    // A later start without the option adopts the persisted value.
    let manager = KeyManager::open(options("Pinned", None), dir.path()).unwrap();
    assert_eq!(manager.pki_id(), id);
}

#[test]
fn identity_files_are_newline_terminated() {
    let dir = tempdir().unwrap();
    let manager = KeyManager::open(options("Newline Check", None), dir.path()).unwrap();

    let name = fs::read_to_string(dir.path().join("name")).unwrap();
    let uuid = fs::read_to_string(dir.path().join("uuid")).unwrap();
    assert_eq!(name, "Newline Check\n");
    assert_eq!(uuid, format!("{}\n", manager.pki_id()));
}

#[test]
fn corrupted_secret_file_surfaces_as_error() {
    let dir = tempdir().unwrap();
    let t = Utc.with_ymd_and_hms(2024, 9, 1, 23, 29, 33).unwrap();

    let manager = KeyManager::open(options("Corruption", None), dir.path()).unwrap();
    manager.key_for_time(t).unwrap();

    // Truncate the secret behind the manager's back.
    let path = dir.path().join("2024-09-01@23.00.00");
    let mut perms = fs::metadata(&path).unwrap().permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(0o600);
    }
    #[cfg(not(unix))]
    perms.set_readonly(false);
    fs::set_permissions(&path, perms).unwrap();
    fs::write(&path, [1u8; 7]).unwrap();

    let err = manager.key_for_time(t).unwrap_err();
    assert!(matches!(err, TimelockError::CorruptSecret { found: 7, .. }));
}
