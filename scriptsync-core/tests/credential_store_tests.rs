//! Credential store error-distinction, atomic-write-safety and permission tests.

use assert_fs::prelude::*;
use chrono::{DateTime, Utc};
use predicates::prelude::predicate;
use scriptsync_core::{Credential, CredentialStore, StoreError};
use std::fs;

fn credential(expiry_ms: Option<i64>) -> Credential {
    Credential {
        access_token: "ya29.access".to_string(),
        refresh_token: "1//refresh".to_string(),
        expiry: expiry_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
        scope: Some("https://www.googleapis.com/auth/script.projects".to_string()),
        token_type: Some("Bearer".to_string()),
    }
}

// ---------------------------------------------------------------------------
// 1. Load error distinction
// ---------------------------------------------------------------------------

#[test]
fn load_missing_file_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CredentialStore::new(dir.path().join("token.json"));
    let err = store.load().unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("token.json"));
}

#[test]
fn load_garbage_returns_corrupt_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("token.json").write_str("{ not json").expect("write");
    let store = CredentialStore::new(dir.path().join("token.json"));
    let err = store.load().unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }), "got: {err}");
    assert!(err.to_string().contains("token.json"));
}

#[test]
fn load_json_without_access_token_is_corrupt() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    dir.child("token.json")
        .write_str(r#"{"refreshToken": "r"}"#)
        .expect("write");
    let store = CredentialStore::new(dir.path().join("token.json"));
    assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
}

// ---------------------------------------------------------------------------
// 2. Save
// ---------------------------------------------------------------------------

#[test]
fn save_then_load_preserves_fields() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CredentialStore::new(dir.path().join("token.json"));
    let cred = credential(Some(1_900_000_000_000));
    store.save(&cred).expect("save");
    assert_eq!(store.load().expect("load"), cred);
}

#[test]
fn save_writes_documented_json_keys() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CredentialStore::new(dir.path().join("token.json"));
    store.save(&credential(Some(1_900_000_000_000))).expect("save");

    dir.child("token.json")
        .assert(predicate::str::contains("\"accessToken\""))
        .assert(predicate::str::contains("\"refreshToken\""))
        .assert(predicate::str::contains("\"expiry\": 1900000000000"));
}

#[test]
fn save_cleans_up_tmp_file() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CredentialStore::new(dir.path().join("token.json"));
    store.save(&credential(None)).expect("save");
    assert!(!dir.path().join("token.json.tmp").exists());
}

#[test]
fn save_creates_parent_directories() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("secure").join("nested").join("token.json");
    let store = CredentialStore::new(&path);
    store.save(&credential(None)).expect("save");
    assert!(path.exists());
}

#[test]
fn save_overwrites_previous_record() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let store = CredentialStore::new(dir.path().join("token.json"));
    store.save(&credential(Some(1))).expect("first save");
    let mut updated = credential(Some(2));
    updated.access_token = "ya29.rotated".to_string();
    store.save(&updated).expect("second save");
    assert_eq!(store.load().expect("load").access_token, "ya29.rotated");
}

#[test]
#[cfg(unix)]
fn save_restricts_file_to_owner() {
    use std::os::unix::fs::PermissionsExt;

    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("token.json");
    fs::write(&path, "{}").expect("seed");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("chmod");

    CredentialStore::new(&path)
        .save(&credential(None))
        .expect("save");
    let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
    assert_eq!(mode, 0o600, "credential file must be owner read/write only");
}
