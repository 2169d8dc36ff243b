//! Credential store for the relay.
//!
//! Registered nicknames and their password digests live in a single JSON
//! file. The whole map is held in memory behind a mutex and rewritten to
//! disk after every successful registration, so a restart only loses
//! sessions, never accounts.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use tracing::{error, info, warn};

mod models;
mod paths;

pub use models::CredentialRecord;
pub use paths::default_store_path;

pub struct CredentialStore {
    path: PathBuf,
    users: Mutex<HashMap<String, CredentialRecord>>,
}

impl CredentialStore {
    /// Opens the store at `path`, creating the file if it does not exist.
    ///
    /// A store that exists but cannot be parsed is treated as empty rather
    /// than fatal: the relay must come up even if the snapshot was mangled
    /// by hand. The damage is logged and the next registration overwrites
    /// the bad file.
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {}", parent.display()))?;
        }
        let users = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, CredentialRecord>>(&raw) {
                Ok(users) => {
                    info!("loaded {} credential record(s) from {}", users.len(), path.display());
                    users
                }
                Err(e) => {
                    warn!("credential store {} is unreadable ({e}), starting empty", path.display());
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no credential store at {}, creating one", path.display());
                let users = HashMap::new();
                if let Err(e) = write_snapshot(&path, &users) {
                    warn!("could not create credential store {}: {e:#}", path.display());
                }
                users
            }
            Err(e) => {
                warn!("cannot read credential store {} ({e}), starting empty", path.display());
                HashMap::new()
            }
        };
        Ok(Self { path, users: Mutex::new(users) })
    }

    /// Records a new nickname. Returns `Ok(false)` if the nickname is
    /// already taken; the stored digest is never replaced.
    ///
    /// Persistence is best effort. A registration that cannot be flushed
    /// to disk still succeeds in memory and the failure is logged, so a
    /// full disk degrades durability instead of taking the relay down.
    pub fn register(&self, nickname: &str, password_hash: &str) -> Result<bool> {
        let mut users = self.lock()?;
        if users.contains_key(nickname) {
            return Ok(false);
        }
        users.insert(
            nickname.to_string(),
            CredentialRecord { password_hash: password_hash.to_string(), created_at: Utc::now() },
        );
        self.persist(&users);
        Ok(true)
    }

    /// Checks a nickname/digest pair against the store. Unknown nicknames
    /// and wrong digests are the same `false`; callers cannot distinguish
    /// them.
    pub fn verify(&self, nickname: &str, password_hash: &str) -> Result<bool> {
        let users = self.lock()?;
        Ok(users.get(nickname).is_some_and(|rec| rec.password_hash == password_hash))
    }

    pub fn is_registered(&self, nickname: &str) -> Result<bool> {
        let users = self.lock()?;
        Ok(users.contains_key(nickname))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, CredentialRecord>>> {
        self.users.lock().map_err(|e| anyhow!("credential store lock poisoned: {e}"))
    }

    fn persist(&self, users: &HashMap<String, CredentialRecord>) {
        if let Err(e) = write_snapshot(&self.path, users) {
            error!("failed to persist credential store {}: {e:#}", self.path.display());
            let fallback = paths::emergency_snapshot_path();
            match write_snapshot(&fallback, users) {
                Ok(()) => warn!("credential snapshot diverted to {}", fallback.display()),
                Err(e) => error!("emergency credential snapshot failed: {e:#}"),
            }
        }
    }
}

/// Writes the full map to a sibling temp file, then renames it over the
/// target, so readers never observe a half-written snapshot.
fn write_snapshot(path: &Path, users: &HashMap<String, CredentialRecord>) -> Result<()> {
    let json = serde_json::to_string_pretty(users).context("serializing credential store")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("renaming {} into place", tmp.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("piazza_store_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir.join("users.json")
    }

    #[test]
    fn open_creates_missing_store() {
        let path = test_store("create");
        let store = CredentialStore::open(path.clone()).unwrap();
        assert!(path.exists());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn register_rejects_duplicate_and_keeps_first_digest() {
        let store = CredentialStore::open(test_store("dup")).unwrap();
        assert!(store.register("alice", "digest-one").unwrap());
        assert!(!store.register("alice", "digest-two").unwrap());
        assert!(store.verify("alice", "digest-one").unwrap());
        assert!(!store.verify("alice", "digest-two").unwrap());
    }

    #[test]
    fn verify_unknown_nickname_is_false() {
        let store = CredentialStore::open(test_store("unknown")).unwrap();
        assert!(!store.verify("nobody", "digest").unwrap());
        assert!(!store.is_registered("nobody").unwrap());
    }

    #[test]
    fn registrations_survive_reopen() {
        let path = test_store("reload");
        {
            let store = CredentialStore::open(path.clone()).unwrap();
            store.register("alice", "digest").unwrap();
        }
        let store = CredentialStore::open(path).unwrap();
        assert!(store.is_registered("alice").unwrap());
        assert!(store.verify("alice", "digest").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn corrupt_store_starts_empty_and_recovers() {
        let path = test_store("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let store = CredentialStore::open(path.clone()).unwrap();
        assert!(store.is_empty().unwrap());
        store.register("alice", "digest").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<HashMap<String, CredentialRecord>>(&raw).is_ok());
    }

    #[test]
    fn failed_persist_still_registers_and_diverts_to_emergency_snapshot() {
        let path = test_store("divert");
        let store = CredentialStore::open(path.clone()).unwrap();
        let emergency = paths::emergency_snapshot_path();
        let _ = fs::remove_file(&emergency);

        // Make the rename-into-place fail by putting a directory where the
        // snapshot file belongs. (Permission bits are no good here: they
        // are ignored when the tests run as root.)
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.register("alice", "digest").unwrap());

        let raw = fs::read_to_string(&emergency).unwrap();
        let users: HashMap<String, CredentialRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(users["alice"].password_hash, "digest");

        let _ = fs::remove_file(&emergency);
    }

    #[test]
    fn snapshot_uses_documented_field_names() {
        let path = test_store("schema");
        let store = CredentialStore::open(path.clone()).unwrap();
        store.register("alice", "digest").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["alice"]["password"], "digest");
        assert!(value["alice"]["created_at"].is_string());
    }
}
