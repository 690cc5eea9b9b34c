//! File-backed entry store
//!
//! The directory lives in a flat sectioned text file so it survives process
//! restarts. Every operation is a full read-modify-write cycle guarded by a
//! mutex, so concurrent heartbeats can never lose an update or tear the file.
//! Expiry is lazy: `snapshot` purges entries older than the TTL while
//! building the listing; nothing else ever sweeps.

pub mod codec;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::models::ServerEntry;
use crate::validate::Registration;

/// Source of "now" in unix seconds, injected so expiry is testable without
/// wall-clock waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

type Directory = BTreeMap<String, ServerEntry>;

/// Handle to the directory state. Cheap to clone; all clones share the same
/// write lock.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    ttl_secs: i64,
    clock: Arc<dyn Clock>,
    // Serializes the read-modify-write cycle across requests
    lock: Mutex<()>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>, ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path: path.as_ref().to_path_buf(),
                ttl_secs,
                clock,
                lock: Mutex::new(()),
            }),
        }
    }

    /// Create or overwrite the entry for `address`, refreshing its heartbeat.
    pub async fn upsert(&self, address: &str, reg: Registration) -> io::Result<()> {
        let _guard = self.inner.lock.lock().await;
        let mut dir = self.load().await?;
        let entry = ServerEntry {
            address: address.to_string(),
            name: reg.name,
            info: reg.info,
            protocol: reg.protocol,
            last_heartbeat: self.inner.clock.now(),
        };
        tracing::debug!(address, name = %entry.name, "heartbeat");
        dir.insert(address.to_string(), entry);
        self.persist(&dir).await
    }

    /// Remove the entry for `address`. Removing an unknown address is a no-op.
    pub async fn remove(&self, address: &str) -> io::Result<()> {
        let _guard = self.inner.lock.lock().await;
        let mut dir = self.load().await?;
        if dir.remove(address).is_some() {
            tracing::debug!(address, "removed");
            self.persist(&dir).await?;
        }
        Ok(())
    }

    /// Return all live entries ordered by address, purging expired ones from
    /// the durable state first.
    pub async fn snapshot(&self) -> io::Result<Vec<ServerEntry>> {
        let _guard = self.inner.lock.lock().await;
        let mut dir = self.load().await?;
        let now = self.inner.clock.now();
        let ttl = self.inner.ttl_secs;

        let before = dir.len();
        dir.retain(|_, entry| now - entry.last_heartbeat <= ttl);
        let swept = before - dir.len();
        if swept > 0 {
            tracing::debug!(swept, "expired entries purged");
            self.persist(&dir).await?;
        }

        Ok(dir.into_values().collect())
    }

    /// Read the whole directory. A missing file is an empty directory.
    async fn load(&self) -> io::Result<Directory> {
        match tokio::fs::read_to_string(&self.inner.path).await {
            Ok(text) => Ok(codec::parse(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Directory::new()),
            Err(e) => Err(e),
        }
    }

    /// Write the whole directory back. Goes through a temp file and rename so
    /// a crash mid-write never leaves a torn file behind.
    async fn persist(&self, dir: &Directory) -> io::Result<()> {
        let text = codec::serialize(dir)?;
        let tmp = self.inner.path.with_extension("ini.tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.inner.path).await
    }
}

/// Clock implementations for tests
pub mod testing {
    use super::Clock;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that only moves when the test says so
    pub struct ManualClock {
        now: AtomicI64,
    }

    impl ManualClock {
        pub fn new(now: i64) -> Self {
            Self {
                now: AtomicI64::new(now),
            }
        }

        pub fn set(&self, now: i64) {
            self.now.store(now, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    fn registration(name: &str) -> Registration {
        Registration {
            name: name.to_string(),
            info: "Bar".to_string(),
            port: 27000,
            protocol: 3,
        }
    }

    fn store_at(dir: &tempfile::TempDir, clock: Arc<ManualClock>) -> Store {
        Store::open(dir.path().join("servers.ini"), 360, clock)
    }

    #[tokio::test]
    async fn test_upsert_overwrites_existing_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store_at(&tmp, clock.clone());

        store.upsert("1.2.3.4:27000", registration("Foo")).await.unwrap();
        clock.set(50);
        store.upsert("1.2.3.4:27000", registration("Baz")).await.unwrap();

        let entries = store.snapshot().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Baz");
        assert_eq!(entries[0].last_heartbeat, 50);
    }

    #[tokio::test]
    async fn test_snapshot_sweeps_expired_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store_at(&tmp, clock.clone());

        store.upsert("1.2.3.4:27000", registration("Foo")).await.unwrap();

        // Present right up to the TTL boundary
        clock.set(359);
        assert_eq!(store.snapshot().await.unwrap().len(), 1);
        clock.set(360);
        assert_eq!(store.snapshot().await.unwrap().len(), 1);

        // Gone past it, and gone from the file too
        clock.set(361);
        assert!(store.snapshot().await.unwrap().is_empty());
        clock.set(0);
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store_at(&tmp, clock.clone());

        store.upsert("1.2.3.4:27000", registration("Foo")).await.unwrap();
        store.remove("1.2.3.4:27000").await.unwrap();
        assert!(store.snapshot().await.unwrap().is_empty());

        // Unknown address is a no-op, not an error
        store.remove("5.6.7.8:27000").await.unwrap();
        store.remove("1.2.3.4:27000").await.unwrap();
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(100));

        let store = store_at(&tmp, clock.clone());
        store.upsert("1.2.3.4:27000", registration("Foo")).await.unwrap();
        drop(store);

        let reopened = store_at(&tmp, clock);
        let entries = reopened.snapshot().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, "1.2.3.4:27000");
        assert_eq!(entries[0].last_heartbeat, 100);
    }

    #[tokio::test]
    async fn test_snapshot_is_ordered_by_address() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store_at(&tmp, clock);

        store.upsert("9.9.9.9:27000", registration("Z")).await.unwrap();
        store.upsert("1.2.3.4:27000", registration("A")).await.unwrap();

        let addresses: Vec<_> = store
            .snapshot()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.address)
            .collect();
        assert_eq!(addresses, vec!["1.2.3.4:27000", "9.9.9.9:27000"]);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_are_not_lost() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = store_at(&tmp, clock);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let address = format!("10.0.0.{i}:27000");
                store.upsert(&address, Registration {
                    name: format!("srv{i}"),
                    info: "Bar".to_string(),
                    port: 27000,
                    protocol: 3,
                }).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.snapshot().await.unwrap().len(), 16);
    }
}
