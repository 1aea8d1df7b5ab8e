use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::config::Config;
use super::connection::Connection;
use super::heartbeat;
use super::traits::HeartbeatTarget;

/// Cancels the heartbeat task it was created for when dropped.
#[derive(Debug)]
struct Monitor(CancellationToken);

impl Drop for Monitor {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

#[derive(Debug)]
struct Inner<T> {
    entries: HashMap<String, T>,
    /// Present exactly while `entries` is non-empty
    monitor: Option<Monitor>,
}

/// Shared map of open connections, keyed by endpoint, owning the heartbeat monitor.
///
/// The monitor is started when the first entry is registered and cancelled
/// when the last one is removed. Entries and the monitor handle are guarded by
/// a single lock, so concurrent opens and closes can never start two monitors
/// or leave entries unmonitored.
///
/// Two connections registered under the same key replace one another. Use
/// [`Registry::unregister_exact`] to remove an entry only if it is still the
/// connection being closed.
#[derive(Debug)]
pub struct Registry<T = Connection> {
    inner: Mutex<Inner<T>>,
    heartbeat_interval: Duration,
}

impl<T> Registry<T>
where
    T: HeartbeatTarget + Clone,
{
    /// Create an empty registry. A heartbeat interval below
    /// [`MIN_HEARTBEAT_INTERVAL`](super::config::MIN_HEARTBEAT_INTERVAL) is raised to it.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        #[cfg(feature = "tracing")]
        if config.heartbeat_interval < super::config::MIN_HEARTBEAT_INTERVAL {
            tracing::warn!(
                requested = ?config.heartbeat_interval,
                "Heartbeat interval too short, using the minimum"
            );
        }

        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                monitor: None,
            }),
            heartbeat_interval: config.effective_heartbeat_interval(),
        }
    }

    // Nothing can be left half-updated under the lock, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the entry for `key`, starting the heartbeat monitor
    /// if the registry was empty.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register<K: Into<String>>(self: &Arc<Self>, key: K, target: T) {
        let key = key.into();
        let mut inner = self.lock();

        if inner.entries.is_empty() {
            let token = CancellationToken::new();
            heartbeat::spawn(Arc::downgrade(self), self.heartbeat_interval, token.clone());
            inner.monitor = Some(Monitor(token));
        }

        #[cfg(feature = "tracing")]
        if inner.entries.contains_key(&key) {
            tracing::debug!(%key, "Replacing registered connection");
        }

        inner.entries.insert(key, target);
    }

    /// Remove the entry for `key`, stopping the monitor if the registry becomes empty.
    pub fn unregister(&self, key: &str) -> Option<T> {
        let mut inner = self.lock();
        let removed = inner.entries.remove(key);

        if inner.entries.is_empty() {
            inner.monitor = None;
        }

        removed
    }

    /// Remove the entry for `key` only if it is `target`.
    ///
    /// Returns whether an entry was removed. A connection that has been
    /// replaced under its key leaves its replacement registered.
    pub fn unregister_exact(&self, key: &str, target: &T) -> bool
    where
        T: PartialEq,
    {
        let mut inner = self.lock();
        if inner.entries.get(key) != Some(target) {
            return false;
        }

        inner.entries.remove(key);
        if inner.entries.is_empty() {
            inner.monitor = None;
        }

        true
    }

    /// Stop the monitor and forget every entry. Connections are left as they are.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.monitor = None;
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<T> {
        self.lock().entries.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Period of the heartbeat monitor.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Whether the heartbeat monitor is running.
    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.lock().monitor.is_some()
    }

    /// Copy of the current entries, so probing happens outside the lock.
    pub(crate) fn snapshot(&self) -> Vec<(String, T)> {
        self.lock()
            .entries
            .iter()
            .map(|(key, target)| (key.clone(), target.clone()))
            .collect()
    }
}

impl Default for Registry<Connection> {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
