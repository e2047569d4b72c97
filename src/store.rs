use crate::location::Location;
use crate::ports::store::{StoreError, SubscriptionStore};
use crate::types::push::{NotificationStamp, Subscription};

use std::collections::{BTreeSet, HashMap};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Subscriptions held in memory and written through to a JSON file on
/// every mutation.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<Mutex<StoreState>>,
    path: Arc<PathBuf>,
}

#[derive(Debug, Default)]
struct StoreState {
    records: HashMap<String, Subscription>,
    by_location: HashMap<String, BTreeSet<String>>,
    by_user: HashMap<String, BTreeSet<String>>,
}

impl StoreState {
    fn insert(&mut self, subscription: Subscription) -> Option<Subscription> {
        let previous = self.remove(&subscription.endpoint);
        let endpoint = subscription.endpoint.clone();
        self.by_location
            .entry(subscription.location.as_str().to_string())
            .or_default()
            .insert(endpoint.clone());
        if let Some(user_id) = subscription.user_id.as_ref() {
            self.by_user
                .entry(user_id.clone())
                .or_default()
                .insert(endpoint.clone());
        }
        self.records.insert(endpoint, subscription);
        previous
    }

    fn remove(&mut self, endpoint: &str) -> Option<Subscription> {
        let removed = self.records.remove(endpoint)?;
        unindex(&mut self.by_location, removed.location.as_str(), endpoint);
        if let Some(user_id) = removed.user_id.as_deref() {
            unindex(&mut self.by_user, user_id, endpoint);
        }
        Some(removed)
    }

    fn restore(&mut self, endpoint: &str, previous: Option<Subscription>) {
        self.remove(endpoint);
        if let Some(previous) = previous {
            self.insert(previous);
        }
    }

    fn collect(&self, endpoints: Option<&BTreeSet<String>>) -> Vec<Subscription> {
        endpoints
            .into_iter()
            .flatten()
            .filter_map(|endpoint| self.records.get(endpoint).cloned())
            .collect()
    }

    fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut records: Vec<&Subscription> = self.records.values().collect();
        records.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        serde_json::to_string_pretty(&records)
    }
}

fn unindex(index: &mut HashMap<String, BTreeSet<String>>, key: &str, endpoint: &str) {
    if let Some(endpoints) = index.get_mut(key) {
        endpoints.remove(endpoint);
        if endpoints.is_empty() {
            index.remove(key);
        }
    }
}

impl JsonFileStore {
    /// Loads the store from `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut state = StoreState::default();
        match std::fs::read(&path) {
            Ok(bytes) => {
                let records: Vec<Subscription> = serde_json::from_slice(&bytes)?;
                for record in records {
                    state.insert(record);
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        tracing::info!(
            path = %path.display(),
            subscriptions = state.records.len(),
            "subscription store loaded"
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let contents = state.to_json()?;
        atomic_write(&self.path, &contents)?;
        Ok(())
    }
}

impl SubscriptionStore for JsonFileStore {
    fn upsert(&self, subscription: Subscription) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let endpoint = subscription.endpoint.clone();
        let previous = state.insert(subscription);
        if let Err(err) = self.persist(&state) {
            state.restore(&endpoint, previous);
            return Err(err);
        }
        Ok(())
    }

    fn delete(&self, endpoint: &str) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let Some(removed) = state.remove(endpoint) else {
            return Ok(false);
        };
        if let Err(err) = self.persist(&state) {
            state.insert(removed);
            return Err(err);
        }
        Ok(true)
    }

    fn find_by_endpoint(&self, endpoint: &str) -> Result<Option<Subscription>, StoreError> {
        Ok(self.lock()?.records.get(endpoint).cloned())
    }

    fn list_all(&self) -> Result<Vec<Subscription>, StoreError> {
        let state = self.lock()?;
        let mut records: Vec<Subscription> = state.records.values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.endpoint.cmp(&b.endpoint)));
        Ok(records)
    }

    fn mark_notified(&self, endpoint: &str, stamp: NotificationStamp) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let Some(current) = state.records.get(endpoint).cloned() else {
            return Ok(false);
        };

        let mut updated = current.clone();
        if let Some(last_notified) = stamp.last_notified {
            updated.last_notified = Some(last_notified);
        }
        updated.next_notification_time = stamp.next_notification_time;
        if stamp.timezone.is_some() {
            updated.timezone = stamp.timezone;
        }
        state.insert(updated);

        if let Err(err) = self.persist(&state) {
            state.insert(current);
            return Err(err);
        }
        Ok(true)
    }

    fn find_by_location(&self, location: &Location) -> Result<Vec<Subscription>, StoreError> {
        let state = self.lock()?;
        Ok(state.collect(state.by_location.get(location.as_str())))
    }

    fn find_by_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let state = self.lock()?;
        Ok(state.collect(state.by_user.get(user_id)))
    }
}

pub(crate) fn atomic_write(path: &Path, contents: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("subscriptions.json");
    let pid = std::process::id();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    for attempt in 0..10u32 {
        let temp_name = format!(".{}.tmp-{}-{}-{}", file_name, pid, nanos, attempt);
        let temp_path = parent.join(temp_name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(mut file) => {
                let written = file
                    .write_all(contents.as_bytes())
                    .and_then(|_| file.sync_all())
                    .and_then(|_| std::fs::rename(&temp_path, path));
                if written.is_err() {
                    let _ = std::fs::remove_file(&temp_path);
                }
                return written;
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to create temp file",
    ))
}
