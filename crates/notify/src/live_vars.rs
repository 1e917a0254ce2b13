//! Registry of exported live variables.
//!
//! A value is exported once and identified afterwards by the
//! [`LiveVarHandle`] issued for it. Handles come from a monotonically
//! increasing counter and are never reused, so two exports never alias even
//! if they carry equal values.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use serde::Serialize;
use serde_json::Value;

/// Errors from registry lookups.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LiveVarError {
    #[error("unknown live variable handle {0}; export it first")]
    UnknownHandle(LiveVarHandle),
}

/// Opaque token identifying an exported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LiveVarHandle(u64);

impl fmt::Display for LiveVarHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An exported value and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveVarEntry {
    pub handle: LiveVarHandle,
    pub name: String,
    /// Longer description for GUIs.
    pub description: Option<String>,
    pub value: Value,
}

/// Thread-safe map from handle to last known value.
#[derive(Debug)]
pub struct LiveVarRegistry {
    next: AtomicU64,
    entries: RwLock<HashMap<LiveVarHandle, LiveVarEntry>>,
}

impl Default for LiveVarRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveVarRegistry {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> Arc<LiveVarRegistry> {
        static GLOBAL: OnceLock<Arc<LiveVarRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(LiveVarRegistry::new()))
            .clone()
    }

    /// Register `value` under a fresh handle. Names need not be unique.
    pub fn export(
        &self,
        value: impl Into<Value>,
        name: impl Into<String>,
        description: Option<&str>,
    ) -> LiveVarHandle {
        let handle = LiveVarHandle(self.next.fetch_add(1, Ordering::Relaxed));
        let entry = LiveVarEntry {
            handle,
            name: name.into(),
            description: description.map(str::to_string),
            value: value.into(),
        };
        tracing::debug!(%handle, name = %entry.name, "live variable exported");

        self.write().insert(handle, entry);
        handle
    }

    /// Last value stored under `handle`.
    pub fn get(&self, handle: LiveVarHandle) -> Result<Value, LiveVarError> {
        self.read()
            .get(&handle)
            .map(|e| e.value.clone())
            .ok_or(LiveVarError::UnknownHandle(handle))
    }

    /// Replace the value under an existing handle, returning the previous one.
    ///
    /// This is the write path for whatever control plane mirrors these
    /// values; nothing here refreshes them on its own.
    pub fn update(
        &self,
        handle: LiveVarHandle,
        value: impl Into<Value>,
    ) -> Result<Value, LiveVarError> {
        let mut entries = self.write();
        let entry = entries
            .get_mut(&handle)
            .ok_or(LiveVarError::UnknownHandle(handle))?;
        Ok(std::mem::replace(&mut entry.value, value.into()))
    }

    /// Full entry (name, description, value) for `handle`.
    pub fn describe(&self, handle: LiveVarHandle) -> Result<LiveVarEntry, LiveVarError> {
        self.read()
            .get(&handle)
            .cloned()
            .ok_or(LiveVarError::UnknownHandle(handle))
    }

    /// Snapshot of every entry in export order.
    pub fn entries(&self) -> Vec<LiveVarEntry> {
        let mut all: Vec<_> = self.read().values().cloned().collect();
        all.sort_by_key(|e| e.handle);
        all
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Writers only insert or replace whole entries, so a poisoned map is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<LiveVarHandle, LiveVarEntry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<LiveVarHandle, LiveVarEntry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}
