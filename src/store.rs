// Shared key-value telemetry store
//
// The dashboard and the camera table are modeled as an injected interface
// so the facades are constructible without live hardware or a network
// table behind them. Reads never fail: a missing key (or one holding the
// wrong kind of value) falls back to the caller's default.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A value held in the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreValue {
    Number(f64),
    Flag(bool),
}

/// Key-value store with default-on-absence read semantics.
pub trait TelemetryStore {
    fn number(&self, key: &str, default: f64) -> f64;
    fn set_number(&self, key: &str, value: f64);
    fn flag(&self, key: &str, default: bool) -> bool;
    fn set_flag(&self, key: &str, value: bool);
}

/// In-memory table. `Clone` shares the underlying map, so the runtime,
/// the facades and tests can all hold handles to the same table.
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    entries: Arc<RwLock<HashMap<String, StoreValue>>>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, StoreValue>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, StoreValue>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TelemetryStore for TableStore {
    fn number(&self, key: &str, default: f64) -> f64 {
        match self.read().get(key) {
            Some(StoreValue::Number(value)) => *value,
            _ => default,
        }
    }

    fn set_number(&self, key: &str, value: f64) {
        self.write().insert(key.to_string(), StoreValue::Number(value));
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match self.read().get(key) {
            Some(StoreValue::Flag(value)) => *value,
            _ => default,
        }
    }

    fn set_flag(&self, key: &str, value: bool) {
        self.write().insert(key.to_string(), StoreValue::Flag(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_returns_default() {
        let store = TableStore::new();
        assert_eq!(store.number("tx", 1.5), 1.5);
        assert!(!store.flag("enabled", false));
    }

    #[test]
    fn test_write_then_read() {
        let store = TableStore::new();
        store.set_number("tx", -3.25);
        store.set_flag("enabled", true);
        assert_eq!(store.number("tx", 0.0), -3.25);
        assert!(store.flag("enabled", false));
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let store = TableStore::new();
        store.set_flag("tx", true);
        assert_eq!(store.number("tx", 7.0), 7.0);
        store.set_number("enabled", 1.0);
        assert!(store.flag("enabled", true));
    }

    #[test]
    fn test_clone_shares_entries() {
        let store = TableStore::new();
        let handle = store.clone();
        handle.set_number("Shooter P Value", 0.4);
        assert_eq!(store.number("Shooter P Value", 0.0), 0.4);
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let store = TableStore::new();
        store.set_number("ty", 10.0);
        store.set_number("ty", 12.5);
        assert_eq!(store.number("ty", 0.0), 12.5);
    }
}
