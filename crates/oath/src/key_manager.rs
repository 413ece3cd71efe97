//! Caching of derived unlock keys across sessions.
//!
//! NFC sessions in particular are short-lived; each tap re-selects the
//! applet and, for a password-protected device, needs the unlock secret
//! again. Caching the derived key by device identity lets later sessions
//! unlock without re-prompting, and without ever retaining the password.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::crypto::DerivedKey;
use crate::types::DeviceId;

/// Backing store for derived unlock keys.
///
/// Implementations may persist keys (platform keystore) or keep them in
/// memory only. Keys are opaque secrets; stores must never log them.
pub trait SecretStore: Send + Sync {
    /// Look up the key cached for a device
    fn get(&self, device_id: &DeviceId) -> Option<DerivedKey>;

    /// Cache a key for a device, replacing any previous one
    fn put(&self, device_id: &DeviceId, key: DerivedKey);

    /// Drop the key cached for a device, if any
    fn clear(&self, device_id: &DeviceId);
}

/// In-memory [`SecretStore`]; keys vanish when the process exits
#[derive(Default)]
pub struct MemoryStore {
    keys: Mutex<HashMap<DeviceId, DerivedKey>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, device_id: &DeviceId) -> Option<DerivedKey> {
        self.keys.lock().get(device_id).cloned()
    }

    fn put(&self, device_id: &DeviceId, key: DerivedKey) {
        self.keys.lock().insert(device_id.clone(), key);
    }

    fn clear(&self, device_id: &DeviceId) {
        self.keys.lock().remove(device_id);
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.keys.lock().len())
            .finish()
    }
}

/// Shared handle to a [`SecretStore`]
#[derive(Clone)]
pub struct KeyManager {
    store: Arc<dyn SecretStore>,
}

impl KeyManager {
    /// Wrap a store in a shareable handle
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Key manager backed by an in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Key cached for a device, if any
    pub fn get(&self, device_id: &DeviceId) -> Option<DerivedKey> {
        self.store.get(device_id)
    }

    /// Cache a key for a device
    pub fn put(&self, device_id: &DeviceId, key: DerivedKey) {
        debug!(%device_id, "caching unlock key");
        self.store.put(device_id, key);
    }

    /// Forget the key cached for a device
    pub fn clear(&self, device_id: &DeviceId) {
        debug!(%device_id, "dropping cached unlock key");
        self.store.clear(device_id);
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let manager = KeyManager::in_memory();
        let id = DeviceId::new(vec![1, 2, 3]);
        assert!(manager.get(&id).is_none());

        manager.put(&id, DerivedKey::new(vec![0xAA; 16]));
        assert_eq!(manager.get(&id).unwrap().as_bytes(), &[0xAA; 16]);

        manager.put(&id, DerivedKey::new(vec![0xBB; 16]));
        assert_eq!(manager.get(&id).unwrap().as_bytes(), &[0xBB; 16]);

        manager.clear(&id);
        assert!(manager.get(&id).is_none());
    }

    #[test]
    fn test_keys_are_scoped_per_device() {
        let manager = KeyManager::in_memory();
        let a = DeviceId::new(vec![1]);
        let b = DeviceId::new(vec![2]);
        manager.put(&a, DerivedKey::new(vec![1; 16]));
        assert!(manager.get(&b).is_none());
        manager.clear(&b);
        assert!(manager.get(&a).is_some());
    }
}
