use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per IMEI. Serializes the read-decide-write sequence of
/// a device when it holds several connections at once.
///
/// Entries only live while someone holds or waits for them, so the map
/// stays as small as the number of devices being ingested right now.
#[derive(Default)]
pub struct DeviceLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held for the duration of one device update. Releasing it drops the map
/// entry when no other task is queued on the same device.
pub struct DeviceGuard<'a> {
    locks: &'a DeviceLocks,
    imei: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl DeviceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, imei: &str) -> DeviceGuard<'_> {
        let lock = self.map().entry(imei.to_string()).or_default().clone();
        DeviceGuard {
            locks: self,
            imei: imei.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    // The map is only touched synchronously, never across an await.
    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }
}

impl Drop for DeviceGuard<'_> {
    fn drop(&mut self) {
        // Each holder or waiter owns a clone, so a count of one under the
        // map lock means the map holds the last reference.
        self.guard.take();
        let mut locks = self.locks.map();
        if locks
            .get(&self.imei)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.imei);
        }
    }
}
