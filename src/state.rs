use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Per-client cancellation flags for in-flight rename flows. The engine
/// checks the flag at each phase boundary so a cancelled caller never
/// performs a stale destructive action.
#[derive(Default)]
pub struct EngineState {
    cancel_flags: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl EngineState {
    pub fn reset_cancel_flag(&self, client_id: &str) -> Arc<AtomicBool> {
        let mut flags = self
            .cancel_flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let flag = flags
            .entry(client_id.to_string())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone();
        flag.store(false, Ordering::Relaxed);
        flag
    }

    pub fn mark_cancelled(&self, client_id: Option<&str>) {
        let flags = self
            .cancel_flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(id) = client_id {
            if let Some(flag) = flags.get(id) {
                flag.store(true, Ordering::Relaxed);
            }
            return;
        }

        for flag in flags.values() {
            flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn clear_cancel_flag(&self, client_id: &str) {
        let mut flags = self
            .cancel_flags
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        flags.remove(client_id);
    }
}
