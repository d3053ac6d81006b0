use std::sync::{Mutex, MutexGuard};

/// Serialise tests that read or change the process working directory.
pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
    static MUTEX: Mutex<()> = Mutex::new(());
    MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
