//! Environment isolation shared by the configuration integration tests.

use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialises access to the process environment for the lifetime of a test.
pub struct EnvGuard {
    overrides: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub fn acquire() -> Self {
        let lock = match ENV_MUTEX.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Self {
            overrides: Vec::new(),
            _lock: lock,
        }
    }

    pub fn set_var(&mut self, key: &str, value: impl AsRef<OsStr>) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` in edition 2024; the guard restores
        // every override in `Drop` while holding the global lock.
        unsafe { std::env::set_var(key, value) };
        self.overrides.push((key.to_owned(), previous));
    }

    pub fn remove_var(&mut self, key: &str) {
        let previous = std::env::var_os(key);
        unsafe { std::env::remove_var(key) };
        self.overrides.push((key.to_owned(), previous));
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        while let Some((key, value)) = self.overrides.pop() {
            match value {
                Some(previous) => unsafe { std::env::set_var(&key, previous) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}
