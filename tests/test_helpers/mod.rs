//! Scoped process-environment overrides for integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Holds the environment lock and restores overridden variables on drop.
pub struct EnvVarGuard {
    saved: Vec<(String, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Applies `overrides`, where `None` unsets the variable, until the
    /// guard is dropped.
    pub fn set_many(overrides: &[(&str, Option<&str>)]) -> Self {
        let lock = ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let saved = overrides
            .iter()
            .map(|(key, value)| {
                let previous = env::var_os(key);
                apply(key, value.map(OsString::from));
                ((*key).to_owned(), previous)
            })
            .collect();

        Self { saved, _lock: lock }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            apply(&key, previous);
        }
    }
}

fn apply(key: &str, value: Option<OsString>) {
    // SAFETY: ENV_MUTEX serializes every environment mutation in the tests.
    unsafe {
        match value {
            Some(set_to) => env::set_var(key, set_to),
            None => env::remove_var(key),
        }
    }
}
