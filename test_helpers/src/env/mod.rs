//! Environment variable guards for tests that configure `contract-runner`
//! through `CONTRACT_RUNNER_*` variables.
//!
//! Every mutation runs under one process-wide re-entrant mutex and returns a
//! guard that restores the prior value on drop. An [`EnvScope`] keeps the
//! lock held for the whole test, so the variables stay put while the
//! settings loader reads them.
//!
//! # Examples
//!
//! ```
//! use test_helpers::env;
//!
//! let _scope = env::scope_with(|lock| {
//!     vec![
//!         lock.set_var("CONTRACT_RUNNER_STEPS", "true"),
//!         lock.remove_var("CONTRACT_RUNNER_CONFIG_PATH"),
//!     ]
//! });
//! assert_eq!(std::env::var("CONTRACT_RUNNER_STEPS").as_deref(), Ok("true"));
//! ```

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::LazyLock;

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

/// Restores one environment variable to its prior value when dropped.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl fmt::Debug for EnvVarGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarGuard")
            .field("key", &self.key)
            .field("had_original", &self.original.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        let _guard = ENV_MUTEX.lock();
        match self.original.take() {
            // SAFETY: `ENV_MUTEX` is held for the restoration.
            Some(value) => unsafe { env::set_var(&self.key, value) },
            // SAFETY: `ENV_MUTEX` is held for the restoration.
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}

/// Holds the environment lock; mutations made through it cannot interleave
/// with other guarded mutations.
#[must_use = "dropping releases the environment lock"]
pub struct EnvVarLock {
    _guard: ReentrantMutexGuard<'static, ()>,
}

impl EnvVarLock {
    /// Sets `key` to `value` while the lock is held.
    pub fn set_var<K, V>(&self, key: K, value: V) -> EnvVarGuard
    where
        K: Into<String>,
        V: AsRef<OsStr>,
    {
        let key_string = key.into();
        let original = env::var_os(&key_string);
        // SAFETY: the environment lock is held by `self`.
        unsafe { env::set_var(&key_string, value) };
        EnvVarGuard {
            key: key_string,
            original,
        }
    }

    /// Removes `key` while the lock is held.
    pub fn remove_var<K>(&self, key: K) -> EnvVarGuard
    where
        K: Into<String>,
    {
        let key_string = key.into();
        let original = env::var_os(&key_string);
        // SAFETY: the environment lock is held by `self`.
        unsafe { env::remove_var(&key_string) };
        EnvVarGuard {
            key: key_string,
            original,
        }
    }
}

/// Keeps the environment lock and a set of guards alive together.
///
/// Guards are restored before the lock is released.
#[must_use = "dropping releases the environment lock and restores guards"]
pub struct EnvScope {
    guards: Vec<EnvVarGuard>,
    _lock: EnvVarLock,
}

impl fmt::Debug for EnvScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvScope")
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

fn lock() -> EnvVarLock {
    EnvVarLock {
        _guard: ENV_MUTEX.lock(),
    }
}

/// Runs `builder` under the environment lock and keeps the lock until the
/// returned scope is dropped.
pub fn scope_with<F>(builder: F) -> EnvScope
where
    F: FnOnce(&EnvVarLock) -> Vec<EnvVarGuard>,
{
    let held = lock();
    let guards = builder(&held);
    EnvScope {
        guards,
        _lock: held,
    }
}
