#[cfg(feature = "loom")]
mod imp {
    pub(crate) use loom::{
        sync::{
            Arc, Condvar, Mutex, MutexGuard,
            atomic::{AtomicU8, AtomicUsize, Ordering},
        },
        thread::JoinHandle,
    };

    /// Workers are plain model threads under `loom`; names are not modelled.
    pub(crate) fn spawn_worker(
        _name: String,
        body: impl FnOnce() + Send + 'static,
    ) -> std::io::Result<JoinHandle<()>> {
        Ok(loom::thread::spawn(body))
    }
}

#[cfg(not(feature = "loom"))]
mod imp {
    pub(crate) use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
    pub(crate) use std::{
        sync::{Arc, Condvar, Mutex, MutexGuard},
        thread::JoinHandle,
    };

    pub(crate) fn spawn_worker(
        name: String,
        body: impl FnOnce() + Send + 'static,
    ) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new().name(name).spawn(body)
    }
}

pub(crate) use imp::*;
use std::sync::PoisonError;

/// Locks `mutex`, ignoring poisoning. Callback panics abort the process, so no
/// guard of ours is ever dropped mid-update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Blocks on `condvar`, ignoring poisoning like [`lock`].
pub(crate) fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
    condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
}
