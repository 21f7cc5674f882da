//! Lifecycle state machine for one process instance.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{ProcessError, Result};

/// Progress of a process handle. States are never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initial,
    Spawning,
    Spawned,
    Finished,
}

/// Guarded lifecycle state.
///
/// Every transition and every read goes through the same mutex, so two
/// callers can never both leave `Initial`.
#[derive(Debug)]
pub struct ProcessLifecycle {
    state: Mutex<LifecycleState>,
}

impl ProcessLifecycle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LifecycleState::Initial),
        }
    }

    /// Move from `Initial` to `Spawning`.
    ///
    /// # Errors
    ///
    /// [`ProcessError::AlreadySpawned`] from any other state.
    pub fn enter_spawning(&self) -> Result<()> {
        let mut state = self.lock();
        if *state != LifecycleState::Initial {
            return Err(ProcessError::AlreadySpawned);
        }
        *state = LifecycleState::Spawning;
        Ok(())
    }

    pub fn enter_spawned(&self) {
        let mut state = self.lock();
        debug_assert_eq!(*state, LifecycleState::Spawning);
        *state = LifecycleState::Spawned;
    }

    pub fn enter_finished(&self) {
        *self.lock() = LifecycleState::Finished;
    }

    /// Current state. The lock is held only long enough to copy it.
    pub fn state(&self) -> LifecycleState {
        *self.lock()
    }

    // The guarded value is a plain enum, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProcessLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_full_progression() {
        let lifecycle = ProcessLifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Initial);

        lifecycle.enter_spawning().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Spawning);

        lifecycle.enter_spawned();
        assert_eq!(lifecycle.state(), LifecycleState::Spawned);

        lifecycle.enter_finished();
        assert_eq!(lifecycle.state(), LifecycleState::Finished);
    }

    #[test]
    fn test_second_spawn_rejected() {
        let lifecycle = ProcessLifecycle::new();
        lifecycle.enter_spawning().unwrap();
        assert_eq!(lifecycle.enter_spawning(), Err(ProcessError::AlreadySpawned));

        lifecycle.enter_spawned();
        assert_eq!(lifecycle.enter_spawning(), Err(ProcessError::AlreadySpawned));

        lifecycle.enter_finished();
        assert_eq!(lifecycle.enter_spawning(), Err(ProcessError::AlreadySpawned));
        assert_eq!(lifecycle.state(), LifecycleState::Finished);
    }

    #[test]
    fn test_concurrent_spawning_has_single_winner() {
        let lifecycle = Arc::new(ProcessLifecycle::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                thread::spawn(move || lifecycle.enter_spawning().is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(lifecycle.state(), LifecycleState::Spawning);
    }
}
