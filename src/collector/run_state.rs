//! Run state tracking and the single-run guard.
//!
//! The state lives in one process-wide cell: every [`DockCollector`] shares
//! it, so at most one run is active in the process at any time.
//!
//! [`DockCollector`]: super::DockCollector

use crate::types::RunState;
use std::sync::atomic::{AtomicU8, Ordering};

static PROCESS_RUN_STATE: RunStateCell = RunStateCell::new();

/// Atomic holder of a [`RunState`]
#[derive(Debug)]
pub(crate) struct RunStateCell {
    state: AtomicU8,
}

impl RunStateCell {
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(RunState::Idle.to_u8()),
        }
    }

    /// The cell shared by every collector in the process
    pub(crate) fn process() -> &'static RunStateCell {
        &PROCESS_RUN_STATE
    }

    pub(crate) fn get(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Move to Running unless a run is already active
    ///
    /// A terminal state passes through Idle on its way to Running. The
    /// check-and-set is a single compare-exchange, so two concurrent callers
    /// can never both receive a guard.
    pub(crate) fn try_begin(&'static self) -> Option<RunGuard> {
        let running = RunState::Running.to_u8();
        let mut current = self.state.load(Ordering::SeqCst);
        loop {
            if current == running {
                return None;
            }
            match self.state.compare_exchange(
                current,
                running,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    return Some(RunGuard {
                        cell: self,
                        released: false,
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Move a terminal state back to Idle, returning the state observed
    pub(crate) fn acknowledge(&self) -> RunState {
        for terminal in [RunState::Completed, RunState::Failed] {
            if self
                .state
                .compare_exchange(
                    terminal.to_u8(),
                    RunState::Idle.to_u8(),
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                )
                .is_ok()
            {
                return terminal;
            }
        }
        self.get()
    }
}

/// Proof that the holder owns the single active run
///
/// Dropping the guard without calling [`RunGuard::release`] (early return,
/// panic, aborted task) marks the run Failed so the collector never stays
/// stuck in Running.
#[derive(Debug)]
pub(crate) struct RunGuard {
    cell: &'static RunStateCell,
    released: bool,
}

impl RunGuard {
    /// End the run in `state` (Completed or Failed)
    pub(crate) fn release(mut self, state: RunState) {
        debug_assert!(state.is_terminal(), "run must end in a terminal state");
        self.cell.state.store(state.to_u8(), Ordering::SeqCst);
        self.released = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!("run ended without releasing its guard; marking as failed");
            self.cell
                .state
                .store(RunState::Failed.to_u8(), Ordering::SeqCst);
        }
    }
}
