//! The [`ReductionContext`] threaded through every engine call.
//!
//! The source system kept a process-wide aborted flag and a global message stack; here both are
//! values owned by the caller. The abort flag is an [`AtomicBool`] behind an [`Arc`] so an
//! external watchdog (e.g. a UI thread enforcing a timeout) can request cancellation; the
//! reporter and the assumption store use single-threaded shared handles.

use calc_error::Reporter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::assumptions::AssumptionStore;

/// Shared state for one or more reduction passes.
#[derive(Debug, Clone, Default)]
pub struct ReductionContext {
    abort: Arc<AtomicBool>,

    /// The diagnostics sink.
    pub reporter: Reporter,

    /// Facts about free symbols.
    pub assumptions: AssumptionStore,
}

impl ReductionContext {
    /// Creates a fresh context with no recorded diagnostics or assumptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context whose abort flag is owned by the caller.
    pub fn with_abort(abort: Arc<AtomicBool>) -> Self {
        Self { abort, ..Self::default() }
    }

    /// A handle to the abort flag, for handing to a watchdog.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// True if cancellation was requested. Polled cooperatively by every scan loop; an aborted
    /// pass stops early and leaves a structurally valid tree.
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}
