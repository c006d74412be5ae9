//! Error propagation for user-code failures in the kernel.
//!
//! Scheduler jobs and watcher callbacks run guarded: a failure is routed to
//! the installed handler and never interrupts the surrounding iteration.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// What kind of user code failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorCode {
    SchedulerJob,
    WatcherCallback,
    WatcherCleanup,
    EffectRun,
    /// A job re-queued itself past the recursion limit
    RecursiveUpdate,
}

impl RuntimeErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::SchedulerJob => "Unhandled error during scheduler job execution",
            Self::WatcherCallback => "Unhandled error in watcher callback",
            Self::WatcherCleanup => "Unhandled error in watcher cleanup function",
            Self::EffectRun => "Unhandled error during reactive effect execution",
            Self::RecursiveUpdate => {
                "Maximum recursive updates exceeded; a reactive job keeps re-queueing itself"
            }
        }
    }
}

/// An error surfaced from guarded user code.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub code: RuntimeErrorCode,
    pub detail: String,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.message(), self.detail)
    }
}

thread_local! {
    static HANDLER: RefCell<Option<Box<dyn Fn(RuntimeError)>>> = const { RefCell::new(None) };
}

/// Install the process-level error handler.
pub fn set_error_handler(handler: impl Fn(RuntimeError) + 'static) {
    HANDLER.with(|h| *h.borrow_mut() = Some(Box::new(handler)));
}

/// Route an error to the installed handler, or stderr when none is set.
pub fn handle_error(error: RuntimeError) {
    HANDLER.with(|h| match h.borrow().as_ref() {
        Some(handler) => handler(error),
        None => eprintln!("[lueur] {}", error),
    });
}

/// Extract a printable payload from a caught panic.
pub(crate) fn panic_detail(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_owned()
    }
}

/// Run user code guarded; failures go to the handler and `None` is returned.
pub fn call_with_error_handling<R>(
    code: RuntimeErrorCode,
    f: impl FnOnce() -> R,
) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            handle_error(RuntimeError {
                code,
                detail: panic_detail(payload),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_guarded_call_reports_and_continues() {
        let seen = Rc::new(Cell::new(false));
        let s = seen.clone();
        set_error_handler(move |err| {
            assert_eq!(err.code, RuntimeErrorCode::SchedulerJob);
            s.set(true);
        });

        let result =
            call_with_error_handling(RuntimeErrorCode::SchedulerJob, || panic!("boom"));
        assert!(result.is_none());
        assert!(seen.get());
    }
}
