//! Global reactivity state.
//!
//! The active-effect stack, the should-track flag and the scheduling pause
//! depth are process-wide singletons, owned by a thread-local runtime and
//! exposed only through scoped acquisitions so every exit path restores
//! them.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::effect::EffectInner;

pub(crate) struct ReactivityRuntime {
    /// Stack of currently running effects; the top is the active subscriber
    pub(crate) effect_stack: RefCell<Vec<Rc<EffectInner>>>,
    /// Whether reads are currently tracked
    pub(crate) should_track: Cell<bool>,
    /// Saved should-track values for pause/enable scopes
    pub(crate) track_stack: RefCell<Vec<bool>>,
    /// Scheduling pause depth; schedulers queue while non-zero
    pub(crate) pause_depth: Cell<u32>,
    /// Schedulers deferred while scheduling was paused
    pub(crate) pending_schedulers: RefCell<VecDeque<Rc<dyn Fn()>>>,
}

impl ReactivityRuntime {
    fn new() -> Self {
        Self {
            effect_stack: RefCell::new(Vec::new()),
            should_track: Cell::new(true),
            track_stack: RefCell::new(Vec::new()),
            pause_depth: Cell::new(0),
            pending_schedulers: RefCell::new(VecDeque::new()),
        }
    }
}

thread_local! {
    static RUNTIME: ReactivityRuntime = ReactivityRuntime::new();
}

pub(crate) fn with_runtime<R>(f: impl FnOnce(&ReactivityRuntime) -> R) -> R {
    RUNTIME.with(f)
}

/// The currently running effect, if any.
pub(crate) fn active_effect() -> Option<Rc<EffectInner>> {
    with_runtime(|rt| rt.effect_stack.borrow().last().cloned())
}

pub(crate) fn push_effect(effect: Rc<EffectInner>) {
    with_runtime(|rt| rt.effect_stack.borrow_mut().push(effect));
}

pub(crate) fn pop_effect() {
    with_runtime(|rt| {
        rt.effect_stack.borrow_mut().pop();
    });
}

pub(crate) fn should_track() -> bool {
    with_runtime(|rt| rt.should_track.get())
}

/// Disable tracking until the matching `reset_tracking`.
pub fn pause_tracking() {
    with_runtime(|rt| {
        rt.track_stack.borrow_mut().push(rt.should_track.get());
        rt.should_track.set(false);
    });
}

/// Enable tracking until the matching `reset_tracking`.
pub fn enable_tracking() {
    with_runtime(|rt| {
        rt.track_stack.borrow_mut().push(rt.should_track.get());
        rt.should_track.set(true);
    });
}

/// Restore the tracking flag saved by the last pause/enable.
pub fn reset_tracking() {
    with_runtime(|rt| {
        let last = rt.track_stack.borrow_mut().pop();
        rt.should_track.set(last.unwrap_or(true));
    });
}

/// Scoped tracking pause; restores on drop, including unwinds.
pub struct TrackGuard {
    _private: (),
}

impl TrackGuard {
    pub fn pause() -> Self {
        pause_tracking();
        Self { _private: () }
    }
}

impl Drop for TrackGuard {
    fn drop(&mut self) {
        reset_tracking();
    }
}

/// Run a closure with tracking disabled.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _guard = TrackGuard::pause();
    f()
}

/// Defer scheduler callbacks until the matching `resume_scheduling`.
pub(crate) fn pause_scheduling() {
    with_runtime(|rt| rt.pause_depth.set(rt.pause_depth.get() + 1));
}

/// Unwind one pause level; at depth zero, drain deferred schedulers.
pub(crate) fn resume_scheduling() {
    let drained = with_runtime(|rt| {
        let depth = rt.pause_depth.get().saturating_sub(1);
        rt.pause_depth.set(depth);
        if depth == 0 {
            let mut pending = rt.pending_schedulers.borrow_mut();
            let drained: Vec<Rc<dyn Fn()>> = pending.drain(..).collect();
            drained
        } else {
            Vec::new()
        }
    });
    for scheduler in drained {
        scheduler();
    }
}

/// Queue a scheduler call, deferring while scheduling is paused.
pub(crate) fn enqueue_scheduler(scheduler: Rc<dyn Fn()>) {
    let run_now = with_runtime(|rt| {
        if rt.pause_depth.get() > 0 {
            rt.pending_schedulers.borrow_mut().push_back(scheduler.clone());
            false
        } else {
            true
        }
    });
    if run_now {
        scheduler();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_guard_restores_on_drop() {
        assert!(should_track());
        {
            let _guard = TrackGuard::pause();
            assert!(!should_track());
            {
                let _inner = TrackGuard::pause();
                assert!(!should_track());
            }
            assert!(!should_track());
        }
        assert!(should_track());
    }

    #[test]
    fn test_untracked() {
        let observed = untracked(|| should_track());
        assert!(!observed);
        assert!(should_track());
    }
}
