//! Watchers: observe a reactive getter and call back on change.
//!
//! The getter runs inside an effect; the effect's scheduler queues a job per
//! the flush mode (pre queue by default, post queue, or inline for sync).
//! An `on_invalidate` cleanup registered by the callback runs before the
//! next invocation or on stop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::effect::ReactiveEffect;
use crate::error::{call_with_error_handling, RuntimeErrorCode};
use crate::scheduler::{invalidate_job, queue_job, queue_post_job, JobFlags, SchedulerJob};

/// When the watcher callback runs relative to the flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
    /// Before component updates of the same flush (default)
    #[default]
    Pre,
    /// After all host mutations of the flush
    Post,
    /// Inline at trigger time
    Sync,
}

#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Fire the callback immediately with the initial value
    pub immediate: bool,
    /// Fire on every trigger without comparing values (deep sources seed
    /// their own tracking)
    pub deep: bool,
    pub flush: FlushMode,
    /// Ordering id for pre-flush scheduling (the owning component's id)
    pub id: Option<u32>,
}

type CleanupSlot = Rc<RefCell<Option<Box<dyn FnOnce()>>>>;

/// Registration handle passed to the callback for invalidation cleanups.
pub struct OnInvalidate {
    slot: CleanupSlot,
}

impl OnInvalidate {
    /// Register a cleanup to run before the next callback or on stop.
    pub fn register(&self, f: impl FnOnce() + 'static) {
        *self.slot.borrow_mut() = Some(Box::new(f));
    }
}

/// Stop handle for a watcher.
pub struct WatchHandle {
    effect: ReactiveEffect,
    job: SchedulerJob,
    cleanup: CleanupSlot,
    stopped: Cell<bool>,
}

impl WatchHandle {
    /// Detach the watcher from all deps; in-flight jobs no-op.
    pub fn stop(&self) {
        if self.stopped.replace(true) {
            return;
        }
        self.effect.stop();
        self.effect.clear_scheduler();
        invalidate_job(&self.job);
        if let Some(cleanup) = self.cleanup.borrow_mut().take() {
            call_with_error_handling(RuntimeErrorCode::WatcherCleanup, cleanup);
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Watch a reactive getter, invoking `callback(new, old, on_invalidate)`
/// when its result changes.
pub fn watch<T, G, C>(mut getter: G, mut callback: C, options: WatchOptions) -> WatchHandle
where
    T: Clone + PartialEq + 'static,
    G: FnMut() -> T + 'static,
    C: FnMut(&T, Option<&T>, &OnInvalidate) + 'static,
{
    let latest: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
    let old: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));
    let cleanup: CleanupSlot = Rc::new(RefCell::new(None));

    let effect = {
        let latest = latest.clone();
        ReactiveEffect::new(move || {
            *latest.borrow_mut() = Some(getter());
        })
    };

    let job = {
        let effect = effect.clone();
        let latest = latest.clone();
        let old = old.clone();
        let cleanup = cleanup.clone();
        let deep = options.deep;
        let body = move || {
            if !effect.is_active() {
                return;
            }
            effect.run();
            let new_value = latest.borrow().clone();
            let Some(new_value) = new_value else {
                return;
            };
            let fire = {
                let old_ref = old.borrow();
                deep || old_ref.as_ref() != Some(&new_value)
            };
            if fire {
                if let Some(prev_cleanup) = cleanup.borrow_mut().take() {
                    call_with_error_handling(RuntimeErrorCode::WatcherCleanup, prev_cleanup);
                }
                let on_invalidate = OnInvalidate {
                    slot: cleanup.clone(),
                };
                {
                    let old_ref = old.borrow();
                    call_with_error_handling(RuntimeErrorCode::WatcherCallback, || {
                        callback(&new_value, old_ref.as_ref(), &on_invalidate);
                    });
                }
                *old.borrow_mut() = Some(new_value);
            }
        };
        let flags = if options.flush == FlushMode::Pre {
            JobFlags::PRE
        } else {
            JobFlags::empty()
        };
        SchedulerJob::with_flags(options.id, flags, body)
    };

    // Route triggers by flush mode
    {
        let job = job.clone();
        match options.flush {
            FlushMode::Sync => effect.set_scheduler(move || job.invoke()),
            FlushMode::Pre => effect.set_scheduler(move || queue_job(&job)),
            FlushMode::Post => effect.set_scheduler(move || queue_post_job(&job)),
        }
    }

    if options.immediate {
        job.invoke();
    } else {
        // Seed dependencies and the old value without firing
        effect.run();
        *old.borrow_mut() = latest.borrow().clone();
    }

    WatchHandle {
        effect,
        job,
        cleanup,
        stopped: Cell::new(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::flush_jobs;
    use crate::signal::Signal;

    #[test]
    fn test_pre_watch_fires_on_flush() {
        let source = Signal::new(1);
        let seen: Rc<RefCell<Vec<(i32, Option<i32>)>>> = Rc::new(RefCell::new(Vec::new()));
        let (sig, log) = (source.clone(), seen.clone());
        let _w = watch(
            move || sig.get(),
            move |new, old, _| log.borrow_mut().push((*new, old.copied())),
            WatchOptions::default(),
        );
        assert!(seen.borrow().is_empty());

        source.set(2);
        assert!(seen.borrow().is_empty(), "pre watcher waits for the flush");
        flush_jobs();
        assert_eq!(*seen.borrow(), vec![(2, Some(1))]);
    }

    #[test]
    fn test_sync_watch_fires_inline() {
        let source = Signal::new(1);
        let seen: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));
        let (sig, log) = (source.clone(), seen.clone());
        let mut options = WatchOptions::default();
        options.flush = FlushMode::Sync;
        let _w = watch(
            move || sig.get(),
            move |new, _, _| log.borrow_mut().push(*new),
            options,
        );
        source.set(2);
        assert_eq!(*seen.borrow(), vec![2]);
        source.set(3);
        assert_eq!(*seen.borrow(), vec![2, 3]);
    }

    #[test]
    fn test_immediate_fires_with_no_old_value() {
        let source = Signal::new(5);
        let seen: Rc<RefCell<Vec<(i32, Option<i32>)>>> = Rc::new(RefCell::new(Vec::new()));
        let (sig, log) = (source.clone(), seen.clone());
        let mut options = WatchOptions::default();
        options.immediate = true;
        let _w = watch(
            move || sig.get(),
            move |new, old, _| log.borrow_mut().push((*new, old.copied())),
            options,
        );
        assert_eq!(*seen.borrow(), vec![(5, None)]);
    }

    #[test]
    fn test_unchanged_value_does_not_fire() {
        let source = Signal::new(2);
        let runs = Rc::new(Cell::new(0));
        let (sig, r) = (source.clone(), runs.clone());
        let mut options = WatchOptions::default();
        options.flush = FlushMode::Sync;
        let _w = watch(
            move || sig.get() % 2,
            move |_, _, _| r.set(r.get() + 1),
            options,
        );
        source.set(4);
        assert_eq!(runs.get(), 0, "getter result unchanged");
        source.set(5);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_two_writes_coalesce_into_one_callback() {
        let source = Signal::new(0);
        let runs = Rc::new(Cell::new(0));
        let (sig, r) = (source.clone(), runs.clone());
        let _w = watch(
            move || sig.get(),
            move |_, _, _| r.set(r.get() + 1),
            WatchOptions::default(),
        );
        source.set(1);
        source.set(2);
        flush_jobs();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_on_invalidate_runs_before_next_callback() {
        let source = Signal::new(0);
        let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let (sig, l) = (source.clone(), log.clone());
        let mut options = WatchOptions::default();
        options.flush = FlushMode::Sync;
        let _w = watch(
            move || sig.get(),
            move |new, _, on_invalidate| {
                l.borrow_mut().push(format!("cb {}", new));
                let l = l.clone();
                let n = *new;
                on_invalidate.register(move || l.borrow_mut().push(format!("cleanup {}", n)));
            },
            options,
        );
        source.set(1);
        source.set(2);
        assert_eq!(
            *log.borrow(),
            vec!["cb 1".to_owned(), "cleanup 1".to_owned(), "cb 2".to_owned()]
        );
    }

    #[test]
    fn test_cleanup_runs_on_stop() {
        let source = Signal::new(0);
        let cleaned = Rc::new(Cell::new(false));
        let (sig, c) = (source.clone(), cleaned.clone());
        let mut options = WatchOptions::default();
        options.flush = FlushMode::Sync;
        let w = watch(
            move || sig.get(),
            move |_, _, on_invalidate| {
                let c = c.clone();
                on_invalidate.register(move || c.set(true));
            },
            options,
        );
        source.set(1);
        assert!(!cleaned.get());
        w.stop();
        assert!(cleaned.get());
    }

    #[test]
    fn test_stopped_watcher_no_ops() {
        let source = Signal::new(0);
        let runs = Rc::new(Cell::new(0));
        let (sig, r) = (source.clone(), runs.clone());
        let w = watch(
            move || sig.get(),
            move |_, _, _| r.set(r.get() + 1),
            WatchOptions::default(),
        );
        source.set(1);
        w.stop();
        flush_jobs();
        assert_eq!(runs.get(), 0, "pending job no-ops after stop");
    }
}
