//! Reactive effects: the subscribers of the dependency graph.
//!
//! The run protocol: bump the track-id, reset the dep cursor, push as
//! active, invoke the function (which re-records deps under the new
//! track-id), pop, then truncate the dep list back to the cursor and remove
//! this effect from any deps beyond it. A depth counter suppresses
//! self-triggering during set-within-run unless `allow_recurse` is set.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lueur_socle::SmallVec;

use crate::dep::Dep;
use crate::runtime;

pub type EffectId = u64;

/// Tri-state dirtiness for effects and computed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum DirtyLevel {
    NotDirty = 0,
    /// An upstream computed may have changed; settle before re-running
    MaybeDirty = 1,
    Dirty = 2,
}

pub(crate) struct EffectInner {
    pub(crate) id: EffectId,
    pub(crate) active: Cell<bool>,
    pub(crate) track_id: Cell<u32>,
    pub(crate) runnings: Cell<u32>,
    pub(crate) dirty: Cell<DirtyLevel>,
    pub(crate) allow_recurse: Cell<bool>,
    pub(crate) should_schedule: Cell<bool>,
    pub(crate) deps: RefCell<SmallVec<[Dep; 4]>>,
    pub(crate) deps_len: Cell<usize>,
    func: RefCell<Box<dyn FnMut()>>,
    pub(crate) scheduler: RefCell<Option<Rc<dyn Fn()>>>,
}

fn next_effect_id() -> EffectId {
    thread_local! {
        static NEXT: Cell<EffectId> = const { Cell::new(1) };
    }
    NEXT.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// A handle to a reactive effect.
#[derive(Clone)]
pub struct ReactiveEffect {
    pub(crate) inner: Rc<EffectInner>,
}

impl ReactiveEffect {
    /// Create an effect without running it.
    pub fn new(f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(EffectInner {
                id: next_effect_id(),
                active: Cell::new(true),
                track_id: Cell::new(0),
                runnings: Cell::new(0),
                dirty: Cell::new(DirtyLevel::Dirty),
                allow_recurse: Cell::new(false),
                should_schedule: Cell::new(false),
                deps: RefCell::new(SmallVec::new()),
                deps_len: Cell::new(0),
                func: RefCell::new(Box::new(f)),
                scheduler: RefCell::new(None),
            }),
        }
    }

    /// Attach a scheduler invoked instead of a direct re-run on trigger.
    pub fn set_scheduler(&self, scheduler: impl Fn() + 'static) {
        *self.inner.scheduler.borrow_mut() = Some(Rc::new(scheduler));
    }

    /// Detach the scheduler (breaks effect/job reference cycles on stop).
    pub fn clear_scheduler(&self) {
        *self.inner.scheduler.borrow_mut() = None;
    }

    pub fn set_allow_recurse(&self, allow: bool) {
        self.inner.allow_recurse.set(allow);
    }

    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Run the effect, re-collecting its dependencies.
    pub fn run(&self) {
        run_effect(&self.inner);
    }

    /// Whether the effect needs a re-run, settling MaybeDirty through its
    /// upstream computeds first.
    pub fn dirty(&self) -> bool {
        resolve_dirty(&self.inner)
    }

    pub(crate) fn mark_dirty(&self, level: DirtyLevel) {
        self.inner.dirty.set(level);
    }

    /// Detach from every dep and deactivate; a stopped effect still runs its
    /// function when invoked directly but no longer tracks.
    pub fn stop(&self) {
        if !self.inner.active.replace(false) {
            return;
        }
        let deps: Vec<Dep> = self.inner.deps.borrow_mut().drain(..).collect();
        self.inner.deps_len.set(0);
        for dep in deps {
            dep.remove_sub(self.inner.id);
        }
    }
}

pub(crate) fn run_effect(effect: &Rc<EffectInner>) {
    if !effect.active.get() {
        // Stopped effects execute untracked
        let _guard = runtime::TrackGuard::pause();
        (effect.func.borrow_mut())();
        return;
    }

    effect.dirty.set(DirtyLevel::NotDirty);
    effect.should_schedule.set(false);
    effect.track_id.set(effect.track_id.get().wrapping_add(1));
    effect.deps_len.set(0);
    effect.runnings.set(effect.runnings.get() + 1);
    runtime::push_effect(effect.clone());

    (effect.func.borrow_mut())();

    runtime::pop_effect();
    effect.runnings.set(effect.runnings.get() - 1);

    // Deps beyond the cursor were not re-recorded this run
    let stale: Vec<Dep> = {
        let mut deps = effect.deps.borrow_mut();
        let keep = effect.deps_len.get();
        if deps.len() > keep {
            deps.drain(keep..).collect()
        } else {
            Vec::new()
        }
    };
    for dep in stale {
        cleanup_dep_effect(&dep, effect);
    }
}

/// Resolve tri-state dirtiness: MaybeDirty re-evaluates upstream computeds
/// and settles to Dirty or NotDirty.
pub(crate) fn resolve_dirty(effect: &Rc<EffectInner>) -> bool {
    if effect.dirty.get() == DirtyLevel::MaybeDirty {
        runtime::pause_tracking();
        let deps_len = effect.deps_len.get();
        for i in 0..deps_len {
            let dep = {
                let deps = effect.deps.borrow();
                match deps.get(i) {
                    Some(dep) => dep.clone(),
                    None => break,
                }
            };
            let computed = dep.inner.computed.borrow().as_ref().and_then(|w| w.upgrade());
            if let Some(computed) = computed {
                computed.refresh();
                if effect.dirty.get() == DirtyLevel::Dirty {
                    break;
                }
            }
        }
        if effect.dirty.get() == DirtyLevel::MaybeDirty {
            effect.dirty.set(DirtyLevel::NotDirty);
        }
        runtime::reset_tracking();
    }
    effect.dirty.get() == DirtyLevel::Dirty
}

/// Subscribe the running effect to a dep under its current track-id,
/// maintaining the dep-list cursor.
pub(crate) fn track_effect(effect: &Rc<EffectInner>, dep: &Dep) {
    let track_id = effect.track_id.get();
    let already = dep
        .inner
        .subs
        .borrow()
        .get(&effect.id)
        .is_some_and(|sub| sub.track_id == track_id);
    if already {
        return;
    }

    dep.inner.subs.borrow_mut().insert(
        effect.id,
        crate::dep::DepSub {
            track_id,
            effect: Rc::downgrade(effect),
        },
    );

    let cursor = effect.deps_len.get();
    let old = effect.deps.borrow().get(cursor).cloned();
    match old {
        Some(existing) if existing.ptr_eq(dep) => {
            effect.deps_len.set(cursor + 1);
        }
        Some(existing) => {
            cleanup_dep_effect(&existing, effect);
            effect.deps.borrow_mut()[cursor] = dep.clone();
            effect.deps_len.set(cursor + 1);
        }
        None => {
            effect.deps.borrow_mut().push(dep.clone());
            effect.deps_len.set(cursor + 1);
        }
    }
}

/// Drop a stale subscription: the dep's recorded track-id no longer matches
/// the effect's current one.
pub(crate) fn cleanup_dep_effect(dep: &Dep, effect: &Rc<EffectInner>) {
    let stale = dep
        .inner
        .subs
        .borrow()
        .get(&effect.id)
        .is_some_and(|sub| sub.track_id != effect.track_id.get());
    if stale {
        dep.remove_sub(effect.id);
    }
}

/// Notify a dep's subscribers, raising them to `dirty_level` and queueing
/// their schedulers. Runs under a scheduling pause so re-entrant triggers
/// batch into one drain.
pub(crate) fn trigger_effects(dep: &Dep, dirty_level: DirtyLevel) {
    runtime::pause_scheduling();

    let subs: Vec<(EffectId, u32, Option<Rc<EffectInner>>)> = dep
        .inner
        .subs
        .borrow()
        .iter()
        .map(|(id, sub)| (*id, sub.track_id, sub.effect.upgrade()))
        .collect();

    for (id, track_id, effect) in subs {
        let Some(effect) = effect else {
            // The effect was dropped; prune the dead entry
            dep.remove_sub(id);
            continue;
        };
        if track_id != effect.track_id.get() {
            continue;
        }
        if effect.dirty.get() < dirty_level {
            let was_clean = effect.dirty.get() == DirtyLevel::NotDirty;
            effect.dirty.set(dirty_level);
            if was_clean {
                effect.should_schedule.set(true);
            }
        }
        if effect.should_schedule.get()
            && (effect.runnings.get() == 0 || effect.allow_recurse.get())
        {
            let scheduler = effect.scheduler.borrow().clone();
            if let Some(scheduler) = scheduler {
                effect.should_schedule.set(false);
                runtime::enqueue_scheduler(scheduler);
            }
        }
    }

    runtime::resume_scheduling();
}

/// Create an effect that runs immediately and re-runs when its dependencies
/// change.
pub fn effect(f: impl FnMut() + 'static) -> ReactiveEffect {
    let handle = ReactiveEffect::new(f);
    // The scheduler must not keep the effect alive on its own
    let weak = Rc::downgrade(&handle.inner);
    handle.set_scheduler(move || {
        if let Some(inner) = weak.upgrade() {
            if resolve_dirty(&inner) {
                run_effect(&inner);
            }
        }
    });
    handle.run();
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use std::cell::Cell as StdCell;

    #[test]
    fn test_effect_runs_immediately() {
        let count = Rc::new(StdCell::new(0));
        let c = count.clone();
        let _e = effect(move || c.set(c.get() + 1));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_effect_reruns_on_write() {
        let source = Signal::new(1);
        let observed = Rc::new(StdCell::new(0));
        let (s, o) = (source.clone(), observed.clone());
        let _e = effect(move || o.set(s.get()));
        assert_eq!(observed.get(), 1);

        source.set(2);
        assert_eq!(observed.get(), 2);
    }

    #[test]
    fn test_same_value_write_does_not_trigger() {
        let source = Signal::new(1);
        let runs = Rc::new(StdCell::new(0));
        let (s, r) = (source.clone(), runs.clone());
        let _e = effect(move || {
            s.get();
            r.set(r.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        source.set(1);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_nan_over_nan_does_not_trigger() {
        let source = Signal::new(f64::NAN);
        let runs = Rc::new(StdCell::new(0));
        let (s, r) = (source.clone(), runs.clone());
        let _e = effect(move || {
            s.get();
            r.set(r.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        source.set(f64::NAN);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_dependency_switch_cleans_up_old_dep() {
        let toggle = Signal::new(true);
        let a = Signal::new(1);
        let b = Signal::new(10);
        let observed = Rc::new(StdCell::new(0));
        let (t, sa, sb, o) = (toggle.clone(), a.clone(), b.clone(), observed.clone());
        let _e = effect(move || {
            let v = if t.get() { sa.get() } else { sb.get() };
            o.set(v);
        });
        assert_eq!(observed.get(), 1);
        assert_eq!(a.dep().subscriber_count(), 1);

        toggle.set(false);
        assert_eq!(observed.get(), 10);
        // The subscription on `a` is stale now
        assert_eq!(a.dep().subscriber_count(), 0);

        a.set(5);
        assert_eq!(observed.get(), 10);
        b.set(20);
        assert_eq!(observed.get(), 20);
    }

    #[test]
    fn test_subscription_invariant() {
        let source = Signal::new(1);
        let s = source.clone();
        let e = effect(move || {
            s.get();
        });
        assert!(source.dep().is_subscribed(&e));
        e.stop();
        assert!(!source.dep().is_subscribed(&e));
        assert_eq!(source.dep().subscriber_count(), 0);
    }

    #[test]
    fn test_stopped_effect_does_not_rerun() {
        let source = Signal::new(1);
        let runs = Rc::new(StdCell::new(0));
        let (s, r) = (source.clone(), runs.clone());
        let e = effect(move || {
            s.get();
            r.set(r.get() + 1);
        });
        e.stop();
        source.set(2);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_self_write_suppressed_without_allow_recurse() {
        // Writing a dependency inside the effect must not loop
        let source = Signal::new(0);
        let runs = Rc::new(StdCell::new(0));
        let (s, r) = (source.clone(), runs.clone());
        let _e = effect(move || {
            r.set(r.get() + 1);
            let v = s.get();
            if v < 3 {
                s.set(v + 1);
            }
        });
        // The self-write marks the effect dirty but does not re-enter
        assert_eq!(runs.get(), 1);
        assert_eq!(source.peek(), 1);
    }
}
