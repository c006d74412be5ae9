//! Lazily evaluated computed values with tri-state dirtiness.
//!
//! A computed caches its getter's result. Upstream writes mark the computed
//! Dirty and demote its own subscribers to MaybeDirty; a MaybeDirty reader
//! re-evaluates the computed chain and settles before deciding to re-run.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dep::Dep;
use crate::effect::{DirtyLevel, ReactiveEffect};

/// Internal hook used by dirty resolution to re-evaluate a computed a dep
/// belongs to.
pub(crate) trait ComputedSource {
    fn refresh(&self);
}

pub(crate) struct ComputedInner<T> {
    value: RefCell<Option<T>>,
    dep: Dep,
    effect: RefCell<Option<ReactiveEffect>>,
}

impl<T: PartialEq + 'static> ComputedSource for ComputedInner<T> {
    fn refresh(&self) {
        let effect = self.effect.borrow().clone();
        if let Some(effect) = effect {
            if effect.dirty() {
                effect.run();
            }
        }
    }
}

/// A cached derived value.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: PartialEq + 'static> Computed<T> {
    pub fn new(mut getter: impl FnMut() -> T + 'static) -> Self {
        let inner = Rc::new(ComputedInner {
            value: RefCell::new(None),
            dep: Dep::new(),
            effect: RefCell::new(None),
        });

        // Recompute; a changed result promotes MaybeDirty subscribers to
        // Dirty so they actually re-run.
        let weak = Rc::downgrade(&inner);
        let run_fn = move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let next = getter();
            let changed = {
                let mut slot = inner.value.borrow_mut();
                let changed = slot.as_ref() != Some(&next);
                *slot = Some(next);
                changed
            };
            if changed {
                inner.dep.trigger(DirtyLevel::Dirty);
            }
        };

        let effect = ReactiveEffect::new(run_fn);
        // Upstream writes only demote downstream to MaybeDirty; evaluation
        // stays lazy.
        let weak = Rc::downgrade(&inner);
        effect.set_scheduler(move || {
            if let Some(inner) = weak.upgrade() {
                inner.dep.trigger(DirtyLevel::MaybeDirty);
            }
        });
        *inner.effect.borrow_mut() = Some(effect);

        let source: Rc<dyn ComputedSource> = inner.clone();
        inner.dep.set_computed(Rc::downgrade(&source));

        Self { inner }
    }

    /// The computed's dep (exposed for graph assertions).
    pub fn dep(&self) -> &Dep {
        &self.inner.dep
    }

    /// Tracked read, re-evaluating if dirty.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.dep.track();
        self.inner.refresh();
        self.inner
            .value
            .borrow()
            .clone()
            .expect("computed evaluated on first read")
    }

    /// Untracked read of the current cache, re-evaluating if dirty.
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.refresh();
        self.inner
            .value
            .borrow()
            .clone()
            .expect("computed evaluated on first read")
    }
}

/// Create a computed value.
pub fn computed<T: PartialEq + 'static>(getter: impl FnMut() -> T + 'static) -> Computed<T> {
    Computed::new(getter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::effect;
    use crate::signal::Signal;
    use std::cell::Cell;

    #[test]
    fn test_lazy_evaluation() {
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let c = computed(move || {
            r.set(r.get() + 1);
            42
        });
        assert_eq!(runs.get(), 0);
        assert_eq!(c.get(), 42);
        assert_eq!(runs.get(), 1);
        // Cached until invalidated
        assert_eq!(c.get(), 42);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_chained_computeds_settle_with_single_recompute() {
        let a = Signal::new(1);
        let b_runs = Rc::new(Cell::new(0));
        let (sa, br) = (a.clone(), b_runs.clone());
        let b = computed(move || {
            br.set(br.get() + 1);
            sa.get() + 1
        });
        let b2 = b.clone();
        let c = computed(move || b2.get() + 1);

        assert_eq!(c.get(), 3);
        assert_eq!(b_runs.get(), 1);

        a.set(2);
        assert_eq!(c.get(), 4);
        assert_eq!(b_runs.get(), 2);
    }

    #[test]
    fn test_unchanged_computed_does_not_rerun_downstream() {
        let a = Signal::new(1);
        let sa = a.clone();
        let parity = computed(move || sa.get() % 2);
        let runs = Rc::new(Cell::new(0));
        let (p, r) = (parity.clone(), runs.clone());
        let _e = effect(move || {
            p.get();
            r.set(r.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        // 1 -> 3 keeps parity; the effect settles MaybeDirty to NotDirty
        a.set(3);
        assert_eq!(runs.get(), 1);

        a.set(4);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_effect_observes_computed() {
        let a = Signal::new(1);
        let sa = a.clone();
        let doubled = computed(move || sa.get() * 2);
        let observed = Rc::new(Cell::new(0));
        let (d, o) = (doubled.clone(), observed.clone());
        let _e = effect(move || o.set(d.get()));
        assert_eq!(observed.get(), 2);

        a.set(5);
        assert_eq!(observed.get(), 10);
    }
}
