//! Dependencies: the subscriber sets of the reactivity graph.
//!
//! A `Dep` maps effect ids to the track-id the effect carried when it last
//! subscribed. An entry is live iff its recorded track-id equals the
//! effect's current one; stale entries are skipped on trigger and pruned on
//! cleanup. Each reactive target owns its deps in a key-indexed table, so
//! dropping the target drops the deps with it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lueur_socle::{CompactString, FxHashMap};

use crate::computed::ComputedSource;
use crate::effect::{DirtyLevel, EffectId, EffectInner};
use crate::runtime;

/// Key under which a dep is stored on its target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepKey {
    /// Named property of a map-like target
    Prop(CompactString),
    /// Integer index of a list target
    Index(usize),
    /// List length
    Length,
    /// Value/entry enumeration
    Iterate,
    /// Key enumeration of a map target
    MapKeyIterate,
    /// The single value of a signal or computed
    Value,
}

/// Write operation kinds, deciding which extra deps a trigger collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOp {
    Set,
    Add,
    Delete,
    Clear,
}

pub(crate) struct DepSub {
    pub(crate) track_id: u32,
    pub(crate) effect: Weak<EffectInner>,
}

pub(crate) struct DepInner {
    pub(crate) subs: RefCell<FxHashMap<EffectId, DepSub>>,
    /// Invoked when the subscriber set becomes empty
    cleanup: RefCell<Option<Box<dyn Fn()>>>,
    /// Back-reference to the computed this dep belongs to, used to settle
    /// MaybeDirty subscribers
    pub(crate) computed: RefCell<Option<Weak<dyn ComputedSource>>>,
}

/// A dependency: one (target, key) subscriber set.
#[derive(Clone)]
pub struct Dep {
    pub(crate) inner: Rc<DepInner>,
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl Dep {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                subs: RefCell::new(FxHashMap::default()),
                cleanup: RefCell::new(None),
                computed: RefCell::new(None),
            }),
        }
    }

    /// Create a dep that runs `cleanup` once its subscriber set empties.
    pub fn with_cleanup(cleanup: impl Fn() + 'static) -> Self {
        let dep = Self::new();
        *dep.inner.cleanup.borrow_mut() = Some(Box::new(cleanup));
        dep
    }

    pub(crate) fn set_computed(&self, computed: Weak<dyn ComputedSource>) {
        *self.inner.computed.borrow_mut() = Some(computed);
    }

    pub(crate) fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live subscribers (for assertions and tests).
    pub fn subscriber_count(&self) -> usize {
        self.inner.subs.borrow().len()
    }

    /// Whether the given effect is currently subscribed with its live
    /// track-id.
    pub fn is_subscribed(&self, effect: &crate::effect::ReactiveEffect) -> bool {
        self.inner
            .subs
            .borrow()
            .get(&effect.id())
            .is_some_and(|sub| {
                sub.effect
                    .upgrade()
                    .is_some_and(|e| e.track_id.get() == sub.track_id)
            })
    }

    /// Record the active effect as a subscriber. No-op when tracking is
    /// disabled or no effect is running.
    pub fn track(&self) {
        if !runtime::should_track() {
            return;
        }
        let Some(effect) = runtime::active_effect() else {
            return;
        };
        crate::effect::track_effect(&effect, self);
    }

    /// Notify subscribers at the given dirty level.
    pub fn trigger(&self, dirty: DirtyLevel) {
        crate::effect::trigger_effects(self, dirty);
    }

    pub(crate) fn remove_sub(&self, id: EffectId) {
        let became_empty = {
            let mut subs = self.inner.subs.borrow_mut();
            subs.remove(&id);
            subs.is_empty()
        };
        if became_empty {
            if let Some(cleanup) = self.inner.cleanup.borrow().as_ref() {
                cleanup();
            }
        }
    }
}

/// Get-or-create the dep for a key in a target's dep table, and track it.
pub(crate) fn track_key(deps: &RefCell<FxHashMap<DepKey, Dep>>, key: DepKey) {
    if !runtime::should_track() || runtime::active_effect().is_none() {
        return;
    }
    let dep = {
        let mut table = deps.borrow_mut();
        table.entry(key).or_insert_with(Dep::new).clone()
    };
    dep.track();
}

/// Look up an existing dep without creating one.
pub(crate) fn existing_dep(
    deps: &RefCell<FxHashMap<DepKey, Dep>>,
    key: &DepKey,
) -> Option<Dep> {
    deps.borrow().get(key).cloned()
}
