//! Reactive collections: keyed maps and ordered lists.
//!
//! Reads go through tracked accessors keyed by `DepKey`; writes classify as
//! ADD/SET/DELETE/CLEAR and collect the affected deps per operation:
//! additions and deletions also notify iteration (and key-iteration for
//! maps), list additions notify `length`, and truncation notifies every
//! index at or past the new length.

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use lueur_socle::{CompactString, FxHashMap};

use crate::dep::{existing_dep, track_key, Dep, DepKey, TriggerOp};
use crate::effect::DirtyLevel;
use crate::runtime::{self, TrackGuard};
use crate::signal::SameValue;

/// Conversion from a collection key to its dep key.
pub trait DepKeyed {
    fn dep_key(&self) -> DepKey;
}

impl DepKeyed for CompactString {
    fn dep_key(&self) -> DepKey {
        DepKey::Prop(self.clone())
    }
}

impl DepKeyed for String {
    fn dep_key(&self) -> DepKey {
        DepKey::Prop(self.as_str().into())
    }
}

impl DepKeyed for &'static str {
    fn dep_key(&self) -> DepKey {
        DepKey::Prop((*self).into())
    }
}

impl DepKeyed for usize {
    fn dep_key(&self) -> DepKey {
        DepKey::Index(*self)
    }
}

impl DepKeyed for u32 {
    fn dep_key(&self) -> DepKey {
        DepKey::Index(*self as usize)
    }
}

type DepTable = RefCell<FxHashMap<DepKey, Dep>>;

/// Trigger the deps collected for one write operation.
fn trigger_op(deps: &DepTable, key: Option<DepKey>, op: TriggerOp, is_map: bool) {
    runtime::pause_scheduling();

    let mut collected: Vec<Dep> = Vec::new();
    match op {
        TriggerOp::Clear => {
            collected.extend(deps.borrow().values().cloned());
        }
        _ => {
            if let Some(key) = &key {
                if let Some(dep) = existing_dep(deps, key) {
                    collected.push(dep);
                }
            }
            match op {
                TriggerOp::Add => {
                    if let Some(dep) = existing_dep(deps, &DepKey::Iterate) {
                        collected.push(dep);
                    }
                    if is_map {
                        if let Some(dep) = existing_dep(deps, &DepKey::MapKeyIterate) {
                            collected.push(dep);
                        }
                    } else if let Some(dep) = existing_dep(deps, &DepKey::Length) {
                        collected.push(dep);
                    }
                }
                TriggerOp::Delete => {
                    if let Some(dep) = existing_dep(deps, &DepKey::Iterate) {
                        collected.push(dep);
                    }
                    if is_map {
                        if let Some(dep) = existing_dep(deps, &DepKey::MapKeyIterate) {
                            collected.push(dep);
                        }
                    } else if let Some(dep) = existing_dep(deps, &DepKey::Length) {
                        collected.push(dep);
                    }
                }
                TriggerOp::Set => {
                    if is_map {
                        if let Some(dep) = existing_dep(deps, &DepKey::Iterate) {
                            collected.push(dep);
                        }
                    }
                }
                TriggerOp::Clear => unreachable!(),
            }
        }
    }

    for dep in collected {
        dep.trigger(DirtyLevel::Dirty);
    }

    runtime::resume_scheduling();
}

struct MapInner<K, V> {
    data: RefCell<FxHashMap<K, V>>,
    deps: DepTable,
}

/// A reactive keyed collection.
///
/// Clones share the same target; `reactive(reactive(x))` identity holds by
/// construction.
pub struct ReactiveMap<K, V> {
    inner: Rc<MapInner<K, V>>,
}

impl<K, V> Clone for ReactiveMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> Default for ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + DepKeyed,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ReactiveMap<K, V>
where
    K: Eq + Hash + Clone + DepKeyed,
{
    pub fn new() -> Self {
        Self {
            inner: Rc::new(MapInner {
                data: RefCell::new(FxHashMap::default()),
                deps: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    pub fn same_target(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Tracked read of one entry.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        track_key(&self.inner.deps, key.dep_key());
        self.inner.data.borrow().get(key).cloned()
    }

    /// Tracked read by reference.
    pub fn with<R>(&self, key: &K, f: impl FnOnce(Option<&V>) -> R) -> R {
        track_key(&self.inner.deps, key.dep_key());
        f(self.inner.data.borrow().get(key))
    }

    /// Untracked read (the raw escape).
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.data.borrow().get(key).cloned()
    }

    /// Membership test; tracks the key like a read.
    pub fn contains_key(&self, key: &K) -> bool {
        track_key(&self.inner.deps, key.dep_key());
        self.inner.data.borrow().contains_key(key)
    }

    /// Tracked size; subscribes to entry iteration.
    pub fn len(&self) -> usize {
        track_key(&self.inner.deps, DepKey::Iterate);
        self.inner.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key enumeration; subscribes to the key-iteration sentinel only, so
    /// value-only SETs do not re-run key iterators.
    pub fn keys(&self) -> Vec<K> {
        track_key(&self.inner.deps, DepKey::MapKeyIterate);
        self.inner.data.borrow().keys().cloned().collect()
    }

    /// Entry enumeration; subscribes to iteration.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        track_key(&self.inner.deps, DepKey::Iterate);
        self.inner
            .data
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Write an entry; ADD vs SET by prior key presence, with identity
    /// suppression on SET.
    pub fn insert(&self, key: K, value: V) -> Option<V>
    where
        V: SameValue,
    {
        let (prev, op, changed) = {
            let mut data = self.inner.data.borrow_mut();
            match data.get(&key) {
                Some(old) => {
                    let changed = !old.same_value(&value);
                    let prev = data.insert(key.clone(), value);
                    (prev, TriggerOp::Set, changed)
                }
                None => {
                    let prev = data.insert(key.clone(), value);
                    (prev, TriggerOp::Add, true)
                }
            }
        };
        if changed {
            trigger_op(&self.inner.deps, Some(key.dep_key()), op, true);
        }
        prev
    }

    /// Remove an entry; DELETE triggers only when the key existed.
    pub fn remove(&self, key: &K) -> Option<V> {
        let prev = self.inner.data.borrow_mut().remove(key);
        if prev.is_some() {
            trigger_op(&self.inner.deps, Some(key.dep_key()), TriggerOp::Delete, true);
        }
        prev
    }

    /// Remove everything; notifies every dep of the target.
    pub fn clear(&self) {
        let was_empty = self.inner.data.borrow().is_empty();
        self.inner.data.borrow_mut().clear();
        if !was_empty {
            trigger_op(&self.inner.deps, None, TriggerOp::Clear, true);
        }
    }

    /// Seed tracking of every entry and sentinel, for deep watchers.
    pub fn track_all(&self) {
        track_key(&self.inner.deps, DepKey::Iterate);
        track_key(&self.inner.deps, DepKey::MapKeyIterate);
        let keys: Vec<K> = self.inner.data.borrow().keys().cloned().collect();
        for key in keys {
            track_key(&self.inner.deps, key.dep_key());
        }
    }
}

struct ListInner<T> {
    data: RefCell<Vec<T>>,
    deps: DepTable,
}

/// A reactive ordered sequence.
pub struct ReactiveList<T> {
    inner: Rc<ListInner<T>>,
}

impl<T> Clone for ReactiveList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for ReactiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReactiveList<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ListInner {
                data: RefCell::new(Vec::new()),
                deps: RefCell::new(FxHashMap::default()),
            }),
        }
    }

    pub fn same_target(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Tracked indexed read.
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        track_key(&self.inner.deps, DepKey::Index(index));
        self.inner.data.borrow().get(index).cloned()
    }

    /// Untracked indexed read.
    pub fn peek(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.inner.data.borrow().get(index).cloned()
    }

    /// Tracked length.
    pub fn len(&self) -> usize {
        track_key(&self.inner.deps, DepKey::Length);
        self.inner.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumeration: subscribes to length plus every index read.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        track_key(&self.inner.deps, DepKey::Length);
        let data = self.inner.data.borrow().clone();
        for i in 0..data.len() {
            track_key(&self.inner.deps, DepKey::Index(i));
        }
        data
    }

    /// Identity search; tracks like enumeration.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq + Clone,
    {
        self.to_vec().iter().any(|v| v == value)
    }

    /// Identity search; tracks like enumeration.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq + Clone,
    {
        self.to_vec().iter().position(|v| v == value)
    }

    /// Indexed write: SET in range, ADD when writing one past the end.
    pub fn set(&self, index: usize, value: T)
    where
        T: SameValue,
    {
        let (op, changed) = {
            let mut data = self.inner.data.borrow_mut();
            if index < data.len() {
                let changed = !data[index].same_value(&value);
                data[index] = value;
                (TriggerOp::Set, changed)
            } else {
                data.push(value);
                (TriggerOp::Add, true)
            }
        };
        if changed {
            trigger_op(&self.inner.deps, Some(DepKey::Index(index)), op, false);
        }
    }

    /// Append. Tracking is suspended for the duration so an effect pushing
    /// to a list it also reads cannot trigger itself into a loop.
    pub fn push(&self, value: T) {
        let _guard = TrackGuard::pause();
        let index = {
            let mut data = self.inner.data.borrow_mut();
            data.push(value);
            data.len() - 1
        };
        trigger_op(&self.inner.deps, Some(DepKey::Index(index)), TriggerOp::Add, false);
    }

    /// Remove the last element; tracking suspended.
    pub fn pop(&self) -> Option<T> {
        let _guard = TrackGuard::pause();
        let (value, index) = {
            let mut data = self.inner.data.borrow_mut();
            let value = data.pop();
            (value, data.len())
        };
        if value.is_some() {
            trigger_op(
                &self.inner.deps,
                Some(DepKey::Index(index)),
                TriggerOp::Delete,
                false,
            );
        }
        value
    }

    /// Remove the first element; every surviving index shifts.
    pub fn shift(&self) -> Option<T> {
        let _guard = TrackGuard::pause();
        let value = {
            let mut data = self.inner.data.borrow_mut();
            if data.is_empty() {
                None
            } else {
                Some(data.remove(0))
            }
        };
        if value.is_some() {
            self.trigger_from(0);
        }
        value
    }

    /// Prepend; every index shifts.
    pub fn unshift(&self, value: T) {
        let _guard = TrackGuard::pause();
        self.inner.data.borrow_mut().insert(0, value);
        self.trigger_from(0);
    }

    /// Splice: remove `delete_count` items at `start`, inserting `items`.
    pub fn splice(&self, start: usize, delete_count: usize, items: Vec<T>) -> Vec<T> {
        let _guard = TrackGuard::pause();
        let removed = {
            let mut data = self.inner.data.borrow_mut();
            let start = start.min(data.len());
            let end = (start + delete_count).min(data.len());
            data.splice(start..end, items).collect()
        };
        self.trigger_from(start);
        removed
    }

    /// Truncate or grow; notifies `length` plus every index at or past the
    /// new length.
    pub fn set_len(&self, new_len: usize)
    where
        T: Default + Clone,
    {
        let old_len = {
            let mut data = self.inner.data.borrow_mut();
            let old_len = data.len();
            data.resize(new_len, T::default());
            old_len
        };
        runtime::pause_scheduling();
        if let Some(dep) = existing_dep(&self.inner.deps, &DepKey::Length) {
            dep.trigger(DirtyLevel::Dirty);
        }
        for index in new_len..old_len {
            if let Some(dep) = existing_dep(&self.inner.deps, &DepKey::Index(index)) {
                dep.trigger(DirtyLevel::Dirty);
            }
        }
        runtime::resume_scheduling();
    }

    /// Seed tracking of every element and the length, for deep watchers.
    pub fn track_all(&self) {
        track_key(&self.inner.deps, DepKey::Length);
        let len = self.inner.data.borrow().len();
        for i in 0..len {
            track_key(&self.inner.deps, DepKey::Index(i));
        }
    }

    /// Notify every index dep >= start, plus length and iteration.
    fn trigger_from(&self, start: usize) {
        runtime::pause_scheduling();
        let collected: Vec<Dep> = {
            let deps = self.inner.deps.borrow();
            deps.iter()
                .filter_map(|(key, dep)| match key {
                    DepKey::Index(i) if *i >= start => Some(dep.clone()),
                    DepKey::Length | DepKey::Iterate => Some(dep.clone()),
                    _ => None,
                })
                .collect()
        };
        for dep in collected {
            dep.trigger(DirtyLevel::Dirty);
        }
        runtime::resume_scheduling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::effect;
    use std::cell::Cell;

    #[test]
    fn test_map_get_tracks_and_insert_triggers() {
        let map: ReactiveMap<CompactString, i32> = ReactiveMap::new();
        map.insert("a".into(), 1);
        let observed = Rc::new(Cell::new(0));
        let (m, o) = (map.clone(), observed.clone());
        let _e = effect(move || o.set(m.get(&"a".into()).unwrap_or(-1)));
        assert_eq!(observed.get(), 1);

        map.insert("a".into(), 2);
        assert_eq!(observed.get(), 2);

        // Identical write does not trigger
        map.insert("a".into(), 2);
        assert_eq!(observed.get(), 2);
    }

    #[test]
    fn test_map_add_triggers_iteration_not_unrelated_keys() {
        let map: ReactiveMap<CompactString, i32> = ReactiveMap::new();
        map.insert("a".into(), 1);

        let len_runs = Rc::new(Cell::new(0));
        let (m, r) = (map.clone(), len_runs.clone());
        let _len_effect = effect(move || {
            m.len();
            r.set(r.get() + 1);
        });

        let key_runs = Rc::new(Cell::new(0));
        let (m, r) = (map.clone(), key_runs.clone());
        let _key_effect = effect(move || {
            m.get(&"a".into());
            r.set(r.get() + 1);
        });

        map.insert("b".into(), 2);
        assert_eq!(len_runs.get(), 2, "ADD notifies iteration");
        assert_eq!(key_runs.get(), 1, "unrelated key untouched");
    }

    #[test]
    fn test_map_set_does_not_trigger_key_iteration() {
        let map: ReactiveMap<CompactString, i32> = ReactiveMap::new();
        map.insert("a".into(), 1);

        let keys_runs = Rc::new(Cell::new(0));
        let (m, r) = (map.clone(), keys_runs.clone());
        let _keys_effect = effect(move || {
            m.keys();
            r.set(r.get() + 1);
        });

        map.insert("a".into(), 9);
        assert_eq!(keys_runs.get(), 1, "SET keeps the key set unchanged");

        map.insert("b".into(), 1);
        assert_eq!(keys_runs.get(), 2, "ADD changes the key set");

        map.remove(&"b".into());
        assert_eq!(keys_runs.get(), 3, "DELETE changes the key set");
    }

    #[test]
    fn test_map_delete_only_when_present() {
        let map: ReactiveMap<CompactString, i32> = ReactiveMap::new();
        let runs = Rc::new(Cell::new(0));
        let (m, r) = (map.clone(), runs.clone());
        let _e = effect(move || {
            m.len();
            r.set(r.get() + 1);
        });
        map.remove(&"missing".into());
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_map_clear_triggers_everything() {
        let map: ReactiveMap<CompactString, i32> = ReactiveMap::new();
        map.insert("a".into(), 1);
        let runs = Rc::new(Cell::new(0));
        let (m, r) = (map.clone(), runs.clone());
        let _e = effect(move || {
            m.get(&"a".into());
            r.set(r.get() + 1);
        });
        map.clear();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_list_push_inside_effect_runs_once() {
        // push suspends tracking; without it this would loop forever
        let list: ReactiveList<i32> = ReactiveList::new();
        let runs = Rc::new(Cell::new(0));
        let (l, r) = (list.clone(), runs.clone());
        let _e = effect(move || {
            r.set(r.get() + 1);
            l.push(1);
        });
        assert_eq!(runs.get(), 1);
        assert_eq!(list.peek(0), Some(1));
    }

    #[test]
    fn test_list_len_effect_sees_push() {
        let list: ReactiveList<i32> = ReactiveList::new();
        let observed = Rc::new(Cell::new(0));
        let (l, o) = (list.clone(), observed.clone());
        let _e = effect(move || o.set(l.len()));
        assert_eq!(observed.get(), 0);
        list.push(7);
        assert_eq!(observed.get(), 1);
    }

    #[test]
    fn test_list_set_len_triggers_truncated_indices() {
        let list: ReactiveList<i32> = ReactiveList::new();
        for i in 0..4 {
            list.push(i);
        }
        let observed = Rc::new(Cell::new(None));
        let (l, o) = (list.clone(), observed.clone());
        let _e = effect(move || o.set(l.get(3)));
        assert_eq!(observed.get(), Some(3));

        list.set_len(2);
        assert_eq!(observed.get(), None);
    }

    #[test]
    fn test_list_indexed_set_does_not_touch_other_indices() {
        let list: ReactiveList<i32> = ReactiveList::new();
        list.push(1);
        list.push(2);
        let runs = Rc::new(Cell::new(0));
        let (l, r) = (list.clone(), runs.clone());
        let _e = effect(move || {
            l.get(0);
            r.set(r.get() + 1);
        });
        list.set(1, 20);
        assert_eq!(runs.get(), 1);
        list.set(0, 10);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_clone_shares_target() {
        let a: ReactiveList<i32> = ReactiveList::new();
        let b = a.clone();
        assert!(a.same_target(&b));
        b.push(1);
        assert_eq!(a.peek(0), Some(1));
    }
}
