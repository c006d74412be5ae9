//! Single-value reactive cells.

use std::cell::RefCell;
use std::rc::Rc;

use lueur_socle::CompactString;

use crate::dep::Dep;
use crate::effect::DirtyLevel;

/// Value identity for change detection. Follows the `x !== x` rule: NaN
/// written over NaN is not a change.
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

macro_rules! same_value_via_eq {
    ($($ty:ty),* $(,)?) => {
        $(impl SameValue for $ty {
            #[inline]
            fn same_value(&self, other: &Self) -> bool {
                self == other
            }
        })*
    };
}

same_value_via_eq!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char,
    String, CompactString, &'static str,
);

impl SameValue for f64 {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        // NaN is identical to itself here, unlike PartialEq
        self == other || (self != self && other != other)
    }
}

impl SameValue for f32 {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        self == other || (self != self && other != other)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_value(b),
            _ => false,
        }
    }
}

struct SignalInner<T> {
    value: RefCell<T>,
    dep: Dep,
}

/// A single reactive value. Reads track the active effect; writes trigger
/// subscribers unless the new value is identical to the old one.
///
/// Cloning a `Signal` shares the underlying cell, so every clone observes
/// and produces the same reactivity.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                dep: Dep::new(),
            }),
        }
    }

    /// The signal's dep (exposed for graph assertions).
    pub fn dep(&self) -> &Dep {
        &self.inner.dep
    }

    /// Whether two handles point at the same cell.
    pub fn same_target(&self, other: &Signal<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Tracked read by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.dep.track();
        f(&self.inner.value.borrow())
    }

    /// Untracked read by reference (the raw escape).
    pub fn with_raw<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Mutate in place and trigger unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.inner.dep.trigger(DirtyLevel::Dirty);
    }

    /// Replace the value and trigger without a change check.
    pub fn set_force(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.inner.dep.trigger(DirtyLevel::Dirty);
    }
}

impl<T: Clone> Signal<T> {
    /// Tracked read.
    pub fn get(&self) -> T {
        self.inner.dep.track();
        self.inner.value.borrow().clone()
    }

    /// Untracked read.
    pub fn peek(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: SameValue> Signal<T> {
    /// Replace the value; triggers only when the value actually changed.
    pub fn set(&self, value: T) {
        let changed = !self.inner.value.borrow().same_value(&value);
        if changed {
            *self.inner.value.borrow_mut() = value;
            self.inner.dep.trigger(DirtyLevel::Dirty);
        }
    }
}

impl<T: Default> Default for Signal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal").field(&self.inner.value.borrow()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_target() {
        let a = Signal::new(1);
        let b = a.clone();
        assert!(a.same_target(&b));
        b.set(2);
        assert_eq!(a.peek(), 2);
    }

    #[test]
    fn test_same_value_rules() {
        assert!(1.same_value(&1));
        assert!(!1.same_value(&2));
        assert!(f64::NAN.same_value(&f64::NAN));
        assert!(!0.0f64.same_value(&1.0));
        assert!(Some(f64::NAN).same_value(&Some(f64::NAN)));
    }

    #[test]
    fn test_with_raw_does_not_track() {
        let s = Signal::new(5);
        let runs = std::rc::Rc::new(std::cell::Cell::new(0));
        let (sig, r) = (s.clone(), runs.clone());
        let _e = crate::effect::effect(move || {
            sig.with_raw(|v| *v);
            r.set(r.get() + 1);
        });
        s.set(6);
        assert_eq!(runs.get(), 1);
    }
}
