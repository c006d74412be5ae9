//! Optimization flag bitmasks shared between the compiler and the runtime.
//!
//! The numeric values are a wire contract: generated render code embeds them
//! as literals, and the reconciler interprets them at patch time. They must
//! never be renumbered.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

bitflags::bitflags! {
    /// Patch flags tell the reconciler which facets of a vnode may change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PatchFlags: i32 {
        /// Dynamic text content
        const TEXT = 1;
        /// Dynamic class binding
        const CLASS = 1 << 1;
        /// Dynamic style binding
        const STYLE = 1 << 2;
        /// Dynamic non-class/style props
        const PROPS = 1 << 3;
        /// Props with dynamic keys, full diff required
        const FULL_PROPS = 1 << 4;
        /// Element needs props hydration
        const NEED_HYDRATION = 1 << 5;
        /// Fragment whose children order never changes
        const STABLE_FRAGMENT = 1 << 6;
        /// Fragment with keyed children
        const KEYED_FRAGMENT = 1 << 7;
        /// Fragment with unkeyed children
        const UNKEYED_FRAGMENT = 1 << 8;
        /// Only non-props patch needed (directives, refs)
        const NEED_PATCH = 1 << 9;
        /// Component with dynamic slot names
        const DYNAMIC_SLOTS = 1 << 10;
        /// Dev only: root fragment added by the dev tooling
        const DEV_ROOT_FRAGMENT = 1 << 11;
        /// Static hoisted node, skip entirely
        const HOISTED = -1i32;
        /// Bail out of optimized mode
        const BAIL = -2i32;
    }
}

impl PatchFlags {
    /// Whether this flag marks a node the diff can skip or must bail on
    /// rather than a facet set.
    pub fn is_non_facet(&self) -> bool {
        self.bits() < 0
    }

    /// Get flag names for display in generated-code comments and debugging.
    pub fn flag_names(&self) -> SmallVec<[&'static str; 8]> {
        let mut names = SmallVec::new();
        if self.bits() == Self::HOISTED.bits() {
            names.push("HOISTED");
            return names;
        }
        if self.bits() == Self::BAIL.bits() {
            names.push("BAIL");
            return names;
        }
        if self.contains(Self::TEXT) {
            names.push("TEXT");
        }
        if self.contains(Self::CLASS) {
            names.push("CLASS");
        }
        if self.contains(Self::STYLE) {
            names.push("STYLE");
        }
        if self.contains(Self::PROPS) {
            names.push("PROPS");
        }
        if self.contains(Self::FULL_PROPS) {
            names.push("FULL_PROPS");
        }
        if self.contains(Self::NEED_HYDRATION) {
            names.push("NEED_HYDRATION");
        }
        if self.contains(Self::STABLE_FRAGMENT) {
            names.push("STABLE_FRAGMENT");
        }
        if self.contains(Self::KEYED_FRAGMENT) {
            names.push("KEYED_FRAGMENT");
        }
        if self.contains(Self::UNKEYED_FRAGMENT) {
            names.push("UNKEYED_FRAGMENT");
        }
        if self.contains(Self::NEED_PATCH) {
            names.push("NEED_PATCH");
        }
        if self.contains(Self::DYNAMIC_SLOTS) {
            names.push("DYNAMIC_SLOTS");
        }
        if self.contains(Self::DEV_ROOT_FRAGMENT) {
            names.push("DEV_ROOT_FRAGMENT");
        }
        names
    }
}

bitflags::bitflags! {
    /// Shape flags classify a vnode's kind and the shape of its children.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ShapeFlags: u16 {
        const ELEMENT = 1;
        const FUNCTIONAL_COMPONENT = 1 << 1;
        const STATEFUL_COMPONENT = 1 << 2;
        const TEXT_CHILDREN = 1 << 3;
        const ARRAY_CHILDREN = 1 << 4;
        const SLOTS_CHILDREN = 1 << 5;
        const TELEPORT = 1 << 6;
        const SUSPENSE = 1 << 7;
        const COMPONENT_SHOULD_KEEP_ALIVE = 1 << 8;
        const COMPONENT_KEPT_ALIVE = 1 << 9;
        const COMPONENT = Self::STATEFUL_COMPONENT.bits() | Self::FUNCTIONAL_COMPONENT.bits();
    }
}

impl ShapeFlags {
    pub fn is_component(&self) -> bool {
        self.intersects(Self::COMPONENT)
    }

    pub fn is_element(&self) -> bool {
        self.contains(Self::ELEMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_flag_values_are_wire_stable() {
        assert_eq!(PatchFlags::TEXT.bits(), 1);
        assert_eq!(PatchFlags::CLASS.bits(), 2);
        assert_eq!(PatchFlags::STYLE.bits(), 4);
        assert_eq!(PatchFlags::PROPS.bits(), 8);
        assert_eq!(PatchFlags::FULL_PROPS.bits(), 16);
        assert_eq!(PatchFlags::NEED_HYDRATION.bits(), 32);
        assert_eq!(PatchFlags::STABLE_FRAGMENT.bits(), 64);
        assert_eq!(PatchFlags::KEYED_FRAGMENT.bits(), 128);
        assert_eq!(PatchFlags::UNKEYED_FRAGMENT.bits(), 256);
        assert_eq!(PatchFlags::NEED_PATCH.bits(), 512);
        assert_eq!(PatchFlags::DYNAMIC_SLOTS.bits(), 1024);
        assert_eq!(PatchFlags::DEV_ROOT_FRAGMENT.bits(), 2048);
        assert_eq!(PatchFlags::HOISTED.bits(), -1);
        assert_eq!(PatchFlags::BAIL.bits(), -2);
    }

    #[test]
    fn test_shape_flag_values_are_wire_stable() {
        assert_eq!(ShapeFlags::ELEMENT.bits(), 1);
        assert_eq!(ShapeFlags::FUNCTIONAL_COMPONENT.bits(), 2);
        assert_eq!(ShapeFlags::STATEFUL_COMPONENT.bits(), 4);
        assert_eq!(ShapeFlags::TEXT_CHILDREN.bits(), 8);
        assert_eq!(ShapeFlags::ARRAY_CHILDREN.bits(), 16);
        assert_eq!(ShapeFlags::SLOTS_CHILDREN.bits(), 32);
        assert_eq!(ShapeFlags::TELEPORT.bits(), 64);
        assert_eq!(ShapeFlags::SUSPENSE.bits(), 128);
        assert_eq!(ShapeFlags::COMPONENT_SHOULD_KEEP_ALIVE.bits(), 256);
        assert_eq!(ShapeFlags::COMPONENT_KEPT_ALIVE.bits(), 512);
    }

    #[test]
    fn test_flag_names() {
        let flags = PatchFlags::TEXT | PatchFlags::CLASS;
        assert_eq!(flags.flag_names().as_slice(), &["TEXT", "CLASS"]);
        assert_eq!(PatchFlags::HOISTED.flag_names().as_slice(), &["HOISTED"]);
    }

    #[test]
    fn test_component_composite() {
        assert!(ShapeFlags::STATEFUL_COMPONENT.is_component());
        assert!(ShapeFlags::FUNCTIONAL_COMPONENT.is_component());
        assert!(!ShapeFlags::ELEMENT.is_component());
    }
}
