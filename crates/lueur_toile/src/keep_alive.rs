//! KeepAlive cache state.
//!
//! Maps cache keys (vnode key if present, else component descriptor
//! identity) to cached component vnodes, with an insertion-ordered key list
//! enforcing least-recently-used eviction at `max`. Cached components are
//! moved into a detached storage container on removal instead of being
//! unmounted. Configuration (`max`, `include`, `exclude`) arrives as props
//! on the KeepAlive vnode.

use std::rc::Rc;

use lueur_socle::{CompactString, FxHashMap};

use crate::component::{ComponentDef, ComponentKind, RenderFn, SetupContext};
use crate::host::HostNode;
use crate::vnode::{PropMap, PropValue, VNodeKey, VNodeRef, VNodeType};

/// Cache key: the vnode's key when present, otherwise descriptor identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Key(VNodeKey),
    Def(usize),
}

impl CacheKey {
    pub fn for_vnode(vnode: &VNodeRef) -> Option<CacheKey> {
        let n = vnode.borrow();
        if let Some(key) = &n.key {
            return Some(CacheKey::Key(key.clone()));
        }
        match &n.vtype {
            VNodeType::Component(def) => Some(CacheKey::Def(Rc::as_ptr(def) as usize)),
            _ => None,
        }
    }
}

/// Include/exclude patterns: comma-separated component names.
#[derive(Debug, Clone, Default)]
pub struct NamePattern {
    names: Vec<CompactString>,
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Self {
        Self {
            names: pattern
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(CompactString::from)
                .collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// Per-KeepAlive-instance cache state.
pub struct KeepAliveState {
    pub max: Option<usize>,
    pub include: Option<NamePattern>,
    pub exclude: Option<NamePattern>,
    pub cache: FxHashMap<CacheKey, VNodeRef>,
    /// Insertion-ordered keys; front is least recently activated
    pub keys: Vec<CacheKey>,
    /// Detached container the host nodes of deactivated components park in
    pub storage: HostNode,
    /// Key of the child rendered this cycle, committed after its patch
    pub pending: Option<CacheKey>,
}

impl KeepAliveState {
    /// Build state from a KeepAlive vnode's props.
    pub fn from_props(props: &PropMap, storage: HostNode) -> Self {
        let max = match props.get("max") {
            Some(PropValue::Num(n)) if *n > 0.0 => Some(*n as usize),
            Some(PropValue::Str(s)) => s.parse().ok(),
            _ => None,
        };
        let include = props
            .get("include")
            .and_then(PropValue::as_str)
            .map(NamePattern::parse);
        let exclude = props
            .get("exclude")
            .and_then(PropValue::as_str)
            .map(NamePattern::parse);
        Self {
            max,
            include,
            exclude,
            cache: FxHashMap::default(),
            keys: Vec::new(),
            storage,
            pending: None,
        }
    }

    /// Whether a component name participates in caching.
    pub fn should_cache(&self, name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.matches(name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.matches(name) {
                return false;
            }
        }
        true
    }

    /// LRU refresh on a cache hit: remove-then-reinsert the key.
    pub fn refresh_key(&mut self, key: &CacheKey) {
        self.keys.retain(|k| k != key);
        self.keys.push(key.clone());
    }

    /// Record a new cached entry; returns the evicted entry when over
    /// capacity.
    pub fn insert(&mut self, key: CacheKey, vnode: VNodeRef) -> Option<(CacheKey, VNodeRef)> {
        if !self.keys.contains(&key) {
            self.keys.push(key.clone());
        }
        self.cache.insert(key, vnode);
        if let Some(max) = self.max {
            if self.keys.len() > max {
                let evicted_key = self.keys.remove(0);
                let evicted = self.cache.remove(&evicted_key);
                return evicted.map(|vnode| (evicted_key, vnode));
            }
        }
        None
    }

    /// Re-evaluate patterns (after an include/exclude prop change) and drop
    /// entries that no longer match; returns the evicted vnodes for real
    /// unmounting.
    pub fn prune_mismatches(
        &mut self,
        name_of: impl Fn(&VNodeRef) -> CompactString,
    ) -> Vec<VNodeRef> {
        let mut evicted = Vec::new();
        let keys: Vec<CacheKey> = self.keys.clone();
        for key in keys {
            let Some(vnode) = self.cache.get(&key) else {
                continue;
            };
            let name = name_of(vnode);
            if !self.should_cache(&name) {
                if let Some(vnode) = self.cache.remove(&key) {
                    evicted.push(vnode);
                }
                self.keys.retain(|k| k != &key);
            }
        }
        evicted
    }
}

/// Build a KeepAlive component descriptor. The reconciler recognizes
/// `ComponentKind::KeepAlive` and applies cache semantics around the default
/// slot's single child; `max`/`include`/`exclude` are read from props.
pub fn keep_alive_def() -> Rc<ComponentDef> {
    Rc::new(ComponentDef {
        name: "KeepAlive".into(),
        props: vec!["max".into(), "include".into(), "exclude".into()],
        // Placeholder; the reconciler renders the default slot directly
        setup: Rc::new(|_ctx: &SetupContext| -> RenderFn {
            Rc::new(|| crate::vnode::create_comment("keep-alive"))
        }),
        kind: ComponentKind::KeepAlive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern() {
        let p = NamePattern::parse("Foo, Bar");
        assert!(p.matches("Foo"));
        assert!(p.matches("Bar"));
        assert!(!p.matches("Baz"));
    }

    #[test]
    fn test_config_from_props() {
        let mut props = PropMap::default();
        props.insert("max".into(), PropValue::Num(2.0));
        props.insert("include".into(), PropValue::str("A,B"));
        let state = KeepAliveState::from_props(&props, 0);
        assert_eq!(state.max, Some(2));
        assert!(state.should_cache("A"));
        assert!(!state.should_cache("C"));
    }

    #[test]
    fn test_lru_eviction() {
        let mut state = KeepAliveState::from_props(&{
            let mut p = PropMap::default();
            p.insert("max".into(), PropValue::Num(2.0));
            p
        }, 0);
        let a = crate::vnode::create_comment("a");
        let b = crate::vnode::create_comment("b");
        let c = crate::vnode::create_comment("c");
        let (ka, kb, kc) = (
            CacheKey::Key(VNodeKey::Str("a".into())),
            CacheKey::Key(VNodeKey::Str("b".into())),
            CacheKey::Key(VNodeKey::Str("c".into())),
        );

        assert!(state.insert(ka.clone(), a).is_none());
        assert!(state.insert(kb.clone(), b).is_none());
        let evicted = state.insert(kc.clone(), c);
        assert_eq!(evicted.unwrap().0, ka);
        assert_eq!(state.keys, vec![kb.clone(), kc.clone()]);
    }

    #[test]
    fn test_lru_refresh_on_hit() {
        let mut state = KeepAliveState::from_props(&{
            let mut p = PropMap::default();
            p.insert("max".into(), PropValue::Num(2.0));
            p
        }, 0);
        let a = crate::vnode::create_comment("a");
        let b = crate::vnode::create_comment("b");
        let c = crate::vnode::create_comment("c");
        let (ka, kb, kc) = (
            CacheKey::Key(VNodeKey::Str("a".into())),
            CacheKey::Key(VNodeKey::Str("b".into())),
            CacheKey::Key(VNodeKey::Str("c".into())),
        );

        state.insert(ka.clone(), a);
        state.insert(kb.clone(), b);
        // Hit on a: now b is least recently used
        state.refresh_key(&ka);
        let evicted = state.insert(kc.clone(), c);
        assert_eq!(evicted.unwrap().0, kb);
        assert_eq!(state.keys, vec![ka, kc]);
    }
}
