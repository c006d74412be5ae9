//! The reconciler.
//!
//! `patch` dispatches on vnode type: mount when the old side is absent,
//! diff when types match, replace otherwise. Keyed children diff with the
//! two-ended prefix/suffix shrink plus a longest-increasing-subsequence
//! move minimization; blocks diff their flat dynamic-children lists.
//! Component instances live in an id-indexed arena; render effects schedule
//! update jobs keyed by instance id so parents update before children.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lueur_socle::{CompactString, FxHashMap, PatchFlags, ShapeFlags};
use lueur_vif::{
    queue_job, queue_post_job, ReactiveEffect, ReactiveMap, SameValue, SchedulerJob, TrackGuard,
};

use crate::component::{
    ComponentDef, ComponentInstance, ComponentKind, HookRegistry, LifecycleHook, ProvideMap,
    SetupContext,
};
use crate::error::{guard, ComponentError, ComponentErrorCode};
use crate::host::{HostHandle, HostNode};
use crate::keep_alive::{CacheKey, KeepAliveState};
use crate::vnode::{
    create_comment, same_vnode_type, InstanceId, PropMap, PropValue, Slots, VNodeChildren,
    VNodeRef, VNodeType,
};

impl SameValue for PropValue {
    fn same_value(&self, other: &Self) -> bool {
        self == other
    }
}

type Invoker = Rc<RefCell<Rc<dyn Fn(PropValue)>>>;

/// The renderer: host binding plus the component instance arena.
pub struct Renderer {
    host: HostHandle,
    instances: RefCell<FxHashMap<InstanceId, Rc<RefCell<ComponentInstance>>>>,
    next_instance_id: Cell<InstanceId>,
    /// Stable event invokers per (element, event-prop); the installed
    /// listener never changes, only the slot it reads at dispatch time.
    invokers: RefCell<FxHashMap<(HostNode, CompactString), Invoker>>,
    /// App-level provides, the end of every instance's inject chain
    pub(crate) app_provides: ProvideMap,
    pub app_error_handler: RefCell<Option<Rc<dyn Fn(&ComponentError)>>>,
}

impl Renderer {
    pub fn new(host: HostHandle) -> Rc<Self> {
        Rc::new(Self {
            host,
            instances: RefCell::new(FxHashMap::default()),
            next_instance_id: Cell::new(1),
            invokers: RefCell::new(FxHashMap::default()),
            app_provides: Rc::new(RefCell::new(FxHashMap::default())),
            app_error_handler: RefCell::new(None),
        })
    }

    pub fn host(&self) -> &HostHandle {
        &self.host
    }

    pub fn instance(&self, id: InstanceId) -> Option<Rc<RefCell<ComponentInstance>>> {
        self.instances.borrow().get(&id).cloned()
    }

    /// Mount a vnode tree into a host container.
    pub fn render(self: &Rc<Self>, vnode: &VNodeRef, container: HostNode) {
        self.patch(None, vnode, container, None, None, false);
    }

    /// Unmount a previously rendered tree.
    pub fn unmount_tree(self: &Rc<Self>, vnode: &VNodeRef) {
        self.unmount(vnode, None, true, false);
    }

    // ========================================================================
    // Patch dispatch
    // ========================================================================

    pub fn patch(
        self: &Rc<Self>,
        n1: Option<VNodeRef>,
        n2: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        let mut n1 = n1;
        if let Some(old) = &n1 {
            if Rc::ptr_eq(old, n2) {
                return;
            }
            if !same_vnode_type(old, n2) {
                // Replace: the anchor is whatever followed the old node
                let next = self.next_host_anchor(old);
                self.unmount(old, parent, true, false);
                n1 = None;
                return self.patch(n1, n2, container, next, parent, optimized);
            }
        }

        let vtype = n2.borrow().vtype.clone();
        match vtype {
            VNodeType::Text => self.process_text(n1, n2, container, anchor),
            VNodeType::Comment => self.process_comment(n1, n2, container, anchor),
            VNodeType::Element(_) => {
                self.process_element(n1, n2, container, anchor, parent, optimized)
            }
            VNodeType::Fragment => {
                self.process_fragment(n1, n2, container, anchor, parent, optimized)
            }
            VNodeType::Component(_) | VNodeType::Teleport | VNodeType::Suspense => {
                self.process_component(n1, n2, container, anchor, parent, optimized)
            }
        }
    }

    fn process_text(
        self: &Rc<Self>,
        n1: Option<VNodeRef>,
        n2: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
    ) {
        let text = match &n2.borrow().children {
            VNodeChildren::Text(t) => t.clone(),
            _ => CompactString::const_new(""),
        };
        match n1 {
            None => {
                let node = self.host.create_text(&text);
                n2.borrow_mut().el = Some(node);
                self.host.insert(node, container, anchor);
            }
            Some(old) => {
                let el = old.borrow().el;
                n2.borrow_mut().el = el;
                let old_text = match &old.borrow().children {
                    VNodeChildren::Text(t) => t.clone(),
                    _ => CompactString::const_new(""),
                };
                if let Some(el) = el {
                    if old_text != text {
                        self.host.set_text(el, &text);
                    }
                }
            }
        }
    }

    fn process_comment(
        self: &Rc<Self>,
        n1: Option<VNodeRef>,
        n2: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
    ) {
        match n1 {
            None => {
                let text = match &n2.borrow().children {
                    VNodeChildren::Text(t) => t.clone(),
                    _ => CompactString::const_new(""),
                };
                let node = self.host.create_comment(&text);
                n2.borrow_mut().el = Some(node);
                self.host.insert(node, container, anchor);
            }
            Some(old) => {
                // Comments never change content in place
                n2.borrow_mut().el = old.borrow().el;
            }
        }
    }

    // ========================================================================
    // Elements
    // ========================================================================

    fn process_element(
        self: &Rc<Self>,
        n1: Option<VNodeRef>,
        n2: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        match n1 {
            None => self.mount_element(n2, container, anchor, parent),
            Some(old) => self.patch_element(&old, n2, parent, optimized),
        }
    }

    fn mount_element(
        self: &Rc<Self>,
        vnode: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
    ) {
        let (tag, ns, props) = {
            let n = vnode.borrow();
            let tag = match &n.vtype {
                VNodeType::Element(tag) => tag.clone(),
                _ => unreachable!("mount_element on non-element"),
            };
            (tag, n.ns, n.props.clone())
        };

        let el = self.host.create_element(&tag, ns, None);
        vnode.borrow_mut().el = Some(el);

        for (key, value) in props.iter() {
            self.host_patch_prop(el, key, None, Some(value));
        }

        let children = vnode.borrow().children.clone();
        match children {
            VNodeChildren::Text(text) => self.host.set_element_text(el, &text),
            VNodeChildren::Nodes(nodes) => {
                for child in nodes.iter() {
                    self.patch(None, child, el, None, parent, false);
                }
            }
            _ => {}
        }

        self.host.insert(el, container, anchor);
    }

    fn patch_element(
        self: &Rc<Self>,
        n1: &VNodeRef,
        n2: &VNodeRef,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        let el = match n1.borrow().el {
            Some(el) => el,
            None => return,
        };
        n2.borrow_mut().el = Some(el);

        let patch_flag = n2.borrow().patch_flag;
        if patch_flag == PatchFlags::HOISTED {
            return;
        }
        let full_diff = patch_flag == PatchFlags::BAIL;

        // Children first
        let has_blocks = {
            let a = n1.borrow();
            let b = n2.borrow();
            a.dynamic_children.is_some() && b.dynamic_children.is_some()
        };
        if optimized && has_blocks && !full_diff {
            self.patch_block_children(n1, n2, el, parent);
        } else if !optimized || full_diff {
            self.patch_children(n1, n2, el, None, parent, false);
        }

        // Props by facet
        let old_props = n1.borrow().props.clone();
        let new_props = n2.borrow().props.clone();
        if full_diff {
            self.patch_props(el, &old_props, &new_props);
        } else if patch_flag.bits() > 0 {
            if patch_flag.contains(PatchFlags::FULL_PROPS) {
                self.patch_props(el, &old_props, &new_props);
            } else {
                if patch_flag.contains(PatchFlags::CLASS) {
                    self.patch_single_prop(el, "class", &old_props, &new_props);
                }
                if patch_flag.contains(PatchFlags::STYLE) {
                    self.patch_single_prop(el, "style", &old_props, &new_props);
                }
                if patch_flag.contains(PatchFlags::PROPS) {
                    let names = n2.borrow().dynamic_props.clone().unwrap_or_default();
                    for name in names {
                        self.patch_single_prop(el, &name, &old_props, &new_props);
                    }
                }
            }
            if patch_flag.contains(PatchFlags::TEXT) {
                let old_text = match &n1.borrow().children {
                    VNodeChildren::Text(t) => Some(t.clone()),
                    _ => None,
                };
                let new_text = match &n2.borrow().children {
                    VNodeChildren::Text(t) => Some(t.clone()),
                    _ => None,
                };
                if let Some(new_text) = new_text {
                    if old_text.as_ref() != Some(&new_text) {
                        self.host.set_element_text(el, &new_text);
                    }
                }
            }
        } else if !optimized {
            self.patch_props(el, &old_props, &new_props);
        }
    }

    /// Diff only the flat captured lists; static subtrees are never visited.
    fn patch_block_children(
        self: &Rc<Self>,
        n1: &VNodeRef,
        n2: &VNodeRef,
        fallback_container: HostNode,
        parent: Option<InstanceId>,
    ) {
        let old_chunk = n1.borrow().dynamic_children.clone().unwrap_or_default();
        let new_chunk = n2.borrow().dynamic_children.clone().unwrap_or_default();
        if old_chunk.len() != new_chunk.len() {
            // Structure changed under us; fall back to a full diff
            let el = n2.borrow().el.unwrap_or(fallback_container);
            return self.patch_children(n1, n2, el, None, parent, false);
        }

        for (old, new) in old_chunk.iter().zip(new_chunk.iter()) {
            // Nodes that may move need their real host parent as container
            let container = {
                let o = old.borrow();
                let needs_parent = matches!(o.vtype, VNodeType::Fragment)
                    || o.shape_flag.is_component()
                    || !same_vnode_type(old, new);
                if needs_parent {
                    o.el
                        .and_then(|el| self.host.parent_node(el))
                        .unwrap_or(fallback_container)
                } else {
                    fallback_container
                }
            };
            self.patch(Some(old.clone()), new, container, None, parent, true);
        }
    }

    // ========================================================================
    // Props
    // ========================================================================

    fn patch_single_prop(
        self: &Rc<Self>,
        el: HostNode,
        key: &str,
        old_props: &PropMap,
        new_props: &PropMap,
    ) {
        let key: CompactString = key.into();
        let prev = old_props.get(&key);
        let next = new_props.get(&key);
        if prev != next {
            self.host_patch_prop(el, &key, prev, next);
        }
    }

    fn patch_props(self: &Rc<Self>, el: HostNode, old_props: &PropMap, new_props: &PropMap) {
        for (key, next) in new_props.iter() {
            let prev = old_props.get(key);
            if prev != Some(next) {
                self.host_patch_prop(el, key, prev, Some(next));
            }
        }
        for (key, prev) in old_props.iter() {
            if !new_props.contains_key(key) {
                self.host_patch_prop(el, key, Some(prev), None);
            }
        }
    }

    /// One property change. Event props install a stable invoker whose slot
    /// is swapped at update time, so the host listener never re-installs.
    fn host_patch_prop(
        self: &Rc<Self>,
        el: HostNode,
        key: &CompactString,
        prev: Option<&PropValue>,
        next: Option<&PropValue>,
    ) {
        let is_event = key.starts_with("on")
            && (matches!(next, Some(PropValue::Handler(_)))
                || matches!(prev, Some(PropValue::Handler(_))));
        if !is_event {
            self.host.patch_prop(el, key, prev, next);
            return;
        }

        let slot_key = (el, key.clone());
        match next {
            Some(PropValue::Handler(handler)) => {
                let existing = self.invokers.borrow().get(&slot_key).cloned();
                match existing {
                    Some(slot) => {
                        // Swap the slot; no host call needed
                        *slot.borrow_mut() = handler.clone();
                    }
                    None => {
                        let slot: Invoker = Rc::new(RefCell::new(handler.clone()));
                        self.invokers.borrow_mut().insert(slot_key, slot.clone());
                        let invoking = {
                            let slot = slot.clone();
                            move |payload: PropValue| {
                                let current = slot.borrow().clone();
                                let _ = guard(
                                    ComponentErrorCode::NativeEventHandler,
                                    None,
                                    || current(payload),
                                );
                            }
                        };
                        self.host.patch_prop(
                            el,
                            key,
                            prev,
                            Some(&PropValue::Handler(Rc::new(invoking))),
                        );
                    }
                }
            }
            _ => {
                self.invokers.borrow_mut().remove(&slot_key);
                self.host.patch_prop(el, key, prev, None);
            }
        }
    }

    // ========================================================================
    // Fragments
    // ========================================================================

    fn process_fragment(
        self: &Rc<Self>,
        n1: Option<VNodeRef>,
        n2: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        match n1 {
            None => {
                let start = self.host.create_text("");
                let end = self.host.create_text("");
                {
                    let mut n = n2.borrow_mut();
                    n.el = Some(start);
                    n.anchor = Some(end);
                }
                self.host.insert(start, container, anchor);
                self.host.insert(end, container, anchor);
                let children = match &n2.borrow().children {
                    VNodeChildren::Nodes(nodes) => nodes.clone(),
                    _ => Vec::new(),
                };
                for child in children.iter() {
                    self.patch(None, child, container, Some(end), parent, optimized);
                }
            }
            Some(old) => {
                let (start, end) = {
                    let o = old.borrow();
                    (o.el, o.anchor)
                };
                {
                    let mut n = n2.borrow_mut();
                    n.el = start;
                    n.anchor = end;
                }
                let patch_flag = n2.borrow().patch_flag;
                let has_blocks = {
                    let a = old.borrow();
                    let b = n2.borrow();
                    a.dynamic_children.is_some() && b.dynamic_children.is_some()
                };
                if optimized
                    && patch_flag.contains(PatchFlags::STABLE_FRAGMENT)
                    && has_blocks
                {
                    self.patch_block_children(&old, n2, container, parent);
                } else {
                    self.patch_children(&old, n2, container, end, parent, optimized);
                }
            }
        }
    }

    // ========================================================================
    // Children diff
    // ========================================================================

    fn patch_children(
        self: &Rc<Self>,
        n1: &VNodeRef,
        n2: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        let old_children = n1.borrow().children.clone();
        let new_children = n2.borrow().children.clone();
        let patch_flag = n2.borrow().patch_flag;

        match (old_children, new_children) {
            (VNodeChildren::Text(old), VNodeChildren::Text(new)) => {
                if old != new {
                    self.host.set_element_text(container, &new);
                }
            }
            (VNodeChildren::Nodes(old), VNodeChildren::Text(new)) => {
                for child in old.iter() {
                    self.unmount(child, parent, true, false);
                }
                self.host.set_element_text(container, &new);
            }
            (VNodeChildren::None, VNodeChildren::Text(new)) => {
                self.host.set_element_text(container, &new);
            }
            (VNodeChildren::Text(_), VNodeChildren::Nodes(new)) => {
                self.host.set_element_text(container, "");
                for child in new.iter() {
                    self.patch(None, child, container, anchor, parent, optimized);
                }
            }
            (VNodeChildren::None, VNodeChildren::Nodes(new)) => {
                for child in new.iter() {
                    self.patch(None, child, container, anchor, parent, optimized);
                }
            }
            (VNodeChildren::Nodes(old), VNodeChildren::None) => {
                for child in old.iter() {
                    self.unmount(child, parent, true, false);
                }
            }
            (VNodeChildren::Text(_), VNodeChildren::None) => {
                self.host.set_element_text(container, "");
            }
            (VNodeChildren::Nodes(old), VNodeChildren::Nodes(new)) => {
                if patch_flag.contains(PatchFlags::UNKEYED_FRAGMENT) {
                    self.patch_unkeyed_children(
                        &old, &new, container, anchor, parent, optimized,
                    );
                } else {
                    self.patch_keyed_children(&old, &new, container, anchor, parent, optimized);
                }
            }
            _ => {}
        }
    }

    fn patch_unkeyed_children(
        self: &Rc<Self>,
        old: &[VNodeRef],
        new: &[VNodeRef],
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        let common = old.len().min(new.len());
        for i in 0..common {
            self.patch(
                Some(old[i].clone()),
                &new[i],
                container,
                None,
                parent,
                optimized,
            );
        }
        if new.len() > common {
            for child in &new[common..] {
                self.patch(None, child, container, anchor, parent, optimized);
            }
        } else {
            for child in &old[common..] {
                self.unmount(child, parent, true, false);
            }
        }
    }

    /// Keyed diff: shrink equal prefix/suffix, then map keys and compute the
    /// longest increasing subsequence of reused indices so only nodes off
    /// that subsequence move.
    fn patch_keyed_children(
        self: &Rc<Self>,
        old: &[VNodeRef],
        new: &[VNodeRef],
        container: HostNode,
        parent_anchor: Option<HostNode>,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        let mut i = 0usize;
        let mut e1 = old.len() as i64 - 1;
        let mut e2 = new.len() as i64 - 1;

        // 1. Equal prefix
        while (i as i64) <= e1 && (i as i64) <= e2 {
            if same_vnode_type(&old[i], &new[i]) {
                self.patch(
                    Some(old[i].clone()),
                    &new[i],
                    container,
                    None,
                    parent,
                    optimized,
                );
                i += 1;
            } else {
                break;
            }
        }

        // 2. Equal suffix
        while (i as i64) <= e1 && (i as i64) <= e2 {
            if same_vnode_type(&old[e1 as usize], &new[e2 as usize]) {
                self.patch(
                    Some(old[e1 as usize].clone()),
                    &new[e2 as usize],
                    container,
                    None,
                    parent,
                    optimized,
                );
                e1 -= 1;
                e2 -= 1;
            } else {
                break;
            }
        }

        if (i as i64) > e1 {
            // 3. Old exhausted: mount the remaining new children
            if (i as i64) <= e2 {
                let anchor_index = (e2 + 1) as usize;
                let anchor = if anchor_index < new.len() {
                    self.host_el(&new[anchor_index])
                } else {
                    parent_anchor
                };
                let mut j = i as i64;
                while j <= e2 {
                    self.patch(None, &new[j as usize], container, anchor, parent, optimized);
                    j += 1;
                }
            }
        } else if (i as i64) > e2 {
            // 4. New exhausted: unmount the remaining old children
            let mut j = i as i64;
            while j <= e1 {
                self.unmount(&old[j as usize], parent, true, false);
                j += 1;
            }
        } else {
            // 5. Unknown middle
            let s1 = i;
            let s2 = i;

            let mut key_to_new_index: FxHashMap<crate::vnode::VNodeKey, usize> =
                FxHashMap::default();
            for j in s2..=(e2 as usize) {
                if let Some(key) = new[j].borrow().key.clone() {
                    key_to_new_index.insert(key, j);
                }
            }

            let to_be_patched = (e2 as usize) - s2 + 1;
            let mut new_index_to_old: Vec<usize> = vec![0; to_be_patched];
            let mut patched = 0usize;
            let mut moved = false;
            let mut max_new_index_so_far = 0usize;

            for (j, old_child) in old.iter().enumerate().take((e1 as usize) + 1).skip(s1) {
                if patched >= to_be_patched {
                    self.unmount(old_child, parent, true, false);
                    continue;
                }
                let new_index = {
                    let key = old_child.borrow().key.clone();
                    match key {
                        Some(key) => key_to_new_index.get(&key).copied(),
                        None => {
                            // Keyless: probe for a same-type unmatched slot
                            let mut found = None;
                            for k in s2..=(e2 as usize) {
                                if new_index_to_old[k - s2] == 0
                                    && same_vnode_type(old_child, &new[k])
                                {
                                    found = Some(k);
                                    break;
                                }
                            }
                            found
                        }
                    }
                };
                match new_index {
                    None => self.unmount(old_child, parent, true, false),
                    Some(new_index) => {
                        new_index_to_old[new_index - s2] = j + 1;
                        if new_index >= max_new_index_so_far {
                            max_new_index_so_far = new_index;
                        } else {
                            moved = true;
                        }
                        self.patch(
                            Some(old_child.clone()),
                            &new[new_index],
                            container,
                            None,
                            parent,
                            optimized,
                        );
                        patched += 1;
                    }
                }
            }

            // Minimal moves via LIS over the source-index array
            let lis = if moved {
                get_sequence(&new_index_to_old)
            } else {
                Vec::new()
            };
            let mut lis_ptr = lis.len() as i64 - 1;

            for j in (0..to_be_patched).rev() {
                let new_index = s2 + j;
                let anchor = if new_index + 1 < new.len() {
                    self.host_el(&new[new_index + 1])
                } else {
                    parent_anchor
                };
                if new_index_to_old[j] == 0 {
                    self.patch(None, &new[new_index], container, anchor, parent, optimized);
                } else if moved {
                    if lis_ptr < 0 || j != lis[lis_ptr as usize] {
                        self.move_vnode(&new[new_index], container, anchor);
                    } else {
                        lis_ptr -= 1;
                    }
                }
            }
        }
    }

    // ========================================================================
    // Host tree helpers
    // ========================================================================

    /// The host node representing a vnode (component vnodes delegate to
    /// their subtree).
    pub fn host_el(self: &Rc<Self>, vnode: &VNodeRef) -> Option<HostNode> {
        let n = vnode.borrow();
        if n.shape_flag.is_component() {
            let id = n.component?;
            drop(n);
            let instance = self.instance(id)?;
            let subtree = instance.borrow().subtree.clone()?;
            return self.host_el(&subtree);
        }
        n.el
    }

    /// The host node immediately after a vnode, for replacement anchoring.
    fn next_host_anchor(self: &Rc<Self>, vnode: &VNodeRef) -> Option<HostNode> {
        let n = vnode.borrow();
        if n.shape_flag.is_component() {
            let id = n.component?;
            drop(n);
            let instance = self.instance(id)?;
            let subtree = instance.borrow().subtree.clone()?;
            return self.next_host_anchor(&subtree);
        }
        if matches!(n.vtype, VNodeType::Fragment) {
            return n.anchor.and_then(|a| self.host.next_sibling(a));
        }
        n.el.and_then(|el| self.host.next_sibling(el))
    }

    /// Move a mounted vnode's host nodes to a new position.
    fn move_vnode(self: &Rc<Self>, vnode: &VNodeRef, container: HostNode, anchor: Option<HostNode>) {
        let n = vnode.borrow();
        if n.shape_flag.is_component() {
            if let Some(id) = n.component {
                drop(n);
                if let Some(instance) = self.instance(id) {
                    let subtree = instance.borrow().subtree.clone();
                    if let Some(subtree) = subtree {
                        self.move_vnode(&subtree, container, anchor);
                    }
                }
            }
            return;
        }
        if matches!(n.vtype, VNodeType::Fragment) {
            let (start, end) = (n.el, n.anchor);
            let children = match &n.children {
                VNodeChildren::Nodes(nodes) => nodes.clone(),
                _ => Vec::new(),
            };
            drop(n);
            if let Some(start) = start {
                self.host.insert(start, container, anchor);
            }
            for child in children.iter() {
                self.move_vnode(child, container, anchor);
            }
            if let Some(end) = end {
                self.host.insert(end, container, anchor);
            }
            return;
        }
        if let Some(el) = n.el {
            self.host.insert(el, container, anchor);
        }
    }

    // ========================================================================
    // Unmounting
    // ========================================================================

    pub(crate) fn unmount(
        self: &Rc<Self>,
        vnode: &VNodeRef,
        parent: Option<InstanceId>,
        do_remove: bool,
        force: bool,
    ) {
        let (vtype, shape_flag) = {
            let n = vnode.borrow();
            (n.vtype.clone(), n.shape_flag)
        };

        match vtype {
            VNodeType::Component(_) | VNodeType::Teleport | VNodeType::Suspense => {
                if !force && shape_flag.contains(ShapeFlags::COMPONENT_SHOULD_KEEP_ALIVE) {
                    self.deactivate(vnode, parent);
                    return;
                }
                let id = vnode.borrow().component;
                if let Some(id) = id {
                    self.unmount_component(id, do_remove);
                }
            }
            VNodeType::Element(_) => {
                let (el, children) = {
                    let n = vnode.borrow();
                    (n.el, n.children.clone())
                };
                if let VNodeChildren::Nodes(nodes) = children {
                    for child in nodes.iter() {
                        // Host removal of the parent is enough; children only
                        // need their component teardown
                        self.unmount(child, parent, false, force);
                    }
                }
                if let Some(el) = el {
                    self.invokers
                        .borrow_mut()
                        .retain(|(node, _), _| *node != el);
                    if do_remove {
                        self.host.remove(el);
                    }
                }
            }
            VNodeType::Fragment => {
                let (start, end, children) = {
                    let n = vnode.borrow();
                    (n.el, n.anchor, n.children.clone())
                };
                if let VNodeChildren::Nodes(nodes) = children {
                    for child in nodes.iter() {
                        self.unmount(child, parent, do_remove, force);
                    }
                }
                if do_remove {
                    if let Some(start) = start {
                        self.host.remove(start);
                    }
                    if let Some(end) = end {
                        self.host.remove(end);
                    }
                }
            }
            VNodeType::Text | VNodeType::Comment => {
                if do_remove {
                    if let Some(el) = vnode.borrow().el {
                        self.host.remove(el);
                    }
                }
            }
        }
    }

    fn unmount_component(self: &Rc<Self>, id: InstanceId, do_remove: bool) {
        let Some(instance_rc) = self.instance(id) else {
            return;
        };

        self.invoke_hooks_sync(id, LifecycleHook::BeforeUnmount);

        let (subtree, effect, job) = {
            let mut instance = instance_rc.borrow_mut();
            instance.is_unmounted = true;
            (
                instance.subtree.take(),
                instance.effect.take(),
                instance.update_job.take(),
            )
        };

        // A pending update for this component must not run mid-flush
        if let Some(job) = job {
            lueur_vif::invalidate_job(&job);
        }
        if let Some(effect) = effect {
            effect.stop();
            effect.clear_scheduler();
        }

        if let Some(subtree) = subtree {
            self.unmount(&subtree, Some(id), do_remove, false);
        }

        self.queue_post_hooks(id, LifecycleHook::Unmounted, &instance_rc);
        self.instances.borrow_mut().remove(&id);
    }

    // ========================================================================
    // Components
    // ========================================================================

    fn process_component(
        self: &Rc<Self>,
        n1: Option<VNodeRef>,
        n2: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
        optimized: bool,
    ) {
        let _ = optimized;
        match n1 {
            None => {
                let kept_alive = n2
                    .borrow()
                    .shape_flag
                    .contains(ShapeFlags::COMPONENT_KEPT_ALIVE);
                if kept_alive {
                    self.activate(n2, container, anchor, parent);
                } else {
                    self.mount_component(n2, container, anchor, parent);
                }
            }
            Some(old) => {
                let id = old.borrow().component;
                let Some(id) = id else { return };
                n2.borrow_mut().component = Some(id);

                if should_update_component(&old, n2) {
                    if let Some(instance) = self.instance(id) {
                        instance.borrow_mut().next = Some(n2.clone());
                    }
                    self.run_component_job(id);
                } else {
                    // Nothing changed: carry the mount state over
                    n2.borrow_mut().el = old.borrow().el;
                    if let Some(instance) = self.instance(id) {
                        instance.borrow_mut().vnode = n2.clone();
                    }
                }
            }
        }
    }

    fn resolve_props(
        def: &ComponentDef,
        vnode_props: &PropMap,
    ) -> (ReactiveMap<CompactString, PropValue>, PropMap) {
        let props: ReactiveMap<CompactString, PropValue> = ReactiveMap::new();
        let mut attrs = PropMap::default();
        for (key, value) in vnode_props.iter() {
            if def.props.iter().any(|p| p == key) {
                props.insert(key.clone(), value.clone());
            } else {
                attrs.insert(key.clone(), value.clone());
            }
        }
        (props, attrs)
    }

    fn mount_component(
        self: &Rc<Self>,
        vnode: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        parent: Option<InstanceId>,
    ) {
        let def = match &vnode.borrow().vtype {
            VNodeType::Component(def) => def.clone(),
            // Teleport/Suspense boundaries carry through as plain wrappers
            _ => Rc::new(ComponentDef {
                name: "Boundary".into(),
                props: Vec::new(),
                setup: Rc::new(|ctx: &SetupContext| {
                    let slots = ctx.slots.clone();
                    Rc::new(move || {
                        let children = slots
                            .borrow()
                            .get("default")
                            .map(|f| f())
                            .unwrap_or_default();
                        crate::vnode::create_fragment(children, PatchFlags::STABLE_FRAGMENT)
                    })
                }),
                kind: ComponentKind::Stateful,
            }),
        };

        let id = self.next_instance_id.get();
        self.next_instance_id.set(id + 1);

        let (root, provide_chain) = match parent.and_then(|p| self.instance(p)) {
            Some(parent_rc) => {
                let parent_ref = parent_rc.borrow();
                let mut chain = vec![parent_ref.provides.clone()];
                chain.extend(parent_ref.provide_chain.iter().cloned());
                (parent_ref.root, chain)
            }
            None => (id, vec![self.app_provides.clone()]),
        };

        let vnode_props = vnode.borrow().props.clone();
        let (props, attrs) = Self::resolve_props(&def, &vnode_props);
        let slots: Slots = match &vnode.borrow().children {
            VNodeChildren::Slots(slots) => slots.clone(),
            _ => Rc::new(FxHashMap::default()),
        };

        let keep_alive = if def.kind == ComponentKind::KeepAlive {
            let storage = self.host.create_element("div", crate::host::Namespace::Html, None);
            Some(Rc::new(RefCell::new(KeepAliveState::from_props(
                &vnode_props,
                storage,
            ))))
        } else {
            None
        };

        let instance_rc = Rc::new(RefCell::new(ComponentInstance {
            id,
            parent,
            root,
            def: def.clone(),
            vnode: vnode.clone(),
            next: None,
            props: props.clone(),
            attrs: Rc::new(RefCell::new(attrs)),
            slots: Rc::new(RefCell::new(slots)),
            render: None,
            subtree: None,
            effect: None,
            update_job: None,
            hooks: Rc::new(HookRegistry::default()),
            provides: Rc::new(RefCell::new(FxHashMap::default())),
            provide_chain,
            is_mounted: false,
            is_unmounted: false,
            is_deactivated: false,
            keep_alive,
            suspense: None,
        }));
        self.instances.borrow_mut().insert(id, instance_rc.clone());
        vnode.borrow_mut().component = Some(id);

        // Run setup with tracking paused; reads in setup belong to no effect
        let render = {
            let instance_ref = instance_rc.borrow();
            let renderer = Rc::downgrade(self);
            let on_error: Rc<dyn Fn(ComponentError)> = Rc::new(move |err| {
                if let Some(renderer) = renderer.upgrade() {
                    renderer.propagate_error(Some(id), err);
                }
            });
            let ctx = SetupContext {
                props: instance_ref.props.clone(),
                attrs: instance_ref.attrs.clone(),
                slots: instance_ref.slots.clone(),
                hooks: instance_ref.hooks.clone(),
                provides: instance_ref.provides.clone(),
                provide_chain: instance_ref.provide_chain.clone(),
                instance: Rc::downgrade(&instance_rc),
                on_error,
            };
            drop(instance_ref);

            let _guard = TrackGuard::pause();
            match guard(ComponentErrorCode::SetupFunction, Some(def.name.clone()), || {
                (def.setup)(&ctx)
            }) {
                Ok(render) => render,
                Err(err) => {
                    self.propagate_error(Some(id), err);
                    Rc::new(|| create_comment("setup error"))
                }
            }
        };
        instance_rc.borrow_mut().render = Some(render);

        // Render effect + id-keyed update job
        let effect = {
            let renderer = Rc::downgrade(self);
            ReactiveEffect::new(move || {
                if let Some(renderer) = renderer.upgrade() {
                    renderer.component_update(id, container, anchor);
                }
            })
        };
        let job = {
            let renderer = Rc::downgrade(self);
            SchedulerJob::new(Some(id), move || {
                if let Some(renderer) = renderer.upgrade() {
                    renderer.run_component_job(id);
                }
            })
        };
        job.set_label(def.name.clone());
        {
            let job = job.clone();
            effect.set_scheduler(move || queue_job(&job));
        }
        {
            let mut instance = instance_rc.borrow_mut();
            instance.effect = Some(effect.clone());
            instance.update_job = Some(job);
        }

        effect.run();
    }

    /// Run a component's render effect if it has pending work.
    pub(crate) fn run_component_job(self: &Rc<Self>, id: InstanceId) {
        let Some(instance_rc) = self.instance(id) else {
            return;
        };
        let (effect, has_next, unmounted) = {
            let instance = instance_rc.borrow();
            (
                instance.effect.clone(),
                instance.next.is_some(),
                instance.is_unmounted,
            )
        };
        if unmounted {
            return;
        }
        if let Some(effect) = effect {
            if has_next || effect.dirty() {
                effect.run();
            }
        }
    }

    /// The render-effect body: render the subtree and patch it in.
    fn component_update(
        self: &Rc<Self>,
        id: InstanceId,
        mount_container: HostNode,
        mount_anchor: Option<HostNode>,
    ) {
        let Some(instance_rc) = self.instance(id) else {
            return;
        };
        let (is_mounted, is_unmounted) = {
            let instance = instance_rc.borrow();
            (instance.is_mounted, instance.is_unmounted)
        };
        if is_unmounted {
            return;
        }

        if !is_mounted {
            self.invoke_hooks_sync(id, LifecycleHook::BeforeMount);

            let subtree = self.render_subtree(id);
            self.patch(None, &subtree, mount_container, mount_anchor, Some(id), false);

            {
                let mut instance = instance_rc.borrow_mut();
                let el = subtree.borrow().el;
                instance.vnode.borrow_mut().el = el;
                instance.subtree = Some(subtree);
                instance.is_mounted = true;
            }
            self.finish_keep_alive_cycle(id);
            self.queue_post_hooks(id, LifecycleHook::Mounted, &instance_rc);
        } else {
            self.invoke_hooks_sync(id, LifecycleHook::BeforeUpdate);

            let next = instance_rc.borrow_mut().next.take();
            if let Some(next) = next {
                self.update_component_pre_render(id, &next);
            }

            let old_subtree = instance_rc.borrow().subtree.clone();
            let new_subtree = self.render_subtree(id);

            let container = old_subtree
                .as_ref()
                .and_then(|old| self.host_el(old))
                .and_then(|el| self.host.parent_node(el))
                .unwrap_or(mount_container);

            self.patch(old_subtree, &new_subtree, container, None, Some(id), true);

            {
                let mut instance = instance_rc.borrow_mut();
                let el = new_subtree.borrow().el;
                instance.vnode.borrow_mut().el = el;
                instance.subtree = Some(new_subtree);
            }
            self.finish_keep_alive_cycle(id);
            self.queue_post_hooks(id, LifecycleHook::Updated, &instance_rc);
        }
    }

    /// Apply a pending component vnode before re-rendering: swap the vnode
    /// and reconcile props/slots/attrs.
    fn update_component_pre_render(self: &Rc<Self>, id: InstanceId, next: &VNodeRef) {
        let Some(instance_rc) = self.instance(id) else {
            return;
        };
        // Reconciling props must not subscribe the running render effect to
        // its own prop table
        let _guard = TrackGuard::pause();

        let (props_handle, attrs_handle, slots_handle, declared) = {
            let instance = instance_rc.borrow();
            (
                instance.props.clone(),
                instance.attrs.clone(),
                instance.slots.clone(),
                instance.def.props.clone(),
            )
        };

        let new_props = next.borrow().props.clone();

        // Declared props: set changed, remove absent
        let existing: Vec<CompactString> = props_handle
            .keys()
            .into_iter()
            .collect();
        for key in &existing {
            if !new_props.contains_key(key) {
                props_handle.remove(key);
            }
        }
        let mut attrs = PropMap::default();
        for (key, value) in new_props.iter() {
            if declared.iter().any(|p| p == key) {
                props_handle.insert(key.clone(), value.clone());
            } else {
                attrs.insert(key.clone(), value.clone());
            }
        }
        *attrs_handle.borrow_mut() = attrs;

        if let VNodeChildren::Slots(slots) = &next.borrow().children {
            *slots_handle.borrow_mut() = slots.clone();
        }

        let mut instance = instance_rc.borrow_mut();
        instance.vnode = next.clone();
    }

    /// Render the instance's subtree (KeepAlive instances render their slot
    /// child through the cache).
    fn render_subtree(self: &Rc<Self>, id: InstanceId) -> VNodeRef {
        let Some(instance_rc) = self.instance(id) else {
            return create_comment("");
        };
        let (render, kind, name, keep_alive) = {
            let instance = instance_rc.borrow();
            (
                instance.render.clone(),
                instance.def.kind,
                instance.def.name.clone(),
                instance.keep_alive.clone(),
            )
        };

        if kind == ComponentKind::KeepAlive {
            if let Some(state) = keep_alive {
                return self.render_keep_alive_child(id, &state);
            }
        }

        let Some(render) = render else {
            return create_comment("");
        };
        match guard(ComponentErrorCode::RenderFunction, Some(name), || render()) {
            Ok(subtree) => subtree,
            Err(err) => {
                self.propagate_error(Some(id), err);
                // Reconciliation continues over a placeholder
                create_comment("render error")
            }
        }
    }

    /// KeepAlive render: take the default slot's single child and wire it
    /// through the cache.
    fn render_keep_alive_child(
        self: &Rc<Self>,
        id: InstanceId,
        state: &Rc<RefCell<KeepAliveState>>,
    ) -> VNodeRef {
        let Some(instance_rc) = self.instance(id) else {
            return create_comment("");
        };
        let slot = instance_rc
            .borrow()
            .slots
            .borrow()
            .get("default")
            .cloned();
        let children = match slot {
            Some(f) => f(),
            None => Vec::new(),
        };
        let Some(child) = children.into_iter().next() else {
            return create_comment("keep-alive empty");
        };

        let is_component = child.borrow().shape_flag.is_component();
        if !is_component {
            return child;
        }

        let child_name = match &child.borrow().vtype {
            VNodeType::Component(def) => def.name.clone(),
            _ => CompactString::const_new(""),
        };

        let mut state_mut = state.borrow_mut();
        if !state_mut.should_cache(&child_name) {
            return child;
        }

        if let Some(key) = CacheKey::for_vnode(&child) {
            if let Some(cached) = state_mut.cache.get(&key).cloned() {
                // Cache hit: adopt the live instance and refresh recency
                let (el, component) = {
                    let c = cached.borrow();
                    (c.el, c.component)
                };
                {
                    let mut c = child.borrow_mut();
                    c.el = el;
                    c.component = component;
                    c.shape_flag |= ShapeFlags::COMPONENT_KEPT_ALIVE;
                }
                state_mut.refresh_key(&key);
            }
            child.borrow_mut().shape_flag |= ShapeFlags::COMPONENT_SHOULD_KEEP_ALIVE;
            state_mut.pending = Some(key);
        }
        child
    }

    /// After a KeepAlive render/patch, commit the rendered child into the
    /// cache, evicting the least-recently-activated entry when full.
    fn finish_keep_alive_cycle(self: &Rc<Self>, id: InstanceId) {
        let Some(instance_rc) = self.instance(id) else {
            return;
        };
        let (state, subtree) = {
            let instance = instance_rc.borrow();
            (instance.keep_alive.clone(), instance.subtree.clone())
        };
        let (Some(state), Some(subtree)) = (state, subtree) else {
            return;
        };

        // include/exclude/max may have changed with the vnode's props;
        // re-evaluate and evict entries that no longer match
        {
            let vnode_props = instance_rc.borrow().vnode.borrow().props.clone();
            let storage = state.borrow().storage;
            let fresh = KeepAliveState::from_props(&vnode_props, storage);
            {
                let mut current = state.borrow_mut();
                current.max = fresh.max;
                current.include = fresh.include;
                current.exclude = fresh.exclude;
            }
            let evicted = state.borrow_mut().prune_mismatches(|vnode| {
                match &vnode.borrow().vtype {
                    VNodeType::Component(def) => def.name.clone(),
                    _ => CompactString::const_new(""),
                }
            });
            for vnode in evicted {
                if !Rc::ptr_eq(&vnode, &subtree) {
                    self.unmount(&vnode, Some(id), true, true);
                }
            }
        }

        let pending = state.borrow_mut().pending.take();
        if let Some(key) = pending {
            let evicted = state.borrow_mut().insert(key, subtree.clone());
            if let Some((_, evicted_vnode)) = evicted {
                if Rc::ptr_eq(&evicted_vnode, &subtree) {
                    // Never evict the active child; just stop caching it
                    subtree.borrow_mut().shape_flag -=
                        ShapeFlags::COMPONENT_SHOULD_KEEP_ALIVE;
                } else {
                    self.unmount(&evicted_vnode, Some(id), true, true);
                }
            }
        }
    }

    /// Move a cached component's host nodes back into the tree and re-patch
    /// its props against the new vnode.
    fn activate(
        self: &Rc<Self>,
        vnode: &VNodeRef,
        container: HostNode,
        anchor: Option<HostNode>,
        _parent: Option<InstanceId>,
    ) {
        let Some(id) = vnode.borrow().component else {
            return;
        };
        let Some(instance_rc) = self.instance(id) else {
            return;
        };

        let subtree = instance_rc.borrow().subtree.clone();
        if let Some(subtree) = subtree {
            self.move_vnode(&subtree, container, anchor);
        }
        instance_rc.borrow_mut().is_deactivated = false;

        // Props may differ from the cached render
        instance_rc.borrow_mut().next = Some(vnode.clone());
        self.run_component_job(id);

        self.queue_post_hooks(id, LifecycleHook::Activated, &instance_rc);
    }

    /// Park a kept-alive component's host nodes in the detached storage
    /// container instead of unmounting it.
    fn deactivate(self: &Rc<Self>, vnode: &VNodeRef, parent: Option<InstanceId>) {
        let Some(id) = vnode.borrow().component else {
            return;
        };
        let Some(instance_rc) = self.instance(id) else {
            return;
        };

        let storage = parent
            .and_then(|p| self.instance(p))
            .and_then(|p| p.borrow().keep_alive.clone())
            .map(|state| state.borrow().storage);
        let Some(storage) = storage else {
            // No surrounding KeepAlive: tear down for real
            self.unmount(vnode, parent, true, true);
            return;
        };

        let subtree = instance_rc.borrow().subtree.clone();
        if let Some(subtree) = subtree {
            self.move_vnode(&subtree, storage, None);
        }
        instance_rc.borrow_mut().is_deactivated = true;

        self.queue_post_hooks(id, LifecycleHook::Deactivated, &instance_rc);
    }

    // ========================================================================
    // Hooks & errors
    // ========================================================================

    fn invoke_hooks_sync(self: &Rc<Self>, id: InstanceId, phase: LifecycleHook) {
        let Some(instance_rc) = self.instance(id) else {
            return;
        };
        let (hooks, name) = {
            let instance = instance_rc.borrow();
            (
                instance.hooks.take_snapshot(phase),
                instance.def.name.clone(),
            )
        };
        for hook in hooks {
            if let Err(err) = guard(
                ComponentErrorCode::LifecycleHook,
                Some(name.clone()),
                || hook(),
            ) {
                self.propagate_error(Some(id), err);
            }
        }
    }

    fn queue_post_hooks(
        self: &Rc<Self>,
        id: InstanceId,
        phase: LifecycleHook,
        instance_rc: &Rc<RefCell<ComponentInstance>>,
    ) {
        let hooks = instance_rc.borrow().hooks.take_snapshot(phase);
        if hooks.is_empty() {
            return;
        }
        let name = instance_rc.borrow().def.name.clone();
        let renderer = Rc::downgrade(self);
        let job = SchedulerJob::new(Some(id), move || {
            for hook in &hooks {
                if let Err(err) = guard(
                    ComponentErrorCode::LifecycleHook,
                    Some(name.clone()),
                    || hook(),
                ) {
                    if let Some(renderer) = renderer.upgrade() {
                        renderer.propagate_error(Some(id), err);
                    }
                }
            }
        });
        queue_post_job(&job);
    }

    /// Bubble an error up the instance chain through errorCaptured hooks,
    /// starting at the failing component's parent; a hook returning `false`
    /// swallows it, otherwise the app handler runs.
    pub fn propagate_error(self: &Rc<Self>, from: Option<InstanceId>, err: ComponentError) {
        let mut current = from
            .and_then(|id| self.instance(id))
            .and_then(|instance| instance.borrow().parent);
        while let Some(id) = current {
            let Some(instance_rc) = self.instance(id) else {
                break;
            };
            let (hooks, parent) = {
                let instance = instance_rc.borrow();
                (
                    instance.hooks.error_captured_snapshot(),
                    instance.parent,
                )
            };
            for hook in hooks {
                if !hook(&err) {
                    return;
                }
            }
            current = parent;
        }
        match self.app_error_handler.borrow().as_ref() {
            Some(handler) => handler(&err),
            None => eprintln!("[lueur] {}", err),
        }
    }
}

/// Compare old/new component vnodes to decide whether a re-render is
/// needed. Handler-valued props are emit listeners with per-render closure
/// identity and are skipped.
fn should_update_component(n1: &VNodeRef, n2: &VNodeRef) -> bool {
    let a = n1.borrow();
    let b = n2.borrow();

    if b.patch_flag.contains(PatchFlags::DYNAMIC_SLOTS) {
        return true;
    }

    let props_differ = |keys: Option<&Vec<CompactString>>| -> bool {
        match keys {
            Some(keys) => keys.iter().any(|key| {
                let old = a.props.get(key);
                let new = b.props.get(key);
                if matches!(old, Some(PropValue::Handler(_)))
                    || matches!(new, Some(PropValue::Handler(_)))
                {
                    return false;
                }
                old != new
            }),
            None => {
                if a.props.len() != b.props.len() {
                    return true;
                }
                b.props.iter().any(|(key, new)| {
                    if new.is_handler() {
                        return false;
                    }
                    a.props.get(key) != Some(new)
                })
            }
        }
    };

    if b.patch_flag.contains(PatchFlags::FULL_PROPS) {
        return props_differ(None);
    }
    if b.patch_flag.contains(PatchFlags::PROPS) {
        return props_differ(b.dynamic_props.as_ref());
    }
    if b.patch_flag.bits() > 0 {
        return false;
    }
    // Unoptimized path: any prop difference forces the update
    props_differ(None)
}

/// Longest increasing subsequence of `arr`, ignoring zeros; returns the
/// indices of the subsequence.
fn get_sequence(arr: &[usize]) -> Vec<usize> {
    let mut p = vec![0usize; arr.len()];
    let mut result: Vec<usize> = Vec::new();
    for (i, &value) in arr.iter().enumerate() {
        if value == 0 {
            continue;
        }
        if let Some(&last) = result.last() {
            if arr[last] < value {
                p[i] = last;
                result.push(i);
                continue;
            }
        } else {
            result.push(i);
            continue;
        }
        // Binary search for the first element >= value
        let mut lo = 0usize;
        let mut hi = result.len() - 1;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if arr[result[mid]] < value {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if arr[result[lo]] >= value {
            if lo > 0 {
                p[i] = result[lo - 1];
            }
            result[lo] = i;
        }
    }
    // Backtrack
    let mut len = result.len();
    if len == 0 {
        return result;
    }
    let mut last = result[len - 1];
    while len > 0 {
        len -= 1;
        result[len] = last;
        last = p[last];
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lis_basic() {
        assert_eq!(get_sequence(&[2, 1, 5, 3, 6, 4, 8, 9, 7]), vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn test_lis_ignores_zeros() {
        // zeros mark "not in old"; they never join the subsequence
        let seq = get_sequence(&[0, 3, 0, 5]);
        assert_eq!(seq, vec![1, 3]);
    }

    #[test]
    fn test_lis_sorted_input() {
        assert_eq!(get_sequence(&[1, 2, 3]), vec![0, 1, 2]);
    }

    #[test]
    fn test_lis_reverse_input() {
        assert_eq!(get_sequence(&[3, 2, 1]).len(), 1);
    }
}
