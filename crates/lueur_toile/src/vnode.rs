//! Virtual nodes.
//!
//! VNodes are shared `Rc<RefCell<_>>` records; the mounted tree holds the
//! authoritative copies. A vnode already mounted in one position must be
//! cloned before reuse elsewhere. Blocks capture their dynamic descendants
//! in a flat list so the reconciler can diff that list instead of the tree.

use std::cell::RefCell;
use std::rc::Rc;

use lueur_socle::{CompactString, FxHashMap, PatchFlags, ShapeFlags};

use crate::component::ComponentDef;
use crate::host::{HostNode, Namespace};

pub type VNodeRef = Rc<RefCell<VNode>>;
pub type InstanceId = u32;

/// VNode type tag: a host tag, a component descriptor, or a sentinel.
#[derive(Clone)]
pub enum VNodeType {
    Element(CompactString),
    Component(Rc<ComponentDef>),
    Text,
    Comment,
    Fragment,
    Teleport,
    Suspense,
}

impl std::fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Element(tag) => write!(f, "Element({})", tag),
            Self::Component(def) => write!(f, "Component({})", def.name),
            Self::Text => write!(f, "Text"),
            Self::Comment => write!(f, "Comment"),
            Self::Fragment => write!(f, "Fragment"),
            Self::Teleport => write!(f, "Teleport"),
            Self::Suspense => write!(f, "Suspense"),
        }
    }
}

/// VNode key for keyed diffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VNodeKey {
    Str(CompactString),
    Num(i64),
}

impl From<&str> for VNodeKey {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<i64> for VNodeKey {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

/// Property values carried on vnodes.
#[derive(Clone)]
pub enum PropValue {
    Str(CompactString),
    Num(f64),
    Bool(bool),
    Null,
    /// Event handler; identity is the Rc pointer
    Handler(Rc<dyn Fn(PropValue)>),
}

impl PropValue {
    pub fn str(s: impl Into<CompactString>) -> Self {
        Self::Str(s.into())
    }

    pub fn handler(f: impl Fn(PropValue) + 'static) -> Self {
        Self::Handler(Rc::new(f))
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Num(a), Self::Num(b)) => a == b || (a != a && b != b),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::Handler(a), Self::Handler(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for PropValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Num(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
            Self::Handler(_) => write!(f, "[handler]"),
        }
    }
}

pub type PropMap = FxHashMap<CompactString, PropValue>;

/// Slot function: a child-content producer evaluated in the parent's scope.
pub type SlotFn = Rc<dyn Fn() -> Vec<VNodeRef>>;
pub type Slots = Rc<FxHashMap<CompactString, SlotFn>>;

/// VNode children shapes.
#[derive(Clone, Default)]
pub enum VNodeChildren {
    #[default]
    None,
    Text(CompactString),
    Nodes(Vec<VNodeRef>),
    /// Component children are always slots
    Slots(Slots),
}

/// A virtual node.
pub struct VNode {
    pub vtype: VNodeType,
    pub props: PropMap,
    pub children: VNodeChildren,
    pub key: Option<VNodeKey>,
    pub patch_flag: PatchFlags,
    pub shape_flag: ShapeFlags,
    /// Names of props known to change, when patch_flag has PROPS
    pub dynamic_props: Option<Vec<CompactString>>,
    /// Block-scoped flat list of dynamic descendants
    pub dynamic_children: Option<Vec<VNodeRef>>,
    /// Host element back-reference, set on mount
    pub el: Option<HostNode>,
    /// Fragment end anchor
    pub anchor: Option<HostNode>,
    /// Component instance back-reference, set on first mount
    pub component: Option<InstanceId>,
    pub ns: Namespace,
}

impl VNode {
    fn new(vtype: VNodeType, props: PropMap, children: VNodeChildren) -> Self {
        let mut shape_flag = match &vtype {
            VNodeType::Element(_) => ShapeFlags::ELEMENT,
            VNodeType::Component(_) => ShapeFlags::STATEFUL_COMPONENT,
            VNodeType::Teleport => ShapeFlags::TELEPORT,
            VNodeType::Suspense => ShapeFlags::SUSPENSE,
            _ => ShapeFlags::empty(),
        };
        match &children {
            VNodeChildren::Text(_) => shape_flag |= ShapeFlags::TEXT_CHILDREN,
            VNodeChildren::Nodes(_) => shape_flag |= ShapeFlags::ARRAY_CHILDREN,
            VNodeChildren::Slots(_) => shape_flag |= ShapeFlags::SLOTS_CHILDREN,
            VNodeChildren::None => {}
        }
        Self {
            vtype,
            props,
            children,
            key: None,
            patch_flag: PatchFlags::empty(),
            shape_flag,
            dynamic_props: None,
            dynamic_children: None,
            el: None,
            anchor: None,
            component: None,
            ns: Namespace::Html,
        }
    }

    pub fn is_component(&self) -> bool {
        self.shape_flag.is_component()
    }
}

/// Type-and-key identity for the diff.
pub fn same_vnode_type(a: &VNodeRef, b: &VNodeRef) -> bool {
    let a = a.borrow();
    let b = b.borrow();
    let type_eq = match (&a.vtype, &b.vtype) {
        (VNodeType::Element(ta), VNodeType::Element(tb)) => ta == tb,
        (VNodeType::Component(da), VNodeType::Component(db)) => Rc::ptr_eq(da, db),
        (VNodeType::Text, VNodeType::Text) => true,
        (VNodeType::Comment, VNodeType::Comment) => true,
        (VNodeType::Fragment, VNodeType::Fragment) => true,
        (VNodeType::Teleport, VNodeType::Teleport) => true,
        (VNodeType::Suspense, VNodeType::Suspense) => true,
        _ => false,
    };
    type_eq && a.key == b.key
}

/// Clone a vnode for mounting in a second position. Mount state (host and
/// instance back-references) is reset; children refs are cloned recursively.
pub fn clone_vnode(vnode: &VNodeRef) -> VNodeRef {
    let source = vnode.borrow();
    let children = match &source.children {
        VNodeChildren::Nodes(nodes) => {
            VNodeChildren::Nodes(nodes.iter().map(clone_vnode).collect())
        }
        other => other.clone(),
    };
    Rc::new(RefCell::new(VNode {
        vtype: source.vtype.clone(),
        props: source.props.clone(),
        children,
        key: source.key.clone(),
        patch_flag: source.patch_flag,
        shape_flag: source.shape_flag
            - (ShapeFlags::COMPONENT_KEPT_ALIVE | ShapeFlags::COMPONENT_SHOULD_KEEP_ALIVE),
        dynamic_props: source.dynamic_props.clone(),
        dynamic_children: None,
        el: None,
        anchor: None,
        component: None,
        ns: source.ns,
    }))
}

// ============================================================================
// Block tracking
// ============================================================================

thread_local! {
    static BLOCK_STACK: RefCell<Vec<Option<Vec<VNodeRef>>>> = const { RefCell::new(Vec::new()) };
    static BLOCK_TRACKING: std::cell::Cell<i32> = const { std::cell::Cell::new(1) };
}

/// Open a block; subsequent dynamic vnodes collect into its flat list.
/// `disable_tracking` is used by fragments whose child count changes (v-for).
pub fn open_block(disable_tracking: bool) {
    BLOCK_STACK.with(|stack| {
        stack
            .borrow_mut()
            .push(if disable_tracking { None } else { Some(Vec::new()) })
    });
}

fn close_block() -> Option<Vec<VNodeRef>> {
    BLOCK_STACK.with(|stack| stack.borrow_mut().pop()).flatten()
}

/// v-once renders inside `set_block_tracking(-1) .. (1)` so their cached
/// subtrees never register as dynamic children.
pub fn set_block_tracking(delta: i32) {
    BLOCK_TRACKING.with(|t| t.set(t.get() + delta));
}

fn track_dynamic(vnode: &VNodeRef) {
    let dynamic = {
        let n = vnode.borrow();
        (n.patch_flag.bits() > 0 || n.shape_flag.is_component())
            && n.patch_flag != PatchFlags::HOISTED
    };
    if !dynamic || BLOCK_TRACKING.with(|t| t.get()) <= 0 {
        return;
    }
    BLOCK_STACK.with(|stack| {
        if let Some(Some(block)) = stack.borrow_mut().last_mut() {
            block.push(vnode.clone());
        }
    });
}

fn finish_vnode(vnode: VNode) -> VNodeRef {
    let vnode = Rc::new(RefCell::new(vnode));
    track_dynamic(&vnode);
    vnode
}

/// Seal the current block onto `vnode` and register the block itself in the
/// parent block.
fn setup_block(vnode: VNodeRef) -> VNodeRef {
    let captured = close_block();
    vnode.borrow_mut().dynamic_children = captured;
    track_dynamic(&vnode);
    vnode
}

// ============================================================================
// Constructors
// ============================================================================

/// Extract the special `key` prop into the vnode key.
fn take_key(props: &mut PropMap) -> Option<VNodeKey> {
    match props.remove("key") {
        Some(PropValue::Str(s)) => Some(VNodeKey::Str(s)),
        Some(PropValue::Num(n)) => Some(VNodeKey::Num(n as i64)),
        Some(_) | None => None,
    }
}

/// Create an element vnode.
pub fn create_element(
    tag: impl Into<CompactString>,
    mut props: PropMap,
    children: VNodeChildren,
    patch_flag: PatchFlags,
    dynamic_props: Option<Vec<CompactString>>,
) -> VNodeRef {
    let key = take_key(&mut props);
    let mut vnode = VNode::new(VNodeType::Element(tag.into()), props, children);
    vnode.key = key;
    vnode.patch_flag = patch_flag;
    vnode.dynamic_props = dynamic_props;
    finish_vnode(vnode)
}

/// Create an element block: the element plus its captured dynamic children.
pub fn create_element_block(
    tag: impl Into<CompactString>,
    mut props: PropMap,
    children: VNodeChildren,
    patch_flag: PatchFlags,
    dynamic_props: Option<Vec<CompactString>>,
) -> VNodeRef {
    let key = take_key(&mut props);
    let mut vnode = VNode::new(VNodeType::Element(tag.into()), props, children);
    vnode.key = key;
    vnode.patch_flag = patch_flag;
    vnode.dynamic_props = dynamic_props;
    setup_block(Rc::new(RefCell::new(vnode)))
}

fn build_component_vnode(
    def: Rc<ComponentDef>,
    mut props: PropMap,
    slots: Option<Slots>,
    patch_flag: PatchFlags,
    dynamic_props: Option<Vec<CompactString>>,
) -> VNode {
    let key = take_key(&mut props);
    let children = match slots {
        Some(slots) => VNodeChildren::Slots(slots),
        None => VNodeChildren::None,
    };
    let mut vnode = VNode::new(VNodeType::Component(def), props, children);
    vnode.key = key;
    vnode.patch_flag = patch_flag;
    vnode.dynamic_props = dynamic_props;
    vnode
}

/// Create a component vnode; children are slots.
pub fn create_component(
    def: Rc<ComponentDef>,
    props: PropMap,
    slots: Option<Slots>,
    patch_flag: PatchFlags,
    dynamic_props: Option<Vec<CompactString>>,
) -> VNodeRef {
    finish_vnode(build_component_vnode(def, props, slots, patch_flag, dynamic_props))
}

/// Create a component block.
pub fn create_component_block(
    def: Rc<ComponentDef>,
    props: PropMap,
    slots: Option<Slots>,
    patch_flag: PatchFlags,
    dynamic_props: Option<Vec<CompactString>>,
) -> VNodeRef {
    let vnode = build_component_vnode(def, props, slots, patch_flag, dynamic_props);
    setup_block(Rc::new(RefCell::new(vnode)))
}

/// Create a text vnode.
pub fn create_text(text: impl Into<CompactString>, patch_flag: PatchFlags) -> VNodeRef {
    let mut vnode = VNode::new(VNodeType::Text, PropMap::default(), VNodeChildren::None);
    vnode.children = VNodeChildren::Text(text.into());
    vnode.patch_flag = patch_flag;
    finish_vnode(vnode)
}

/// Create a comment vnode.
pub fn create_comment(text: impl Into<CompactString>) -> VNodeRef {
    let mut vnode = VNode::new(VNodeType::Comment, PropMap::default(), VNodeChildren::None);
    vnode.children = VNodeChildren::Text(text.into());
    finish_vnode(vnode)
}

/// Create a fragment vnode.
pub fn create_fragment(children: Vec<VNodeRef>, patch_flag: PatchFlags) -> VNodeRef {
    let mut vnode = VNode::new(
        VNodeType::Fragment,
        PropMap::default(),
        VNodeChildren::Nodes(children),
    );
    vnode.patch_flag = patch_flag;
    finish_vnode(vnode)
}

/// Create a fragment block (v-for, multi-root templates).
pub fn create_fragment_block(children: Vec<VNodeRef>, patch_flag: PatchFlags) -> VNodeRef {
    let mut vnode = VNode::new(
        VNodeType::Fragment,
        PropMap::default(),
        VNodeChildren::Nodes(children),
    );
    vnode.patch_flag = patch_flag;
    setup_block(Rc::new(RefCell::new(vnode)))
}

/// Render-list helper: iterate a source producing one vnode per item.
pub fn render_list<T>(source: Vec<T>, mut render: impl FnMut(T, usize) -> VNodeRef) -> Vec<VNodeRef> {
    source
        .into_iter()
        .enumerate()
        .map(|(i, item)| render(item, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_flags() {
        let el = create_element(
            "div",
            PropMap::default(),
            VNodeChildren::Text("hi".into()),
            PatchFlags::empty(),
            None,
        );
        let n = el.borrow();
        assert!(n.shape_flag.contains(ShapeFlags::ELEMENT));
        assert!(n.shape_flag.contains(ShapeFlags::TEXT_CHILDREN));
    }

    #[test]
    fn test_key_extraction() {
        let mut props = PropMap::default();
        props.insert("key".into(), PropValue::str("a"));
        props.insert("id".into(), PropValue::str("x"));
        let el = create_element(
            "div",
            props,
            VNodeChildren::None,
            PatchFlags::empty(),
            None,
        );
        let n = el.borrow();
        assert_eq!(n.key, Some(VNodeKey::Str("a".into())));
        assert!(!n.props.contains_key("key"));
        assert!(n.props.contains_key("id"));
    }

    #[test]
    fn test_same_vnode_type() {
        let a = create_element("div", PropMap::default(), VNodeChildren::None, PatchFlags::empty(), None);
        let b = create_element("div", PropMap::default(), VNodeChildren::None, PatchFlags::empty(), None);
        let c = create_element("span", PropMap::default(), VNodeChildren::None, PatchFlags::empty(), None);
        assert!(same_vnode_type(&a, &b));
        assert!(!same_vnode_type(&a, &c));

        let mut props = PropMap::default();
        props.insert("key".into(), PropValue::str("k"));
        let keyed = create_element("div", props, VNodeChildren::None, PatchFlags::empty(), None);
        assert!(!same_vnode_type(&a, &keyed));
    }

    #[test]
    fn test_block_captures_dynamic_descendants() {
        open_block(false);
        let static_child = create_element(
            "span",
            PropMap::default(),
            VNodeChildren::Text("static".into()),
            PatchFlags::empty(),
            None,
        );
        let dynamic_child = create_element(
            "span",
            PropMap::default(),
            VNodeChildren::Text("dyn".into()),
            PatchFlags::TEXT,
            None,
        );
        let block = create_element_block(
            "div",
            PropMap::default(),
            VNodeChildren::Nodes(vec![static_child, dynamic_child.clone()]),
            PatchFlags::empty(),
            None,
        );
        let n = block.borrow();
        let dynamic = n.dynamic_children.as_ref().unwrap();
        assert_eq!(dynamic.len(), 1);
        assert!(Rc::ptr_eq(&dynamic[0], &dynamic_child));
    }

    #[test]
    fn test_v_once_suppresses_block_tracking() {
        open_block(false);
        set_block_tracking(-1);
        let _cached = create_element(
            "span",
            PropMap::default(),
            VNodeChildren::Text("x".into()),
            PatchFlags::TEXT,
            None,
        );
        set_block_tracking(1);
        let block = create_element_block(
            "div",
            PropMap::default(),
            VNodeChildren::None,
            PatchFlags::empty(),
            None,
        );
        assert!(block.borrow().dynamic_children.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_clone_resets_mount_state() {
        let el = create_element("div", PropMap::default(), VNodeChildren::None, PatchFlags::empty(), None);
        el.borrow_mut().el = Some(42);
        let cloned = clone_vnode(&el);
        assert!(cloned.borrow().el.is_none());
        assert!(same_vnode_type(&el, &cloned));
    }
}
