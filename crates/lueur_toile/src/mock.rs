//! In-memory host renderer.
//!
//! Maintains a real node tree and records every mutation, so tests can
//! assert both final structure and exact operation counts (zero-mutation
//! idempotence, single setText updates, minimal moves).

use std::cell::RefCell;
use std::rc::Rc;

use lueur_socle::{CompactString, FxHashMap, SmallVec};

use crate::host::{HostNode, HostRenderer, Namespace};
use crate::vnode::PropValue;

/// A recorded host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateElement(CompactString),
    CreateText(CompactString),
    CreateComment(CompactString),
    SetText(HostNode, CompactString),
    SetElementText(HostNode, CompactString),
    Insert(HostNode, HostNode),
    Remove(HostNode),
    PatchProp(HostNode, CompactString),
}

#[derive(Debug, Clone)]
enum MockNodeKind {
    Element {
        tag: CompactString,
        ns: Namespace,
    },
    Text(CompactString),
    Comment(CompactString),
}

struct MockNode {
    kind: MockNodeKind,
    parent: Option<HostNode>,
    children: SmallVec<[HostNode; 4]>,
    props: FxHashMap<CompactString, PropValue>,
}

/// The mock host.
pub struct MockHost {
    nodes: RefCell<FxHashMap<HostNode, MockNode>>,
    next_id: std::cell::Cell<HostNode>,
    ops: RefCell<Vec<HostOp>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(FxHashMap::default()),
            next_id: std::cell::Cell::new(1),
            ops: RefCell::new(Vec::new()),
        }
    }

    pub fn new_shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    fn alloc(&self, kind: MockNodeKind) -> HostNode {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.nodes.borrow_mut().insert(
            id,
            MockNode {
                kind,
                parent: None,
                children: SmallVec::new(),
                props: FxHashMap::default(),
            },
        );
        id
    }

    fn record(&self, op: HostOp) {
        self.ops.borrow_mut().push(op);
    }

    /// A detached element usable as a mount container.
    pub fn create_root(&self) -> HostNode {
        self.alloc(MockNodeKind::Element {
            tag: "root".into(),
            ns: Namespace::Html,
        })
    }

    /// Drain the recorded op log.
    pub fn take_ops(&self) -> Vec<HostOp> {
        self.ops.borrow_mut().drain(..).collect()
    }

    /// Number of recorded ops without draining.
    pub fn op_count(&self) -> usize {
        self.ops.borrow().len()
    }

    /// Count recorded insert ops (used for move-count assertions).
    pub fn count_inserts(&self) -> usize {
        self.ops
            .borrow()
            .iter()
            .filter(|op| matches!(op, HostOp::Insert(..)))
            .count()
    }

    pub fn child_ids(&self, parent: HostNode) -> Vec<HostNode> {
        self.nodes
            .borrow()
            .get(&parent)
            .map(|n| n.children.to_vec())
            .unwrap_or_default()
    }

    pub fn prop(&self, el: HostNode, key: &str) -> Option<PropValue> {
        self.nodes
            .borrow()
            .get(&el)
            .and_then(|n| n.props.get(key).cloned())
    }

    /// Invoke an installed event handler prop.
    pub fn trigger_event(&self, el: HostNode, key: &str, payload: PropValue) {
        let handler = self.nodes.borrow().get(&el).and_then(|n| {
            n.props.get(key).and_then(|p| match p {
                PropValue::Handler(h) => Some(h.clone()),
                _ => None,
            })
        });
        if let Some(handler) = handler {
            handler(payload);
        }
    }

    fn detach(&self, node: HostNode) {
        let parent = self.nodes.borrow().get(&node).and_then(|n| n.parent);
        if let Some(parent) = parent {
            let mut nodes = self.nodes.borrow_mut();
            if let Some(p) = nodes.get_mut(&parent) {
                p.children.retain(|c| *c != node);
            }
            if let Some(n) = nodes.get_mut(&node) {
                n.parent = None;
            }
        }
    }

    /// Serialize a node's subtree for structural assertions.
    pub fn serialize(&self, node: HostNode) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        self.serialize_into(&nodes, node, &mut out);
        out
    }

    /// Serialize only the children of a container.
    pub fn serialize_children(&self, parent: HostNode) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        if let Some(n) = nodes.get(&parent) {
            for &child in &n.children {
                self.serialize_into(&nodes, child, &mut out);
            }
        }
        out
    }

    fn serialize_into(
        &self,
        nodes: &FxHashMap<HostNode, MockNode>,
        node: HostNode,
        out: &mut String,
    ) {
        let Some(n) = nodes.get(&node) else { return };
        match &n.kind {
            MockNodeKind::Text(text) => out.push_str(text),
            MockNodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            MockNodeKind::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                let mut keys: Vec<&CompactString> = n
                    .props
                    .keys()
                    .filter(|k| !matches!(n.props.get(*k), Some(PropValue::Handler(_))))
                    .collect();
                keys.sort();
                for key in keys {
                    match n.props.get(key) {
                        Some(PropValue::Str(v)) => {
                            out.push(' ');
                            out.push_str(key);
                            out.push_str("=\"");
                            out.push_str(v);
                            out.push('"');
                        }
                        Some(PropValue::Num(v)) => {
                            out.push(' ');
                            out.push_str(key);
                            out.push_str(&format!("=\"{}\"", v));
                        }
                        Some(PropValue::Bool(true)) => {
                            out.push(' ');
                            out.push_str(key);
                        }
                        _ => {}
                    }
                }
                out.push('>');
                for &child in &n.children {
                    self.serialize_into(nodes, child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl HostRenderer for MockHost {
    fn create_element(&self, tag: &str, namespace: Namespace, _is: Option<&str>) -> HostNode {
        self.record(HostOp::CreateElement(tag.into()));
        self.alloc(MockNodeKind::Element {
            tag: tag.into(),
            ns: namespace,
        })
    }

    fn create_text(&self, text: &str) -> HostNode {
        self.record(HostOp::CreateText(text.into()));
        self.alloc(MockNodeKind::Text(text.into()))
    }

    fn create_comment(&self, text: &str) -> HostNode {
        self.record(HostOp::CreateComment(text.into()));
        self.alloc(MockNodeKind::Comment(text.into()))
    }

    fn set_text(&self, node: HostNode, text: &str) {
        self.record(HostOp::SetText(node, text.into()));
        if let Some(n) = self.nodes.borrow_mut().get_mut(&node) {
            match &mut n.kind {
                MockNodeKind::Text(t) | MockNodeKind::Comment(t) => *t = text.into(),
                MockNodeKind::Element { .. } => {}
            }
        }
    }

    fn set_element_text(&self, el: HostNode, text: &str) {
        self.record(HostOp::SetElementText(el, text.into()));
        // Drop existing children, then a single text child
        let children = self.child_ids(el);
        for child in children {
            self.detach(child);
        }
        if !text.is_empty() {
            let text_node = self.alloc(MockNodeKind::Text(text.into()));
            let mut nodes = self.nodes.borrow_mut();
            if let Some(n) = nodes.get_mut(&el) {
                n.children.push(text_node);
            }
            if let Some(t) = nodes.get_mut(&text_node) {
                t.parent = Some(el);
            }
        }
    }

    fn insert(&self, child: HostNode, parent: HostNode, anchor: Option<HostNode>) {
        self.record(HostOp::Insert(child, parent));
        self.detach(child);
        let mut nodes = self.nodes.borrow_mut();
        let index = match anchor {
            Some(anchor) => nodes
                .get(&parent)
                .and_then(|p| p.children.iter().position(|&c| c == anchor)),
            None => None,
        };
        if let Some(p) = nodes.get_mut(&parent) {
            match index {
                Some(i) => p.children.insert(i, child),
                None => p.children.push(child),
            }
        }
        if let Some(c) = nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }

    fn remove(&self, node: HostNode) {
        self.record(HostOp::Remove(node));
        self.detach(node);
    }

    fn parent_node(&self, node: HostNode) -> Option<HostNode> {
        self.nodes.borrow().get(&node).and_then(|n| n.parent)
    }

    fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
        let nodes = self.nodes.borrow();
        let parent = nodes.get(&node).and_then(|n| n.parent)?;
        let siblings = &nodes.get(&parent)?.children;
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn patch_prop(
        &self,
        el: HostNode,
        key: &CompactString,
        _prev: Option<&PropValue>,
        next: Option<&PropValue>,
    ) {
        self.record(HostOp::PatchProp(el, key.clone()));
        let mut nodes = self.nodes.borrow_mut();
        if let Some(n) = nodes.get_mut(&el) {
            match next {
                Some(value) => {
                    n.props.insert(key.clone(), value.clone());
                }
                None => {
                    n.props.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_building() {
        let host = MockHost::new();
        let root = host.create_root();
        let div = host.create_element("div", Namespace::Html, None);
        let text = host.create_text("hi");
        host.insert(text, div, None);
        host.insert(div, root, None);
        assert_eq!(host.serialize_children(root), "<div>hi</div>");
    }

    #[test]
    fn test_insert_with_anchor() {
        let host = MockHost::new();
        let root = host.create_root();
        let a = host.create_text("a");
        let b = host.create_text("b");
        let c = host.create_text("c");
        host.insert(a, root, None);
        host.insert(c, root, None);
        host.insert(b, root, Some(c));
        assert_eq!(host.serialize_children(root), "abc");
    }

    #[test]
    fn test_reinsert_moves() {
        let host = MockHost::new();
        let root = host.create_root();
        let a = host.create_text("a");
        let b = host.create_text("b");
        host.insert(a, root, None);
        host.insert(b, root, None);
        host.insert(a, root, None); // move a to the end
        assert_eq!(host.serialize_children(root), "ba");
    }

    #[test]
    fn test_next_sibling() {
        let host = MockHost::new();
        let root = host.create_root();
        let a = host.create_text("a");
        let b = host.create_text("b");
        host.insert(a, root, None);
        host.insert(b, root, None);
        assert_eq!(host.next_sibling(a), Some(b));
        assert_eq!(host.next_sibling(b), None);
    }
}
