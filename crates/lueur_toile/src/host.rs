//! Host renderer contract.
//!
//! The reconciler drives an abstract host through this trait; the host owns
//! real node creation and property application. Handles are opaque ids so a
//! host can be a DOM bridge, a terminal surface or the in-memory mock.

use lueur_socle::CompactString;
use std::rc::Rc;

use crate::vnode::PropValue;

/// Opaque host node handle.
pub type HostNode = u64;

/// Element namespace, decided by the compiler and forwarded on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

/// The five core operations plus the traversal hooks the reconciler needs.
pub trait HostRenderer {
    fn create_element(
        &self,
        tag: &str,
        namespace: Namespace,
        is: Option<&str>,
    ) -> HostNode;
    fn create_text(&self, text: &str) -> HostNode;
    fn create_comment(&self, text: &str) -> HostNode;

    fn set_text(&self, node: HostNode, text: &str);
    fn set_element_text(&self, el: HostNode, text: &str);

    /// Anchor `None` means append.
    fn insert(&self, child: HostNode, parent: HostNode, anchor: Option<HostNode>);
    fn remove(&self, node: HostNode);

    fn parent_node(&self, node: HostNode) -> Option<HostNode>;
    fn next_sibling(&self, node: HostNode) -> Option<HostNode>;

    /// One call per property change; the host decides attribute vs property
    /// vs listener.
    fn patch_prop(
        &self,
        el: HostNode,
        key: &CompactString,
        prev: Option<&PropValue>,
        next: Option<&PropValue>,
    );
}

pub type HostHandle = Rc<dyn HostRenderer>;
