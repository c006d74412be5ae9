//! Static hoisting analysis.
//!
//! A subtree is hoistable when its props and children are all compile-time
//! constants: the transform lifts its vnode call to a module-level constant
//! and the reconciler skips it via the HOISTED patch flag.

use lueur_esquisse::ast::*;

/// Whether an element's entire subtree is compile-time constant.
pub fn is_constant_subtree(el: &ElementNode<'_>) -> bool {
    if el.tag_type != ElementType::Element {
        return false;
    }

    // Any directive (including v-bind shorthand) makes the node dynamic;
    // `ref` needs a patch even though it is a plain attribute.
    let props_constant = el.props.iter().all(|p| match p {
        PropNode::Attribute(attr) => attr.name != "ref",
        PropNode::Directive(_) => false,
    });
    if !props_constant {
        return false;
    }

    el.children.iter().all(|child| match child {
        TemplateChildNode::Text(_) | TemplateChildNode::Comment(_) => true,
        TemplateChildNode::Element(child_el) => is_constant_subtree(child_el),
        _ => false,
    })
}
