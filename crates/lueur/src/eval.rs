//! Static render-program evaluation.
//!
//! Folds the render program of a constant-only template directly into a
//! runtime vnode tree, without generating or executing code. Any dynamic
//! construct (expressions, components, conditionals, list renders) aborts
//! with `None`; this is a verification tool for the compiler's static
//! output, not an interpreter.

use lueur_esquisse::ast::{
    ElementCodegenNode, ExpressionNode, JsChildNode, PropsExpression, RootNode,
    TemplateChildNode, TemplateTextChildNode, TextCallContent, VNodeCall,
    VNodeChildren as AstChildren, VNodeTag,
};
use lueur_socle::PatchFlags;
use lueur_toile::{
    create_comment, create_element, create_text, PropMap, PropValue, VNodeChildren, VNodeRef,
};

/// Evaluate the root of a transformed, constant-only template.
pub fn eval_static_root(root: &RootNode<'_>) -> Option<Vec<VNodeRef>> {
    root.children
        .iter()
        .map(|child| eval_template_child(root, child))
        .collect()
}

fn eval_template_child(root: &RootNode<'_>, node: &TemplateChildNode<'_>) -> Option<VNodeRef> {
    match node {
        TemplateChildNode::Element(el) => match &el.codegen_node {
            Some(ElementCodegenNode::VNodeCall(vnode)) => eval_vnode_call(root, vnode),
            _ => None,
        },
        TemplateChildNode::Text(text) => {
            Some(create_text(text.content.clone(), PatchFlags::empty()))
        }
        TemplateChildNode::TextCall(call) => match &call.content {
            TextCallContent::Text(text) => {
                Some(create_text(text.content.clone(), PatchFlags::empty()))
            }
            _ => None,
        },
        TemplateChildNode::Comment(comment) => Some(create_comment(comment.content.clone())),
        TemplateChildNode::Hoisted(index) => {
            let hoist = root.hoists.get(*index)?;
            match hoist {
                JsChildNode::VNodeCall(vnode) => eval_vnode_call(root, vnode),
                _ => None,
            }
        }
        _ => None,
    }
}

fn eval_vnode_call(root: &RootNode<'_>, vnode: &VNodeCall<'_>) -> Option<VNodeRef> {
    if vnode.is_component || vnode.directives.is_some() {
        return None;
    }
    let tag = match &vnode.tag {
        VNodeTag::String(tag) => tag.clone(),
        _ => return None,
    };

    let props = match &vnode.props {
        None => PropMap::default(),
        Some(PropsExpression::Object(object)) => {
            let mut map = PropMap::default();
            for property in object.properties.iter() {
                let key = match &property.key {
                    ExpressionNode::Simple(k) if k.is_static => k.content.clone(),
                    _ => return None,
                };
                let value = match &property.value {
                    JsChildNode::Simple(v) if v.is_static => PropValue::Str(v.content.clone()),
                    _ => return None,
                };
                map.insert(key, value);
            }
            map
        }
        Some(_) => return None,
    };

    let children = match &vnode.children {
        None => VNodeChildren::None,
        Some(AstChildren::Single(TemplateTextChildNode::Text(text))) => {
            VNodeChildren::Text(text.content.clone())
        }
        Some(AstChildren::Single(_)) => return None,
        Some(AstChildren::Multiple(nodes)) => {
            let children: Option<Vec<VNodeRef>> = nodes
                .iter()
                .map(|child| eval_template_child(root, child))
                .collect();
            VNodeChildren::Nodes(children?)
        }
        Some(_) => return None,
    };

    // Hoisted flags carry no meaning on a hand-evaluated tree
    let patch_flag = match vnode.patch_flag {
        Some(flag) if flag.bits() > 0 => return None,
        _ => PatchFlags::empty(),
    };

    Some(create_element(tag, props, children, patch_flag, None))
}
