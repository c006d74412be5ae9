//! Text merging.
//!
//! Adjacent text and interpolation siblings are merged into one compound
//! expression so they produce a single text vnode. When text appears next to
//! element siblings (or as slot content) it is wrapped into a TextCall so
//! codegen emits an explicit `createTextVNode`.

use lueur_esquisse::ast::*;
use lueur_socle::{Box, String, Vec};

use crate::transform::{ParentKind, TransformContext};

fn is_text_like(node: &TemplateChildNode<'_>) -> bool {
    matches!(
        node,
        TemplateChildNode::Text(_)
            | TemplateChildNode::Interpolation(_)
            | TemplateChildNode::CompoundExpression(_)
    )
}

fn push_compound_child<'a>(
    compound: &mut CompoundExpressionNode<'a>,
    node: TemplateChildNode<'a>,
) {
    match node {
        TemplateChildNode::Text(t) => compound.children.push(CompoundExpressionChild::Text(t)),
        TemplateChildNode::Interpolation(i) => {
            compound.children.push(CompoundExpressionChild::Interpolation(i))
        }
        TemplateChildNode::CompoundExpression(inner) => {
            // Flatten nested compounds
            let mut inner = inner;
            for child in core::mem::replace(&mut inner.children, Vec::new_in(compound.children.bump()))
            {
                compound.children.push(child);
            }
        }
        _ => {}
    }
}

/// Merge adjacent text-ish siblings, then wrap mixed-content text into
/// TextCall nodes.
pub fn merge_adjacent_text<'a>(
    ctx: &mut TransformContext<'a>,
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    parent: ParentKind,
) {
    // Merge runs of adjacent text-ish nodes into compound expressions
    let mut i = 0;
    while i < children.len() {
        if is_text_like(&children[i])
            && children.get(i + 1).is_some_and(is_text_like)
        {
            let loc = children[i].loc().clone();
            let mut compound = CompoundExpressionNode::new(ctx.allocator, loc);
            push_compound_child(&mut compound, children.remove(i));
            while i < children.len() && is_text_like(&children[i]) {
                compound
                    .children
                    .push(CompoundExpressionChild::String(String::const_new(" + ")));
                push_compound_child(&mut compound, children.remove(i));
            }
            let boxed = Box::new_in(compound, ctx.allocator);
            children.insert(i, TemplateChildNode::CompoundExpression(boxed));
        }
        i += 1;
    }

    // A lone text child of a plain element becomes the element's direct text
    // children; everything else gets an explicit createTextVNode.
    if parent == ParentKind::Element && children.len() == 1 && is_text_like(&children[0]) {
        return;
    }

    for i in 0..children.len() {
        if !is_text_like(&children[i]) {
            continue;
        }
        let node = children.remove(i);
        let loc = node.loc().clone();
        let content = match node {
            TemplateChildNode::Text(t) => TextCallContent::Text(t),
            TemplateChildNode::Interpolation(n) => TextCallContent::Interpolation(n),
            TemplateChildNode::CompoundExpression(c) => TextCallContent::Compound(c),
            _ => unreachable!(),
        };
        ctx.helper(RuntimeHelper::CreateText);
        let call = TextCallNode { content, loc };
        let boxed = Box::new_in(call, ctx.allocator);
        children.insert(i, TemplateChildNode::TextCall(boxed));
    }
}
