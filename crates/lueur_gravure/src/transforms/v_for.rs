//! v-for codegen lowering.
//!
//! A ForNode becomes a fragment block whose children come from a
//! `renderList(source, (value, key, index) => vnode)` call. The fragment is
//! keyed when the iteration root carries a key binding; block tracking is
//! disabled inside because the child count changes between renders.

use lueur_esquisse::ast::*;
use lueur_socle::{Box, PatchFlags, String, Vec};

use crate::transform::TransformContext;
use crate::transforms::v_if::register_block_helpers;

/// Build the renderList fragment codegen node for a v-for.
pub fn build_for_codegen<'a>(ctx: &mut TransformContext<'a>, for_node: &mut ForNode<'a>) {
    ctx.helper(RuntimeHelper::OpenBlock);
    ctx.helper(RuntimeHelper::CreateElementBlock);
    ctx.helper(RuntimeHelper::Fragment);
    ctx.helper(RuntimeHelper::RenderList);

    let loc = for_node.loc.clone();
    let children = core::mem::replace(&mut for_node.children, Vec::new_in(ctx.allocator));
    let (item, keyed) = build_iteration_vnode(ctx, children, &loc);

    // Iterator parameters in (value, key, index) positions; gaps become
    // placeholder names so later positions line up.
    let mut params: Vec<'a, String> = Vec::new_in(ctx.allocator);
    let aliases = [
        for_node.value_alias.take(),
        for_node.key_alias.take(),
        for_node.index_alias.take(),
    ];
    let last_present = aliases.iter().rposition(Option::is_some);
    if let Some(last) = last_present {
        for (i, alias) in aliases.into_iter().enumerate().take(last + 1) {
            match alias {
                Some(ExpressionNode::Simple(s)) => params.push(s.content.clone()),
                Some(ExpressionNode::Compound(c)) => params.push(c.loc.source.clone()),
                None => params.push(if i == 1 {
                    String::const_new("__")
                } else {
                    String::const_new("_")
                }),
            }
        }
    }

    let function = FunctionExpression {
        params,
        returns: Some(FunctionReturns::JsChild(item)),
        newline: true,
        is_slot: false,
        loc: loc.clone(),
    };

    let source = clone_source(ctx, &for_node.source);
    let mut call = CallExpression::new(
        ctx.allocator,
        Callee::Symbol(RuntimeHelper::RenderList),
        loc.clone(),
    );
    call.arguments.push(CallArgument::Expression(source));
    call.arguments.push(CallArgument::JsChild(JsChildNode::Function(
        Box::new_in(function, ctx.allocator),
    )));

    let fragment = VNodeCall {
        tag: VNodeTag::Symbol(RuntimeHelper::Fragment),
        props: None,
        children: Some(VNodeChildren::ForRenderList(Box::new_in(
            call,
            ctx.allocator,
        ))),
        patch_flag: Some(if keyed {
            PatchFlags::KEYED_FRAGMENT
        } else {
            PatchFlags::UNKEYED_FRAGMENT
        }),
        dynamic_props: None,
        directives: None,
        is_block: true,
        disable_tracking: true,
        is_component: false,
        loc,
    };
    for_node.codegen_node = Some(Box::new_in(fragment, ctx.allocator));
}

fn clone_source<'a>(
    ctx: &TransformContext<'a>,
    source: &ExpressionNode<'a>,
) -> ExpressionNode<'a> {
    crate::transform::clone_expression(ctx, source)
}

/// Lower the per-iteration content; returns the vnode and whether it is
/// keyed.
fn build_iteration_vnode<'a>(
    ctx: &mut TransformContext<'a>,
    mut children: Vec<'a, TemplateChildNode<'a>>,
    loc: &SourceLocation,
) -> (JsChildNode<'a>, bool) {
    if children.len() == 1 {
        match children.pop().unwrap() {
            TemplateChildNode::Element(mut el) => match el.codegen_node.take() {
                Some(ElementCodegenNode::VNodeCall(mut vnode)) => {
                    let keyed = vnode_has_key(&vnode);
                    vnode.is_block = true;
                    register_block_helpers(ctx, &vnode);
                    return (JsChildNode::VNodeCall(vnode), keyed);
                }
                Some(ElementCodegenNode::Cache(cache)) => {
                    return (JsChildNode::Cache(cache), false);
                }
                Some(ElementCodegenNode::Call(call)) => {
                    return (JsChildNode::Call(call), false);
                }
                None => children.push(TemplateChildNode::Element(el)),
            },
            TemplateChildNode::If(mut inner) => {
                if let Some(IfCodegenNode(conditional)) = inner.codegen_node.take() {
                    return (JsChildNode::Conditional(conditional), false);
                }
                children.push(TemplateChildNode::If(inner));
            }
            other => children.push(other),
        }
    }

    // Multiple children per iteration: a stable fragment block
    let vnode = VNodeCall {
        tag: VNodeTag::Symbol(ctx.helper(RuntimeHelper::Fragment)),
        props: None,
        children: Some(VNodeChildren::Multiple(children)),
        patch_flag: Some(PatchFlags::STABLE_FRAGMENT),
        dynamic_props: None,
        directives: None,
        is_block: true,
        disable_tracking: false,
        is_component: false,
        loc: loc.clone(),
    };
    (
        JsChildNode::VNodeCall(Box::new_in(vnode, ctx.allocator)),
        false,
    )
}

/// Whether a vnode call's props carry a key entry.
fn vnode_has_key(vnode: &VNodeCall<'_>) -> bool {
    match &vnode.props {
        Some(PropsExpression::Object(object)) => object.properties.iter().any(|p| {
            matches!(&p.key, ExpressionNode::Simple(k) if k.is_static && k.content == "key")
        }),
        _ => false,
    }
}
