//! v-if codegen lowering.
//!
//! An IfNode's branches become a right-folded conditional chain. Every
//! branch root opens a block and gets a stable key (the user key if present,
//! else the branch index) so the reconciler replaces rather than reuses
//! branch subtrees.

use lueur_esquisse::ast::*;
use lueur_socle::{Box, PatchFlags, Vec};

use crate::transform::TransformContext;
use crate::transforms::transform_element::{expression_to_js, static_key_property};

/// Build the conditional-chain codegen node for an if chain.
pub fn build_if_codegen<'a>(ctx: &mut TransformContext<'a>, if_node: &mut IfNode<'a>) {
    ctx.helper(RuntimeHelper::OpenBlock);
    ctx.helper(RuntimeHelper::CreateComment);

    // Fallback alternate when no v-else: a comment placeholder
    let mut alternate = comment_placeholder(ctx, &if_node.loc);

    for index in (0..if_node.branches.len()).rev() {
        let branch = &mut if_node.branches[index];
        let loc = branch.loc.clone();
        let vnode = build_branch_vnode(ctx, branch, index as u32);
        alternate = match branch.condition.take() {
            Some(condition) => {
                let conditional = ConditionalExpression {
                    test: expression_to_js(condition),
                    consequent: vnode,
                    alternate,
                    newline: true,
                    loc,
                };
                JsChildNode::Conditional(Box::new_in(conditional, ctx.allocator))
            }
            None => vnode,
        };
    }

    if let JsChildNode::Conditional(conditional) = alternate {
        if_node.codegen_node = Some(IfCodegenNode(conditional));
    }
}

fn comment_placeholder<'a>(
    ctx: &mut TransformContext<'a>,
    loc: &SourceLocation,
) -> JsChildNode<'a> {
    let mut call = CallExpression::new(
        ctx.allocator,
        Callee::Symbol(RuntimeHelper::CreateComment),
        loc.clone(),
    );
    call.arguments
        .push(CallArgument::String("\"v-if\"".into()));
    call.arguments.push(CallArgument::String("true".into()));
    JsChildNode::Call(Box::new_in(call, ctx.allocator))
}

/// Lower one branch's children into a block vnode.
fn build_branch_vnode<'a>(
    ctx: &mut TransformContext<'a>,
    branch: &mut IfBranchNode<'a>,
    index: u32,
) -> JsChildNode<'a> {
    let key_property = match branch.user_key.take() {
        Some(PropNode::Attribute(attr)) => {
            let loc = attr.loc.clone();
            let content = attr
                .value
                .as_ref()
                .map(|v| v.content.clone())
                .unwrap_or_default();
            let value = SimpleExpressionNode::new(content, true, loc.clone());
            static_key_property(
                ctx,
                "key",
                JsChildNode::Simple(Box::new_in(value, ctx.allocator)),
                loc,
            )
        }
        Some(PropNode::Directive(mut dir)) => {
            let loc = dir.loc.clone();
            let value = match dir.exp.take() {
                Some(exp) => expression_to_js(exp),
                None => JsChildNode::Simple(Box::new_in(
                    SimpleExpressionNode::new(index.to_string(), false, loc.clone()),
                    ctx.allocator,
                )),
            };
            static_key_property(ctx, "key", value, loc)
        }
        None => {
            let value =
                SimpleExpressionNode::new(index.to_string(), false, SourceLocation::STUB);
            static_key_property(
                ctx,
                "key",
                JsChildNode::Simple(Box::new_in(value, ctx.allocator)),
                SourceLocation::STUB,
            )
        }
    };

    let mut children = core::mem::replace(&mut branch.children, Vec::new_in(ctx.allocator));

    if children.len() == 1 {
        match children.pop().unwrap() {
            TemplateChildNode::Element(mut el) => match el.codegen_node.take() {
                Some(ElementCodegenNode::VNodeCall(mut vnode)) => {
                    vnode.is_block = true;
                    register_block_helpers(ctx, &vnode);
                    inject_key(ctx, &mut vnode, key_property);
                    return JsChildNode::VNodeCall(vnode);
                }
                Some(ElementCodegenNode::Cache(cache)) => {
                    return JsChildNode::Cache(cache);
                }
                Some(ElementCodegenNode::Call(call)) => {
                    return JsChildNode::Call(call);
                }
                None => {
                    children.push(TemplateChildNode::Element(el));
                }
            },
            TemplateChildNode::For(mut for_node) => {
                if let Some(mut vnode) = for_node.codegen_node.take() {
                    inject_key(ctx, &mut vnode, key_property);
                    return JsChildNode::VNodeCall(vnode);
                }
                children.push(TemplateChildNode::For(for_node));
            }
            TemplateChildNode::If(mut inner) => {
                if let Some(IfCodegenNode(conditional)) = inner.codegen_node.take() {
                    return JsChildNode::Conditional(conditional);
                }
                children.push(TemplateChildNode::If(inner));
            }
            other => children.push(other),
        }
    }

    // Multiple (or non-element) children: wrap in a keyed fragment block
    ctx.helper(RuntimeHelper::Fragment);
    ctx.helper(RuntimeHelper::CreateElementBlock);
    let mut props = ObjectExpression::new(ctx.allocator, SourceLocation::STUB);
    props.properties.push(key_property);

    let vnode = VNodeCall {
        tag: VNodeTag::Symbol(RuntimeHelper::Fragment),
        props: Some(PropsExpression::Object(Box::new_in(props, ctx.allocator))),
        children: Some(VNodeChildren::Multiple(children)),
        patch_flag: Some(PatchFlags::STABLE_FRAGMENT),
        dynamic_props: None,
        directives: None,
        is_block: true,
        disable_tracking: false,
        is_component: false,
        loc: branch.loc.clone(),
    };
    JsChildNode::VNodeCall(Box::new_in(vnode, ctx.allocator))
}

/// Register the block-form create helper for a vnode call.
pub(crate) fn register_block_helpers<'a>(ctx: &mut TransformContext<'a>, vnode: &VNodeCall<'a>) {
    if vnode.is_component {
        ctx.helper(RuntimeHelper::CreateBlock);
    } else {
        ctx.helper(RuntimeHelper::CreateElementBlock);
    }
}

/// Prepend a key property to a vnode call's props.
fn inject_key<'a>(
    ctx: &mut TransformContext<'a>,
    vnode: &mut VNodeCall<'a>,
    key_property: Property<'a>,
) {
    match vnode.props.take() {
        None => {
            let mut object = ObjectExpression::new(ctx.allocator, SourceLocation::STUB);
            object.properties.push(key_property);
            vnode.props = Some(PropsExpression::Object(Box::new_in(object, ctx.allocator)));
        }
        Some(PropsExpression::Object(mut object)) => {
            // An existing explicit key wins
            let has_key = object.properties.iter().any(|p| {
                matches!(&p.key, ExpressionNode::Simple(k) if k.is_static && k.content == "key")
            });
            if !has_key {
                object.properties.insert(0, key_property);
            }
            vnode.props = Some(PropsExpression::Object(object));
        }
        Some(PropsExpression::Call(mut call)) => {
            // mergeProps: add the key as a leading object argument
            let mut object = ObjectExpression::new(ctx.allocator, SourceLocation::STUB);
            object.properties.push(key_property);
            call.arguments.insert(
                0,
                CallArgument::JsChild(JsChildNode::Object(Box::new_in(object, ctx.allocator))),
            );
            vnode.props = Some(PropsExpression::Call(call));
        }
        Some(other) => {
            vnode.props = Some(other);
        }
    }
}
