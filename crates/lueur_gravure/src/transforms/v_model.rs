//! v-model lowering.
//!
//! On components: a `modelValue` prop paired with an `onUpdate:modelValue`
//! handler. On form elements: the update handler plus a runtime directive
//! (`vModelText` / `vModelDynamic`) installed through `withDirectives`.

use lueur_esquisse::ast::*;
use lueur_esquisse::errors::ErrorCode;
use lueur_socle::{Box, PatchFlags, String, Vec};

use crate::transform::{clone_expression, TransformContext};
use crate::transforms::transform_element::{
    expression_to_js, static_key_property, PropsAccumulator,
};

pub fn transform_model<'a>(
    ctx: &mut TransformContext<'a>,
    mut dir: Box<'a, DirectiveNode<'a>>,
    acc: &mut PropsAccumulator<'a>,
    tag: &str,
    is_component: bool,
) {
    let Some(exp) = dir.exp.take() else {
        ctx.error(ErrorCode::VModelNoExpression, Some(dir.loc.clone()));
        return;
    };

    // The bound expression must be a writable member path
    let writable = match &exp {
        ExpressionNode::Simple(s) => lueur_socle::is_simple_identifier(&s.content),
        ExpressionNode::Compound(_) => false,
    };
    if !writable {
        ctx.error(ErrorCode::InvalidExpression, Some(exp.loc().clone()));
        return;
    }

    if !is_component && !matches!(tag, "input" | "textarea" | "select") {
        ctx.error(ErrorCode::VModelOnInvalidElement, Some(dir.loc.clone()));
        return;
    }

    let prop_name: String = if is_component {
        dir.static_arg().unwrap_or("modelValue").into()
    } else {
        String::const_new("modelValue")
    };
    let event_name: String = {
        let mut n = String::const_new("onUpdate:");
        n.push_str(&prop_name);
        n
    };

    // `$event => ((exp) = $event)`
    let assignment = {
        let mut compound = CompoundExpressionNode::new(ctx.allocator, dir.loc.clone());
        compound
            .children
            .push(CompoundExpressionChild::String(String::const_new(
                "$event => ((",
            )));
        match clone_expression(ctx, &exp) {
            ExpressionNode::Simple(s) => {
                compound.children.push(CompoundExpressionChild::Simple(s))
            }
            ExpressionNode::Compound(_) => unreachable!("writable check rejects compounds"),
        }
        compound
            .children
            .push(CompoundExpressionChild::String(String::const_new(
                ") = $event)",
            )));
        JsChildNode::Compound(Box::new_in(compound, ctx.allocator))
    };

    acc.flags |= PatchFlags::PROPS;
    acc.dynamic_names.push(event_name.clone());

    if is_component {
        acc.dynamic_names.push(prop_name.clone());
        let value = expression_to_js(exp);
        let prop = static_key_property(ctx, prop_name, value, dir.loc.clone());
        acc.push_property(prop);
    } else {
        let helper = if tag == "select" {
            RuntimeHelper::VModelDynamic
        } else {
            RuntimeHelper::VModelText
        };
        ctx.helper(helper);
        acc.runtime_dirs.push(DirectiveArgumentNode {
            directive: DirectiveArgumentTarget::Helper(helper),
            exp: Some(exp),
            arg: None,
            modifiers: {
                let mut mods = Vec::new_in(ctx.allocator);
                for m in dir.modifiers.iter() {
                    mods.push(m.content.clone());
                }
                mods
            },
        });
    }

    let event_prop = static_key_property(ctx, event_name, assignment, dir.loc.clone());
    acc.push_property(event_prop);
}
