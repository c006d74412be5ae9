//! v-on lowering.
//!
//! `@click="handler"` becomes an `onClick` prop. Event-phase modifiers
//! (capture/once/passive) become key suffixes; key modifiers wrap the
//! handler in `withKeys`; the rest wrap it in `withModifiers`. With
//! `cache_handlers` the handler value is placed in a `_cache` slot so the
//! installed listener stays stable across renders.

use lueur_esquisse::ast::*;
use lueur_esquisse::errors::ErrorCode;
use lueur_socle::{capitalize, to_handler_key, Box, PatchFlags, String};

use crate::transform::TransformContext;
use crate::transforms::transform_element::{expression_to_js, PropsAccumulator};

const KEY_MODIFIERS: &[&str] = &[
    "enter", "tab", "delete", "esc", "space", "up", "down", "left", "right",
];
const OPTION_MODIFIERS: &[&str] = &["capture", "once", "passive"];

pub fn transform_on<'a>(
    ctx: &mut TransformContext<'a>,
    mut dir: Box<'a, DirectiveNode<'a>>,
    acc: &mut PropsAccumulator<'a>,
    is_component: bool,
) {
    let exp = dir.exp.take();

    let Some(arg) = dir.arg.take() else {
        // v-on="obj" listener spread
        match exp {
            Some(exp) => acc.push_handlers(exp),
            None => ctx.error(ErrorCode::VOnNoExpression, Some(dir.loc.clone())),
        }
        return;
    };

    let mut key_mods = std::vec::Vec::new();
    let mut wrap_mods = std::vec::Vec::new();
    let mut option_mods = std::vec::Vec::new();
    for m in dir.modifiers.iter() {
        let name = m.content.as_str();
        if KEY_MODIFIERS.contains(&name) {
            key_mods.push(m.content.clone());
        } else if OPTION_MODIFIERS.contains(&name) {
            option_mods.push(m.content.clone());
        } else {
            wrap_mods.push(m.content.clone());
        }
    }

    let mut value = match exp {
        Some(exp) => expression_to_js(exp),
        None if !dir.modifiers.is_empty() => {
            // Modifier-only handler, e.g. @submit.prevent
            let noop = SimpleExpressionNode::new("() => {}", false, dir.loc.clone());
            JsChildNode::Simple(Box::new_in(noop, ctx.allocator))
        }
        None => {
            ctx.error(ErrorCode::VOnNoExpression, Some(dir.loc.clone()));
            return;
        }
    };

    if !wrap_mods.is_empty() {
        value = wrap_call(ctx, RuntimeHelper::WithModifiers, value, &wrap_mods, &dir.loc);
    }
    if !key_mods.is_empty() {
        value = wrap_call(ctx, RuntimeHelper::WithKeys, value, &key_mods, &dir.loc);
    }

    if ctx.options.cache_handlers && !is_component {
        let cache = CacheExpression {
            index: ctx.next_cache_index(),
            value,
            need_pause_tracking: false,
            in_v_once: false,
            loc: dir.loc.clone(),
        };
        value = JsChildNode::Cache(Box::new_in(cache, ctx.allocator));
    }

    match arg {
        ExpressionNode::Simple(arg_expr) if arg_expr.is_static => {
            let mut name = to_handler_key(&arg_expr.content);
            for m in &option_mods {
                name.push_str(&capitalize(m));
            }

            acc.flags |= PatchFlags::PROPS;
            if !is_component {
                acc.flags |= PatchFlags::NEED_HYDRATION;
            }
            acc.dynamic_names.push(name.clone());
            acc.has_events = true;

            let mut key_expr = SimpleExpressionNode::new(name, true, arg_expr.loc.clone());
            key_expr.is_handler_key = true;
            acc.push_property(Property {
                key: ExpressionNode::Simple(Box::new_in(key_expr, ctx.allocator)),
                value,
                loc: dir.loc.clone(),
            });
        }
        dynamic_arg => {
            // @[event]="handler" - computed handler key
            ctx.helper(RuntimeHelper::ToHandlerKey);
            acc.has_dynamic_keys = true;
            acc.has_events = true;
            let key = match dynamic_arg {
                ExpressionNode::Simple(mut s) => {
                    s.is_handler_key = true;
                    ExpressionNode::Simple(s)
                }
                other => other,
            };
            acc.push_property(Property {
                key,
                value,
                loc: dir.loc.clone(),
            });
        }
    }
}

/// Wrap a handler value in withModifiers/withKeys.
fn wrap_call<'a>(
    ctx: &mut TransformContext<'a>,
    helper: RuntimeHelper,
    value: JsChildNode<'a>,
    modifiers: &[String],
    loc: &SourceLocation,
) -> JsChildNode<'a> {
    ctx.helper(helper);
    let mut call = CallExpression::new(ctx.allocator, Callee::Symbol(helper), loc.clone());
    call.arguments.push(CallArgument::JsChild(value));
    let list: std::vec::Vec<std::string::String> = modifiers
        .iter()
        .map(|m| format!("\"{}\"", m))
        .collect();
    call.arguments
        .push(CallArgument::String(format!("[{}]", list.join(", ")).into()));
    JsChildNode::Call(Box::new_in(call, ctx.allocator))
}
