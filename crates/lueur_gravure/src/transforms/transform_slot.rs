//! Slot lowering: v-slot content on components, and `<slot>` outlets.

use lueur_esquisse::ast::*;
use lueur_esquisse::errors::ErrorCode;
use lueur_socle::{Box, String, Vec};

use crate::transform::{remove_directive, TransformContext};
use crate::transforms::transform_element::expression_to_js;

/// Build the slots object for a component's children.
///
/// Loose children become the default slot; `<template v-slot:name>` children
/// become named slots. Returns the object plus whether any slot name is
/// dynamic (DYNAMIC_SLOTS).
pub fn build_slots<'a>(
    ctx: &mut TransformContext<'a>,
    children: Vec<'a, TemplateChildNode<'a>>,
    self_slot_dir: Option<Box<'a, DirectiveNode<'a>>>,
    loc: SourceLocation,
) -> (Box<'a, ObjectExpression<'a>>, bool) {
    ctx.helper(RuntimeHelper::WithCtx);

    let mut object = ObjectExpression::new(ctx.allocator, loc.clone());
    let mut dynamic = false;
    let mut seen_names: std::vec::Vec<String> = std::vec::Vec::new();

    if let Some(mut dir) = self_slot_dir {
        // <Comp v-slot="props"> - everything is the default slot
        let params = dir.exp.take().map(|e| match e {
            ExpressionNode::Simple(s) => s.content.clone(),
            ExpressionNode::Compound(c) => c.loc.source.clone(),
        });
        let property = slot_property(ctx, String::const_new("default"), params, children, &loc);
        object.properties.push(property);
    } else {
        let mut default_children: Vec<'a, TemplateChildNode<'a>> = Vec::new_in(ctx.allocator);

        for child in children {
            let named = match child {
                TemplateChildNode::Element(mut el)
                    if el.tag_type == ElementType::Template =>
                {
                    match remove_directive(&mut el, "slot") {
                        Some(dir) => Some((el, dir)),
                        None => {
                            default_children.push(TemplateChildNode::Element(el));
                            None
                        }
                    }
                }
                other => {
                    default_children.push(other);
                    None
                }
            };

            let Some((mut el, mut dir)) = named else {
                continue;
            };

            let params = dir.exp.take().map(|e| match e {
                ExpressionNode::Simple(s) => s.content.clone(),
                ExpressionNode::Compound(c) => c.loc.source.clone(),
            });
            let slot_children =
                core::mem::replace(&mut el.children, Vec::new_in(ctx.allocator));

            match dir.arg.take() {
                Some(ExpressionNode::Simple(arg)) if !arg.is_static => {
                    // Dynamic slot name: computed key
                    dynamic = true;
                    let function =
                        slot_function(ctx, params, slot_children, &dir.loc);
                    object.properties.push(Property {
                        key: ExpressionNode::Simple(arg),
                        value: function,
                        loc: dir.loc.clone(),
                    });
                }
                arg => {
                    let name: String = match arg {
                        Some(ExpressionNode::Simple(s)) => s.content.clone(),
                        _ => String::const_new("default"),
                    };
                    if seen_names.contains(&name) {
                        ctx.error(
                            ErrorCode::VSlotDuplicateSlotNames,
                            Some(dir.loc.clone()),
                        );
                        continue;
                    }
                    seen_names.push(name.clone());
                    let property =
                        slot_property(ctx, name, params, slot_children, &dir.loc);
                    object.properties.push(property);
                }
            }
        }

        if !default_children.is_empty() {
            if seen_names.iter().any(|n| n == "default") {
                ctx.error(ErrorCode::VSlotDuplicateSlotNames, Some(loc.clone()));
            } else {
                let property = slot_property(
                    ctx,
                    String::const_new("default"),
                    None,
                    default_children,
                    &loc,
                );
                object.properties.push(property);
            }
        }
    }

    // Stable-slots marker consumed by the runtime
    let marker_value = SimpleExpressionNode::new("1", false, SourceLocation::STUB);
    object.properties.push(Property {
        key: ExpressionNode::Simple(Box::new_in(
            SimpleExpressionNode::new("_", true, SourceLocation::STUB),
            ctx.allocator,
        )),
        value: JsChildNode::Simple(Box::new_in(marker_value, ctx.allocator)),
        loc: SourceLocation::STUB,
    });

    (Box::new_in(object, ctx.allocator), dynamic)
}

fn slot_property<'a>(
    ctx: &mut TransformContext<'a>,
    name: String,
    params: Option<String>,
    children: Vec<'a, TemplateChildNode<'a>>,
    loc: &SourceLocation,
) -> Property<'a> {
    let function = slot_function(ctx, params, children, loc);
    Property {
        key: ExpressionNode::Simple(Box::new_in(
            SimpleExpressionNode::new(name, true, loc.clone()),
            ctx.allocator,
        )),
        value: function,
        loc: loc.clone(),
    }
}

fn slot_function<'a>(
    ctx: &mut TransformContext<'a>,
    params: Option<String>,
    children: Vec<'a, TemplateChildNode<'a>>,
    loc: &SourceLocation,
) -> JsChildNode<'a> {
    let mut param_list = Vec::new_in(ctx.allocator);
    if let Some(p) = params {
        param_list.push(p);
    }
    let function = FunctionExpression {
        params: param_list,
        returns: Some(FunctionReturns::Multiple(children)),
        newline: false,
        is_slot: true,
        loc: loc.clone(),
    };
    JsChildNode::Function(Box::new_in(function, ctx.allocator))
}

/// Lower a `<slot>` outlet into a `renderSlot` call.
pub fn build_slot_outlet<'a>(ctx: &mut TransformContext<'a>, el: &mut ElementNode<'a>) {
    ctx.helper(RuntimeHelper::RenderSlot);

    let loc = el.loc.clone();
    let mut call =
        CallExpression::new(ctx.allocator, Callee::Symbol(RuntimeHelper::RenderSlot), loc);

    // $slots access is scope-resolved at codegen time
    let slots = SimpleExpressionNode::new("$slots", false, SourceLocation::STUB);
    call.arguments
        .push(CallArgument::Expression(ExpressionNode::Simple(
            Box::new_in(slots, ctx.allocator),
        )));

    // Slot name: static attribute, :name binding, or "default"
    let mut name_arg: Option<CallArgument<'a>> = None;
    let mut prop_properties: std::vec::Vec<Property<'a>> = std::vec::Vec::new();

    let props = core::mem::replace(&mut el.props, Vec::new_in(ctx.allocator));
    for prop in props {
        match prop {
            PropNode::Attribute(attr) => {
                if attr.name == "name" {
                    let name = attr
                        .value
                        .as_ref()
                        .map(|v| v.content.clone())
                        .unwrap_or_default();
                    name_arg = Some(CallArgument::String(format!("\"{}\"", name).into()));
                } else {
                    let loc = attr.loc.clone();
                    let value = attr
                        .value
                        .as_ref()
                        .map(|v| v.content.clone())
                        .unwrap_or_default();
                    let value_expr = SimpleExpressionNode::new(value, true, loc.clone());
                    prop_properties.push(
                        crate::transforms::transform_element::static_key_property(
                            ctx,
                            attr.name.clone(),
                            JsChildNode::Simple(Box::new_in(value_expr, ctx.allocator)),
                            loc,
                        ),
                    );
                }
            }
            PropNode::Directive(mut dir) => match dir.name.as_str() {
                "bind" => {
                    if dir.static_arg() == Some("name") {
                        if let Some(exp) = dir.exp.take() {
                            name_arg = Some(CallArgument::Expression(exp));
                        }
                    } else if let (Some(arg), Some(exp)) =
                        (dir.static_arg().map(String::from), dir.exp.take())
                    {
                        let arg: String = arg;
                        prop_properties.push(
                            crate::transforms::transform_element::static_key_property(
                                ctx,
                                arg,
                                expression_to_js(exp),
                                dir.loc.clone(),
                            ),
                        );
                    }
                }
                // Listeners pass through as slot props
                "on" => {
                    if let (Some(arg), Some(exp)) =
                        (dir.static_arg().map(String::from), dir.exp.take())
                    {
                        let key = lueur_socle::to_handler_key(&arg);
                        prop_properties.push(
                            crate::transforms::transform_element::static_key_property(
                                ctx,
                                key,
                                expression_to_js(exp),
                                dir.loc.clone(),
                            ),
                        );
                    }
                }
                _ => {
                    ctx.error(
                        ErrorCode::VSlotUnexpectedDirectiveOnSlotOutlet,
                        Some(dir.loc.clone()),
                    );
                }
            },
        }
    }

    call.arguments
        .push(name_arg.unwrap_or(CallArgument::String("\"default\"".into())));

    let has_fallback = !el.children.is_empty();
    if !prop_properties.is_empty() || has_fallback {
        let mut object = ObjectExpression::new(ctx.allocator, SourceLocation::STUB);
        object.properties.extend(prop_properties);
        call.arguments
            .push(CallArgument::JsChild(JsChildNode::Object(Box::new_in(
                object,
                ctx.allocator,
            ))));
    }

    if has_fallback {
        let children = core::mem::replace(&mut el.children, Vec::new_in(ctx.allocator));
        let function = FunctionExpression {
            params: Vec::new_in(ctx.allocator),
            returns: Some(FunctionReturns::Multiple(children)),
            newline: false,
            is_slot: false,
            loc: SourceLocation::STUB,
        };
        call.arguments
            .push(CallArgument::JsChild(JsChildNode::Function(Box::new_in(
                function,
                ctx.allocator,
            ))));
    }

    el.codegen_node = Some(ElementCodegenNode::Call(Box::new_in(call, ctx.allocator)));
}
