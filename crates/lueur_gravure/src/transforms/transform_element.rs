//! Element lowering.
//!
//! Builds a `VNodeCall` for each element: resolves the tag (host tag,
//! component, dynamic component), analyses props into a props expression
//! plus a patch-flag bitmask and a dynamic-props list, classifies children,
//! and attaches runtime directive arguments for `withDirectives`.

use lueur_esquisse::ast::*;
use lueur_esquisse::errors::ErrorCode;
use lueur_socle::{Box, PatchFlags, String, Vec};

use crate::transform::{remove_directive, TransformContext};
use crate::transforms::{transform_slot, v_bind, v_model, v_on};

/// One argument of an eventual `mergeProps` call, in source order.
pub(crate) enum MergeArg<'a> {
    Object(std::vec::Vec<Property<'a>>),
    Spread(ExpressionNode<'a>),
    /// v-on="obj" spread, wrapped in `toHandlers`
    Handlers(ExpressionNode<'a>),
}

/// Accumulates the results of per-prop transforms.
pub(crate) struct PropsAccumulator<'a> {
    pub merge_args: std::vec::Vec<MergeArg<'a>>,
    pub flags: PatchFlags,
    pub dynamic_names: std::vec::Vec<String>,
    pub runtime_dirs: std::vec::Vec<DirectiveArgumentNode<'a>>,
    pub has_dynamic_keys: bool,
    pub has_events: bool,
}

impl<'a> PropsAccumulator<'a> {
    fn new() -> Self {
        Self {
            merge_args: std::vec::Vec::new(),
            flags: PatchFlags::empty(),
            dynamic_names: std::vec::Vec::new(),
            runtime_dirs: std::vec::Vec::new(),
            has_dynamic_keys: false,
            has_events: false,
        }
    }

    pub(crate) fn push_property(&mut self, property: Property<'a>) {
        match self.merge_args.last_mut() {
            Some(MergeArg::Object(props)) => props.push(property),
            _ => self.merge_args.push(MergeArg::Object(vec![property])),
        }
    }

    pub(crate) fn push_spread(&mut self, exp: ExpressionNode<'a>) {
        self.has_dynamic_keys = true;
        self.merge_args.push(MergeArg::Spread(exp));
    }

    pub(crate) fn push_handlers(&mut self, exp: ExpressionNode<'a>) {
        self.has_dynamic_keys = true;
        self.merge_args.push(MergeArg::Handlers(exp));
    }
}

/// Build a static-key property.
pub(crate) fn static_key_property<'a>(
    ctx: &TransformContext<'a>,
    key: impl Into<String>,
    value: JsChildNode<'a>,
    loc: SourceLocation,
) -> Property<'a> {
    let key_expr = SimpleExpressionNode::new(key, true, loc.clone());
    Property {
        key: ExpressionNode::Simple(Box::new_in(key_expr, ctx.allocator)),
        value,
        loc,
    }
}

/// Lower an element into its codegen node.
pub fn build_element<'a>(ctx: &mut TransformContext<'a>, el: &mut ElementNode<'a>) {
    let loc = el.loc.clone();
    let is_component = el.tag_type == ElementType::Component;

    let v_once = remove_directive(el, "once").is_some();

    // v-slot on the component itself defines the default slot
    let self_slot_dir = if is_component {
        remove_directive(el, "slot")
    } else {
        None
    };

    let tag = resolve_tag(ctx, el, is_component);
    let mut acc = build_props(ctx, el, is_component);

    let mut patch_flags = acc.flags;
    let children = build_children(ctx, el, is_component, self_slot_dir, &mut patch_flags);

    if !acc.runtime_dirs.is_empty() {
        patch_flags |= PatchFlags::NEED_PATCH;
    }

    // Dynamic keys force a full diff; facet flags no longer apply
    if acc.has_dynamic_keys {
        patch_flags.remove(PatchFlags::CLASS | PatchFlags::STYLE | PatchFlags::PROPS);
        patch_flags |= PatchFlags::FULL_PROPS;
        if acc.has_events {
            patch_flags |= PatchFlags::NEED_HYDRATION;
        }
        acc.dynamic_names.clear();
    }

    let props = assemble_props(ctx, acc.merge_args, &loc);

    let dynamic_props = if patch_flags.contains(PatchFlags::PROPS) && !acc.dynamic_names.is_empty()
    {
        let mut names = Vec::new_in(ctx.allocator);
        names.extend(acc.dynamic_names);
        Some(DynamicProps(names))
    } else {
        None
    };

    let directives = if acc.runtime_dirs.is_empty() {
        None
    } else {
        ctx.helper(RuntimeHelper::WithDirectives);
        let mut elements = Vec::new_in(ctx.allocator);
        elements.extend(acc.runtime_dirs);
        Some(DirectiveArguments {
            elements,
            loc: loc.clone(),
        })
    };

    let vnode = VNodeCall {
        tag,
        props,
        children,
        patch_flag: if patch_flags.is_empty() {
            None
        } else {
            Some(patch_flags)
        },
        dynamic_props,
        directives,
        is_block: false,
        disable_tracking: false,
        is_component,
        loc: loc.clone(),
    };
    let vnode = Box::new_in(vnode, ctx.allocator);

    el.codegen_node = Some(if v_once {
        ctx.helper(RuntimeHelper::SetBlockTracking);
        let cache = CacheExpression {
            index: ctx.next_cache_index(),
            value: JsChildNode::VNodeCall(vnode),
            need_pause_tracking: true,
            in_v_once: true,
            loc,
        };
        ElementCodegenNode::Cache(Box::new_in(cache, ctx.allocator))
    } else {
        ElementCodegenNode::VNodeCall(vnode)
    });
}

/// Resolve the vnode tag expression for an element.
fn resolve_tag<'a>(
    ctx: &mut TransformContext<'a>,
    el: &mut ElementNode<'a>,
    is_component: bool,
) -> VNodeTag<'a> {
    if !is_component {
        return VNodeTag::String(el.tag.clone());
    }

    match el.tag.as_str() {
        "KeepAlive" => return VNodeTag::Symbol(ctx.helper(RuntimeHelper::KeepAlive)),
        "Teleport" => return VNodeTag::Symbol(ctx.helper(RuntimeHelper::Teleport)),
        "Suspense" => return VNodeTag::Symbol(ctx.helper(RuntimeHelper::Suspense)),
        _ => {}
    }

    // <component :is="..."> resolves at runtime
    if el.tag == "component" {
        let is_index = el.props.iter().position(|p| match p {
            PropNode::Attribute(a) => a.name == "is",
            PropNode::Directive(d) => d.name == "bind" && d.static_arg() == Some("is"),
        });
        if let Some(index) = is_index {
            ctx.helper(RuntimeHelper::ResolveDynamicComponent);
            let mut call = CallExpression::new(
                ctx.allocator,
                Callee::Symbol(RuntimeHelper::ResolveDynamicComponent),
                el.loc.clone(),
            );
            match el.props.remove(index) {
                PropNode::Attribute(attr) => {
                    let name = attr
                        .value
                        .as_ref()
                        .map(|v| v.content.clone())
                        .unwrap_or_default();
                    call.arguments
                        .push(CallArgument::String(format!("\"{}\"", name).into()));
                }
                PropNode::Directive(mut dir) => {
                    if let Some(exp) = dir.exp.take() {
                        call.arguments.push(CallArgument::Expression(exp));
                    }
                }
            }
            return VNodeTag::Call(Box::new_in(call, ctx.allocator));
        }
    }

    ctx.helper(RuntimeHelper::ResolveComponent);
    ctx.components.insert(el.tag.clone());
    VNodeTag::String(el.tag.clone())
}

/// Analyse props into merge args, flags and runtime directives.
fn build_props<'a>(
    ctx: &mut TransformContext<'a>,
    el: &mut ElementNode<'a>,
    is_component: bool,
) -> PropsAccumulator<'a> {
    let mut acc = PropsAccumulator::new();
    let tag = el.tag.clone();
    let props = core::mem::replace(&mut el.props, Vec::new_in(ctx.allocator));

    for prop in props {
        match prop {
            PropNode::Attribute(attr) => {
                if attr.name == "ref" {
                    acc.flags |= PatchFlags::NEED_PATCH;
                }
                let loc = attr.loc.clone();
                let value = attr
                    .value
                    .as_ref()
                    .map(|v| v.content.clone())
                    .unwrap_or_default();
                let value_loc = attr
                    .value
                    .as_ref()
                    .map(|v| v.loc.clone())
                    .unwrap_or_else(|| loc.clone());
                let value_expr = SimpleExpressionNode::new(value, true, value_loc);
                let value = JsChildNode::Simple(Box::new_in(value_expr, ctx.allocator));
                let property = static_key_property(ctx, attr.name.clone(), value, loc);
                acc.push_property(property);
            }
            PropNode::Directive(dir) => {
                let name = dir.name.clone();
                match name.as_str() {
                "bind" => v_bind::transform_bind(ctx, dir, &mut acc),
                "on" => v_on::transform_on(ctx, dir, &mut acc, is_component),
                "model" => v_model::transform_model(ctx, dir, &mut acc, tag.as_str(), is_component),
                "show" => {
                    let mut dir = dir;
                    match dir.exp.take() {
                        Some(exp) => {
                            ctx.helper(RuntimeHelper::VShow);
                            acc.runtime_dirs.push(DirectiveArgumentNode {
                                directive: DirectiveArgumentTarget::Helper(RuntimeHelper::VShow),
                                exp: Some(exp),
                                arg: None,
                                modifiers: Vec::new_in(ctx.allocator),
                            });
                        }
                        None => ctx.error(ErrorCode::InvalidExpression, Some(dir.loc.clone())),
                    }
                }
                "html" | "text" => {
                    let mut dir = dir;
                    let key = if dir.name == "html" {
                        "innerHTML"
                    } else {
                        "textContent"
                    };
                    match dir.exp.take() {
                        Some(exp) => {
                            acc.flags |= PatchFlags::PROPS;
                            acc.dynamic_names.push(key.into());
                            let value = expression_to_js(exp);
                            let property =
                                static_key_property(ctx, key, value, dir.loc.clone());
                            acc.push_property(property);
                        }
                        None => ctx.error(ErrorCode::InvalidExpression, Some(dir.loc.clone())),
                    }
                }
                "cloak" => {}
                // Structural directives are consumed before element lowering
                "if" | "else-if" | "else" | "for" | "slot" | "pre" | "once" | "memo" => {}
                _ => {
                    // Custom directive, resolved by name at runtime
                    let mut dir = dir;
                    ctx.helper(RuntimeHelper::ResolveDirective);
                    ctx.directives.insert(name.clone());
                    let mut modifiers = Vec::new_in(ctx.allocator);
                    for m in dir.modifiers.iter() {
                        modifiers.push(m.content.clone());
                    }
                    acc.runtime_dirs.push(DirectiveArgumentNode {
                        directive: DirectiveArgumentTarget::Name(name.clone()),
                        exp: dir.exp.take(),
                        arg: dir.arg.take(),
                        modifiers,
                    });
                }
                }
            }
        }
    }

    merge_class_style(ctx, &mut acc);
    acc
}

/// Merge duplicate class/style entries (static attribute + dynamic binding)
/// into a single normalized property.
fn merge_class_style<'a>(ctx: &mut TransformContext<'a>, acc: &mut PropsAccumulator<'a>) {
    for key in ["class", "style"] {
        let helper = if key == "class" {
            RuntimeHelper::NormalizeClass
        } else {
            RuntimeHelper::NormalizeStyle
        };
        let Some(MergeArg::Object(props)) = acc.merge_args.first_mut() else {
            continue;
        };
        let matching: std::vec::Vec<usize> = props
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match &p.key {
                ExpressionNode::Simple(k) if k.is_static && k.content == key => Some(i),
                _ => None,
            })
            .collect();
        if matching.len() < 2 {
            continue;
        }

        ctx.helper(helper);
        let mut array = ArrayExpression::new(ctx.allocator, SourceLocation::STUB);
        // Remove back-to-front so indices stay valid, then restore order
        let mut removed = std::vec::Vec::new();
        for &i in matching.iter().rev() {
            removed.push(props.remove(i));
        }
        removed.reverse();
        let loc = removed[0].loc.clone();
        for p in removed {
            array.elements.push(ArrayElement::Node(p.value));
        }

        let mut call = CallExpression::new(ctx.allocator, Callee::Symbol(helper), loc.clone());
        call.arguments.push(CallArgument::JsChild(JsChildNode::Array(
            Box::new_in(array, ctx.allocator),
        )));
        let value = JsChildNode::Call(Box::new_in(call, ctx.allocator));
        let property = static_key_property(ctx, key, value, loc);
        props.insert(matching[0], property);
    }
}

/// Assemble the final props expression from merge args.
fn assemble_props<'a>(
    ctx: &mut TransformContext<'a>,
    merge_args: std::vec::Vec<MergeArg<'a>>,
    loc: &SourceLocation,
) -> Option<PropsExpression<'a>> {
    let arg_to_js = |ctx: &mut TransformContext<'a>, arg: MergeArg<'a>| -> JsChildNode<'a> {
        match arg {
            MergeArg::Object(props) => {
                let mut object = ObjectExpression::new(ctx.allocator, loc.clone());
                object.properties.extend(props);
                JsChildNode::Object(Box::new_in(object, ctx.allocator))
            }
            MergeArg::Spread(exp) => expression_to_js(exp),
            MergeArg::Handlers(exp) => {
                ctx.helper(RuntimeHelper::ToHandlers);
                let mut call = CallExpression::new(
                    ctx.allocator,
                    Callee::Symbol(RuntimeHelper::ToHandlers),
                    loc.clone(),
                );
                call.arguments.push(CallArgument::Expression(exp));
                JsChildNode::Call(Box::new_in(call, ctx.allocator))
            }
        }
    };

    match merge_args.len() {
        0 => None,
        1 => {
            let arg = merge_args.into_iter().next().unwrap();
            match arg_to_js(ctx, arg) {
                JsChildNode::Object(obj) => {
                    if obj.properties.is_empty() {
                        None
                    } else {
                        Some(PropsExpression::Object(obj))
                    }
                }
                JsChildNode::Call(call) => Some(PropsExpression::Call(call)),
                JsChildNode::Simple(simple) => Some(PropsExpression::Simple(simple)),
                other => {
                    // Compound spread sources print as-is inside mergeProps
                    ctx.helper(RuntimeHelper::MergeProps);
                    let mut call = CallExpression::new(
                        ctx.allocator,
                        Callee::Symbol(RuntimeHelper::MergeProps),
                        loc.clone(),
                    );
                    call.arguments.push(CallArgument::JsChild(other));
                    Some(PropsExpression::Call(Box::new_in(call, ctx.allocator)))
                }
            }
        }
        _ => {
            ctx.helper(RuntimeHelper::MergeProps);
            let mut call = CallExpression::new(
                ctx.allocator,
                Callee::Symbol(RuntimeHelper::MergeProps),
                loc.clone(),
            );
            for arg in merge_args {
                let js = arg_to_js(ctx, arg);
                call.arguments.push(CallArgument::JsChild(js));
            }
            Some(PropsExpression::Call(Box::new_in(call, ctx.allocator)))
        }
    }
}

/// Convert an expression node to a render-program child.
pub(crate) fn expression_to_js(exp: ExpressionNode<'_>) -> JsChildNode<'_> {
    match exp {
        ExpressionNode::Simple(s) => JsChildNode::Simple(s),
        ExpressionNode::Compound(c) => JsChildNode::Compound(c),
    }
}

/// Classify children into the vnode children shape.
fn build_children<'a>(
    ctx: &mut TransformContext<'a>,
    el: &mut ElementNode<'a>,
    is_component: bool,
    self_slot_dir: Option<Box<'a, DirectiveNode<'a>>>,
    patch_flags: &mut PatchFlags,
) -> Option<VNodeChildren<'a>> {
    if is_component {
        if el.children.is_empty() && self_slot_dir.is_none() {
            return None;
        }
        let children = core::mem::replace(&mut el.children, Vec::new_in(ctx.allocator));
        let (slots, dynamic) =
            transform_slot::build_slots(ctx, children, self_slot_dir, el.loc.clone());
        if dynamic {
            *patch_flags |= PatchFlags::DYNAMIC_SLOTS;
        }
        return Some(VNodeChildren::Slots(slots));
    }

    match el.children.len() {
        0 => None,
        1 => {
            let child = el.children.pop().unwrap();
            match child {
                TemplateChildNode::Text(t) => Some(VNodeChildren::Single(
                    TemplateTextChildNode::Text(t),
                )),
                TemplateChildNode::Interpolation(i) => {
                    *patch_flags |= PatchFlags::TEXT;
                    ctx.helper(RuntimeHelper::ToDisplayString);
                    Some(VNodeChildren::Single(TemplateTextChildNode::Interpolation(i)))
                }
                TemplateChildNode::CompoundExpression(c) => {
                    *patch_flags |= PatchFlags::TEXT;
                    ctx.helper(RuntimeHelper::ToDisplayString);
                    Some(VNodeChildren::Single(TemplateTextChildNode::Compound(c)))
                }
                other => {
                    let mut children = Vec::new_in(ctx.allocator);
                    children.push(other);
                    Some(VNodeChildren::Multiple(children))
                }
            }
        }
        _ => {
            let children = core::mem::replace(&mut el.children, Vec::new_in(ctx.allocator));
            Some(VNodeChildren::Multiple(children))
        }
    }
}
