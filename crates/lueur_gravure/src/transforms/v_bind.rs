//! v-bind lowering.
//!
//! `:name="expr"` becomes a props-object entry; the bare object form
//! `v-bind="obj"` becomes a spread source for `mergeProps`. Dynamic
//! arguments force the FULL_PROPS diff path.

use lueur_esquisse::ast::*;
use lueur_esquisse::errors::ErrorCode;
use lueur_socle::{camelize, Box, PatchFlags};

use crate::transform::TransformContext;
use crate::transforms::transform_element::{expression_to_js, PropsAccumulator};

pub fn transform_bind<'a>(
    ctx: &mut TransformContext<'a>,
    mut dir: Box<'a, DirectiveNode<'a>>,
    acc: &mut PropsAccumulator<'a>,
) {
    let Some(exp) = dir.exp.take() else {
        ctx.error(ErrorCode::VBindNoExpression, Some(dir.loc.clone()));
        return;
    };

    let Some(arg) = dir.arg.take() else {
        // v-bind="obj" object spread
        acc.push_spread(exp);
        return;
    };

    match arg {
        ExpressionNode::Simple(arg_expr) if arg_expr.is_static => {
            let mut name = arg_expr.content.clone();
            if dir.has_modifier("camel") {
                name = camelize(&name);
            }

            match name.as_str() {
                "class" => acc.flags |= PatchFlags::CLASS,
                "style" => acc.flags |= PatchFlags::STYLE,
                // key is vnode identity, ref only needs a patch pass
                "key" => {}
                "ref" => acc.flags |= PatchFlags::NEED_PATCH,
                _ => {
                    acc.flags |= PatchFlags::PROPS;
                    acc.dynamic_names.push(name.clone());
                }
            }

            let key_expr = SimpleExpressionNode::new(name, true, arg_expr.loc.clone());
            acc.push_property(Property {
                key: ExpressionNode::Simple(Box::new_in(key_expr, ctx.allocator)),
                value: expression_to_js(exp),
                loc: dir.loc.clone(),
            });
        }
        dynamic_arg => {
            // :[name]="expr" - the key itself changes
            acc.has_dynamic_keys = true;
            acc.push_property(Property {
                key: dynamic_arg,
                value: expression_to_js(exp),
                loc: dir.loc.clone(),
            });
        }
    }
}
