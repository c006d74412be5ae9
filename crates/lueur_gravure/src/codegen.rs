//! Render-function code generation.
//!
//! A pretty-printer over the render-program AST attached by the transform
//! pipeline. Module mode emits an ES module with helper imports and `_ctx.`
//! prefixed identifier access; function mode emits a plain function
//! destructuring helpers from a runtime global, with a `with (_ctx)` body.

use lueur_esquisse::ast::*;
use lueur_esquisse::options::{CodegenMode, CodegenOptions};
use lueur_socle::{escape_code_string, is_valid_identifier, FxHashSet};

/// Code generation result
pub struct CodegenResult {
    /// Generated render function
    pub code: String,
    /// Imports / helper destructuring plus hoist declarations
    pub preamble: String,
    /// Source map (not emitted)
    pub map: Option<String>,
}

/// Code generation context using a byte buffer
pub struct CodegenContext {
    code: Vec<u8>,
    indent_level: u32,
    options: CodegenOptions,
    /// Whether identifier expressions get `_ctx.` access
    prefix_identifiers: bool,
    /// Helpers referenced while printing
    used_helpers: FxHashSet<RuntimeHelper>,
    /// Identifiers bound by enclosing slot/iterator parameters
    scope_ids: FxHashSet<String>,
}

impl CodegenContext {
    fn new(options: CodegenOptions) -> Self {
        let prefix_identifiers =
            options.prefix_identifiers || options.mode == CodegenMode::Module;
        Self {
            code: Vec::with_capacity(4096),
            indent_level: 0,
            options,
            prefix_identifiers,
            used_helpers: FxHashSet::default(),
            scope_ids: FxHashSet::default(),
        }
    }

    #[inline]
    fn push(&mut self, code: &str) {
        self.code.extend_from_slice(code.as_bytes());
    }

    #[inline]
    fn newline(&mut self) {
        self.code.push(b'\n');
        for _ in 0..self.indent_level {
            self.code.extend_from_slice(b"  ");
        }
    }

    #[inline]
    fn indent(&mut self) {
        self.indent_level += 1;
    }

    #[inline]
    fn deindent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    /// Helper alias used in generated code
    fn helper(&mut self, helper: RuntimeHelper) -> String {
        self.used_helpers.insert(helper);
        format!("_{}", helper.name())
    }

    fn push_helper(&mut self, helper: RuntimeHelper) {
        let name = self.helper(helper);
        self.push(&name);
    }

    fn take_code(&mut self) -> String {
        let bytes = core::mem::take(&mut self.code);
        // Only valid UTF-8 is ever pushed
        unsafe { String::from_utf8_unchecked(bytes) }
    }
}

fn asset_var(prefix: &str, name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}", prefix, sanitized)
}

fn is_ignorable_root_text(child: &TemplateChildNode<'_>) -> bool {
    matches!(child, TemplateChildNode::Text(text) if text.content.chars().all(|c| c.is_whitespace()))
}

/// Generate the render function for a transformed root.
pub fn generate(root: &RootNode<'_>, options: CodegenOptions) -> CodegenResult {
    let mut ctx = CodegenContext::new(options);
    let root_children: Vec<&TemplateChildNode<'_>> = root
        .children
        .iter()
        .filter(|child| !is_ignorable_root_text(child))
        .collect();

    // Signature
    match ctx.options.mode {
        CodegenMode::Module => {
            ctx.push("export function render(_ctx, _cache, $props, $setup, $data, $options) {");
        }
        CodegenMode::Function => {
            ctx.push("function render(_ctx, _cache, $props, $setup, $data, $options) {");
        }
    }
    ctx.indent();
    ctx.newline();

    let with_block = ctx.options.mode == CodegenMode::Function && !ctx.prefix_identifiers;
    if with_block {
        ctx.push("with (_ctx) {");
        ctx.indent();
        ctx.newline();
    }

    // Component / directive resolution
    for component in root.components.iter() {
        let helper = ctx.helper(RuntimeHelper::ResolveComponent);
        ctx.push("const ");
        ctx.push(&asset_var("_component_", component));
        ctx.push(" = ");
        ctx.push(&helper);
        ctx.push("(\"");
        ctx.push(component);
        ctx.push("\")");
        ctx.newline();
    }
    for directive in root.directives.iter() {
        let helper = ctx.helper(RuntimeHelper::ResolveDirective);
        ctx.push("const ");
        ctx.push(&asset_var("_directive_", directive));
        ctx.push(" = ");
        ctx.push(&helper);
        ctx.push("(\"");
        ctx.push(directive);
        ctx.push("\")");
        ctx.newline();
    }

    ctx.push("return ");

    if root_children.is_empty() {
        ctx.push("null");
    } else if root_children.len() == 1 {
        generate_root_node(&mut ctx, root_children[0]);
    } else {
        // Multiple root children: synthesized stable fragment block
        ctx.push("(");
        ctx.push_helper(RuntimeHelper::OpenBlock);
        ctx.push("(), ");
        ctx.push_helper(RuntimeHelper::CreateElementBlock);
        ctx.push("(");
        ctx.push_helper(RuntimeHelper::Fragment);
        ctx.push(", null, [");
        ctx.indent();
        for (i, child) in root_children.iter().enumerate() {
            if i > 0 {
                ctx.push(",");
            }
            ctx.newline();
            generate_node(&mut ctx, child);
        }
        ctx.deindent();
        ctx.newline();
        ctx.push("], 64 /* STABLE_FRAGMENT */))");
    }

    if with_block {
        ctx.deindent();
        ctx.newline();
        ctx.push("}");
    }
    ctx.deindent();
    ctx.newline();
    ctx.push("}");
    let code = ctx.take_code();

    // Hoist declarations, generated after the body so they share the
    // used-helper set feeding the preamble
    for (i, hoist) in root.hoists.iter().enumerate() {
        ctx.push("const _hoisted_");
        ctx.push(&(i + 1).to_string());
        ctx.push(" = /*#__PURE__*/ ");
        generate_js_child(&mut ctx, hoist);
        ctx.newline();
    }
    let hoists_code = ctx.take_code();

    // Preamble from every helper the transform or the printer touched
    let mut all_helpers: Vec<RuntimeHelper> = ctx.used_helpers.iter().copied().collect();
    for h in root.helpers.iter() {
        if !all_helpers.contains(h) {
            all_helpers.push(*h);
        }
    }
    all_helpers.sort();

    let mut preamble = String::new();
    if !all_helpers.is_empty() {
        match ctx.options.mode {
            CodegenMode::Module => {
                preamble.push_str("import { ");
                for (i, h) in all_helpers.iter().enumerate() {
                    if i > 0 {
                        preamble.push_str(", ");
                    }
                    preamble.push_str(h.name());
                    preamble.push_str(" as _");
                    preamble.push_str(h.name());
                }
                preamble.push_str(" } from \"");
                preamble.push_str(&ctx.options.runtime_module_name);
                preamble.push_str("\"\n");
            }
            CodegenMode::Function => {
                preamble.push_str("const { ");
                for (i, h) in all_helpers.iter().enumerate() {
                    if i > 0 {
                        preamble.push_str(", ");
                    }
                    preamble.push_str(h.name());
                    preamble.push_str(": _");
                    preamble.push_str(h.name());
                }
                preamble.push_str(" } = ");
                preamble.push_str(&ctx.options.runtime_global_name);
                preamble.push('\n');
            }
        }
    }
    if !hoists_code.is_empty() {
        preamble.push('\n');
        preamble.push_str(&hoists_code);
    }

    CodegenResult {
        code,
        preamble,
        map: None,
    }
}

/// Generate the single root node in block form.
fn generate_root_node(ctx: &mut CodegenContext, node: &TemplateChildNode<'_>) {
    match node {
        TemplateChildNode::Element(el) => match &el.codegen_node {
            Some(ElementCodegenNode::VNodeCall(vnode)) => {
                generate_vnode_call(ctx, vnode, true);
            }
            Some(ElementCodegenNode::Call(call)) => generate_call(ctx, call),
            Some(ElementCodegenNode::Cache(cache)) => generate_cache(ctx, cache),
            None => ctx.push("null"),
        },
        TemplateChildNode::If(if_node) => generate_if(ctx, if_node),
        TemplateChildNode::For(for_node) => generate_for(ctx, for_node),
        other => generate_node(ctx, other),
    }
}

/// Generate any template child in expression position.
fn generate_node(ctx: &mut CodegenContext, node: &TemplateChildNode<'_>) {
    match node {
        TemplateChildNode::Element(el) => match &el.codegen_node {
            Some(ElementCodegenNode::VNodeCall(vnode)) => {
                generate_vnode_call(ctx, vnode, vnode.is_block)
            }
            Some(ElementCodegenNode::Call(call)) => generate_call(ctx, call),
            Some(ElementCodegenNode::Cache(cache)) => generate_cache(ctx, cache),
            None => ctx.push("null"),
        },
        TemplateChildNode::Text(text) => {
            ctx.push_helper(RuntimeHelper::CreateText);
            ctx.push("(\"");
            ctx.push(&escape_code_string(&text.content));
            ctx.push("\")");
        }
        TemplateChildNode::TextCall(text_call) => {
            ctx.push_helper(RuntimeHelper::CreateText);
            ctx.push("(");
            match &text_call.content {
                TextCallContent::Text(t) => {
                    ctx.push("\"");
                    ctx.push(&escape_code_string(&t.content));
                    ctx.push("\"");
                }
                TextCallContent::Interpolation(i) => generate_interpolation(ctx, i),
                TextCallContent::Compound(c) => generate_compound(ctx, c),
            }
            if text_call.is_dynamic() {
                ctx.push(", 1 /* TEXT */");
            }
            ctx.push(")");
        }
        TemplateChildNode::Interpolation(interp) => generate_interpolation(ctx, interp),
        TemplateChildNode::CompoundExpression(compound) => generate_compound(ctx, compound),
        TemplateChildNode::Comment(comment) => {
            ctx.push_helper(RuntimeHelper::CreateComment);
            ctx.push("(\"");
            ctx.push(&escape_code_string(&comment.content));
            ctx.push("\")");
        }
        TemplateChildNode::If(if_node) => generate_if(ctx, if_node),
        TemplateChildNode::For(for_node) => generate_for(ctx, for_node),
        TemplateChildNode::IfBranch(_) => ctx.push("null"),
        TemplateChildNode::Hoisted(index) => {
            ctx.push("_hoisted_");
            ctx.push(&(index + 1).to_string());
        }
    }
}

fn generate_if(ctx: &mut CodegenContext, if_node: &IfNode<'_>) {
    match &if_node.codegen_node {
        Some(IfCodegenNode(conditional)) => generate_conditional(ctx, conditional),
        None => ctx.push("null"),
    }
}

fn generate_for(ctx: &mut CodegenContext, for_node: &ForNode<'_>) {
    match &for_node.codegen_node {
        Some(vnode) => generate_vnode_call(ctx, vnode, true),
        None => ctx.push("null"),
    }
}

/// Generate a vnode construction call, optionally in block form.
fn generate_vnode_call(ctx: &mut CodegenContext, vnode: &VNodeCall<'_>, as_block: bool) {
    if vnode.directives.is_some() {
        ctx.push_helper(RuntimeHelper::WithDirectives);
        ctx.push("(");
    }

    if as_block {
        ctx.push("(");
        ctx.push_helper(RuntimeHelper::OpenBlock);
        ctx.push("(");
        if vnode.disable_tracking {
            ctx.push("true");
        }
        ctx.push("), ");
        if vnode.is_component {
            ctx.push_helper(RuntimeHelper::CreateBlock);
        } else {
            ctx.push_helper(RuntimeHelper::CreateElementBlock);
        }
    } else if vnode.is_component {
        ctx.push_helper(RuntimeHelper::CreateVNode);
    } else {
        ctx.push_helper(RuntimeHelper::CreateElementVNode);
    }
    ctx.push("(");

    // Tag
    match &vnode.tag {
        VNodeTag::String(tag) => {
            if vnode.is_component {
                ctx.push(&asset_var("_component_", tag));
            } else {
                ctx.push("\"");
                ctx.push(tag);
                ctx.push("\"");
            }
        }
        VNodeTag::Symbol(helper) => ctx.push_helper(*helper),
        VNodeTag::Call(call) => generate_call(ctx, call),
    }

    // Trailing null trimming: emit only up to the last present argument
    let has_dynamic_props = vnode.dynamic_props.is_some();
    let has_patch_flag = vnode.patch_flag.is_some() || has_dynamic_props;
    let has_children = vnode.children.is_some() || has_patch_flag;
    let has_props = vnode.props.is_some() || has_children;

    if has_props {
        ctx.push(", ");
        match &vnode.props {
            Some(props) => generate_props_expression(ctx, props),
            None => ctx.push("null"),
        }
    }
    if has_children {
        ctx.push(", ");
        match &vnode.children {
            Some(children) => generate_vnode_children(ctx, children),
            None => ctx.push("null"),
        }
    }
    if has_patch_flag {
        ctx.push(", ");
        match vnode.patch_flag {
            Some(flag) => {
                ctx.push(&flag.bits().to_string());
                let names = flag.flag_names();
                if !names.is_empty() {
                    ctx.push(" /* ");
                    ctx.push(&names.join(", "));
                    ctx.push(" */");
                }
            }
            None => ctx.push("-1"),
        }
    }
    if has_dynamic_props {
        ctx.push(", ");
        if let Some(DynamicProps(names)) = &vnode.dynamic_props {
            ctx.push("[");
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    ctx.push(", ");
                }
                ctx.push("\"");
                ctx.push(name);
                ctx.push("\"");
            }
            ctx.push("]");
        }
    }

    ctx.push(")");
    if as_block {
        ctx.push(")");
    }

    if let Some(directives) = &vnode.directives {
        ctx.push(", ");
        generate_directive_arguments(ctx, directives);
        ctx.push(")");
    }
}

fn generate_directive_arguments(ctx: &mut CodegenContext, directives: &DirectiveArguments<'_>) {
    ctx.push("[");
    for (i, dir) in directives.elements.iter().enumerate() {
        if i > 0 {
            ctx.push(", ");
        }
        ctx.push("[");
        match &dir.directive {
            DirectiveArgumentTarget::Helper(helper) => ctx.push_helper(*helper),
            DirectiveArgumentTarget::Name(name) => ctx.push(&asset_var("_directive_", name)),
        }
        if let Some(exp) = &dir.exp {
            ctx.push(", ");
            generate_expression_node(ctx, exp);
        }
        if let Some(arg) = &dir.arg {
            ctx.push(", ");
            match arg {
                ExpressionNode::Simple(s) if s.is_static => {
                    ctx.push("\"");
                    ctx.push(&escape_code_string(&s.content));
                    ctx.push("\"");
                }
                other => generate_expression_node(ctx, other),
            }
        }
        if !dir.modifiers.is_empty() {
            ctx.push(", { ");
            for (j, m) in dir.modifiers.iter().enumerate() {
                if j > 0 {
                    ctx.push(", ");
                }
                ctx.push(m);
                ctx.push(": true");
            }
            ctx.push(" }");
        }
        ctx.push("]");
    }
    ctx.push("]");
}

fn generate_props_expression(ctx: &mut CodegenContext, props: &PropsExpression<'_>) {
    match props {
        PropsExpression::Object(object) => generate_object(ctx, object),
        PropsExpression::Call(call) => generate_call(ctx, call),
        PropsExpression::Simple(simple) => generate_simple_expression(ctx, simple),
    }
}

fn generate_vnode_children(ctx: &mut CodegenContext, children: &VNodeChildren<'_>) {
    match children {
        VNodeChildren::Multiple(nodes) => {
            ctx.push("[");
            ctx.indent();
            for (i, node) in nodes.iter().enumerate() {
                if i > 0 {
                    ctx.push(",");
                }
                ctx.newline();
                generate_node(ctx, node);
            }
            ctx.deindent();
            ctx.newline();
            ctx.push("]");
        }
        VNodeChildren::Single(child) => match child {
            TemplateTextChildNode::Text(t) => {
                ctx.push("\"");
                ctx.push(&escape_code_string(&t.content));
                ctx.push("\"");
            }
            TemplateTextChildNode::Interpolation(i) => generate_interpolation(ctx, i),
            TemplateTextChildNode::Compound(c) => generate_compound(ctx, c),
        },
        VNodeChildren::Slots(object) => generate_object(ctx, object),
        VNodeChildren::ForRenderList(call) => generate_call(ctx, call),
    }
}

fn generate_js_child(ctx: &mut CodegenContext, node: &JsChildNode<'_>) {
    match node {
        JsChildNode::VNodeCall(vnode) => generate_vnode_call(ctx, vnode, vnode.is_block),
        JsChildNode::Call(call) => generate_call(ctx, call),
        JsChildNode::Object(object) => generate_object(ctx, object),
        JsChildNode::Array(array) => {
            ctx.push("[");
            for (i, element) in array.elements.iter().enumerate() {
                if i > 0 {
                    ctx.push(", ");
                }
                match element {
                    ArrayElement::String(s) => {
                        ctx.push("\"");
                        ctx.push(&escape_code_string(s));
                        ctx.push("\"");
                    }
                    ArrayElement::Node(n) => generate_js_child(ctx, n),
                }
            }
            ctx.push("]");
        }
        JsChildNode::Function(function) => generate_function(ctx, function),
        JsChildNode::Conditional(conditional) => generate_conditional(ctx, conditional),
        JsChildNode::Cache(cache) => generate_cache(ctx, cache),
        JsChildNode::Simple(simple) => generate_simple_expression(ctx, simple),
        JsChildNode::Compound(compound) => generate_compound(ctx, compound),
    }
}

fn generate_call(ctx: &mut CodegenContext, call: &CallExpression<'_>) {
    match &call.callee {
        Callee::Symbol(helper) => ctx.push_helper(*helper),
        Callee::String(name) => ctx.push(name),
    }
    ctx.push("(");
    for (i, arg) in call.arguments.iter().enumerate() {
        if i > 0 {
            ctx.push(", ");
        }
        match arg {
            CallArgument::String(s) => ctx.push(s),
            CallArgument::JsChild(node) => generate_js_child(ctx, node),
            CallArgument::Expression(exp) => generate_expression_node(ctx, exp),
        }
    }
    ctx.push(")");
}

fn generate_object(ctx: &mut CodegenContext, object: &ObjectExpression<'_>) {
    if object.properties.is_empty() {
        ctx.push("{}");
        return;
    }
    ctx.push("{ ");
    for (i, property) in object.properties.iter().enumerate() {
        if i > 0 {
            ctx.push(", ");
        }
        match &property.key {
            ExpressionNode::Simple(key) if key.is_static => {
                if is_valid_identifier(&key.content) {
                    ctx.push(&key.content);
                } else {
                    ctx.push("\"");
                    ctx.push(&escape_code_string(&key.content));
                    ctx.push("\"");
                }
            }
            ExpressionNode::Simple(key) if key.is_handler_key => {
                // Computed handler key: [toHandlerKey(name)]
                ctx.push("[");
                ctx.push_helper(RuntimeHelper::ToHandlerKey);
                ctx.push("(");
                generate_simple_expression(ctx, key);
                ctx.push(")]");
            }
            other => {
                ctx.push("[");
                generate_expression_node(ctx, other);
                ctx.push("]");
            }
        }
        ctx.push(": ");
        generate_js_child(ctx, &property.value);
    }
    ctx.push(" }");
}

fn generate_function(ctx: &mut CodegenContext, function: &FunctionExpression<'_>) {
    if function.is_slot {
        ctx.push_helper(RuntimeHelper::WithCtx);
        ctx.push("(");
    }

    // Parameters shadow _ctx access inside the body
    let mut inserted = Vec::new();
    for param in function.params.iter() {
        for ident in param.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$')) {
            if !ident.is_empty() && ctx.scope_ids.insert(ident.into()) {
                inserted.push(lueur_socle::String::from(ident));
            }
        }
    }

    ctx.push("(");
    for (i, param) in function.params.iter().enumerate() {
        if i > 0 {
            ctx.push(", ");
        }
        ctx.push(param);
    }
    ctx.push(") => ");

    match &function.returns {
        Some(FunctionReturns::JsChild(node)) => {
            ctx.push("(");
            generate_js_child(ctx, node);
            ctx.push(")");
        }
        Some(FunctionReturns::Multiple(nodes)) => {
            ctx.push("[");
            ctx.indent();
            for (i, node) in nodes.iter().enumerate() {
                if i > 0 {
                    ctx.push(",");
                }
                ctx.newline();
                generate_node(ctx, node);
            }
            ctx.deindent();
            ctx.newline();
            ctx.push("]");
        }
        None => ctx.push("undefined"),
    }

    for ident in inserted {
        ctx.scope_ids.remove(ident.as_str());
    }

    if function.is_slot {
        ctx.push(")");
    }
}

fn generate_conditional(ctx: &mut CodegenContext, conditional: &ConditionalExpression<'_>) {
    ctx.push("(");
    generate_js_child(ctx, &conditional.test);
    ctx.push(")");
    ctx.indent();
    ctx.newline();
    ctx.push("? ");
    generate_js_child(ctx, &conditional.consequent);
    ctx.newline();
    ctx.push(": ");
    generate_js_child(ctx, &conditional.alternate);
    ctx.deindent();
}

fn generate_cache(ctx: &mut CodegenContext, cache: &CacheExpression<'_>) {
    let index = cache.index.to_string();
    ctx.push("_cache[");
    ctx.push(&index);
    ctx.push("] || (");
    if cache.need_pause_tracking {
        ctx.indent();
        ctx.newline();
        ctx.push_helper(RuntimeHelper::SetBlockTracking);
        ctx.push("(-1),");
        ctx.newline();
        ctx.push("_cache[");
        ctx.push(&index);
        ctx.push("] = ");
        generate_js_child(ctx, &cache.value);
        ctx.push(",");
        ctx.newline();
        ctx.push_helper(RuntimeHelper::SetBlockTracking);
        ctx.push("(1),");
        ctx.newline();
        ctx.push("_cache[");
        ctx.push(&index);
        ctx.push("]");
        ctx.deindent();
        ctx.newline();
        ctx.push(")");
    } else {
        ctx.push("_cache[");
        ctx.push(&index);
        ctx.push("] = ");
        generate_js_child(ctx, &cache.value);
        ctx.push(")");
    }
}

fn generate_interpolation(ctx: &mut CodegenContext, interpolation: &InterpolationNode<'_>) {
    ctx.push_helper(RuntimeHelper::ToDisplayString);
    ctx.push("(");
    generate_expression_node(ctx, &interpolation.content);
    ctx.push(")");
}

fn generate_compound(ctx: &mut CodegenContext, compound: &CompoundExpressionNode<'_>) {
    for child in compound.children.iter() {
        match child {
            CompoundExpressionChild::Simple(simple) => generate_simple_expression(ctx, simple),
            CompoundExpressionChild::String(s) => ctx.push(s),
            CompoundExpressionChild::Text(t) => {
                ctx.push("\"");
                ctx.push(&escape_code_string(&t.content));
                ctx.push("\"");
            }
            CompoundExpressionChild::Interpolation(i) => generate_interpolation(ctx, i),
            CompoundExpressionChild::Symbol(helper) => ctx.push_helper(*helper),
        }
    }
}

fn generate_expression_node(ctx: &mut CodegenContext, exp: &ExpressionNode<'_>) {
    match exp {
        ExpressionNode::Simple(simple) => generate_simple_expression(ctx, simple),
        ExpressionNode::Compound(compound) => generate_compound(ctx, compound),
    }
}

fn generate_simple_expression(ctx: &mut CodegenContext, exp: &SimpleExpressionNode<'_>) {
    if exp.is_static {
        ctx.push("\"");
        ctx.push(&escape_code_string(&exp.content));
        ctx.push("\"");
        return;
    }

    let content = exp.content.as_str();
    if ctx.prefix_identifiers && lueur_socle::is_simple_identifier(content) {
        let root = content
            .split(['.', '['])
            .next()
            .unwrap_or(content);
        if !ctx.scope_ids.contains(root) && !root.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            ctx.push("_ctx.");
        }
    }
    ctx.push(content);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform;
    use lueur_esquisse::options::TransformOptions;
    use lueur_fusain::parse;
    use lueur_socle::Bump;

    fn compile(source: &str) -> (String, String) {
        compile_with(source, TransformOptions::default(), CodegenOptions::default())
    }

    fn compile_with(
        source: &str,
        transform_options: TransformOptions,
        codegen_options: CodegenOptions,
    ) -> (String, String) {
        let allocator = Bump::new();
        let (mut root, parse_errors) = parse(&allocator, source);
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);
        let errors = transform(&mut root, &allocator, transform_options);
        assert!(errors.is_empty(), "transform errors: {:?}", errors);
        let result = generate(&root, codegen_options);
        (result.code, result.preamble)
    }

    #[test]
    fn test_simple_element_with_interpolation() {
        let (code, preamble) = compile("<div>{{ msg }}</div>");
        assert!(code.contains(
            "(_openBlock(), _createElementBlock(\"div\", null, _toDisplayString(msg), 1 /* TEXT */))"
        ));
        assert!(preamble.contains("toDisplayString: _toDisplayString"));
        assert!(preamble.contains("} = Lueur"));
    }

    #[test]
    fn test_module_mode_prefixes_identifiers() {
        let mut codegen = CodegenOptions::default();
        codegen.mode = CodegenMode::Module;
        let (code, preamble) =
            compile_with("<div>{{ msg }}</div>", TransformOptions::default(), codegen);
        assert!(code.starts_with("export function render"));
        assert!(code.contains("_toDisplayString(_ctx.msg)"));
        assert!(preamble.contains("import {"));
        assert!(preamble.contains("from \"lueur\""));
    }

    #[test]
    fn test_static_root() {
        let (code, _) = compile("<div><span>hi</span></div>");
        assert!(code.contains("_createElementVNode(\"span\", null, \"hi\")"));
        assert!(code.contains("(_openBlock(), _createElementBlock(\"div\", null, ["));
    }

    #[test]
    fn test_class_and_props_flags() {
        let (code, _) = compile(r#"<div :class="cls" :id="theId"></div>"#);
        assert!(code.contains("class: cls"));
        assert!(code.contains("id: theId"));
        // CLASS(2) | PROPS(8)
        assert!(code.contains("10 /* CLASS, PROPS */"));
        assert!(code.contains("[\"id\"]"));
    }

    #[test]
    fn test_event_handler() {
        let (code, _) = compile(r#"<button @click="onClick"></button>"#);
        assert!(code.contains("onClick: onClick"));
        // PROPS(8) | NEED_HYDRATION(32)
        assert!(code.contains("40 /* PROPS, NEED_HYDRATION */"));
        assert!(code.contains("[\"onClick\"]"));
    }

    #[test]
    fn test_event_modifiers() {
        let (code, _) = compile(r#"<a @click.stop.prevent="go"></a>"#);
        assert!(code.contains("_withModifiers(go, [\"stop\", \"prevent\"])"));
    }

    #[test]
    fn test_v_if_chain() {
        let (code, _) = compile(
            r#"<div><p v-if="a">A</p><p v-else-if="b">B</p><p v-else>C</p></div>"#,
        );
        assert!(code.contains("(a)"));
        assert!(code.contains("? (_openBlock(), _createElementBlock(\"p\", { key: 0 }, \"A\"))"));
        assert!(code.contains("(b)"));
        assert!(code.contains("{ key: 1 }"));
        assert!(code.contains("{ key: 2 }"));
        assert!(!code.contains("_createCommentVNode(\"v-if\""));
    }

    #[test]
    fn test_v_if_without_else_gets_comment() {
        let (code, _) = compile(r#"<div><p v-if="a">A</p></div>"#);
        assert!(code.contains("_createCommentVNode(\"v-if\", true)"));
    }

    #[test]
    fn test_v_for_keyed() {
        let (code, _) = compile(r#"<ul><li v-for="item in items" :key="item.id">{{ item }}</li></ul>"#);
        assert!(code.contains("(_openBlock(true), _createElementBlock(_Fragment, null, _renderList(items, (item) => "));
        assert!(code.contains("key: item.id"));
        assert!(code.contains("128 /* KEYED_FRAGMENT */"));
    }

    #[test]
    fn test_v_for_unkeyed() {
        let (code, _) = compile(r#"<ul><li v-for="item in items">{{ item }}</li></ul>"#);
        assert!(code.contains("256 /* UNKEYED_FRAGMENT */"));
    }

    #[test]
    fn test_v_for_aliases_not_prefixed_in_module_mode() {
        let mut codegen = CodegenOptions::default();
        codegen.mode = CodegenMode::Module;
        let (code, _) = compile_with(
            r#"<li v-for="(item, i) in items" :key="i">{{ item }}</li>"#,
            TransformOptions::default(),
            codegen,
        );
        assert!(code.contains("_renderList(_ctx.items, (item, i) =>"));
        assert!(code.contains("_toDisplayString(item)"));
        assert!(code.contains("key: i"));
    }

    #[test]
    fn test_component_resolution() {
        let (code, _) = compile("<MyWidget :value=\"x\"/>");
        assert!(code.contains("const _component_MyWidget = _resolveComponent(\"MyWidget\")"));
        assert!(code.contains("(_openBlock(), _createBlock(_component_MyWidget"));
    }

    #[test]
    fn test_component_slots() {
        let (code, _) = compile(
            "<Card><template #header>h</template><p>body</p></Card>",
        );
        assert!(code.contains("header: _withCtx(() => ["));
        assert!(code.contains("default: _withCtx(() => ["));
        assert!(code.contains("_: 1"));
    }

    #[test]
    fn test_slot_outlet() {
        let (code, _) = compile("<slot name=\"header\">fallback</slot>");
        assert!(code.contains("_renderSlot($slots, \"header\""));
        assert!(code.contains("() => ["));
    }

    #[test]
    fn test_hoisting() {
        let mut transform_options = TransformOptions::default();
        transform_options.hoist_static = true;
        let (code, preamble) = compile_with(
            "<div><p class=\"static\">hi</p><p>{{ n }}</p></div>",
            transform_options,
            CodegenOptions::default(),
        );
        assert!(preamble.contains(
            "const _hoisted_1 = /*#__PURE__*/ _createElementVNode(\"p\", { class: \"static\" }, \"hi\", -1 /* HOISTED */)"
        ));
        assert!(code.contains("_hoisted_1"));
    }

    #[test]
    fn test_v_once_cache() {
        let (code, _) = compile("<div><span v-once>{{ n }}</span></div>");
        assert!(code.contains("_cache[0] || ("));
        assert!(code.contains("_setBlockTracking(-1)"));
        assert!(code.contains("_cache[0] = "));
        assert!(code.contains("_setBlockTracking(1)"));
    }

    #[test]
    fn test_v_model_on_input() {
        let (code, _) = compile(r#"<input v-model="name" />"#);
        assert!(code.contains("\"onUpdate:modelValue\": $event => ((name) = $event)"));
        assert!(code.contains("_withDirectives("));
        assert!(code.contains("[_vModelText, name]"));
    }

    #[test]
    fn test_v_show() {
        let (code, _) = compile(r#"<div v-show="visible"></div>"#);
        assert!(code.contains("_withDirectives("));
        assert!(code.contains("[_vShow, visible]"));
        assert!(code.contains("512 /* NEED_PATCH */"));
    }

    #[test]
    fn test_v_bind_object_spread() {
        let (code, _) = compile(r#"<div :id="a" v-bind="rest"></div>"#);
        assert!(code.contains("_mergeProps({ id: a }, rest)"));
        assert!(code.contains("16 /* FULL_PROPS */"));
    }

    #[test]
    fn test_multi_root_fragment() {
        let (code, _) = compile("<div/><span/>");
        assert!(code.contains("_createElementBlock(_Fragment, null, ["));
        assert!(code.contains("64 /* STABLE_FRAGMENT */"));
    }

    #[test]
    fn test_mixed_text_children() {
        let (code, _) = compile("<div>a<span/>{{ b }}</div>");
        assert!(code.contains("_createTextVNode(\"a\")"));
        assert!(code.contains("_createTextVNode(_toDisplayString(b), 1 /* TEXT */)"));
    }

    #[test]
    fn test_dynamic_component() {
        let (code, _) = compile(r#"<component :is="view"/>"#);
        assert!(code.contains("_resolveDynamicComponent(view)"));
    }

    #[test]
    fn test_custom_directive() {
        let (code, _) = compile(r#"<div v-focus="ok"></div>"#);
        assert!(code.contains("const _directive_focus = _resolveDirective(\"focus\")"));
        assert!(code.contains("[_directive_focus, ok]"));
    }
}
