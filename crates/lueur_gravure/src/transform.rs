//! Transform infrastructure.
//!
//! A depth-first walk over the template AST. Structural directives (v-if,
//! v-for) rewrite the child list on entry; element and text lowering runs in
//! post-order so every node's render-program fragment is built after its
//! children's. Static hoisting runs last at each level, once constancy of the
//! finished subtrees is known.

use lueur_esquisse::ast::*;
use lueur_esquisse::errors::{CompilerError, ErrorCode};
use lueur_esquisse::options::TransformOptions;
use lueur_socle::{Box, Bump, FxHashSet, PatchFlags, String, Vec};

use crate::transforms;
use crate::transforms::hoist_static::is_constant_subtree;

/// What kind of node owns the child list currently being traversed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Root,
    Element,
    Component,
    /// v-if branch, v-for body or slot template content
    Template,
}

/// Transform context shared by the whole walk
pub struct TransformContext<'a> {
    pub allocator: &'a Bump,
    pub options: TransformOptions,
    /// Runtime helpers referenced by the generated code
    pub helpers: FxHashSet<RuntimeHelper>,
    /// Component tags needing resolveComponent
    pub components: FxHashSet<String>,
    /// Custom directive names needing resolveDirective
    pub directives: FxHashSet<String>,
    /// Hoisted constant subtrees
    pub hoists: std::vec::Vec<JsChildNode<'a>>,
    /// Number of `_cache` slots handed out
    pub cached: u32,
    /// Errors collected during transformation
    pub errors: std::vec::Vec<CompilerError>,
}

impl<'a> TransformContext<'a> {
    pub fn new(allocator: &'a Bump, options: TransformOptions) -> Self {
        Self {
            allocator,
            options,
            helpers: FxHashSet::default(),
            components: FxHashSet::default(),
            directives: FxHashSet::default(),
            hoists: std::vec::Vec::new(),
            cached: 0,
            errors: std::vec::Vec::new(),
        }
    }

    /// Record a helper as used and hand it back
    pub fn helper(&mut self, helper: RuntimeHelper) -> RuntimeHelper {
        self.helpers.insert(helper);
        helper
    }

    pub fn error(&mut self, code: ErrorCode, loc: Option<SourceLocation>) {
        self.errors.push(CompilerError::new(code, loc));
    }

    /// Hand out the next `_cache` slot
    pub fn next_cache_index(&mut self) -> u32 {
        let index = self.cached;
        self.cached += 1;
        index
    }

    /// Register a hoisted node, returning its 0-based index
    pub fn add_hoist(&mut self, node: JsChildNode<'a>) -> usize {
        self.hoists.push(node);
        self.hoists.len() - 1
    }
}

/// Transform the parsed AST in place, attaching render-program nodes.
pub fn transform<'a>(
    root: &mut RootNode<'a>,
    allocator: &'a Bump,
    options: TransformOptions,
) -> std::vec::Vec<CompilerError> {
    let mut ctx = TransformContext::new(allocator, options);

    traverse_children(&mut ctx, &mut root.children, ParentKind::Root, false);

    let mut helpers: std::vec::Vec<RuntimeHelper> = ctx.helpers.iter().copied().collect();
    helpers.sort();
    root.helpers.extend(helpers);

    let mut components: std::vec::Vec<String> = ctx.components.iter().cloned().collect();
    components.sort();
    root.components.extend(components);

    let mut directives: std::vec::Vec<String> = ctx.directives.iter().cloned().collect();
    directives.sort();
    root.directives.extend(directives);

    for hoist in ctx.hoists.drain(..) {
        root.hoists.push(hoist);
    }
    root.cached = ctx.cached;
    root.transformed = true;

    ctx.errors
}

/// Traverse one child list: structural rewrite, text merging, recursion with
/// post-order lowering, then static hoisting.
pub fn traverse_children<'a>(
    ctx: &mut TransformContext<'a>,
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    parent: ParentKind,
    in_hoisted_subtree: bool,
) {
    apply_structural_transforms(ctx, children);
    transforms::transform_text::merge_adjacent_text(ctx, children, parent);

    // The single root child becomes the root block itself and is never hoisted
    let hoisting = ctx.options.hoist_static && !in_hoisted_subtree;
    let mut hoist_marks = std::vec::Vec::new();
    if hoisting {
        hoist_marks.resize(children.len(), false);
        let skip_root_block = parent == ParentKind::Root && children.len() == 1;
        for (i, child) in children.iter().enumerate() {
            if skip_root_block && i == 0 {
                continue;
            }
            if let TemplateChildNode::Element(el) = child {
                hoist_marks[i] = is_constant_subtree(el);
            }
        }
    }

    for (i, child) in children.iter_mut().enumerate() {
        let child_hoisted = in_hoisted_subtree || hoist_marks.get(i).copied().unwrap_or(false);
        traverse_node(ctx, child, child_hoisted);
    }

    // Replace fully-constant subtrees with hoist references
    for (i, marked) in hoist_marks.iter().enumerate() {
        if !*marked {
            continue;
        }
        if let TemplateChildNode::Element(el) = &mut children[i] {
            if let Some(ElementCodegenNode::VNodeCall(mut vnode)) = el.codegen_node.take() {
                vnode.patch_flag = Some(PatchFlags::HOISTED);
                let index = ctx.add_hoist(JsChildNode::VNodeCall(vnode));
                children[i] = TemplateChildNode::Hoisted(index);
            }
        }
    }
}

/// Recurse into a node's children, then lower the node itself.
fn traverse_node<'a>(
    ctx: &mut TransformContext<'a>,
    node: &mut TemplateChildNode<'a>,
    in_hoisted_subtree: bool,
) {
    match node {
        TemplateChildNode::Element(el) => {
            let parent = match el.tag_type {
                ElementType::Component => ParentKind::Component,
                ElementType::Template => ParentKind::Template,
                _ => ParentKind::Element,
            };
            traverse_children(ctx, &mut el.children, parent, in_hoisted_subtree);
            match el.tag_type {
                ElementType::Slot => transforms::transform_slot::build_slot_outlet(ctx, el),
                // v-slot templates dissolve into the parent component's slots
                ElementType::Template => {}
                _ => transforms::transform_element::build_element(ctx, el),
            }
        }
        TemplateChildNode::If(if_node) => {
            for branch in if_node.branches.iter_mut() {
                traverse_children(ctx, &mut branch.children, ParentKind::Template, in_hoisted_subtree);
            }
            transforms::v_if::build_if_codegen(ctx, if_node);
        }
        TemplateChildNode::For(for_node) => {
            traverse_children(ctx, &mut for_node.children, ParentKind::Template, in_hoisted_subtree);
            transforms::v_for::build_for_codegen(ctx, for_node);
        }
        _ => {}
    }
}

/// Clone an expression node into the arena (AST nodes are arena-owned and
/// not `Clone`).
pub fn clone_expression<'a>(
    ctx: &TransformContext<'a>,
    exp: &ExpressionNode<'a>,
) -> ExpressionNode<'a> {
    match exp {
        ExpressionNode::Simple(s) => {
            let mut cloned =
                SimpleExpressionNode::new(s.content.clone(), s.is_static, s.loc.clone());
            cloned.const_type = s.const_type;
            cloned.is_handler_key = s.is_handler_key;
            ExpressionNode::Simple(Box::new_in(cloned, ctx.allocator))
        }
        ExpressionNode::Compound(c) => {
            // Compounds only need shallow content cloning for re-emission
            let cloned = SimpleExpressionNode::new(c.loc.source.clone(), false, c.loc.clone());
            ExpressionNode::Simple(Box::new_in(cloned, ctx.allocator))
        }
    }
}

/// Remove a directive from an element by normalized name.
pub fn remove_directive<'a>(
    el: &mut ElementNode<'a>,
    name: &str,
) -> Option<Box<'a, DirectiveNode<'a>>> {
    let index = el.props.iter().position(
        |p| matches!(p, PropNode::Directive(d) if d.name.as_str() == name),
    )?;
    match el.props.remove(index) {
        PropNode::Directive(d) => Some(d),
        PropNode::Attribute(_) => None,
    }
}

/// Extract the user-supplied key prop (`key` attribute or `:key`).
pub fn extract_key_prop<'a>(el: &mut ElementNode<'a>) -> Option<PropNode<'a>> {
    let index = el.props.iter().position(|p| match p {
        PropNode::Attribute(attr) => attr.name == "key",
        PropNode::Directive(dir) => dir.name == "bind" && dir.static_arg() == Some("key"),
    })?;
    Some(el.props.remove(index))
}

fn has_directive(node: &TemplateChildNode<'_>, names: &[&str]) -> bool {
    match node {
        TemplateChildNode::Element(el) => el
            .props
            .iter()
            .any(|p| matches!(p, PropNode::Directive(d) if names.contains(&d.name.as_str()))),
        _ => false,
    }
}

/// Structural pass: v-if chain merging, v-for wrapping, side-effect tag
/// removal and misplaced-directive validation.
fn apply_structural_transforms<'a>(
    ctx: &mut TransformContext<'a>,
    children: &mut Vec<'a, TemplateChildNode<'a>>,
) {
    let mut i = 0;
    while i < children.len() {
        // <script>/<style> in templates are ignored with an error
        if let TemplateChildNode::Element(el) = &children[i] {
            if el.tag_type == ElementType::Element
                && matches!(el.tag.as_str(), "script" | "style")
            {
                let loc = el.loc.clone();
                ctx.error(ErrorCode::IgnoredSideEffectTag, Some(loc));
                children.remove(i);
                continue;
            }
        }

        // v-slot outside components and <template>
        if let TemplateChildNode::Element(el) = &mut children[i] {
            if el.tag_type == ElementType::Element {
                if let Some(dir) = remove_directive(el, "slot") {
                    ctx.error(ErrorCode::VSlotMisplaced, Some(dir.loc.clone()));
                }
            }
        }

        if has_directive(&children[i], &["if"]) {
            build_if_chain(ctx, children, i);
        } else if has_directive(&children[i], &["else-if", "else"]) {
            // Reaching here means no preceding v-if consumed this node
            if let TemplateChildNode::Element(el) = &mut children[i] {
                let dir = remove_directive(el, "else-if").or_else(|| remove_directive(el, "else"));
                if let Some(dir) = dir {
                    ctx.error(ErrorCode::VElseNoAdjacentIf, Some(dir.loc.clone()));
                }
            }
        } else if has_directive(&children[i], &["for"]) {
            wrap_in_for(ctx, children, i);
        }

        i += 1;
    }
}

/// Take an element's children if it is a `<template>`, otherwise the element
/// itself, as the content of a structural directive.
fn structural_content<'a>(
    ctx: &TransformContext<'a>,
    el: Box<'a, ElementNode<'a>>,
) -> Vec<'a, TemplateChildNode<'a>> {
    if el.tag_type == ElementType::Template {
        let mut el = el;
        core::mem::replace(&mut el.children, Vec::new_in(ctx.allocator))
    } else {
        let mut content = Vec::new_in(ctx.allocator);
        content.push(TemplateChildNode::Element(el));
        content
    }
}

/// Merge a v-if element and its v-else-if/v-else siblings into one IfNode.
fn build_if_chain<'a>(
    ctx: &mut TransformContext<'a>,
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    i: usize,
) {
    let TemplateChildNode::Element(mut el) = children.remove(i) else {
        return;
    };

    let loc = el.loc.clone();
    let mut if_node = IfNode::new(ctx.allocator, loc);
    let dir = remove_directive(&mut el, "if").unwrap();
    if_node
        .branches
        .push(make_branch(ctx, el, Some(dir), false));

    // Consume adjacent v-else-if / v-else siblings; comments between
    // branches are dropped.
    loop {
        while i < children.len()
            && matches!(children[i], TemplateChildNode::Comment(_))
            && children.get(i + 1).is_some_and(|n| has_directive(n, &["else-if", "else"]))
        {
            children.remove(i);
        }

        if i < children.len() && has_directive(&children[i], &["else-if", "else"]) {
            let TemplateChildNode::Element(mut sibling) = children.remove(i) else {
                break;
            };
            if let Some(dir) = remove_directive(&mut sibling, "else-if") {
                if_node
                    .branches
                    .push(make_branch(ctx, sibling, Some(dir), false));
            } else if let Some(dir) = remove_directive(&mut sibling, "else") {
                drop(dir);
                if_node.branches.push(make_branch(ctx, sibling, None, true));
                break;
            }
        } else {
            break;
        }
    }

    let boxed = Box::new_in(if_node, ctx.allocator);
    children.insert(i, TemplateChildNode::If(boxed));
}

fn make_branch<'a>(
    ctx: &mut TransformContext<'a>,
    mut el: Box<'a, ElementNode<'a>>,
    dir: Option<Box<'a, DirectiveNode<'a>>>,
    is_else: bool,
) -> IfBranchNode<'a> {
    let loc = el.loc.clone();
    let is_template_if = el.tag_type == ElementType::Template;
    let user_key = extract_key_prop(&mut el);

    let condition = match dir {
        Some(mut dir) => match dir.exp.take() {
            Some(exp) => Some(exp),
            None => {
                if !is_else {
                    ctx.error(ErrorCode::VIfNoExpression, Some(dir.loc.clone()));
                }
                // Recover with an always-true branch
                let expr =
                    SimpleExpressionNode::new("true", false, SourceLocation::STUB);
                Some(ExpressionNode::Simple(Box::new_in(expr, ctx.allocator)))
            }
        },
        None => None,
    };

    let mut branch = IfBranchNode::new(ctx.allocator, condition, loc);
    branch.is_template_if = is_template_if;
    branch.user_key = user_key;
    branch.children = structural_content(ctx, el);
    branch
}

/// Wrap an element carrying v-for into a ForNode.
fn wrap_in_for<'a>(
    ctx: &mut TransformContext<'a>,
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    i: usize,
) {
    let TemplateChildNode::Element(mut el) = children.remove(i) else {
        return;
    };

    let loc = el.loc.clone();
    let mut dir = remove_directive(&mut el, "for").unwrap();

    let Some(result) = dir.for_parse_result.take() else {
        // The parser already reported the malformed expression; keep the
        // element so its subtree still compiles.
        if dir.exp.is_none() {
            ctx.error(ErrorCode::VForNoExpression, Some(dir.loc.clone()));
        }
        children.insert(i, TemplateChildNode::Element(el));
        return;
    };

    let for_node = ForNode {
        source: result.source,
        value_alias: result.value,
        key_alias: result.key,
        index_alias: result.index,
        children: structural_content(ctx, el),
        loc,
        codegen_node: None,
    };

    let boxed = Box::new_in(for_node, ctx.allocator);
    children.insert(i, TemplateChildNode::For(boxed));
}
