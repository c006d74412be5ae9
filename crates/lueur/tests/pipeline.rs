//! Whole-pipeline properties: source round trips, exact codegen output,
//! static evaluation against hand-authored runtime trees, and compile-error
//! accumulation across stages.

use lueur::compile;
use lueur::eval::eval_static_root;
use lueur_esquisse::ast::*;
use lueur_esquisse::options::{CompilerOptions, TransformOptions};
use lueur_esquisse::ErrorCode;
use lueur_fusain::parse;
use lueur_socle::{Bump, PatchFlags};
use lueur_toile::{
    create_element, MockHost, PropMap, PropValue, Renderer, VNodeChildren, VNodeRef,
};

/// Every recorded location must re-serialize to the exact covered source.
fn assert_locations_roundtrip(source: &str, children: &[TemplateChildNode<'_>]) {
    for child in children {
        let loc = child.loc();
        let (start, end) = (loc.start.offset as usize, loc.end.offset as usize);
        if end > start {
            assert_eq!(
                &source[start..end],
                loc.source.as_str(),
                "loc does not round trip for {:?}",
                child.node_type()
            );
        }
        if let TemplateChildNode::Element(el) = child {
            // Children strictly nest inside the parent span
            for nested in el.children.iter() {
                let inner = nested.loc();
                assert!(inner.start.offset >= loc.start.offset);
                assert!(inner.end.offset <= loc.end.offset);
            }
            assert_locations_roundtrip(source, &el.children);
        }
    }
}

#[test]
fn test_parse_locations_roundtrip_source() {
    let source = "<section id=\"a\">\n  <p>hello {{ name }}</p>\n  <em>x</em>\n</section>";
    let allocator = Bump::new();
    let (root, errors) = parse(&allocator, source);
    assert!(errors.is_empty());
    assert_locations_roundtrip(source, &root.children);
}

#[test]
fn test_compile_simple_template_exact_output() {
    let result = compile("<div>{{ msg }}</div>", CompilerOptions::default());
    assert!(result.errors.is_empty());
    assert_eq!(
        result.code,
        "function render(_ctx, _cache, $props, $setup, $data, $options) {\n  \
         with (_ctx) {\n    \
         return (_openBlock(), _createElementBlock(\"div\", null, _toDisplayString(msg), 1 /* TEXT */))\n  \
         }\n\
         }"
    );
    assert!(result.preamble.contains("} = Lueur"));
}

#[test]
fn test_compile_hash_is_content_stable() {
    let a = compile("<div>{{ msg }}</div>", CompilerOptions::default());
    let b = compile("<div>{{ msg }}</div>", CompilerOptions::default());
    let c = compile("<div>{{ other }}</div>", CompilerOptions::default());
    assert_eq!(a.hash, b.hash);
    assert_ne!(a.hash, c.hash);
}

#[test]
fn test_compile_collects_errors_across_stages() {
    let result = compile(
        "<div id=\"a\" id=\"b\"><p v-else>x</p></div>",
        CompilerOptions::default(),
    );
    let codes: Vec<ErrorCode> = result.errors.iter().map(|e| e.code).collect();
    assert!(codes.contains(&ErrorCode::DuplicateAttribute));
    assert!(codes.contains(&ErrorCode::VElseNoAdjacentIf));
}

fn mount_and_serialize(vnodes: &[VNodeRef]) -> String {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();
    for vnode in vnodes {
        renderer.render(vnode, container);
    }
    host.serialize_children(container)
}

#[test]
fn test_static_template_evaluates_to_hand_authored_tree() {
    let source = "<div class=\"card\"><span>title</span><p>body</p></div>";
    let allocator = Bump::new();
    let (mut root, errors) = parse(&allocator, source);
    assert!(errors.is_empty());
    let transform_errors =
        lueur_gravure::transform(&mut root, &allocator, TransformOptions::default());
    assert!(transform_errors.is_empty());

    let evaluated = eval_static_root(&root).expect("static template evaluates");

    // Hand-authored equivalent
    let expected = vec![create_element(
        "div",
        {
            let mut props = PropMap::default();
            props.insert("class".into(), PropValue::str("card"));
            props
        },
        VNodeChildren::Nodes(vec![
            create_element(
                "span",
                PropMap::default(),
                VNodeChildren::Text("title".into()),
                PatchFlags::empty(),
                None,
            ),
            create_element(
                "p",
                PropMap::default(),
                VNodeChildren::Text("body".into()),
                PatchFlags::empty(),
                None,
            ),
        ]),
        PatchFlags::empty(),
        None,
    )];

    assert_eq!(mount_and_serialize(&evaluated), mount_and_serialize(&expected));
    assert_eq!(
        mount_and_serialize(&evaluated),
        "<div class=\"card\"><span>title</span><p>body</p></div>"
    );
}

#[test]
fn test_static_evaluation_resolves_hoists() {
    let source = "<div><p class=\"static\">hi</p><p>also static</p></div>";
    let allocator = Bump::new();
    let (mut root, errors) = parse(&allocator, source);
    assert!(errors.is_empty());
    let mut options = TransformOptions::default();
    options.hoist_static = true;
    let transform_errors = lueur_gravure::transform(&mut root, &allocator, options);
    assert!(transform_errors.is_empty());
    assert!(!root.hoists.is_empty(), "children were hoisted");

    let evaluated = eval_static_root(&root).expect("hoisted refs resolve");
    assert_eq!(
        mount_and_serialize(&evaluated),
        "<div><p class=\"static\">hi</p><p>also static</p></div>"
    );
}

#[test]
fn test_dynamic_template_refuses_static_evaluation() {
    let source = "<div>{{ msg }}</div>";
    let allocator = Bump::new();
    let (mut root, _) = parse(&allocator, source);
    let _ = lueur_gravure::transform(&mut root, &allocator, TransformOptions::default());
    assert!(eval_static_root(&root).is_none());
}

#[test]
fn test_module_mode_compile() {
    let mut options = CompilerOptions::default();
    options.codegen.mode = lueur_esquisse::options::CodegenMode::Module;
    let result = compile("<p :id=\"x\">{{ y }}</p>", options);
    assert!(result.errors.is_empty());
    assert!(result.code.starts_with("export function render"));
    assert!(result.code.contains("_ctx.x"));
    assert!(result.code.contains("_ctx.y"));
    assert!(result.preamble.starts_with("import {"));
}

#[test]
fn test_compiler_never_panics_on_malformed_input() {
    for source in [
        "<div",
        "</div>",
        "<div><span></div>",
        "{{ unclosed",
        "<div v-for=\"x\">bad</div>",
        "<a b=",
        "<!-->",
        "<p v-slot:x>misplaced</p>",
        "<input v-model>",
    ] {
        let result = compile(source, CompilerOptions::default());
        assert!(
            !result.errors.is_empty(),
            "malformed input should report errors: {}",
            source
        );
    }
}
