//! End-to-end runtime behavior: mounting, targeted patching, keyed moves,
//! scheduler ordering, KeepAlive caching and error recovery, all against the
//! in-memory host with exact op-count assertions.

use std::cell::RefCell;
use std::rc::Rc;

use lueur_socle::{CompactString, PatchFlags};
use lueur_toile::*;
use lueur_vif::{flush_jobs, Signal};

fn props(entries: &[(&str, PropValue)]) -> PropMap {
    let mut map = PropMap::default();
    for (key, value) in entries {
        map.insert((*key).into(), value.clone());
    }
    map
}

fn keyed_li(key: &str) -> VNodeRef {
    create_element(
        "li",
        props(&[("key", PropValue::str(key))]),
        VNodeChildren::Text(key.into()),
        PatchFlags::empty(),
        None,
    )
}

#[test]
fn test_mount_element_tree() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let vnode = create_element(
        "div",
        props(&[("id", PropValue::str("app"))]),
        VNodeChildren::Nodes(vec![create_element(
            "span",
            PropMap::default(),
            VNodeChildren::Text("hi".into()),
            PatchFlags::empty(),
            None,
        )]),
        PatchFlags::empty(),
        None,
    );
    renderer.render(&vnode, container);

    assert_eq!(
        host.serialize_children(container),
        "<div id=\"app\"><span>hi</span></div>"
    );
}

#[test]
fn test_identical_repatch_issues_zero_mutations() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let build = || {
        open_block(false);
        create_element_block(
            "div",
            props(&[("class", PropValue::str("a"))]),
            VNodeChildren::Text("stable".into()),
            PatchFlags::empty(),
            None,
        )
    };

    let first = build();
    renderer.render(&first, container);
    host.take_ops();

    let second = build();
    renderer.patch(Some(first), &second, container, None, None, true);
    assert_eq!(host.take_ops(), vec![], "no host mutations for equal trees");
}

#[test]
fn test_dynamic_text_issues_exactly_one_set_text() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let msg: Signal<CompactString> = Signal::new("hi".into());
    let def = {
        let msg = msg.clone();
        ComponentDef::new("Msg", vec![], move |_ctx| {
            let msg = msg.clone();
            Rc::new(move || {
                open_block(false);
                create_element_block(
                    "div",
                    PropMap::default(),
                    VNodeChildren::Text(msg.get()),
                    PatchFlags::TEXT,
                    None,
                )
            })
        })
    };

    let vnode = create_component(def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);
    assert_eq!(host.serialize_children(container), "<div>hi</div>");
    host.take_ops();

    msg.set("ho".into());
    flush_jobs();

    let ops = host.take_ops();
    assert_eq!(
        ops,
        vec![HostOp::SetElementText(
            ops.first()
                .map(|op| match op {
                    HostOp::SetElementText(el, _) => *el,
                    _ => 0,
                })
                .unwrap_or(0),
            "ho".into()
        )],
        "exactly one text mutation"
    );
    assert_eq!(host.serialize_children(container), "<div>ho</div>");
}

#[test]
fn test_keyed_diff_single_move() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let old: Vec<VNodeRef> = ["a", "b", "c", "d", "e"].iter().map(|k| keyed_li(k)).collect();
    let old_fragment = create_fragment(old, PatchFlags::KEYED_FRAGMENT);
    renderer.render(&old_fragment, container);
    host.take_ops();

    let new: Vec<VNodeRef> = ["a", "c", "b", "d", "e"].iter().map(|k| keyed_li(k)).collect();
    let new_fragment = create_fragment(new, PatchFlags::KEYED_FRAGMENT);
    renderer.patch(Some(old_fragment), &new_fragment, container, None, None, false);

    let ops = host.take_ops();
    let inserts = ops.iter().filter(|op| matches!(op, HostOp::Insert(..))).count();
    let creates = ops
        .iter()
        .filter(|op| {
            matches!(
                op,
                HostOp::CreateElement(_) | HostOp::CreateText(_) | HostOp::CreateComment(_)
            )
        })
        .count();
    let removes = ops.iter().filter(|op| matches!(op, HostOp::Remove(_))).count();

    assert_eq!(creates, 0, "no creates");
    assert_eq!(removes, 0, "no removes");
    assert_eq!(inserts, 1, "exactly one move: old-common(5) - LIS(4)");
    assert_eq!(host.serialize_children(container), "<li>a</li><li>c</li><li>b</li><li>d</li><li>e</li>");
}

#[test]
fn test_keyed_diff_mount_and_unmount_tail() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let old: Vec<VNodeRef> = ["a", "b"].iter().map(|k| keyed_li(k)).collect();
    let old_fragment = create_fragment(old, PatchFlags::KEYED_FRAGMENT);
    renderer.render(&old_fragment, container);

    let new: Vec<VNodeRef> = ["a", "b", "c"].iter().map(|k| keyed_li(k)).collect();
    let new_fragment = create_fragment(new, PatchFlags::KEYED_FRAGMENT);
    renderer.patch(
        Some(old_fragment),
        &new_fragment,
        container,
        None,
        None,
        false,
    );
    assert_eq!(
        host.serialize_children(container),
        "<li>a</li><li>b</li><li>c</li>"
    );

    let shorter: Vec<VNodeRef> = ["b"].iter().map(|k| keyed_li(k)).collect();
    let shorter_fragment = create_fragment(shorter, PatchFlags::KEYED_FRAGMENT);
    renderer.patch(
        Some(new_fragment),
        &shorter_fragment,
        container,
        None,
        None,
        false,
    );
    assert_eq!(host.serialize_children(container), "<li>b</li>");
}

#[test]
fn test_empty_for_source_renders_empty_fragment() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let items: Vec<i32> = Vec::new();
    let children = render_list(items, |_, _| keyed_li("x"));
    let fragment = create_fragment(children, PatchFlags::KEYED_FRAGMENT);
    renderer.render(&fragment, container);

    assert_eq!(host.serialize_children(container), "");
}

#[test]
fn test_mount_then_unmount_restores_container() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let vnode = create_element(
        "div",
        PropMap::default(),
        VNodeChildren::Nodes(vec![keyed_li("a"), keyed_li("b")]),
        PatchFlags::empty(),
        None,
    );
    renderer.render(&vnode, container);
    assert_ne!(host.serialize_children(container), "");

    renderer.unmount_tree(&vnode);
    assert_eq!(host.serialize_children(container), "");
}

#[test]
fn test_two_writes_coalesce_and_parent_renders_before_child() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let parent_state = Signal::new(0);
    let child_state = Signal::new(0);

    let child_def = {
        let log = log.clone();
        let child_state = child_state.clone();
        ComponentDef::new("Child", vec![], move |_ctx| {
            let log = log.clone();
            let child_state = child_state.clone();
            Rc::new(move || {
                log.borrow_mut().push("child");
                open_block(false);
                create_element_block(
                    "span",
                    PropMap::default(),
                    VNodeChildren::Text(format!("{}", child_state.get()).into()),
                    PatchFlags::TEXT,
                    None,
                )
            })
        })
    };

    let parent_def = {
        let log = log.clone();
        let parent_state = parent_state.clone();
        let child_def = child_def.clone();
        ComponentDef::new("Parent", vec![], move |_ctx| {
            let log = log.clone();
            let parent_state = parent_state.clone();
            let child_def = child_def.clone();
            Rc::new(move || {
                log.borrow_mut().push("parent");
                let text = create_element(
                    "b",
                    PropMap::default(),
                    VNodeChildren::Text(format!("{}", parent_state.get()).into()),
                    PatchFlags::TEXT,
                    None,
                );
                let child = create_component(
                    child_def.clone(),
                    PropMap::default(),
                    None,
                    PatchFlags::empty(),
                    None,
                );
                open_block(false);
                create_element_block(
                    "div",
                    PropMap::default(),
                    VNodeChildren::Nodes(vec![text, child]),
                    PatchFlags::empty(),
                    None,
                )
            })
        })
    };

    let vnode = create_component(parent_def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);
    assert_eq!(*log.borrow(), vec!["parent", "child"]);
    log.borrow_mut().clear();

    // Two writes to the parent state coalesce into one render; child writes
    // after parent writes still render parent-first.
    child_state.set(1);
    parent_state.set(1);
    parent_state.set(2);
    flush_jobs();

    assert_eq!(*log.borrow(), vec!["parent", "child"]);
}

#[test]
fn test_component_props_update_rerenders_child() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let which = Signal::new(0i64);

    let child_def = ComponentDef::new("Label", vec!["text".into()], move |ctx| {
        let props = ctx.props.clone();
        Rc::new(move || {
            let text = props
                .get(&"text".into())
                .and_then(|v| v.as_str().map(CompactString::from))
                .unwrap_or_default();
            open_block(false);
            create_element_block(
                "span",
                PropMap::default(),
                VNodeChildren::Text(text),
                PatchFlags::TEXT,
                None,
            )
        })
    });

    let parent_def = {
        let which = which.clone();
        let child_def = child_def.clone();
        ComponentDef::new("Parent", vec![], move |_ctx| {
            let which = which.clone();
            let child_def = child_def.clone();
            Rc::new(move || {
                let label = if which.get() == 0 { "zero" } else { "one" };
                open_block(false);
                let child = create_component(
                    child_def.clone(),
                    props(&[("text", PropValue::str(label))]),
                    None,
                    PatchFlags::PROPS,
                    Some(vec!["text".into()]),
                );
                create_element_block(
                    "div",
                    PropMap::default(),
                    VNodeChildren::Nodes(vec![child]),
                    PatchFlags::empty(),
                    None,
                )
            })
        })
    };

    let vnode = create_component(parent_def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);
    assert_eq!(host.serialize_children(container), "<div><span>zero</span></div>");

    which.set(1);
    flush_jobs();
    assert_eq!(host.serialize_children(container), "<div><span>one</span></div>");
}

#[test]
fn test_event_invoker_stays_installed_across_updates() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let count = Signal::new(0);
    let clicks = Rc::new(std::cell::Cell::new(0));

    let def = {
        let count = count.clone();
        let clicks = clicks.clone();
        ComponentDef::new("Button", vec![], move |_ctx| {
            let count = count.clone();
            let clicks = clicks.clone();
            Rc::new(move || {
                let current = count.get();
                let clicks = clicks.clone();
                open_block(false);
                create_element_block(
                    "button",
                    props(&[(
                        "onClick",
                        PropValue::handler(move |_| clicks.set(clicks.get() + current as i32)),
                    )]),
                    VNodeChildren::Text(format!("{}", current).into()),
                    PatchFlags::TEXT | PatchFlags::PROPS,
                    Some(vec!["onClick".into()]),
                )
            })
        })
    };

    let vnode = create_component(def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);
    let button = host.child_ids(container)[0];
    host.take_ops();

    count.set(5);
    flush_jobs();

    // The handler changed but the installed listener did not
    let ops = host.take_ops();
    assert!(
        !ops.iter()
            .any(|op| matches!(op, HostOp::PatchProp(_, key) if key == "onClick")),
        "listener not re-installed: {:?}",
        ops
    );

    // Dispatch reads the freshest handler through the invoker slot
    host.trigger_event(button, "onClick", PropValue::Null);
    assert_eq!(clicks.get(), 5);
}

#[test]
fn test_emit_reaches_parent_handler() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let received: Rc<RefCell<Vec<f64>>> = Rc::new(RefCell::new(Vec::new()));

    // A button child that emits `notify` from its click handler
    let child_def = ComponentDef::new("Emitter", vec![], move |ctx| {
        let emit = ctx.emitter();
        Rc::new(move || {
            let emit = emit.clone();
            open_block(false);
            create_element_block(
                "button",
                props(&[(
                    "onClick",
                    PropValue::handler(move |_| emit("notify", PropValue::Num(7.0))),
                )]),
                VNodeChildren::Text("go".into()),
                PatchFlags::empty(),
                None,
            )
        })
    });

    let parent_def = {
        let child_def = child_def.clone();
        let received = received.clone();
        ComponentDef::new("Parent", vec![], move |_ctx| {
            let child_def = child_def.clone();
            let received = received.clone();
            Rc::new(move || {
                let received = received.clone();
                open_block(false);
                create_component_block(
                    child_def.clone(),
                    props(&[(
                        "onNotify",
                        PropValue::handler(move |payload| {
                            if let PropValue::Num(n) = payload {
                                received.borrow_mut().push(n);
                            }
                        }),
                    )]),
                    None,
                    PatchFlags::empty(),
                    None,
                )
            })
        })
    };

    let vnode = create_component(parent_def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);

    let button = host.child_ids(container)[0];
    host.trigger_event(button, "onClick", PropValue::Null);
    assert_eq!(*received.borrow(), vec![7.0]);
}

#[test]
fn test_keep_alive_lru_eviction_scenario() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let make_def = |name: &'static str, log: &Rc<RefCell<Vec<String>>>| {
        let log = log.clone();
        ComponentDef::new(name, vec![], move |ctx| {
            let log = log.clone();
            log.borrow_mut().push(format!("setup {}", name));
            ctx.on_deactivated({
                let log = log.clone();
                move || log.borrow_mut().push(format!("deactivated {}", name))
            });
            ctx.on_activated({
                let log = log.clone();
                move || log.borrow_mut().push(format!("activated {}", name))
            });
            ctx.on_unmounted({
                let log = log.clone();
                move || log.borrow_mut().push(format!("unmounted {}", name))
            });
            Rc::new(move || {
                open_block(false);
                create_element_block(
                    "div",
                    PropMap::default(),
                    VNodeChildren::Text(name.into()),
                    PatchFlags::empty(),
                    None,
                )
            })
        })
    };

    let defs = vec![
        make_def("A", &log),
        make_def("B", &log),
        make_def("C", &log),
    ];
    let current = Signal::new(0usize);
    let ka_def = keep_alive_def();

    let root_def = {
        let defs = defs.clone();
        let current = current.clone();
        let ka_def = ka_def.clone();
        ComponentDef::new("Root", vec![], move |_ctx| {
            let defs = defs.clone();
            let current = current.clone();
            let ka_def = ka_def.clone();
            Rc::new(move || {
                let defs = defs.clone();
                let current = current.clone();
                let slot: SlotFn = Rc::new(move || {
                    vec![create_component(
                        defs[current.get()].clone(),
                        PropMap::default(),
                        None,
                        PatchFlags::empty(),
                        None,
                    )]
                });
                let mut slots = lueur_socle::FxHashMap::default();
                slots.insert(CompactString::const_new("default"), slot);
                create_component(
                    ka_def.clone(),
                    props(&[("max", PropValue::Num(2.0))]),
                    Some(Rc::new(slots)),
                    PatchFlags::empty(),
                    None,
                )
            })
        })
    };

    let vnode = create_component(root_def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);
    flush_jobs();
    assert_eq!(host.serialize_children(container), "<div>A</div>");

    current.set(1);
    flush_jobs();
    assert_eq!(host.serialize_children(container), "<div>B</div>");
    assert!(log.borrow().contains(&"deactivated A".to_owned()));
    assert!(!log.borrow().contains(&"unmounted A".to_owned()));

    current.set(2);
    flush_jobs();
    assert_eq!(host.serialize_children(container), "<div>C</div>");
    // A was least-recently-activated: evicted for real
    assert!(log.borrow().contains(&"unmounted A".to_owned()));
    assert!(log.borrow().contains(&"deactivated B".to_owned()));
    assert!(!log.borrow().contains(&"unmounted B".to_owned()));

    // B reactivates from cache without a fresh setup
    let setups_before = log
        .borrow()
        .iter()
        .filter(|l| l.as_str() == "setup B")
        .count();
    current.set(1);
    flush_jobs();
    assert_eq!(host.serialize_children(container), "<div>B</div>");
    let setups_after = log
        .borrow()
        .iter()
        .filter(|l| l.as_str() == "setup B")
        .count();
    assert_eq!(setups_before, setups_after, "cached instance reused");
    assert!(log.borrow().contains(&"activated B".to_owned()));
}

#[test]
fn test_render_error_leaves_comment_placeholder() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let errors: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    {
        let errors = errors.clone();
        *renderer.app_error_handler.borrow_mut() = Some(Rc::new(move |err| {
            errors.borrow_mut().push(err.detail.clone());
        }));
    }

    let def = ComponentDef::new("Broken", vec![], move |_ctx| {
        Rc::new(move || -> VNodeRef { panic!("boom in render") })
    });

    let vnode = create_component(def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);

    assert_eq!(host.serialize_children(container), "<!--render error-->");
    assert_eq!(*errors.borrow(), vec!["boom in render".to_owned()]);
}

#[test]
fn test_error_captured_swallows() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let app_errors = Rc::new(std::cell::Cell::new(0));
    {
        let app_errors = app_errors.clone();
        *renderer.app_error_handler.borrow_mut() =
            Some(Rc::new(move |_| app_errors.set(app_errors.get() + 1)));
    }

    let captured = Rc::new(std::cell::Cell::new(0));

    let child_def = ComponentDef::new("Broken", vec![], move |_ctx| {
        Rc::new(move || -> VNodeRef { panic!("child render") })
    });

    let parent_def = {
        let child_def = child_def.clone();
        let captured = captured.clone();
        ComponentDef::new("Guard", vec![], move |ctx| {
            let captured = captured.clone();
            ctx.on_error_captured(move |_err| {
                captured.set(captured.get() + 1);
                false // swallow
            });
            let child_def = child_def.clone();
            Rc::new(move || {
                open_block(false);
                create_component_block(
                    child_def.clone(),
                    PropMap::default(),
                    None,
                    PatchFlags::empty(),
                    None,
                )
            })
        })
    };

    let vnode = create_component(parent_def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);

    assert_eq!(captured.get(), 1);
    assert_eq!(app_errors.get(), 0, "swallowed before the app handler");
}

#[test]
fn test_provide_inject_through_chain() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let seen: Rc<RefCell<Option<i64>>> = Rc::new(RefCell::new(None));

    let leaf_def = {
        let seen = seen.clone();
        ComponentDef::new("Leaf", vec![], move |ctx| {
            if let Some(value) = ctx.inject("answer") {
                if let Some(n) = value.downcast_ref::<i64>() {
                    *seen.borrow_mut() = Some(*n);
                }
            }
            Rc::new(move || create_comment("leaf"))
        })
    };

    let root_def = {
        let leaf_def = leaf_def.clone();
        ComponentDef::new("Root", vec![], move |ctx| {
            ctx.provide("answer", Rc::new(42i64));
            let leaf_def = leaf_def.clone();
            Rc::new(move || {
                open_block(false);
                create_component_block(
                    leaf_def.clone(),
                    PropMap::default(),
                    None,
                    PatchFlags::empty(),
                    None,
                )
            })
        })
    };

    let vnode = create_component(root_def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);
    assert_eq!(*seen.borrow(), Some(42));
}

#[test]
fn test_lifecycle_hook_order_on_mount() {
    let host = MockHost::new_shared();
    let renderer = Renderer::new(host.clone());
    let container = host.create_root();

    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

    let def = {
        let log = log.clone();
        ComponentDef::new("Hooked", vec![], move |ctx| {
            let log = log.clone();
            ctx.on_before_mount({
                let log = log.clone();
                move || log.borrow_mut().push("before-mount")
            });
            ctx.on_mounted({
                let log = log.clone();
                move || log.borrow_mut().push("mounted")
            });
            Rc::new(move || create_comment("x"))
        })
    };

    let vnode = create_component(def, PropMap::default(), None, PatchFlags::empty(), None);
    renderer.render(&vnode, container);
    // Mounted hooks wait for the post-flush queue
    assert_eq!(*log.borrow(), vec!["before-mount"]);
    flush_jobs();
    assert_eq!(*log.borrow(), vec!["before-mount", "mounted"]);
}
