//! Component definitions and instances.
//!
//! A definition carries declared props and a setup function; setup receives
//! a context for lifecycle registration, emit, provide/inject, slots and
//! reactive props, and returns the render closure. Instances live in an
//! id-indexed arena on the renderer; vnodes refer to them by id.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lueur_socle::{to_handler_key, CompactString, FxHashMap};
use lueur_vif::{ReactiveEffect, ReactiveMap, SchedulerJob};

use crate::error::{guard, ComponentError, ComponentErrorCode};
use crate::keep_alive::KeepAliveState;
use crate::vnode::{InstanceId, PropMap, PropValue, Slots, VNodeRef};

pub type RenderFn = Rc<dyn Fn() -> VNodeRef>;
pub type SetupFn = Rc<dyn Fn(&SetupContext) -> RenderFn>;

/// Distinguishes built-in component behavior handled by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Stateful,
    KeepAlive,
}

/// A component descriptor. Identity (Rc pointer) is vnode-type identity.
pub struct ComponentDef {
    pub name: CompactString,
    /// Declared prop names; everything else lands in attrs
    pub props: Vec<CompactString>,
    pub setup: SetupFn,
    pub kind: ComponentKind,
}

impl ComponentDef {
    pub fn new(
        name: impl Into<CompactString>,
        props: Vec<CompactString>,
        setup: impl Fn(&SetupContext) -> RenderFn + 'static,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            props,
            setup: Rc::new(setup),
            kind: ComponentKind::Stateful,
        })
    }
}

/// Lifecycle phases with hook queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum LifecycleHook {
    BeforeMount = 0,
    Mounted = 1,
    BeforeUpdate = 2,
    Updated = 3,
    BeforeUnmount = 4,
    Unmounted = 5,
    Activated = 6,
    Deactivated = 7,
}

pub(crate) const HOOK_COUNT: usize = 8;

/// Per-instance hook lists keyed by phase.
#[derive(Default)]
pub struct HookRegistry {
    lists: RefCell<[Vec<Rc<dyn Fn()>>; HOOK_COUNT]>,
    error_captured: RefCell<Vec<Rc<dyn Fn(&ComponentError) -> bool>>>,
}

impl HookRegistry {
    pub fn add(&self, hook: LifecycleHook, f: Rc<dyn Fn()>) {
        self.lists.borrow_mut()[hook as usize].push(f);
    }

    pub fn take_snapshot(&self, hook: LifecycleHook) -> Vec<Rc<dyn Fn()>> {
        self.lists.borrow()[hook as usize].clone()
    }

    pub fn add_error_captured(&self, f: Rc<dyn Fn(&ComponentError) -> bool>) {
        self.error_captured.borrow_mut().push(f);
    }

    pub fn error_captured_snapshot(&self) -> Vec<Rc<dyn Fn(&ComponentError) -> bool>> {
        self.error_captured.borrow().clone()
    }
}

pub(crate) type ProvideMap = Rc<RefCell<FxHashMap<CompactString, Rc<dyn Any>>>>;

/// A component instance.
pub struct ComponentInstance {
    pub id: InstanceId,
    pub parent: Option<InstanceId>,
    pub root: InstanceId,
    pub def: Rc<ComponentDef>,
    /// The component vnode currently mounted for this instance
    pub vnode: VNodeRef,
    /// Pending component vnode for an in-flight update
    pub next: Option<VNodeRef>,
    /// Declared props, reactive so renders re-run on prop patches
    pub props: ReactiveMap<CompactString, PropValue>,
    /// Undeclared props
    pub attrs: Rc<RefCell<PropMap>>,
    pub slots: Rc<RefCell<Slots>>,
    pub render: Option<RenderFn>,
    /// Current rendered subtree
    pub subtree: Option<VNodeRef>,
    pub effect: Option<ReactiveEffect>,
    pub update_job: Option<SchedulerJob>,
    pub hooks: Rc<HookRegistry>,
    pub provides: ProvideMap,
    /// Ancestor provide maps, nearest first; the app context map comes last
    pub provide_chain: Vec<ProvideMap>,
    pub is_mounted: bool,
    pub is_unmounted: bool,
    pub is_deactivated: bool,
    /// Cache state when this instance is a KeepAlive
    pub keep_alive: Option<Rc<RefCell<KeepAliveState>>>,
    /// Enclosing suspense boundary id; carried for the boundary hook, never
    /// consulted for ordering
    pub suspense: Option<u32>,
}

/// Context handed to setup functions.
pub struct SetupContext {
    pub props: ReactiveMap<CompactString, PropValue>,
    pub attrs: Rc<RefCell<PropMap>>,
    pub slots: Rc<RefCell<Slots>>,
    pub(crate) hooks: Rc<HookRegistry>,
    pub(crate) provides: ProvideMap,
    pub(crate) provide_chain: Vec<ProvideMap>,
    pub(crate) instance: Weak<RefCell<ComponentInstance>>,
    pub(crate) on_error: Rc<dyn Fn(ComponentError)>,
}

fn emit_impl(
    instance: &Weak<RefCell<ComponentInstance>>,
    on_error: &Rc<dyn Fn(ComponentError)>,
    event: &str,
    payload: PropValue,
) {
    let Some(instance) = instance.upgrade() else {
        return;
    };
    let (handler, name) = {
        let instance = instance.borrow();
        let key = to_handler_key(event);
        let handler = instance.vnode.borrow().props.get(&key).and_then(|p| match p {
            PropValue::Handler(h) => Some(h.clone()),
            _ => None,
        });
        (handler, instance.def.name.clone())
    };
    if let Some(handler) = handler {
        if let Err(err) = guard(
            ComponentErrorCode::ComponentEventHandler,
            Some(name),
            || handler(payload),
        ) {
            on_error(err);
        }
    }
}

impl SetupContext {
    /// Emit a component event: invokes the matching `onEvent` handler prop
    /// installed by the parent, read at dispatch time.
    pub fn emit(&self, event: &str, payload: PropValue) {
        emit_impl(&self.instance, &self.on_error, event, payload);
    }

    /// A free-standing emit closure usable from render closures and event
    /// handlers.
    pub fn emitter(&self) -> Rc<dyn Fn(&str, PropValue)> {
        let instance = self.instance.clone();
        let on_error = self.on_error.clone();
        Rc::new(move |event, payload| emit_impl(&instance, &on_error, event, payload))
    }

    /// Fetch a named slot.
    pub fn slot(&self, name: &str) -> Option<crate::vnode::SlotFn> {
        self.slots.borrow().get(name).cloned()
    }

    fn add_hook(&self, hook: LifecycleHook, f: impl Fn() + 'static) {
        self.hooks.add(hook, Rc::new(f));
    }

    pub fn on_before_mount(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::BeforeMount, f);
    }

    pub fn on_mounted(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::Mounted, f);
    }

    pub fn on_before_update(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::BeforeUpdate, f);
    }

    pub fn on_updated(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::Updated, f);
    }

    pub fn on_before_unmount(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::BeforeUnmount, f);
    }

    pub fn on_unmounted(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::Unmounted, f);
    }

    pub fn on_activated(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::Activated, f);
    }

    pub fn on_deactivated(&self, f: impl Fn() + 'static) {
        self.add_hook(LifecycleHook::Deactivated, f);
    }

    /// Register an errorCaptured hook; returning `false` swallows the error.
    pub fn on_error_captured(&self, f: impl Fn(&ComponentError) -> bool + 'static) {
        self.hooks.add_error_captured(Rc::new(f));
    }

    /// Provide a value to descendants.
    pub fn provide(&self, key: impl Into<CompactString>, value: Rc<dyn Any>) {
        self.provides.borrow_mut().insert(key.into(), value);
    }

    /// Inject a value provided by the nearest ancestor.
    pub fn inject(&self, key: &str) -> Option<Rc<dyn Any>> {
        if let Some(value) = self.provides.borrow().get(key) {
            return Some(value.clone());
        }
        for map in &self.provide_chain {
            if let Some(value) = map.borrow().get(key) {
                return Some(value.clone());
            }
        }
        None
    }
}
