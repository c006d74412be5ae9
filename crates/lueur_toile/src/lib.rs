//! Toile - the runtime core of Lueur.
//!
//! Virtual nodes, the reconciler with block fast paths and keyed diffing,
//! component instances with lifecycle and dependency injection, the
//! KeepAlive cache, and the abstract host-renderer contract with an
//! in-memory mock implementation for tests.

pub mod app;
pub mod component;
pub mod error;
pub mod host;
pub mod keep_alive;
pub mod mock;
pub mod renderer;
pub mod vnode;

pub use app::{create_app, App};
pub use component::{
    ComponentDef, ComponentInstance, ComponentKind, LifecycleHook, RenderFn, SetupContext,
};
pub use error::{ComponentError, ComponentErrorCode};
pub use host::{HostHandle, HostNode, HostRenderer, Namespace};
pub use keep_alive::{keep_alive_def, CacheKey, KeepAliveState, NamePattern};
pub use mock::{HostOp, MockHost};
pub use renderer::Renderer;
pub use vnode::{
    clone_vnode, create_comment, create_component, create_component_block, create_element,
    create_element_block, create_fragment, create_fragment_block, create_text, open_block,
    render_list, same_vnode_type, set_block_tracking, InstanceId, PropMap, PropValue, SlotFn,
    Slots, VNode, VNodeChildren, VNodeKey, VNodeRef, VNodeType,
};
