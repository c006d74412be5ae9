//! Application context.
//!
//! Multi-application isolation within one process: every app threads its own
//! context (provides, error handler) through component creation rather than
//! relying on globals.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use lueur_socle::{CompactString, PatchFlags};

use crate::component::ComponentDef;
use crate::error::ComponentError;
use crate::host::{HostHandle, HostNode};
use crate::renderer::Renderer;
use crate::vnode::{create_component, PropMap, VNodeRef};

/// One application: a root component plus its renderer.
pub struct App {
    renderer: Rc<Renderer>,
    root_def: Rc<ComponentDef>,
    root_props: RefCell<PropMap>,
    root_vnode: RefCell<Option<VNodeRef>>,
    container: RefCell<Option<HostNode>>,
}

/// Create an application bound to a host.
pub fn create_app(host: HostHandle, root_def: Rc<ComponentDef>) -> App {
    App {
        renderer: Renderer::new(host),
        root_def,
        root_props: RefCell::new(PropMap::default()),
        root_vnode: RefCell::new(None),
        container: RefCell::new(None),
    }
}

impl App {
    pub fn renderer(&self) -> &Rc<Renderer> {
        &self.renderer
    }

    /// Provide an app-level value injectable from any component.
    pub fn provide(&self, key: impl Into<CompactString>, value: Rc<dyn Any>) -> &Self {
        self.renderer
            .app_provides
            .borrow_mut()
            .insert(key.into(), value);
        self
    }

    /// Install the app-level error handler; errors unswallowed by
    /// errorCaptured hooks end here.
    pub fn set_error_handler(&self, handler: impl Fn(&ComponentError) + 'static) -> &Self {
        *self.renderer.app_error_handler.borrow_mut() = Some(Rc::new(handler));
        self
    }

    /// Set root component props before mounting.
    pub fn with_props(&self, props: PropMap) -> &Self {
        *self.root_props.borrow_mut() = props;
        self
    }

    /// Mount the root component into a host container.
    pub fn mount(&self, container: HostNode) {
        let vnode = create_component(
            self.root_def.clone(),
            self.root_props.borrow().clone(),
            None,
            PatchFlags::empty(),
            None,
        );
        self.renderer.render(&vnode, container);
        *self.root_vnode.borrow_mut() = Some(vnode);
        *self.container.borrow_mut() = Some(container);
    }

    /// Unmount the application, restoring the container.
    pub fn unmount(&self) {
        if let Some(vnode) = self.root_vnode.borrow_mut().take() {
            self.renderer.unmount_tree(&vnode);
        }
        *self.container.borrow_mut() = None;
    }
}
