//! Runtime error propagation.
//!
//! Every user-code invocation (setup, render, lifecycle hooks, event
//! handlers) runs guarded. Errors bubble up the component tree through
//! errorCaptured hooks; a hook returning `false` swallows the error,
//! otherwise it reaches the app-level handler.

use std::panic::{catch_unwind, AssertUnwindSafe};

use lueur_socle::CompactString;

/// What kind of user code failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentErrorCode {
    SetupFunction,
    RenderFunction,
    LifecycleHook,
    NativeEventHandler,
    ComponentEventHandler,
    WatcherCallback,
    SchedulerJob,
}

impl ComponentErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::SetupFunction => "Unhandled error in setup function",
            Self::RenderFunction => "Unhandled error in render function",
            Self::LifecycleHook => "Unhandled error in lifecycle hook",
            Self::NativeEventHandler => "Unhandled error in native event handler",
            Self::ComponentEventHandler => "Unhandled error in component event handler",
            Self::WatcherCallback => "Unhandled error in watcher callback",
            Self::SchedulerJob => "Unhandled error in scheduler job",
        }
    }
}

/// A runtime error attributed to a component by descriptor name.
#[derive(Debug, Clone)]
pub struct ComponentError {
    pub code: ComponentErrorCode,
    pub detail: String,
    pub component: Option<CompactString>,
}

impl std::fmt::Display for ComponentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code.message())?;
        if let Some(component) = &self.component {
            write!(f, " (in component <{}>)", component)?;
        }
        write!(f, ": {}", self.detail)
    }
}

pub(crate) fn panic_detail(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_owned()
    }
}

/// Run user code guarded; a failure produces a `ComponentError` for the
/// caller to route through the errorCaptured chain.
pub fn guard<R>(
    code: ComponentErrorCode,
    component: Option<CompactString>,
    f: impl FnOnce() -> R,
) -> Result<R, ComponentError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| ComponentError {
        code,
        detail: panic_detail(payload),
        component,
    })
}
