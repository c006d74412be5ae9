//! Vif - the reactivity kernel for Lueur.
//!
//! Tracks reads, queues effects and schedules work. Reactive reads go
//! through typed accessors: `Signal<T>` for single values, `ReactiveMap` and
//! `ReactiveList` for collections. The contract is identical to the proxy
//! formulation: track on read, trigger on write, with tri-state dirtiness
//! for computed values and a job queue drained at explicit flush points.

pub mod computed;
pub mod dep;
pub mod effect;
pub mod error;
pub mod runtime;
pub mod scheduler;
pub mod signal;
pub mod store;
pub mod watch;

pub use computed::{computed, Computed};
pub use dep::{Dep, DepKey, TriggerOp};
pub use effect::{effect, DirtyLevel, EffectId, ReactiveEffect};
pub use error::{set_error_handler, RuntimeError, RuntimeErrorCode};
pub use runtime::{enable_tracking, pause_tracking, reset_tracking, untracked, TrackGuard};
pub use scheduler::{
    flush_jobs, invalidate_job, next_tick, queue_job, queue_post_job, JobFlags, SchedulerJob,
};
pub use signal::{SameValue, Signal};
pub use store::{ReactiveList, ReactiveMap};
pub use watch::{watch, FlushMode, OnInvalidate, WatchHandle, WatchOptions};
