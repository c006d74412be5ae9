//! Job scheduler.
//!
//! Three paths: an id-ordered pre/main queue (component updates and
//! pre-flush watchers, parents before children), a post-flush queue (mounted
//! hooks, post watchers, activation effects), and a sync path that bypasses
//! queueing. `flush_jobs` is the explicit flush boundary the host drives;
//! `next_tick` callbacks run once the current flush settles.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lueur_socle::{CompactString, FxHashMap};

use crate::error::{call_with_error_handling, handle_error, RuntimeError, RuntimeErrorCode};

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct JobFlags: u8 {
        const QUEUED = 1;
        /// Runs before same-id regular jobs (pre-flush watchers)
        const PRE = 1 << 1;
        const ALLOW_RECURSE = 1 << 2;
        /// Invalidated; skipped when reached
        const DISPOSED = 1 << 3;
    }
}

struct JobInner {
    /// Ordering id; component jobs use their instance id so parents (smaller
    /// ids) run before children. `None` sorts last.
    id: Option<u32>,
    flags: Cell<JobFlags>,
    /// Diagnostic label for recursion-overflow reports
    label: RefCell<Option<CompactString>>,
    cb: RefCell<Box<dyn FnMut()>>,
}

/// A schedulable job. Identity lives on the wrapper: two clones of one job
/// are the same job for dedup and invalidation.
#[derive(Clone)]
pub struct SchedulerJob {
    inner: Rc<JobInner>,
}

impl SchedulerJob {
    pub fn new(id: Option<u32>, cb: impl FnMut() + 'static) -> Self {
        Self::with_flags(id, JobFlags::empty(), cb)
    }

    pub fn with_flags(id: Option<u32>, flags: JobFlags, cb: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(JobInner {
                id,
                flags: Cell::new(flags),
                label: RefCell::new(None),
                cb: RefCell::new(Box::new(cb)),
            }),
        }
    }

    pub fn set_label(&self, label: impl Into<CompactString>) {
        *self.inner.label.borrow_mut() = Some(label.into());
    }

    pub fn id(&self) -> Option<u32> {
        self.inner.id
    }

    pub fn ptr_eq(&self, other: &SchedulerJob) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn key(&self) -> u64 {
        match self.inner.id {
            None => u64::MAX,
            Some(id) => {
                let pre = self.inner.flags.get().contains(JobFlags::PRE);
                ((id as u64) << 1) | u64::from(!pre)
            }
        }
    }

    fn has_flag(&self, flag: JobFlags) -> bool {
        self.inner.flags.get().contains(flag)
    }

    fn add_flag(&self, flag: JobFlags) {
        self.inner.flags.set(self.inner.flags.get() | flag);
    }

    fn remove_flag(&self, flag: JobFlags) {
        self.inner.flags.set(self.inner.flags.get() - flag);
    }

    /// Run the job immediately, guarded (the sync path).
    pub fn invoke(&self) {
        call_with_error_handling(RuntimeErrorCode::SchedulerJob, || {
            (self.inner.cb.borrow_mut())();
        });
    }
}

const RECURSION_LIMIT: u32 = 100;

struct SchedulerState {
    queue: RefCell<Vec<SchedulerJob>>,
    flush_index: Cell<usize>,
    post: RefCell<Vec<SchedulerJob>>,
    is_flushing: Cell<bool>,
    after_flush: RefCell<Vec<Box<dyn FnOnce()>>>,
    /// Executions per job within one flush, for the recursion guard
    run_counts: RefCell<FxHashMap<usize, u32>>,
}

thread_local! {
    static SCHEDULER: SchedulerState = SchedulerState {
        queue: RefCell::new(Vec::new()),
        flush_index: Cell::new(0),
        post: RefCell::new(Vec::new()),
        is_flushing: Cell::new(false),
        after_flush: RefCell::new(Vec::new()),
        run_counts: RefCell::new(FxHashMap::default()),
    };
}

/// Binary-search insertion position in the unconsumed tail, keeping the
/// queue id-ordered even for jobs enqueued mid-flush.
fn find_insertion_index(queue: &[SchedulerJob], from: usize, key: u64) -> usize {
    let mut lo = from;
    let mut hi = queue.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if queue[mid].key() <= key {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Enqueue a job on the main queue; duplicates in the unconsumed tail are
/// skipped by identity.
pub fn queue_job(job: &SchedulerJob) {
    SCHEDULER.with(|s| {
        if job.has_flag(JobFlags::QUEUED) {
            return;
        }
        let mut queue = s.queue.borrow_mut();
        let index = find_insertion_index(&queue, s.flush_index.get(), job.key());
        queue.insert(index, job.clone());
        job.add_flag(JobFlags::QUEUED);
    });
}

/// Enqueue a job on the post-flush queue.
pub fn queue_post_job(job: &SchedulerJob) {
    SCHEDULER.with(|s| {
        if job.has_flag(JobFlags::QUEUED) {
            return;
        }
        s.post.borrow_mut().push(job.clone());
        job.add_flag(JobFlags::QUEUED);
    });
}

/// Remove a not-yet-executed job (component unmounted mid-flush).
pub fn invalidate_job(job: &SchedulerJob) {
    job.add_flag(JobFlags::DISPOSED);
}

/// Run a callback after the in-flight flush settles, or immediately when
/// nothing is queued.
pub fn next_tick(f: impl FnOnce() + 'static) {
    let mut f = Some(f);
    SCHEDULER.with(|s| {
        if s.is_flushing.get()
            || !s.queue.borrow().is_empty()
            || !s.post.borrow().is_empty()
        {
            s.after_flush.borrow_mut().push(Box::new(f.take().unwrap()));
        }
    });
    if let Some(f) = f {
        f();
    }
}

fn check_recursion(s: &SchedulerState, job: &SchedulerJob) -> bool {
    let ptr = Rc::as_ptr(&job.inner) as usize;
    let mut counts = s.run_counts.borrow_mut();
    let count = counts.entry(ptr).or_insert(0);
    *count += 1;
    if *count > RECURSION_LIMIT {
        let label = job
            .inner
            .label
            .borrow()
            .clone()
            .unwrap_or_else(|| "anonymous job".into());
        handle_error(RuntimeError {
            code: RuntimeErrorCode::RecursiveUpdate,
            detail: label.to_string(),
        });
        false
    } else {
        true
    }
}

/// Drain the queues: the pre/main queue in id order (allowing mid-flush
/// insertions), then the post-flush queue, looping while either refills.
pub fn flush_jobs() {
    let reenter = SCHEDULER.with(|s| s.is_flushing.replace(true));
    if reenter {
        return;
    }

    loop {
        // Main queue: iterate by index so jobs inserted during the flush
        // (child pre-watchers scheduled by a parent update) are reached.
        loop {
            let job = SCHEDULER.with(|s| {
                let queue = s.queue.borrow();
                let i = s.flush_index.get();
                if i < queue.len() {
                    s.flush_index.set(i + 1);
                    Some(queue[i].clone())
                } else {
                    None
                }
            });
            let Some(job) = job else { break };

            job.remove_flag(JobFlags::QUEUED);
            if job.has_flag(JobFlags::DISPOSED) {
                continue;
            }
            let ok = SCHEDULER.with(|s| check_recursion(s, &job));
            if !ok {
                continue;
            }
            job.invoke();
        }
        SCHEDULER.with(|s| {
            s.queue.borrow_mut().clear();
            s.flush_index.set(0);
        });

        // Post queue: copy the pending set so re-entrant additions wait for
        // the next turn of the loop.
        let mut active: Vec<SchedulerJob> =
            SCHEDULER.with(|s| s.post.borrow_mut().drain(..).collect());
        if !active.is_empty() {
            active.sort_by_key(|job| job.key());
            let mut seen: Vec<usize> = Vec::new();
            for job in active {
                let ptr = Rc::as_ptr(&job.inner) as usize;
                if seen.contains(&ptr) {
                    continue;
                }
                seen.push(ptr);
                job.remove_flag(JobFlags::QUEUED);
                if job.has_flag(JobFlags::DISPOSED) {
                    continue;
                }
                job.invoke();
            }
        }

        let refilled = SCHEDULER
            .with(|s| !s.queue.borrow().is_empty() || !s.post.borrow().is_empty());
        if !refilled {
            break;
        }
    }

    SCHEDULER.with(|s| {
        s.is_flushing.set(false);
        s.run_counts.borrow_mut().clear();
    });

    let callbacks: Vec<Box<dyn FnOnce()>> =
        SCHEDULER.with(|s| s.after_flush.borrow_mut().drain(..).collect());
    for cb in callbacks {
        cb();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    fn record(log: &Rc<StdRefCell<Vec<&'static str>>>, entry: &'static str) {
        log.borrow_mut().push(entry);
    }

    #[test]
    fn test_id_ordering_parent_before_child() {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let l = log.clone();
        let child = SchedulerJob::new(Some(2), move || record(&l, "child"));
        let l = log.clone();
        let parent = SchedulerJob::new(Some(1), move || record(&l, "parent"));

        // Enqueued child-first, drained parent-first
        queue_job(&child);
        queue_job(&parent);
        flush_jobs();

        assert_eq!(*log.borrow(), vec!["parent", "child"]);
    }

    #[test]
    fn test_duplicate_queueing_coalesces() {
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let job = SchedulerJob::new(Some(1), move || r.set(r.get() + 1));
        queue_job(&job);
        queue_job(&job);
        queue_job(&job);
        flush_jobs();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_pre_runs_before_regular_at_same_id() {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let l = log.clone();
        let regular = SchedulerJob::new(Some(1), move || record(&l, "regular"));
        let l = log.clone();
        let pre = SchedulerJob::with_flags(Some(1), JobFlags::PRE, move || record(&l, "pre"));

        queue_job(&regular);
        queue_job(&pre);
        flush_jobs();

        assert_eq!(*log.borrow(), vec!["pre", "regular"]);
    }

    #[test]
    fn test_jobs_inserted_mid_flush_run_same_flush() {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let l = log.clone();
        let late = SchedulerJob::new(Some(3), move || record(&l, "late"));
        let l = log.clone();
        let first = SchedulerJob::new(Some(1), move || {
            record(&l, "first");
            queue_job(&late);
        });

        queue_job(&first);
        flush_jobs();

        assert_eq!(*log.borrow(), vec!["first", "late"]);
    }

    #[test]
    fn test_post_runs_after_main() {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let l = log.clone();
        let post = SchedulerJob::new(None, move || record(&l, "post"));
        let l = log.clone();
        let main = SchedulerJob::new(Some(1), move || record(&l, "main"));

        queue_post_job(&post);
        queue_job(&main);
        flush_jobs();

        assert_eq!(*log.borrow(), vec!["main", "post"]);
    }

    #[test]
    fn test_invalidated_job_skipped() {
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let job = SchedulerJob::new(Some(1), move || r.set(r.get() + 1));
        queue_job(&job);
        invalidate_job(&job);
        flush_jobs();
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_recursion_guard_breaks_loop() {
        let errors = Rc::new(Cell::new(0));
        let e = errors.clone();
        crate::error::set_error_handler(move |err| {
            if err.code == RuntimeErrorCode::RecursiveUpdate {
                e.set(e.get() + 1);
            }
        });

        let slot: Rc<StdRefCell<Option<SchedulerJob>>> = Rc::new(StdRefCell::new(None));
        let s = slot.clone();
        let runs = Rc::new(Cell::new(0u32));
        let r = runs.clone();
        let job = SchedulerJob::new(Some(1), move || {
            r.set(r.get() + 1);
            let job = s.borrow().clone().unwrap();
            queue_job(&job);
        });
        job.set_label("looper");
        *slot.borrow_mut() = Some(job.clone());

        queue_job(&job);
        flush_jobs();

        assert_eq!(errors.get(), 1);
        assert!(runs.get() <= RECURSION_LIMIT);
    }

    #[test]
    fn test_next_tick_after_flush() {
        let log = Rc::new(StdRefCell::new(Vec::new()));
        let l = log.clone();
        let job = SchedulerJob::new(Some(1), move || record(&l, "job"));
        queue_job(&job);
        let l = log.clone();
        next_tick(move || record(&l, "tick"));
        flush_jobs();
        assert_eq!(*log.borrow(), vec!["job", "tick"]);
    }

    #[test]
    fn test_next_tick_immediate_when_idle() {
        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        next_tick(move || r.set(true));
        assert!(ran.get());
    }
}
