// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
The thread factory abstraction.

A [`ThreadFactory`] turns a task into a [`PendingThread`], a thread that has
been fully described (name, group, stack size, setup steps) but not yet given
to the platform.  Splitting creation from starting is what lets decorators such
as [`ContextualThreadFactory`](crate::contextual::ContextualThreadFactory)
attach per-thread setup between the two: the decorator adds its step to the
pending thread, and the step runs on the new thread before the task does.

Callers that don't care about the intermediate handle use
[`ThreadFactory::spawn`], which creates and starts in one call.
*/

use std::io;

use crate::group::ThreadGroup;
use crate::sys;

/// A unit of work for a thread created by a [`ThreadFactory`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Creates described-but-not-started threads.
///
/// Implementations must be safe to share: `new_thread` takes `&self` and may
/// be called from any number of threads at once.  The factory configures the
/// thread; it never starts it.  Starting, and therefore every way starting can
/// fail, belongs to [`PendingThread::start`].
pub trait ThreadFactory {
    /// Describes a new thread that will run `task` once started.
    fn new_thread(&self, task: Task) -> PendingThread;

    /// Creates and immediately starts a thread running `f`.
    fn spawn(&self, f: impl FnOnce() + Send + 'static) -> io::Result<sys::JoinHandle<()>>
    where
        Self: Sized,
    {
        self.new_thread(Box::new(f)).start()
    }
}

impl<T: ThreadFactory + ?Sized> ThreadFactory for &T {
    fn new_thread(&self, task: Task) -> PendingThread {
        (**self).new_thread(task)
    }
}

/// A thread that has been described but not yet started.
///
/// The pending thread owns everything the platform needs: the name, the
/// [`ThreadGroup`], an optional stack size, the setup steps queued by factory
/// decorators, and the task itself.  [`start`](PendingThread::start) consumes
/// the handle, so a described thread can be started at most once.
///
/// On the new thread, setup steps run in the order they were added, then the
/// task runs.  Setup installed this way lasts for the life of the thread;
/// nothing is torn down afterwards, because the thread is about to end anyway.
pub struct PendingThread {
    name: String,
    group: ThreadGroup,
    stack_size: Option<usize>,
    setup: Vec<Box<dyn FnOnce() + Send + 'static>>,
    task: Task,
}

impl PendingThread {
    /// Describes a thread with the given name, group, and task.
    ///
    /// `stack_size` of `None` leaves the platform's default stack.
    pub fn new(
        name: String,
        group: ThreadGroup,
        stack_size: Option<usize>,
        task: Task,
    ) -> PendingThread {
        PendingThread {
            name,
            group,
            stack_size,
            setup: Vec::new(),
            task,
        }
    }

    /// Returns the name the thread will start under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the group the thread was created into.
    #[inline]
    pub fn group(&self) -> &ThreadGroup {
        &self.group
    }

    /// Returns the stack size the thread will request, if any.
    #[inline]
    pub fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    /// Queues a setup step to run on the new thread, before the task.
    ///
    /// Steps run in insertion order.  A step that panics takes the thread down
    /// before the task runs, like any other panic on that thread.
    pub fn add_setup(&mut self, step: Box<dyn FnOnce() + Send + 'static>) {
        self.setup.push(step);
    }

    /// Starts the thread, consuming the description.
    ///
    /// Errors are the platform's: thread creation is the only fallible step,
    /// and its `io::Error` is returned unchanged.
    pub fn start(self) -> io::Result<sys::JoinHandle<()>> {
        logwise::debuginternal_sync!(
            "starting thread {name} in group {group}",
            name = self.name.as_str(),
            group = self.group.name()
        );
        let mut builder = sys::Builder::new().name(self.name);
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        let setup = self.setup;
        let task = self.task;
        builder.spawn(move || {
            for step in setup {
                step();
            }
            task();
        })
    }
}

impl std::fmt::Debug for PendingThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingThread")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("stack_size", &self.stack_size)
            .field("setup", &self.setup.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_setup_runs_before_task_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let group = ThreadGroup::new("ordering".to_string());

        let o = order.clone();
        let mut pending = PendingThread::new(
            "ordering - 1".to_string(),
            group,
            None,
            Box::new(move || o.lock().unwrap().push("task")),
        );
        let o = order.clone();
        pending.add_setup(Box::new(move || o.lock().unwrap().push("first")));
        let o = order.clone();
        pending.add_setup(Box::new(move || o.lock().unwrap().push("second")));

        pending
            .start()
            .expect("spawn should succeed")
            .join()
            .expect("Thread should complete successfully");

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "task"]);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_start_applies_name_and_runs_task() {
        let ran = Arc::new(AtomicU32::new(0));
        let observed_name = Arc::new(Mutex::new(None));

        let group = ThreadGroup::new("named".to_string());
        let ran_clone = ran.clone();
        let name_clone = observed_name.clone();
        let pending = PendingThread::new(
            "named - 1".to_string(),
            group,
            None,
            Box::new(move || {
                ran_clone.fetch_add(1, Ordering::SeqCst);
                *name_clone.lock().unwrap() =
                    std::thread::current().name().map(|n| n.to_string());
            }),
        );
        assert_eq!(pending.name(), "named - 1");

        pending
            .start()
            .expect("spawn should succeed")
            .join()
            .expect("Thread should complete successfully");

        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(
            observed_name.lock().unwrap().as_deref(),
            Some("named - 1")
        );
    }
}
