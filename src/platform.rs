// SPDX-License-Identifier: MIT OR Apache-2.0

//! The base factory that describes platform threads.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::factory::{PendingThread, Task, ThreadFactory};
use crate::group::ThreadGroup;

/// The factory at the bottom of every decorator stack.
///
/// A `PlatformThreadFactory` assigns each thread it creates to one
/// [`ThreadGroup`] and names it `"<group> - <n>"`, where `n` counts the
/// factory's own threads from 1.  Two factories sharing a group keep separate
/// counts; the group's [`threads_created`](ThreadGroup::threads_created) sees
/// both.
///
/// The factory performs no setup of its own; it only describes the thread.
/// Context installation comes from the decorators layered on top.
///
/// ```rust
/// use threadwise::{PlatformThreadFactory, ThreadFactory, ThreadGroup};
///
/// let factory = PlatformThreadFactory::new(ThreadGroup::new("demo".to_string()));
/// let pending = factory.new_thread(Box::new(|| {}));
/// assert_eq!(pending.name(), "demo - 1");
/// ```
#[derive(Debug)]
pub struct PlatformThreadFactory {
    group: ThreadGroup,
    stack_size: Option<usize>,
    next_number: AtomicU64,
}

impl PlatformThreadFactory {
    /// Creates a factory that assigns threads to `group` with the platform's
    /// default stack size.
    pub fn new(group: ThreadGroup) -> PlatformThreadFactory {
        PlatformThreadFactory {
            group,
            stack_size: None,
            next_number: AtomicU64::new(1),
        }
    }

    /// Creates a factory whose threads request `stack_size` bytes of stack.
    pub fn with_stack_size(group: ThreadGroup, stack_size: usize) -> PlatformThreadFactory {
        PlatformThreadFactory {
            group,
            stack_size: Some(stack_size),
            next_number: AtomicU64::new(1),
        }
    }

    /// Returns the group this factory creates threads into.
    #[inline]
    pub fn group(&self) -> &ThreadGroup {
        &self.group
    }
}

impl ThreadFactory for PlatformThreadFactory {
    fn new_thread(&self, task: Task) -> PendingThread {
        let number = self.next_number.fetch_add(1, Ordering::Relaxed);
        let name = format!("{} - {}", self.group.name(), number);
        self.group.note_created();
        PendingThread::new(name, self.group.clone(), self.stack_size, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::*;

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    fn test_names_count_per_factory() {
        let group = ThreadGroup::new("pool".to_string());
        let a = PlatformThreadFactory::new(group.clone());
        let b = PlatformThreadFactory::new(group.clone());

        assert_eq!(a.new_thread(Box::new(|| {})).name(), "pool - 1");
        assert_eq!(a.new_thread(Box::new(|| {})).name(), "pool - 2");
        // A second factory on the same group numbers independently.
        assert_eq!(b.new_thread(Box::new(|| {})).name(), "pool - 1");
        // The group saw every creation.
        assert_eq!(group.threads_created(), 3);
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    fn test_created_threads_carry_group_and_stack_size() {
        let group = ThreadGroup::new("sized".to_string());
        let factory = PlatformThreadFactory::with_stack_size(group.clone(), 512 * 1024);
        let pending = factory.new_thread(Box::new(|| {}));
        assert_eq!(pending.group(), &group);
        assert_eq!(pending.stack_size(), Some(512 * 1024));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_spawn_runs_task_on_named_thread() {
        use std::sync::Arc;
        use std::sync::Mutex;

        let factory = PlatformThreadFactory::new(ThreadGroup::new("spawned".to_string()));
        let observed = Arc::new(Mutex::new(None));
        let o = observed.clone();
        factory
            .spawn(move || {
                *o.lock().unwrap() = std::thread::current().name().map(|n| n.to_string());
            })
            .expect("spawn should succeed")
            .join()
            .expect("Thread should complete successfully");
        assert_eq!(observed.lock().unwrap().as_deref(), Some("spawned - 1"));
    }
}
