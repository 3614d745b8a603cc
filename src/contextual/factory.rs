// SPDX-License-Identifier: MIT OR Apache-2.0

//! The context-installing factory decorator.

use crate::factory::{PendingThread, Task, ThreadFactory};

use super::reference::ContextReference;

/// A thread-factory decorator that installs a captured context value on every
/// thread it creates.
///
/// The value is captured once, when the decorator is constructed, and the
/// decorator is bound to it for its whole lifetime.  Each call to
/// [`new_thread`](ThreadFactory::new_thread) delegates to the wrapped factory
/// and adds one setup step: before the task runs on the new thread, the step
/// writes a clone of the captured value through `R` into that thread's slot.
/// What the *creating* thread's slot holds at call time is irrelevant; threads
/// from this factory always come up with the construction-time value.
///
/// Installation happens exactly once per created thread and is never undone,
/// which is the right shape for threads that run one task and end.  For
/// reused threads see [`with_context`](super::with_context).
///
/// ```rust
/// use threadwise::contextual::ContextualThreadFactory;
/// use threadwise::{ContextLoaderReference, Loader, PlatformThreadFactory, ThreadFactory, ThreadGroup};
///
/// let loader = Loader::isolated("pool".to_string());
/// let factory = ContextualThreadFactory::new(
///     PlatformThreadFactory::new(ThreadGroup::new("pool".to_string())),
///     Some(loader.clone()),
///     ContextLoaderReference,
/// );
///
/// factory
///     .spawn(move || {
///         assert_eq!(Loader::current(), Some(loader));
///     })
///     .unwrap()
///     .join()
///     .unwrap();
/// ```
pub struct ContextualThreadFactory<F, R: ContextReference> {
    factory: F,
    context: R::Value,
    reference: R,
}

impl<F, R: ContextReference> ContextualThreadFactory<F, R> {
    /// Decorates `factory` so its threads come up with `context` installed
    /// through `reference`.
    pub fn new(factory: F, context: R::Value, reference: R) -> Self {
        ContextualThreadFactory {
            factory,
            context,
            reference,
        }
    }

    /// Returns the captured context value.
    #[inline]
    pub fn context(&self) -> &R::Value {
        &self.context
    }

    /// Returns the wrapped factory.
    #[inline]
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F, R> ThreadFactory for ContextualThreadFactory<F, R>
where
    F: ThreadFactory,
    R: ContextReference + Clone + Send + 'static,
    R::Value: Clone + Send + 'static,
{
    fn new_thread(&self, task: Task) -> PendingThread {
        let mut pending = self.factory.new_thread(task);
        let reference = self.reference.clone();
        let context = self.context.clone();
        pending.add_setup(Box::new(move || reference.set(context)));
        pending
    }
}

impl<F, R> std::fmt::Debug for ContextualThreadFactory<F, R>
where
    F: std::fmt::Debug,
    R: ContextReference,
    R::Value: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualThreadFactory")
            .field("factory", &self.factory)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
