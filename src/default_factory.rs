// SPDX-License-Identifier: MIT OR Apache-2.0

//! The loader-propagating thread factory.

use crate::access::{self, AccessDenied};
use crate::contextual::ContextualThreadFactory;
use crate::factory::{PendingThread, Task, ThreadFactory};
use crate::group::ThreadGroup;
use crate::loader::{ContextLoaderReference, Loader, simple_name};
use crate::platform::PlatformThreadFactory;

/// A thread factory whose threads come up with a [`Loader`] installed.
///
/// This is [`ContextualThreadFactory`] specialized to the loader slot: the
/// loader is resolved once, during construction, and every thread the factory
/// creates observes it as [`Loader::current`] from before its task starts.
///
/// # Construction
///
/// All three constructors resolve their loader inside a scoped
/// [`access::elevated`] block, so they work under the
/// [`Confined`](access::Policy::Confined) policy without the caller holding
/// any privilege.  Under [`Locked`](access::Policy::Locked) resolution is
/// denied even then, and the error is returned.
///
/// - [`new::<C>`](DefaultThreadFactory::new) captures the loader of `C`'s
///   defining crate and names a fresh group after `C`'s simple type name.
/// - [`with_group::<C>`](DefaultThreadFactory::with_group) captures `C`'s
///   loader but takes the group from the caller.
/// - [`wrapping`](DefaultThreadFactory::wrapping) decorates an existing
///   factory, leaving naming and grouping to it, and captures the loader of
///   the *factory's* defining crate.
///
/// # Example
///
/// ```rust
/// use threadwise::{DefaultThreadFactory, Loader, ThreadFactory};
///
/// struct IndexService;
///
/// let factory = DefaultThreadFactory::new::<IndexService>().unwrap();
/// let pending = factory.new_thread(Box::new(|| {}));
/// assert_eq!(pending.name(), "IndexService - 1");
///
/// let loader = factory.loader().clone();
/// factory
///     .spawn(move || {
///         assert_eq!(Loader::current(), Some(loader));
///     })
///     .unwrap()
///     .join()
///     .unwrap();
/// ```
pub struct DefaultThreadFactory<F = PlatformThreadFactory> {
    inner: ContextualThreadFactory<F, ContextLoaderReference>,
}

impl DefaultThreadFactory {
    /// Creates a factory attributed to `C`.
    ///
    /// The loader is `C`'s defining crate's; threads go into a fresh
    /// [`ThreadGroup`] named after `C`'s simple type name (last path segment,
    /// generics stripped) and are named `"<group> - <n>"`.
    pub fn new<C: ?Sized>() -> Result<Self, AccessDenied> {
        Self::with_group::<C>(|| ThreadGroup::new(simple_name::<C>().to_string()))
    }

    /// Creates a factory attributed to `C` with a caller-supplied group.
    ///
    /// `group` is invoked inside the same elevated scope that resolves the
    /// loader, and only if resolution succeeds.
    pub fn with_group<C: ?Sized>(
        group: impl FnOnce() -> ThreadGroup,
    ) -> Result<Self, AccessDenied> {
        access::elevated(|| {
            let loader = Loader::try_of::<C>()?;
            Ok(Self::assemble(PlatformThreadFactory::new(group()), loader))
        })
    }
}

impl<F: ThreadFactory> DefaultThreadFactory<F> {
    /// Decorates an existing factory with loader installation.
    ///
    /// The captured loader is that of `F`'s own defining crate, which for a
    /// factory implemented by this crate is this crate's loader.  Naming,
    /// grouping, and stack size remain entirely `factory`'s business.
    pub fn wrapping(factory: F) -> Result<Self, AccessDenied> {
        access::elevated(|| {
            let loader = Loader::try_of::<F>()?;
            Ok(Self::assemble(factory, loader))
        })
    }

    // The single point every constructor funnels through.
    fn assemble(factory: F, loader: Loader) -> Self {
        DefaultThreadFactory {
            inner: ContextualThreadFactory::new(factory, Some(loader), ContextLoaderReference),
        }
    }

    /// Returns the loader installed on this factory's threads.
    #[inline]
    pub fn loader(&self) -> &Loader {
        self.inner
            .context()
            .as_ref()
            .expect("constructed with a loader")
    }

    /// Returns the underlying factory.
    #[inline]
    pub fn factory(&self) -> &F {
        self.inner.factory()
    }
}

impl<F: ThreadFactory> ThreadFactory for DefaultThreadFactory<F> {
    fn new_thread(&self, task: Task) -> PendingThread {
        self.inner.new_thread(task)
    }
}

impl<F: std::fmt::Debug> std::fmt::Debug for DefaultThreadFactory<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultThreadFactory")
            .field("loader", self.inner.context())
            .field("factory", self.inner.factory())
            .finish()
    }
}
