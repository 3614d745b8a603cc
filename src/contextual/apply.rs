// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped context application for reused threads and futures.

use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use super::reference::ContextReference;

/// Runs `f` with `value` installed through `reference`, restoring the prior
/// value afterwards.
///
/// The prior value comes back whether `f` returns or unwinds, so a pooled
/// worker thread is left exactly as it was found.  This is the per-task
/// counterpart to
/// [`ContextualThreadFactory`](super::ContextualThreadFactory)'s per-thread
/// installation.
///
/// ```rust
/// use threadwise::contextual::with_context;
/// use threadwise::{ContextLoaderReference, Loader};
///
/// let loader = Loader::isolated("scoped".to_string());
/// let seen = with_context(&ContextLoaderReference, Some(loader.clone()), Loader::current);
/// assert_eq!(seen, Some(loader));
/// // The slot is back to what it was before.
/// assert_eq!(Loader::current(), None);
/// ```
pub fn with_context<R: ContextReference, T>(
    reference: &R,
    value: R::Value,
    f: impl FnOnce() -> T,
) -> T {
    struct Restore<'a, R: ContextReference> {
        reference: &'a R,
        previous: Option<R::Value>,
    }
    impl<R: ContextReference> Drop for Restore<'_, R> {
        fn drop(&mut self) {
            if let Some(previous) = self.previous.take() {
                self.reference.set(previous);
            }
        }
    }
    let previous = reference.replace(value);
    let _restore = Restore {
        reference,
        previous: Some(previous),
    };
    f()
}

/// A [`Future`] wrapper that applies a context value around every poll.
///
/// Executors move futures between threads freely, and pooled executor threads
/// serve many unrelated futures, so per-thread context cannot simply be
/// installed and left.  `ContextualFuture` installs its value through `R` just
/// before polling the inner future and puts the prior value back right after,
/// on whichever thread the poll happened to run.
///
/// The wrapped future therefore always observes the captured context, and the
/// executor's thread never does.
///
/// ```rust
/// use threadwise::contextual::ContextualFuture;
/// use threadwise::{ContextLoaderReference, Loader};
///
/// # async fn example() {
/// let loader = Loader::isolated("async".to_string());
/// let future = ContextualFuture::new(
///     ContextLoaderReference,
///     Some(loader.clone()),
///     async { Loader::current() },
/// );
/// // The wrapped future sees the loader; the polling thread never does.
/// assert_eq!(future.await, Some(loader));
/// # }
/// ```
pub struct ContextualFuture<R: ContextReference, F>(R, R::Value, F);

impl<R: ContextReference, F> ContextualFuture<R, F> {
    /// Wraps `f` so `value` is installed through `reference` during each poll.
    pub fn new(reference: R, value: R::Value, f: F) -> Self {
        Self(reference, value, f)
    }
}

impl<R, F> Future for ContextualFuture<R, F>
where
    R: ContextReference,
    R::Value: Clone,
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let (reference, value, fut) = unsafe {
            let d = self.get_unchecked_mut();
            (&d.0, d.1.clone(), Pin::new_unchecked(&mut d.2))
        };
        let prior = reference.replace(value);
        let r = fut.poll(cx);
        reference.set(prior);
        r
    }
}
