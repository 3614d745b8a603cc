// SPDX-License-Identifier: MIT OR Apache-2.0

//! The context reference abstraction.

/// Read and write access to one kind of per-thread context.
///
/// A `ContextReference` stands for a slot that every thread has a private copy
/// of, such as a thread-local.  `get` and `set` always act on the *calling*
/// thread's slot; moving a value to another thread is the adapters' job, and
/// they do it by running `set` on that thread.
///
/// Implementations are typically well-known stateless instances (unit
/// structs), cheap to copy into the closures that carry them across threads.
/// [`ContextLoaderReference`](crate::ContextLoaderReference) is the one this
/// crate ships.
///
/// # Implementing
///
/// ```rust
/// use std::cell::Cell;
/// use threadwise::contextual::ContextReference;
///
/// thread_local! {
///     static VERBOSITY: Cell<u32> = const { Cell::new(0) };
/// }
///
/// #[derive(Copy, Clone)]
/// struct VerbosityReference;
///
/// impl ContextReference for VerbosityReference {
///     type Value = u32;
///     fn get(&self) -> u32 {
///         VERBOSITY.with(|slot| slot.get())
///     }
///     fn set(&self, value: u32) {
///         VERBOSITY.with(|slot| slot.set(value));
///     }
/// }
///
/// let reference = VerbosityReference;
/// assert_eq!(reference.replace(3), 0);
/// assert_eq!(reference.get(), 3);
/// ```
pub trait ContextReference {
    /// The type of value the slot holds.
    ///
    /// Slots that can be empty use an `Option` here, making emptiness an
    /// ordinary value that can be saved and restored like any other.
    type Value;

    /// Returns the calling thread's current value.
    fn get(&self) -> Self::Value;

    /// Sets the calling thread's value.
    fn set(&self, value: Self::Value);

    /// Sets the calling thread's value, returning the prior one.
    ///
    /// The default goes through [`get`](ContextReference::get) and
    /// [`set`](ContextReference::set); implementations whose storage has a
    /// native swap can override it.
    fn replace(&self, value: Self::Value) -> Self::Value {
        let previous = self.get();
        self.set(value);
        previous
    }
}
