// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
Generic context propagation for threads and futures.

This module is the extension seam of the crate.  A [`ContextReference`] names
one kind of per-thread context (a slot that can be read and written on the
calling thread), and the adapters here move values through such slots without
the code in between having to pass them along:

- [`ContextualThreadFactory`]: a thread-factory decorator that captures a
  context value once, at construction, and installs it on every thread the
  factory creates, before the thread's task runs.
- [`with_context`]: a scoped installer for the current thread.  The prior
  value comes back when the closure finishes, even by panic, which makes it
  the right tool for pooled workers that outlive any one task.
- [`ContextualFuture`]: the same discipline for futures.  The value is applied
  around every poll and the prior value restored after each, so executor
  threads are left the way they were found.

The loader-specific types in the crate root are instantiations of these:
[`DefaultThreadFactory`](crate::DefaultThreadFactory) is a
`ContextualThreadFactory` over
[`ContextLoaderReference`](crate::ContextLoaderReference).

# Choosing between the factory and the scoped forms

The factory's install-once behavior is correct for threads the factory owns
end to end: the thread comes up, context is installed, the task runs, the
thread ends.  Nothing is restored because there is nothing after the task to
be wrong for.

A pool that reuses threads across unrelated tasks is a different situation.
There, installation must be paired with restoration around each task, or one
task's context bleeds into the next.  That is what [`with_context`] and
[`ContextualFuture`] are for; use them *inside* the pooled task rather than
reconfiguring the pool's factory.

# Custom context kinds

```rust
use std::cell::Cell;
use threadwise::contextual::{ContextReference, with_context};

thread_local! {
    static TENANT: Cell<Option<u64>> = const { Cell::new(None) };
}

#[derive(Copy, Clone)]
struct TenantReference;

impl ContextReference for TenantReference {
    type Value = Option<u64>;
    fn get(&self) -> Option<u64> {
        TENANT.with(|slot| slot.get())
    }
    fn set(&self, value: Option<u64>) {
        TENANT.with(|slot| slot.set(value));
    }
}

let observed = with_context(&TenantReference, Some(7), || TENANT.with(|slot| slot.get()));
assert_eq!(observed, Some(7));
assert_eq!(TenantReference.get(), None);
```
*/

mod apply;
mod factory;
mod reference;


// Re-export public types
pub use apply::{ContextualFuture, with_context};
pub use factory::ContextualThreadFactory;
pub use reference::ContextReference;
