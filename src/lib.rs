//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# threadwise

threadwise is an opinionated thread-spawning library for Rust.

# Development status

threadwise is experimental and the API may change.

# The problem

Threads are usually spawned a long way from the code they work for.  A pool is
built by bootstrap code; its threads then spend their lives serving some other
subsystem.  Once a thread is running, nothing about it says on whose behalf it
runs: the name helps a human reading a stack dump, but diagnostic and dynamic
code wants a value it can consult.

Here are some problems:

* A registry, a log sink, or a plugin host wants to know which component the
  current thread is working for, without that component threading an argument
  through every closure, channel, and callback in between.
* Whatever answers that question has to be set on the new thread *before* the
  task runs, every time, or the first thing the task does sees a blank.
* The code spawning the thread is generic infrastructure.  It cannot know what
  to install; it can only promise to install *something* it was handed earlier.

These are context-propagation problems, and the usual fix is the same one
thread pools use for naming: do it in the thread factory.

# The model

Creation is split from starting.  A [`ThreadFactory`] turns a task into a
[`PendingThread`], a fully described but not yet running thread, and
[`PendingThread::start`] hands it to the platform.  Decorators slot between
the two and attach setup that runs on the new thread ahead of the task.

| Type | Role |
|------|------|
| [`ThreadFactory`] / [`PendingThread`] | describe-then-start thread creation |
| [`PlatformThreadFactory`] | groups, `"<group> - <n>"` naming, stack size |
| [`ContextualThreadFactory`](contextual::ContextualThreadFactory) | installs a captured context value on every created thread |
| [`DefaultThreadFactory`] | the loader-installing instantiation of the above |
| [`with_context`](contextual::with_context) / [`ContextualFuture`](contextual::ContextualFuture) | scoped apply-and-restore for reused threads and futures |

The context kind shipped in the box is the [`Loader`]: an interned, identity-
compared handle naming a code origin (a crate), readable on any thread as
[`Loader::current`].  The machinery underneath is generic, though; see
[`contextual`] for wiring your own per-thread context kind through the same
factories.

# The API

```rust
use threadwise::{DefaultThreadFactory, Loader, ThreadFactory};

struct Indexer;

let factory = DefaultThreadFactory::new::<Indexer>().unwrap();
let loader = factory.loader().clone();
factory
    .spawn(move || {
        // Installed before the task ran, on the factory's promise.
        assert_eq!(Loader::current(), Some(loader));
    })
    .unwrap()
    .join()
    .unwrap();
```

The captured value is fixed when the factory is built.  What the spawning
thread's own slot says later, at `spawn` time, is deliberately irrelevant;
a factory is attribution you can hand out without also handing out your
ambient state.

# Access control

Resolving a loader is introspection, and a host can restrict it with
[`access::set_policy`]: `Open` allows it everywhere (the default), `Confined`
requires an [`access::elevated`] scope, and `Locked` denies it outright.  The
factory constructors resolve inside their own elevated scope, so they work
under `Confined` and return an error under `Locked`.  Elevation is per thread
and reverts when the scope ends; there is no global escape hatch.

# Reused threads

Factory installation is once per thread, never undone.  That is correct for
threads that run one task and end, and wrong for pooled workers serving many
tasks.  For those, wrap each task in
[`with_context`](contextual::with_context), or each future in
[`ContextualFuture`](contextual::ContextualFuture), which put the prior value
back when the task is done with the thread.

# WebAssembly

On `wasm32` targets threads come from [wasm_thread](https://crates.io/crates/wasm_thread)
and run as web workers; everything else is unchanged.


*/

pub mod access;
pub mod contextual;
mod default_factory;
mod factory;
mod group;
mod loader;
mod platform;
mod sys;

logwise::declare_logging_domain!();

pub use access::AccessDenied;
pub use default_factory::DefaultThreadFactory;
pub use factory::{PendingThread, Task, ThreadFactory};
pub use group::ThreadGroup;
pub use loader::{ContextLoaderReference, Loader, LoaderId};
pub use platform::PlatformThreadFactory;

pub use sys::JoinHandle;
