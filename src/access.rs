// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
Scoped privilege elevation for loader resolution.

Resolving the [`Loader`](crate::Loader) of a type is an introspective operation
that a host may want to restrict: code running in a confined corner of a process
should not necessarily be able to enumerate which crates are doing work on which
threads.  This module models that restriction the way a security manager would,
but without any global escalation: a process-wide [`Policy`] says whether loader
resolution is allowed, and [`elevated`] grants the capability to exactly one
closure on exactly one thread, reverting when the closure finishes.

The default policy is [`Policy::Open`], which makes every resolution succeed;
programs that never call [`set_policy`] never observe this module at all.

# Policies

| Policy     | Unelevated resolution | Elevated resolution |
|------------|-----------------------|---------------------|
| `Open`     | allowed               | allowed             |
| `Confined` | denied                | allowed             |
| `Locked`   | denied                | denied              |

`Locked` exists so a host can forbid resolution outright; under it even the
factory constructors in [`crate::DefaultThreadFactory`], which resolve inside an
elevated scope, report [`AccessDenied`] to their caller.

# Example

```rust
use threadwise::access::{self, Policy};

access::set_policy(Policy::Confined);

// Outside an elevated scope, resolution is denied.
assert!(threadwise::Loader::try_of::<u32>().is_err());

// Inside one, it succeeds.
let loader = access::elevated(|| threadwise::Loader::try_of::<u32>()).unwrap();
assert_eq!(loader.label(), "u32");

access::set_policy(Policy::Open);
```
*/

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};

/// The process-wide loader-resolution policy.
///
/// See the [module docs](self) for the capability table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Loader resolution is allowed everywhere.  The default.
    Open,
    /// Loader resolution requires an [`elevated`] scope.
    Confined,
    /// Loader resolution is denied even inside an [`elevated`] scope.
    Locked,
}

impl Policy {
    fn encode(self) -> u8 {
        match self {
            Policy::Open => 0,
            Policy::Confined => 1,
            Policy::Locked => 2,
        }
    }

    fn decode(value: u8) -> Policy {
        match value {
            0 => Policy::Open,
            1 => Policy::Confined,
            2 => Policy::Locked,
            _ => unreachable!("policy values are written only by encode"),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Policy::Open => "Open",
            Policy::Confined => "Confined",
            Policy::Locked => "Locked",
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/*
Boilerplate notes for Policy.

Copy/Clone: yes, it's a fieldless enum.
PartialEq/Eq/Hash: yes, policies are compared in match guards and tests.
Ord: no, the variants are not meaningfully ordered (Locked is not "greater").
Default: tempting (Open), but the default lives in the static below and a
second spelling of it invites drift.
Display: yes, the variant name; used in AccessDenied messages.
*/

static POLICY: AtomicU8 = AtomicU8::new(0);

thread_local! {
    static ELEVATION: Cell<u32> = const { Cell::new(0) };
}

/// Returns the current process-wide policy.
#[inline]
pub fn policy() -> Policy {
    Policy::decode(POLICY.load(Ordering::Relaxed))
}

/// Replaces the process-wide policy.
///
/// This is process-global configuration, typically called once during startup.
/// Threads already inside an [`elevated`] scope keep their elevation; only the
/// policy consulted at the next resolution changes.
pub fn set_policy(policy: Policy) {
    POLICY.store(policy.encode(), Ordering::Relaxed);
    logwise::debuginternal_sync!("access policy set to {policy}", policy = policy.name());
}

/// Runs `f` with loader-resolution privilege on the current thread.
///
/// The elevation is scoped: it begins when `f` is entered and reverts when `f`
/// returns or unwinds.  Nested calls compose.  Elevation never leaks to other
/// threads, including threads created while inside the scope.
///
/// Under [`Policy::Locked`] elevation is still entered, but resolution inside
/// it fails anyway; `Locked` outranks privilege.
pub fn elevated<R>(f: impl FnOnce() -> R) -> R {
    struct Restore;
    impl Drop for Restore {
        fn drop(&mut self) {
            ELEVATION.with(|depth| depth.set(depth.get() - 1));
        }
    }
    ELEVATION.with(|depth| depth.set(depth.get() + 1));
    let _restore = Restore;
    f()
}

/// Whether the current thread is inside an [`elevated`] scope.
#[inline]
pub fn is_elevated() -> bool {
    ELEVATION.with(|depth| depth.get()) > 0
}

/// Checks that the current thread may resolve loaders right now.
#[inline]
pub(crate) fn check_loader_access() -> Result<(), AccessDenied> {
    match policy() {
        Policy::Open => Ok(()),
        Policy::Confined => {
            if is_elevated() {
                Ok(())
            } else {
                Err(AccessDenied { policy: Policy::Confined })
            }
        }
        Policy::Locked => Err(AccessDenied { policy: Policy::Locked }),
    }
}

/// Loader resolution was denied by the ambient [`Policy`].
///
/// Returned by [`Loader::try_of`](crate::Loader::try_of) and propagated
/// unchanged by the [`DefaultThreadFactory`](crate::DefaultThreadFactory)
/// constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    policy: Policy,
}

impl AccessDenied {
    /// The policy that was in force when resolution was denied.
    #[inline]
    pub fn policy(&self) -> Policy {
        self.policy
    }
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.policy {
            Policy::Confined => {
                write!(f, "loader resolution requires an elevated scope (policy is Confined)")
            }
            _ => write!(f, "loader resolution is denied (policy is {})", self.policy),
        }
    }
}

impl std::error::Error for AccessDenied {}

/*
Boilerplate notes for AccessDenied.

Debug/Display/Error: the minimum an error type owes its callers.
Clone/PartialEq/Eq: cheap and lets tests assert on the exact denial.
Copy: would work today, but error types grow fields; not promised.
Hash/Ord: no use for denials as keys or in order.
From/Into: nothing obvious to convert from.
Send/Sync: automatic, the type is plain data.
*/

// The policy is process-global.  Unit tests that change it, or that rely on it
// being Open, serialize on this and put Open back before releasing it.
#[cfg(test)]
pub(crate) static POLICY_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());
