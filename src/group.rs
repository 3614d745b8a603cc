// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named thread groups.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
struct ThreadGroupInner {
    name: String,
    threads_created: AtomicU64,
}

/// A named grouping for threads created by the factories in this crate.
///
/// Groups carry a diagnostic name, which the factories fold into thread names,
/// and count the threads created into them.  A group is cheap to clone
/// (Arc-based) and compares by identity, so two groups with the same name are
/// still different groups:
///
/// ```rust
/// use threadwise::ThreadGroup;
///
/// let a = ThreadGroup::new("workers".to_string());
/// let b = ThreadGroup::new("workers".to_string());
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
///
/// Groups do not own or track the threads themselves; thread lifecycle belongs
/// to whoever holds the join handles.
#[derive(Debug, Clone)]
pub struct ThreadGroup {
    inner: Arc<ThreadGroupInner>,
}

impl PartialEq for ThreadGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ThreadGroup {}

impl Hash for ThreadGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl std::fmt::Display for ThreadGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.name)
    }
}

impl ThreadGroup {
    /// Creates a new, empty group with the given name.
    pub fn new(name: String) -> ThreadGroup {
        ThreadGroup {
            inner: Arc::new(ThreadGroupInner {
                name,
                threads_created: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the group's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns how many threads have been created into this group.
    ///
    /// The count only ever grows; threads that have since finished are still
    /// counted.
    #[inline]
    pub fn threads_created(&self) -> u64 {
        self.inner.threads_created.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn note_created(&self) {
        self.inner.threads_created.fetch_add(1, Ordering::Relaxed);
    }
}
