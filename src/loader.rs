// SPDX-License-Identifier: MIT OR Apache-2.0

/*!
Loader handles and the per-thread loader slot.

A [`Loader`] is a cheap-clone attribution handle naming a code origin, which for
resolved loaders is the crate that defines a type.  Diagnostic and dynamic code
can consult the *current* loader of a thread to learn on whose behalf the thread
is working, without that value being passed down every call chain.

Loaders compare by identity, not by label.  Resolved loaders are interned per
origin, so resolving through two types defined by the same crate yields the
identical handle; [`Loader::isolated`] mints handles outside the intern table
for callers that want a private identity.

Every thread carries one `Option<Loader>` slot.  Fresh threads start with the
slot empty; the thread factories in this crate fill it before the thread's task
runs, and [`ContextLoaderReference`] exposes the slot through the generic
[`ContextReference`] interface.
*/

use std::cell::Cell;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::access::{self, AccessDenied};
use crate::contextual::ContextReference;

pub(crate) static LOADER_ID: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a loader.
///
/// IDs are process-unique across resolved and isolated loaders alike.  Two
/// loaders are the same loader exactly when their IDs are equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoaderId(pub(crate) u64);

impl std::fmt::Display for LoaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct LoaderInner {
    id: u64,
    label: String,
}

/// A per-thread attribution handle naming a code origin.
///
/// Loaders are cheap to clone (Arc-based) and thread-safe.  Equality and
/// hashing are by identity, so two loaders with the same label are still
/// distinct unless they came from the same resolution or the same clone chain.
///
/// # Resolution
///
/// [`Loader::try_of`] resolves the loader of a type's defining crate, interning
/// the result so repeated resolutions agree:
///
/// ```rust
/// use threadwise::Loader;
///
/// let strings = Loader::try_of::<String>().unwrap();
/// let vecs = Loader::try_of::<Vec<u8>>().unwrap();
/// // Both types are defined by alloc, so the handles are identical.
/// assert_eq!(strings, vecs);
/// assert_eq!(strings.label(), "alloc");
///
/// let files = Loader::try_of::<std::fs::File>().unwrap();
/// assert_ne!(strings, files);
/// ```
///
/// # The thread slot
///
/// ```rust
/// use threadwise::Loader;
///
/// std::thread::spawn(|| {
///     // Fresh threads start without a loader.
///     assert!(Loader::current().is_none());
///
///     let mine = Loader::isolated("demo".to_string());
///     mine.clone().set_current();
///     assert_eq!(Loader::current(), Some(mine));
/// })
/// .join()
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

impl PartialEq for Loader {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Loader {}

impl Hash for Loader {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl std::fmt::Display for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.inner.label, self.id())
    }
}

/*
Boilerplate notes for Loader.

Clone: yes, the whole point; it's an Arc bump.
PartialEq/Eq/Hash: by pointer, like any interned handle.  Labels are for
humans and may collide; identity may not.
Ord: no, loader identity has no order.
Display: label plus id, the form thread names and reports want.
Default: no, there is no universally sensible loader.
Send/Sync: automatic via Arc, and load-bearing (loaders cross into every
thread a factory creates).
*/

static INTERNED: Mutex<Vec<(&'static str, Loader)>> = Mutex::new(Vec::new());

thread_local! {
    static CURRENT: Cell<Option<Loader>> = const { Cell::new(None) };
}

/// The crate-path prefix of a type name, which names the defining crate.
///
/// Reference and trait-object sigils are stripped first, so `&T` and `dyn T`
/// resolve to the crate defining `T`.
fn origin<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    let name = name
        .trim_start_matches('&')
        .trim_start_matches("mut ")
        .trim_start_matches("dyn ");
    match name.find("::") {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// The last path segment of a type name with any generic arguments stripped.
pub(crate) fn simple_name<T: ?Sized>() -> &'static str {
    let name = std::any::type_name::<T>();
    let base = match name.find('<') {
        Some(idx) => &name[..idx],
        None => name,
    };
    match base.rfind("::") {
        Some(idx) => &base[idx + 2..],
        None => base,
    }
}

fn mint(label: String) -> Loader {
    let id = LOADER_ID.fetch_add(1, Ordering::Relaxed);
    Loader {
        inner: Arc::new(LoaderInner { id, label }),
    }
}

impl Loader {
    /// Resolves the loader of the crate that defines `T`.
    ///
    /// Results are interned by origin: every resolution through a type defined
    /// by the same crate returns the identical handle, for the life of the
    /// process.
    ///
    /// Resolution is subject to the ambient [`access::Policy`]: under
    /// [`Confined`](access::Policy::Confined) it must run inside an
    /// [`access::elevated`] scope, and under
    /// [`Locked`](access::Policy::Locked) it is denied outright.  The default
    /// policy allows it everywhere.
    pub fn try_of<T: ?Sized>() -> Result<Loader, AccessDenied> {
        access::check_loader_access()?;
        let origin = origin::<T>();
        let mut interned = INTERNED.lock().expect("loader registry poisoned");
        if let Some((_, loader)) = interned.iter().find(|(key, _)| *key == origin) {
            return Ok(loader.clone());
        }
        let loader = mint(origin.to_string());
        interned.push((origin, loader.clone()));
        logwise::debuginternal_sync!(
            "interned loader {label}#{id}",
            label = origin,
            id = loader.inner.id
        );
        Ok(loader)
    }

    /// Mints a fresh loader outside the intern table.
    ///
    /// The result is never equal to any other loader, including other isolated
    /// loaders with the same label.  Isolated loaders are plain construction,
    /// not introspection, so they are not subject to the access policy.
    ///
    /// ```rust
    /// use threadwise::Loader;
    ///
    /// let a = Loader::isolated("worker".to_string());
    /// let b = Loader::isolated("worker".to_string());
    /// assert_ne!(a, b);
    /// assert_eq!(a.label(), b.label());
    /// ```
    pub fn isolated(label: String) -> Loader {
        mint(label)
    }

    /// Returns the loader's process-unique ID.
    #[inline]
    pub fn id(&self) -> LoaderId {
        LoaderId(self.inner.id)
    }

    /// Returns the loader's human-readable label.
    ///
    /// For resolved loaders this is the defining crate's name.  Labels are
    /// diagnostic only; compare loaders with `==`, not by label.
    #[inline]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns the loader installed on the current thread, if any.
    ///
    /// Fresh threads start with no loader; the factories in this crate install
    /// one before the thread's task runs.
    #[inline]
    pub fn current() -> Option<Loader> {
        CURRENT.with(|slot| {
            //safety: we don't let anyone get a mutable reference to this
            unsafe { &*slot.as_ptr() }.clone()
        })
    }

    /// Installs this loader as the current thread's loader.
    ///
    /// This replaces the thread's slot unconditionally.  Use
    /// [`ContextLoaderReference`] through
    /// [`with_context`](crate::contextual::with_context) when the prior value
    /// must come back afterwards.
    pub fn set_current(self) {
        replace_current(Some(self));
    }
}

#[inline]
pub(crate) fn replace_current(value: Option<Loader>) -> Option<Loader> {
    CURRENT.with(|slot| slot.replace(value))
}

/// The well-known [`ContextReference`] over the thread's loader slot.
///
/// This is a stateless handle; every instance reads and writes the same
/// per-thread storage.  `None` means the slot is empty, as it is on every
/// fresh thread.
#[derive(Copy, Clone, Debug, Default)]
pub struct ContextLoaderReference;

impl ContextReference for ContextLoaderReference {
    type Value = Option<Loader>;

    #[inline]
    fn get(&self) -> Option<Loader> {
        Loader::current()
    }

    #[inline]
    fn set(&self, value: Option<Loader>) {
        replace_current(value);
    }

    #[inline]
    fn replace(&self, value: Option<Loader>) -> Option<Loader> {
        replace_current(value)
    }
}
