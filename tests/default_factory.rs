// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end behavior of the loader-propagating factory.

logwise::declare_logging_domain!();

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use threadwise::{
        ContextLoaderReference, DefaultThreadFactory, Loader, PlatformThreadFactory,
        ThreadFactory, ThreadGroup,
    };
    use threadwise::contextual::ContextReference;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::*;
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    struct IndexService;

    fn observe<F: ThreadFactory>(factory: &F) -> (Option<String>, Option<Loader>) {
        let seen = Arc::new(Mutex::new((None, None)));
        let s = seen.clone();
        factory
            .spawn(move || {
                // First thing the task does; installation must already have
                // happened.
                let loader = Loader::current();
                let name = std::thread::current().name().map(|n| n.to_string());
                *s.lock().unwrap() = (name, loader);
            })
            .expect("spawn should succeed")
            .join()
            .expect("Thread should complete successfully");
        let result = seen.lock().unwrap().clone();
        result
    }

    #[test]
    fn test_threads_start_with_the_factory_loader_installed() {
        let factory = DefaultThreadFactory::new::<IndexService>().unwrap();
        // The loader names this (test) crate, which defines IndexService.
        assert_eq!(factory.loader().label(), "default_factory");

        let (name, loader) = observe(&factory);
        assert_eq!(name.as_deref(), Some("IndexService - 1"));
        assert_eq!(loader.as_ref(), Some(factory.loader()));
    }

    #[test]
    fn test_numbering_counts_per_factory_from_one() {
        let a = DefaultThreadFactory::new::<IndexService>().unwrap();
        let b = DefaultThreadFactory::new::<IndexService>().unwrap();

        let (name, _) = observe(&a);
        assert_eq!(name.as_deref(), Some("IndexService - 1"));
        let (name, _) = observe(&a);
        assert_eq!(name.as_deref(), Some("IndexService - 2"));
        // A fresh factory numbers from 1 again, in its own fresh group.
        let (name, _) = observe(&b);
        assert_eq!(name.as_deref(), Some("IndexService - 1"));
        assert_ne!(a.factory().group(), b.factory().group());
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    fn test_both_factories_resolve_the_identical_loader() {
        let a = DefaultThreadFactory::new::<IndexService>().unwrap();
        let b = DefaultThreadFactory::with_group::<IndexService>(|| {
            ThreadGroup::new("grouped".to_string())
        })
        .unwrap();
        // Same defining crate, same interned handle.
        assert_eq!(a.loader(), b.loader());
    }

    // The description side of the factory, checkable without starting a
    // platform thread, so it also runs under the wasm harness.
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    fn test_descriptions_carry_name_group_and_loader_without_starting() {
        let factory = DefaultThreadFactory::new::<IndexService>().unwrap();
        assert_eq!(factory.loader().label(), "default_factory");

        let pending = factory.new_thread(Box::new(|| {}));
        assert_eq!(pending.name(), "IndexService - 1");
        assert_eq!(pending.group(), factory.factory().group());
        assert_eq!(factory.new_thread(Box::new(|| {})).name(), "IndexService - 2");
    }

    #[test]
    fn test_capture_is_at_construction_time() {
        let factory = DefaultThreadFactory::new::<IndexService>().unwrap();
        let captured = factory.loader().clone();

        // Change the creating thread's own slot after construction.
        Loader::isolated("ambient".to_string()).set_current();
        let (_, loader) = observe(&factory);
        assert_eq!(loader, Some(captured));

        ContextLoaderReference.set(None);
    }

    #[test]
    fn test_wrapping_keeps_the_wrapped_factory_naming() {
        let base = PlatformThreadFactory::new(ThreadGroup::new("legacy".to_string()));
        let factory = DefaultThreadFactory::wrapping(base).unwrap();
        // PlatformThreadFactory is defined by the library crate.
        assert_eq!(factory.loader().label(), "threadwise");

        let (name, loader) = observe(&factory);
        assert_eq!(name.as_deref(), Some("legacy - 1"));
        assert_eq!(loader.as_ref(), Some(factory.loader()));
    }

    #[test]
    fn test_installation_does_not_leak_to_bare_grandchildren() {
        let factory = DefaultThreadFactory::new::<IndexService>().unwrap();
        let loader = factory.loader().clone();

        let seen = Arc::new(Mutex::new((None, None)));
        let s = seen.clone();
        factory
            .spawn(move || {
                let own = Loader::current();
                let grandchild = std::thread::spawn(Loader::current)
                    .join()
                    .expect("Thread should complete successfully");
                *s.lock().unwrap() = (own, grandchild);
            })
            .expect("spawn should succeed")
            .join()
            .expect("Thread should complete successfully");

        let (own, grandchild) = seen.lock().unwrap().clone();
        assert_eq!(own, Some(loader));
        assert_eq!(grandchild, None, "plain spawns start with an empty slot");
    }

    #[test]
    fn test_concurrent_thread_creation_is_safe() {
        let factory = Arc::new(DefaultThreadFactory::new::<IndexService>().unwrap());
        let loader = factory.loader().clone();

        let mut creators = Vec::new();
        for _ in 0..8 {
            let factory = factory.clone();
            let loader = loader.clone();
            creators.push(std::thread::spawn(move || {
                let seen = Arc::new(Mutex::new((None, None)));
                let s = seen.clone();
                factory
                    .spawn(move || {
                        let name = std::thread::current().name().map(|n| n.to_string());
                        *s.lock().unwrap() = (name, Loader::current());
                    })
                    .expect("spawn should succeed")
                    .join()
                    .expect("Thread should complete successfully");
                let (name, observed) = seen.lock().unwrap().clone();
                assert_eq!(observed, Some(loader));
                name.expect("factory threads are always named")
            }));
        }

        let mut names: Vec<String> = creators
            .into_iter()
            .map(|h| h.join().expect("Thread should complete successfully"))
            .collect();
        for name in &names {
            assert!(name.starts_with("IndexService - "), "unexpected name {name}");
        }
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8, "each creation gets its own number");
    }

    #[test]
    fn test_context_reference_reads_and_writes_the_calling_thread() {
        // get/set on the well-known reference act on this thread's slot only.
        let reference = ContextLoaderReference;
        assert_eq!(reference.get(), None);

        let loader = Loader::isolated("here".to_string());
        reference.set(Some(loader.clone()));
        assert_eq!(reference.get(), Some(loader.clone()));
        assert_eq!(Loader::current(), Some(loader));

        let other = std::thread::spawn(Loader::current)
            .join()
            .expect("Thread should complete successfully");
        assert_eq!(other, None);

        reference.set(None);
    }
}
