//! Property-based tests for resolution.
//!
//! These check that resolution behavior holds regardless of the specific
//! values, scope counts, or thread counts involved.

use ingot_di::{Container, Definition, Qualifier};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ServiceA {
    value: String,
}

#[derive(Debug, Clone)]
struct ServiceB {
    number: u64,
}

proptest! {
    #[test]
    fn singleton_resolution_is_consistent(service_value in "\\PC{0,50}") {
        let container = Container::new();
        container
            .register(Definition::instance(ServiceA { value: service_value.clone() }))
            .unwrap();

        let resolved1 = container.resolve::<ServiceA>().unwrap();
        let resolved2 = container.resolve::<ServiceA>().unwrap();
        let resolved3 = container.resolve::<ServiceA>().unwrap();

        prop_assert!(Arc::ptr_eq(&resolved1, &resolved2));
        prop_assert!(Arc::ptr_eq(&resolved2, &resolved3));
        prop_assert_eq!(&resolved1.value, &service_value);
    }
}

proptest! {
    #[test]
    fn resolution_outcome_matches_registration_state(register_service in any::<bool>()) {
        let container = Container::new();

        if register_service {
            container
                .register(Definition::instance(ServiceB { number: 42 }))
                .unwrap();
        }

        let result = container.resolve::<ServiceB>();
        prop_assert_eq!(result.is_ok(), register_service);
        prop_assert_eq!(container.is_registered::<ServiceB>(), register_service);

        // Resolution never changes the outcome for the next caller.
        let again = container.resolve::<ServiceB>();
        prop_assert_eq!(again.is_ok(), register_service);
    }
}

proptest! {
    #[test]
    fn scope_isolation_holds_for_any_shape_of_traffic(
        resolve_count in 1usize..10,
        scope_count in 1usize..5,
    ) {
        let container = Container::new();
        container
            .register(Definition::scoped(Qualifier::name("request"), |_| {
                use std::sync::atomic::{AtomicU32, Ordering};
                static COUNTER: AtomicU32 = AtomicU32::new(0);
                let id = COUNTER.fetch_add(1, Ordering::SeqCst);
                ServiceA { value: format!("scoped_{}", id) }
            }))
            .unwrap();

        let mut per_scope = Vec::new();
        for i in 0..scope_count {
            let scope = container
                .create_scope(Qualifier::name("request"), format!("req-{}", i))
                .unwrap();
            let mut resolved = Vec::new();
            for _ in 0..resolve_count {
                resolved.push(scope.resolve::<ServiceA>().unwrap());
            }
            per_scope.push(resolved);
        }

        // Within a scope every resolution is the same instance.
        for resolved in &per_scope {
            for instance in &resolved[1..] {
                prop_assert!(Arc::ptr_eq(&resolved[0], instance));
            }
        }

        // Across scopes the instances are distinct.
        for i in 0..per_scope.len() {
            for j in (i + 1)..per_scope.len() {
                prop_assert!(!Arc::ptr_eq(&per_scope[i][0], &per_scope[j][0]));
            }
        }
    }
}

proptest! {
    #[test]
    fn dependency_chains_resolve_end_to_end(chain_label in 0usize..5) {
        let container = Container::new();
        container
            .register(Definition::instance(ServiceA { value: "base".to_string() }))
            .unwrap();
        container
            .register(Definition::singleton_with(move |base: Arc<ServiceA>| {
                format!("{}->level_{}", base.value, chain_label)
            }))
            .unwrap();

        let result = container.resolve::<String>().unwrap();
        let expected_suffix = format!("level_{}", chain_label);
        prop_assert!(result.starts_with("base->"));
        prop_assert!(result.ends_with(&expected_suffix));
    }
}

proptest! {
    #[test]
    fn concurrent_resolution_is_safe(
        thread_count in 1usize..8,
        resolution_count in 1usize..20,
    ) {
        use std::sync::Barrier;
        use std::thread;

        let container = Container::new();
        container
            .register(Definition::instance(ServiceB { number: 12345 }))
            .unwrap();
        container
            .register(Definition::scoped(Qualifier::name("request"), |_| {
                ServiceA { value: "concurrent_test".to_string() }
            }))
            .unwrap();

        let barrier = Arc::new(Barrier::new(thread_count));
        let mut handles = Vec::new();

        for thread_id in 0..thread_count {
            let container = container.clone();
            let barrier = Arc::clone(&barrier);

            handles.push(thread::spawn(move || {
                barrier.wait();

                let mut singleton_numbers = Vec::new();
                for _ in 0..resolution_count {
                    singleton_numbers.push(container.resolve::<ServiceB>().unwrap().number);
                }

                let scope = container
                    .create_scope(Qualifier::name("request"), format!("req-{}", thread_id))
                    .unwrap();
                let mut scoped_lengths = Vec::new();
                for _ in 0..resolution_count {
                    scoped_lengths.push(scope.resolve::<ServiceA>().unwrap().value.len());
                }

                (singleton_numbers, scoped_lengths)
            }));
        }

        for handle in handles {
            let (singleton_numbers, scoped_lengths) = handle.join().unwrap();
            for number in singleton_numbers {
                prop_assert_eq!(number, 12345);
            }
            for length in scoped_lengths {
                prop_assert_eq!(length, "concurrent_test".len());
            }
        }
    }
}

trait Keyed: Send + Sync {
    fn id(&self) -> u32;
}

#[derive(Debug)]
struct KeyedImpl {
    id: u32,
}

impl Keyed for KeyedImpl {
    fn id(&self) -> u32 {
        self.id
    }
}

proptest! {
    #[test]
    fn trait_resolution_preserves_identity(trait_id in 1u32..1000) {
        let container = Container::new();
        container
            .register(Definition::instance_trait::<dyn Keyed>(
                Arc::new(KeyedImpl { id: trait_id }),
            ))
            .unwrap();

        let first = container.resolve_trait::<dyn Keyed>().unwrap();
        let second = container.resolve_trait::<dyn Keyed>().unwrap();

        prop_assert!(Arc::ptr_eq(&first, &second));
        prop_assert_eq!(first.id(), trait_id);
    }
}

proptest! {
    #[test]
    fn factory_resolution_count_matches_call_count(calls in 1usize..20) {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let runs = Arc::new(AtomicUsize::new(0));
        let runs_clone = runs.clone();

        let container = Container::new();
        container
            .register(Definition::factory(move |_| {
                runs_clone.fetch_add(1, Ordering::SeqCst);
                ServiceB { number: 1 }
            }))
            .unwrap();

        for _ in 0..calls {
            container.resolve::<ServiceB>().unwrap();
        }

        prop_assert_eq!(runs.load(Ordering::SeqCst), calls);
    }
}
