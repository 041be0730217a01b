use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ingot_di::{Container, Definition, Qualifier};
use std::sync::Arc;

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let container = Container::new();
    container.register(Definition::instance(42u64)).unwrap();

    // Prime the singleton
    let _ = container.resolve::<u64>().unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = container.resolve::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    struct ExpensiveToCreate {
        data: Vec<u64>,
    }

    c.bench_function("singleton_cold_expensive", |b| {
        b.iter_batched(
            || {
                let container = Container::new();
                container
                    .register(Definition::singleton(|_| ExpensiveToCreate {
                        data: (0..1000).collect(),
                    }))
                    .unwrap();
                container
            },
            |container| {
                let v = container.resolve::<ExpensiveToCreate>().unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_scoped_vs_factory(c: &mut Criterion) {
    #[derive(Clone)]
    struct Service {
        data: [u8; 64],
    }

    let mut group = c.benchmark_group("scoped_vs_factory");

    let scoped_container = Container::new();
    scoped_container
        .register(Definition::scoped(Qualifier::name("request"), |_| Service {
            data: [0; 64],
        }))
        .unwrap();
    let scope = scoped_container
        .create_scope(Qualifier::name("request"), "bench")
        .unwrap();

    group.bench_function("scoped_hit", |b| {
        b.iter(|| {
            let v = scope.resolve::<Service>().unwrap();
            black_box(&v.data);
        })
    });

    let factory_container = Container::new();
    factory_container
        .register(Definition::factory(|_| Service { data: [0; 64] }))
        .unwrap();

    group.bench_function("factory", |b| {
        b.iter(|| {
            let v = factory_container.resolve::<Service>().unwrap();
            black_box(&v.data);
        })
    });

    group.finish();
}

fn bench_concrete_vs_trait(c: &mut Criterion) {
    trait MyTrait: Send + Sync {
        fn value(&self) -> u64;
    }

    struct ConcreteImpl {
        val: u64,
    }

    impl MyTrait for ConcreteImpl {
        fn value(&self) -> u64 {
            self.val
        }
    }

    let mut group = c.benchmark_group("concrete_vs_trait");

    let concrete = Container::new();
    concrete
        .register(Definition::instance(ConcreteImpl { val: 42 }))
        .unwrap();

    group.bench_function("concrete", |b| {
        b.iter(|| {
            let v = concrete.resolve::<ConcreteImpl>().unwrap();
            black_box(v.val);
        })
    });

    let by_trait = Container::new();
    by_trait
        .register(Definition::instance_trait::<dyn MyTrait>(Arc::new(
            ConcreteImpl { val: 42 },
        )))
        .unwrap();

    group.bench_function("trait_single", |b| {
        b.iter(|| {
            let v = by_trait.resolve_trait::<dyn MyTrait>().unwrap();
            black_box(v.value());
        })
    });

    group.finish();
}

fn bench_declared_vs_inferred_shape(c: &mut Criterion) {
    struct Dep1;
    struct Dep2;
    struct Wired {
        _a: Arc<Dep1>,
        _b: Arc<Dep2>,
    }

    let mut group = c.benchmark_group("dependency_shape");

    let declared = Container::new();
    declared.register(Definition::singleton(|_| Dep1)).unwrap();
    declared.register(Definition::singleton(|_| Dep2)).unwrap();
    declared
        .register(Definition::factory_with(|a: Arc<Dep1>, b: Arc<Dep2>| {
            Wired { _a: a, _b: b }
        }))
        .unwrap();

    group.bench_function("declared_positional", |b| {
        b.iter(|| {
            let v = declared.resolve::<Wired>().unwrap();
            black_box(&v);
        })
    });

    let inferred = Container::new();
    inferred.register(Definition::singleton(|_| Dep1)).unwrap();
    inferred.register(Definition::singleton(|_| Dep2)).unwrap();
    inferred
        .register(Definition::factory(|ctx| Wired {
            _a: ctx.get().unwrap(),
            _b: ctx.get().unwrap(),
        }))
        .unwrap();

    group.bench_function("inferred_by_type", |b| {
        b.iter(|| {
            let v = inferred.resolve::<Wired>().unwrap();
            black_box(&v);
        })
    });

    group.finish();
}

fn bench_scope_lifecycle(c: &mut Criterion) {
    struct ScopedService {
        data: Vec<u8>,
    }

    let mut group = c.benchmark_group("scope_lifecycle");

    let container = Container::new();
    container
        .register(Definition::scoped(Qualifier::name("request"), |_| {
            ScopedService {
                data: vec![0; 1024],
            }
        }))
        .unwrap();

    group.bench_function("scope_create_drop", |b| {
        b.iter(|| {
            let scope = container
                .create_scope(Qualifier::name("request"), "bench")
                .unwrap();
            black_box(&scope);
        })
    });

    group.bench_function("scope_create_resolve_close", |b| {
        b.iter(|| {
            let scope = container
                .create_scope(Qualifier::name("request"), "bench")
                .unwrap();
            let service = scope.resolve::<ScopedService>().unwrap();
            black_box(service.data.len());
            scope.close();
        })
    });

    group.finish();
}

fn bench_chain_depth(c: &mut Criterion) {
    struct Service1;
    struct Service2 {
        _s1: Arc<Service1>,
    }
    struct Service3 {
        _s2: Arc<Service2>,
    }
    struct Service4 {
        _s3: Arc<Service3>,
    }
    struct Service5 {
        _s4: Arc<Service4>,
    }
    struct Service6 {
        _s5: Arc<Service5>,
    }
    struct Service7 {
        _s6: Arc<Service6>,
    }
    struct Service8 {
        _s7: Arc<Service7>,
    }

    let container = Container::new();
    container.register(Definition::singleton(|_| Service1)).unwrap();
    container
        .register(Definition::factory(|ctx| Service2 {
            _s1: ctx.get().unwrap(),
        }))
        .unwrap();
    container
        .register(Definition::factory(|ctx| Service3 {
            _s2: ctx.get().unwrap(),
        }))
        .unwrap();
    container
        .register(Definition::factory(|ctx| Service4 {
            _s3: ctx.get().unwrap(),
        }))
        .unwrap();
    container
        .register(Definition::factory(|ctx| Service5 {
            _s4: ctx.get().unwrap(),
        }))
        .unwrap();
    container
        .register(Definition::factory(|ctx| Service6 {
            _s5: ctx.get().unwrap(),
        }))
        .unwrap();
    container
        .register(Definition::factory(|ctx| Service7 {
            _s6: ctx.get().unwrap(),
        }))
        .unwrap();
    container
        .register(Definition::factory(|ctx| Service8 {
            _s7: ctx.get().unwrap(),
        }))
        .unwrap();

    c.bench_function("chain_depth_8", |b| {
        b.iter(|| {
            let service = container.resolve::<Service8>().unwrap();
            black_box(&service);
        })
    });
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    let container = Container::new();
    container.register(Definition::instance(42u64)).unwrap();

    // Prime the singleton
    let _ = container.resolve::<u64>().unwrap();

    for &thread_count in &[1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("singleton_threads", thread_count),
            &thread_count,
            |b, &threads| {
                b.iter_custom(|iters| {
                    let start = std::time::Instant::now();
                    crossbeam_utils::thread::scope(|s| {
                        for _ in 0..threads {
                            let container_ref = &container;
                            s.spawn(move |_| {
                                for _ in 0..iters / threads as u64 {
                                    let v = container_ref.resolve::<u64>().unwrap();
                                    black_box(v);
                                }
                            });
                        }
                    })
                    .unwrap();
                    start.elapsed()
                })
            },
        );
    }

    group.finish();
}

// ===== Macro Benchmarks =====

fn bench_large_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_registry");

    for &filler_count in &[10, 100, 1000] {
        let container = Container::new();
        container.register(Definition::instance(42u64)).unwrap();

        // Pad the registry with dynamic filler keys so the lookup table
        // actually grows with the parameter.
        for i in 0..filler_count {
            let name: &'static str = Box::leak(format!("filler_{}", i).into_boxed_str());
            container
                .register(Definition::dynamic(
                    ingot_di::Key::Trait(name),
                    ingot_di::Lifetime::Factory,
                    |_| Ok(Arc::new(0u8) as ingot_di::AnyArc),
                ))
                .unwrap();
        }

        group.bench_with_input(
            BenchmarkId::new("resolve_from_large_registry", filler_count),
            &filler_count,
            |b, _| {
                b.iter(|| {
                    let v = container.resolve::<u64>().unwrap();
                    black_box(v);
                })
            },
        );
    }

    group.finish();
}

fn bench_mixed_workload(c: &mut Criterion) {
    // Realistic mix: 70% singleton hits, 20% scoped hits, 10% factory calls.
    struct SingletonService(u64);
    struct ScopedService(u64);
    struct FactoryService(u64);

    let container = Container::new();
    container
        .register(Definition::instance(SingletonService(1)))
        .unwrap();
    container
        .register(Definition::scoped(Qualifier::name("request"), |_| {
            ScopedService(2)
        }))
        .unwrap();
    container
        .register(Definition::factory(|_| FactoryService(3)))
        .unwrap();

    let scope = container
        .create_scope(Qualifier::name("request"), "bench")
        .unwrap();

    // Prime the caches
    let _ = container.resolve::<SingletonService>().unwrap();
    let _ = scope.resolve::<ScopedService>().unwrap();

    c.bench_function("mixed_workload_realistic", |b| {
        b.iter(|| {
            for _ in 0..7 {
                let v = container.resolve::<SingletonService>().unwrap();
                black_box(v.0);
            }

            for _ in 0..2 {
                let v = scope.resolve::<ScopedService>().unwrap();
                black_box(v.0);
            }

            let v = container.resolve::<FactoryService>().unwrap();
            black_box(v.0);
        })
    });
}

criterion_group!(
    micro_benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_scoped_vs_factory,
    bench_concrete_vs_trait,
    bench_declared_vs_inferred_shape,
    bench_scope_lifecycle,
    bench_chain_depth,
    bench_contention
);

criterion_group!(macro_benches, bench_large_registry, bench_mixed_workload);

criterion_main!(micro_benches, macro_benches);
