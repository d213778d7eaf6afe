/// Concurrent access integration tests
///
/// These tests verify that racing first resolutions compile each factory
/// once and construct each singleton once, and that a provider can be
/// shared freely across threads.

use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection, ServiceProvider};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

static SLOW_BUILT: AtomicUsize = AtomicUsize::new(0);

struct SlowSingleton;
impl Injectable for SlowSingleton {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>().build(|_| {
            SLOW_BUILT.fetch_add(1, Ordering::SeqCst);
            // Widen the race window
            thread::sleep(Duration::from_millis(20));
            Ok(SlowSingleton)
        })]
    }
}

struct Consumer {
    dep: Arc<SlowSingleton>,
}
impl Injectable for Consumer {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>()
            .arg::<SlowSingleton>()
            .build(|args| Ok(Consumer { dep: args.required()? }))]
    }
}

fn provider() -> ServiceProvider {
    let mut sc = ServiceCollection::new();
    sc.add_singleton::<SlowSingleton>().unwrap();
    sc.add_transient::<Consumer>().unwrap();
    sc.build()
}

#[test]
fn test_singleton_constructed_once_under_contention() {
    const THREADS: usize = 50;
    let sp = provider();
    let barrier = Arc::new(Barrier::new(THREADS));
    let before = SLOW_BUILT.load(Ordering::SeqCst);

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let sp = sp.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                // Half the threads enter through the dependent root
                if i % 2 == 0 {
                    sp.get_required::<SlowSingleton>()
                } else {
                    sp.get_required::<Consumer>().dep.clone()
                }
            })
        })
        .collect();

    let results: Vec<Arc<SlowSingleton>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(SLOW_BUILT.load(Ordering::SeqCst) - before, 1);
    for result in &results[1..] {
        assert!(Arc::ptr_eq(&results[0], result));
    }
    assert_eq!(sp.compilations(), 2);
}

#[test]
fn test_scoped_threads_share_provider_by_reference() {
    let mut sc = ServiceCollection::new();
    sc.add_instance(AtomicUsize::new(0)).unwrap();
    let sp = sc.build();

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|_| {
                for _ in 0..100 {
                    sp.get_required::<AtomicUsize>().fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    })
    .unwrap();

    assert_eq!(sp.get_required::<AtomicUsize>().load(Ordering::SeqCst), 800);
    assert_eq!(sp.compilations(), 1);
}

#[test]
fn test_concurrent_first_compilation_of_many_roots() {
    struct Leaf;
    impl Injectable for Leaf {
        fn constructors() -> Vec<Constructor> {
            vec![Constructor::of::<Self>().build(|_| Ok(Leaf))]
        }
    }

    let mut sc = ServiceCollection::new();
    for name in ["a", "b", "c", "d", "e", "f", "g", "h"] {
        sc.add_named_transient::<Leaf>(name).unwrap();
    }
    let sp = sc.build();
    let barrier = Barrier::new(16);

    crossbeam_utils::thread::scope(|s| {
        for _ in 0..16 {
            s.spawn(|_| {
                barrier.wait();
                for name in ["a", "b", "c", "d", "e", "f", "g", "h"] {
                    sp.get_named_instance::<Leaf>(name).unwrap();
                }
            });
        }
    })
    .unwrap();

    assert_eq!(sp.compilations(), 8);
}

#[test]
fn test_racing_compilations_share_one_factory() {
    let sp = provider();
    let key = ferrous_factory::key_of_type::<Consumer>();
    let barrier = Barrier::new(2);

    let (a, b) = crossbeam_utils::thread::scope(|s| {
        let first = s.spawn(|_| {
            barrier.wait();
            sp.compiled(&key).unwrap()
        });
        let second = s.spawn(|_| {
            barrier.wait();
            sp.compiled(&key).unwrap()
        });
        (first.join().unwrap(), second.join().unwrap())
    })
    .unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(sp.compilations(), 1);
}

#[test]
fn test_provider_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ServiceProvider>();
    assert_send_sync::<ferrous_factory::CompiledFactory>();
}
