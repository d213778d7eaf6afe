//! Long dependency chains against the depth limit.

use ferrous_factory::config::DEFAULT_MAX_DEPTH;
use ferrous_factory::{key_of_type, Constructor, ContainerOptions, DiError, Lifetime, Resolver, ServiceCollection};

struct Link {
    below: usize,
}

/// Registers `length` named links, each depending on the next; returns the head's name.
fn chain(sc: &mut ServiceCollection, length: usize) -> &'static str {
    let names: Vec<&'static str> = (0..length)
        .map(|i| &*Box::leak(format!("link{}", i).into_boxed_str()))
        .collect();

    for (i, &name) in names.iter().enumerate() {
        let ctor = match names.get(i + 1) {
            Some(&next) => Constructor::of::<Link>()
                .arg_named::<Link>(next)
                .build(|args| Ok(Link { below: args.required::<Link>()?.below + 1 })),
            None => Constructor::of::<Link>().build(|_| Ok(Link { below: 0 })),
        };
        sc.add_named_with::<Link>(name, Lifetime::Transient, vec![ctor]).unwrap();
    }
    names[0]
}

#[test]
fn test_chain_just_under_limit_resolves() {
    let mut sc = ServiceCollection::new();
    let head = chain(&mut sc, DEFAULT_MAX_DEPTH - 1);
    let sp = sc.build();

    let link = sp.get_named_instance::<Link>(head).unwrap();
    assert_eq!(link.below, DEFAULT_MAX_DEPTH - 2);
}

#[test]
fn test_chain_at_limit_resolves() {
    let mut sc = ServiceCollection::new();
    let head = chain(&mut sc, DEFAULT_MAX_DEPTH);
    let sp = sc.build();

    let plan = sp.plan(&key_of_type::<Link>().with_name(head)).unwrap();
    assert_eq!(plan.nodes().len(), DEFAULT_MAX_DEPTH);
    assert_eq!(sp.get_named_instance::<Link>(head).unwrap().below, DEFAULT_MAX_DEPTH - 1);
}

#[test]
fn test_chain_past_limit_fails_with_depth_error() {
    let mut sc = ServiceCollection::new();
    let head = chain(&mut sc, DEFAULT_MAX_DEPTH + 1);
    let sp = sc.build();

    assert_eq!(
        sp.get_named_instance::<Link>(head).err(),
        Some(DiError::DepthExceeded(DEFAULT_MAX_DEPTH))
    );
    assert_eq!(sp.compilations(), 0);
}

#[test]
fn test_runaway_chain_fails_without_exhausting_stack() {
    let mut sc = ServiceCollection::new();
    let head = chain(&mut sc, DEFAULT_MAX_DEPTH * 4);
    let sp = sc.build();

    assert!(matches!(
        sp.get_named_instance::<Link>(head),
        Err(DiError::DepthExceeded(depth)) if depth == DEFAULT_MAX_DEPTH
    ));
}

#[test]
fn test_configured_limit_applies() {
    let mut sc = ServiceCollection::with_options(ContainerOptions::new().max_depth(8));
    let head = chain(&mut sc, 9);
    let sp = sc.build();

    assert_eq!(sp.get_named_instance::<Link>(head).err(), Some(DiError::DepthExceeded(8)));
}
