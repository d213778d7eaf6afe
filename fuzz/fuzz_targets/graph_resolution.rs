#![no_main]

use ferrous_factory::{
    Constructor, ContainerOptions, DiError, Lifetime, MissingDependencyPolicy, Parameter, Resolver, ResolverCore,
    ServiceCollection,
};
use libfuzzer_sys::fuzz_target;

struct Slot<const N: usize>;

fn param(index: u8) -> Parameter {
    match index % 4 {
        0 => Parameter::service::<Slot<0>>(),
        1 => Parameter::service::<Slot<1>>(),
        2 => Parameter::service::<Slot<2>>(),
        _ => Parameter::service::<Slot<3>>(),
    }
}

fn ctor<const N: usize>(deps: &[u8]) -> Constructor {
    deps.iter()
        .fold(Constructor::of::<Slot<N>>(), |builder, &dep| builder.param(param(dep)))
        .build(|_| Ok(Slot::<N>))
}

// Arbitrary graphs over four types, cycles included: resolution must
// either succeed or fail with a planning error, never panic or hang.
fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }

    let policy = if data[0] & 1 == 0 {
        MissingDependencyPolicy::Default
    } else {
        MissingDependencyPolicy::Error
    };
    let mut services = ServiceCollection::with_options(ContainerOptions::new().missing_dependency(policy));

    for (index, chunk) in data[1..].chunks(3).take(4).enumerate() {
        let lifetime = if chunk[0] & 1 == 0 { Lifetime::Singleton } else { Lifetime::Transient };
        let deps = &chunk[1..];
        let result = match index {
            0 => services.add_with::<Slot<0>>(lifetime, vec![ctor::<0>(deps)]),
            1 => services.add_with::<Slot<1>>(lifetime, vec![ctor::<1>(deps)]),
            2 => services.add_with::<Slot<2>>(lifetime, vec![ctor::<2>(deps)]),
            _ => services.add_with::<Slot<3>>(lifetime, vec![ctor::<3>(deps)]),
        };
        if result.is_err() {
            return;
        }
    }

    let provider = services.build();
    for key in provider.descriptors().into_iter().map(|d| d.key) {
        match provider.resolve_any(&key) {
            Ok(_) | Err(DiError::Circular(_)) | Err(DiError::MissingDependency { .. }) => {}
            Err(other) => panic!("unexpected error for {}: {}", key, other),
        }
    }
    let _ = provider.get_all_instances::<Slot<0>>();
});
