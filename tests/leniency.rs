//! Missing-dependency handling under both policies.

use ferrous_factory::{
    key_of_type, Constructor, ContainerOptions, DiError, Injectable, MissingDependencyPolicy, NodeSource, Resolver,
    ServiceCollection, ValidationWarning,
};
use std::sync::Arc;

struct Mailer;

struct Signup {
    mailer: Option<Arc<Mailer>>,
    retries: u32,
    region: String,
}

impl Injectable for Signup {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>()
            .arg::<Mailer>()
            .arg_value::<u32>()
            .arg_value::<String>()
            .build(|args| {
                Ok(Signup {
                    mailer: args.next()?,
                    retries: args.value()?,
                    region: args.value()?,
                })
            })]
    }
}

#[test]
fn test_unregistered_dependencies_are_defaulted() {
    let mut sc = ServiceCollection::new();
    sc.add_transient::<Signup>().unwrap();
    let sp = sc.build();

    let signup = sp.get_required::<Signup>();
    assert!(signup.mailer.is_none());
    assert_eq!(signup.retries, 0);
    assert_eq!(signup.region, "");
}

#[test]
fn test_registered_value_overrides_default() {
    let mut sc = ServiceCollection::new();
    sc.add_transient::<Signup>().unwrap();
    sc.add_instance(3u32).unwrap();
    sc.add_instance("eu-west".to_string()).unwrap();
    sc.add_instance(Mailer).unwrap();
    let sp = sc.build();

    let signup = sp.get_required::<Signup>();
    assert!(signup.mailer.is_some());
    assert_eq!(signup.retries, 3);
    assert_eq!(signup.region, "eu-west");
}

#[test]
fn test_defaulted_nodes_appear_in_plan() {
    let mut sc = ServiceCollection::new();
    sc.add_transient::<Signup>().unwrap();
    let sp = sc.build();

    let plan = sp.plan(&key_of_type::<Signup>()).unwrap();
    let defaulted: Vec<_> = plan.nodes().iter().filter(|n| n.is_defaulted()).collect();
    assert_eq!(defaulted.len(), 3);
    assert!(defaulted.iter().all(|n| matches!(n.source(), NodeSource::Defaulted(_))));
    assert_eq!(plan.constructor_calls(), 1);
}

#[test]
fn test_strict_policy_rejects_missing_dependency() {
    let options = ContainerOptions::default().missing_dependency(MissingDependencyPolicy::Error);
    let mut sc = ServiceCollection::with_options(options);
    sc.add_transient::<Signup>().unwrap();
    let sp = sc.build();

    match sp.get_instance::<Signup>() {
        Err(DiError::MissingDependency { service, dependency }) => {
            assert!(service.ends_with("Signup"));
            assert!(dependency.ends_with("Mailer"));
        }
        other => panic!("expected MissingDependency, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_root_is_always_required() {
    let sp = ServiceCollection::new().build();
    assert!(matches!(sp.get_instance::<Signup>(), Err(DiError::NotFound(_))));
}

#[test]
fn test_validation_warns_about_defaults() {
    let mut sc = ServiceCollection::new();
    sc.add_transient::<Signup>().unwrap();

    let report = sc.validate();
    assert!(report.is_valid());
    let defaulted = report
        .warnings
        .iter()
        .filter(|w| matches!(w, ValidationWarning::DefaultedDependency { .. }))
        .count();
    assert_eq!(defaulted, 3);
}
