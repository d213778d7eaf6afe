//! Named services, trait-object services and multi-resolution.

use ferrous_factory::{Constructor, DiError, Injectable, Registrar, Resolver, ServiceCollection};
use std::sync::Arc;

trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;
}

struct Email;
struct Sms;

impl Notifier for Email {
    fn channel(&self) -> &'static str {
        "email"
    }
}
impl Notifier for Sms {
    fn channel(&self) -> &'static str {
        "sms"
    }
}
impl Injectable for Email {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>().build(|_| Ok(Email))]
    }
}
impl Injectable for Sms {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>().build(|_| Ok(Sms))]
    }
}

struct Dispatcher {
    primary: Arc<dyn Notifier>,
    backup: Option<Arc<dyn Notifier>>,
}

impl Injectable for Dispatcher {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>()
            .arg_trait::<dyn Notifier>()
            .arg_named_trait::<dyn Notifier>("backup")
            .build(|args| {
                Ok(Dispatcher {
                    primary: args.required_trait()?,
                    backup: args.next_trait()?,
                })
            })]
    }
}

#[test]
fn test_trait_singleton_and_transient() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn Notifier, Email>(|it| it as Arc<dyn Notifier>).unwrap();
    sc.add_named_transient_trait::<dyn Notifier, Sms>("backup", |it| it as Arc<dyn Notifier>)
        .unwrap();
    let sp = sc.build();

    let a = sp.get_trait::<dyn Notifier>().unwrap();
    let b = sp.get_trait::<dyn Notifier>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.channel(), "email");

    let c = sp.get_named_trait::<dyn Notifier>("backup").unwrap();
    let d = sp.get_named_trait::<dyn Notifier>("backup").unwrap();
    assert!(!Arc::ptr_eq(&c, &d));
    assert_eq!(c.channel(), "sms");
}

#[test]
fn test_trait_dependencies_are_injected() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_trait::<dyn Notifier, Email>(|it| it as Arc<dyn Notifier>).unwrap();
    sc.add_transient::<Dispatcher>().unwrap();
    let sp = sc.build();

    let dispatcher = sp.get_required::<Dispatcher>();
    assert_eq!(dispatcher.primary.channel(), "email");
    assert!(dispatcher.backup.is_none());

    let primary = sp.get_required_trait::<dyn Notifier>();
    assert!(Arc::ptr_eq(&primary, &dispatcher.primary));
}

#[test]
fn test_trait_instance() {
    let mut sc = ServiceCollection::new();
    sc.add_trait_instance::<dyn Notifier>(Arc::new(Sms)).unwrap();
    sc.add_named_trait_instance::<dyn Notifier>("backup", Arc::new(Email)).unwrap();
    sc.add_transient::<Dispatcher>().unwrap();
    let sp = sc.build();

    let dispatcher = sp.get_required::<Dispatcher>();
    assert_eq!(dispatcher.primary.channel(), "sms");
    assert_eq!(dispatcher.backup.as_ref().map(|n| n.channel()), Some("email"));
}

#[test]
fn test_named_instances_are_distinct() {
    let mut sc = ServiceCollection::new();
    sc.add_named_instance("port", 8080u16).unwrap();
    sc.add_named_instance("admin_port", 9090u16).unwrap();
    let sp = sc.build();

    assert_eq!(*sp.get_named_instance::<u16>("port").unwrap(), 8080);
    assert_eq!(*sp.get_named_instance::<u16>("admin_port").unwrap(), 9090);
    assert!(matches!(sp.get_instance::<u16>(), Err(DiError::NotFound("u16"))));
    assert!(sp.is_registered_named::<u16>("port"));
    assert!(!sp.is_registered::<u16>());
}

#[test]
fn test_get_all_in_registration_order() {
    let mut sc = ServiceCollection::new();
    sc.add_named_singleton_trait::<dyn Notifier, Sms>("sms", |it| it as Arc<dyn Notifier>)
        .unwrap();
    sc.add_singleton_trait::<dyn Notifier, Email>(|it| it as Arc<dyn Notifier>).unwrap();
    sc.add_instance(5u8).unwrap();
    let sp = sc.build();

    let channels: Vec<_> = sp
        .get_all_trait_instances::<dyn Notifier>()
        .unwrap()
        .iter()
        .map(|n| n.channel())
        .collect();
    assert_eq!(channels, vec!["sms", "email"]);

    assert!(sp.get_all_instances::<u64>().unwrap().is_empty());
    assert!(sp.is_registered_trait::<dyn Notifier>());
}

#[test]
fn test_registrar_surface() {
    let mut sc = ServiceCollection::new();
    sc.register_single_instance::<Email>(None)
        .unwrap()
        .register_instance::<Sms>(Some("fast"))
        .unwrap()
        .register_single_instance_as::<dyn Notifier, Email>(None, |it| it as Arc<dyn Notifier>)
        .unwrap();
    let sp = sc.build();

    assert!(Arc::ptr_eq(&sp.get_required::<Email>(), &sp.get_required::<Email>()));
    assert!(sp.get_named_instance::<Sms>("fast").is_ok());
    assert_eq!(sp.get_required_trait::<dyn Notifier>().channel(), "email");
}

#[test]
fn test_registrar_transient_trait_is_cast_per_resolution() {
    let mut sc = ServiceCollection::new();
    sc.register_instance_as::<dyn Notifier, Sms>(Some("backup"), |it| it as Arc<dyn Notifier>)
        .unwrap()
        .register_single_instance_as::<dyn Notifier, Email>(None, |it| it as Arc<dyn Notifier>)
        .unwrap()
        .register_instance::<Dispatcher>(None)
        .unwrap();
    let sp = sc.build();

    let first = sp.get_required::<Dispatcher>();
    let second = sp.get_required::<Dispatcher>();
    assert!(Arc::ptr_eq(&first.primary, &second.primary));
    assert!(Arc::ptr_eq(&first.primary, &sp.get_required_trait::<dyn Notifier>()));

    let (a, b) = (first.backup.as_ref().unwrap(), second.backup.as_ref().unwrap());
    assert_eq!(a.channel(), "sms");
    assert!(!Arc::ptr_eq(a, b));
}
