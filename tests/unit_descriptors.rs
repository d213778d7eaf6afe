use ferrous_factory::{
    key_of_trait, key_of_type, Constructor, ContainerOptions, DiError, DiObserver, CompiledFactory, Injectable, Key,
    Lifetime, LoggingObserver, RegistrationMode, Resolver, ServiceCollection, ValidationWarning,
};
use std::any::TypeId;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Service Descriptor and Validation Tests =====

trait Store: Send + Sync {}

struct Memory;
impl Store for Memory {}
impl Injectable for Memory {
    fn constructors() -> Vec<Constructor> {
        vec![
            Constructor::of::<Self>().build(|_| Ok(Memory)),
            Constructor::of::<Self>().arg_value::<u32>().build(|_| Ok(Memory)),
        ]
    }
}

struct Fresh;
impl Injectable for Fresh {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>().build(|_| Ok(Fresh))]
    }
}

struct Holder;
impl Injectable for Holder {
    fn constructors() -> Vec<Constructor> {
        vec![Constructor::of::<Self>().arg::<Fresh>().build(|_| Ok(Holder))]
    }
}

#[test]
fn test_service_descriptors_basic() {
    let mut services = ServiceCollection::new();
    services.add_instance(42usize).unwrap();
    services.add_transient::<Fresh>().unwrap();
    services.add_named_singleton_trait::<dyn Store, Memory>("mem", |m| m as Arc<dyn Store>).unwrap();

    let descriptors = services.get_service_descriptors();
    assert_eq!(descriptors.len(), 3);

    let usize_desc = &descriptors[0];
    assert_eq!(usize_desc.key, key_of_type::<usize>());
    assert_eq!(usize_desc.lifetime, Lifetime::Singleton);
    assert_eq!(usize_desc.impl_type_id, TypeId::of::<usize>());
    assert!(usize_desc.is_instance);
    assert!(!usize_desc.is_named());

    let fresh_desc = &descriptors[1];
    assert_eq!(fresh_desc.lifetime, Lifetime::Transient);
    assert!(!fresh_desc.is_instance);
    assert_eq!(fresh_desc.constructor_count, 1);

    let store_desc = &descriptors[2];
    assert!(store_desc.is_trait());
    assert_eq!(store_desc.service_name(), Some("mem"));
    assert_eq!(store_desc.impl_type_id, TypeId::of::<Memory>());
    assert_eq!(store_desc.constructor_count, 2);
    assert_eq!(store_desc.key, key_of_trait::<dyn Store>().with_name("mem"));

    // The provider exposes the same snapshot
    let provider = services.build();
    assert_eq!(provider.descriptors().len(), 3);
}

#[test]
fn test_validation_flags_captive_transient() {
    let mut services = ServiceCollection::new();
    services.add_transient::<Fresh>().unwrap();
    services.add_singleton::<Holder>().unwrap();

    let report = services.validate();
    assert!(report.is_valid());
    assert!(report.has_warnings());
    assert!(matches!(
        &report.warnings[0],
        ValidationWarning::SingletonCapturesTransient { singleton, transient }
            if *singleton == key_of_type::<Holder>() && *transient == key_of_type::<Fresh>()
    ));
}

#[test]
fn test_validation_clean_container() {
    let mut services = ServiceCollection::new();
    services.add_singleton::<Fresh>().unwrap();
    services.add_transient::<Holder>().unwrap();

    let report = services.validate();
    assert!(report.is_valid());
    assert!(!report.has_warnings());
    assert_eq!(report.format_issues(), "");
}

#[test]
fn test_strict_registration_error_message() {
    let mut services =
        ServiceCollection::with_options(ContainerOptions::new().registration_mode(RegistrationMode::Strict));
    services.add_instance(1u8).unwrap();
    let err = services.add_instance(2u8).err().unwrap();
    assert_eq!(err, DiError::AlreadyRegistered("u8"));
    assert_eq!(err.to_string(), "Service already registered: u8");
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl DiObserver for Recorder {
    fn compiled(&self, key: &Key, factory: &CompiledFactory, _: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("compiled {} nodes={}", key, factory.node_count()));
    }

    fn resolved(&self, key: &Key, _: Duration) {
        self.events.lock().unwrap().push(format!("resolved {}", key));
    }

    fn compile_failed(&self, key: &Key, error: &DiError) {
        self.events.lock().unwrap().push(format!("failed {} {}", key, error));
    }
}

#[test]
fn test_observer_sees_compile_and_resolve() {
    struct Broken;
    impl Injectable for Broken {
        fn constructors() -> Vec<Constructor> {
            Vec::new()
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let recorder = Arc::new(Recorder::default());
    let mut services = ServiceCollection::new();
    services.add_instance(5u8).unwrap();
    services.add_transient::<Broken>().unwrap();
    services.add_observer(recorder.clone());
    services.add_observer(Arc::new(LoggingObserver::new()));
    let provider = services.build();

    provider.get_required::<u8>();
    provider.get_required::<u8>();
    assert!(provider.get_instance::<Broken>().is_err());

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events[0], "compiled u8 nodes=1");
    assert_eq!(events[1], "resolved u8");
    assert_eq!(events[2], "resolved u8");
    assert!(events[3].starts_with("failed "));
    assert!(events[3].contains("No usable constructor"));
    assert_eq!(events.len(), 4);
}
