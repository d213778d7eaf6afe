//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type, the registration side
//! of the container.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use tracing::trace;

use crate::config::ContainerOptions;
use crate::constructor::{Constructor, Injectable};
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registration::{Caster, Registry, ServiceRegistration};
use crate::traits::Registrar;
use crate::validation::ValidationReport;
use crate::ServiceProvider;

/// Registration surface of the container.
///
/// Registrations are collected here and frozen by [`build`](Self::build),
/// which moves them into an immutable [`ServiceProvider`]. Because
/// registering requires `&mut ServiceCollection` and the provider owns no
/// collection, registering while resolutions are in flight cannot be
/// expressed.
///
/// By default a repeated registration for the same key replaces the earlier
/// one. Use [`RegistrationMode::Strict`](crate::RegistrationMode::Strict)
/// to reject it instead.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database {
///     url: String,
/// }
///
/// struct UserService {
///     db: Arc<Database>,
/// }
///
/// impl Injectable for UserService {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>()
///             .arg::<Database>()
///             .build(|args| Ok(UserService { db: args.required::<Database>()? }))]
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_instance(Database { url: "postgres://localhost".to_string() }).unwrap();
/// collection.add_transient::<UserService>().unwrap();
///
/// let provider = collection.build();
/// let user_service = provider.get_required::<UserService>();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// ```
pub struct ServiceCollection {
    registry: Registry,
    options: ContainerOptions,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates a new empty service collection with the given options.
    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            registry: Registry::new(),
            options,
            observers: Observers::new(),
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    // ----- Concrete Type Registrations -----

    /// Registers `I` as a singleton: one instance per container, built on first use.
    pub fn add_singleton<I: Injectable>(&mut self) -> DiResult<&mut Self> {
        self.register::<I>(key_of_type::<I>(), Lifetime::Singleton, I::constructors(), None)
    }

    /// Registers `I` as a transient: a new instance at every use.
    pub fn add_transient<I: Injectable>(&mut self) -> DiResult<&mut Self> {
        self.register::<I>(key_of_type::<I>(), Lifetime::Transient, I::constructors(), None)
    }

    pub fn add_named_singleton<I: Injectable>(&mut self, name: &'static str) -> DiResult<&mut Self> {
        self.register::<I>(key_of_type::<I>().with_name(name), Lifetime::Singleton, I::constructors(), None)
    }

    pub fn add_named_transient<I: Injectable>(&mut self, name: &'static str) -> DiResult<&mut Self> {
        self.register::<I>(key_of_type::<I>().with_name(name), Lifetime::Transient, I::constructors(), None)
    }

    /// Registers `I` with explicitly supplied constructors.
    ///
    /// Useful for types that do not implement [`Injectable`], such as
    /// foreign types. Every constructor must build `I`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_factory::{Constructor, Lifetime, Resolver, ServiceCollection};
    ///
    /// let mut services = ServiceCollection::new();
    /// services
    ///     .add_with::<String>(
    ///         Lifetime::Transient,
    ///         vec![Constructor::of::<String>().build(|_| Ok("hello".to_string()))],
    ///     )
    ///     .unwrap();
    ///
    /// let provider = services.build();
    /// assert_eq!(*provider.get_required::<String>(), "hello");
    /// ```
    pub fn add_with<I: Send + Sync + 'static>(
        &mut self,
        lifetime: Lifetime,
        constructors: Vec<Constructor>,
    ) -> DiResult<&mut Self> {
        check_constructors::<I>(&constructors)?;
        self.register::<I>(key_of_type::<I>(), lifetime, constructors, None)
    }

    pub fn add_named_with<I: Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        lifetime: Lifetime,
        constructors: Vec<Constructor>,
    ) -> DiResult<&mut Self> {
        check_constructors::<I>(&constructors)?;
        self.register::<I>(key_of_type::<I>().with_name(name), lifetime, constructors, None)
    }

    /// Registers a pre-built value as a singleton.
    pub fn add_instance<T: Send + Sync + 'static>(&mut self, value: T) -> DiResult<&mut Self> {
        let registration = ServiceRegistration::instance(key_of_type::<T>(), Arc::new(value), None)?;
        self.insert(registration)
    }

    pub fn add_named_instance<T: Send + Sync + 'static>(&mut self, name: &'static str, value: T) -> DiResult<&mut Self> {
        let registration = ServiceRegistration::instance(key_of_type::<T>().with_name(name), Arc::new(value), None)?;
        self.insert(registration)
    }

    // ----- Trait Registrations -----

    /// Registers `I` as the singleton implementation of the trait-object service `S`.
    ///
    /// `cast` converts the built `Arc<I>` into `Arc<S>`; for a trait object
    /// it is usually `|it| it as Arc<dyn Trait>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// trait Greeter: Send + Sync {
    ///     fn greet(&self) -> String;
    /// }
    ///
    /// struct English;
    /// impl Greeter for English {
    ///     fn greet(&self) -> String {
    ///         "hello".to_string()
    ///     }
    /// }
    /// impl Injectable for English {
    ///     fn constructors() -> Vec<Constructor> {
    ///         vec![Constructor::of::<Self>().build(|_| Ok(English))]
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services
    ///     .add_singleton_trait::<dyn Greeter, English>(|it| it as Arc<dyn Greeter>)
    ///     .unwrap();
    ///
    /// let provider = services.build();
    /// let a = provider.get_trait::<dyn Greeter>().unwrap();
    /// let b = provider.get_trait::<dyn Greeter>().unwrap();
    /// assert_eq!(a.greet(), "hello");
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn add_singleton_trait<S, I>(
        &mut self,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register_trait::<S, I, _>(None, Lifetime::Singleton, cast)
    }

    /// Registers `I` as a transient implementation of the trait-object service `S`.
    pub fn add_transient_trait<S, I>(
        &mut self,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register_trait::<S, I, _>(None, Lifetime::Transient, cast)
    }

    pub fn add_named_singleton_trait<S, I>(
        &mut self,
        name: &'static str,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register_trait::<S, I, _>(Some(name), Lifetime::Singleton, cast)
    }

    pub fn add_named_transient_trait<S, I>(
        &mut self,
        name: &'static str,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register_trait::<S, I, _>(Some(name), Lifetime::Transient, cast)
    }

    /// Registers a pre-built trait object as a singleton.
    pub fn add_trait_instance<S: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<S>) -> DiResult<&mut Self> {
        // Stored as Arc<Arc<dyn Trait>>, the trait-service representation
        let registration = ServiceRegistration::instance(key_of_trait::<S>(), Arc::new(value), None)?;
        self.insert(registration)
    }

    pub fn add_named_trait_instance<S: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        value: Arc<S>,
    ) -> DiResult<&mut Self> {
        let registration = ServiceRegistration::instance(key_of_trait::<S>().with_name(name), Arc::new(value), None)?;
        self.insert(registration)
    }

    // ----- Observers, introspection, validation -----

    /// Adds a diagnostic observer notified on compilation and resolution.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Snapshot of every registration, in registration order.
    pub fn get_service_descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut registrations: Vec<_> = self.registry.iter().map(|(_, reg)| reg).collect();
        registrations.sort_by_key(|reg| reg.sequence);
        registrations.into_iter().map(|reg| ServiceDescriptor::of(reg)).collect()
    }

    /// Whether a registration exists for exactly this key.
    pub fn contains(&self, key: &Key) -> bool {
        self.registry.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a plan for every registration and reports problems.
    ///
    /// Nothing is constructed and nothing is compiled.
    pub fn validate(&self) -> ValidationReport {
        ValidationReport::run(&self.registry, &self.options)
    }

    /// Freezes the registrations into a [`ServiceProvider`].
    pub fn build(mut self) -> ServiceProvider {
        self.registry.finalize();
        ServiceProvider::new(self.registry, self.options, self.observers)
    }

    fn register_trait<S, I, F>(
        &mut self,
        name: Option<&'static str>,
        lifetime: Lifetime,
        cast: F,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
        F: Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    {
        let key = match name {
            Some(name) => key_of_trait::<S>().with_name(name),
            None => key_of_trait::<S>(),
        };
        self.register::<I>(key, lifetime, I::constructors(), Some(Caster::new::<S, I, F>(cast)))
    }

    fn register<I: Send + Sync + 'static>(
        &mut self,
        key: Key,
        lifetime: Lifetime,
        constructors: Vec<Constructor>,
        cast: Option<Caster>,
    ) -> DiResult<&mut Self> {
        self.insert(ServiceRegistration::new::<I>(key, lifetime, constructors, cast))
    }

    fn insert(&mut self, registration: ServiceRegistration) -> DiResult<&mut Self> {
        trace!(
            service = %registration.key(),
            implementation = registration.implementation_name(),
            lifetime = registration.lifetime().as_str(),
            "registering service"
        );
        self.registry.insert(registration, self.options.registration_mode)?;
        Ok(self)
    }
}

fn check_constructors<I: 'static>(constructors: &[Constructor]) -> DiResult<()> {
    match constructors.iter().find(|ctor| ctor.implementation_id() != TypeId::of::<I>()) {
        Some(_) => Err(DiError::TypeMismatch(type_name::<I>())),
        None => Ok(()),
    }
}

impl Registrar for ServiceCollection {
    fn register_single_instance<I: Injectable>(&mut self, name: Option<&'static str>) -> DiResult<&mut Self> {
        match name {
            Some(name) => self.add_named_singleton::<I>(name),
            None => self.add_singleton::<I>(),
        }
    }

    fn register_instance<I: Injectable>(&mut self, name: Option<&'static str>) -> DiResult<&mut Self> {
        match name {
            Some(name) => self.add_named_transient::<I>(name),
            None => self.add_transient::<I>(),
        }
    }

    fn register_single_instance_as<S, I>(
        &mut self,
        name: Option<&'static str>,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register_trait::<S, I, _>(name, Lifetime::Singleton, cast)
    }

    fn register_instance_as<S, I>(
        &mut self,
        name: Option<&'static str>,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable,
    {
        self.register_trait::<S, I, _>(name, Lifetime::Transient, cast)
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistrationMode;

    struct Widget;
    impl Injectable for Widget {
        fn constructors() -> Vec<Constructor> {
            vec![Constructor::of::<Self>().build(|_| Ok(Widget))]
        }
    }

    #[test]
    fn test_strict_mode_rejects_second_registration() {
        let mut services = ServiceCollection::with_options(
            ContainerOptions::default().registration_mode(RegistrationMode::Strict),
        );
        services.add_singleton::<Widget>().unwrap();
        let err = services.add_transient::<Widget>().err().unwrap();
        assert!(matches!(err, DiError::AlreadyRegistered(name) if name.ends_with("Widget")));

        // Named registrations are distinct keys
        services.add_named_transient::<Widget>("other").unwrap();
        assert_eq!(services.len(), 2);
    }

    #[test]
    fn test_replace_mode_keeps_last() {
        let mut services = ServiceCollection::new();
        services.add_singleton::<Widget>().unwrap();
        services.add_transient::<Widget>().unwrap();

        let descriptors = services.get_service_descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].lifetime, Lifetime::Transient);
    }

    #[test]
    fn test_foreign_constructor_rejected() {
        let mut services = ServiceCollection::new();
        let err = services
            .add_with::<String>(Lifetime::Transient, Widget::constructors())
            .err()
            .unwrap();
        assert_eq!(err, DiError::TypeMismatch("alloc::string::String"));
        assert!(services.is_empty());
    }

    #[test]
    fn test_descriptors_in_registration_order() {
        let mut services = ServiceCollection::new();
        services.add_instance(1u8).unwrap();
        services.add_named_singleton::<Widget>("w").unwrap();
        services.add_trait_instance::<dyn std::fmt::Debug + Send + Sync>(Arc::new(3u8)).unwrap();

        let descriptors = services.get_service_descriptors();
        assert_eq!(descriptors.len(), 3);
        assert!(descriptors[0].is_instance);
        assert_eq!(descriptors[1].service_name(), Some("w"));
        assert!(descriptors[2].is_trait());
        assert!(services.contains(&key_of_type::<Widget>().with_name("w")));
    }
}
