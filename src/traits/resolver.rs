//! Resolver traits for service resolution.

use std::any::{type_name, TypeId};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;

/// Core resolver trait for object-safe service resolution.
///
/// Provides the type-erased operations every container surface offers.
/// Most users should use the [`Resolver`] trait instead, which provides
/// generic methods built on top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves a single service through its compiled factory.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The resolved service wrapped in `Arc<dyn Any>`
    /// * `Err(DiError)` - Resolution error (not found, circular, construction failure, etc.)
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc>;

    /// Resolves every registration sharing the key's service type.
    ///
    /// Named and unnamed registrations are included, in registration order.
    /// An unregistered service yields an empty vector.
    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>>;

    /// Whether a registration exists for exactly this key.
    fn contains(&self, key: &Key) -> bool;
}

/// High-level resolver interface with generic methods for type-safe service resolution.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
/// impl Injectable for ConsoleLogger {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(ConsoleLogger))]
///     }
/// }
///
/// let mut collection = ServiceCollection::new();
/// collection.add_instance(42usize).unwrap();
/// collection
///     .add_singleton_trait::<dyn Logger, ConsoleLogger>(|logger| logger as Arc<dyn Logger>)
///     .unwrap();
///
/// let provider = collection.build();
///
/// let number = provider.get_instance::<usize>().unwrap();
/// assert_eq!(*number, 42);
///
/// let logger = provider.get_trait::<dyn Logger>().unwrap();
/// assert_eq!(logger.log("ready"), "LOG: ready");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a concrete service type.
    fn get_instance<T: 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let key = Key::Type(TypeId::of::<T>(), type_name::<T>());
        downcast(self.resolve_any(&key)?)
    }

    /// Resolves a named concrete service type.
    fn get_named_instance<T: 'static + Send + Sync>(&self, name: &'static str) -> DiResult<Arc<T>> {
        let key = Key::TypeNamed(TypeId::of::<T>(), type_name::<T>(), name);
        downcast(self.resolve_any(&key)?)
    }

    /// Resolves a trait-object service such as `dyn Logger`.
    fn get_trait<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Arc<T>> {
        let key = Key::Trait(type_name::<T>());
        downcast_trait(self.resolve_any(&key)?)
    }

    /// Resolves a named trait-object service.
    fn get_named_trait<T: ?Sized + 'static + Send + Sync>(&self, name: &'static str) -> DiResult<Arc<T>> {
        let key = Key::TraitNamed(type_name::<T>(), name);
        downcast_trait(self.resolve_any(&key)?)
    }

    /// Resolves every registration of `T`, named and unnamed, in registration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_factory::{Resolver, ServiceCollection};
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_instance(1u8).unwrap();
    /// collection.add_named_instance("two", 2u8).unwrap();
    ///
    /// let provider = collection.build();
    /// let all: Vec<u8> = provider
    ///     .get_all_instances::<u8>()
    ///     .unwrap()
    ///     .iter()
    ///     .map(|value| **value)
    ///     .collect();
    /// assert_eq!(all, vec![1, 2]);
    /// ```
    fn get_all_instances<T: 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>> {
        let key = Key::Type(TypeId::of::<T>(), type_name::<T>());
        self.resolve_all(&key)?.into_iter().map(downcast).collect()
    }

    /// Resolves every registration of the trait `T`, in registration order.
    fn get_all_trait_instances<T: ?Sized + 'static + Send + Sync>(&self) -> DiResult<Vec<Arc<T>>> {
        let key = Key::Trait(type_name::<T>());
        self.resolve_all(&key)?.into_iter().map(downcast_trait).collect()
    }

    fn is_registered<T: 'static>(&self) -> bool {
        self.contains(&Key::Type(TypeId::of::<T>(), type_name::<T>()))
    }

    fn is_registered_named<T: 'static>(&self, name: &'static str) -> bool {
        self.contains(&Key::TypeNamed(TypeId::of::<T>(), type_name::<T>(), name))
    }

    fn is_registered_trait<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&Key::Trait(type_name::<T>()))
    }

    /// Resolves a concrete service type, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved (not found, circular
    /// dependency, construction failure, etc.).
    fn get_required<T: 'static + Send + Sync>(&self) -> Arc<T> {
        self.get_instance::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {:?}", type_name::<T>(), e))
    }

    /// Resolves a trait-object service, panicking on failure.
    fn get_required_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Arc<T> {
        self.get_trait::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve trait {}: {:?}", type_name::<T>(), e))
    }
}

fn downcast<T: 'static + Send + Sync>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>().map_err(|_| DiError::TypeMismatch(type_name::<T>()))
}

// Trait services are stored as Arc<Arc<dyn Trait>>
fn downcast_trait<T: ?Sized + 'static + Send + Sync>(any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(type_name::<T>()))
}
