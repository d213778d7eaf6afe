//! Service descriptors for introspection and diagnostics.

use std::any::TypeId;

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::ServiceRegistration;

/// Service descriptor for introspection and diagnostics
///
/// A read-only snapshot of one registration: the service key, the
/// implementation type, its lifetime and how many constructors it declares.
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::{Constructor, Injectable, Lifetime, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database;
/// impl Injectable for Database {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(Database))]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Database>().unwrap();
/// services.add_named_instance("config_value", 42u32).unwrap();
///
/// let descriptors = services.get_service_descriptors();
///
/// let db = descriptors.iter()
///     .find(|d| d.type_name().contains("Database"))
///     .unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert!(!db.is_named());
/// assert_eq!(db.constructor_count, 1);
///
/// let config = descriptors.iter()
///     .find(|d| d.service_name() == Some("config_value"))
///     .unwrap();
/// assert_eq!(config.type_name(), "u32");
/// assert!(config.is_instance);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The service key (type/trait name with optional service name)
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Implementation type ID
    pub impl_type_id: TypeId,
    /// Implementation type name
    pub impl_type_name: &'static str,
    /// Number of candidate constructors declared
    pub constructor_count: usize,
    /// Whether the registration holds a pre-built instance
    pub is_instance: bool,
}

impl ServiceDescriptor {
    pub(crate) fn of(registration: &ServiceRegistration) -> Self {
        Self {
            key: registration.key().clone(),
            lifetime: registration.lifetime(),
            impl_type_id: registration.implementation_id(),
            impl_type_name: registration.implementation_name(),
            constructor_count: registration.constructors().len(),
            is_instance: registration.is_instance,
        }
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        self.key.service_name()
    }

    /// Get the type/trait name
    ///
    /// This is the result of `std::any::type_name` for the service type.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Check if this is a named service
    pub fn is_named(&self) -> bool {
        self.service_name().is_some()
    }

    /// Check if the service is a trait object
    pub fn is_trait(&self) -> bool {
        self.key.is_trait()
    }
}
