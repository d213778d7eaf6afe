//! Registration surface shared by container front ends.

use std::sync::Arc;

use crate::constructor::Injectable;
use crate::error::DiResult;

/// The four registration operations a container adapter exposes.
///
/// `name` selects a keyed registration; `None` registers the default
/// binding of the service type. Implementations choose whether a repeated
/// registration replaces the earlier one or fails.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable, Registrar, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Settings;
/// impl Injectable for Settings {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(Settings))]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.register_single_instance::<Settings>(None).unwrap();
/// services.register_instance::<Settings>(Some("fresh")).unwrap();
///
/// let provider = services.build();
/// let a = provider.get_instance::<Settings>().unwrap();
/// let b = provider.get_instance::<Settings>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let c = provider.get_named_instance::<Settings>("fresh").unwrap();
/// let d = provider.get_named_instance::<Settings>("fresh").unwrap();
/// assert!(!Arc::ptr_eq(&c, &d));
/// ```
pub trait Registrar {
    /// Registers `I` as a singleton of its own type.
    fn register_single_instance<I: Injectable>(&mut self, name: Option<&'static str>) -> DiResult<&mut Self>;

    /// Registers `I` as a transient of its own type.
    fn register_instance<I: Injectable>(&mut self, name: Option<&'static str>) -> DiResult<&mut Self>;

    /// Registers `I` as a singleton implementation of the trait-object service `S`.
    fn register_single_instance_as<S, I>(
        &mut self,
        name: Option<&'static str>,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable;

    /// Registers `I` as a transient implementation of the trait-object service `S`.
    fn register_instance_as<S, I>(
        &mut self,
        name: Option<&'static str>,
        cast: impl Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    ) -> DiResult<&mut Self>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable;
}
