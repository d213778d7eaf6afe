//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// A compiled factory caches Singleton nodes in slots and re-runs the
/// constructor for Transient nodes on every invocation.
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::{Constructor, Injectable, Lifetime, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database;
/// impl Injectable for Database {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(Database))]
///     }
/// }
///
/// struct RequestModel;
/// impl Injectable for RequestModel {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(RequestModel))]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Database>().unwrap();
/// services.add_transient::<RequestModel>().unwrap();
/// let provider = services.build();
///
/// let db1 = provider.get_instance::<Database>().unwrap();
/// let db2 = provider.get_instance::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2)); // Same instance
///
/// let m1 = provider.get_instance::<RequestModel>().unwrap();
/// let m2 = provider.get_instance::<RequestModel>().unwrap();
/// assert!(!Arc::ptr_eq(&m1, &m2)); // Always different
/// # let _ = Lifetime::Singleton;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Lifetime {
    /// Single instance per container, cached forever
    ///
    /// Backed by one write-once slot cell per registration. Every compiled
    /// factory that reaches the registration shares that cell.
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// Transient nodes are re-constructed at every place they appear in
    /// a plan, so two parents never share a transient instance.
    Transient,
}

impl Lifetime {
    /// Short lowercase label used in listings and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Transient => "transient",
        }
    }
}
