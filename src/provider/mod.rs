//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type, the resolution side of
//! the container. Every root key is planned and compiled once; after that a
//! resolution is a cache lookup plus one call into the compiled factory.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::cache::CompiledFactoryCache;
use crate::compiler::{CompiledFactory, FactoryCompiler};
use crate::config::ContainerOptions;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::Observers;
use crate::plan::{ConstructionPlan, GraphResolver};
use crate::registration::{AnyArc, Registry};
use crate::traits::{Resolver, ResolverCore};

/// Service provider for resolving dependencies from the container.
///
/// Built by [`ServiceCollection::build`](crate::ServiceCollection::build).
/// The registrations it resolves against are frozen: the collection is
/// consumed, so every registration happens before the first resolution.
///
/// # Thread Safety
///
/// `ServiceProvider` is `Send + Sync` and cheap to clone (it uses `Arc`
/// internally). Concurrent first resolutions of a root compile its factory
/// once, and every singleton is constructed at most once per provider.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Config;
/// struct Repository {
///     config: Arc<Config>,
/// }
/// struct Handler {
///     repo: Arc<Repository>,
///     config: Arc<Config>,
/// }
///
/// impl Injectable for Config {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(Config))]
///     }
/// }
/// impl Injectable for Repository {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>()
///             .arg::<Config>()
///             .build(|args| Ok(Repository { config: args.required()? }))]
///     }
/// }
/// impl Injectable for Handler {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>()
///             .arg::<Repository>()
///             .arg::<Config>()
///             .build(|args| Ok(Handler { repo: args.required()?, config: args.required()? }))]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Config>().unwrap();
/// services.add_transient::<Repository>().unwrap();
/// services.add_transient::<Handler>().unwrap();
///
/// let provider = services.build();
/// let handler = provider.get_required::<Handler>();
/// assert!(Arc::ptr_eq(&handler.config, &handler.repo.config));
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    registry: Registry,
    options: ContainerOptions,
    cache: CompiledFactoryCache,
    compiler: FactoryCompiler,
    observers: Observers,
}

impl ServiceProvider {
    pub(crate) fn new(registry: Registry, options: ContainerOptions, observers: Observers) -> Self {
        debug!(services = registry.len(), "service provider built");
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                options,
                cache: CompiledFactoryCache::new(),
                compiler: FactoryCompiler::new(),
                observers,
            }),
        }
    }

    /// The compiled factory for `key`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// [`DiError::NotFound`] when `key` is not registered, otherwise any
    /// planning error. A failure is returned to the caller and retried on
    /// the next call.
    pub fn compiled(&self, key: &Key) -> DiResult<Arc<CompiledFactory>> {
        let inner = &*self.inner;
        // Unknown keys never get a cache entry
        if !inner.registry.contains_key(key) {
            return Err(DiError::NotFound(key.display_name()));
        }

        inner.cache.get_or_compile(key, || {
            let started = Instant::now();
            let result = self.plan(key).and_then(|plan| inner.compiler.compile(&plan));
            let elapsed = started.elapsed();

            match &result {
                Ok(factory) => {
                    debug!(
                        service = %key,
                        nodes = factory.node_count(),
                        slots = factory.slot_count(),
                        ?elapsed,
                        "factory ready"
                    );
                    inner.observers.compiled(key, factory, elapsed);
                }
                Err(error) => {
                    debug!(service = %key, %error, "factory compilation failed");
                    inner.observers.compile_failed(key, error);
                }
            }
            result
        })
    }

    /// Plans construction of `key` without compiling or constructing anything.
    pub fn plan(&self, key: &Key) -> DiResult<ConstructionPlan> {
        GraphResolver::new(&self.inner.registry, &self.inner.options).resolve(key)
    }

    /// Compiles every registration and constructs every singleton.
    ///
    /// Returns the number of factories compiled by this call. Stops at the
    /// first error.
    pub fn prewarm(&self) -> DiResult<usize> {
        let before = self.compilations();
        let mut registrations: Vec<_> = self.inner.registry.iter().map(|(_, reg)| reg).collect();
        registrations.sort_by_key(|reg| reg.sequence);

        for registration in registrations {
            let factory = self.compiled(registration.key())?;
            if registration.lifetime() == Lifetime::Singleton {
                factory.invoke()?;
            }
        }

        let compiled = self.compilations() - before;
        debug!(compiled, "provider prewarmed");
        Ok(compiled)
    }

    /// Number of factories compiled so far.
    pub fn compilations(&self) -> usize {
        self.inner.cache.compilations()
    }

    /// Snapshot of every registration, in registration order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut registrations: Vec<_> = self.inner.registry.iter().map(|(_, reg)| reg).collect();
        registrations.sort_by_key(|reg| reg.sequence);
        registrations.into_iter().map(|reg| ServiceDescriptor::of(reg)).collect()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        if !self.inner.observers.has_observers() {
            return self.compiled(key)?.invoke();
        }

        let started = Instant::now();
        let value = self.compiled(key)?.invoke()?;
        self.inner.observers.resolved(key, started.elapsed());
        Ok(value)
    }

    fn resolve_all(&self, key: &Key) -> DiResult<Vec<AnyArc>> {
        self.inner
            .registry
            .all_of(key)
            .into_iter()
            .map(|reg| self.resolve_any(reg.key()))
            .collect()
    }

    fn contains(&self, key: &Key) -> bool {
        self.inner.registry.contains_key(key)
    }
}

impl Resolver for ServiceProvider {}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.inner.registry.len())
            .field("compiled", &self.inner.cache.len())
            .field("options", &self.inner.options)
            .finish()
    }
}
