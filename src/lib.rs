//! # ferrous-factory
//!
//! Dependency injection that compiles each requested service's dependency
//! graph into a cached factory, so steady-state resolution never walks the
//! registry or inspects constructors again.
//!
//! ## Pipeline
//!
//! - **Registration store**: [`ServiceCollection`] maps service keys to an
//!   implementation, its candidate [`Constructor`]s and a [`Lifetime`]
//! - **Graph resolver**: [`GraphResolver`] walks constructor parameters from
//!   a root and produces a [`ConstructionPlan`], detecting cycles and
//!   sharing singletons within the plan
//! - **Instruction IR**: a plan lowers to a [`Program`] of [`Instr`] trees
//!   that any [`Backend`] can consume
//! - **Factory compiler**: [`FactoryCompiler`] emits a [`CompiledFactory`],
//!   a self-contained closure with a singleton initializer that runs once
//! - **Compiled factory cache**: [`CompiledFactoryCache`] holds one factory
//!   per root key and compiles each key once, even under contention
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn constructors() -> Vec<Constructor> {
//!         vec![Constructor::of::<Self>()
//!             .arg::<Database>()
//!             .build(|args| Ok(UserService { db: args.required()? }))]
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services
//!     .add_instance(Database {
//!         connection_string: "postgres://localhost".to_string(),
//!     })
//!     .unwrap();
//! services.add_transient::<UserService>().unwrap();
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once per container, on first use, and shared by
//!   every factory that reaches it
//! - **Transient**: Created fresh at every occurrence in a graph
//!
//! ## Missing Dependencies
//!
//! An unregistered root is always an error. An unregistered nested
//! dependency is substituted with a default (absent for references,
//! `T::default()` for value parameters) unless
//! [`MissingDependencyPolicy::Error`] is configured.
//!
//! ```rust
//! use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! struct Mailer;
//! struct Signup {
//!     mailer: Option<Arc<Mailer>>,
//!     retries: u8,
//! }
//!
//! impl Injectable for Signup {
//!     fn constructors() -> Vec<Constructor> {
//!         vec![Constructor::of::<Self>()
//!             .arg::<Mailer>()
//!             .arg_value::<u8>()
//!             .build(|args| Ok(Signup { mailer: args.next()?, retries: args.value()? }))]
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_transient::<Signup>().unwrap();
//!
//! let signup = services.build().get_required::<Signup>();
//! assert!(signup.mailer.is_none());
//! assert_eq!(signup.retries, 0);
//! ```
//!
//! ## Inspecting Compiled Factories
//!
//! ```rust
//! use ferrous_factory::{key_of_type, Constructor, Injectable, ServiceCollection};
//!
//! struct Engine;
//! impl Injectable for Engine {
//!     fn constructors() -> Vec<Constructor> {
//!         vec![Constructor::of::<Self>().build(|_| Ok(Engine))]
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton::<Engine>().unwrap();
//! let provider = services.build();
//!
//! let factory = provider.compiled(&key_of_type::<Engine>()).unwrap();
//! assert_eq!(factory.slot_count(), 1);
//! assert!(factory.listing().contains("load slot[0]"));
//! ```

pub mod cache;
pub mod collection;
pub mod compiler;
pub mod config;
pub mod constructor;
pub mod descriptors;
pub mod error;
pub mod ir;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod plan;
pub mod provider;
pub mod registration;
pub mod traits;
pub mod validation;

// Internal modules
mod internal;

pub use cache::CompiledFactoryCache;
pub use collection::ServiceCollection;
pub use compiler::{ClosureEmitter, CompiledFactory, FactoryCompiler};
pub use config::{
    ConfigSource, ConfigValue, ConstructorPolicy, ContainerOptions, EnvironmentConfigSource, MapConfigSource,
    MissingDependencyPolicy, RegistrationMode,
};
pub use constructor::{Args, Constructor, ConstructorBuilder, Injectable, Parameter, ParameterKind};
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult};
pub use ir::{Backend, Instr, Listing, Program};
pub use key::{key_of_trait, key_of_type, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver};
pub use plan::{ConstructionNode, ConstructionPlan, GraphResolver, NodeId, NodeSource, SlotId};
pub use provider::ServiceProvider;
pub use registration::{AnyArc, Caster, ServiceRegistration};
pub use traits::{Registrar, Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};
