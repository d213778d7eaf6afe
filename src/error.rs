//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors
///
/// Represents the failures that can occur while registering services,
/// resolving a construction plan, compiling it, or invoking the compiled
/// factory.
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::{DiError, ServiceCollection, Resolver};
///
/// // Resolving a root that was never registered
/// let provider = ServiceCollection::new().build();
/// match provider.get_instance::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_factory::DiError;
///
/// let circular = DiError::Circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(circular.to_string(), "Circular dependency: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Root service not registered
    NotFound(&'static str),
    /// Dependency cycle detected while resolving the graph (includes path)
    Circular(Vec<&'static str>),
    /// Implementation type has no usable constructor
    NoConstructor(&'static str),
    /// Service registered twice while the collection is in strict mode
    AlreadyRegistered(&'static str),
    /// Nested dependency unavailable where one is required
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    /// Type downcast failed
    TypeMismatch(&'static str),
    /// Constructor read an argument it did not declare
    ArgumentMismatch {
        constructor: &'static str,
        index: usize,
    },
    /// Maximum graph depth exceeded
    DepthExceeded(usize),
    /// Singleton slot read before the initializer stored it
    SlotUninitialized(&'static str),
    /// Constructor reported a failure of its own
    Construction {
        service: &'static str,
        message: String,
    },
    /// Invalid container configuration value
    Config(String),
}

impl DiError {
    /// Builds a [`DiError::Construction`] for use inside constructor closures.
    pub fn construction(service: &'static str, message: impl Into<String>) -> Self {
        DiError::Construction {
            service,
            message: message.into(),
        }
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::NotFound(name) => write!(f, "Service not found: {}", name),
            DiError::Circular(path) => {
                write!(f, "Circular dependency: {}", path.join(" -> "))
            }
            DiError::NoConstructor(name) => write!(f, "No usable constructor for: {}", name),
            DiError::AlreadyRegistered(name) => write!(f, "Service already registered: {}", name),
            DiError::MissingDependency { service, dependency } => {
                write!(f, "Missing dependency {} required by {}", dependency, service)
            }
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::ArgumentMismatch { constructor, index } => {
                write!(f, "Constructor {} has no argument at position {}", constructor, index)
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
            DiError::SlotUninitialized(name) => write!(f, "Singleton slot not initialized: {}", name),
            DiError::Construction { service, message } => {
                write!(f, "Construction of {} failed: {}", service, message)
            }
            DiError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::{DiResult, DiError};
///
/// fn failing_operation() -> DiResult<()> {
///     Err(DiError::NotFound("some_service"))
/// }
///
/// assert!(failing_operation().is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
