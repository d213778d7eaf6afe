//! Core traits for the dependency injection container.

mod registrar;
mod resolver;

pub use registrar::Registrar;
pub use resolver::{Resolver, ResolverCore};
