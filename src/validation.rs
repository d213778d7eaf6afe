//! Whole-container validation.
//!
//! Resolves a construction plan for every registration without building
//! anything, so configuration mistakes surface before the first request.
//!
//! # Rules
//!
//! - **Cycles, missing constructors, strict missing dependencies**: Error
//! - **Unregistered nested dependency under the default policy**: Warning,
//!   the dependency will be substituted with its default
//! - **Singleton → Transient**: Warning, the singleton holds the same
//!   transient instance forever

use crate::config::ContainerOptions;
use crate::error::DiError;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::plan::GraphResolver;
use crate::registration::Registry;

/// A registration whose plan cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub service: Key,
    pub error: DiError,
}

/// A validation warning about potentially problematic configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Constructor parameter with no registration; a default will be used
    DefaultedDependency { service: Key, dependency: Key },
    /// Singleton depends on transient (will always get same instance)
    SingletonCapturesTransient { singleton: Key, transient: Key },
}

/// Result of [`ServiceCollection::validate`](crate::ServiceCollection::validate).
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable, ServiceCollection, ValidationWarning};
///
/// struct Cache;
/// struct Service;
/// impl Injectable for Service {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().arg::<Cache>().build(|_| Ok(Service))]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Service>().unwrap();
///
/// let report = services.validate();
/// assert!(report.is_valid());
/// assert!(matches!(report.warnings[0], ValidationWarning::DefaultedDependency { .. }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Registrations that would fail to resolve
    pub errors: Vec<ValidationError>,
    /// Registrations that resolve with caveats
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub(crate) fn run(registry: &Registry, options: &ContainerOptions) -> Self {
        let resolver = GraphResolver::new(registry, options);
        let mut report = Self::default();

        let mut registrations: Vec<_> = registry.iter().map(|(_, reg)| reg).collect();
        registrations.sort_by_key(|reg| reg.sequence);

        // Each registration is checked as a root, so inspecting the root's
        // direct edges covers every edge exactly once
        for registration in registrations {
            let plan = match resolver.resolve(registration.key()) {
                Ok(plan) => plan,
                Err(error) => {
                    report.errors.push(ValidationError {
                        service: registration.key().clone(),
                        error,
                    });
                    continue;
                }
            };

            let root = plan.root_node();
            for &arg in root.args() {
                let dependency = plan.node(arg);
                if dependency.is_defaulted() {
                    report.warnings.push(ValidationWarning::DefaultedDependency {
                        service: root.service().clone(),
                        dependency: dependency.service().clone(),
                    });
                } else if root.lifetime() == Lifetime::Singleton && dependency.lifetime() == Lifetime::Transient {
                    report.warnings.push(ValidationWarning::SingletonCapturesTransient {
                        singleton: root.service().clone(),
                        transient: dependency.service().clone(),
                    });
                }
            }
        }

        report
    }

    /// Returns true if validation passed without errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if there are warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Formats errors and warnings for display.
    pub fn format_issues(&self) -> String {
        let mut output = String::new();

        if !self.errors.is_empty() {
            output.push_str("Validation Errors:\n");
            for error in &self.errors {
                output.push_str(&format!("  - {}: {}\n", error.service, error.error));
            }
        }

        if !self.warnings.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str("Validation Warnings:\n");
            for warning in &self.warnings {
                output.push_str(&format!("  - {}\n", format_warning(warning)));
            }
        }

        output
    }
}

fn format_warning(warning: &ValidationWarning) -> String {
    match warning {
        ValidationWarning::DefaultedDependency { service, dependency } => {
            format!("Service '{}' depends on unregistered '{}' - a default will be injected", service, dependency)
        }
        ValidationWarning::SingletonCapturesTransient { singleton, transient } => {
            format!("Singleton '{}' depends on transient '{}' - will always get same instance", singleton, transient)
        }
    }
}
