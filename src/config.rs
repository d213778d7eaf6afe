//! Container configuration.
//!
//! [`ContainerOptions`] holds the policy switches of the container engine
//! (registration strictness, missing-dependency handling, constructor
//! selection, depth limit). Options can be built in code, loaded from any
//! [`ConfigSource`], or read from the environment.

use std::collections::HashMap;
use std::env;
use std::fmt;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use crate::{DiError, DiResult};

/// Environment prefix used by [`ContainerOptions::from_env`].
pub const ENV_PREFIX: &str = "FERROUS_FACTORY";

/// Default maximum dependency depth of a construction plan.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// What happens when a service key is registered a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum RegistrationMode {
    /// The later registration silently replaces the earlier one
    #[default]
    Replace,
    /// The later registration fails with [`DiError::AlreadyRegistered`]
    Strict,
}

/// What the graph resolver does with an unregistered nested dependency.
///
/// Roots are always required; this only affects constructor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum MissingDependencyPolicy {
    /// Substitute a default value: absent for reference parameters,
    /// `T::default()` for value parameters
    #[default]
    Default,
    /// Fail resolution with [`DiError::MissingDependency`]
    Error,
}

/// How the graph resolver picks one constructor out of several candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "snake_case"))]
pub enum ConstructorPolicy {
    /// The constructor with the most parameters; ties go to the one declared first
    #[default]
    MostParameters,
    /// The first constructor declared
    FirstDeclared,
}

/// Policy switches for a container.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{ContainerOptions, MissingDependencyPolicy, RegistrationMode};
///
/// let options = ContainerOptions::new()
///     .registration_mode(RegistrationMode::Strict)
///     .missing_dependency(MissingDependencyPolicy::Error)
///     .max_depth(64);
///
/// assert_eq!(options.registration_mode, RegistrationMode::Strict);
/// assert_eq!(options.max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    pub registration_mode: RegistrationMode,
    pub missing_dependency: MissingDependencyPolicy,
    pub constructor_policy: ConstructorPolicy,
    pub max_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            registration_mode: RegistrationMode::Replace,
            missing_dependency: MissingDependencyPolicy::Default,
            constructor_policy: ConstructorPolicy::MostParameters,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registration_mode(mut self, mode: RegistrationMode) -> Self {
        self.registration_mode = mode;
        self
    }

    pub fn missing_dependency(mut self, policy: MissingDependencyPolicy) -> Self {
        self.missing_dependency = policy;
        self
    }

    pub fn constructor_policy(mut self, policy: ConstructorPolicy) -> Self {
        self.constructor_policy = policy;
        self
    }

    /// Deepest service chain a plan may contain.
    ///
    /// The graph walk recurses once per level; limits well above
    /// [`DEFAULT_MAX_DEPTH`] need a correspondingly larger thread stack.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Loads options from a configuration source, keeping defaults for absent keys.
    ///
    /// Recognized keys: `registration_mode` (`replace` | `strict`),
    /// `missing_dependency` (`default` | `error`), `constructor_policy`
    /// (`most_parameters` | `first_declared`), `max_depth` (positive integer).
    pub fn load(source: &dyn ConfigSource) -> DiResult<Self> {
        let mut options = Self::default();

        if let Some(value) = source.get("registration_mode") {
            options.registration_mode = match value.as_string()? {
                "replace" => RegistrationMode::Replace,
                "strict" => RegistrationMode::Strict,
                other => return Err(invalid("registration_mode", other)),
            };
        }
        if let Some(value) = source.get("missing_dependency") {
            options.missing_dependency = match value.as_string()? {
                "default" => MissingDependencyPolicy::Default,
                "error" => MissingDependencyPolicy::Error,
                other => return Err(invalid("missing_dependency", other)),
            };
        }
        if let Some(value) = source.get("constructor_policy") {
            options.constructor_policy = match value.as_string()? {
                "most_parameters" => ConstructorPolicy::MostParameters,
                "first_declared" => ConstructorPolicy::FirstDeclared,
                other => return Err(invalid("constructor_policy", other)),
            };
        }
        if let Some(value) = source.get("max_depth") {
            let depth = value.as_i64()?;
            if depth <= 0 {
                return Err(invalid("max_depth", &depth.to_string()));
            }
            options.max_depth = depth as usize;
        }

        Ok(options)
    }

    /// Loads options from `FERROUS_FACTORY_*` environment variables.
    pub fn from_env() -> DiResult<Self> {
        Self::load(&EnvironmentConfigSource::with_prefix(ENV_PREFIX))
    }

    /// Parses options from a JSON document; absent fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| DiError::Config(format!("invalid options document: {}", e)))?;
        if options.max_depth == 0 {
            return Err(invalid("max_depth", "0"));
        }
        Ok(options)
    }
}

fn invalid(key: &str, value: &str) -> DiError {
    DiError::Config(format!("unsupported value '{}' for {}", value, key))
}

/// A configuration value read from a [`ConfigSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl ConfigValue {
    /// Try to convert to string
    pub fn as_string(&self) -> DiResult<&str> {
        match self {
            ConfigValue::String(s) => Ok(s),
            other => Err(DiError::Config(format!("expected a string, found {}", other))),
        }
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> DiResult<i64> {
        match self {
            ConfigValue::Integer(i) => Ok(*i),
            other => Err(DiError::Config(format!("expected an integer, found {}", other))),
        }
    }

    fn parse(raw: String) -> Self {
        if let Ok(int_val) = raw.parse::<i64>() {
            ConfigValue::Integer(int_val)
        } else if let Ok(bool_val) = raw.parse::<bool>() {
            ConfigValue::Boolean(bool_val)
        } else {
            ConfigValue::String(raw)
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "'{}'", s),
            ConfigValue::Integer(i) => write!(f, "{}", i),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A source of configuration values, keyed by lowercase option names.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<ConfigValue>;

    fn keys(&self) -> Vec<String>;
}

/// Environment variable configuration source
#[derive(Debug, Default)]
pub struct EnvironmentConfigSource {
    /// Prefix to filter environment variables
    prefix: Option<String>,
}

impl EnvironmentConfigSource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        let env_key = if let Some(prefix) = &self.prefix {
            format!("{}_{}", prefix.to_uppercase(), key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&env_key).ok().map(ConfigValue::parse)
    }

    fn keys(&self) -> Vec<String> {
        env::vars()
            .filter_map(|(key, _)| {
                if let Some(prefix) = &self.prefix {
                    let prefix_upper = format!("{}_", prefix.to_uppercase());
                    key.strip_prefix(&prefix_upper).map(|rest| rest.to_lowercase())
                } else {
                    Some(key.to_lowercase())
                }
            })
            .collect()
    }
}

/// In-memory configuration source.
#[derive(Debug, Default, Clone)]
pub struct MapConfigSource {
    values: HashMap<String, ConfigValue>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ContainerOptions::default();
        assert_eq!(options.registration_mode, RegistrationMode::Replace);
        assert_eq!(options.missing_dependency, MissingDependencyPolicy::Default);
        assert_eq!(options.constructor_policy, ConstructorPolicy::MostParameters);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_load_from_map_source() {
        let source = MapConfigSource::new()
            .set("registration_mode", ConfigValue::String("strict".into()))
            .set("constructor_policy", ConfigValue::String("first_declared".into()))
            .set("max_depth", ConfigValue::Integer(12));

        let options = ContainerOptions::load(&source).unwrap();
        assert_eq!(options.registration_mode, RegistrationMode::Strict);
        assert_eq!(options.constructor_policy, ConstructorPolicy::FirstDeclared);
        assert_eq!(options.missing_dependency, MissingDependencyPolicy::Default);
        assert_eq!(options.max_depth, 12);
    }

    #[test]
    fn test_load_rejects_unknown_values() {
        let source = MapConfigSource::new()
            .set("missing_dependency", ConfigValue::String("ignore".into()));
        assert!(matches!(ContainerOptions::load(&source), Err(DiError::Config(_))));

        let source = MapConfigSource::new().set("max_depth", ConfigValue::Integer(0));
        assert!(matches!(ContainerOptions::load(&source), Err(DiError::Config(_))));

        let source = MapConfigSource::new().set("max_depth", ConfigValue::Boolean(true));
        assert!(matches!(ContainerOptions::load(&source), Err(DiError::Config(_))));
    }

    #[test]
    fn test_config_value_parsing() {
        assert_eq!(ConfigValue::parse("42".into()), ConfigValue::Integer(42));
        assert_eq!(ConfigValue::parse("true".into()), ConfigValue::Boolean(true));
        assert_eq!(ConfigValue::parse("strict".into()), ConfigValue::String("strict".into()));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_json() {
        let options = ContainerOptions::from_json(
            r#"{ "missing_dependency": "error", "max_depth": 8 }"#,
        )
        .unwrap();
        assert_eq!(options.missing_dependency, MissingDependencyPolicy::Error);
        assert_eq!(options.registration_mode, RegistrationMode::Replace);
        assert_eq!(options.max_depth, 8);

        assert!(ContainerOptions::from_json("{ \"max_depth\": 0 }").is_err());
    }
}
