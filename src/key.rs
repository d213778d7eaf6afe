//! Service key types for the dependency injection container.

use std::any::TypeId;

/// Key identifying a service type in the container.
///
/// Keys are the container's notion of "service type": registrations are
/// stored under them, constructor parameters refer to them, and compiled
/// factories are cached by them.
///
/// # Key Types
///
/// - **Type**: Concrete types (structs, enums, primitives)
/// - **Trait**: Trait-object services such as `dyn Logger`
/// - **Named variants**: Either of the above with an additional name for keyed registrations
///
/// # Examples
///
/// ```rust
/// use ferrous_factory::Key;
/// use std::any::TypeId;
///
/// let plain = Key::Type(TypeId::of::<u32>(), "u32");
/// let named = Key::TypeNamed(TypeId::of::<u32>(), "u32", "port");
///
/// assert_ne!(plain, named);
/// assert!(plain.same_service(&named));
/// assert_eq!(named.unnamed(), plain);
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait-object key, identified by the trait's type name
    Trait(&'static str),
    /// Named concrete type key with TypeId, typename, and name
    TypeNamed(TypeId, &'static str, &'static str),
    /// Named trait-object key with trait name and service name
    TraitNamed(&'static str, &'static str),
}

impl Key {
    /// Get the type or trait name for display
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_factory::Key;
    /// use std::any::TypeId;
    ///
    /// let type_key = Key::Type(TypeId::of::<String>(), "alloc::string::String");
    /// assert_eq!(type_key.display_name(), "alloc::string::String");
    ///
    /// let named_key = Key::TypeNamed(TypeId::of::<u32>(), "u32", "port");
    /// assert_eq!(named_key.display_name(), "u32");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
            Key::TypeNamed(_, name, _) => name,
            Key::TraitNamed(name, _) => name,
        }
    }

    /// Get the service name for named services, or None for unnamed services
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Key::Type(_, _) | Key::Trait(_) => None,
            Key::TypeNamed(_, _, name) => Some(name),
            Key::TraitNamed(_, name) => Some(name),
        }
    }

    /// The same key with any service name removed.
    pub fn unnamed(&self) -> Key {
        match self {
            Key::Type(id, name) | Key::TypeNamed(id, name, _) => Key::Type(*id, name),
            Key::Trait(name) | Key::TraitNamed(name, _) => Key::Trait(name),
        }
    }

    /// The key re-tagged with `name`.
    pub fn with_name(&self, service_name: &'static str) -> Key {
        match self {
            Key::Type(id, name) | Key::TypeNamed(id, name, _) => Key::TypeNamed(*id, name, service_name),
            Key::Trait(name) | Key::TraitNamed(name, _) => Key::TraitNamed(name, service_name),
        }
    }

    /// Whether both keys denote the same service type, ignoring names.
    pub fn same_service(&self, other: &Key) -> bool {
        self.unnamed() == other.unnamed()
    }

    /// True for trait-object keys.
    pub fn is_trait(&self) -> bool {
        matches!(self, Key::Trait(_) | Key::TraitNamed(_, _))
    }

    /// Human-readable label including the service name, e.g. `u32["port"]`.
    pub fn label(&self) -> String {
        match self.service_name() {
            Some(name) => format!("{}[\"{}\"]", self.display_name(), name),
            None => self.display_name().to_string(),
        }
    }
}

// TypeId-only comparison for concrete types; the name is diagnostic
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => a == b && name_a == name_b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            (Key::TraitNamed(a, name_a), Key::TraitNamed(b, name_b)) => a == b && name_a == name_b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(key: &Key) -> u8 {
            match key {
                Key::Type(_, _) => 0,
                Key::TypeNamed(_, _, _) => 1,
                Key::Trait(_) => 2,
                Key::TraitNamed(_, _) => 3,
            }
        }

        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a.cmp(b),
            (Key::TypeNamed(a, _, name_a), Key::TypeNamed(b, _, name_b)) => {
                a.cmp(b).then_with(|| name_a.cmp(name_b))
            }
            (Key::Trait(a), Key::Trait(b)) => a.cmp(b),
            (Key::TraitNamed(a, name_a), Key::TraitNamed(b, name_b)) => {
                a.cmp(b).then_with(|| name_a.cmp(name_b))
            }
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::TypeNamed(id, _, name) => {
                1u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
            Key::Trait(name) => {
                2u8.hash(state);
                name.hash(state);
            }
            Key::TraitNamed(name, named) => {
                3u8.hash(state);
                name.hash(state);
                named.hash(state);
            }
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Key for a concrete service type.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait-object service type such as `dyn Logger`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(std::any::type_name::<T>())
}
