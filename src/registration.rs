//! Service registrations and the registration store.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::config::RegistrationMode;
use crate::constructor::Constructor;
use crate::error::{DiError, DiResult};
use crate::internal::FastMap;
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Type-erased instance as stored in slots and handed between constructors.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Write-once storage cell behind one singleton registration.
pub(crate) type SingletonCell = OnceCell<AnyArc>;

/// Reinterprets an implementation instance as its service type.
///
/// Trait-object services are stored as `Arc<Arc<dyn Trait>>` inside an
/// [`AnyArc`], so the cast wraps the converted `Arc` once more.
#[derive(Clone)]
pub struct Caster {
    target: &'static str,
    apply: Arc<dyn Fn(AnyArc) -> DiResult<AnyArc> + Send + Sync>,
}

impl Caster {
    pub(crate) fn new<S, I, F>(cast: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Send + Sync + 'static,
        F: Fn(Arc<I>) -> Arc<S> + Send + Sync + 'static,
    {
        Self {
            target: type_name::<S>(),
            apply: Arc::new(move |any: AnyArc| {
                let concrete = any
                    .downcast::<I>()
                    .map_err(|_| DiError::TypeMismatch(type_name::<I>()))?;
                Ok(Arc::new(cast(concrete)) as AnyArc)
            }),
        }
    }

    /// Service type name the cast produces.
    pub fn target(&self) -> &'static str {
        self.target
    }

    pub(crate) fn apply(&self, value: AnyArc) -> DiResult<AnyArc> {
        (self.apply)(value)
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Caster").field(&self.target).finish()
    }
}

/// One stored registration: service key, implementation, constructors, lifetime.
///
/// Immutable once inserted into a [`Registry`]. Singleton registrations own
/// the cell that every compiled factory reaching them shares.
pub struct ServiceRegistration {
    pub(crate) key: Key,
    pub(crate) impl_id: TypeId,
    pub(crate) impl_name: &'static str,
    pub(crate) lifetime: Lifetime,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) cast: Option<Caster>,
    pub(crate) cell: Option<Arc<SingletonCell>>,
    pub(crate) is_instance: bool,
    pub(crate) sequence: usize,
}

impl ServiceRegistration {
    pub(crate) fn new<I: Send + Sync + 'static>(
        key: Key,
        lifetime: Lifetime,
        constructors: Vec<Constructor>,
        cast: Option<Caster>,
    ) -> Self {
        let cell = match lifetime {
            Lifetime::Singleton => Some(Arc::new(SingletonCell::new())),
            Lifetime::Transient => None,
        };

        Self {
            key,
            impl_id: TypeId::of::<I>(),
            impl_name: type_name::<I>(),
            lifetime,
            constructors,
            cast,
            cell,
            is_instance: false,
            sequence: 0,
        }
    }

    /// Singleton registration whose cell already holds `value`.
    pub(crate) fn instance<I: Send + Sync + 'static>(key: Key, value: Arc<I>, cast: Option<Caster>) -> DiResult<Self> {
        let stored: AnyArc = match &cast {
            Some(caster) => caster.apply(value.clone())?,
            None => value.clone() as AnyArc,
        };
        let mut reg = Self::new::<I>(key, Lifetime::Singleton, vec![Constructor::from_instance(value)], cast);
        reg.is_instance = true;
        reg.cell = Some(Arc::new(SingletonCell::with_value(stored)));
        Ok(reg)
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn implementation_name(&self) -> &'static str {
        self.impl_name
    }

    pub fn implementation_id(&self) -> TypeId {
        self.impl_id
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Whether an instance is already stored (singletons only).
    pub fn is_initialized(&self) -> bool {
        self.cell.as_ref().map_or(false, |cell| cell.get().is_some())
    }
}

impl fmt::Debug for ServiceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistration")
            .field("key", &self.key)
            .field("implementation", &self.impl_name)
            .field("lifetime", &self.lifetime)
            .field("constructors", &self.constructors.len())
            .field("cast", &self.cast.as_ref().map(Caster::target))
            .finish()
    }
}

/// Registration store keyed by service key.
pub(crate) struct Registry {
    /// Fast Vec lookup for first N registrations (cache-friendly)
    pub(crate) one_small: Vec<(Key, Arc<ServiceRegistration>)>,
    /// HashMap fallback for remaining registrations
    pub(crate) one_large: FastMap<Key, Arc<ServiceRegistration>>,
    /// Threshold for Vec vs HashMap
    pub(crate) small_threshold: usize,
    next_sequence: usize,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            one_small: Vec::new(),
            one_large: FastMap::default(),
            small_threshold: 16,
            next_sequence: 0,
        }
    }

    /// Stores a registration, replacing any earlier one unless `mode` is strict.
    pub(crate) fn insert(&mut self, mut registration: ServiceRegistration, mode: RegistrationMode) -> DiResult<()> {
        let key = registration.key.clone();
        if mode == RegistrationMode::Strict && self.contains_key(&key) {
            return Err(DiError::AlreadyRegistered(key.display_name()));
        }

        registration.sequence = self.next_sequence;
        self.next_sequence += 1;
        let registration = Arc::new(registration);

        if let Some(pos) = self.one_small.iter().position(|(k, _)| k == &key) {
            self.one_small[pos] = (key, registration);
        } else if self.one_small.len() < self.small_threshold {
            self.one_small.push((key, registration));
        } else {
            self.one_large.insert(key, registration);
        }
        Ok(())
    }

    #[inline(always)]
    pub(crate) fn lookup(&self, key: &Key) -> Option<&Arc<ServiceRegistration>> {
        for (k, reg) in &self.one_small {
            if k == key {
                return Some(reg);
            }
        }

        self.one_large.get(key)
    }

    #[inline(always)]
    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.lookup(key).is_some()
    }

    /// Every registration for the key's service type, named or not, in registration order.
    pub(crate) fn all_of(&self, key: &Key) -> Vec<&Arc<ServiceRegistration>> {
        let mut matches: Vec<&Arc<ServiceRegistration>> = self
            .iter()
            .filter(|(k, _)| k.same_service(key))
            .map(|(_, reg)| reg)
            .collect();
        matches.sort_by_key(|reg| reg.sequence);
        matches
    }

    /// Iterator over all key-registration pairs
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Arc<ServiceRegistration>)> {
        self.one_small
            .iter()
            .map(|(k, r)| (k, r))
            .chain(self.one_large.iter())
    }

    pub(crate) fn len(&self) -> usize {
        self.one_small.len() + self.one_large.len()
    }

    /// Sorts the small Vec by key once registration is over.
    pub(crate) fn finalize(&mut self) {
        self.one_small.sort_by(|a, b| a.0.cmp(&b.0));
    }
}
