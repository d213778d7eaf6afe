//! Declarative constructors.
//!
//! Rust has no runtime reflection, so an implementation type describes its
//! constructors as data: an ordered parameter list plus a build closure.
//! The graph resolver reads the parameter list to walk dependencies; the
//! compiled factory later calls the build closure with the evaluated
//! arguments packed into [`Args`].

use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;

type BuildFn = Arc<dyn for<'a> Fn(&mut Args<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// How an unregistered parameter is defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Delivered as `Option<Arc<T>>`; absent when defaulted
    Reference,
    /// Delivered by value; `T::default()` when defaulted
    Value,
}

/// One constructor parameter: the service it asks for and how to default it.
#[derive(Debug, Clone)]
pub struct Parameter {
    key: Key,
    kind: ParameterKind,
    default: Option<fn() -> AnyArc>,
}

fn default_of<T: Default + Send + Sync + 'static>() -> AnyArc {
    Arc::new(T::default())
}

impl Parameter {
    /// Reference parameter on a concrete service type.
    pub fn service<T: Send + Sync + 'static>() -> Self {
        Self::reference(Key::Type(TypeId::of::<T>(), type_name::<T>()))
    }

    /// Reference parameter on a named concrete service.
    pub fn named<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self::reference(Key::TypeNamed(TypeId::of::<T>(), type_name::<T>(), name))
    }

    /// Reference parameter on a trait-object service such as `dyn Logger`.
    pub fn service_trait<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self::reference(Key::Trait(type_name::<T>()))
    }

    /// Reference parameter on a named trait-object service.
    pub fn named_trait<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self::reference(Key::TraitNamed(type_name::<T>(), name))
    }

    /// Value parameter; resolves to `T::default()` when `T` is not registered.
    pub fn value<T: Default + Clone + Send + Sync + 'static>() -> Self {
        Self {
            key: Key::Type(TypeId::of::<T>(), type_name::<T>()),
            kind: ParameterKind::Value,
            default: Some(default_of::<T>),
        }
    }

    fn reference(key: Key) -> Self {
        Self {
            key,
            kind: ParameterKind::Reference,
            default: None,
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// The value substituted when the parameter's service is unregistered.
    pub(crate) fn default_value(&self) -> Option<AnyArc> {
        self.default.map(|make| make())
    }
}

/// A declared constructor of an implementation type.
///
/// Cloning is cheap; compiled factories hold clones so they never go back
/// to the registry.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable};
/// use std::sync::Arc;
///
/// struct Database;
/// struct Repository {
///     db: Option<Arc<Database>>,
///     page_size: u32,
/// }
///
/// impl Injectable for Repository {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>()
///             .arg::<Database>()
///             .arg_value::<u32>()
///             .build(|args| {
///                 Ok(Repository {
///                     db: args.next::<Database>()?,
///                     page_size: args.value::<u32>()?,
///                 })
///             })]
///     }
/// }
///
/// let ctor = &Repository::constructors()[0];
/// assert_eq!(ctor.arity(), 2);
/// ```
#[derive(Clone)]
pub struct Constructor {
    label: &'static str,
    impl_id: TypeId,
    impl_name: &'static str,
    params: Arc<[Parameter]>,
    build: BuildFn,
}

impl Constructor {
    /// Starts declaring a constructor for `I`.
    pub fn of<I: Send + Sync + 'static>() -> ConstructorBuilder<I> {
        ConstructorBuilder {
            label: type_name::<I>(),
            params: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Zero-argument constructor handing out an already built instance.
    pub(crate) fn from_instance<T: Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            label: type_name::<T>(),
            impl_id: TypeId::of::<T>(),
            impl_name: type_name::<T>(),
            params: Arc::from(Vec::new()),
            build: Arc::new(move |_: &mut Args<'_>| Ok(instance.clone() as AnyArc)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn implementation_id(&self) -> TypeId {
        self.impl_id
    }

    pub fn implementation_name(&self) -> &'static str {
        self.impl_name
    }

    /// Runs the build closure over already evaluated arguments.
    pub(crate) fn invoke(&self, values: &[Option<AnyArc>]) -> DiResult<AnyArc> {
        let mut args = Args {
            constructor: self.label,
            values,
            cursor: 0,
        };
        (self.build)(&mut args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("label", &self.label)
            .field("implementation", &self.impl_name)
            .field("params", &self.params)
            .finish()
    }
}

/// Builder returned by [`Constructor::of`].
pub struct ConstructorBuilder<I> {
    label: &'static str,
    params: Vec<Parameter>,
    _marker: PhantomData<fn() -> I>,
}

impl<I: Send + Sync + 'static> ConstructorBuilder<I> {
    /// Label shown in listings and errors; defaults to the type name.
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn arg<T: Send + Sync + 'static>(self) -> Self {
        self.param(Parameter::service::<T>())
    }

    pub fn arg_named<T: Send + Sync + 'static>(self, name: &'static str) -> Self {
        self.param(Parameter::named::<T>(name))
    }

    pub fn arg_trait<T: ?Sized + Send + Sync + 'static>(self) -> Self {
        self.param(Parameter::service_trait::<T>())
    }

    pub fn arg_named_trait<T: ?Sized + Send + Sync + 'static>(self, name: &'static str) -> Self {
        self.param(Parameter::named_trait::<T>(name))
    }

    pub fn arg_value<T: Default + Clone + Send + Sync + 'static>(self) -> Self {
        self.param(Parameter::value::<T>())
    }

    /// Finishes the declaration with the closure that assembles `I`.
    ///
    /// The closure reads arguments from [`Args`] in declared order.
    pub fn build<F>(self, f: F) -> Constructor
    where
        F: for<'a> Fn(&mut Args<'a>) -> DiResult<I> + Send + Sync + 'static,
    {
        Constructor {
            label: self.label,
            impl_id: TypeId::of::<I>(),
            impl_name: type_name::<I>(),
            params: Arc::from(self.params),
            build: Arc::new(move |args: &mut Args<'_>| f(args).map(|value| Arc::new(value) as AnyArc)),
        }
    }
}

/// Evaluated constructor arguments, consumed front to back.
pub struct Args<'a> {
    constructor: &'static str,
    values: &'a [Option<AnyArc>],
    cursor: usize,
}

impl<'a> Args<'a> {
    fn take(&mut self) -> DiResult<Option<&'a AnyArc>> {
        let index = self.cursor;
        let values = self.values;
        let slot = values.get(index).ok_or(DiError::ArgumentMismatch {
            constructor: self.constructor,
            index,
        })?;
        self.cursor += 1;
        Ok(slot.as_ref())
    }

    /// Next argument as a concrete service; `None` when it was defaulted to absent.
    pub fn next<T: Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<T>>> {
        match self.take()? {
            None => Ok(None),
            Some(any) => any
                .clone()
                .downcast::<T>()
                .map(Some)
                .map_err(|_| DiError::TypeMismatch(type_name::<T>())),
        }
    }

    /// Next argument as a concrete service that must be present.
    pub fn required<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        self.next::<T>()?.ok_or(DiError::MissingDependency {
            service: self.constructor,
            dependency: type_name::<T>(),
        })
    }

    /// Next argument as a trait object; `None` when it was defaulted to absent.
    pub fn next_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Option<Arc<T>>> {
        match self.take()? {
            None => Ok(None),
            // Trait services are stored as Arc<Arc<dyn Trait>>
            Some(any) => any
                .clone()
                .downcast::<Arc<T>>()
                .map(|boxed| Some((*boxed).clone()))
                .map_err(|_| DiError::TypeMismatch(type_name::<T>())),
        }
    }

    /// Next argument as a trait object that must be present.
    pub fn required_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        self.next_trait::<T>()?.ok_or(DiError::MissingDependency {
            service: self.constructor,
            dependency: type_name::<T>(),
        })
    }

    /// Next argument cloned out by value.
    pub fn value<T: Clone + Send + Sync + 'static>(&mut self) -> DiResult<T> {
        self.required::<T>().map(|arc| (*arc).clone())
    }

    /// Arguments not read yet.
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.cursor)
    }
}

/// Implementation types that declare their own constructors.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Constructor, Injectable, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>().build(|_| Ok(Clock))]
///     }
/// }
///
/// struct Scheduler {
///     clock: Arc<Clock>,
/// }
/// impl Injectable for Scheduler {
///     fn constructors() -> Vec<Constructor> {
///         vec![Constructor::of::<Self>()
///             .arg::<Clock>()
///             .build(|args| Ok(Scheduler { clock: args.required::<Clock>()? }))]
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton::<Clock>().unwrap();
/// services.add_transient::<Scheduler>().unwrap();
///
/// let provider = services.build();
/// let a = provider.get_instance::<Scheduler>().unwrap();
/// let b = provider.get_instance::<Scheduler>().unwrap();
/// assert!(Arc::ptr_eq(&a.clock, &b.clock));
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    fn constructors() -> Vec<Constructor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        left: Option<Arc<String>>,
        count: u32,
    }

    fn pair_ctor() -> Constructor {
        Constructor::of::<Pair>()
            .label("Pair::new")
            .arg::<String>()
            .arg_value::<u32>()
            .build(|args| {
                Ok(Pair {
                    left: args.next::<String>()?,
                    count: args.value::<u32>()?,
                })
            })
    }

    #[test]
    fn test_declared_parameters() {
        let ctor = pair_ctor();
        assert_eq!(ctor.label(), "Pair::new");
        assert_eq!(ctor.arity(), 2);
        assert_eq!(ctor.params()[0].kind(), ParameterKind::Reference);
        assert_eq!(ctor.params()[1].kind(), ParameterKind::Value);
        assert_eq!(ctor.implementation_id(), TypeId::of::<Pair>());
    }

    #[test]
    fn test_invoke_with_values() {
        let ctor = pair_ctor();
        let values = vec![
            Some(Arc::new("left".to_string()) as AnyArc),
            Some(Arc::new(7u32) as AnyArc),
        ];
        let built = ctor.invoke(&values).unwrap().downcast::<Pair>().unwrap();
        assert_eq!(built.left.as_deref().map(String::as_str), Some("left"));
        assert_eq!(built.count, 7);
    }

    #[test]
    fn test_defaults() {
        let ctor = pair_ctor();
        let values: Vec<Option<AnyArc>> =
            ctor.params().iter().map(Parameter::default_value).collect();
        let built = ctor.invoke(&values).unwrap().downcast::<Pair>().unwrap();
        assert_eq!(*built, Pair { left: None, count: 0 });
    }

    #[test]
    fn test_reading_past_declared_arguments() {
        let ctor = Constructor::of::<u8>()
            .build(|args| args.value::<u8>());
        let err = ctor.invoke(&[]).unwrap_err();
        assert_eq!(err, DiError::ArgumentMismatch { constructor: "u8", index: 0 });
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let ctor = Constructor::of::<u8>()
            .arg::<u16>()
            .build(|args| args.value::<u8>());
        let values = vec![Some(Arc::new(1u16) as AnyArc)];
        assert_eq!(ctor.invoke(&values).unwrap_err(), DiError::TypeMismatch("u8"));
    }

    #[test]
    fn test_required_absent_argument() {
        let ctor = Constructor::of::<u8>()
            .arg::<String>()
            .build(|args| args.required::<String>().map(|s| s.len() as u8));
        let err = ctor.invoke(&[None]).unwrap_err();
        assert!(matches!(err, DiError::MissingDependency { dependency: "alloc::string::String", .. }));
    }
}
