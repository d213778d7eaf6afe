//! Graph resolver: walks constructor parameters from a root service and
//! produces a [`ConstructionPlan`].

use std::any::TypeId;
use std::sync::Arc;

use tracing::trace;

use super::{ConstructionNode, ConstructionPlan, NodeId, NodeSource, SlotId};
use crate::config::{ConstructorPolicy, ContainerOptions, MissingDependencyPolicy};
use crate::constructor::{Constructor, Parameter};
use crate::error::{DiError, DiResult};
use crate::internal::{FastMap, ResolutionStack};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Registry, ServiceRegistration};

/// Builds construction plans against a frozen registration store.
///
/// Each call to [`resolve`](Self::resolve) is an independent walk with its
/// own cycle stack and singleton table, so one resolver can serve many
/// threads at once.
pub struct GraphResolver<'r> {
    registry: &'r Registry,
    options: &'r ContainerOptions,
}

impl<'r> GraphResolver<'r> {
    pub(crate) fn new(registry: &'r Registry, options: &'r ContainerOptions) -> Self {
        Self { registry, options }
    }

    /// Plans construction of `root`.
    ///
    /// Fails with [`DiError::NotFound`] if the root itself is unregistered,
    /// [`DiError::Circular`] on a cycle, [`DiError::NoConstructor`] if a
    /// reached registration declares no constructor, and
    /// [`DiError::MissingDependency`] for unregistered nested dependencies
    /// under [`MissingDependencyPolicy::Error`].
    pub fn resolve(&self, root: &Key) -> DiResult<ConstructionPlan> {
        let registration = self
            .registry
            .lookup(root)
            .ok_or_else(|| DiError::NotFound(root.display_name()))?;

        let mut walk = Walk {
            registry: self.registry,
            options: self.options,
            nodes: Vec::new(),
            slots: Vec::new(),
            singletons: FastMap::default(),
            stack: ResolutionStack::new(self.options.max_depth),
        };
        let root_id = walk.visit(registration)?;

        trace!(
            service = %root,
            nodes = walk.nodes.len(),
            slots = walk.slots.len(),
            "construction plan resolved"
        );

        Ok(ConstructionPlan {
            nodes: walk.nodes,
            root: root_id,
            slots: walk.slots,
        })
    }

    /// The constructor the policy picks for `registration`.
    pub fn select_constructor<'a>(&self, registration: &'a ServiceRegistration) -> DiResult<&'a Constructor> {
        select_constructor(registration, self.options.constructor_policy)
    }
}

pub(crate) fn select_constructor(
    registration: &ServiceRegistration,
    policy: ConstructorPolicy,
) -> DiResult<&Constructor> {
    let candidates = registration.constructors();
    let selected = match policy {
        ConstructorPolicy::FirstDeclared => candidates.first(),
        // Ties go to the earliest declaration
        ConstructorPolicy::MostParameters => candidates.iter().fold(None, |best: Option<&Constructor>, ctor| match best {
            Some(current) if current.arity() >= ctor.arity() => Some(current),
            _ => Some(ctor),
        }),
    };
    selected.ok_or(DiError::NoConstructor(registration.implementation_name()))
}

/// State of one resolution.
struct Walk<'r> {
    registry: &'r Registry,
    options: &'r ContainerOptions,
    nodes: Vec<ConstructionNode>,
    slots: Vec<NodeId>,
    singletons: FastMap<(Key, TypeId), NodeId>,
    stack: ResolutionStack,
}

impl<'r> Walk<'r> {
    fn visit(&mut self, registration: &'r Arc<ServiceRegistration>) -> DiResult<NodeId> {
        let memo_key = (registration.key.clone(), registration.impl_id);
        if registration.lifetime == Lifetime::Singleton {
            if let Some(&existing) = self.singletons.get(&memo_key) {
                return Ok(existing);
            }
        }

        self.stack.enter(&registration.key)?;
        let built = self.construct(registration);
        self.stack.leave(&registration.key);
        let id = built?;

        if registration.lifetime == Lifetime::Singleton {
            self.singletons.insert(memo_key, id);
        }
        Ok(id)
    }

    fn construct(&mut self, registration: &'r Arc<ServiceRegistration>) -> DiResult<NodeId> {
        let constructor = select_constructor(registration, self.options.constructor_policy)?;

        let mut args = Vec::with_capacity(constructor.arity());
        for param in constructor.params() {
            let registry = self.registry;
            let child = match registry.lookup(param.key()) {
                Some(dependency) => self.visit(dependency)?,
                None => self.missing(registration, param)?,
            };
            args.push(child);
        }

        let id = NodeId(self.nodes.len() as u32);
        let slot = match registration.lifetime {
            Lifetime::Singleton => {
                let slot = SlotId(self.slots.len() as u32);
                self.slots.push(id);
                Some(slot)
            }
            Lifetime::Transient => None,
        };

        self.nodes.push(ConstructionNode {
            service: registration.key.clone(),
            lifetime: registration.lifetime,
            args,
            slot,
            source: NodeSource::Registered {
                registration: registration.clone(),
                constructor: constructor.clone(),
            },
        });
        Ok(id)
    }

    fn missing(&mut self, registration: &ServiceRegistration, param: &Parameter) -> DiResult<NodeId> {
        if self.options.missing_dependency == MissingDependencyPolicy::Error {
            return Err(DiError::MissingDependency {
                service: registration.key.display_name(),
                dependency: param.key().display_name(),
            });
        }

        trace!(
            service = %registration.key,
            dependency = %param.key(),
            depth = self.stack.depth(),
            "defaulting unregistered dependency"
        );

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ConstructionNode {
            service: param.key().clone(),
            lifetime: Lifetime::Transient,
            args: Vec::new(),
            slot: None,
            source: NodeSource::Defaulted(param.clone()),
        });
        Ok(id)
    }
}
