//! Instruction IR between construction plans and compiled factories.
//!
//! A [`Program`] is a backend-neutral description of one factory: a table
//! of singleton slots, an initializer that fills them (dependencies
//! first), and an entry expression producing the root. Backends consume
//! instructions through the [`Backend`] trait; the crate ships a closure
//! emitter (see [`crate::compiler`]) and a human-readable [`Listing`].

use std::sync::Arc;

use crate::constructor::{Constructor, Parameter};
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::plan::{ConstructionPlan, NodeId, NodeSource, SlotId};
use crate::registration::{Caster, SingletonCell};

mod listing;

pub use listing::Listing;

/// One instruction. Instructions nest; evaluation is children first.
#[derive(Debug, Clone)]
pub enum Instr {
    /// Evaluate `args` in order and call `constructor` with them
    NewInstance { constructor: Constructor, args: Vec<Instr> },
    /// Read a filled singleton slot
    LoadSlot { slot: SlotId, service: Key },
    /// Fill `slot` with `value` unless it already holds an instance
    StoreSlotOnce {
        slot: SlotId,
        service: Key,
        value: Box<Instr>,
    },
    /// Default for an unregistered parameter
    DefaultValue { param: Parameter },
    /// Reinterpret an implementation instance as its service type
    Cast { caster: Caster, value: Box<Instr> },
}

/// Code generation target for [`Instr`] trees.
///
/// [`Instr::lower`] walks the tree bottom-up and hands each node its
/// already lowered children.
pub trait Backend {
    type Output;

    fn new_instance(&mut self, constructor: &Constructor, args: Vec<Self::Output>) -> Self::Output;
    fn load_slot(&mut self, slot: SlotId, service: &Key) -> Self::Output;
    fn store_slot_once(&mut self, slot: SlotId, service: &Key, value: Self::Output) -> Self::Output;
    fn default_value(&mut self, param: &Parameter) -> Self::Output;
    fn cast(&mut self, caster: &Caster, value: Self::Output) -> Self::Output;
}

impl Instr {
    pub fn lower<B: Backend>(&self, backend: &mut B) -> B::Output {
        match self {
            Instr::NewInstance { constructor, args } => {
                let lowered = args.iter().map(|arg| arg.lower(backend)).collect();
                backend.new_instance(constructor, lowered)
            }
            Instr::LoadSlot { slot, service } => backend.load_slot(*slot, service),
            Instr::StoreSlotOnce { slot, service, value } => {
                let value = value.lower(backend);
                backend.store_slot_once(*slot, service, value)
            }
            Instr::DefaultValue { param } => backend.default_value(param),
            Instr::Cast { caster, value } => {
                let value = value.lower(backend);
                backend.cast(caster, value)
            }
        }
    }
}

/// Storage bound to one slot id.
#[derive(Debug, Clone)]
pub struct SlotBinding {
    pub(crate) service: Key,
    pub(crate) cell: Arc<SingletonCell>,
}

impl SlotBinding {
    pub fn service(&self) -> &Key {
        &self.service
    }
}

/// Lowered form of a [`ConstructionPlan`].
#[derive(Debug, Clone)]
pub struct Program {
    pub(crate) root: Key,
    pub(crate) lifetime: Lifetime,
    /// Indexed by [`SlotId`]
    pub(crate) slots: Vec<SlotBinding>,
    pub(crate) initializer: Vec<Instr>,
    pub(crate) entry: Instr,
}

impl Program {
    /// Translates a plan into instructions.
    ///
    /// Every singleton gets one `StoreSlotOnce` in the initializer, ordered
    /// so a slot is filled before anything loads it. Everywhere else a
    /// singleton is referenced through `LoadSlot`.
    pub fn from_plan(plan: &ConstructionPlan) -> DiResult<Self> {
        let mut slots = Vec::with_capacity(plan.slot_count());
        for index in 0..plan.slot_count() {
            let node = plan.node(plan.slot_node(SlotId(index as u32)));
            let cell = match node.source() {
                NodeSource::Registered { registration, .. } => registration.cell.clone(),
                NodeSource::Defaulted(_) => None,
            }
            .ok_or_else(|| DiError::SlotUninitialized(node.service().display_name()))?;
            slots.push(SlotBinding {
                service: node.service().clone(),
                cell,
            });
        }

        let initializer = plan
            .singleton_order()
            .into_iter()
            .filter_map(|id| {
                let node = plan.node(id);
                node.slot().map(|slot| Instr::StoreSlotOnce {
                    slot,
                    service: node.service().clone(),
                    value: Box::new(build(plan, id)),
                })
            })
            .collect();

        let root = plan.root_node();
        Ok(Self {
            root: root.service().clone(),
            lifetime: root.lifetime(),
            slots,
            initializer,
            entry: reference(plan, plan.root()),
        })
    }

    pub fn root(&self) -> &Key {
        &self.root
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn slots(&self) -> &[SlotBinding] {
        &self.slots
    }

    pub fn initializer(&self) -> &[Instr] {
        &self.initializer
    }

    pub fn entry(&self) -> &Instr {
        &self.entry
    }

    /// Renders the program with the [`Listing`] backend.
    pub fn listing(&self) -> String {
        Listing::render(self)
    }
}

/// How a parent refers to `id`: singletons by slot, everything else inline.
fn reference(plan: &ConstructionPlan, id: NodeId) -> Instr {
    let node = plan.node(id);
    match node.slot() {
        Some(slot) => Instr::LoadSlot {
            slot,
            service: node.service().clone(),
        },
        None => build(plan, id),
    }
}

/// The expression that constructs `id` itself.
fn build(plan: &ConstructionPlan, id: NodeId) -> Instr {
    let node = plan.node(id);
    match node.source() {
        NodeSource::Defaulted(param) => Instr::DefaultValue { param: param.clone() },
        NodeSource::Registered {
            registration,
            constructor,
        } => {
            let instance = Instr::NewInstance {
                constructor: constructor.clone(),
                args: node.args().iter().map(|&arg| reference(plan, arg)).collect(),
            };
            match &registration.cast {
                Some(caster) => Instr::Cast {
                    caster: caster.clone(),
                    value: Box::new(instance),
                },
                None => instance,
            }
        }
    }
}
