//! Factory compiler: lowers a [`ConstructionPlan`] into a [`CompiledFactory`].
//!
//! The plan first becomes an IR [`Program`]; the [`ClosureEmitter`]
//! backend then turns every instruction tree into a boxed closure. The
//! resulting factory never touches the registry or the resolver again.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use smallvec::SmallVec;
use tracing::debug;

use crate::constructor::{Constructor, Parameter, ParameterKind};
use crate::error::{DiError, DiResult};
use crate::ir::{Backend, Program};
use crate::key::Key;
use crate::plan::{ConstructionPlan, SlotId};
use crate::registration::{AnyArc, Caster, SingletonCell};

mod factory;

pub use factory::CompiledFactory;

/// Slot table handed to emitted code, indexed by [`SlotId`].
pub(crate) type Slots = [Arc<SingletonCell>];

/// One emitted instruction tree.
///
/// Yields `None` only for a defaulted reference parameter.
pub(crate) type Emitted = Box<dyn Fn(&Slots) -> DiResult<Option<AnyArc>> + Send + Sync>;

/// Turns construction plans into compiled factories.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactoryCompiler;

impl FactoryCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, plan: &ConstructionPlan) -> DiResult<CompiledFactory> {
        let program = Program::from_plan(plan)?;
        let listing = program.listing();

        let mut emitter = ClosureEmitter;
        let initializer: Vec<Emitted> = program
            .initializer()
            .iter()
            .map(|step| step.lower(&mut emitter))
            .collect();
        let entry = program.entry().lower(&mut emitter);

        let slots: Box<Slots> = program.slots().iter().map(|binding| binding.cell.clone()).collect();

        debug!(
            service = %program.root(),
            lifetime = program.lifetime().as_str(),
            nodes = plan.nodes().len(),
            slots = slots.len(),
            "compiled factory"
        );

        Ok(CompiledFactory {
            root: program.root().clone(),
            lifetime: program.lifetime(),
            slots,
            initializer,
            initialized: OnceCell::new(),
            entry,
            node_count: plan.nodes().len(),
            listing,
        })
    }
}

/// Backend emitting boxed closures over the slot table.
#[derive(Debug, Default)]
pub struct ClosureEmitter;

impl Backend for ClosureEmitter {
    type Output = Emitted;

    fn new_instance(&mut self, constructor: &Constructor, args: Vec<Emitted>) -> Emitted {
        let constructor = constructor.clone();
        Box::new(move |slots: &Slots| {
            let mut values: SmallVec<[Option<AnyArc>; 4]> = SmallVec::with_capacity(args.len());
            for arg in &args {
                values.push(arg(slots)?);
            }
            constructor.invoke(&values).map(Some)
        })
    }

    fn load_slot(&mut self, slot: SlotId, service: &Key) -> Emitted {
        let index = slot.index();
        let service = service.display_name();
        Box::new(move |slots: &Slots| {
            slots[index]
                .get()
                .cloned()
                .map(Some)
                .ok_or(DiError::SlotUninitialized(service))
        })
    }

    fn store_slot_once(&mut self, slot: SlotId, service: &Key, value: Emitted) -> Emitted {
        let index = slot.index();
        let service = service.display_name();
        Box::new(move |slots: &Slots| {
            let stored = slots[index].get_or_try_init(|| {
                value(slots)?.ok_or(DiError::SlotUninitialized(service))
            })?;
            Ok(Some(stored.clone()))
        })
    }

    fn default_value(&mut self, param: &Parameter) -> Emitted {
        match param.kind() {
            ParameterKind::Reference => Box::new(|_: &Slots| Ok(None)),
            ParameterKind::Value => {
                let param = param.clone();
                Box::new(move |_: &Slots| Ok(param.default_value()))
            }
        }
    }

    fn cast(&mut self, caster: &Caster, value: Emitted) -> Emitted {
        let caster = caster.clone();
        Box::new(move |slots: &Slots| match value(slots)? {
            Some(instance) => caster.apply(instance).map(Some),
            None => Ok(None),
        })
    }
}
