use std::fmt::Write;

use super::{Backend, Program};
use crate::constructor::{Constructor, Parameter, ParameterKind};
use crate::key::Key;
use crate::plan::SlotId;
use crate::registration::Caster;

/// Text backend used for diagnostics and [`crate::CompiledFactory::listing`].
///
/// ```text
/// factory app::Service (transient)
/// slots:
///   slot[0] app::Config
/// init:
///   slot[0] := once new app::Config()
/// entry:
///   new app::Service(load slot[0], default u64)
/// ```
#[derive(Debug, Default)]
pub struct Listing;

impl Listing {
    pub fn render(program: &Program) -> String {
        let mut backend = Listing;
        let mut out = String::new();

        let _ = writeln!(out, "factory {} ({})", program.root(), program.lifetime().as_str());
        if !program.slots().is_empty() {
            out.push_str("slots:\n");
            for (index, binding) in program.slots().iter().enumerate() {
                let _ = writeln!(out, "  {} {}", SlotId(index as u32), binding.service());
            }
        }
        if !program.initializer().is_empty() {
            out.push_str("init:\n");
            for step in program.initializer() {
                let _ = writeln!(out, "  {}", step.lower(&mut backend));
            }
        }
        out.push_str("entry:\n");
        let _ = writeln!(out, "  {}", program.entry().lower(&mut backend));
        out
    }
}

impl Backend for Listing {
    type Output = String;

    fn new_instance(&mut self, constructor: &Constructor, args: Vec<String>) -> String {
        format!("new {}({})", constructor.label(), args.join(", "))
    }

    fn load_slot(&mut self, slot: SlotId, _service: &Key) -> String {
        format!("load {}", slot)
    }

    fn store_slot_once(&mut self, slot: SlotId, _service: &Key, value: String) -> String {
        format!("{} := once {}", slot, value)
    }

    fn default_value(&mut self, param: &Parameter) -> String {
        match param.kind() {
            ParameterKind::Reference => format!("none {}", param.key()),
            ParameterKind::Value => format!("default {}", param.key()),
        }
    }

    fn cast(&mut self, caster: &Caster, value: String) -> String {
        format!("cast<{}>({})", caster.target(), value)
    }
}
