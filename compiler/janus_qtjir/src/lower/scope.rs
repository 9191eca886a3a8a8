//! Name bindings during function lowering.
//!
//! `let` binds an SSA value directly. `var` binds an `Alloca` slot, read
//! with `Load` and written with `Store`, so loop-carried and
//! branch-updated locals never need their own phis. This holds for `&dyn`
//! locals too: a `var` stores its vtable value and every use loads it.
//! Child scopes are created by cloning and restored on block exit.

use janus_ir::Name;
use rustc_hash::FxHashMap;

use super::types::ValueType;
use crate::ir::{IrRef, LabelId};

#[derive(Clone, Debug)]
pub(crate) enum Binding {
    Value { value: IrRef, ty: ValueType },
    Slot { ptr: IrRef, ty: ValueType },
}

#[derive(Clone, Default)]
pub(crate) struct Scope {
    bindings: FxHashMap<Name, Binding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an immutable value.
    pub fn bind(&mut self, name: Name, value: IrRef, ty: ValueType) {
        self.bindings.insert(name, Binding::Value { value, ty });
    }

    /// Bind a mutable slot.
    pub fn bind_slot(&mut self, name: Name, ptr: IrRef, ty: ValueType) {
        self.bindings.insert(name, Binding::Slot { ptr, ty });
    }

    pub fn lookup(&self, name: Name) -> Option<&Binding> {
        self.bindings.get(&name)
    }

    pub fn is_bound(&self, name: Name) -> bool {
        self.bindings.contains_key(&name)
    }
}

/// Jump targets of the innermost enclosing loop.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LoopTargets {
    pub continue_to: LabelId,
    pub break_to: LabelId,
}
