//! Builtin definitions for declarative registration.
//!
//! `BUILTINS` is the single table of names bound in the initial global
//! environment. Its order fixes the global ids the closure-graph compiler
//! assigns to builtins.

use super::native::Native;
use crate::effects::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Output0,
    Output1,
    Get,
}

impl Builtin {
    /// Fresh native body for this builtin
    pub fn native<V>(self) -> Native<V> {
        match self {
            Builtin::Output0 => Native::Output(false),
            Builtin::Output1 => Native::Output(true),
            Builtin::Get => Native::Get,
        }
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    pub fn def(self) -> &'static BuiltinDef {
        match self {
            Builtin::Output0 => &BUILTINS[0],
            Builtin::Output1 => &BUILTINS[1],
            Builtin::Get => &BUILTINS[2],
        }
    }

    pub fn from_name(name: &str) -> Option<Builtin> {
        BUILTINS.iter().find(|def| def.name == name).map(|def| def.builtin)
    }

    /// Position in `BUILTINS`
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Declarative definition of a builtin.
pub struct BuiltinDef {
    pub builtin: Builtin,
    /// Source-level name
    pub name: &'static str,
    /// Effect of fully applying the builtin
    pub effect: Effect,
    /// Curried argument count
    pub arity: u8,
    pub doc: &'static str,
}

pub const BUILTINS: &[BuiltinDef] = &[
    BuiltinDef {
        builtin: Builtin::Output0,
        name: "__builtin_p0",
        effect: Effect::Io,
        arity: 1,
        doc: "Emit a 0 bit and return the argument.",
    },
    BuiltinDef {
        builtin: Builtin::Output1,
        name: "__builtin_p1",
        effect: Effect::Io,
        arity: 1,
        doc: "Emit a 1 bit and return the argument.",
    },
    BuiltinDef {
        builtin: Builtin::Get,
        name: "__builtin_g",
        effect: Effect::Io,
        arity: 3,
        doc: "Read a bit: 0 selects the first argument, 1 the second, end of input the third.",
    },
];
