//! Native closure bodies
//!
//! `get` is curried three deep. The first two applications only capture
//! their argument and are pure; the third reads a bit. Both the tree
//! evaluator and the graph machine run the same step function over their own
//! value types.

use super::bitio::BitIo;
use crate::effects::Effect;
use std::io;

#[derive(Debug, Clone)]
pub enum Native<V> {
    /// `__builtin_p0` / `__builtin_p1`
    Output(bool),
    /// `__builtin_g` before any argument
    Get,
    /// `get k0`
    GetK0(V),
    /// `get k0 k1`
    GetK1(V, V),
}

/// What applying a native produced
#[derive(Debug)]
pub enum NativeStep<V> {
    /// An existing value
    Value(V),
    /// A new partial application that needs a closure of its own
    Partial(Native<V>),
}

impl<V: Clone> Native<V> {
    /// Apply to `arg`, doing any bit I/O on `io`.
    pub fn step<IO: BitIo + ?Sized>(
        &self,
        arg: &V,
        io: &mut IO,
    ) -> io::Result<(NativeStep<V>, Effect)> {
        match self {
            Native::Output(bit) => {
                io.emit_bit(*bit)?;
                Ok((NativeStep::Value(arg.clone()), Effect::Io))
            }
            Native::Get => Ok((
                NativeStep::Partial(Native::GetK0(arg.clone())),
                Effect::Pure,
            )),
            Native::GetK0(k0) => Ok((
                NativeStep::Partial(Native::GetK1(k0.clone(), arg.clone())),
                Effect::Pure,
            )),
            Native::GetK1(k0, k1) => {
                let chosen = match io.read_bit()? {
                    Some(false) => k0.clone(),
                    Some(true) => k1.clone(),
                    None => arg.clone(),
                };
                Ok((NativeStep::Value(chosen), Effect::Io))
            }
        }
    }

    /// Whether applying this native may touch I/O
    pub fn does_io(&self) -> bool {
        matches!(self, Native::Output(_) | Native::GetK1(..))
    }
}
