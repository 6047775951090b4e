//! Builtins bound in the initial global environment, and the bit I/O they
//! drive.

pub mod bitio;
pub mod def;
pub mod native;
pub mod registration;

pub use bitio::{BitIo, BitPort, BitReader, BitWriter, MemoryIo};
pub use def::{Builtin, BuiltinDef, BUILTINS};
pub use native::{Native, NativeStep};
pub use registration::{builtin_closure, register_builtins, Globals};
