//! Runtime support prepended to every emitted program
//!
//! The emitted program is a single Rust file with no dependencies. Values
//! are `Rc<dyn Lambda>`; every instance gets an id from a thread-local
//! counter, and `apply` memoizes pure applications on `(func id, arg id)`
//! exactly like the evaluator does. Builtins read and write bits MSB-first
//! on stdin and stdout.

pub const PRELUDE: &str = r#"use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::rc::Rc;

type Value = Rc<dyn Lambda>;

const EXIT_FATAL: i32 = 70;

trait Lambda {
    fn id(&self) -> u64;
    fn call(&self, arg: Value) -> Value;
}

thread_local! {
    static NEXT_ID: Cell<u64> = Cell::new(0);
    static PURE: Cell<bool> = Cell::new(true);
    static MEMO: RefCell<HashMap<(u64, u64), Value>> = RefCell::new(HashMap::new());
    // (accumulated bits, bit count)
    static OUT: Cell<(u8, u8)> = Cell::new((0, 0));
    // (current byte, bits left, end of input)
    static IN: Cell<(u8, u8, bool)> = Cell::new((0, 0, false));
}

fn fresh_id() -> u64 {
    NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

fn apply(func: &Value, arg: &Value) -> Value {
    let key = (func.id(), arg.id());
    if let Some(hit) = MEMO.with(|memo| memo.borrow().get(&key).cloned()) {
        return hit;
    }
    let saved = PURE.with(|pure| pure.replace(true));
    let result = func.call(arg.clone());
    let pure = PURE.with(|flag| {
        let pure = flag.get();
        flag.set(saved && pure);
        pure
    });
    if pure {
        MEMO.with(|memo| memo.borrow_mut().insert(key, result.clone()));
    }
    result
}

fn emit_bit(bit: bool) {
    PURE.with(|pure| pure.set(false));
    OUT.with(|out| {
        let (acc, count) = out.get();
        let acc = (acc << 1) | bit as u8;
        if count + 1 == 8 {
            let mut stdout = std::io::stdout();
            if let Err(err) = stdout.write_all(&[acc]).and_then(|_| stdout.flush()) {
                eprintln!("cannot write output: {}", err);
                std::process::exit(EXIT_FATAL);
            }
            out.set((0, 0));
        } else {
            out.set((acc, count + 1));
        }
    });
}

fn read_bit() -> Option<bool> {
    PURE.with(|pure| pure.set(false));
    IN.with(|input| {
        let (mut byte, mut left, eof) = input.get();
        if left == 0 {
            if eof {
                return None;
            }
            let mut buf = [0u8; 1];
            if std::io::stdin().read_exact(&mut buf).is_err() {
                input.set((0, 0, true));
                return None;
            }
            byte = buf[0];
            left = 8;
        }
        left -= 1;
        input.set((byte, left, false));
        Some((byte >> left) & 1 == 1)
    })
}

struct Output {
    id: u64,
    bit: bool,
}

impl Lambda for Output {
    fn id(&self) -> u64 {
        self.id
    }

    fn call(&self, arg: Value) -> Value {
        emit_bit(self.bit);
        arg
    }
}

struct Get {
    id: u64,
}

impl Lambda for Get {
    fn id(&self) -> u64 {
        self.id
    }

    fn call(&self, arg: Value) -> Value {
        Rc::new(GetK0 { id: fresh_id(), k0: arg })
    }
}

struct GetK0 {
    id: u64,
    k0: Value,
}

impl Lambda for GetK0 {
    fn id(&self) -> u64 {
        self.id
    }

    fn call(&self, arg: Value) -> Value {
        Rc::new(GetK1 {
            id: fresh_id(),
            k0: self.k0.clone(),
            k1: arg,
        })
    }
}

struct GetK1 {
    id: u64,
    k0: Value,
    k1: Value,
}

impl Lambda for GetK1 {
    fn id(&self) -> u64 {
        self.id
    }

    fn call(&self, arg: Value) -> Value {
        match read_bit() {
            Some(false) => self.k0.clone(),
            Some(true) => self.k1.clone(),
            None => arg,
        }
    }
}

struct World {
    id: u64,
}

impl Lambda for World {
    fn id(&self) -> u64 {
        self.id
    }

    fn call(&self, _arg: Value) -> Value {
        panic!("the world value is not callable");
    }
}
"#;
