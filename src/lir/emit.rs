//! Closure graph to Rust source
//!
//! Every surviving lambda becomes a struct holding its captured slots and an
//! implementation of the runtime's `Lambda` trait whose `call` runs the
//! instruction list. Definitions come out dependency-first. Builtins and
//! static lambdas are thread-local singletons behind `g{n}()`. The entry
//! point applies every root, in order, to the world sentinel on a thread
//! with a large stack.

use super::runtime::PRELUDE;
use super::types::{CodeGraph, CodeId, CodeInst, CodeLambda, GlobalDef, LambdaId};
use crate::config::DEFAULT_STACK_SIZE;
use crate::primitives::Builtin;
use std::fmt;

pub struct Emitter<'g> {
    graph: &'g CodeGraph,
    /// Stack of the thread running the program
    stack_size: usize,
}

impl<'g> Emitter<'g> {
    pub fn new(graph: &'g CodeGraph) -> Self {
        Emitter {
            graph,
            stack_size: DEFAULT_STACK_SIZE,
        }
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// The complete program text
    pub fn emit(&self) -> String {
        let source = self.to_string();
        log::debug!(
            "emitted {} lambdas, {} bytes of source",
            self.graph.len(),
            source.len()
        );
        source
    }

    fn write_globals(&self, out: &mut fmt::Formatter<'_>, order: &[LambdaId]) -> fmt::Result {
        let mut names = Vec::new();
        writeln!(out, "thread_local! {{")?;
        for (name, def) in self.graph.globals().iter().enumerate() {
            let init = match def {
                GlobalDef::Builtin(Builtin::Output0) => {
                    "Rc::new(Output { id: fresh_id(), bit: false })".to_string()
                }
                GlobalDef::Builtin(Builtin::Output1) => {
                    "Rc::new(Output { id: fresh_id(), bit: true })".to_string()
                }
                GlobalDef::Builtin(Builtin::Get) => "Rc::new(Get { id: fresh_id() })".to_string(),
                GlobalDef::Lambda(id) => {
                    let is_static = order.contains(id)
                        && self.graph.get(*id).is_some_and(|l| l.is_static);
                    if !is_static {
                        continue;
                    }
                    format!("Rc::new(L{}::new([]))", id.0)
                }
            };
            writeln!(out, "    static G{}: Value = {};", name, init)?;
            names.push(name);
        }
        writeln!(out, "}}")?;
        for name in names {
            writeln!(out)?;
            writeln!(
                out,
                "fn g{}() -> Value {{\n    G{}.with(|v| v.clone())\n}}",
                name, name
            )?;
        }
        Ok(())
    }

    fn write_lambda(&self, out: &mut fmt::Formatter<'_>, id: LambdaId, lambda: &CodeLambda) -> fmt::Result {
        let n = lambda.env_cnt;
        writeln!(out, "struct L{} {{", id.0)?;
        writeln!(out, "    id: u64,")?;
        writeln!(out, "    env: [Value; {}],", n)?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "impl L{} {{", id.0)?;
        writeln!(out, "    fn new(env: [Value; {}]) -> Self {{", n)?;
        writeln!(out, "        L{} {{ id: fresh_id(), env }}", id.0)?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        writeln!(out, "impl Lambda for L{} {{", id.0)?;
        writeln!(out, "    fn id(&self) -> u64 {{\n        self.id\n    }}")?;
        writeln!(out)?;
        writeln!(out, "    fn call(&self, arg: Value) -> Value {{")?;
        for inst in &lambda.body {
            match inst {
                CodeInst::Apply { retv, func, arg } => writeln!(
                    out,
                    "        let {} = apply({}, {});",
                    local_name(*retv),
                    borrowed(*func),
                    borrowed(*arg)
                )?,
                CodeInst::Lambda { retv, lambda, envs } => {
                    let envs: Vec<String> = envs.iter().map(|&op| owned(op)).collect();
                    writeln!(
                        out,
                        "        let {}: Value = Rc::new(L{}::new([{}]));",
                        local_name(*retv),
                        lambda.0,
                        envs.join(", ")
                    )?
                }
            }
        }
        writeln!(out, "        {}", owned(lambda.ret))?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")
    }

    fn write_main(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "const STACK_SIZE: usize = {};", self.stack_size)?;
        writeln!(out)?;
        writeln!(out, "fn main() {{")?;
        writeln!(out, "    let runner = std::thread::Builder::new()")?;
        writeln!(out, "        .stack_size(STACK_SIZE)")?;
        writeln!(out, "        .spawn(|| {{")?;
        writeln!(out, "            let world: Value = Rc::new(World {{ id: fresh_id() }});")?;
        for root in &self.graph.roots {
            writeln!(out, "            let root: Value = Rc::new(L{}::new([]));", root.0)?;
            writeln!(out, "            apply(&root, &world);")?;
        }
        writeln!(out, "        }})")?;
        writeln!(out, "        .expect(\"failed to start the program thread\");")?;
        writeln!(out, "    if runner.join().is_err() {{")?;
        writeln!(out, "        std::process::exit(EXIT_FATAL);")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")
    }
}

impl fmt::Display for Emitter<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = self.graph.post_order();
        writeln!(out, "// Generated by lmb.")?;
        writeln!(out, "#![allow(unused)]")?;
        writeln!(out)?;
        out.write_str(PRELUDE)?;
        writeln!(out)?;
        self.write_globals(out, &order)?;
        for &id in &order {
            let Some(lambda) = self.graph.get(id) else {
                continue;
            };
            writeln!(out)?;
            self.write_lambda(out, id, lambda)?;
        }
        writeln!(out)?;
        self.write_main(out)
    }
}

fn local_name(id: CodeId) -> String {
    match id {
        CodeId::Local(n) => format!("l{}", n),
        _ => "_".to_string(),
    }
}

/// Operand as a `&Value` expression
fn borrowed(id: CodeId) -> String {
    match id {
        CodeId::Local(n) => format!("&l{}", n),
        CodeId::Env(k) => format!("&self.env[{}]", k),
        CodeId::Arg => "&arg".to_string(),
        CodeId::Global(g) => format!("&g{}()", g),
    }
}

/// Operand as an owned `Value` expression
fn owned(id: CodeId) -> String {
    match id {
        CodeId::Local(n) => format!("l{}.clone()", n),
        CodeId::Env(k) => format!("self.env[{}].clone()", k),
        CodeId::Arg => "arg.clone()".to_string(),
        CodeId::Global(g) => format!("g{}()", g),
    }
}
