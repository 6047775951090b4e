//! Named AST to closure graph
//!
//! Every AST lambda becomes one `CodeLambda`. Names resolve outward through
//! a stack of frames: a lambda's own parameter is `Arg`, a name it already
//! captured is `Env(k)`, and anything else is resolved in the parent and
//! captured in first-use order. Builtins resolve to their `Global` id and
//! are never captured. Each statement is lowered into a root lambda whose
//! parameter is the world value, which it ignores.

use super::types::{CodeGraph, CodeId, CodeInst, CodeLambda, LambdaId};
use crate::error::{LError, LResult};
use crate::primitives::Builtin;
use crate::reader::Node;
use std::collections::BTreeSet;

/// Lowering state of one lambda under construction
struct Frame {
    /// `None` for a statement root
    param: Option<String>,
    /// Captured names, slot order
    captures: Vec<String>,
    /// Parent operand supplying each captured slot
    capture_ids: Vec<CodeId>,
    body: Vec<CodeInst>,
    next_local: u32,
    deps: BTreeSet<LambdaId>,
}

impl Frame {
    fn new(param: Option<String>) -> Self {
        Frame {
            param,
            captures: Vec::new(),
            capture_ids: Vec::new(),
            body: Vec::new(),
            next_local: 0,
            deps: BTreeSet::new(),
        }
    }

    fn fresh_local(&mut self) -> CodeId {
        let id = CodeId::Local(self.next_local);
        self.next_local += 1;
        id
    }
}

pub struct Lowerer<'g> {
    graph: &'g mut CodeGraph,
    frames: Vec<Frame>,
    /// Names nothing binds, first-use order
    unresolved: Vec<String>,
}

impl<'g> Lowerer<'g> {
    pub fn new(graph: &'g mut CodeGraph) -> Self {
        Lowerer {
            graph,
            frames: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// Lower one statement into a new root lambda.
    ///
    /// On an unresolved name nothing is added to the graph.
    pub fn lower_statement(&mut self, node: &Node) -> LResult<LambdaId> {
        let mark = self.graph.mark();
        self.frames.clear();
        self.unresolved.clear();

        self.frames.push(Frame::new(None));
        let ret = self.lower(node);
        let frame = self.pop_frame()?;

        if !self.unresolved.is_empty() {
            self.graph.truncate(mark);
            return Err(LError::unresolved(std::mem::take(&mut self.unresolved)));
        }
        if !frame.captures.is_empty() {
            self.graph.truncate(mark);
            return Err(LError::internal("statement root captured a variable"));
        }
        let root = self.finish(frame, ret);
        self.graph.roots.push(root);
        log::trace!(
            "lowered statement into {} ({} lambdas total)",
            root,
            self.graph.len()
        );
        Ok(root)
    }

    fn lower(&mut self, node: &Node) -> CodeId {
        match node {
            Node::Ref(name) => {
                let depth = self.frames.len() - 1;
                self.resolve(depth, name)
            }
            Node::Apply(func, arg) => {
                let func = self.lower(func);
                let arg = self.lower(arg);
                let frame = self.current();
                let retv = frame.fresh_local();
                frame.body.push(CodeInst::Apply { retv, func, arg });
                retv
            }
            Node::Lambda(param, body) => {
                self.frames.push(Frame::new(Some(param.clone())));
                let ret = self.lower(body);
                let Ok(frame) = self.pop_frame() else {
                    return CodeId::Arg;
                };
                let envs = frame.capture_ids.clone();
                let lambda = self.finish(frame, ret);
                let parent = self.current();
                let retv = parent.fresh_local();
                parent.body.push(CodeInst::Lambda { retv, lambda, envs });
                parent.deps.insert(lambda);
                retv
            }
        }
    }

    /// Operand naming `name` inside frame `depth`
    fn resolve(&mut self, depth: usize, name: &str) -> CodeId {
        let frame = &self.frames[depth];
        if frame.param.as_deref() == Some(name) {
            return CodeId::Arg;
        }
        if let Some(slot) = frame.captures.iter().position(|c| c == name) {
            return CodeId::Env(slot as u32);
        }
        if depth == 0 {
            if let Some(builtin) = Builtin::from_name(name) {
                return CodeId::Global(builtin.index());
            }
            if !self.unresolved.iter().any(|n| n == name) {
                self.unresolved.push(name.to_string());
            }
            return CodeId::Arg;
        }
        let outer = self.resolve(depth - 1, name);
        if let CodeId::Global(_) = outer {
            return outer;
        }
        let frame = &mut self.frames[depth];
        let slot = frame.captures.len() as u32;
        frame.captures.push(name.to_string());
        frame.capture_ids.push(outer);
        CodeId::Env(slot)
    }

    fn current(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::new(None));
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn pop_frame(&mut self) -> LResult<Frame> {
        self.frames
            .pop()
            .ok_or_else(|| LError::internal("lowering frame stack underflow"))
    }

    fn finish(&mut self, frame: Frame, ret: CodeId) -> LambdaId {
        let id = self.graph.alloc();
        if let Some(lambda) = self.graph.get_mut(id) {
            let name = lambda.name;
            *lambda = CodeLambda {
                name,
                env_cnt: frame.captures.len() as u32,
                body: frame.body,
                ret,
                deps: frame.deps,
                is_static: false,
            };
        }
        id
    }
}

/// Lower `node` as a new root of `graph`
pub fn lower_statement(graph: &mut CodeGraph, node: &Node) -> LResult<LambdaId> {
    Lowerer::new(graph).lower_statement(node)
}
