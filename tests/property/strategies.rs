// Proptest strategies for generating closed lmb programs
#![allow(dead_code)]

use proptest::prelude::*;

const BUILTINS: [&str; 3] = ["__builtin_p0", "__builtin_p1", "__builtin_g"];

/// Term shape with variables as relative binder distances
#[derive(Debug, Clone)]
pub enum Shape {
    /// Refers to an enclosing binder; a builtin when there is none
    Var(usize),
    Builtin(usize),
    Lam(Box<Shape>),
    App(Box<Shape>, Box<Shape>),
}

impl Shape {
    /// Render with parameters named `{prefix}{depth}`
    pub fn source(&self, prefix: &str) -> String {
        let mut out = String::new();
        self.write(prefix, 0, &mut out);
        out
    }

    fn write(&self, prefix: &str, depth: usize, out: &mut String) {
        match self {
            Shape::Var(i) if depth > 0 => {
                out.push_str(&format!("{}{}", prefix, depth - 1 - i % depth));
            }
            Shape::Var(i) => out.push_str(BUILTINS[i % 3]),
            Shape::Builtin(b) => out.push_str(BUILTINS[b % 3]),
            Shape::Lam(body) => {
                out.push_str(&format!("(\\{}{} ", prefix, depth));
                body.write(prefix, depth + 1, out);
                out.push(')');
            }
            Shape::App(func, arg) => {
                out.push('(');
                func.write(prefix, depth, out);
                out.push(' ');
                arg.write(prefix, depth, out);
                out.push(')');
            }
        }
    }
}

/// Closed terms up to depth 6
pub fn arb_shape() -> BoxedStrategy<Shape> {
    let leaf = prop_oneof![
        3 => (0usize..4).prop_map(Shape::Var),
        1 => (0usize..3).prop_map(Shape::Builtin),
    ];
    leaf.prop_recursive(6, 40, 2, |inner| {
        prop_oneof![
            2 => inner.clone().prop_map(|body| Shape::Lam(Box::new(body))),
            3 => (inner.clone(), inner).prop_map(|(f, a)| Shape::App(Box::new(f), Box::new(a))),
        ]
    })
    .boxed()
}

/// One to three statements, one per line
pub fn arb_program() -> BoxedStrategy<Vec<Shape>> {
    prop::collection::vec(arb_shape(), 1..4).boxed()
}

pub fn render(program: &[Shape], prefix: &str) -> String {
    program
        .iter()
        .map(|shape| shape.source(prefix))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Up to three input bytes
pub fn arb_input() -> BoxedStrategy<Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4).boxed()
}
