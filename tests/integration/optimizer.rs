// Closure graph optimization and code emission
use crate::common::{exec_bits, ones};
use lmb::{compile_source, emit_source, ErrorKind, OptConfig};

const PROGRAMS: &[&str] = &[
    "((\\f \\x f (f x)) __builtin_p1 __builtin_p0)",
    "((\\pair pair (\\a \\b a)) ((\\x \\y \\s s x y) __builtin_p0 __builtin_p1) __builtin_p1)",
    "((\\k (k __builtin_p0) (k __builtin_p1)) (\\v \\w v w))",
    "((\\a \\b a (b a)) (\\x x) (\\y y) __builtin_p1 __builtin_p0)",
    "(__builtin_g (\\w __builtin_p0 w) (\\w __builtin_p1 w) (\\w w) __builtin_p1)",
];

fn configs() -> Vec<OptConfig> {
    vec![
        OptConfig::none(),
        OptConfig::none().with_inline(true),
        OptConfig::none().with_statics(true),
        OptConfig::none().with_dedup(true),
        OptConfig::default(),
    ]
}

#[test]
fn test_every_pass_combination_keeps_output() {
    for source in PROGRAMS {
        let expected = exec_bits(source, &[0xC0], &OptConfig::none());
        for config in configs() {
            assert_eq!(
                exec_bits(source, &[0xC0], &config),
                expected,
                "{:?} changed the output of {}",
                config,
                source
            );
        }
    }
}

#[test]
fn test_optimizing_never_adds_lambdas() {
    for source in PROGRAMS {
        let (_, stats) = compile_source(source, &OptConfig::default()).unwrap();
        assert!(stats.lambdas_after <= stats.lambdas_before, "{}", stats);
    }
}

#[test]
fn test_alpha_equivalent_lambdas_are_merged() {
    let source = "((\\a \\b a b) (\\x x) (\\y y) __builtin_p1)";
    let (plain, _) = compile_source(source, &OptConfig::none()).unwrap();
    let (merged, stats) = compile_source(source, &OptConfig::none().with_dedup(true)).unwrap();
    assert!(stats.deduplicated >= 1);
    assert!(merged.len() < plain.len());
}

#[test]
fn test_single_use_lambda_is_inlined() {
    let (_, stats) =
        compile_source("((\\x x) __builtin_p1)", &OptConfig::none().with_inline(true)).unwrap();
    assert!(stats.inlined >= 1, "{}", stats);
}

#[test]
fn test_closed_lambda_becomes_static() {
    let source = "((\\k k __builtin_p0) (\\v v))";
    let (graph, stats) = compile_source(source, &OptConfig::none().with_statics(true)).unwrap();
    assert!(stats.statics >= 1, "{}", stats);
    assert!(graph.to_string().contains("static"));
}

#[test]
fn test_roots_follow_statement_order() {
    let (graph, _) = compile_source(
        "(__builtin_p1 __builtin_p1)\n(__builtin_p0 __builtin_p0)\n",
        &OptConfig::default(),
    )
    .unwrap();
    assert_eq!(graph.roots.len(), 2);
    assert_eq!(
        exec_bits("(__builtin_p1 __builtin_p1)\n(__builtin_p0 __builtin_p0)\n", &[], &OptConfig::default()),
        vec![true, false]
    );
}

#[test]
fn test_emitted_program_shape() {
    let program = emit_source(&ones(8), &OptConfig::default(), 8 << 20).unwrap();
    assert!(program.contains("trait Lambda"));
    assert!(program.contains("fn main()"));
    assert!(program.contains("const STACK_SIZE: usize = 8388608;"));
    assert_eq!(program.matches("fn main()").count(), 1);
}

#[test]
fn test_emit_rejects_unresolved_names() {
    let err = emit_source("(__builtin_p1 nothing)", &OptConfig::default(), 1 << 20).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnresolvedIdentifier { .. }));
}

#[test]
fn test_emit_rejects_syntax_errors() {
    let err = emit_source("(__builtin_p1", &OptConfig::default(), 1 << 20).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Syntax { .. }));
}
