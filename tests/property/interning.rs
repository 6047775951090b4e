// Property tests: hash-consing of statements
use super::strategies::arb_shape;
use lmb::hir::{analyze_statement, ExprGraph};
use lmb::read_all;
use proptest::prelude::*;

fn analyze(graph: &mut ExprGraph, source: &str) -> lmb::hir::AnalysisResult {
    let stmt = read_all(source).remove(0).unwrap();
    analyze_statement(graph, &stmt.node)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn renaming_parameters_gives_the_same_node(shape in arb_shape()) {
        let mut graph = ExprGraph::new();
        let first = analyze(&mut graph, &shape.source("v"));
        let nodes = graph.len();
        let second = analyze(&mut graph, &shape.source("param_"));
        prop_assert!(first.expr == second.expr);
        prop_assert_eq!(first.free, second.free);
        prop_assert_eq!(graph.len(), nodes);
    }

    #[test]
    fn node_count_is_bounded_by_tree_size(shape in arb_shape()) {
        let mut graph = ExprGraph::new();
        let result = analyze(&mut graph, &shape.source("v"));
        prop_assert!(graph.len() <= result.expr.tree_size());
    }
}
