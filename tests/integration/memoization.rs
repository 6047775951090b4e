// Application caching, purity and closure sharing
use crate::common::run_with;
use lmb::hir::{analyze_statement, ExprGraph};
use lmb::{exec_source, read_all, EvalConfig, MemoryIo, Node, OptConfig, Session};

fn unfolded() -> EvalConfig {
    EvalConfig::default().with_fold_constants(false)
}

fn parse_one(source: &str) -> Node {
    read_all(source).remove(0).unwrap().node
}

#[test]
fn test_output_is_never_cached() {
    let source = "(__builtin_p0 __builtin_p0)\n(__builtin_p0 __builtin_p0)\n";
    for config in [EvalConfig::default(), unfolded()] {
        let (bits, errors) = run_with(source, &[], config).unwrap();
        assert!(errors.is_empty());
        assert_eq!(bits, vec![false, false]);
    }
}

#[test]
fn test_pure_application_is_computed_once() {
    let mut session = Session::new(MemoryIo::default(), unfolded()).unwrap();
    session
        .run_source("((\\i i) __builtin_p0)", |e| panic!("{}", e))
        .unwrap();
    let first = session.stats();
    assert_eq!(first.cache_hits, 0);
    assert_eq!(first.cache_stores, 1);

    session
        .run_source("((\\i i) __builtin_p0)", |e| panic!("{}", e))
        .unwrap();
    let second = session.stats().since(&first);
    assert_eq!(second.cache_hits, 1);
    assert_eq!(second.cache_stores, 0);
}

#[test]
fn test_impurity_reaches_the_caller() {
    // The partial application is pure and cached; the call that writes is not
    let source = "((\\f \\x f x) __builtin_p1 __builtin_p0)\n((\\f \\x f x) __builtin_p1 __builtin_p0)\n";
    let mut session = Session::new(MemoryIo::default(), unfolded()).unwrap();
    session.run_source(source, |e| panic!("{}", e)).unwrap();
    assert_eq!(session.with_io(|io| io.bits().to_vec()), vec![true, true]);
    assert!(session.stats().cache_hits >= 1);
    assert_eq!(session.stats().io_events, 2);
}

#[test]
fn test_partial_get_is_pure() {
    let source = "(__builtin_g __builtin_p0 __builtin_p1)\n(__builtin_g __builtin_p0 __builtin_p1)\n";
    let mut session = Session::new(MemoryIo::new([0xFF]), unfolded()).unwrap();
    session.run_source(source, |e| panic!("{}", e)).unwrap();
    assert_eq!(session.stats().cache_hits, 2);
    assert_eq!(session.with_io(|io| io.consumed()), 0);
}

#[test]
fn test_same_lambda_same_captures_is_one_closure() {
    let mut session = Session::new(MemoryIo::default(), EvalConfig::default()).unwrap();
    let stmt = read_all("((\\f \\x f) __builtin_p0)").remove(0).unwrap();
    let a = session.run_statement(&stmt).unwrap();
    let b = session.run_statement(&stmt).unwrap();
    assert_eq!(a.id(), b.id());

    let other = read_all("((\\f \\x f) __builtin_p1)").remove(0).unwrap();
    let c = session.run_statement(&other).unwrap();
    assert_ne!(a.id(), c.id());
}

#[test]
fn test_alpha_equivalent_statements_share_nodes() {
    let mut graph = ExprGraph::new();
    let first = analyze_statement(&mut graph, &parse_one("((\\x \\y x y) __builtin_p0)"));
    let nodes = graph.len();
    let second = analyze_statement(&mut graph, &parse_one("((\\a \\b a b) __builtin_p0)"));
    assert_eq!(first.expr, second.expr);
    assert_eq!(first.free, second.free);
    assert_eq!(graph.len(), nodes);
}

#[test]
fn test_rerunning_a_statement_adds_no_nodes() {
    let mut session = Session::new(MemoryIo::default(), EvalConfig::default()).unwrap();
    let source = "((\\f \\x f (f x)) __builtin_p1 __builtin_p0)";
    session.run_source(source, |e| panic!("{}", e)).unwrap();
    let nodes = session.graph().len();
    session.run_source(source, |e| panic!("{}", e)).unwrap();
    assert_eq!(session.graph().len(), nodes);
    assert_eq!(session.statements(), 2);
}

#[test]
fn test_machine_caches_pure_applications() {
    let source = "((\\id (id __builtin_p0) (id __builtin_p0)) (\\i i))";
    let (io, stats) = exec_source(source, &OptConfig::none(), MemoryIo::default(), None).unwrap();
    assert_eq!(io.bits(), &[false]);
    assert!(stats.cache_hits >= 1);
}
