// Work-stealing evaluator against the sequential one
use crate::common::{ones, run_with};
use lmb::{read_all, EvalConfig, MemoryIo, Session};

const READ_ONE: &str = "(__builtin_g (\\w __builtin_p0 w) (\\w __builtin_p1 w) (\\w __builtin_p1 (__builtin_p1 w)) __builtin_p0)";

fn agree(source: &str, input: &[u8]) {
    let (expected, errors) = run_with(source, input, EvalConfig::default()).unwrap();
    assert!(errors.is_empty());
    for jobs in [2, 4] {
        for fold in [true, false] {
            let config = EvalConfig::default()
                .with_jobs(jobs)
                .with_fold_constants(fold);
            let (bits, errors) = run_with(source, input, config).unwrap();
            assert!(errors.is_empty());
            assert_eq!(bits, expected, "jobs={} fold={} source={}", jobs, fold, source);
        }
    }
}

#[test]
fn test_parallel_output_chain() {
    agree(&ones(16), &[]);
}

#[test]
fn test_parallel_input_echo() {
    let source = vec![READ_ONE; 10].join("\n");
    agree(&source, &[0x5A]);
}

#[test]
fn test_parallel_forked_sides() {
    agree(
        "((\\a \\b b) ((\\i i) __builtin_p0) (__builtin_p1 __builtin_p1))",
        &[],
    );
}

#[test]
fn test_parallel_church_numerals() {
    // Church three applied to a writer of 1
    agree(
        "((\\n n (\\w __builtin_p1 w) __builtin_p0) (\\f \\x f (f (f x))))",
        &[],
    );
}

#[test]
fn test_parallel_unresolved_is_recoverable() {
    let config = EvalConfig::default().with_jobs(2);
    let (bits, errors) = run_with("(nope __builtin_p0)\n(__builtin_p1 __builtin_p1)", &[], config).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(bits, vec![true]);
}

#[test]
fn test_parallel_closure_sharing() {
    let mut session = Session::new(MemoryIo::default(), EvalConfig::default().with_jobs(2)).unwrap();
    let stmt = read_all("((\\f \\x f) __builtin_p0)").remove(0).unwrap();
    let a = session.run_statement(&stmt).unwrap();
    let b = session.run_statement(&stmt).unwrap();
    assert_eq!(a.id(), b.id());
}
