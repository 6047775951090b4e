// End-to-end programs run through both execution modes
use crate::common::{bits_of, exec_bits, ones, run_bits, run_with};
use lmb::{read_all, EvalConfig, ErrorKind, MemoryIo, OptConfig, Session};

const READ_ONE: &str = "(__builtin_g (\\w __builtin_p0 w) (\\w __builtin_p1 w) (\\w __builtin_p1 (__builtin_p1 w)) __builtin_p0)";

fn repeat(statement: &str, count: usize) -> String {
    vec![statement; count].join("\n")
}

#[test]
fn test_identity_returns_builtin_without_io() {
    let mut session = Session::new(MemoryIo::default(), EvalConfig::default()).unwrap();
    let stmt = read_all("((\\x x) __builtin_p1)").remove(0).unwrap();
    let value = session.run_statement(&stmt).unwrap();
    let builtin = session.globals().lookup("__builtin_p1").unwrap();
    assert_eq!(value.id(), builtin.id());
    assert!(session.with_io(|io| io.bits().is_empty()));
}

#[test]
fn test_identity_in_compiled_mode_has_no_output() {
    assert!(exec_bits("((\\x x) __builtin_p1)", &[], &OptConfig::default()).is_empty());
}

#[test]
fn test_reading_a_zero_byte_then_eof() {
    let source = repeat(READ_ONE, 9);
    let mut expected = vec![false; 8];
    expected.extend([true, true]);
    assert_eq!(run_bits(&source, &[0x00]), expected);
    assert_eq!(exec_bits(&source, &[0x00], &OptConfig::default()), expected);
}

#[test]
fn test_reading_echoes_input_bits() {
    let source = repeat(READ_ONE, 16);
    let expected = bits_of(&[0xA5, 0x3C]);
    assert_eq!(run_bits(&source, &[0xA5, 0x3C]), expected);
    assert_eq!(exec_bits(&source, &[0xA5, 0x3C], &OptConfig::none()), expected);
}

#[test]
fn test_eight_ones_make_one_byte() {
    let mut session = Session::new(MemoryIo::default(), EvalConfig::default()).unwrap();
    session.run_source(&ones(8), |e| panic!("{}", e)).unwrap();
    assert_eq!(session.with_io(|io| io.bytes()), vec![0xFF]);

    let bits = exec_bits(&ones(8), &[], &OptConfig::default());
    assert_eq!(bits, vec![true; 8]);
}

#[test]
fn test_unresolved_name_is_reported_and_skipped() {
    let source = "(__builtin_p1 __builtin_p1)\n(missing __builtin_p0)\n(__builtin_p0 __builtin_p0)\n";
    let (bits, errors) = run_with(source, &[], EvalConfig::default()).unwrap();
    assert_eq!(bits, vec![true, false]);
    assert_eq!(errors.len(), 1);
    match &errors[0].kind {
        ErrorKind::UnresolvedIdentifier { names } => assert_eq!(names, &vec!["missing".to_string()]),
        other => panic!("expected unresolved identifier, got {:?}", other),
    }
    assert_eq!(errors[0].location.map(|l| l.line), Some(2));
    assert!(errors[0].to_string().contains("'missing'"));
}

#[test]
fn test_syntax_error_skips_to_next_statement() {
    let source = "(__builtin_p1 __builtin_p1)\n)\n(__builtin_p0 __builtin_p0)\n";
    let (bits, errors) = run_with(source, &[], EvalConfig::default()).unwrap();
    assert_eq!(bits, vec![true, false]);
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0].kind, ErrorKind::Syntax { .. }));
}

#[test]
fn test_root_lambda_runs_to_end_of_input() {
    // Nothing applies the lambda, so its body never runs
    let source = "\\x __builtin_p1 __builtin_p1\n(__builtin_p0 __builtin_p0)";
    let (bits, errors) = run_with(source, &[], EvalConfig::default()).unwrap();
    assert!(errors.is_empty());
    assert!(bits.is_empty());
}

#[test]
fn test_church_pair_selects_second() {
    let source = "((\\pair pair (\\a \\b b)) ((\\x \\y \\s s x y) __builtin_p1 __builtin_p0) __builtin_p0)";
    assert_eq!(run_bits(source, &[]), vec![false]);
    assert_eq!(exec_bits(source, &[], &OptConfig::default()), vec![false]);
}

#[test]
fn test_statements_share_one_environment_of_builtins() {
    let source = "(__builtin_p1 __builtin_p0)\n(__builtin_p0 __builtin_p1)\n";
    assert_eq!(run_bits(source, &[]), vec![true, false]);
    assert_eq!(exec_bits(source, &[], &OptConfig::default()), vec![true, false]);
}
