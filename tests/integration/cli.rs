// Command-line driver: exit codes and byte output
//
// Each test writes its program to a scratch file and runs the built binary
// with stdin closed.

use crate::common::ones;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn lmb_binary() -> &'static str {
    env!("CARGO_BIN_EXE_lmb")
}

fn scratch(name: &str, contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("lmb-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

fn lmb(args: &[&str]) -> Output {
    Command::new(lmb_binary())
        .args(args)
        .stdin(Stdio::null())
        .output()
        .unwrap_or_else(|_| panic!("failed to spawn {}", lmb_binary()))
}

#[test]
fn test_run_writes_bytes_to_stdout() {
    let file = scratch("run.lmb", ones(16).as_bytes());
    let output = lmb(&["run", file.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, vec![0xFF, 0xFF]);
}

#[test]
fn test_run_drops_a_partial_byte() {
    let file = scratch("partial.lmb", ones(11).as_bytes());
    let output = lmb(&["run", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0xFF]);
}

#[test]
fn test_run_reports_unresolved_and_continues() {
    let source = format!("(missing __builtin_p0)\n{}\n", ones(8));
    let file = scratch("unresolved.lmb", source.as_bytes());
    let output = lmb(&["run", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(output.stdout, vec![0xFF]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("'missing'"));
}

#[test]
fn test_run_parallel_matches() {
    let file = scratch("parallel.lmb", ones(8).as_bytes());
    let output = lmb(&["run", "-j", "3", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0xFF]);
}

#[test]
fn test_exec_echoes_input_file() {
    let read_one = "(__builtin_g (\\w __builtin_p0 w) (\\w __builtin_p1 w) (\\w w) __builtin_p0)\n";
    let file = scratch("echo.lmb", read_one.repeat(16).as_bytes());
    let input = scratch("echo.in", &[0x4C, 0x4D]);
    let output = lmb(&[
        "exec",
        file.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, b"LM".to_vec());
}

#[test]
fn test_compile_writes_program() {
    let file = scratch("compile.lmb", ones(8).as_bytes());
    let target = std::env::temp_dir().join(format!("lmb-{}-compiled.rs", std::process::id()));
    let output = lmb(&[
        "compile",
        file.to_str().unwrap(),
        "-o",
        target.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let program = std::fs::read_to_string(&target).unwrap();
    assert!(program.contains("fn main()"));
}

#[test]
fn test_compile_unresolved_exit_code() {
    let file = scratch("bad.lmb", b"(__builtin_p0 missing)\n");
    let output = lmb(&["compile", file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(65));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("'missing'"));
}

#[test]
fn test_missing_file_is_fatal() {
    let output = lmb(&["run", "/nonexistent/lmb/program.lmb"]);
    assert_eq!(output.status.code(), Some(70));
}
