// Emitted programs built with rustc and run as child processes
//
// Skipped when no rustc is on the path.
use crate::common::ones;
use lmb::{emit_source, exec_source, MemoryIo, OptConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const READ_ONE: &str = "(__builtin_g (\\w __builtin_p0 w) (\\w __builtin_p1 w) (\\w __builtin_p1 (__builtin_p1 w)) __builtin_p0)";

const OPTIMIZER_BLOCK: &[&str] = &[
    "((\\f \\x f (f x)) __builtin_p1 __builtin_p0)",
    "((\\pair pair (\\a \\b a)) ((\\x \\y \\s s x y) __builtin_p0 __builtin_p1) __builtin_p1)",
    "((\\k (k __builtin_p0) (k __builtin_p1)) (\\v \\w v w))",
    "((\\a \\b a (b a)) (\\x x) (\\y y) __builtin_p1 __builtin_p0)",
];

fn configs() -> Vec<(&'static str, OptConfig)> {
    vec![
        ("none", OptConfig::none()),
        ("inline", OptConfig::none().with_inline(true)),
        ("statics", OptConfig::none().with_statics(true)),
        ("dedup", OptConfig::none().with_dedup(true)),
        ("all", OptConfig::default()),
    ]
}

fn have_rustc() -> bool {
    Command::new("rustc")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lmb-emit-{}-{}", std::process::id(), name))
}

fn build(source: &str, config: &OptConfig, name: &str) -> PathBuf {
    let program = emit_source(source, config, 16 << 20).unwrap();
    let src = scratch(name).with_extension("rs");
    let bin = scratch(name);
    std::fs::write(&src, program).unwrap();
    let out = Command::new("rustc")
        .args(["--edition", "2021", "-C", "opt-level=0", "-o"])
        .arg(&bin)
        .arg(&src)
        .output()
        .unwrap();
    std::fs::remove_file(&src).ok();
    assert!(
        out.status.success(),
        "rustc rejected {}: {}",
        name,
        String::from_utf8_lossy(&out.stderr)
    );
    bin
}

fn run(bin: &Path, input: &[u8]) -> (i32, Vec<u8>) {
    let mut child = Command::new(bin)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input).unwrap();
    let out = child.wait_with_output().unwrap();
    (out.status.code().unwrap_or(-1), out.stdout)
}

/// Build `source` under every pass combination and compare stdout with the
/// graph machine's complete bytes
fn assert_native_matches(label: &str, source: &str, input: &[u8], expected: &[u8]) {
    for (pass, config) in configs() {
        let (io, _) = exec_source(source, &config, MemoryIo::new(input), None).unwrap();
        assert_eq!(io.bytes(), expected, "machine output for {} with {}", label, pass);
        let bin = build(source, &config, &format!("{}-{}", label, pass));
        let (code, stdout) = run(&bin, input);
        std::fs::remove_file(&bin).ok();
        assert_eq!(code, 0, "{} with {} exited {}", label, pass, code);
        assert_eq!(stdout, io.bytes(), "{} with {}", label, pass);
    }
}

#[test]
fn test_emitted_power_program_matches_machine() {
    if !have_rustc() {
        return;
    }
    // three applied to two is eight-fold application of the output wrapper
    let source = "((\\a \\b b a (\\w __builtin_p1 w) __builtin_p0) \
                  (\\f \\x f (f x)) (\\f \\x f (f (f x))))";
    let (io, _) = exec_source(source, &OptConfig::none(), MemoryIo::default(), None).unwrap();
    let expected = io.bytes();
    assert_eq!(expected, vec![0xFF]);
    assert_native_matches("power", source, &[], &expected);
}

#[test]
fn test_emitted_get_echoes_then_sees_eof() {
    if !have_rustc() {
        return;
    }
    // eight echoed bits, then four statements at EOF writing two ones each
    let source = vec![READ_ONE; 12].join("\n");
    assert_native_matches("echo", &source, &[0x5A], &[0x5A, 0xFF]);
}

#[test]
fn test_emitted_get_on_empty_stdin() {
    if !have_rustc() {
        return;
    }
    let source = vec![READ_ONE; 4].join("\n");
    assert_native_matches("empty", &source, &[], &[0xFF]);
}

#[test]
fn test_emitted_optimizer_block_matches_machine() {
    if !have_rustc() {
        return;
    }
    let source = vec![OPTIMIZER_BLOCK.join("\n"); 8].join("\n");
    let (io, _) = exec_source(&source, &OptConfig::none(), MemoryIo::default(), None).unwrap();
    let expected = io.bytes();
    assert_eq!(io.bits().len() % 8, 0);
    assert_native_matches("block", &source, &[], &expected);
}

#[test]
fn test_emitted_write_failure_exits_fatal() {
    let Ok(full) = std::fs::OpenOptions::new().write(true).open("/dev/full") else {
        return;
    };
    if !have_rustc() {
        return;
    }
    let bin = build(&ones(8), &OptConfig::default(), "full");
    let out = Command::new(&bin)
        .stdin(Stdio::null())
        .stdout(full)
        .stderr(Stdio::piped())
        .output()
        .unwrap();
    std::fs::remove_file(&bin).ok();
    assert_eq!(out.status.code(), Some(70));
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot write output"));
}
