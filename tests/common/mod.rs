//! Shared test helpers for the lmb test suite.
//!
//! Every helper runs against `MemoryIo`, so tests compare the exact bit
//! sequence a program wrote, partial trailing byte included.

use lmb::{exec_source, EvalConfig, LError, MemoryIo, OptConfig, Session};

/// Bits of `bytes`, most significant first
#[allow(dead_code)]
pub fn bits_of(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| byte >> i & 1 == 1))
        .collect()
}

/// Run `source` in interactive mode with the default configuration.
///
/// Panics on any error, recoverable or not.
#[allow(dead_code)]
pub fn run_bits(source: &str, input: &[u8]) -> Vec<bool> {
    let (bits, errors) =
        run_with(source, input, EvalConfig::default()).unwrap_or_else(|e| panic!("{}", e));
    assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    bits
}

/// Run `source` in interactive mode, collecting recoverable errors.
///
/// A fatal error (including an exhausted budget) is returned as `Err`.
#[allow(dead_code)]
pub fn run_with(
    source: &str,
    input: &[u8],
    config: EvalConfig,
) -> Result<(Vec<bool>, Vec<LError>), LError> {
    let mut session = Session::new(MemoryIo::new(input), config)?;
    let mut errors = Vec::new();
    session.run_source(source, |e| errors.push(e.clone()))?;
    Ok((session.with_io(|io| io.bits().to_vec()), errors))
}

/// Compile `source` and run the closure graph with the graph machine.
#[allow(dead_code)]
pub fn exec_bits(source: &str, input: &[u8], config: &OptConfig) -> Vec<bool> {
    exec_with(source, input, config, None).unwrap_or_else(|e| panic!("{}", e))
}

#[allow(dead_code)]
pub fn exec_with(
    source: &str,
    input: &[u8],
    config: &OptConfig,
    fuel: Option<u64>,
) -> Result<Vec<bool>, LError> {
    let (io, _) = exec_source(source, config, MemoryIo::new(input), fuel)?;
    Ok(io.bits().to_vec())
}

/// Source that applies `__builtin_p1` to itself `count` times in a chain
#[allow(dead_code)]
pub fn ones(count: usize) -> String {
    let mut source = String::from("__builtin_p1");
    for _ in 0..count {
        source = format!("(__builtin_p1 {})", source);
    }
    source
}
