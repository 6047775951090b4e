// Property tests: every execution path writes the same bits
//
// Generated programs may diverge, so each run has an application budget.
// A run that exhausts it proves nothing and is skipped.

use super::strategies::{arb_input, arb_program, render};
use crate::common::{exec_with, run_with};
use lmb::{compile_source, EvalConfig, OptConfig};
use proptest::prelude::*;

const FUEL: u64 = 64;

fn interpret(source: &str, input: &[u8], fold: bool) -> Option<Vec<bool>> {
    let config = EvalConfig::default()
        .with_fold_constants(fold)
        .with_fuel(Some(FUEL));
    let (bits, errors) = run_with(source, input, config).ok()?;
    assert!(errors.is_empty(), "{:?}", errors);
    Some(bits)
}

fn execute(source: &str, input: &[u8], config: &OptConfig) -> Option<Vec<bool>> {
    exec_with(source, input, config, Some(FUEL)).ok()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn folding_keeps_output(program in arb_program(), input in arb_input()) {
        let source = render(&program, "v");
        let (Some(folded), Some(plain)) =
            (interpret(&source, &input, true), interpret(&source, &input, false))
        else {
            return Ok(());
        };
        prop_assert_eq!(folded, plain, "source: {}", source);
    }

    #[test]
    fn compiled_matches_interpreted(program in arb_program(), input in arb_input()) {
        let source = render(&program, "v");
        let (Some(interpreted), Some(compiled)) = (
            interpret(&source, &input, true),
            execute(&source, &input, &OptConfig::default()),
        ) else {
            return Ok(());
        };
        prop_assert_eq!(interpreted, compiled, "source: {}", source);
    }

    #[test]
    fn each_pass_keeps_output(program in arb_program(), input in arb_input()) {
        let source = render(&program, "v");
        let Some(expected) = execute(&source, &input, &OptConfig::none()) else {
            return Ok(());
        };
        for config in [
            OptConfig::none().with_inline(true),
            OptConfig::none().with_statics(true),
            OptConfig::none().with_dedup(true),
            OptConfig::default(),
        ] {
            if let Some(bits) = execute(&source, &input, &config) {
                prop_assert_eq!(&bits, &expected, "{:?} on {}", config, source);
            }
        }
    }

    #[test]
    fn optimizing_never_grows_the_graph(program in arb_program()) {
        let source = render(&program, "v");
        let (graph, stats) = compile_source(&source, &OptConfig::default()).unwrap();
        prop_assert!(stats.lambdas_after <= stats.lambdas_before);
        prop_assert_eq!(graph.len(), stats.lambdas_after);
        prop_assert_eq!(graph.roots.len(), program.len());
    }
}
