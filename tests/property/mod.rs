// Property-based tests harness
mod strategies;
mod equivalence {
    include!("equivalence.rs");
}
mod interning {
    include!("interning.rs");
}
