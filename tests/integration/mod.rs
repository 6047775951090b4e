// Integration tests harness
mod scenarios {
    include!("scenarios.rs");
}
mod memoization {
    include!("memoization.rs");
}
mod optimizer {
    include!("optimizer.rs");
}
mod parallel {
    include!("parallel.rs");
}
mod cli {
    include!("cli.rs");
}
mod emitted {
    include!("emitted.rs");
}
