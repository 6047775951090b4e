use clap::{Args, Parser, Subcommand};
use lmb::config::{EvalConfig, OptConfig};
use lmb::error::{ErrorKind, LError};
use lmb::primitives::BitPort;
use lmb::repl::Repl;
use lmb::{emit_source, exec_source, Session};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_FATAL: u8 = 70;
const EXIT_UNRESOLVED: u8 = 65;

#[derive(Parser, Debug)]
#[command(name = "lmb", version, about = "Memoizing combinator language")]
struct Cli {
    #[arg(long, short, global = true, help = "Log at debug level unless LMB_LOG says otherwise")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a file statement by statement
    Run {
        file: PathBuf,
        #[command(flatten)]
        eval: EvalArgs,
    },
    /// Interactive prompt, one statement per line
    Repl {
        #[command(flatten)]
        eval: EvalArgs,
    },
    /// Compile a file to Rust source
    Compile {
        file: PathBuf,
        #[arg(long, short, help = "Output file (stdout if absent)")]
        output: Option<PathBuf>,
        #[arg(long = "stack-size", default_value_t = 256, help = "Stack of the compiled program, MiB")]
        stack_size: usize,
        #[command(flatten)]
        opt: OptArgs,
    },
    /// Compile a file and run the closure graph directly
    Exec {
        file: PathBuf,
        #[arg(long, help = "Read program input from this file instead of stdin")]
        input: Option<PathBuf>,
        #[command(flatten)]
        opt: OptArgs,
    },
}

#[derive(Args, Debug)]
struct EvalArgs {
    #[arg(long, help = "Read program input from this file instead of stdin")]
    input: Option<PathBuf>,
    #[arg(long, short, default_value_t = 1, help = "Worker threads (1 = sequential)")]
    jobs: usize,
    #[arg(long = "no-fold", help = "Do not fold globals into constants")]
    no_fold: bool,
    #[arg(long = "stack-size", default_value_t = 256, help = "Evaluator stack, MiB")]
    stack_size: usize,
}

impl EvalArgs {
    fn config(&self) -> EvalConfig {
        EvalConfig::default()
            .with_fold_constants(!self.no_fold)
            .with_jobs(self.jobs)
            .with_stack_size(self.stack_size << 20)
    }
}

#[derive(Args, Debug)]
struct OptArgs {
    #[arg(long = "no-inline")]
    no_inline: bool,
    #[arg(long = "no-static")]
    no_static: bool,
    #[arg(long = "no-dedup")]
    no_dedup: bool,
}

impl OptArgs {
    fn config(&self) -> OptConfig {
        OptConfig::default()
            .with_inline(!self.no_inline)
            .with_statics(!self.no_static)
            .with_dedup(!self.no_dedup)
    }
}

type Input = Box<dyn Read + Send>;

fn open_input(path: Option<&Path>) -> io::Result<Input> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin()),
    })
}

fn read_source(path: &Path) -> Result<String, LError> {
    std::fs::read_to_string(path)
        .map_err(|e| LError::io(format!("cannot read {}: {}", path.display(), e)))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("LMB_LOG", default))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<(), LError> {
    match cli.command {
        Command::Run { file, eval } => {
            let config = eval.config();
            let io = BitPort::new(open_input(eval.input.as_deref())?, io::stdout());
            let mut session = Session::new(io, config)?;
            let reader = BufReader::new(
                File::open(&file)
                    .map_err(|e| LError::io(format!("cannot read {}: {}", file.display(), e)))?,
            );
            let ran = session.run_reader(reader, |e| eprintln!("{}", e))?;
            log::info!("ran {} statements: {}", ran, session.stats());
        }
        Command::Repl { eval } => {
            let config = eval.config();
            let io = BitPort::new(open_input(eval.input.as_deref())?, io::stdout());
            let mut session = Session::new(io, config)?;
            let mut repl = Repl::new().map_err(|e| LError::io(e.to_string()))?;
            repl.run(&mut session)?;
        }
        Command::Compile {
            file,
            output,
            stack_size,
            opt,
        } => {
            let source = read_source(&file)?;
            let program = emit_source(&source, &opt.config(), stack_size << 20)?;
            match output {
                Some(path) => std::fs::write(&path, program)
                    .map_err(|e| LError::io(format!("cannot write {}: {}", path.display(), e)))?,
                None => print!("{}", program),
            }
        }
        Command::Exec { file, input, opt } => {
            let source = read_source(&file)?;
            let io = BitPort::new(open_input(input.as_deref())?, io::stdout());
            let (_, stats) = exec_source(&source, &opt.config(), io, None)?;
            log::info!("machine: {}", stats);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stack_size = match &cli.command {
        Command::Run { eval, .. } | Command::Repl { eval } => eval.stack_size << 20,
        _ => lmb::config::DEFAULT_STACK_SIZE,
    };
    let outcome = std::thread::Builder::new()
        .name("lmb-main".to_string())
        .stack_size(stack_size)
        .spawn(move || run(cli));
    let result = match outcome {
        Ok(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(LError::internal("evaluator thread panicked"))),
        Err(e) => Err(LError::io(format!("cannot start evaluator thread: {}", e))),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            match e.kind {
                ErrorKind::UnresolvedIdentifier { .. } | ErrorKind::Syntax { .. } => {
                    ExitCode::from(EXIT_UNRESOLVED)
                }
                _ => ExitCode::from(EXIT_FATAL),
            }
        }
    }
}
