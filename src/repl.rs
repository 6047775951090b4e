//! REPL (Read-Eval-Print Loop) with readline support
//!
//! Every input line is read as a complete source: statements on it run in
//! order, and a root lambda ends with the line. History is kept on disk.

use crate::error::LError;
use crate::pipeline::Session;
use crate::primitives::BitIo;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RustylineResult};
use std::path::PathBuf;

const HISTORY_FILE: &str = ".lmb_history";
const PROMPT: &str = "lmb> ";

/// REPL editor with readline support
pub struct Repl {
    editor: DefaultEditor,
}

impl Repl {
    pub fn new() -> RustylineResult<Self> {
        let mut editor = DefaultEditor::new()?;
        let _ = editor.load_history(&Self::history_file_path());
        Ok(Self { editor })
    }

    fn history_file_path() -> PathBuf {
        match dirs_home() {
            Some(home) => home.join(HISTORY_FILE),
            None => PathBuf::from(HISTORY_FILE),
        }
    }

    /// Read and run lines until end of input. Returns the first fatal error.
    pub fn run<IO: BitIo + Send + 'static>(&mut self, session: &mut Session<IO>) -> Result<(), LError> {
        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    log::warn!("readline failed: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let _ = self.editor.add_history_entry(line.as_str());
            session.run_source(&line, report)?;
        }
        let _ = self.editor.save_history(&Self::history_file_path());
        Ok(())
    }
}

fn report(err: &LError) {
    eprintln!("{}", err);
}

/// Get home directory path (cross-platform)
fn dirs_home() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}
