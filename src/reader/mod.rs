//! Text front end: tokenizer, parser and the named-variable AST

mod ast;
mod lexer;
mod parser;
mod token;

pub use ast::{Node, Statement};
pub use lexer::{tokenize_line, Tokenizer};
pub use parser::{ParseStep, Parser};
pub use token::{SourceLoc, Token, TokenWithLoc};

use crate::error::LResult;
use std::io::BufRead;

/// Streams statements out of a buffered reader.
///
/// Syntax errors are yielded in place and reading continues with the next
/// token; an I/O error from the reader ends the stream after being yielded.
pub struct StatementReader<R> {
    tokens: Tokenizer<R>,
    parser: Parser,
    done: bool,
}

impl<R: BufRead> StatementReader<R> {
    pub fn new(input: R) -> Self {
        StatementReader {
            tokens: Tokenizer::new(input),
            parser: Parser::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for StatementReader<R> {
    type Item = LResult<Statement>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let tok = match self.tokens.next_token() {
                Ok(tok) => tok,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            match self.parser.shift(tok) {
                Ok(ParseStep::Continue) => {}
                Ok(ParseStep::Statement(stmt)) => return Some(Ok(stmt)),
                Ok(ParseStep::Eof) => self.done = true,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// Parse every statement in `source`
pub fn read_all(source: &str) -> Vec<LResult<Statement>> {
    StatementReader::new(source.as_bytes()).collect()
}
