//! Shift/reduce parser
//!
//! Tokens are shifted one at a time and the parser reports when a complete
//! top-level statement has been reduced. This lets the REPL feed it line by
//! line and lets file runs stream statements without buffering the source.
//!
//! Grammar, informally:
//!
//! ```text
//! term := ident | '(' seq ')' | '\' ident seq
//! seq  := term+            (left-associative application)
//! ```
//!
//! A lambda body extends as far right as possible. At the root every bare
//! identifier or parenthesized group is its own statement, and a root-level
//! lambda runs to the end of input.

use super::ast::{Node, Statement};
use super::token::{SourceLoc, Token, TokenWithLoc};
use crate::error::{LError, LResult};

#[derive(Debug)]
enum Frame {
    Root,
    Group { acc: Option<Node>, loc: SourceLoc },
    LambdaParam { loc: SourceLoc },
    LambdaBody { param: String, acc: Option<Node>, loc: SourceLoc },
}

/// Outcome of shifting one token
#[derive(Debug, PartialEq)]
pub enum ParseStep {
    /// Need more tokens
    Continue,
    /// A statement was completed by this token
    Statement(Statement),
    /// Input ended cleanly
    Eof,
}

pub struct Parser {
    stack: Vec<Frame>,
    /// Location of the first token of the statement being built
    start: Option<SourceLoc>,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            stack: vec![Frame::Root],
            start: None,
        }
    }

    /// Drop any partial statement
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push(Frame::Root);
        self.start = None;
    }

    /// True when no statement is partially built
    pub fn is_idle(&self) -> bool {
        self.stack.len() == 1
    }

    /// Shift one token. On error the partial statement is discarded.
    pub fn shift(&mut self, tok: TokenWithLoc) -> LResult<ParseStep> {
        let loc = tok.loc;
        match self.shift_inner(tok) {
            Ok(step) => Ok(step),
            Err(e) => {
                let at = self.start.unwrap_or(loc);
                self.reset();
                Err(e.with_location(at))
            }
        }
    }

    fn shift_inner(&mut self, tok: TokenWithLoc) -> LResult<ParseStep> {
        if self.start.is_none() && tok.token != Token::End {
            self.start = Some(tok.loc);
        }
        match tok.token {
            Token::LeftParen => {
                self.reject_in_param("(")?;
                self.stack.push(Frame::Group {
                    acc: None,
                    loc: tok.loc,
                });
                Ok(ParseStep::Continue)
            }
            Token::Backslash => {
                self.reject_in_param("\\")?;
                self.stack.push(Frame::LambdaParam { loc: tok.loc });
                Ok(ParseStep::Continue)
            }
            Token::Ident(name) => {
                if let Some(Frame::LambdaParam { loc }) = self.stack.last() {
                    let loc = *loc;
                    self.stack.pop();
                    self.stack.push(Frame::LambdaBody {
                        param: name,
                        acc: None,
                        loc,
                    });
                    return Ok(ParseStep::Continue);
                }
                self.merge(Node::Ref(name))
            }
            Token::RightParen => loop {
                match self.stack.pop() {
                    Some(Frame::Group { acc: Some(node), .. }) => return self.merge(node),
                    Some(Frame::Group { acc: None, .. }) => {
                        return Err(LError::syntax("empty ()"));
                    }
                    Some(Frame::LambdaBody {
                        param,
                        acc: Some(body),
                        ..
                    }) => {
                        // A lambda closed by ')' also closes the group around it
                        if matches!(self.stack.last(), Some(Frame::Root)) {
                            return Err(LError::syntax("unbalanced )"));
                        }
                        self.merge_no_emit(Node::lambda(param, body))?;
                    }
                    Some(Frame::LambdaBody { acc: None, .. }) => {
                        return Err(LError::syntax("lambda without a body"));
                    }
                    Some(Frame::LambdaParam { .. }) => {
                        return Err(LError::syntax("missing lambda parameter"));
                    }
                    Some(Frame::Root) | None => {
                        return Err(LError::syntax("unbalanced )"));
                    }
                }
            },
            Token::End => {
                let mut finished = None;
                while self.stack.len() > 1 {
                    match self.stack.pop() {
                        Some(Frame::LambdaBody {
                            param,
                            acc: Some(body),
                            ..
                        }) => {
                            let lambda = Node::lambda(param, body);
                            if self.stack.len() == 1 {
                                finished = Some(lambda);
                            } else {
                                self.merge_no_emit(lambda)?;
                            }
                        }
                        Some(Frame::Group { loc, .. }) => {
                            return Err(
                                LError::syntax("missing ) before end of input").with_location(loc)
                            );
                        }
                        Some(Frame::LambdaParam { loc }) => {
                            return Err(LError::syntax("missing lambda parameter").with_location(loc));
                        }
                        Some(Frame::LambdaBody { loc, .. }) => {
                            return Err(LError::syntax("lambda without a body").with_location(loc));
                        }
                        Some(Frame::Root) | None => {
                            return Err(LError::internal("parser lost its root frame"));
                        }
                    }
                }
                match finished {
                    Some(node) => Ok(self.emit(node)),
                    None => Ok(ParseStep::Eof),
                }
            }
        }
    }

    fn reject_in_param(&self, what: &str) -> LResult<()> {
        if let Some(Frame::LambdaParam { .. }) = self.stack.last() {
            return Err(LError::syntax(format!(
                "expected lambda parameter, found {}",
                what
            )));
        }
        Ok(())
    }

    /// Append `node` to the innermost frame; emit if that frame is the root.
    fn merge(&mut self, node: Node) -> LResult<ParseStep> {
        if self.stack.len() == 1 {
            return Ok(self.emit(node));
        }
        self.merge_no_emit(node)?;
        Ok(ParseStep::Continue)
    }

    fn merge_no_emit(&mut self, node: Node) -> LResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Group { acc, .. }) | Some(Frame::LambdaBody { acc, .. }) => {
                *acc = Some(match acc.take() {
                    Some(func) => Node::apply(func, node),
                    None => node,
                });
                Ok(())
            }
            Some(Frame::Root) | Some(Frame::LambdaParam { .. }) | None => {
                Err(LError::internal("merge into a frame that cannot hold a term"))
            }
        }
    }

    fn emit(&mut self, node: Node) -> ParseStep {
        let loc = self.start.take().unwrap_or(SourceLoc::new(0, 0));
        ParseStep::Statement(Statement { node, loc })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
