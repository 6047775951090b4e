use super::token::{SourceLoc, Token, TokenWithLoc};
use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Line-buffered tokenizer.
///
/// Pulls one line at a time from the underlying reader. Blank lines and
/// lines whose first non-space character is `#` are skipped whole.
pub struct Tokenizer<R> {
    input: R,
    pending: VecDeque<TokenWithLoc>,
    line: usize,
    exhausted: bool,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(input: R) -> Self {
        Tokenizer {
            input,
            pending: VecDeque::new(),
            line: 0,
            exhausted: false,
        }
    }

    /// Next token, `Token::End` forever once the input is exhausted.
    pub fn next_token(&mut self) -> io::Result<TokenWithLoc> {
        while self.pending.is_empty() {
            if !self.read_line()? {
                return Ok(TokenWithLoc {
                    token: Token::End,
                    loc: SourceLoc::new(self.line + 1, 1),
                });
            }
        }
        Ok(self.pending.pop_front().unwrap_or(TokenWithLoc {
            token: Token::End,
            loc: SourceLoc::new(self.line + 1, 1),
        }))
    }

    /// Peek without consuming
    pub fn peek(&mut self) -> io::Result<&Token> {
        while self.pending.is_empty() {
            if !self.read_line()? {
                return Ok(&Token::End);
            }
        }
        Ok(self.pending.front().map(|t| &t.token).unwrap_or(&Token::End))
    }

    fn read_line(&mut self) -> io::Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                self.exhausted = true;
                return Ok(false);
            }
            self.line += 1;
            if !is_comment_or_blank(&line) {
                break;
            }
        }
        tokenize_line(&line, self.line, &mut self.pending);
        Ok(true)
    }
}

impl<'a> Tokenizer<&'a [u8]> {
    pub fn from_str(source: &'a str) -> Self {
        Tokenizer::new(source.as_bytes())
    }
}

fn is_comment_or_blank(line: &str) -> bool {
    match line.chars().find(|c| !c.is_whitespace()) {
        Some(c) => c == '#',
        None => true,
    }
}

/// Split one physical line into tokens
pub fn tokenize_line(line: &str, line_no: usize, out: &mut VecDeque<TokenWithLoc>) {
    let mut chars = line.char_indices().peekable();
    let mut col = 0;
    while let Some((start, c)) = chars.next() {
        col += 1;
        if c.is_whitespace() {
            continue;
        }
        let loc = SourceLoc::new(line_no, col);
        let token = match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '\\' => Token::Backslash,
            _ => {
                let mut end = start + c.len_utf8();
                while let Some(&(idx, next)) = chars.peek() {
                    if next.is_whitespace() || Token::is_special(next) {
                        break;
                    }
                    end = idx + next.len_utf8();
                    col += 1;
                    chars.next();
                }
                Token::Ident(line[start..end].to_string())
            }
        };
        out.push_back(TokenWithLoc { token, loc });
    }
}
