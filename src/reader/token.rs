use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    pub line: usize,
    pub col: usize,
}

impl SourceLoc {
    pub fn new(line: usize, col: usize) -> Self {
        SourceLoc { line, col }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LeftParen,
    RightParen,
    Backslash,
    Ident(String),
    /// End of input; repeated forever once reached
    End,
}

impl Token {
    /// Characters that always form a token on their own
    #[inline]
    pub fn is_special(c: char) -> bool {
        matches!(c, '(' | ')' | '\\')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Backslash => write!(f, "\\"),
            Token::Ident(name) => write!(f, "{}", name),
            Token::End => write!(f, "<end of input>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWithLoc {
    pub token: Token,
    pub loc: SourceLoc,
}
