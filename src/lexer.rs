use crate::ir::{ComparisonOp, Keyword, Number, Opcode};
use std::fmt::{self, Display};
use thiserror::Error;

/// Marker separating a label from its instruction body.
pub const SEPARATOR: &str = "$$$";
/// Sigil introducing a memory reference.
pub const MEMORY_SIGIL: char = '@';

#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    Label(String),
    Separator,
    Opcode(Opcode),
    Register(String),
    MemoryRef(String),
    Number(Number),
    String(String),
    Comma,
    Comparison(ComparisonOp),
    Keyword(Keyword),
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Label(name) => write!(f, "label `{}`", name),
            TokenKind::Separator => write!(f, "`{}`", SEPARATOR),
            TokenKind::Opcode(opcode) => write!(f, "opcode `{}`", opcode),
            TokenKind::Register(name) => write!(f, "register `{}`", name),
            TokenKind::MemoryRef(name) => write!(f, "memory reference `{}{}`", MEMORY_SIGIL, name),
            TokenKind::Number(number) => write!(f, "number `{}`", number),
            TokenKind::String(text) => write!(f, "string \"{}\"", text),
            TokenKind::Comma => f.write_str("`,`"),
            TokenKind::Comparison(op) => write!(f, "`{}`", op),
            TokenKind::Keyword(keyword) => write!(f, "keyword `{}`", keyword),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, PartialEq, Clone, Error)]
pub enum LexErrorKind {
    #[error("illegal character {0:?}")]
    IllegalCharacter(char),
    #[error("integer literal {0} does not fit in 64 bits")]
    IntegerOverflow(String),
}

#[derive(Debug, PartialEq, Clone, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
}

/// Turns source text into tokens, one per call to `next`.
///
/// Illegal characters are yielded as errors and skipped, so iteration always runs to the end
/// of the input. `reset` rewinds the lexer to the start of the source.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    index: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            source,
            index: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.line = 1;
        self.column = 1;
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    fn rest(&self) -> &'a str {
        &self.source[self.index..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.peek() {
            self.bump();
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.index;
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.bump();
        }

        &self.source[start..self.index]
    }

    fn word(&mut self) -> &'a str {
        self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }

    fn number(&mut self) -> Result<Number, LexErrorKind> {
        let start = self.index;
        if let Some('-' | '+') = self.peek() {
            self.bump();
        }
        self.take_while(|ch| ch.is_ascii_digit());
        let fractional = self.peek() == Some('.')
            && matches!(self.peek_second(), Some(ch) if ch.is_ascii_digit());
        if fractional {
            self.bump();
            self.take_while(|ch| ch.is_ascii_digit());
        }
        let text = &self.source[start..self.index];

        if fractional {
            // digits around a single dot always parse
            Ok(Number::Float(text.parse().unwrap_or_default()))
        } else {
            text.parse()
                .map(Number::Int)
                .map_err(|_| LexErrorKind::IntegerOverflow(text.to_string()))
        }
    }

    fn string(&mut self) -> Option<String> {
        let body = self.rest().get(1..)?;
        let end = body.find('"')?;
        let text = body[..end].to_string();
        // opening quote, body, closing quote
        for _ in 0..text.chars().count() + 2 {
            self.bump();
        }

        Some(text)
    }

    fn comparison(&mut self) -> Option<ComparisonOp> {
        let (op, width) = match (self.peek()?, self.peek_second()) {
            ('=', Some('=')) => (ComparisonOp::Eq, 2),
            ('!', Some('=')) => (ComparisonOp::Ne, 2),
            ('<', Some('=')) => (ComparisonOp::Le, 2),
            ('>', Some('=')) => (ComparisonOp::Ge, 2),
            ('<', _) => (ComparisonOp::Lt, 1),
            ('>', _) => (ComparisonOp::Gt, 1),
            _ => return None,
        };
        for _ in 0..width {
            self.bump();
        }

        Some(op)
    }

    fn classify(word: &str) -> TokenKind {
        if is_label(word) {
            return TokenKind::Label(word.to_string());
        }
        if let Some(opcode) = Opcode::from_keyword(word) {
            return TokenKind::Opcode(opcode);
        }
        if let Some(keyword) = Keyword::from_word(word) {
            return TokenKind::Keyword(keyword);
        }

        TokenKind::Register(word.to_string())
    }

    fn illegal(&mut self, line: usize, column: usize) -> Option<Result<Token, LexError>> {
        let ch = self.bump()?;

        Some(Err(LexError {
            kind: LexErrorKind::IllegalCharacter(ch),
            line,
            column,
        }))
    }

    fn token(&mut self) -> Option<Result<Token, LexError>> {
        self.skip_whitespace();
        let (line, column) = (self.line, self.column);
        let ch = self.peek()?;

        let kind = match ch {
            '$' if self.rest().starts_with(SEPARATOR) => {
                for _ in 0..SEPARATOR.len() {
                    self.bump();
                }
                TokenKind::Separator
            }
            ',' => {
                self.bump();
                TokenKind::Comma
            }
            '"' => match self.string() {
                Some(text) => TokenKind::String(text),
                None => return self.illegal(line, column),
            },
            MEMORY_SIGIL => match self.peek_second() {
                Some(next) if next.is_ascii_alphabetic() || next == '_' => {
                    self.bump();
                    TokenKind::MemoryRef(self.word().to_string())
                }
                _ => return self.illegal(line, column),
            },
            '=' | '!' | '<' | '>' => match self.comparison() {
                Some(op) => TokenKind::Comparison(op),
                None => return self.illegal(line, column),
            },
            '-' | '+' if matches!(self.peek_second(), Some(next) if next.is_ascii_digit()) => {
                match self.number() {
                    Ok(number) => TokenKind::Number(number),
                    Err(kind) => return Some(Err(LexError { kind, line, column })),
                }
            }
            _ if ch.is_ascii_digit() => match self.number() {
                Ok(number) => TokenKind::Number(number),
                Err(kind) => return Some(Err(LexError { kind, line, column })),
            },
            _ if ch.is_ascii_alphabetic() || ch == '_' => Lexer::classify(self.word()),
            _ => return self.illegal(line, column),
        };

        Some(Ok(Token { kind, line, column }))
    }
}

/// A label is a single letter followed by one or more digits, e.g. `L12`.
fn is_label(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(first) if first.is_ascii_alphabetic())
        && word.len() > 1
        && chars.all(|ch| ch.is_ascii_digit())
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.token()
    }
}
