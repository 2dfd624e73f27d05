use crate::ir::{Condition, Instruction, Keyword, LabelIndex, Opcode, Operand, Program};
use crate::lexer::{LexErrorKind, Lexer, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, PartialEq, Clone, Error)]
pub enum DiagnosticKind {
    #[error("{0}")]
    Lexical(LexErrorKind),
    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
    },
    #[error("expected {0}, found end of input")]
    UnexpectedEnd(&'static str),
    #[error("{opcode} takes {expected} operand(s), found {found}")]
    Arity {
        opcode: Opcode,
        expected: usize,
        found: usize,
    },
    #[error("the first operand of {0} must be a register or memory reference")]
    InvalidDestination(Opcode),
    #[error("the action of an IF cannot be another IF")]
    NestedIf,
    #[error("duplicate label `{0}`")]
    DuplicateLabel(String),
}

/// A lexical or syntax problem found while parsing. Parsing continues past it.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
    pub column: usize,
}

/// Every diagnostic of a failed parse together with the program that could still be built.
#[derive(Debug, PartialEq, Clone, Error)]
#[error("{msg}")]
pub struct ParseError {
    msg: String,
    diagnostics: Vec<Diagnostic>,
    partial: Program,
}

impl ParseError {
    pub(crate) fn new(diagnostics: Vec<Diagnostic>, partial: Program) -> ParseError {
        let msg = format!(
            "{} syntax error(s):\n{}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|diagnostic| diagnostic.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        );

        ParseError {
            msg,
            diagnostics,
            partial,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The best-effort program: every instruction that parsed cleanly.
    pub fn partial(&self) -> &Program {
        &self.partial
    }

    pub fn into_partial(self) -> Program {
        self.partial
    }
}

/// Recursive descent parser over the token stream of a single source text.
///
/// Malformed instructions are reported and dropped; the parser resynchronizes at the next
/// `LABEL $$$` boundary and keeps going, so a single call reports every problem in the source.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tokens: Vec<Token>,
    position: usize,
    end: (usize, usize),
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(source),
            tokens: vec![],
            position: 0,
            end: (1, 1),
        }
    }

    /// Parses the whole source, returning the program built from the well-formed instructions
    /// and every diagnostic ordered by position.
    pub fn parse(mut self) -> (Program, Vec<Diagnostic>) {
        let mut diagnostics = vec![];
        for item in &mut self.lexer {
            match item {
                Ok(token) => self.tokens.push(token),
                Err(err) => diagnostics.push(Diagnostic {
                    kind: DiagnosticKind::Lexical(err.kind),
                    line: err.line,
                    column: err.column,
                }),
            }
        }
        self.end = (self.lexer.line(), self.lexer.column());

        if self.tokens.is_empty() {
            diagnostics.push(self.unexpected("instruction"));
        }

        let mut instructions = vec![];
        let mut columns = vec![];
        while self.position < self.tokens.len() {
            let start = self.position;
            match self.instruction() {
                Ok(instr) => {
                    columns.push(self.tokens[start].column);
                    instructions.push(instr);
                }
                Err(diagnostic) => {
                    diagnostics.push(diagnostic);
                    self.synchronize(start);
                }
            }
        }

        let (labels, duplicates) = LabelIndex::build(&instructions);
        for i in duplicates {
            let instr = &instructions[i];
            diagnostics.push(Diagnostic {
                kind: DiagnosticKind::DuplicateLabel(instr.label.clone().unwrap_or_default()),
                line: instr.line,
                column: columns[i],
            });
        }
        diagnostics.sort_by_key(|diagnostic| (diagnostic.line, diagnostic.column));

        log::debug!(
            "parsed {} instruction(s), {} label(s), {} diagnostic(s)",
            instructions.len(),
            labels.len(),
            diagnostics.len()
        );

        (Program::new(instructions, labels), diagnostics)
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens
            .get(self.position + offset)
            .map(|token| &token.kind)
    }

    fn at_boundary(&self) -> bool {
        matches!(
            (self.peek(), self.peek_at(1)),
            (Some(TokenKind::Label(_)), Some(TokenKind::Separator))
        )
    }

    /// Skips to the next labeled instruction, always consuming at least one token.
    fn synchronize(&mut self, start: usize) {
        if self.position == start {
            self.position += 1;
        }
        while self.position < self.tokens.len() && !self.at_boundary() {
            self.position += 1;
        }
    }

    fn unexpected(&self, expected: &'static str) -> Diagnostic {
        match self.tokens.get(self.position) {
            Some(token) => Diagnostic {
                kind: DiagnosticKind::UnexpectedToken {
                    found: token.kind.to_string(),
                    expected,
                },
                line: token.line,
                column: token.column,
            },
            None => Diagnostic {
                kind: DiagnosticKind::UnexpectedEnd(expected),
                line: self.end.0,
                column: self.end.1,
            },
        }
    }

    fn instruction(&mut self) -> Result<Instruction, Diagnostic> {
        let line = self.tokens[self.position].line;
        let label = match (self.peek(), self.peek_at(1)) {
            (Some(TokenKind::Label(name)), Some(TokenKind::Separator)) => {
                let name = name.clone();
                self.position += 2;
                Some(name)
            }
            _ => None,
        };

        let mut instr = self.opcode_form(true)?;
        instr.label = label;
        instr.line = line;

        Ok(instr)
    }

    fn opcode_form(&mut self, allow_if: bool) -> Result<Instruction, Diagnostic> {
        let (opcode, line, column) = match self.tokens.get(self.position) {
            Some(Token {
                kind: TokenKind::Opcode(opcode),
                line,
                column,
            }) => (*opcode, *line, *column),
            _ => return Err(self.unexpected("an opcode")),
        };
        self.position += 1;

        match opcode {
            Opcode::Hlt => Ok(Instruction::new(opcode, vec![], line)),
            // a label followed by `$$$` starts the next instruction, it is not a target
            Opcode::Goto => match self.peek() {
                Some(TokenKind::Label(target))
                    if !matches!(self.peek_at(1), Some(TokenKind::Separator)) =>
                {
                    let instr = Instruction::jump(target, line);
                    self.position += 1;
                    Ok(instr)
                }
                _ => Err(self.unexpected("a label")),
            },
            Opcode::If if !allow_if => Err(Diagnostic {
                kind: DiagnosticKind::NestedIf,
                line,
                column,
            }),
            Opcode::If => {
                let condition = self.condition()?;
                if let Some(TokenKind::Keyword(Keyword::Then)) = self.peek() {
                    self.position += 1;
                }
                let action = self.opcode_form(false)?;

                Ok(Instruction::conditional(condition, action, line))
            }
            _ => {
                let mut operands = vec![self.operand()?];
                while let Some(TokenKind::Comma) = self.peek() {
                    self.position += 1;
                    operands.push(self.operand()?);
                }

                if operands.len() != opcode.arity() {
                    return Err(Diagnostic {
                        kind: DiagnosticKind::Arity {
                            opcode,
                            expected: opcode.arity(),
                            found: operands.len(),
                        },
                        line,
                        column,
                    });
                }
                if opcode.writes_back() && !operands[0].is_reference() {
                    return Err(Diagnostic {
                        kind: DiagnosticKind::InvalidDestination(opcode),
                        line,
                        column,
                    });
                }

                Ok(Instruction::new(opcode, operands, line))
            }
        }
    }

    fn condition(&mut self) -> Result<Condition, Diagnostic> {
        let left = self.operand()?;
        let op = match self.peek() {
            Some(TokenKind::Comparison(op)) => *op,
            _ => return Err(self.unexpected("a comparison operator")),
        };
        self.position += 1;
        let right = self.operand()?;

        Ok(Condition { left, op, right })
    }

    fn operand(&mut self) -> Result<Operand, Diagnostic> {
        let operand = match self.peek() {
            Some(TokenKind::Register(name)) => Operand::Register(name.clone()),
            Some(TokenKind::MemoryRef(name)) => Operand::Memory(name.clone()),
            Some(TokenKind::Number(number)) => Operand::Number(*number),
            Some(TokenKind::String(text)) => Operand::String(text.clone()),
            _ => return Err(self.unexpected("an operand")),
        };
        self.position += 1;

        Ok(operand)
    }
}

/// Parses `source` into a program, failing if the source produced any diagnostic.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let (program, diagnostics) = Parser::new(source).parse();
    if diagnostics.is_empty() {
        Ok(program)
    } else {
        Err(ParseError::new(diagnostics, program))
    }
}
