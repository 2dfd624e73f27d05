//! A lexer, parser and virtual machine for the `$$$` labeled-instruction language.
//!
//! ```text
//! L0 $$$ STOR a, 1
//! L1 $$$ SUM a, 1
//!        IF a < 5 GOTO L1
//!        PRINT a
//! ```
//!
//! Source text is tokenized by [`Lexer`], turned into a [`Program`] by [`Parser`] and executed
//! by [`Vm`] against a register store and a separate memory store.

pub mod ir;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod value;
pub mod vm;
pub mod wasm;

pub use ir::{ComparisonOp, Condition, Instruction, LabelIndex, Number, Opcode, Operand, Program};
pub use lexer::{LexError, LexErrorKind, Lexer, Token, TokenKind};
pub use parser::{parse, Diagnostic, DiagnosticKind, ParseError, Parser};
pub use source::SourceError;
pub use value::{Value, ValueError};
pub use vm::{ExecutionTrace, Vm, VmConfig, VmError, VmErrorKind, VmState};

/// Runs `program` to completion without writing to stdout.
pub fn execute(program: &Program) -> Result<ExecutionTrace, VmError> {
    Vm::new(program.clone(), VmConfig::suppressed()).run()
}
