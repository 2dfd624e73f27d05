use std::collections::HashMap;
use std::fmt::{self, Display};

/// The closed set of operations an instruction can perform.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Opcode {
    Stor,
    Sum,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    If,
    Goto,
    Hlt,
    Print,
    Concat,
    Length,
    Substr,
}

/// Groups opcodes by the part of the virtual machine that executes them.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum OpcodeKind {
    Memory,
    Arithmetic,
    Bitwise,
    Text,
    Flow,
    Io,
}

impl Opcode {
    /// Looks up an opcode by its keyword, ignoring case.
    pub fn from_keyword(word: &str) -> Option<Opcode> {
        let opcode = match word.to_ascii_uppercase().as_str() {
            "STOR" => Opcode::Stor,
            "SUM" => Opcode::Sum,
            "SUB" => Opcode::Sub,
            "MUL" => Opcode::Mul,
            "DIV" => Opcode::Div,
            "MOD" => Opcode::Mod,
            "AND" => Opcode::And,
            "OR" => Opcode::Or,
            "XOR" => Opcode::Xor,
            "NOT" => Opcode::Not,
            "SHL" => Opcode::Shl,
            "SHR" => Opcode::Shr,
            "IF" => Opcode::If,
            "GOTO" => Opcode::Goto,
            "HLT" => Opcode::Hlt,
            "PRINT" => Opcode::Print,
            "CONCAT" => Opcode::Concat,
            "LENGTH" => Opcode::Length,
            "SUBSTR" => Opcode::Substr,
            _ => return None,
        };

        Some(opcode)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Stor => "STOR",
            Opcode::Sum => "SUM",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Not => "NOT",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::If => "IF",
            Opcode::Goto => "GOTO",
            Opcode::Hlt => "HLT",
            Opcode::Print => "PRINT",
            Opcode::Concat => "CONCAT",
            Opcode::Length => "LENGTH",
            Opcode::Substr => "SUBSTR",
        }
    }

    pub(crate) fn kind(&self) -> OpcodeKind {
        match self {
            Opcode::Stor => OpcodeKind::Memory,
            Opcode::Sum | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
                OpcodeKind::Arithmetic
            }
            Opcode::And | Opcode::Or | Opcode::Xor | Opcode::Not | Opcode::Shl | Opcode::Shr => {
                OpcodeKind::Bitwise
            }
            Opcode::Concat | Opcode::Length | Opcode::Substr => OpcodeKind::Text,
            Opcode::If | Opcode::Goto | Opcode::Hlt => OpcodeKind::Flow,
            Opcode::Print => OpcodeKind::Io,
        }
    }

    /// Number of comma separated operands the opcode takes. Zero for the forms that do not
    /// take an operand list (`IF`, `GOTO`, `HLT`).
    pub(crate) fn arity(&self) -> usize {
        match self {
            Opcode::Not | Opcode::Length | Opcode::Print => 1,
            Opcode::Substr => 3,
            Opcode::If | Opcode::Goto | Opcode::Hlt => 0,
            _ => 2,
        }
    }

    /// Whether the result is written back into the first operand.
    pub(crate) fn writes_back(&self) -> bool {
        matches!(
            self.kind(),
            OpcodeKind::Memory | OpcodeKind::Arithmetic | OpcodeKind::Bitwise | OpcodeKind::Text
        )
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Gt => ">",
            ComparisonOp::Le => "<=",
            ComparisonOp::Ge => ">=",
        }
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Words that are neither opcodes nor registers.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keyword {
    /// Optional filler between an `IF` comparison and its action.
    Then,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        match word.to_ascii_uppercase().as_str() {
            "THEN" => Some(Keyword::Then),
            _ => None,
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Then => f.write_str("THEN"),
        }
    }
}

/// A numeric literal. Literals without a fractional part are integers.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(value) => write!(f, "{}", value),
            Number::Float(value) => write!(f, "{:?}", value),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operand {
    Number(Number),
    String(String),
    Register(String),
    /// A memory cell, written `@name` in source. The name is stored without the sigil.
    Memory(String),
}

impl Operand {
    /// Registers and memory cells can be written to, literals cannot.
    pub fn is_reference(&self) -> bool {
        matches!(self, Operand::Register(_) | Operand::Memory(_))
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Number(number) => write!(f, "{}", number),
            Operand::String(text) => write!(f, "\"{}\"", text),
            Operand::Register(name) => f.write_str(name),
            Operand::Memory(name) => write!(f, "@{}", name),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Condition {
    pub left: Operand,
    pub op: ComparisonOp,
    pub right: Operand,
}

impl Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// Intermediate representation of a single instruction as produced by the parser.
///
/// `target` is only set for `GOTO`, `condition` and `action` only for `IF`. The action of an
/// `IF` never carries a label and is never an `IF` itself.
#[derive(Debug, PartialEq, Clone)]
pub struct Instruction {
    pub label: Option<String>,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub condition: Option<Condition>,
    pub action: Option<Box<Instruction>>,
    pub target: Option<String>,
    pub line: usize,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>, line: usize) -> Instruction {
        Instruction {
            label: None,
            opcode,
            operands,
            condition: None,
            action: None,
            target: None,
            line,
        }
    }

    pub fn jump(target: &str, line: usize) -> Instruction {
        Instruction {
            target: Some(target.to_string()),
            ..Instruction::new(Opcode::Goto, vec![], line)
        }
    }

    pub fn conditional(condition: Condition, action: Instruction, line: usize) -> Instruction {
        Instruction {
            condition: Some(condition),
            action: Some(Box::new(action)),
            ..Instruction::new(Opcode::If, vec![], line)
        }
    }

    pub fn labeled(mut self, label: &str) -> Instruction {
        self.label = Some(label.to_string());
        self
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{} $$$ ", label)?;
        }
        match self.opcode {
            Opcode::Hlt => write!(f, "{}", self.opcode),
            Opcode::Goto => write!(
                f,
                "{} {}",
                self.opcode,
                self.target.as_deref().unwrap_or("<missing>")
            ),
            Opcode::If => {
                write!(f, "{}", self.opcode)?;
                if let Some(condition) = &self.condition {
                    write!(f, " {}", condition)?;
                }
                if let Some(action) = &self.action {
                    write!(f, " {}", action)?;
                }
                Ok(())
            }
            _ => {
                write!(f, "{}", self.opcode)?;
                for (i, operand) in self.operands.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{}", sep, operand)?;
                }
                Ok(())
            }
        }
    }
}

/// Maps label names to instruction indices. Built once after parsing.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct LabelIndex {
    labels: HashMap<String, usize>,
}

impl LabelIndex {
    /// Indexes every labeled instruction. The first occurrence of a label wins; the indices of
    /// instructions repeating an earlier label are returned alongside the index.
    pub fn build(instructions: &[Instruction]) -> (LabelIndex, Vec<usize>) {
        let mut labels = HashMap::new();
        let mut duplicates = vec![];
        for (i, instr) in instructions.iter().enumerate() {
            if let Some(label) = &instr.label {
                if labels.contains_key(label) {
                    duplicates.push(i);
                } else {
                    labels.insert(label.clone(), i);
                }
            }
        }

        (LabelIndex { labels }, duplicates)
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// An ordered, 0-indexed sequence of instructions together with its label index.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: LabelIndex,
}

impl Program {
    /// Builds a program from hand-assembled instructions. Repeated labels resolve to their
    /// first occurrence.
    pub fn from_instructions(instructions: Vec<Instruction>) -> Program {
        let (labels, _) = LabelIndex::build(&instructions);
        Program::new(instructions, labels)
    }

    pub(crate) fn new(instructions: Vec<Instruction>, labels: LabelIndex) -> Program {
        Program {
            instructions,
            labels,
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instructions {
            writeln!(f, "{}", instr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ComparisonOp, Condition, Instruction, LabelIndex, Number, Opcode, Operand};

    #[test]
    fn opcode_keywords_ignore_case() {
        assert_eq!(Opcode::from_keyword("stor"), Some(Opcode::Stor));
        assert_eq!(Opcode::from_keyword("SubStr"), Some(Opcode::Substr));
        assert_eq!(Opcode::from_keyword("store"), None);
    }

    #[test]
    fn label_index_keeps_first_occurrence() {
        let instructions = vec![
            Instruction::new(Opcode::Hlt, vec![], 1).labeled("L0"),
            Instruction::new(Opcode::Hlt, vec![], 2),
            Instruction::new(Opcode::Hlt, vec![], 3).labeled("L1"),
            Instruction::new(Opcode::Hlt, vec![], 4).labeled("L0"),
        ];
        let (labels, duplicates) = LabelIndex::build(&instructions);

        assert_eq!(labels.get("L0"), Some(0));
        assert_eq!(labels.get("L1"), Some(2));
        assert_eq!(labels.get("L2"), None);
        assert_eq!(labels.len(), 2);
        assert_eq!(duplicates, vec![3]);
    }

    #[test]
    fn display_instruction_forms() {
        let store = Instruction::new(
            Opcode::Stor,
            vec![
                Operand::Memory("b".to_string()),
                Operand::Number(Number::Float(2.0)),
            ],
            1,
        )
        .labeled("L3");
        assert_eq!(store.to_string(), "L3 $$$ STOR @b, 2.0");

        let branch = Instruction::conditional(
            Condition {
                left: Operand::Register("a".to_string()),
                op: ComparisonOp::Lt,
                right: Operand::Number(Number::Int(5)),
            },
            Instruction::jump("L1", 2),
            2,
        );
        assert_eq!(branch.to_string(), "IF a < 5 GOTO L1");

        let text = Instruction::new(
            Opcode::Print,
            vec![Operand::String("hi there".to_string())],
            3,
        );
        assert_eq!(text.to_string(), "PRINT \"hi there\"");
    }
}
