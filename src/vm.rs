use crate::ir::{Instruction, Opcode, OpcodeKind, Operand, Program};
use crate::parser::{self, ParseError};
#[cfg(not(target_arch = "wasm32"))]
use crate::source;
use crate::source::SourceError;
use crate::value::{Value, ValueError};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Display};
use std::io::{self, stdout, Write};
#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;
use std::rc::Rc;

/// The register store and the memory store. The two are separate namespaces: `a` and `@a`
/// never alias.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct VmState {
    registers: BTreeMap<String, Value>,
    memory: BTreeMap<String, Value>,
}

impl VmState {
    pub fn register(&self, name: &str) -> Option<&Value> {
        self.registers.get(name)
    }

    /// Looks up a memory cell by name, without the `@` sigil.
    pub fn memory(&self, name: &str) -> Option<&Value> {
        self.memory.get(name)
    }

    pub fn registers(&self) -> &BTreeMap<String, Value> {
        &self.registers
    }

    pub fn memory_cells(&self) -> &BTreeMap<String, Value> {
        &self.memory
    }

    /// Resolves an operand. References that were never written read as integer zero.
    pub fn read(&self, operand: &Operand) -> Value {
        let (store, name, kind) = match operand {
            Operand::Number(number) => return Value::from(*number),
            Operand::String(text) => return Value::Str(text.clone()),
            Operand::Register(name) => (&self.registers, name, "register"),
            Operand::Memory(name) => (&self.memory, name, "memory cell"),
        };

        match store.get(name) {
            Some(value) => value.clone(),
            None => {
                log::debug!("{} {} read before it was written, using 0", kind, operand);
                Value::default()
            }
        }
    }

    /// Stores `value` in the register or memory cell named by `operand`. Literals are not
    /// writable and are left untouched.
    pub fn write(&mut self, operand: &Operand, value: Value) {
        match operand {
            Operand::Register(name) => {
                self.registers.insert(name.clone(), value);
            }
            Operand::Memory(name) => {
                self.memory.insert(name.clone(), value);
            }
            Operand::Number(_) | Operand::String(_) => {}
        }
    }

    pub fn clear(&mut self) {
        self.registers.clear();
        self.memory.clear();
    }
}

impl Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "registers:")?;
        for (name, value) in &self.registers {
            writeln!(f, "  {}: {}", name, value)?;
        }
        writeln!(f, "memory:")?;
        for (name, value) in &self.memory {
            writeln!(f, "  @{}: {}", name, value)?;
        }
        Ok(())
    }
}

/// The observable result of a run.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ExecutionTrace {
    pub state: VmState,
    pub output: Vec<String>,
    pub steps: usize,
}

/// Configuration options for the virtual machine
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct VmConfig {
    raw: bool,
    debug: bool,
    debug_memory: bool,
    suppress_output: bool,
}

impl VmConfig {
    /// Creates a new virtual machine config with the given arguments
    ///
    /// - `raw` print the IR of the program when the virtual machine is built (logged instead
    ///   when output is suppressed)
    /// - `debug` log the program counter, the instruction and the registers after each step
    /// - `debug_memory` log the memory store after each step
    /// - `suppress_output` record PRINT lines without writing them to stdout
    pub fn new(raw: bool, debug: bool, debug_memory: bool, suppress_output: bool) -> VmConfig {
        VmConfig {
            raw,
            debug,
            debug_memory,
            suppress_output,
        }
    }

    /// Returns a configuration that only records output
    pub fn suppressed() -> VmConfig {
        VmConfig {
            suppress_output: true,
            ..VmConfig::default()
        }
    }

    /// Returns a configuration tracing every step
    pub fn debug() -> VmConfig {
        VmConfig {
            debug: true,
            ..VmConfig::default()
        }
    }

    /// Returns a configuration tracing every step including the memory store
    pub fn debug_memory() -> VmConfig {
        VmConfig {
            debug: true,
            debug_memory: true,
            ..VmConfig::default()
        }
    }

    /// Returns a configuration printing the IR of the program
    pub fn raw() -> VmConfig {
        VmConfig {
            raw: true,
            ..VmConfig::default()
        }
    }
}

#[derive(Debug)]
pub enum VmErrorKind {
    Parse(ParseError),
    Load(SourceError),
    ParseLogic(Instruction),
    UndefinedLabel(String, Instruction),
    UndefinedOpcode(Instruction),
    Arithmetic(ValueError, Instruction),
    Type(ValueError, Instruction),
    Io(io::Error, Instruction),
}

impl Display for VmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VmErrorKind::Parse(_) => "ParseError",
            VmErrorKind::Load(_) => "LoadError",
            VmErrorKind::ParseLogic(_) => "ParseLogicError",
            VmErrorKind::UndefinedLabel(..) => "UndefinedLabel",
            VmErrorKind::UndefinedOpcode(_) => "UndefinedOpcode",
            VmErrorKind::Arithmetic(..) => "ArithmeticError",
            VmErrorKind::Type(..) => "TypeError",
            VmErrorKind::Io(..) => "IoError",
        };
        f.write_str(name)
    }
}

impl VmErrorKind {
    fn throw<T>(self) -> Result<T, VmError> {
        let msg = match &self {
            VmErrorKind::Parse(err) => format!("failed to parse program: {}", err),
            VmErrorKind::Load(err) => format!("failed to load program: {}", err),
            VmErrorKind::ParseLogic(instr) => format!(
                "malformed instruction on line {}, it cannot have come out of the parser: {}",
                instr.line, instr
            ),
            VmErrorKind::UndefinedLabel(label, instr) => format!(
                "undefined label `{}` on line {}: {}",
                label, instr.line, instr
            ),
            VmErrorKind::UndefinedOpcode(instr) => format!(
                "{} cannot be dispatched on line {}: {}",
                instr.opcode, instr.line, instr
            ),
            VmErrorKind::Arithmetic(err, instr) => {
                format!("{} on line {}: {}", err, instr.line, instr)
            }
            VmErrorKind::Type(err, instr) => format!("{} on line {}: {}", err, instr.line, instr),
            VmErrorKind::Io(err, instr) => format!(
                "failed to write output on line {}: {}: {}",
                instr.line, err, instr
            ),
        };
        Err(VmError { msg, kind: self })
    }
}

#[derive(Debug)]
pub struct VmError {
    msg: String,
    kind: VmErrorKind,
}

impl VmError {
    pub fn kind(&self) -> &VmErrorKind {
        &self.kind
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }
}

impl Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)
    }
}

impl Error for VmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            VmErrorKind::Parse(err) => Some(err),
            VmErrorKind::Load(err) => Some(err),
            VmErrorKind::Arithmetic(err, _) | VmErrorKind::Type(err, _) => Some(err),
            VmErrorKind::Io(err, _) => Some(err),
            _ => None,
        }
    }
}

/// What the program counter does after an instruction.
#[derive(Debug, PartialEq, Clone, Copy)]
enum Transition {
    Advance,
    Jump(usize),
    Halt,
}

fn destination(instr: &Instruction) -> Result<&Operand, VmError> {
    match instr.operands.first() {
        Some(operand) if operand.is_reference() => Ok(operand),
        _ => VmErrorKind::ParseLogic(instr.clone()).throw(),
    }
}

fn check<T>(result: Result<T, ValueError>, instr: &Instruction) -> Result<T, VmError> {
    result.or_else(|err| {
        if err.is_arithmetic() {
            VmErrorKind::Arithmetic(err, instr.clone()).throw()
        } else {
            VmErrorKind::Type(err, instr.clone()).throw()
        }
    })
}

/// The root component for the virtual machine
pub struct Vm {
    config: VmConfig,
    program: Rc<Program>,
    state: VmState,
    output: Vec<String>,
    program_counter: usize,
    steps: usize,
    done: bool,
}

impl Vm {
    /// Creates a new virtual machine ready to run `program` from its first instruction
    pub fn new(program: Program, config: VmConfig) -> Vm {
        if config.raw {
            for (i, instr) in program.instructions().iter().enumerate() {
                if config.suppress_output {
                    log::info!("{:>4}: {}", i, instr);
                } else {
                    println!("{:>4}: {}", i, instr);
                }
            }
        }

        Vm {
            config,
            program: Rc::new(program),
            state: VmState::default(),
            output: vec![],
            program_counter: 0,
            steps: 0,
            done: false,
        }
    }

    /// Parses `source` and creates a virtual machine for it. Any diagnostic fails the build.
    pub fn from_source(source: &str, config: VmConfig) -> Result<Vm, VmError> {
        match parser::parse(source) {
            Ok(program) => Ok(Vm::new(program, config)),
            Err(err) => VmErrorKind::Parse(err).throw(),
        }
    }

    /// Reads and parses the program stored at `path`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file<P: AsRef<Path>>(path: P, config: VmConfig) -> Result<Vm, VmError> {
        match source::read_file(path) {
            Ok(source) => Vm::from_source(&source, config),
            Err(err) => VmErrorKind::Load(err).throw(),
        }
    }

    /// Returns the index of the next instruction to be executed in a `Some` variant. None if
    /// the program has halted or run past its last instruction.
    pub fn next_instruction(&self) -> Option<usize> {
        if self.is_halted() {
            None
        } else {
            Some(self.program_counter)
        }
    }

    pub fn is_halted(&self) -> bool {
        self.done || self.program_counter >= self.program.len()
    }

    /// Executes all instructions - runs the program.
    pub fn run(&mut self) -> Result<ExecutionTrace, VmError> {
        log::info!("running {} instruction(s)", self.program.len());
        while self.next_instruction().is_some() {
            self.step()?;
        }
        log::info!("halted after {} step(s)", self.steps);

        Ok(self.trace())
    }

    /// Resets the virtual machine state without re-parsing the program
    pub fn reset(&mut self) {
        self.state.clear();
        self.output.clear();
        self.program_counter = 0;
        self.steps = 0;
        self.done = false;
    }

    /// Executes the instruction at the program counter. Does nothing once halted.
    pub fn step(&mut self) -> Result<(), VmError> {
        let program = Rc::clone(&self.program);
        let (pc, instr) = match self.next_instruction() {
            Some(pc) => match program.get(pc) {
                Some(instr) => (pc, instr),
                None => return Ok(()),
            },
            None => return Ok(()),
        };

        let transition = match self.dispatch(instr) {
            Ok(transition) => transition,
            Err(err) => {
                self.done = true;
                return Err(err);
            }
        };
        self.steps += 1;
        match transition {
            Transition::Advance => self.program_counter = pc + 1,
            Transition::Jump(target) => self.program_counter = target,
            Transition::Halt => self.done = true,
        }

        if self.config.debug {
            log::debug!("{:>4}: {}", pc, instr);
            log::debug!("registers: {:?}", self.state.registers);
        }
        if self.config.debug_memory {
            log::debug!("memory: {:?}", self.state.memory);
        }

        Ok(())
    }

    pub fn trace(&self) -> ExecutionTrace {
        ExecutionTrace {
            state: self.state.clone(),
            output: self.output.clone(),
            steps: self.steps,
        }
    }

    pub fn state(&self) -> &VmState {
        &self.state
    }

    /// Lines printed so far, including those printed before a runtime error.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<Transition, VmError> {
        match instr.opcode.kind() {
            OpcodeKind::Memory => self.memory(instr),
            OpcodeKind::Arithmetic => self.arithmetic(instr),
            OpcodeKind::Bitwise => self.bitwise(instr),
            OpcodeKind::Text => self.text(instr),
            OpcodeKind::Flow => self.flow(instr),
            OpcodeKind::Io => self.io(instr),
        }
    }

    fn operand(&self, instr: &Instruction, index: usize) -> Result<Value, VmError> {
        match instr.operands.get(index) {
            Some(operand) => Ok(self.state.read(operand)),
            None => VmErrorKind::ParseLogic(instr.clone()).throw(),
        }
    }

    fn memory(&mut self, instr: &Instruction) -> Result<Transition, VmError> {
        match instr.opcode {
            Opcode::Stor => {
                let value = self.operand(instr, 1)?;
                self.state.write(destination(instr)?, value);

                Ok(Transition::Advance)
            }
            _ => VmErrorKind::UndefinedOpcode(instr.clone()).throw(),
        }
    }

    fn arithmetic(&mut self, instr: &Instruction) -> Result<Transition, VmError> {
        let lhs = self.operand(instr, 0)?;
        let rhs = self.operand(instr, 1)?;
        let result = match instr.opcode {
            Opcode::Sum => lhs.add(&rhs),
            Opcode::Sub => lhs.sub(&rhs),
            Opcode::Mul => lhs.mul(&rhs),
            Opcode::Div => lhs.div(&rhs),
            Opcode::Mod => lhs.rem(&rhs),
            _ => return VmErrorKind::UndefinedOpcode(instr.clone()).throw(),
        };
        let value = check(result, instr)?;
        self.state.write(destination(instr)?, value);

        Ok(Transition::Advance)
    }

    fn bitwise(&mut self, instr: &Instruction) -> Result<Transition, VmError> {
        let lhs = self.operand(instr, 0)?;
        let result = match instr.opcode {
            Opcode::Not => lhs.bit_not(),
            Opcode::And => lhs.bit_and(&self.operand(instr, 1)?),
            Opcode::Or => lhs.bit_or(&self.operand(instr, 1)?),
            Opcode::Xor => lhs.bit_xor(&self.operand(instr, 1)?),
            Opcode::Shl => lhs.shl(&self.operand(instr, 1)?),
            Opcode::Shr => lhs.shr(&self.operand(instr, 1)?),
            _ => return VmErrorKind::UndefinedOpcode(instr.clone()).throw(),
        };
        let value = check(result, instr)?;
        self.state.write(destination(instr)?, value);

        Ok(Transition::Advance)
    }

    fn text(&mut self, instr: &Instruction) -> Result<Transition, VmError> {
        let lhs = self.operand(instr, 0)?;
        let value = match instr.opcode {
            Opcode::Concat => lhs.concat(&self.operand(instr, 1)?),
            Opcode::Length => lhs.length(),
            Opcode::Substr => {
                let start = check(self.operand(instr, 1)?.to_int(), instr)?;
                let len = check(self.operand(instr, 2)?.to_int(), instr)?;
                lhs.substr(start, len)
            }
            _ => return VmErrorKind::UndefinedOpcode(instr.clone()).throw(),
        };
        self.state.write(destination(instr)?, value);

        Ok(Transition::Advance)
    }

    fn flow(&mut self, instr: &Instruction) -> Result<Transition, VmError> {
        match instr.opcode {
            Opcode::Hlt => Ok(Transition::Halt),
            Opcode::Goto => {
                let label = match &instr.target {
                    Some(label) => label,
                    None => return VmErrorKind::ParseLogic(instr.clone()).throw(),
                };
                match self.program.labels().get(label) {
                    Some(target) => Ok(Transition::Jump(target)),
                    None => VmErrorKind::UndefinedLabel(label.clone(), instr.clone()).throw(),
                }
            }
            Opcode::If => {
                let (condition, action) = match (&instr.condition, &instr.action) {
                    (Some(condition), Some(action)) => (condition, action),
                    _ => return VmErrorKind::ParseLogic(instr.clone()).throw(),
                };
                if action.opcode == Opcode::If {
                    return VmErrorKind::UndefinedOpcode(instr.clone()).throw();
                }

                let left = self.state.read(&condition.left);
                let right = self.state.read(&condition.right);
                if check(left.compare(condition.op, &right), instr)? {
                    self.dispatch(action)
                } else {
                    Ok(Transition::Advance)
                }
            }
            _ => VmErrorKind::UndefinedOpcode(instr.clone()).throw(),
        }
    }

    fn io(&mut self, instr: &Instruction) -> Result<Transition, VmError> {
        match instr.opcode {
            Opcode::Print => {
                let line = self.operand(instr, 0)?.to_string();
                if !self.config.suppress_output {
                    let mut out = stdout().lock();
                    if let Err(err) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                        return VmErrorKind::Io(err, instr.clone()).throw();
                    }
                }
                self.output.push(line);

                Ok(Transition::Advance)
            }
            _ => VmErrorKind::UndefinedOpcode(instr.clone()).throw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Vm, VmConfig, VmError, VmErrorKind};
    use crate::ir::{ComparisonOp, Condition, Instruction, Number, Opcode, Operand, Program};
    use crate::value::{Value, ValueError};

    fn run_file(path: &str) -> Result<Vm, VmError> {
        let mut vm = Vm::from_file(path, VmConfig::suppressed())?;
        vm.run()?;

        Ok(vm)
    }

    fn lines(output: &[&str]) -> Vec<String> {
        output.iter().map(|line| line.to_string()).collect()
    }

    fn text(value: &str) -> Value {
        Value::Str(value.to_string())
    }

    #[test]
    fn interpret_sample() -> Result<(), VmError> {
        let vm = run_file("resources/sample.tds")?;
        let state = vm.state();

        assert_eq!(vm.output(), lines(&["15"]));
        assert_eq!(state.register("A"), Some(&text("Study the examples")));
        assert_eq!(state.register("a"), Some(&Value::Int(15)));
        assert_eq!(state.register("b"), Some(&Value::Int(2)));
        assert_eq!(state.memory("b"), Some(&Value::Int(35)));
        assert_eq!(state.memory("a"), None);
        assert_eq!(vm.trace().steps, 6);

        Ok(())
    }

    #[test]
    fn interpret_loop() -> Result<(), VmError> {
        let vm = run_file("resources/loop.tds")?;

        assert_eq!(vm.output(), lines(&["5"]));
        assert_eq!(vm.trace().steps, 10);
        assert!(vm.is_halted());

        Ok(())
    }

    #[test]
    fn interpret_arithmetic() -> Result<(), VmError> {
        let vm = run_file("resources/arithmetic.tds")?;

        assert_eq!(vm.output(), lines(&["10.5", "-3", "3.5", "1"]));
        assert_eq!(vm.state().register("a"), Some(&Value::Float(10.5)));
        assert_eq!(vm.state().register("c"), Some(&Value::Float(3.5)));
        assert_eq!(vm.program_counter(), 13);

        Ok(())
    }

    #[test]
    fn interpret_bitwise() -> Result<(), VmError> {
        let vm = run_file("resources/bitwise.tds")?;

        assert_eq!(vm.output(), lines(&["8", "11", "13", "52", "6", "-7"]));

        Ok(())
    }

    #[test]
    fn interpret_strings() -> Result<(), VmError> {
        let vm = run_file("resources/strings.tds")?;

        assert_eq!(vm.output(), lines(&["foobar", "oob", "6", "hello 42"]));
        assert_eq!(vm.state().register("s"), Some(&Value::Int(6)));
        assert_eq!(vm.state().memory("greeting"), Some(&text("hello 42")));

        Ok(())
    }

    #[test]
    fn interpret_primes() -> Result<(), VmError> {
        let vm = run_file("resources/primes.tds")?;

        assert_eq!(
            vm.output(),
            lines(&[
                "2", "3", "5", "7", "11", "13", "17", "19", "23", "29", "31", "37", "41", "43",
                "47"
            ])
        );

        Ok(())
    }

    #[test]
    fn undefined_label_is_fatal() -> Result<(), VmError> {
        let mut vm = Vm::from_file("resources/undefined_label.tds", VmConfig::suppressed())?;
        let err = match vm.run() {
            Ok(trace) => panic!("ran to completion: {:?}", trace),
            Err(err) => err,
        };

        assert!(matches!(err.kind(), VmErrorKind::UndefinedLabel(label, _) if label == "L9"));
        assert_eq!(vm.output(), lines(&["1"]));
        assert!(vm.is_halted());
        assert_eq!(vm.run()?.output, lines(&["1"]));

        Ok(())
    }

    #[test]
    fn division_by_zero_is_fatal() -> Result<(), VmError> {
        let mut vm = Vm::from_file("resources/divide_by_zero.tds", VmConfig::suppressed())?;
        let err = match vm.run() {
            Ok(trace) => panic!("ran to completion: {:?}", trace),
            Err(err) => err,
        };

        assert!(matches!(
            err.kind(),
            VmErrorKind::Arithmetic(ValueError::DivisionByZero, _)
        ));
        assert!(vm.output().is_empty());
        assert_eq!(vm.state().register("a"), Some(&Value::Int(10)));

        Ok(())
    }

    #[test]
    fn type_errors_are_fatal() -> Result<(), VmError> {
        let mut vm = Vm::from_source("STOR s, \"foo\"\nSUM s, 1\nPRINT s", VmConfig::suppressed())?;
        let err = vm.run().err();
        assert!(matches!(
            err.as_ref().map(VmError::kind),
            Some(VmErrorKind::Type(ValueError::NotANumber(_), _))
        ));

        let mut vm = Vm::from_source("IF \"a\" < 1 HLT", VmConfig::suppressed())?;
        let err = vm.run().err();
        assert!(matches!(
            err.as_ref().map(VmError::kind),
            Some(VmErrorKind::Type(ValueError::Incomparable(..), _))
        ));

        Ok(())
    }

    #[test]
    fn unset_references_read_as_zero() -> Result<(), VmError> {
        let source = "PRINT z\nPRINT @z\nSUM @y, 2\nPRINT @y";
        let mut vm = Vm::from_source(source, VmConfig::suppressed())?;
        let trace = vm.run()?;

        assert_eq!(trace.output, lines(&["0", "0", "2"]));
        assert_eq!(trace.state.register("z"), None);

        Ok(())
    }

    #[test]
    fn conditional_actions() -> Result<(), VmError> {
        let source = "STOR a, 2
IF a == 2.0 STOR b, \"yes\"
IF a != 2 STOR c, 1
IF \"x\" != 1 THEN SUM a, 1
PRINT a";
        let mut vm = Vm::from_source(source, VmConfig::suppressed())?;
        let trace = vm.run()?;

        assert_eq!(trace.state.register("b"), Some(&text("yes")));
        assert_eq!(trace.state.register("c"), None);
        assert_eq!(trace.output, lines(&["3"]));

        Ok(())
    }

    #[test]
    fn reset_reruns_without_reparsing() -> Result<(), VmError> {
        let mut vm = Vm::from_file("resources/count.tds", VmConfig::suppressed())?;
        let first = vm.run()?;
        assert_eq!(first.output, lines(&["1000"]));

        vm.reset();
        assert!(vm.output().is_empty());
        assert_eq!(vm.program_counter(), 0);
        let second = vm.run()?;
        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn step_by_step() -> Result<(), VmError> {
        let source = "L0 $$$ STOR a, 1\nGOTO L2\nL1 $$$ HLT\nL2 $$$ PRINT a";
        let mut vm = Vm::from_source(source, VmConfig::suppressed())?;

        assert_eq!(vm.next_instruction(), Some(0));
        vm.step()?;
        assert_eq!(vm.next_instruction(), Some(1));
        vm.step()?;
        assert_eq!(vm.next_instruction(), Some(3));
        vm.step()?;
        assert_eq!(vm.next_instruction(), None);
        vm.step()?;
        assert_eq!(vm.output(), lines(&["1"]));

        Ok(())
    }

    #[test]
    fn parse_errors_fail_the_build() {
        let err = Vm::from_source("L0 $$$ SUM a", VmConfig::suppressed()).err();

        match err.as_ref().map(VmError::kind) {
            Some(VmErrorKind::Parse(err)) => assert_eq!(err.diagnostics().len(), 1),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn load_errors_fail_the_build() {
        let err = Vm::from_file("resources/missing.tds", VmConfig::suppressed()).err();

        assert!(matches!(
            err.as_ref().map(VmError::kind),
            Some(VmErrorKind::Load(_))
        ));
    }

    #[test]
    fn nested_if_in_hand_built_program() {
        let condition = Condition {
            left: Operand::Number(Number::Int(1)),
            op: ComparisonOp::Eq,
            right: Operand::Number(Number::Int(1)),
        };
        let inner = Instruction::conditional(
            condition.clone(),
            Instruction::new(Opcode::Hlt, vec![], 1),
            1,
        );
        let program =
            Program::from_instructions(vec![Instruction::conditional(condition, inner, 1)]);
        let err = Vm::new(program, VmConfig::suppressed()).run().err();

        assert!(matches!(
            err.as_ref().map(VmError::kind),
            Some(VmErrorKind::UndefinedOpcode(_))
        ));
    }

    #[test]
    fn literal_destination_in_hand_built_program() {
        let program = Program::from_instructions(vec![Instruction::new(
            Opcode::Stor,
            vec![
                Operand::Number(Number::Int(1)),
                Operand::Number(Number::Int(2)),
            ],
            1,
        )]);
        let err = Vm::new(program, VmConfig::suppressed()).run().err();

        assert!(matches!(
            err.as_ref().map(VmError::kind),
            Some(VmErrorKind::ParseLogic(_))
        ));
    }

    #[test]
    fn config_constructors() {
        assert_eq!(VmConfig::default(), VmConfig::new(false, false, false, false));
        assert_eq!(VmConfig::suppressed(), VmConfig::new(false, false, false, true));
        assert_eq!(VmConfig::debug(), VmConfig::new(false, true, false, false));
        assert_eq!(VmConfig::debug_memory(), VmConfig::new(false, true, true, false));
        assert_eq!(VmConfig::raw(), VmConfig::new(true, false, false, false));
    }

    #[test]
    fn tracing_configs_do_not_change_the_result() -> Result<(), VmError> {
        let expected = run_file("resources/loop.tds")?.trace();
        let configs = [
            VmConfig::new(true, false, false, true),
            VmConfig::new(false, true, false, true),
            VmConfig::new(false, true, true, true),
        ];
        for config in configs {
            let mut vm = Vm::from_file("resources/loop.tds", config)?;
            assert_eq!(vm.run()?, expected);
        }

        Ok(())
    }
}
