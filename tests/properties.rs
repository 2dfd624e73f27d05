use proptest::prelude::*;
use tridollar::{Instruction, LabelIndex, Opcode, Parser};

proptest! {
    #[test]
    fn parsing_is_pure(source in "[ -~\n]{0,200}") {
        let first = Parser::new(&source).parse();
        let second = Parser::new(&source).parse();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn parsing_never_loses_a_diagnostic_position(source in "[ -~\n]{0,200}") {
        let (_, diagnostics) = Parser::new(&source).parse();
        let lines = source.lines().count().max(1) + 1;

        for diagnostic in diagnostics {
            prop_assert!(diagnostic.line >= 1 && diagnostic.line <= lines);
            prop_assert!(diagnostic.column >= 1);
        }
    }

    #[test]
    fn unique_labels_index_their_instruction(
        labels in proptest::collection::btree_set(0u32..500, 0..40),
        gaps in proptest::collection::vec(any::<bool>(), 40),
    ) {
        let mut instructions = vec![];
        for (i, label) in labels.iter().enumerate() {
            if gaps[i] {
                let line = instructions.len() + 1;
                instructions.push(Instruction::new(Opcode::Hlt, vec![], line));
            }
            let line = instructions.len() + 1;
            let instr = Instruction::new(Opcode::Hlt, vec![], line).labeled(&format!("L{}", label));
            instructions.push(instr);
        }
        let (index, duplicates) = LabelIndex::build(&instructions);

        prop_assert!(duplicates.is_empty());
        prop_assert_eq!(index.len(), labels.len());
        for (i, instr) in instructions.iter().enumerate() {
            if let Some(label) = &instr.label {
                prop_assert_eq!(index.get(label), Some(i));
            }
        }
    }

    #[test]
    fn parsed_labels_resolve_to_their_instruction(
        labels in proptest::collection::btree_set(0u32..500, 1..30),
    ) {
        let source: String = labels
            .iter()
            .map(|label| format!("L{} $$$ PRINT {}\n", label, label))
            .collect();
        let (program, diagnostics) = Parser::new(&source).parse();

        prop_assert!(diagnostics.is_empty());
        for (i, label) in labels.iter().enumerate() {
            prop_assert_eq!(program.labels().get(&format!("L{}", label)), Some(i));
        }
    }
}
