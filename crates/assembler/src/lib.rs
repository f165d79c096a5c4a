//! n7 assembler.
//!
//! Translates the textual assembly produced by the n7 compiler into compact
//! bytecode. The work happens in three stages:
//!
//! 1. The [`lexer`] parses every line into labels, instructions, and
//!    metadata records, resolving each instruction against the shared
//!    instruction table.
//! 2. The [`peephole`] rewriter (when optimization is enabled) fuses
//!    recognized sequences into synthetic `opt_*` instructions.
//! 3. Two linear passes assign byte offsets to labels and then encode
//!    instructions, patching label references with absolute offsets.
//!
//! [`disasm`] decodes a bytecode stream back to reassemblable text, mainly
//! for inspecting compiler output and round-trip testing.

pub mod disasm;
pub mod error;
pub mod lexer;
pub mod peephole;

pub use disasm::disassemble;
pub use error::AsmError;

use lexer::{Instr, Item, Meta, Operand};
use n7_core::instr::{OP_DBG_FILE, OP_DBG_LINE};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Assemble a source string into bytecode.
///
/// `filename` is used for diagnostics only. Metadata records are encoded as
/// debug records when `debug` is set and dropped otherwise.
pub fn assemble(
    source: &str,
    filename: &str,
    optimize: bool,
    debug: bool,
) -> Result<Vec<u8>, AsmError> {
    let mut items = lexer::parse(source, filename)?;
    if optimize {
        items = peephole::fuse(items);
    }
    let labels = collect_labels(&items, filename, debug)?;
    emit(&items, &labels, filename, debug)
}

/// Assemble `src` into `dst`.
pub fn assemble_file(src: &Path, dst: &Path, optimize: bool, debug: bool) -> Result<(), AsmError> {
    let source = fs::read_to_string(src).map_err(|_| {
        AsmError::io(format!(
            "Could not open file '{}' for reading",
            src.display()
        ))
    })?;
    let filename = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| src.display().to_string());
    let bytecode = assemble(&source, &filename, optimize, debug)?;
    fs::write(dst, bytecode).map_err(|_| {
        AsmError::io(format!(
            "Could not open file '{}' for writing",
            dst.display()
        ))
    })
}

/// Symbol pass: assign a byte offset to every label definition.
fn collect_labels(
    items: &[Item],
    filename: &str,
    debug: bool,
) -> Result<HashMap<String, u32>, AsmError> {
    let mut labels = HashMap::new();
    let mut offset: u32 = 0;

    for item in items {
        match item {
            Item::Label { name, line } => {
                if labels.insert(name.clone(), offset).is_some() {
                    return Err(AsmError::at(
                        filename,
                        *line,
                        format!("Duplicate label '{}'", name),
                    ));
                }
            }
            Item::Instr(instr) => offset += instr_size(instr),
            Item::Meta { meta, .. } => offset += meta_size(meta, debug),
        }
    }

    Ok(labels)
}

/// Emit pass: encode instructions and patch label references.
fn emit(
    items: &[Item],
    labels: &HashMap<String, u32>,
    filename: &str,
    debug: bool,
) -> Result<Vec<u8>, AsmError> {
    let mut out = Vec::new();

    for item in items {
        match item {
            Item::Label { .. } => {}
            Item::Meta { meta, .. } => {
                if debug {
                    match meta {
                        Meta::File(name) => {
                            out.push(OP_DBG_FILE);
                            encode_str(&mut out, name);
                        }
                        Meta::Line(line) => {
                            out.push(OP_DBG_LINE);
                            out.extend_from_slice(&line.to_le_bytes());
                        }
                    }
                }
            }
            Item::Instr(instr) => {
                out.push(instr.spec.opcode);
                for operand in &instr.operands {
                    match operand {
                        Operand::Reg(r) => out.push(*r),
                        Operand::Int(n) => out.extend_from_slice(&n.to_le_bytes()),
                        Operand::Float(f) => out.extend_from_slice(&f.to_le_bytes()),
                        Operand::Str(s) | Operand::Name(s) => encode_str(&mut out, s),
                        Operand::LabelRef(name) => {
                            let target = labels.get(name).ok_or_else(|| {
                                AsmError::at(
                                    filename,
                                    instr.line,
                                    format!("Undefined label '{}'", name),
                                )
                            })?;
                            out.extend_from_slice(&target.to_le_bytes());
                        }
                    }
                }
            }
        }
    }

    Ok(out)
}

fn encode_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn instr_size(instr: &Instr) -> u32 {
    let mut size = 1;
    for operand in &instr.operands {
        size += match operand {
            Operand::Reg(_) => 1,
            Operand::Int(_) => 4,
            Operand::Float(_) => 8,
            Operand::Str(s) | Operand::Name(s) => 4 + s.len() as u32,
            Operand::LabelRef(_) => 4,
        };
    }
    size
}

fn meta_size(meta: &Meta, debug: bool) -> u32 {
    if !debug {
        return 0;
    }
    match meta {
        Meta::File(name) => 1 + 4 + name.len() as u32,
        Meta::Line(_) => 1 + 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n7_core::instr::find_instr;
    use n7_core::instr::OperandKind::{Label, Reg};

    #[test]
    fn forward_label_reference_resolves() {
        let source = "jmp end_1:\nnop\nend_1:\nend\n";
        let bytecode = assemble(source, "t.n7a", true, false).unwrap();
        let jmp = find_instr("jmp", &[Label]).unwrap();
        let nop = find_instr("nop", &[]).unwrap();
        let end = find_instr("end", &[]).unwrap();
        // jmp (1 + 4 bytes), nop (1 byte), then the label target.
        assert_eq!(bytecode[0], jmp.opcode);
        assert_eq!(&bytecode[1..5], &6u32.to_le_bytes());
        assert_eq!(bytecode[5], nop.opcode);
        assert_eq!(bytecode[6], end.opcode);
    }

    #[test]
    fn backward_label_reference_resolves() {
        let source = "loop_0:\nnop\njmp loop_0:\n";
        let bytecode = assemble(source, "t.n7a", true, false).unwrap();
        assert_eq!(&bytecode[2..6], &0u32.to_le_bytes());
    }

    #[test]
    fn undefined_label_fails() {
        let err = assemble("jmp nowhere:\n", "t.n7a", true, false).unwrap_err();
        assert!(err.to_string().contains("Undefined label 'nowhere'"));
    }

    #[test]
    fn duplicate_label_fails() {
        let err = assemble("x:\nnop\nx:\n", "t.n7a", true, false).unwrap_err();
        assert!(err.to_string().contains("Duplicate label 'x'"));
    }

    #[test]
    fn string_operands_are_length_prefixed() {
        let bytecode = assemble("move @0 \"hi\"\n", "t.n7a", true, false).unwrap();
        let spec = find_instr(
            "move",
            &[Reg, n7_core::instr::OperandKind::Str],
        )
        .unwrap();
        assert_eq!(bytecode[0], spec.opcode);
        assert_eq!(bytecode[1], 0);
        assert_eq!(&bytecode[2..6], &2u32.to_le_bytes());
        assert_eq!(&bytecode[6..8], b"hi");
    }

    #[test]
    fn float_operands_are_le_f64() {
        let bytecode = assemble("move @0 1.5\n", "t.n7a", true, false).unwrap();
        assert_eq!(&bytecode[2..10], &1.5f64.to_le_bytes());
    }

    #[test]
    fn metadata_dropped_without_debug() {
        let plain = assemble("/file:m.n7\n/line:1\nnop\n", "t.n7a", true, false).unwrap();
        assert_eq!(plain.len(), 1);
        let tagged = assemble("/file:m.n7\n/line:1\nnop\n", "t.n7a", true, true).unwrap();
        assert_eq!(tagged[0], OP_DBG_FILE);
        assert!(tagged.len() > plain.len());
    }

    #[test]
    fn debug_records_shift_label_offsets() {
        let source = "/line:1\nx:\njmp x:\n";
        let without = assemble(source, "t.n7a", true, false).unwrap();
        assert_eq!(&without[1..5], &0u32.to_le_bytes());
        let with = assemble(source, "t.n7a", true, true).unwrap();
        // The label now sits after the 5-byte line record.
        assert_eq!(&with[6..10], &5u32.to_le_bytes());
    }

    #[test]
    fn optimize_flag_controls_fusion() {
        let source = "mpush\nmload .x\nmget @0\nmpop\n";
        let fused = assemble(source, "t.n7a", true, false).unwrap();
        let plain = assemble(source, "t.n7a", false, false).unwrap();
        let opt = find_instr("opt_loadsinglevar", &[n7_core::instr::OperandKind::Name]).unwrap();
        assert_eq!(fused[0], opt.opcode);
        assert!(plain.len() > fused.len());
    }
}
