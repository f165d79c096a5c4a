//! Bytecode disassembler.
//!
//! Decodes an n7b stream back into assembly text. Label references are
//! absolute byte offsets in the bytecode, so the disassembler runs two
//! passes: the first collects every referenced offset, the second prints
//! instructions with synthetic `loc_<offset>:` labels inserted at those
//! positions. The output reassembles to the identical byte stream.

use crate::error::AsmError;
use n7_core::instr::{find_by_opcode, InstrSpec, OperandKind, OP_DBG_FILE, OP_DBG_LINE};
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Disassemble a bytecode stream.
pub fn disassemble(bytecode: &[u8]) -> Result<String, AsmError> {
    let targets = collect_targets(bytecode)?;
    let mut out = String::new();
    let mut reader = Reader::new(bytecode);

    while !reader.at_end() {
        if targets.contains(&(reader.pos as u32)) {
            let _ = writeln!(out, "loc_{}:", reader.pos);
        }
        let opcode = reader.byte()?;
        if opcode == OP_DBG_FILE {
            let _ = writeln!(out, "/file:{}", reader.string()?);
            continue;
        }
        if opcode == OP_DBG_LINE {
            let _ = writeln!(out, "/line:{}", reader.int()?);
            continue;
        }
        let spec = spec_for(opcode, reader.pos - 1)?;
        let _ = write!(out, "{}", spec.mnemonic);
        for kind in spec.operands {
            match kind {
                OperandKind::Reg => {
                    let _ = write!(out, " @{}", reader.byte()?);
                }
                OperandKind::Int => {
                    let _ = write!(out, " {}", reader.int()?);
                }
                OperandKind::Float => {
                    let _ = write!(out, " {}", format_float(reader.float()?));
                }
                OperandKind::Str => {
                    let _ = write!(out, " \"{}\"", reader.string()?);
                }
                OperandKind::Name => {
                    let _ = write!(out, " .{}", reader.string()?);
                }
                OperandKind::Label => {
                    let _ = write!(out, " loc_{}:", reader.u32()?);
                }
            }
        }
        let _ = writeln!(out);
    }
    // A jump target at the very end of the stream.
    if targets.contains(&(bytecode.len() as u32)) {
        let _ = writeln!(out, "loc_{}:", bytecode.len());
    }

    Ok(out)
}

/// First pass: every byte offset referenced by a label operand.
fn collect_targets(bytecode: &[u8]) -> Result<BTreeSet<u32>, AsmError> {
    let mut targets = BTreeSet::new();
    let mut reader = Reader::new(bytecode);

    while !reader.at_end() {
        let opcode = reader.byte()?;
        if opcode == OP_DBG_FILE {
            reader.string()?;
            continue;
        }
        if opcode == OP_DBG_LINE {
            reader.int()?;
            continue;
        }
        let spec = spec_for(opcode, reader.pos - 1)?;
        for kind in spec.operands {
            match kind {
                OperandKind::Reg => {
                    reader.byte()?;
                }
                OperandKind::Int => {
                    reader.int()?;
                }
                OperandKind::Float => {
                    reader.float()?;
                }
                OperandKind::Str | OperandKind::Name => {
                    reader.string()?;
                }
                OperandKind::Label => {
                    targets.insert(reader.u32()?);
                }
            }
        }
    }

    Ok(targets)
}

fn spec_for(opcode: u8, offset: usize) -> Result<&'static InstrSpec, AsmError> {
    find_by_opcode(opcode).ok_or_else(|| {
        AsmError::io(format!(
            "Unknown opcode {:#04x} at offset {}",
            opcode, offset
        ))
    })
}

/// Print a float so it reads back as a float (always with a decimal point).
fn format_float(value: f64) -> String {
    let text = format!("{}", value);
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{}.0", text)
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn truncated(&self) -> AsmError {
        AsmError::io(format!("Truncated bytecode at offset {}", self.pos))
    }

    fn byte(&mut self) -> Result<u8, AsmError> {
        let b = *self.bytes.get(self.pos).ok_or_else(|| self.truncated())?;
        self.pos += 1;
        Ok(b)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], AsmError> {
        if self.pos + n > self.bytes.len() {
            return Err(self.truncated());
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn int(&mut self) -> Result<i32, AsmError> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32, AsmError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn float(&mut self) -> Result<f64, AsmError> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn string(&mut self) -> Result<String, AsmError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AsmError::io(format!("Invalid string data at offset {}", self.pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;

    fn round_trip(source: &str) {
        let first = assemble(source, "t.n7a", false, false).unwrap();
        let text = disassemble(&first).unwrap();
        let second = assemble(&text, "t.n7a", false, false).unwrap();
        assert_eq!(first, second, "round trip diverged for:\n{}", text);
    }

    #[test]
    fn round_trips_control_flow() {
        round_trip("start:\nmove @0 10\npush @0\njmp start:\nend\n");
    }

    #[test]
    fn round_trips_every_operand_kind() {
        round_trip(
            "move @0 42\nmove @1 1.5\nmove @2 \"hi there\"\nmload .player\nsys 3 1\ntarget:\njmpef @0 target:\n",
        );
    }

    #[test]
    fn round_trips_fused_instructions() {
        let source = "mpush\nmadd .x\nmload .x\nmswap\nmove @0 5\nmswap\nmset @0\nmpop\n";
        let fused = assemble(source, "t.n7a", true, false).unwrap();
        let text = disassemble(&fused).unwrap();
        assert!(text.contains("opt_mals .x"));
        assert!(text.contains("opt_mssp @0"));
        let again = assemble(&text, "t.n7a", false, false).unwrap();
        assert_eq!(fused, again);
    }

    #[test]
    fn labels_are_synthesized_at_referenced_offsets() {
        let bytecode = assemble("nop\nhere:\nnop\njmp here:\n", "t.n7a", false, false).unwrap();
        let text = disassemble(&bytecode).unwrap();
        assert!(text.contains("loc_1:"));
        assert!(text.contains("jmp loc_1:"));
    }

    #[test]
    fn debug_records_come_back_as_metadata() {
        let bytecode = assemble("/file:m.n7\n/line:7\nnop\n", "t.n7a", false, true).unwrap();
        let text = disassemble(&bytecode).unwrap();
        assert!(text.contains("/file:m.n7"));
        assert!(text.contains("/line:7"));
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let bytecode = assemble("move @0 42\n", "t.n7a", false, false).unwrap();
        assert!(disassemble(&bytecode[..bytecode.len() - 1]).is_err());
    }
}
