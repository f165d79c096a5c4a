//! The n7 instruction table.
//!
//! A mnemonic in the textual assembly may translate into different binary
//! instructions depending on its operands (`mload .x`, `mload @0` and
//! `mload 3` are three distinct opcodes). The table below is the single
//! source of truth for that mapping; the assembler resolves each parsed
//! line against it and the runtime decodes operands according to the
//! signature of the opcode it reads.
//!
//! Operand encoding:
//! - `Reg`: one byte (register number)
//! - `Int`: little-endian i32
//! - `Float`: little-endian IEEE-754 f64
//! - `Str` / `Name`: 32-bit length prefix followed by UTF-8 bytes
//! - `Label`: absolute 32-bit byte offset into the bytecode stream

/// Kind of a single instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// Register reference, `@N`.
    Reg,
    /// Integer literal.
    Int,
    /// Float literal.
    Float,
    /// String literal, `"..."`.
    Str,
    /// Variable name, `.foo`.
    Name,
    /// Label reference, `foo:`.
    Label,
}

/// One concrete instruction form: mnemonic, operand signature, opcode.
#[derive(Debug)]
pub struct InstrSpec {
    pub mnemonic: &'static str,
    pub operands: &'static [OperandKind],
    pub opcode: u8,
}

use OperandKind::{Float, Int, Label, Name, Reg, Str};

/// Opcode of the debug record carrying a source file name.
pub const OP_DBG_FILE: u8 = 0xf0;

/// Opcode of the debug record carrying a source line number.
pub const OP_DBG_LINE: u8 = 0xf1;

macro_rules! instr {
    ($mnemonic:literal, [$($op:expr),*], $opcode:literal) => {
        InstrSpec {
            mnemonic: $mnemonic,
            operands: &[$($op),*],
            opcode: $opcode,
        }
    };
}

/// Every instruction form understood by the assembler and the runtime.
pub const INSTRUCTIONS: &[InstrSpec] = &[
    // Misc.
    instr!("nop", [], 0x00),
    instr!("end", [], 0x01),
    instr!("gc", [], 0x02),
    instr!("lgc", [], 0x03),
    instr!("ulgc", [], 0x04),
    instr!("mdump", [], 0x05),
    instr!("rdump", [], 0x06),
    instr!("sdump", [], 0x07),
    instr!("assert", [Reg, Reg], 0x08),
    instr!("rte", [Reg], 0x09),
    instr!("eval", [Reg], 0x0a),
    // Memory stack.
    instr!("mpush", [], 0x10),
    instr!("mpop", [], 0x11),
    instr!("mswap", [], 0x12),
    instr!("mload", [Name], 0x13),
    instr!("mload", [Reg], 0x14),
    instr!("mload", [Int], 0x15),
    instr!("mloads", [], 0x16),
    instr!("mset", [Reg], 0x17),
    instr!("mget", [Reg], 0x18),
    instr!("madd", [Name], 0x19),
    instr!("madd", [Reg], 0x1a),
    instr!("madd", [Int], 0x1b),
    instr!("mdel", [Name], 0x1c),
    instr!("mdel", [Reg], 0x1d),
    instr!("mclr", [], 0x1e),
    instr!("lptbl", [Reg], 0x1f),
    instr!("loadpm", [], 0x20),
    instr!("local", [], 0x21),
    instr!("ctbl", [Reg], 0x22),
    // Value stack.
    instr!("push", [Reg], 0x28),
    instr!("pop", [Reg], 0x29),
    instr!("swap", [Reg], 0x2a),
    instr!("spop", [Reg, Reg], 0x2b),
    // Register loads and copies.
    instr!("move", [Reg, Int], 0x30),
    instr!("move", [Reg, Float], 0x31),
    instr!("move", [Reg, Str], 0x32),
    instr!("move", [Reg, Label], 0x33),
    instr!("move", [Reg, Reg], 0x34),
    instr!("clr", [Reg], 0x35),
    instr!("cpy", [Reg, Reg], 0x36),
    // Arithmetic and logic, register forms.
    instr!("add", [Reg, Reg], 0x40),
    instr!("sub", [Reg, Reg], 0x41),
    instr!("mul", [Reg, Reg], 0x42),
    instr!("div", [Reg, Reg], 0x43),
    instr!("mod", [Reg, Reg], 0x44),
    instr!("neg", [Reg], 0x45),
    instr!("eql", [Reg, Reg], 0x46),
    instr!("less", [Reg, Reg], 0x47),
    instr!("gre", [Reg, Reg], 0x48),
    instr!("leql", [Reg, Reg], 0x49),
    instr!("geql", [Reg, Reg], 0x4a),
    instr!("neql", [Reg, Reg], 0x4b),
    instr!("and", [Reg, Reg], 0x4c),
    instr!("or", [Reg, Reg], 0x4d),
    instr!("not", [Reg], 0x4e),
    instr!("por", [], 0x4f),
    instr!("pand", [], 0x50),
    instr!("ecmp", [Reg, Reg], 0x51),
    // Fused swap-with-stack, pop and operate.
    instr!("spadd", [], 0x58),
    instr!("spsub", [], 0x59),
    instr!("spmul", [], 0x5a),
    instr!("spdiv", [], 0x5b),
    instr!("spmod", [], 0x5c),
    instr!("speql", [], 0x5d),
    instr!("spless", [], 0x5e),
    instr!("spgre", [], 0x5f),
    instr!("spleql", [], 0x60),
    instr!("spgeql", [], 0x61),
    instr!("spneql", [], 0x62),
    // Math primitives.
    instr!("cos", [Reg], 0x68),
    instr!("sin", [Reg], 0x69),
    instr!("tan", [Reg], 0x6a),
    instr!("acos", [Reg], 0x6b),
    instr!("asin", [Reg], 0x6c),
    instr!("atan", [Reg], 0x6d),
    instr!("atan2", [Reg, Reg], 0x6e),
    instr!("sqr", [Reg], 0x6f),
    instr!("log", [Reg], 0x70),
    instr!("sgn", [Reg], 0x71),
    instr!("pow", [Reg, Reg], 0x72),
    instr!("floor", [Reg], 0x73),
    instr!("ceil", [Reg], 0x74),
    instr!("round", [Reg], 0x75),
    instr!("rad", [Reg], 0x76),
    instr!("deg", [Reg], 0x77),
    instr!("min", [Reg, Reg], 0x78),
    instr!("max", [Reg, Reg], 0x79),
    instr!("abs", [Reg], 0x7a),
    // Conversion and introspection.
    instr!("str", [Reg, Reg], 0x80),
    instr!("num", [Reg, Reg], 0x81),
    instr!("int", [Reg, Reg], 0x82),
    instr!("type", [Reg, Reg], 0x83),
    instr!("size", [Reg, Reg], 0x84),
    instr!("len", [Reg, Reg], 0x85),
    // Control flow.
    instr!("jmp", [Label], 0x90),
    instr!("jmpt", [Label], 0x91),
    instr!("jmpf", [Label], 0x92),
    instr!("jmpet", [Reg, Label], 0x93),
    instr!("jmpef", [Reg, Label], 0x94),
    instr!("call", [Reg], 0x95),
    instr!("ret", [], 0x96),
    // Iteration.
    instr!("iload", [], 0xa0),
    instr!("ihas", [], 0xa1),
    instr!("ival", [Reg], 0xa2),
    instr!("ikey", [Reg], 0xa3),
    instr!("ipush", [], 0xa4),
    instr!("ipop", [], 0xa5),
    instr!("istep", [], 0xa6),
    instr!("idel", [], 0xa7),
    // System and foreign calls.
    instr!("sys", [Int, Int], 0xb0),
    instr!("fload", [Reg], 0xb1),
    instr!("fload", [Str], 0xb2),
    instr!("fcall", [Int], 0xb3),
    // Peephole fusions.
    instr!("opt_mals", [Name], 0xc0),
    instr!("opt_mals", [Reg], 0xc1),
    instr!("opt_mssp", [Reg], 0xc2),
    instr!("opt_loadparam", [Name], 0xc3),
    instr!("opt_loadsinglevar", [Name], 0xc4),
    instr!("opt_loadsinglevarg", [Name], 0xc5),
    instr!("opt_pval", [Int, Str], 0xc6),
];

/// Look up the instruction form matching a mnemonic and operand signature.
pub fn find_instr(mnemonic: &str, operands: &[OperandKind]) -> Option<&'static InstrSpec> {
    INSTRUCTIONS
        .iter()
        .find(|spec| spec.mnemonic == mnemonic && spec.operands == operands)
}

/// Look up an instruction form by its opcode.
pub fn find_by_opcode(opcode: u8) -> Option<&'static InstrSpec> {
    INSTRUCTIONS.iter().find(|spec| spec.opcode == opcode)
}

/// Whether any form of the given mnemonic exists.
pub fn mnemonic_known(mnemonic: &str) -> bool {
    INSTRUCTIONS.iter().any(|spec| spec.mnemonic == mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn opcodes_are_unique() {
        let mut seen = HashSet::new();
        for spec in INSTRUCTIONS {
            assert!(
                seen.insert(spec.opcode),
                "duplicate opcode {:#04x} ({})",
                spec.opcode,
                spec.mnemonic
            );
        }
    }

    #[test]
    fn signatures_are_unique_per_mnemonic() {
        let mut seen = HashSet::new();
        for spec in INSTRUCTIONS {
            assert!(
                seen.insert((spec.mnemonic, spec.operands)),
                "duplicate form for {}",
                spec.mnemonic
            );
        }
    }

    #[test]
    fn lookup_distinguishes_operand_forms() {
        let by_name = find_instr("mload", &[OperandKind::Name]).unwrap();
        let by_reg = find_instr("mload", &[OperandKind::Reg]).unwrap();
        let by_index = find_instr("mload", &[OperandKind::Int]).unwrap();
        assert_ne!(by_name.opcode, by_reg.opcode);
        assert_ne!(by_reg.opcode, by_index.opcode);
        assert!(find_instr("mload", &[OperandKind::Str]).is_none());
    }
}
