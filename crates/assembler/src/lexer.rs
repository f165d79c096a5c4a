//! Line lexer for n7a assembly.
//!
//! One instruction per line. A line is either a label definition (a single
//! word ending in `:`), a metadata record (`/file:...` or `/line:...`), or
//! a mnemonic followed by operands. Operands are registers (`@N`), integer
//! or float literals, string literals, variable names (`.foo`), or label
//! references (`foo:`). Each parsed instruction is resolved against the
//! instruction table immediately, so unknown mnemonics and malformed
//! operand signatures are reported with the offending line.

use crate::error::AsmError;
use n7_core::instr::{find_instr, mnemonic_known, InstrSpec, OperandKind};

/// A parsed instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Reg(u8),
    Int(i32),
    Float(f64),
    Str(String),
    Name(String),
    LabelRef(String),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Reg(_) => OperandKind::Reg,
            Operand::Int(_) => OperandKind::Int,
            Operand::Float(_) => OperandKind::Float,
            Operand::Str(_) => OperandKind::Str,
            Operand::Name(_) => OperandKind::Name,
            Operand::LabelRef(_) => OperandKind::Label,
        }
    }
}

/// A resolved instruction with its source line.
#[derive(Debug, Clone)]
pub struct Instr {
    pub spec: &'static InstrSpec,
    pub operands: Vec<Operand>,
    pub line: usize,
}

/// Debug metadata carried through to the bytecode when requested.
#[derive(Debug, Clone)]
pub enum Meta {
    File(String),
    Line(i32),
}

/// One element of the parsed program.
#[derive(Debug, Clone)]
pub enum Item {
    Label { name: String, line: usize },
    Instr(Instr),
    Meta { meta: Meta, line: usize },
}

/// Parse a complete n7a source into items.
pub fn parse(source: &str, filename: &str) -> Result<Vec<Item>, AsmError> {
    let mut items = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        // Metadata record.
        if let Some(rest) = line.strip_prefix('/') {
            let meta = if let Some(file) = rest.strip_prefix("file:") {
                Meta::File(file.to_string())
            } else if let Some(num) = rest.strip_prefix("line:") {
                let value = num.trim().parse::<i32>().map_err(|_| {
                    AsmError::at(filename, line_no, format!("Invalid line record '{}'", raw))
                })?;
                Meta::Line(value)
            } else {
                // Unrecognized records are dropped, like unknown directives.
                continue;
            };
            items.push(Item::Meta {
                meta,
                line: line_no,
            });
            continue;
        }

        let tokens = split_tokens(line, filename, line_no)?;
        let mut tokens = tokens.as_slice();

        // Label definition at the start of the line.
        if let Some(first) = tokens.first() {
            if !first.starts_with('"') && first.ends_with(':') && tokens.len() == 1 {
                items.push(Item::Label {
                    name: first[..first.len() - 1].to_string(),
                    line: line_no,
                });
                continue;
            }
            // Allow `label: instr ...` on one line.
            if !first.starts_with('"') && first.ends_with(':') && tokens.len() > 1 {
                items.push(Item::Label {
                    name: first[..first.len() - 1].to_string(),
                    line: line_no,
                });
                tokens = &tokens[1..];
            }
        }

        let mnemonic = tokens[0].as_str();
        let mut operands = Vec::with_capacity(tokens.len() - 1);
        for token in &tokens[1..] {
            operands.push(parse_operand(token, filename, line_no)?);
        }

        let kinds: Vec<OperandKind> = operands.iter().map(Operand::kind).collect();
        let spec = find_instr(mnemonic, &kinds).ok_or_else(|| {
            if mnemonic_known(mnemonic) {
                AsmError::at(filename, line_no, format!("Invalid operand: {}", line))
            } else {
                AsmError::at(
                    filename,
                    line_no,
                    format!("Unknown instruction '{}'", mnemonic),
                )
            }
        })?;

        items.push(Item::Instr(Instr {
            spec,
            operands,
            line: line_no,
        }));
    }

    Ok(items)
}

/// Split a line into whitespace-separated tokens, keeping quoted strings
/// (including their quotes) as single tokens.
fn split_tokens(line: &str, filename: &str, line_no: usize) -> Result<Vec<String>, AsmError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut token = String::from('"');
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(ch) => token.push(ch),
                    None => {
                        return Err(AsmError::at(
                            filename,
                            line_no,
                            "Unterminated string operand",
                        ))
                    }
                }
            }
            token.push('"');
            tokens.push(token);
        } else {
            let mut token = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
            tokens.push(token);
        }
    }

    Ok(tokens)
}

fn parse_operand(token: &str, filename: &str, line_no: usize) -> Result<Operand, AsmError> {
    let invalid = || AsmError::at(filename, line_no, format!("Invalid operand: {}", token));

    if let Some(rest) = token.strip_prefix('@') {
        let reg = rest.parse::<u8>().map_err(|_| invalid())?;
        return Ok(Operand::Reg(reg));
    }
    if let Some(rest) = token.strip_prefix('"') {
        let text = rest.strip_suffix('"').ok_or_else(invalid)?;
        return Ok(Operand::Str(text.to_string()));
    }
    if let Some(rest) = token.strip_prefix('.') {
        if rest.is_empty() {
            return Err(invalid());
        }
        return Ok(Operand::Name(rest.to_string()));
    }
    if let Some(rest) = token.strip_suffix(':') {
        if rest.is_empty() {
            return Err(invalid());
        }
        return Ok(Operand::LabelRef(rest.to_string()));
    }

    // Numeric literal: integer unless it carries a decimal point or does
    // not fit a 32-bit integer.
    if !token.contains('.') {
        if let Ok(value) = token.parse::<i64>() {
            if let Ok(value) = i32::try_from(value) {
                return Ok(Operand::Int(value));
            }
            return Ok(Operand::Float(value as f64));
        }
    }
    if let Ok(value) = token.parse::<f64>() {
        return Ok(Operand::Float(value));
    }

    Err(invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(line: &str) -> Item {
        let items = parse(line, "t.n7a").unwrap();
        assert_eq!(items.len(), 1);
        items.into_iter().next().unwrap()
    }

    #[test]
    fn parses_register_and_name_operands() {
        match parse_one("mload .player") {
            Item::Instr(i) => {
                assert_eq!(i.spec.mnemonic, "mload");
                assert_eq!(i.operands, vec![Operand::Name("player".to_string())]);
            }
            other => panic!("unexpected item: {:?}", other),
        }
        match parse_one("mset @3") {
            Item::Instr(i) => assert_eq!(i.operands, vec![Operand::Reg(3)]),
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn parses_string_with_spaces() {
        match parse_one("move @0 \"hello world\"") {
            Item::Instr(i) => {
                assert_eq!(i.operands[1], Operand::Str("hello world".to_string()));
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn distinguishes_int_and_float_literals() {
        match parse_one("move @0 42") {
            Item::Instr(i) => assert_eq!(i.operands[1], Operand::Int(42)),
            other => panic!("unexpected item: {:?}", other),
        }
        match parse_one("move @0 42.5") {
            Item::Instr(i) => assert_eq!(i.operands[1], Operand::Float(42.5)),
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn label_definition_and_reference() {
        match parse_one("while_3:") {
            Item::Label { name, .. } => assert_eq!(name, "while_3"),
            other => panic!("unexpected item: {:?}", other),
        }
        match parse_one("jmp while_3:") {
            Item::Instr(i) => {
                assert_eq!(i.operands[0], Operand::LabelRef("while_3".to_string()));
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn unknown_instruction_is_reported() {
        let err = parse("frobnicate @0", "t.n7a").unwrap_err();
        assert!(err.to_string().contains("Unknown instruction 'frobnicate'"));
        assert!(err.to_string().starts_with("t.n7a:1:"));
    }

    #[test]
    fn wrong_operand_signature_is_reported() {
        let err = parse("mload \"str\"", "t.n7a").unwrap_err();
        assert!(err.to_string().contains("Invalid operand"));
    }

    #[test]
    fn metadata_records() {
        let items = parse("/file:main.n7\n/line:3", "t.n7a").unwrap();
        assert!(matches!(
            &items[0],
            Item::Meta {
                meta: Meta::File(f),
                ..
            } if f == "main.n7"
        ));
        assert!(matches!(
            &items[1],
            Item::Meta {
                meta: Meta::Line(3),
                ..
            }
        ));
    }
}
