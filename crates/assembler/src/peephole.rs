//! Peephole fusion.
//!
//! Rewrites recognized instruction sequences into the synthetic `opt_*`
//! instructions before offsets are assigned, so both assembler passes see
//! the same stream. Rules are tried longest-first at every position; a
//! window never spans a label definition or metadata record (the only
//! exception being the parameter-count check, which consumes its own
//! trailing label and re-emits it after the fused instruction).

use crate::lexer::{Instr, Item, Operand};
use n7_core::instr::{find_instr, OperandKind};

struct Fusion {
    consumed: usize,
    replacement: Vec<Item>,
}

type Rule = fn(&[Item]) -> Option<Fusion>;

/// Rules ordered longest window first so that, for example, the parameter
/// binding sequence is not half-eaten by the shorter `opt_mals` rule.
const RULES: &[Rule] = &[fuse_pval, fuse_loadparam, fuse_loadsinglevarg, fuse_loadsinglevar, fuse_mals, fuse_mssp];

/// Run the rewriter over a parsed program.
pub fn fuse(items: Vec<Item>) -> Vec<Item> {
    let mut out = Vec::with_capacity(items.len());
    let mut i = 0;
    'outer: while i < items.len() {
        for rule in RULES {
            if let Some(fusion) = rule(&items[i..]) {
                out.extend(fusion.replacement);
                i += fusion.consumed;
                continue 'outer;
            }
        }
        out.push(items[i].clone());
        i += 1;
    }
    out
}

fn instr<'a>(item: &'a Item, mnemonic: &str) -> Option<&'a Instr> {
    match item {
        Item::Instr(i) if i.spec.mnemonic == mnemonic => Some(i),
        _ => None,
    }
}

fn reg(i: &Instr, index: usize) -> Option<u8> {
    match i.operands.get(index) {
        Some(Operand::Reg(r)) => Some(*r),
        _ => None,
    }
}

fn make(mnemonic: &str, operands: Vec<Operand>, line: usize) -> Item {
    let kinds: Vec<OperandKind> = operands.iter().map(Operand::kind).collect();
    let spec = find_instr(mnemonic, &kinds).expect("fused instruction form exists");
    Item::Instr(Instr {
        spec,
        operands,
        line,
    })
}

/// `madd X; mload X; mswap` -> `opt_mals X` (X a name or a register).
fn fuse_mals(items: &[Item]) -> Option<Fusion> {
    if items.len() < 3 {
        return None;
    }
    let madd = instr(&items[0], "madd")?;
    let mload = instr(&items[1], "mload")?;
    instr(&items[2], "mswap")?;
    let target = madd.operands.first()?;
    if mload.operands.first()? != target {
        return None;
    }
    if !matches!(target, Operand::Name(_) | Operand::Reg(_)) {
        return None;
    }
    Some(Fusion {
        consumed: 3,
        replacement: vec![make("opt_mals", vec![target.clone()], madd.line)],
    })
}

/// `mswap; mset @r; mpop` -> `opt_mssp @r`.
fn fuse_mssp(items: &[Item]) -> Option<Fusion> {
    if items.len() < 3 {
        return None;
    }
    let mswap = instr(&items[0], "mswap")?;
    let mset = instr(&items[1], "mset")?;
    instr(&items[2], "mpop")?;
    let r = reg(mset, 0)?;
    Some(Fusion {
        consumed: 3,
        replacement: vec![make("opt_mssp", vec![Operand::Reg(r)], mswap.line)],
    })
}

/// `madd .x; mpush; mload .x; pop @0; mset @0; mpop` -> `opt_loadparam .x`.
fn fuse_loadparam(items: &[Item]) -> Option<Fusion> {
    if items.len() < 6 {
        return None;
    }
    let madd = instr(&items[0], "madd")?;
    instr(&items[1], "mpush")?;
    let mload = instr(&items[2], "mload")?;
    let pop = instr(&items[3], "pop")?;
    let mset = instr(&items[4], "mset")?;
    instr(&items[5], "mpop")?;
    let name = match madd.operands.first()? {
        Operand::Name(n) => n.clone(),
        _ => return None,
    };
    if mload.operands.first()? != madd.operands.first()? {
        return None;
    }
    if reg(pop, 0)? != 0 || reg(mset, 0)? != 0 {
        return None;
    }
    Some(Fusion {
        consumed: 6,
        replacement: vec![make("opt_loadparam", vec![Operand::Name(name)], madd.line)],
    })
}

/// `mpush; mload .x; mget @0; mpop` -> `opt_loadsinglevar .x`.
fn fuse_loadsinglevar(items: &[Item]) -> Option<Fusion> {
    if items.len() < 4 {
        return None;
    }
    let mpush = instr(&items[0], "mpush")?;
    let mload = instr(&items[1], "mload")?;
    let mget = instr(&items[2], "mget")?;
    instr(&items[3], "mpop")?;
    let name = match mload.operands.first()? {
        Operand::Name(n) => n.clone(),
        _ => return None,
    };
    if reg(mget, 0)? != 0 {
        return None;
    }
    Some(Fusion {
        consumed: 4,
        replacement: vec![make(
            "opt_loadsinglevar",
            vec![Operand::Name(name)],
            mpush.line,
        )],
    })
}

/// `mpush; loadpm; mload .x; mget @0; mpop` -> `opt_loadsinglevarg .x`.
fn fuse_loadsinglevarg(items: &[Item]) -> Option<Fusion> {
    if items.len() < 5 {
        return None;
    }
    let mpush = instr(&items[0], "mpush")?;
    instr(&items[1], "loadpm")?;
    let mload = instr(&items[2], "mload")?;
    let mget = instr(&items[3], "mget")?;
    instr(&items[4], "mpop")?;
    let name = match mload.operands.first()? {
        Operand::Name(n) => n.clone(),
        _ => return None,
    };
    if reg(mget, 0)? != 0 {
        return None;
    }
    Some(Fusion {
        consumed: 5,
        replacement: vec![make(
            "opt_loadsinglevarg",
            vec![Operand::Name(name)],
            mpush.line,
        )],
    })
}

/// The function-entry parameter-count check:
///
/// ```text
/// pop @0; move @1 N; ecmp @0 @1; jmpt L:; move @0 "msg"; rte @0; L:
/// ```
///
/// becomes `opt_pval N "msg"`. The label stays defined (now pointing just
/// past the fused instruction); generated code never references it again.
fn fuse_pval(items: &[Item]) -> Option<Fusion> {
    if items.len() < 7 {
        return None;
    }
    let pop = instr(&items[0], "pop")?;
    let move_count = instr(&items[1], "move")?;
    let ecmp = instr(&items[2], "ecmp")?;
    let jmpt = instr(&items[3], "jmpt")?;
    let move_msg = instr(&items[4], "move")?;
    let rte = instr(&items[5], "rte")?;
    let label = match &items[6] {
        Item::Label { name, line } => (name.clone(), *line),
        _ => return None,
    };

    if reg(pop, 0)? != 0 || reg(rte, 0)? != 0 {
        return None;
    }
    if reg(move_count, 0)? != 1 || reg(ecmp, 0)? != 0 || reg(ecmp, 1)? != 1 {
        return None;
    }
    let count = match move_count.operands.get(1)? {
        Operand::Int(n) => *n,
        _ => return None,
    };
    let message = match move_msg.operands.get(1)? {
        Operand::Str(s) if reg(move_msg, 0)? == 0 => s.clone(),
        _ => return None,
    };
    match jmpt.operands.first()? {
        Operand::LabelRef(l) if *l == label.0 => {}
        _ => return None,
    }

    Some(Fusion {
        consumed: 7,
        replacement: vec![
            make(
                "opt_pval",
                vec![Operand::Int(count), Operand::Str(message)],
                pop.line,
            ),
            Item::Label {
                name: label.0,
                line: label.1,
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::parse;

    fn mnemonics(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| match item {
                Item::Instr(i) => Some(i.spec.mnemonic.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fuses_assignment_prologue_and_epilogue() {
        let source = "mpush\nmadd .x\nmload .x\nmswap\nmove @0 5\nmswap\nmset @0\nmpop\n";
        let items = fuse(parse(source, "t.n7a").unwrap());
        assert_eq!(
            mnemonics(&items),
            vec!["mpush", "opt_mals", "move", "opt_mssp"]
        );
    }

    #[test]
    fn fuses_parameter_binding() {
        let source = "madd .n\nmpush\nmload .n\npop @0\nmset @0\nmpop\n";
        let items = fuse(parse(source, "t.n7a").unwrap());
        assert_eq!(mnemonics(&items), vec!["opt_loadparam"]);
    }

    #[test]
    fn fuses_single_variable_loads() {
        let local = "mpush\nmload .x\nmget @0\nmpop\n";
        let items = fuse(parse(local, "t.n7a").unwrap());
        assert_eq!(mnemonics(&items), vec!["opt_loadsinglevar"]);

        let global = "mpush\nloadpm\nmload .x\nmget @0\nmpop\n";
        let items = fuse(parse(global, "t.n7a").unwrap());
        assert_eq!(mnemonics(&items), vec!["opt_loadsinglevarg"]);
    }

    #[test]
    fn fuses_parameter_count_check_and_keeps_label() {
        let source = "pop @0\nmove @1 2\necmp @0 @1\njmpt __4_ok:\nmove @0 \"'f'\"\nrte @0\n__4_ok:\n";
        let items = fuse(parse(source, "t.n7a").unwrap());
        assert_eq!(mnemonics(&items), vec!["opt_pval"]);
        assert!(items
            .iter()
            .any(|item| matches!(item, Item::Label { name, .. } if name == "__4_ok")));
        match &items[0] {
            Item::Instr(i) => {
                assert_eq!(i.operands[0], Operand::Int(2));
                assert_eq!(i.operands[1], Operand::Str("'f'".to_string()));
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn does_not_fuse_across_labels() {
        let source = "madd .x\nsome_label:\nmload .x\nmswap\n";
        let items = fuse(parse(source, "t.n7a").unwrap());
        assert_eq!(mnemonics(&items), vec!["madd", "mload", "mswap"]);
    }

    #[test]
    fn mismatched_operands_stay_unfused() {
        let source = "madd .x\nmload .y\nmswap\n";
        let items = fuse(parse(source, "t.n7a").unwrap());
        assert_eq!(mnemonics(&items), vec!["madd", "mload", "mswap"]);
    }
}
