//! Scope and visibility tracking.
//!
//! Four cooperating tables:
//! - constants: read-only globals shared across the whole compilation unit
//! - visibles: mutable globals, file-scoped (swapped on include enter/leave)
//! - identifiers: a stack of per-scope sets of names that have been
//!   assigned, pushed on function bodies and includes
//! - the function map, which lives in the prescan catalog
//!
//! The block stack records every open block so `return` can unwind the
//! stack-resident bookkeeping of `select`/`for`/`foreach` blocks at the
//! current local scope.

use std::collections::HashSet;

/// Kind of a global declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalKind {
    Constant,
    Visible,
}

impl GlobalKind {
    pub fn read_only(self) -> bool {
        self == GlobalKind::Constant
    }
}

#[derive(Debug)]
pub struct Scopes {
    constants: HashSet<String>,
    visibles: HashSet<String>,
    identifiers: Vec<HashSet<String>>,
}

impl Scopes {
    pub fn new() -> Self {
        Scopes {
            constants: HashSet::new(),
            visibles: HashSet::new(),
            identifiers: vec![HashSet::new()],
        }
    }

    /// Constants win over visibles, like the lookup order everywhere else.
    pub fn global(&self, name: &str) -> Option<GlobalKind> {
        if self.constants.contains(name) {
            Some(GlobalKind::Constant)
        } else if self.visibles.contains(name) {
            Some(GlobalKind::Visible)
        } else {
            None
        }
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains(name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.visibles.contains(name)
    }

    pub fn add_constant(&mut self, name: &str) {
        self.constants.insert(name.to_string());
    }

    pub fn add_visible(&mut self, name: &str) {
        self.visibles.insert(name.to_string());
    }

    /// A name counts as declared once it has been assigned in the current
    /// scope or declared visible/constant.
    pub fn declared(&self, name: &str) -> bool {
        self.identifiers
            .last()
            .map(|scope| scope.contains(name))
            .unwrap_or(false)
            || self.visibles.contains(name)
            || self.constants.contains(name)
    }

    pub fn add_identifier(&mut self, name: &str) {
        if let Some(scope) = self.identifiers.last_mut() {
            scope.insert(name.to_string());
        }
    }

    /// Enter a function body or an include: fresh identifier scope.
    pub fn push_identifiers(&mut self) {
        self.identifiers.push(HashSet::new());
    }

    pub fn pop_identifiers(&mut self) {
        self.identifiers.pop();
    }

    /// Swap in a fresh visible table for an included file, returning the
    /// outer one so it can be restored on exit.
    pub fn swap_visibles(&mut self, visibles: HashSet<String>) -> HashSet<String> {
        std::mem::replace(&mut self.visibles, visibles)
    }
}

/// Kind of the currently open block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Generic,
    If,
    Select,
    Do,
    While,
    For,
    Foreach,
}

/// One entry of the open-block stack.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub block_type: BlockType,
    pub local_scope: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_declares_in_current_scope_only() {
        let mut scopes = Scopes::new();
        scopes.add_identifier("x");
        assert!(scopes.declared("x"));
        scopes.push_identifiers();
        assert!(!scopes.declared("x"));
        scopes.pop_identifiers();
        assert!(scopes.declared("x"));
    }

    #[test]
    fn globals_are_visible_from_inner_scopes() {
        let mut scopes = Scopes::new();
        scopes.add_visible("score");
        scopes.add_constant("MAX");
        scopes.push_identifiers();
        assert!(scopes.declared("score"));
        assert!(scopes.declared("MAX"));
        assert_eq!(scopes.global("MAX"), Some(GlobalKind::Constant));
        assert!(scopes.global("MAX").unwrap().read_only());
        assert_eq!(scopes.global("score"), Some(GlobalKind::Visible));
    }

    #[test]
    fn include_swaps_visible_table() {
        let mut scopes = Scopes::new();
        scopes.add_visible("outer");
        let saved = scopes.swap_visibles(Default::default());
        assert!(!scopes.is_visible("outer"));
        scopes.add_visible("inner");
        scopes.swap_visibles(saved);
        assert!(scopes.is_visible("outer"));
        assert!(!scopes.is_visible("inner"));
    }
}
