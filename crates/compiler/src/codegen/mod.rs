//! Assembly code generation.
//!
//! A single pass over the token stream (after prescan) that emits textual
//! assembly for the stack VM. The generated code maintains three stack
//! abstractions: the register set `@0..`, the value stack (`push`/`pop`),
//! and the memory stack (`mpush`/`mpop`), where "memory" is the current
//! table context (program memory, a local frame, a table, ...).
//!
//! The pass always writes the long instruction forms; the assembler's
//! peephole fuses them when optimization is on.
//!
//! Module layout:
//! - `statements.rs`: statement dispatch, assignment/call lines, `free`,
//!   `visible`/`constant` declarations
//! - `control_flow.rs`: if/select/while/do/for/foreach, break, return
//! - `expr.rs`: the expression precedence chain and factors
//! - `tables.rs`: table literals, `dim` and `fill`
//! - `functions.rs`: function definitions and static calls
//! - `include.rs`: include handling and `asm` blocks

mod control_flow;
mod expr;
mod functions;
mod include;
mod statements;
mod tables;

use crate::error::{CompileError, CompileResult};
use crate::keywords::{Keyword, KeywordTable};
use crate::lexer::{Directives, Lexer, Token};
use crate::prescan::{FuncId, FunctionCatalog, IncludeSet};
use crate::scope::{BlockInfo, BlockType, Scopes};
use std::collections::HashSet;

/// Append one line of assembly to the output buffer.
macro_rules! emit {
    ($cg:expr, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        let _ = writeln!($cg.out, $($arg)*);
    }};
}
pub(crate) use emit;

/// What kind of value an expression factor produced. Used to catch some
/// obvious indirection errors at compile time (indexing a number, calling
/// a table, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactorType {
    Unknown,
    Name,
    Table,
    Array,
    Value,
    Function,
}

/// Result of compiling a factor; static functions carry their definition
/// so call sites can be arity-checked.
#[derive(Debug, Clone, Copy)]
pub struct FactorInfo {
    pub ty: FactorType,
    pub func: Option<FuncId>,
}

impl FactorInfo {
    pub fn of(ty: FactorType) -> Self {
        FactorInfo { ty, func: None }
    }
}

/// Saved state of the including file while an included file compiles.
struct SourceEnv {
    lexer: Lexer,
    filename: String,
    lib_name: Option<String>,
    visibles: HashSet<String>,
}

/// All code generation state, threaded explicitly through the pass.
pub struct CodeGen<'k> {
    keywords: &'k KeywordTable,
    funcs: FunctionCatalog,
    current: FuncId,
    function_index: i32,
    label_index: i32,
    local_scope: i32,
    out: String,
    lexer: Lexer,
    token: Token,
    env: Vec<SourceEnv>,
    scopes: Scopes,
    blocks: Vec<BlockInfo>,
    breaks: Vec<i32>,
    filename: String,
    lib_name: Option<String>,
    includes: IncludeSet,
    directives: Directives,
    lib_path: String,
    user_lib_path: String,
}

impl<'k> CodeGen<'k> {
    pub fn new(
        keywords: &'k KeywordTable,
        funcs: FunctionCatalog,
        source: &str,
        filename: &str,
        lib_path: &str,
        user_lib_path: &str,
    ) -> Self {
        let root = funcs.root();
        CodeGen {
            keywords,
            funcs,
            current: root,
            function_index: 0,
            label_index: 0,
            local_scope: 0,
            out: String::new(),
            lexer: Lexer::from_source(source),
            token: Token::Eof,
            env: Vec::new(),
            scopes: Scopes::new(),
            blocks: Vec::new(),
            breaks: Vec::new(),
            filename: filename.to_string(),
            lib_name: None,
            includes: IncludeSet::new(filename),
            directives: Directives::default(),
            lib_path: lib_path.to_string(),
            user_lib_path: user_lib_path.to_string(),
        }
    }

    /// Compile the whole program to assembly text.
    pub fn generate(mut self) -> CompileResult<(String, Directives)> {
        // The runtime fills "args" with the command line arguments.
        self.scopes.add_visible("args");

        emit!(self, "/file:{}", self.filename);
        emit!(self, "/line:1");
        self.advance()?;
        self.block()?;
        if self.token != Token::Eof {
            return Err(self.error_unexpected());
        }

        self.directives.merge(self.lexer.directives());
        Ok((self.out, self.directives))
    }

    // ----- token plumbing -------------------------------------------------

    pub(crate) fn advance(&mut self) -> CompileResult<()> {
        let token = self
            .lexer
            .next(self.keywords)
            .map_err(|message| CompileError::at(&self.filename, self.lexer.line(), message))?;
        if self.lexer.take_line_bump() {
            emit!(self, "/line:{}", self.lexer.line());
        }
        self.token = token;
        Ok(())
    }

    pub(crate) fn eat_newlines(&mut self) -> CompileResult<()> {
        while self.token.is_eol() {
            self.advance()?;
        }
        Ok(())
    }

    /// Consume `c` or fail. Newlines are allowed after `,` and `(`.
    pub(crate) fn expect_char(&mut self, c: char) -> CompileResult<()> {
        if self.token.is_char(c) {
            self.advance()?;
            if c == ',' || c == '(' {
                self.eat_newlines()?;
            }
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}'", c)))
        }
    }

    /// Consume `c` when present.
    pub(crate) fn could_get_char(&mut self, c: char) -> CompileResult<bool> {
        if self.token.is_char(c) {
            self.advance()?;
            if c == ',' || c == '(' {
                self.eat_newlines()?;
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Expect end of line (or end of file) after a statement.
    pub(crate) fn expect_newline(&mut self) -> CompileResult<()> {
        if self.token.is_eol() {
            self.eat_newlines()
        } else if self.token == Token::Eof {
            Ok(())
        } else {
            Err(self.error_unexpected())
        }
    }

    // ----- diagnostics ----------------------------------------------------

    pub(crate) fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::at(&self.filename, self.lexer.line(), message)
    }

    pub(crate) fn syntax_error(&self) -> CompileError {
        self.error("Syntax error")
    }

    pub(crate) fn error_unexpected(&self) -> CompileError {
        self.error(unexpected_message(&self.token))
    }

    // ----- scope and block bookkeeping ------------------------------------

    pub(crate) fn find_function(&self, name: &str) -> Option<FuncId> {
        self.funcs.lookup(self.current, name)
    }

    pub(crate) fn inc_block_level(&mut self, block_type: BlockType) {
        self.blocks.push(BlockInfo {
            block_type,
            local_scope: self.local_scope,
        });
    }

    pub(crate) fn dec_block_level(&mut self) {
        self.blocks.pop();
    }

    pub(crate) fn push_break(&mut self, label_index: i32) {
        self.breaks.push(label_index);
    }

    pub(crate) fn pop_break(&mut self) {
        self.breaks.pop();
    }

    pub(crate) fn add_break_label(&mut self, label_index: i32) {
        emit!(self, "break_{}:", label_index);
    }

    pub(crate) fn next_label(&mut self) -> i32 {
        let index = self.label_index;
        self.label_index += 1;
        index
    }

    /// Whether the current token ends a block.
    pub(crate) fn end_of_block(&self) -> bool {
        match &self.token {
            Token::Eof => true,
            Token::Keyword { kind, .. } => matches!(
                kind,
                Keyword::Else
                    | Keyword::ElseIf
                    | Keyword::EndIf
                    | Keyword::Case
                    | Keyword::Default
                    | Keyword::EndSelect
                    | Keyword::Wend
                    | Keyword::Loop
                    | Keyword::Until
                    | Keyword::Next
                    | Keyword::EndFunc
            ),
            _ => false,
        }
    }
}

/// Render the "Unexpected ..." message for a token.
pub(crate) fn unexpected_message(token: &Token) -> String {
    match token {
        Token::Eof => "Unexpected end of file".to_string(),
        Token::Eol { .. } => "Unexpected end of line".to_string(),
        Token::Char(c) => format!("Unexpected character '{}'", c),
        Token::Str(s) => format!("Unexpected string '{}'", s),
        Token::Number { text, .. } => format!("Unexpected number '{}'", text),
        Token::Name(name) => format!("Unexpected identifier '{}'", name),
        Token::Keyword { text, .. } => format!("Unexpected '{}'", text),
    }
}

#[cfg(test)]
mod tests {
    use crate::compile_source;

    fn assembly(source: &str) -> String {
        compile_source(source, "test.n7", "", "")
            .expect("compiles")
            .assembly
    }

    fn error(source: &str) -> String {
        compile_source(source, "test.n7", "", "")
            .unwrap_err()
            .to_string()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn if_block_jumps_over_false_branches() {
        let asm = assembly("x = 1\nif x = 1\n  pln 1\nelse\n  pln 2\nendif\n");
        assert!(asm.contains("jmpef @0 if_1:"));
        assert!(asm.contains("jmp endif_0:"));
        assert!(asm.contains("if_1:"));
        assert!(asm.contains("endif_0:"));
    }

    #[test]
    fn single_statement_if_needs_no_endif() {
        assert!(compile_source("x = 1\nif x then pln x\n", "test.n7", "", "").is_ok());
    }

    #[test]
    fn while_loop_is_head_controlled() {
        let asm = assembly("n = 0\nwhile n < 3\n  n = n + 1\nwend\n");
        assert!(asm.contains("while_0:"));
        assert!(asm.contains("jmpef @0 while_0_wend:"));
        assert!(asm.contains("jmp while_0:"));
        assert!(asm.contains("while_0_wend:"));
        assert!(asm.contains("break_0:"));
    }

    #[test]
    fn do_until_tests_at_the_tail() {
        let asm = assembly("n = 0\ndo\n  n = n + 1\nuntil n = 3\n");
        assert!(asm.contains("do_0:"));
        assert!(asm.contains("jmpef @0 do_0:"));
    }

    #[test]
    fn for_loop_derives_the_step_sign() {
        let asm = assembly("for i = 3 to 1\n  pln i\nnext\n");
        // Step negation when destination < start.
        assert!(asm.contains("leql @1 @2"));
        assert!(asm.contains("jmpet @1 for_0_step_not_neg:"));
        assert!(asm.contains("neg @0"));
        // Per-sign comparison at the loop tail.
        assert!(asm.contains("for_0_neg_step:"));
        assert!(asm.contains("geql @0 @2"));
        assert!(asm.contains("leql @0 @2"));
        // Bounds are popped after the loop.
        assert!(asm.contains("break_0:\npop @0\npop @0\nmswap\nmpop\n"));
    }

    #[test]
    fn explicit_step_uses_its_absolute_value() {
        let asm = assembly("for i = 1 to 10 step -2\n  pln i\nnext\n");
        assert!(asm.contains("abs @0"));
    }

    #[test]
    fn foreach_drives_the_iterator_protocol() {
        let asm = assembly("t = [1, 2, 3]\nforeach v in t\n  pln v\nnext\n");
        for instruction in ["iload", "ihas", "ival @0", "ipush", "ipop", "istep", "idel"] {
            assert!(asm.contains(instruction), "missing {}", instruction);
        }
        // Non-tables get wrapped in a single-entry table.
        assert!(asm.contains("madd .tbl_wrapper"));
    }

    #[test]
    fn foreach_with_key_loads_both_variables() {
        let asm = assembly("t = [x: 1]\nforeach k, v in t\n  pln k\nnext\n");
        assert!(asm.contains("ikey @0"));
        assert!(asm.contains("mload .k"));
        assert!(asm.contains("mload .v"));
    }

    #[test]
    fn foreach_key_and_value_must_differ() {
        let err = error("t = [1]\nforeach a, a in t\nnext\n");
        assert!(err.contains("Key and value can't share identifier"));
    }

    #[test]
    fn select_keeps_the_subject_on_the_stack() {
        let asm = assembly("x = 2\nselect x\ncase 1, 2\n  pln 1\ndefault\n  pln 2\nendsel\n");
        // One comparison per case value, loose equality.
        assert_eq!(count(&asm, "ecmp @1 @0"), 2);
        assert!(asm.contains("jmpt sel_0_case_0:"));
        assert!(asm.contains("sel_0_end:\npop @0\n"));
    }

    #[test]
    fn logical_or_short_circuits() {
        let asm = assembly("a = 0\nb = 1\nif a = 0 or b / a > 2 then pln \"ok\"\n");
        assert!(asm.contains("jmpet @0 or_2_sc:"));
        assert!(asm.contains("or_2_sc:"));
        assert!(asm.contains("por"));
        // The division happens after the jump, on the skipped path.
        let jump = asm.find("jmpet @0 or_2_sc:").unwrap();
        let div = asm.find("spdiv").unwrap();
        assert!(div > jump);
    }

    #[test]
    fn logical_and_short_circuits_to_one_shared_label() {
        let asm = assembly("a = 1\nb = 2\nc = 3\nx = a and b and c\n");
        assert_eq!(count(&asm, "jmpef @0 and_0_sc:"), 2);
        assert_eq!(count(&asm, "\nand_0_sc:\n"), 1);
    }

    #[test]
    fn return_unwinds_open_loops() {
        let source = "function f(t)\n  foreach v in t\n    for i = 1 to 3\n      return i\n    next\n  next\n  return 0\nendfunc\nx = f([1])\n";
        let asm = assembly(source);
        // The inner return pops the for bounds, then the iterator frame.
        assert!(asm.contains("pop @1\npop @1\nmswap\nmpop\nipop\nidel\nmpop\nret\n"));
    }

    #[test]
    fn return_pops_select_subject() {
        let source = "function f(x)\n  select x\n  case 1\n    return 10\n  endsel\n  return 0\nendfunc\ny = f(1)\n";
        let asm = assembly(source);
        assert!(asm.contains("pop @1\nmpop\nret\n"));
    }

    #[test]
    fn break_outside_a_loop_fails() {
        assert!(error("break\n").contains("Unexpected 'break'"));
    }

    #[test]
    fn return_outside_a_function_fails() {
        assert!(error("return 1\n").contains("Unexpected 'return'"));
    }

    #[test]
    fn break_jumps_to_the_innermost_loop() {
        let asm = assembly("while 1\n  for i = 1 to 3\n    break\n  next\nwend\n");
        // for's label is allocated after while's.
        assert!(asm.contains("jmp break_1:"));
    }

    #[test]
    fn keyed_table_literal() {
        let asm = assembly("p = [x: 1, y: 2]\n");
        assert!(asm.contains("ctbl @0"));
        assert!(asm.contains("madd .x"));
        assert!(asm.contains("madd .y"));
    }

    #[test]
    fn auto_indexed_table_literal_counts_from_zero() {
        let asm = assembly("t = [5, 6]\n");
        assert!(asm.contains("madd 0"));
        assert!(asm.contains("madd 1"));
    }

    #[test]
    fn empty_table_literal_compiles() {
        let asm = assembly("t = []\n");
        assert!(asm.contains("ctbl @0"));
    }

    #[test]
    fn function_definition_is_jumped_over() {
        let asm = assembly("function f()\nendfunc\n");
        assert!(asm.contains("jmp __0_end:"));
        assert!(asm.contains("__0:"));
        assert!(asm.contains("__0_end:"));
        // Default return value.
        assert!(asm.contains("mpop\nclr @0\nret\n"));
    }

    #[test]
    fn parameters_bind_in_reverse_order() {
        let asm = assembly("function f(a, b)\n  return a\nendfunc\nx = f(1, 2)\n");
        let b = asm.find("madd .b").unwrap();
        let a = asm.find("madd .a").unwrap();
        assert!(b < a);
    }

    #[test]
    fn function_entry_validates_the_argument_count() {
        let asm = assembly("function f(a)\n  return a\nendfunc\nx = f(1)\n");
        assert!(asm.contains("ecmp @0 @1"));
        assert!(asm.contains("jmpt __0_ok:"));
        assert!(asm.contains("move @0 \"'f' expected 1 argument\""));
        assert!(asm.contains("rte @0"));
    }

    #[test]
    fn anonymous_function_yields_a_label_value() {
        let asm = assembly("f = function(x)\n  return x\nendfunc\n");
        assert!(asm.contains("jmp __0_end:"));
        assert!(asm.contains("move @0 __0:"));
    }

    #[test]
    fn nested_function_names_are_lexical() {
        let err = error("function outer()\n  x = inner()\nendfunc\nfunction other()\n  function inner()\n  endfunc\nendfunc\n");
        assert!(err.contains("Undeclared identifier 'inner'"));
    }

    #[test]
    fn this_outside_a_function_fails() {
        assert!(error("this.x = 1\n").contains("Unexpected 'this'"));
        assert!(error("x = this\n").contains("Unexpected 'this'"));
    }

    #[test]
    fn dot_is_shorthand_for_this() {
        let asm = assembly("function f()\n  .x = 1\nendfunc\n");
        assert!(asm.contains("mload .this"));
        assert!(asm.contains("madd .x"));
    }

    #[test]
    fn visible_declarations_cannot_be_local_or_conditional() {
        assert!(error("function f()\n  visible v\nendfunc\n")
            .contains("Visible declarations can't be local"));
        assert!(error("if 1\n  visible v\nendif\n")
            .contains("Visible declarations can't be conditional"));
    }

    #[test]
    fn constant_initializer_must_be_constant() {
        assert!(error("x = 1\nconstant C = x\n").contains("Invalid constant expression"));
        assert!(compile_source("constant C = -(1 + 2) * |3 - 4|\n", "t.n7", "", "").is_ok());
    }

    #[test]
    fn redeclaration_messages_name_the_kind() {
        assert!(error("constant C = 1\nvisible C\n")
            .contains("'C' has already been declared as constant"));
        assert!(error("visible v\nvisible v\n")
            .contains("'v' has already been declared as visible"));
    }

    #[test]
    fn include_inside_a_block_fails() {
        // The file must exist: the prescan opens includes before code
        // generation gets to reject the placement.
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.n7"), "visible v\n").unwrap();
        let prefix = format!("{}/", dir.path().display());
        let err = compile_source("if 1\n  include \"x.n7\"\nendif\n", "t.n7", "", &prefix)
            .unwrap_err();
        assert!(err.to_string().contains("Include can't be conditional"));
    }

    #[test]
    fn conditional_static_function_fails() {
        assert!(error("if 1\n  function f()\n  endfunc\nendif\n")
            .contains("Static function definitions can't be conditional"));
    }

    #[test]
    fn asm_block_is_pasted_verbatim() {
        let asm = assembly("asm\nmove @7 42\npush @7\nendasm\n");
        assert!(asm.contains("move @7 42\npush @7\n"));
    }

    #[test]
    fn free_deletes_a_variable() {
        let asm = assembly("x = 1\nfree x\n");
        assert!(asm.contains("mdel .x"));
    }

    #[test]
    fn free_of_a_constant_fails() {
        assert!(error("constant C = 1\nfree C\n").contains("'C' is a constant"));
    }

    #[test]
    fn assert_pushes_value_and_message() {
        let asm = assembly("assert 1 = 1\n");
        assert!(asm.contains("move @0 \"Assertion failed\""));
        assert!(asm.contains("spop @0 @1\nassert @0 @1\n"));
    }

    #[test]
    fn dim_generates_inline_loops() {
        let asm = assembly("t = dim(2, 3)\n");
        assert_eq!(count(&asm, "dim_"), 8);
        assert!(asm.contains("dim_0_start:"));
        assert!(asm.contains("dim_1_end:"));
    }

    #[test]
    fn fill_copies_the_filler() {
        let asm = assembly("t = fill([x: 0], 2)\n");
        assert!(asm.contains("cpy @3 @4"));
    }

    #[test]
    fn instruction_builtins_lower_to_instructions() {
        let asm = assembly("x = cos(0) + pow(2, 3) + int(1.5)\n");
        assert!(asm.contains("cos @0"));
        assert!(asm.contains("pow @0 @1"));
        assert!(asm.contains("int @0 @0"));
    }

    #[test]
    fn absolute_value_bars() {
        let asm = assembly("x = |0 - 5|\n");
        assert!(asm.contains("abs @0"));
    }

    #[test]
    fn builtin_constants_compile_to_literals() {
        let asm = assembly("x = true\ny = PI\nz = unset\n");
        assert!(asm.contains("move @0 1"));
        assert!(asm.contains("move @0 3.141592653589"));
        assert!(asm.contains("clr @0"));
    }

    #[test]
    fn builtin_arity_is_checked() {
        assert!(error("x = left(\"abc\")\n").contains("Expected ','"));
        // Too many arguments leave a dangling comma behind.
        assert!(error("wait 1, 2\n").contains("Unexpected"));
    }

    #[test]
    fn nested_command_spellings() {
        let asm = assembly("set window \"t\", 640, 480\ndraw line 0, 0, 10, 10\n");
        assert!(asm.contains(&format!(
            "sys {} 3",
            n7_core::SysCall::SetWindow.selector()
        )));
        assert!(asm.contains(&format!("sys {} 4", n7_core::SysCall::DrawLine.selector())));
    }

    #[test]
    fn library_namespace_is_mangled() {
        assert_eq!(super::include::lib_name_for("my-lib.n7"), "_my_lib_n7");
    }

    #[test]
    fn indirection_chain_assignment_protocol() {
        let asm = assembly("a = [b: [c: 1]]\na.b.c = 2\n");
        // Chain loads the root, then the field, then adds the leaf.
        assert!(asm.contains("mload .a"));
        assert!(asm.contains("mload .b"));
        assert!(asm.contains("madd .c\nmload .c\nmswap\n"));
        assert!(asm.contains("mswap\nmset @0\nmpop\n"));
    }

    #[test]
    fn dangling_expression_fails() {
        assert!(error("x = 1\nx + 1\n").contains("Syntax error"));
    }

    #[test]
    fn xor_is_reserved_but_rejected() {
        assert!(error("a = 1\nb = 2\nx = a xor b\n").contains("Unexpected 'xor'"));
    }
}
