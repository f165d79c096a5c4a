//! Control flow statements.
//!
//! Every loop construct keeps its bookkeeping (loop bounds, iterator
//! frames, the `select` subject) on the VM stacks, so the open-block stack
//! records what `return` has to unwind.

use super::{emit, CodeGen};
use crate::error::CompileResult;
use crate::keywords::Keyword;
use crate::lexer::Token;
use crate::scope::BlockType;
use n7_core::VAR_TBL;

impl CodeGen<'_> {
    /// `if <expr> [then]` with single-statement or block form, `elseif`,
    /// `else`. Once any branch uses the single-statement form, `endif` is
    /// not expected.
    pub(super) fn if_statement(&mut self) -> CompileResult<()> {
        let endif_index = self.next_label();
        let mut last_was_block;

        self.advance()?;
        self.inc_block_level(BlockType::If);

        loop {
            // if or elseif.
            let next_index = self.next_label();
            self.expression()?;
            emit!(self, "jmpef @0 if_{}:", next_index);
            // then is allowed but not required.
            if self.token.is_keyword(Keyword::Then) {
                self.advance()?;
            }
            if self.token.is_eol() {
                self.block()?;
                last_was_block = true;
            } else {
                if !self.statement()? {
                    return Err(self.syntax_error());
                }
                last_was_block = false;
            }
            emit!(self, "jmp endif_{}:", endif_index);
            emit!(self, "if_{}:", next_index);

            if self.token.is_keyword(Keyword::ElseIf) {
                self.advance()?;
                continue;
            }
            if self.token.is_keyword(Keyword::Else) {
                self.advance()?;
                if self.token.is_eol() {
                    self.block()?;
                    last_was_block = true;
                } else {
                    if !self.statement()? {
                        return Err(self.syntax_error());
                    }
                    last_was_block = false;
                }
            }
            // Expect endif only after a block form.
            if last_was_block {
                if self.token.is_keyword(Keyword::EndIf) {
                    self.advance()?;
                    self.expect_newline()?;
                    break;
                } else {
                    return Err(self.error("Expected 'endif'"));
                }
            }
            break;
        }
        emit!(self, "endif_{}:", endif_index);

        self.dec_block_level();
        Ok(())
    }

    /// `select [case] <expr>` ... `endsel`. The subject stays on the value
    /// stack for the whole construct; cases compare with `ecmp`.
    pub(super) fn select_statement(&mut self) -> CompileResult<()> {
        let select_index = self.next_label();
        let mut case_index = 0;

        self.advance()?;
        self.inc_block_level(BlockType::Select);

        if self.token.is_keyword(Keyword::Case) {
            self.advance()?;
        }
        self.expression()?;
        emit!(self, "push @0");
        self.expect_newline()?;

        while !self.token.is_keyword(Keyword::EndSelect) {
            if self.token.is_keyword(Keyword::Case) {
                self.advance()?;
                loop {
                    self.expression()?;
                    emit!(self, "pop @1");
                    emit!(self, "ecmp @1 @0");
                    emit!(self, "push @1");
                    emit!(self, "jmpt sel_{}_case_{}:", select_index, case_index);
                    if !self.could_get_char(',')? {
                        break;
                    }
                }
                emit!(self, "jmp sel_{}_case_end_{}:", select_index, case_index);
                emit!(self, "sel_{}_case_{}:", select_index, case_index);

                if self.token.is_eol() {
                    self.block()?;
                } else if !self.statement()? {
                    return Err(self.syntax_error());
                }

                emit!(self, "jmp sel_{}_end:", select_index);
                emit!(self, "sel_{}_case_end_{}:", select_index, case_index);
                case_index += 1;
            } else if self.token.is_keyword(Keyword::Default) {
                self.advance()?;
                if self.token.is_eol() {
                    self.block()?;
                } else if !self.statement()? {
                    return Err(self.syntax_error());
                }
                if !self.token.is_keyword(Keyword::EndSelect) {
                    return Err(self.error("Expected 'endsel'"));
                }
            } else {
                return Err(self.error_unexpected());
            }
        }
        self.advance()?;
        self.expect_newline()?;
        emit!(self, "sel_{}_end:", select_index);
        emit!(self, "pop @0");

        self.dec_block_level();
        Ok(())
    }

    /// `while <expr> [then]`, single statement or block ending with `wend`.
    pub(super) fn while_statement(&mut self) -> CompileResult<()> {
        let while_index = self.next_label();

        self.advance()?;
        self.inc_block_level(BlockType::While);

        emit!(self, "while_{}:", while_index);
        self.expression()?;
        emit!(self, "jmpef @0 while_{}_wend:", while_index);
        // then makes single statements easier to read.
        if self.token.is_keyword(Keyword::Then) {
            self.advance()?;
        }
        self.push_break(while_index);
        if self.token.is_eol() {
            self.block()?;
            if self.token.is_keyword(Keyword::Wend) {
                self.advance()?;
                self.expect_newline()?;
                emit!(self, "jmp while_{}:", while_index);
            } else {
                return Err(self.error("Expected 'wend'"));
            }
        } else {
            if !self.statement()? {
                return Err(self.syntax_error());
            }
            emit!(self, "jmp while_{}:", while_index);
        }
        self.pop_break();
        emit!(self, "while_{}_wend:", while_index);
        self.add_break_label(while_index);

        self.dec_block_level();
        Ok(())
    }

    /// `do` block ending with `loop` (forever) or `until <expr>`.
    pub(super) fn do_statement(&mut self) -> CompileResult<()> {
        let do_index = self.next_label();

        self.advance()?;
        self.inc_block_level(BlockType::Do);

        self.expect_newline()?;
        emit!(self, "do_{}:", do_index);
        self.push_break(do_index);
        self.block()?;
        self.pop_break();
        if self.token.is_keyword(Keyword::Loop) {
            self.advance()?;
            self.expect_newline()?;
            emit!(self, "jmp do_{}:", do_index);
        } else if self.token.is_keyword(Keyword::Until) {
            self.advance()?;
            self.expression()?;
            self.expect_newline()?;
            emit!(self, "jmpef @0 do_{}:", do_index);
        }
        self.add_break_label(do_index);

        self.dec_block_level();
        Ok(())
    }

    /// `for <id> = <expr> to <expr> [step <expr>]`. The sign of the step is
    /// always derived from start and destination, so `for i = 6 to 2` steps
    /// by -1 and `step -2` towards a larger destination steps by +2.
    pub(super) fn for_statement(&mut self) -> CompileResult<()> {
        let for_index = self.next_label();

        self.advance()?;
        self.inc_block_level(BlockType::For);

        // Only a simple identifier can be the loop variable.
        let name = match &self.token {
            Token::Name(name) => name.clone(),
            _ => return Err(self.error("Expected identifier")),
        };

        let global = self.scopes.global(&name);
        if self.find_function(&name).is_some() {
            return Err(self.error(format!("'{}' is a static function", name)));
        }
        if global.map(|g| g.read_only()).unwrap_or(false) {
            return Err(self.error(format!("'{}' is a constant", name)));
        }

        if global.is_none() {
            emit!(self, "madd .{}", name);
        }

        emit!(self, "mpush");
        if global.is_some() && self.local_scope > 0 {
            emit!(self, "loadpm");
            if let Some(lib) = self.lib_name.clone() {
                emit!(self, "mload .{}", lib);
            }
        } else {
            self.scopes.add_identifier(&name);
        }

        emit!(self, "mload .{}", name);
        emit!(self, "mswap");
        self.advance()?;

        self.expect_char('=')?;

        // Start value.
        self.expression()?;
        emit!(self, "mswap");
        emit!(self, "num @0 @0");
        emit!(self, "mset @0");
        emit!(self, "mswap");

        if !self.token.is_keyword(Keyword::To) {
            return Err(self.error("Expected 'to'"));
        }
        self.advance()?;

        // Destination value to stack.
        self.expression()?;
        emit!(self, "num @0 @0");
        emit!(self, "push @0");

        // Absolute step value.
        if self.token.is_keyword(Keyword::Step) {
            self.advance()?;
            self.expression()?;
            emit!(self, "abs @0");
        } else {
            emit!(self, "move @0 1");
        }

        // Negate the step if destination < start.
        emit!(self, "mswap");
        emit!(self, "mget @1");
        emit!(self, "mswap");
        emit!(self, "pop @2");
        emit!(self, "push @2");
        emit!(self, "leql @1 @2");
        emit!(self, "jmpet @1 for_{}_step_not_neg:", for_index);
        emit!(self, "neg @0");
        emit!(self, "for_{}_step_not_neg:", for_index);
        emit!(self, "push @0");

        // Body.
        emit!(self, "for_{}_body:", for_index);
        self.push_break(for_index);
        if self.token.is_eol() {
            self.block()?;
            if !self.token.is_keyword(Keyword::Next) {
                return Err(self.error("Expected 'next'"));
            }
            self.advance()?;
            self.expect_newline()?;
        } else if !self.statement()? {
            return Err(self.syntax_error());
        }
        self.pop_break();

        // Add the step to the loop variable.
        emit!(self, "mswap");
        emit!(self, "mget @0");
        emit!(self, "pop @1"); // step value
        emit!(self, "pop @2"); // destination value
        emit!(self, "push @2");
        emit!(self, "push @1");
        emit!(self, "add @0 @1");
        emit!(self, "mset @0");
        emit!(self, "mswap");

        // Compare depending on the step sign.
        emit!(self, "move @3 0");
        emit!(self, "less @1 @3");
        emit!(self, "jmpet @1 for_{}_neg_step:", for_index);
        emit!(self, "leql @0 @2");
        emit!(self, "jmp for_{}_neg_step_end:", for_index);
        emit!(self, "for_{}_neg_step:", for_index);
        emit!(self, "geql @0 @2");
        emit!(self, "for_{}_neg_step_end:", for_index);

        // Done?
        emit!(self, "jmpet @0 for_{}_body:", for_index);

        self.add_break_label(for_index);

        // Pop step and destination, then the loop variable's memory.
        emit!(self, "pop @0");
        emit!(self, "pop @0");
        emit!(self, "mswap");
        emit!(self, "mpop");

        self.dec_block_level();
        Ok(())
    }

    /// `foreach value[, key] in <expr>`. A non-table subject is wrapped in
    /// a single-entry table first; the `iload`/`ihas`/`ival`/`ikey`/`istep`
    /// family drives the iteration.
    pub(super) fn foreach_statement(&mut self) -> CompileResult<()> {
        let foreach_index = self.next_label();
        let mut with_key = false;

        self.advance()?;
        self.inc_block_level(BlockType::Foreach);

        let mut value_name = match &self.token {
            Token::Name(name) => name.clone(),
            _ => return Err(self.error("Expected identifier")),
        };
        if self.find_function(&value_name).is_some() {
            return Err(self.error(format!("'{}' is a static function", value_name)));
        }
        let mut value_global = self.scopes.global(&value_name);
        if value_global.map(|g| g.read_only()).unwrap_or(false) {
            return Err(self.error(format!("'{}' is a constant", value_name)));
        }

        if value_global.is_none() {
            emit!(self, "madd .{}", value_name);
        }
        self.scopes.add_identifier(&value_name);
        self.advance()?;

        let mut key_name = String::new();
        let mut key_global = None;
        if self.token.is_char(',') {
            self.advance()?;
            self.eat_newlines()?;
            with_key = true;
            key_name = value_name.clone();
            key_global = value_global;

            let name = match &self.token {
                Token::Name(name) => name.clone(),
                _ => return Err(self.error("Expected identifier")),
            };
            if name == key_name {
                return Err(self.error("Key and value can't share identifier"));
            }
            if self.find_function(&name).is_some() {
                return Err(self.error(format!("'{}' is a static function", name)));
            }
            value_global = self.scopes.global(&name);
            if value_global.map(|g| g.read_only()).unwrap_or(false) {
                return Err(self.error(format!("'{}' is a constant", name)));
            }
            value_name = name;

            if value_global.is_none() {
                emit!(self, "madd .{}", value_name);
            }
            self.scopes.add_identifier(&value_name);
            self.advance()?;
        }

        if !self.token.is_keyword(Keyword::In) {
            return Err(self.error("Expected 'in'"));
        }
        self.advance()?;

        self.expression()?;
        // If the expression is no table, wrap it in one; the eval flag set
        // by jmpet doubles as the iterator's wrapper flag.
        emit!(self, "type @1 @0");
        emit!(self, "move @2 {}", VAR_TBL);
        emit!(self, "eql @1 @2");
        emit!(self, "jmpet @1 foreach_{}_table:", foreach_index);
        emit!(self, "ctbl @1");
        emit!(self, "mpush");
        emit!(self, "mload @1");
        emit!(self, "madd .tbl_wrapper");
        emit!(self, "mload .tbl_wrapper");
        emit!(self, "mset @0");
        emit!(self, "mpop");
        emit!(self, "move @0 @1");
        emit!(self, "clr @1");
        emit!(self, "foreach_{}_table:", foreach_index);
        emit!(self, "mpush");
        emit!(self, "mload @0");
        emit!(self, "iload");
        emit!(self, "mpop");

        // Loop start.
        emit!(self, "foreach_{}:", foreach_index);
        emit!(self, "ihas");
        emit!(self, "jmpf foreach_{}_end:", foreach_index);

        // Load the value variable from the iterator.
        emit!(self, "ival @0");
        emit!(self, "mpush");
        if value_global.is_some() && self.local_scope > 0 {
            emit!(self, "loadpm");
            if let Some(lib) = self.lib_name.clone() {
                emit!(self, "mload .{}", lib);
            }
        }
        emit!(self, "mload .{}", value_name);
        emit!(self, "mset @0");
        emit!(self, "mpop");
        // And the key.
        if with_key {
            emit!(self, "ikey @0");
            emit!(self, "mpush");
            if key_global.is_some() && self.local_scope > 0 {
                emit!(self, "loadpm");
                if let Some(lib) = self.lib_name.clone() {
                    emit!(self, "mload .{}", lib);
                }
            }
            emit!(self, "mload .{}", key_name);
            emit!(self, "mset @0");
            emit!(self, "mpop");
        }

        emit!(self, "ipush");
        self.push_break(foreach_index);
        if self.token.is_eol() {
            self.block()?;
            if !self.token.is_keyword(Keyword::Next) {
                return Err(self.error("Expected 'next'"));
            }
            self.advance()?;
            self.expect_newline()?;
        } else if !self.statement()? {
            return Err(self.syntax_error());
        }
        self.pop_break();
        emit!(self, "ipop");
        emit!(self, "istep");
        emit!(self, "jmp foreach_{}:", foreach_index);

        self.add_break_label(foreach_index);
        emit!(self, "ipop");

        emit!(self, "foreach_{}_end:", foreach_index);
        emit!(self, "idel");

        self.dec_block_level();
        Ok(())
    }

    /// `break` jumps to the innermost loop's break label.
    pub(super) fn break_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        match self.breaks.last() {
            Some(label_index) => {
                emit!(self, "jmp break_{}:", label_index);
                Ok(())
            }
            None => Err(self.error("Unexpected 'break'")),
        }
    }

    /// `return [expr]`. Unwinds the stack bookkeeping of every
    /// `select`/`for`/`foreach` block open at the current local scope
    /// before popping the frame.
    pub(super) fn return_statement(&mut self) -> CompileResult<()> {
        if self.local_scope == 0 {
            return Err(self.error_unexpected());
        }

        self.advance()?;
        if self.token.is_eol() {
            emit!(self, "clr @0");
        } else {
            self.expression()?;
        }

        for i in (0..self.blocks.len()).rev() {
            let info = self.blocks[i];
            if info.local_scope != self.local_scope {
                break;
            }
            match info.block_type {
                BlockType::Select => {
                    emit!(self, "pop @1");
                }
                BlockType::For => {
                    emit!(self, "pop @1");
                    emit!(self, "pop @1");
                    emit!(self, "mswap");
                    emit!(self, "mpop");
                }
                BlockType::Foreach => {
                    emit!(self, "ipop");
                    emit!(self, "idel");
                }
                _ => {}
            }
        }

        // Pop local memory, ret frees it.
        emit!(self, "mpop");
        emit!(self, "ret");
        Ok(())
    }
}
