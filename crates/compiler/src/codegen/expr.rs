//! Expression compilation.
//!
//! Recursive descent over the precedence levels, lowest first: `or` (short
//! circuited), `and` (short circuited), optional `not`, relational,
//! additive, multiplicative, `^`, unary sign, postfix indirection, factor.
//! Binary operators evaluate their left side into register 0, push it, and
//! use the fused swap-with-stack instructions so operands end up in the
//! right order.

use super::{emit, CodeGen, FactorInfo, FactorType};
use crate::builtins::{function_builtin, instr_builtin};
use crate::error::CompileResult;
use crate::keywords::{Constant, Keyword};
use crate::lexer::Token;
use n7_core::SysCall;

impl CodeGen<'_> {
    pub(super) fn expression(&mut self) -> CompileResult<FactorInfo> {
        self.parse_or()
    }

    /// Logical `or`. The right side is skipped when the left is truthy.
    fn parse_or(&mut self) -> CompileResult<FactorInfo> {
        let mut sc_label = -1;
        let mut result = self.parse_and()?;
        while self.token.is_keyword(Keyword::Or) {
            result.ty = FactorType::Value;
            self.advance()?;
            self.eat_newlines()?;

            if sc_label < 0 {
                sc_label = self.next_label();
            }
            emit!(self, "jmpet @0 or_{}_sc:", sc_label);

            emit!(self, "push @0");
            self.parse_and()?;
            emit!(self, "por");
        }
        if sc_label >= 0 {
            emit!(self, "or_{}_sc:", sc_label);
        }
        Ok(result)
    }

    /// Logical `and`. The right side is skipped when the left is falsy.
    fn parse_and(&mut self) -> CompileResult<FactorInfo> {
        let mut sc_label = -1;
        let mut result = self.parse_relational()?;
        while self.token.is_keyword(Keyword::And) {
            result.ty = FactorType::Value;
            self.advance()?;
            self.eat_newlines()?;

            if sc_label < 0 {
                sc_label = self.next_label();
            }
            emit!(self, "jmpef @0 and_{}_sc:", sc_label);

            emit!(self, "push @0");
            self.parse_relational()?;
            emit!(self, "pand");
        }
        if sc_label >= 0 {
            emit!(self, "and_{}_sc:", sc_label);
        }
        Ok(result)
    }

    /// `=`, `>`, `>=`, `<`, `<=`, `<>`, with an optional leading `not`.
    fn parse_relational(&mut self) -> CompileResult<FactorInfo> {
        let mut invert = false;
        if self.token.is_keyword(Keyword::Not) {
            self.advance()?;
            invert = true;
        }

        let mut result = self.parse_additive()?;
        while self.token.is_char('=') || self.token.is_char('>') || self.token.is_char('<') {
            result.ty = FactorType::Value;
            emit!(self, "push @0");
            if self.token.is_char('=') {
                self.advance()?;
                self.eat_newlines()?;
                self.parse_additive()?;
                emit!(self, "speql");
            } else if self.token.is_char('>') {
                self.advance()?;
                if self.token.is_char('=') {
                    self.advance()?;
                    self.eat_newlines()?;
                    self.parse_additive()?;
                    emit!(self, "spgeql");
                } else {
                    self.eat_newlines()?;
                    self.parse_additive()?;
                    emit!(self, "spgre");
                }
            } else {
                self.advance()?;
                if self.token.is_char('=') {
                    self.advance()?;
                    self.eat_newlines()?;
                    self.parse_additive()?;
                    emit!(self, "spleql");
                } else if self.token.is_char('>') {
                    self.advance()?;
                    self.eat_newlines()?;
                    self.parse_additive()?;
                    emit!(self, "spneql");
                } else {
                    self.eat_newlines()?;
                    self.parse_additive()?;
                    emit!(self, "spless");
                }
            }
        }

        if invert {
            emit!(self, "not @0");
            result.ty = FactorType::Value;
        }
        Ok(result)
    }

    fn parse_additive(&mut self) -> CompileResult<FactorInfo> {
        let mut result = self.parse_multiplicative()?;
        while self.token.is_char('+') || self.token.is_char('-') {
            result.ty = FactorType::Value;
            emit!(self, "push @0");
            if self.token.is_char('+') {
                self.advance()?;
                self.eat_newlines()?;
                self.parse_multiplicative()?;
                // Swap with the stack so strings concatenate in order.
                emit!(self, "spadd");
            } else {
                self.advance()?;
                self.eat_newlines()?;
                self.parse_multiplicative()?;
                emit!(self, "spsub");
            }
        }
        Ok(result)
    }

    fn parse_multiplicative(&mut self) -> CompileResult<FactorInfo> {
        let mut result = self.parse_power()?;
        while self.token.is_char('*') || self.token.is_char('/') || self.token.is_char('%') {
            result.ty = FactorType::Value;
            emit!(self, "push @0");
            if self.token.is_char('*') {
                self.advance()?;
                self.eat_newlines()?;
                self.parse_power()?;
                emit!(self, "spmul");
            } else if self.token.is_char('/') {
                self.advance()?;
                self.eat_newlines()?;
                self.parse_power()?;
                emit!(self, "spdiv");
            } else {
                self.advance()?;
                self.eat_newlines()?;
                self.parse_power()?;
                emit!(self, "spmod");
            }
        }
        Ok(result)
    }

    fn parse_power(&mut self) -> CompileResult<FactorInfo> {
        let mut result = self.parse_postfix()?;
        while self.token.is_char('^') {
            result.ty = FactorType::Value;
            emit!(self, "push @0");
            self.advance()?;
            self.eat_newlines()?;
            self.parse_postfix()?;
            emit!(self, "spop @0 @1");
            emit!(self, "pow @0 @1");
        }
        Ok(result)
    }

    /// Postfix indirection: `.id`, `[expr]` and `(args)` chains. Operators
    /// are chained on the memory stack instead of pushing and popping for
    /// every step.
    pub(super) fn parse_postfix(&mut self) -> CompileResult<FactorInfo> {
        let mut fi = self.factor()?;
        let mut last_was_load = fi.ty == FactorType::Name;

        if self.token.is_char('.') || self.token.is_char('[') || self.token.is_char('(') {
            // Catch some obvious errors at compile time.
            if fi.ty == FactorType::Value {
                return Err(self.error_unexpected());
            }
            if fi.ty == FactorType::Table && (self.token.is_char('(') || self.token.is_char('[')) {
                return Err(self.error_unexpected());
            }
            if fi.ty == FactorType::Array && (self.token.is_char('(') || self.token.is_char('.')) {
                return Err(self.error_unexpected());
            }
            if fi.ty == FactorType::Function && !self.token.is_char('(') {
                return Err(self.error_unexpected());
            }

            if !last_was_load {
                emit!(self, "mpush");
            }
            while self.token.is_char('.') || self.token.is_char('[') || self.token.is_char('(') {
                if !last_was_load {
                    emit!(self, "push @0");
                    emit!(self, "mloads");
                }
                if self.token.is_char('.') {
                    self.advance()?;
                    let name = match &self.token {
                        Token::Name(name) => name.clone(),
                        _ => return Err(self.error("Expected identifier")),
                    };
                    emit!(self, "mload .{}", name);
                    if !last_was_load {
                        emit!(self, "pop @1");
                    }
                    self.advance()?;
                    last_was_load = true;
                } else if self.token.is_char('[') {
                    self.advance()?;
                    emit!(self, "mswap");
                    self.expression()?;
                    self.expect_char(']')?;
                    emit!(self, "mswap");
                    emit!(self, "mload @0");
                    if !last_was_load {
                        emit!(self, "pop @1");
                    }
                    last_was_load = true;
                } else {
                    let func = fi.func.take();
                    self.call_function(func)?;
                    if !last_was_load {
                        emit!(self, "pop @1");
                    }
                    last_was_load = false;
                }
            }
            if last_was_load {
                emit!(self, "mget @0");
            }
            emit!(self, "mpop");
            fi.ty = FactorType::Unknown;
        } else if last_was_load {
            emit!(self, "mget @0");
            emit!(self, "mpop");
            fi.ty = FactorType::Unknown;
        }

        Ok(fi)
    }

    fn factor(&mut self) -> CompileResult<FactorInfo> {
        // Unary sign.
        if self.token.is_char('+') {
            self.advance()?;
            self.eat_newlines()?;
            return self.parse_postfix();
        }
        if self.token.is_char('-') {
            self.advance()?;
            self.eat_newlines()?;
            self.parse_postfix()?;
            emit!(self, "neg @0");
            return Ok(FactorInfo::of(FactorType::Value));
        }

        match &self.token {
            Token::Number { text, .. } => {
                let text = text.clone();
                emit!(self, "move @0 {}", text);
                self.advance()?;
                Ok(FactorInfo::of(FactorType::Value))
            }
            Token::Str(s) => {
                let s = s.clone();
                emit!(self, "move @0 \"{}\"", s);
                self.advance()?;
                Ok(FactorInfo::of(FactorType::Value))
            }
            Token::Char('(') => {
                self.advance()?;
                let result = self.expression()?;
                self.expect_char(')')?;
                Ok(result)
            }
            Token::Name(name) => {
                let name = name.clone();
                if let Some(func) = self.find_function(&name) {
                    emit!(self, "move @0 __{}:", self.funcs.get(func).index);
                    self.advance()?;
                    Ok(FactorInfo {
                        ty: FactorType::Function,
                        func: Some(func),
                    })
                } else {
                    emit!(self, "mpush");
                    if !self.scopes.declared(&name) {
                        return Err(self.error(format!("Undeclared identifier '{}'", name)));
                    }
                    if self.scopes.is_constant(&name) {
                        emit!(self, "loadpm");
                    } else if self.local_scope > 0 && self.scopes.is_visible(&name) {
                        emit!(self, "loadpm");
                        if let Some(lib) = self.lib_name.clone() {
                            emit!(self, "mload .{}", lib);
                        }
                    }
                    emit!(self, "mload .{}", name);
                    self.advance()?;
                    Ok(FactorInfo::of(FactorType::Name))
                }
            }
            Token::Char('[') => {
                let ty = self.table_factor()?;
                Ok(FactorInfo::of(ty))
            }
            Token::Keyword {
                kind: Keyword::Function,
                ..
            } => {
                let func = self.function_def()?;
                if !self.funcs.get(func).anonymous {
                    return Err(self.error("Unexpected identifier for non-static function"));
                }
                emit!(self, "move @0 __{}:", self.funcs.get(func).index);
                Ok(FactorInfo {
                    ty: FactorType::Function,
                    func: Some(func),
                })
            }
            Token::Keyword {
                constant: Some(constant),
                ..
            } => {
                match constant.clone() {
                    Constant::Int(value) => emit!(self, "move @0 {}", value),
                    Constant::Float(value) => emit!(self, "move @0 {:.12}", value),
                    Constant::Str(value) => emit!(self, "move @0 \"{}\"", value),
                    Constant::Unset => emit!(self, "clr @0"),
                }
                self.advance()?;
                Ok(FactorInfo::of(FactorType::Value))
            }
            Token::Keyword { kind, .. } => {
                let kind = *kind;
                self.keyword_factor(kind)
            }
            // Short for `this`; the dot stays current and is handled as
            // indirection by the caller.
            Token::Char('.') => {
                if self.local_scope == 0 {
                    return Err(self.error_unexpected());
                }
                emit!(self, "mpush");
                emit!(self, "mload .this");
                Ok(FactorInfo::of(FactorType::Name))
            }
            // |expr|, same as abs(expr).
            Token::Char('|') => {
                self.advance()?;
                self.expression()?;
                self.expect_char('|')?;
                emit!(self, "abs @0");
                Ok(FactorInfo::of(FactorType::Value))
            }
            _ => Err(self.error("Expected expression")),
        }
    }

    /// Factors introduced by a (non-constant) keyword.
    fn keyword_factor(&mut self, kind: Keyword) -> CompileResult<FactorInfo> {
        if let Some((instruction, argc, expected)) = instr_builtin(kind) {
            self.asm_function(instruction, argc, expected)?;
            return Ok(FactorInfo::of(FactorType::Value));
        }

        match kind {
            Keyword::Dim => {
                self.dim()?;
                Ok(FactorInfo::of(FactorType::Table))
            }
            Keyword::Fill => {
                self.fill()?;
                Ok(FactorInfo::of(FactorType::Table))
            }
            // The copy instruction cannot have source and destination in
            // the same register.
            Keyword::Copy => {
                self.advance()?;
                self.expression()?;
                emit!(self, "move @1 @0");
                emit!(self, "cpy @0 @1");
                Ok(FactorInfo::of(FactorType::Unknown))
            }
            Keyword::This => {
                if self.local_scope == 0 {
                    return Err(self.error_unexpected());
                }
                emit!(self, "mpush");
                emit!(self, "mload .this");
                self.advance()?;
                Ok(FactorInfo::of(FactorType::Name))
            }
            Keyword::CallFunction => {
                self.call_c_function(true, true)?;
                Ok(FactorInfo::of(FactorType::Value))
            }
            Keyword::LoadImage => {
                let argc = self.call_system_function(SysCall::LoadImage, 1, 3, true, true)?;
                if !(argc == 1 || argc == 3) {
                    self.expect_char(',')?;
                }
                Ok(FactorInfo::of(FactorType::Value))
            }
            _ => {
                if let Some(sig) = function_builtin(kind) {
                    self.call_system_function(sig.call, sig.min, sig.max, true, true)?;
                    Ok(FactorInfo::of(sig.factor))
                } else {
                    Err(self.error_unexpected())
                }
            }
        }
    }

    /// Compile a call to an instruction-level function like `abs(x)` or
    /// `pow(a, b)`.
    pub(super) fn asm_function(
        &mut self,
        instruction: &str,
        argc: usize,
        expected: usize,
    ) -> CompileResult<()> {
        self.advance()?;
        self.expect_char('(')?;
        self.expression()?;
        if argc == 2 {
            emit!(self, "push @0");
            self.expect_char(',')?;
            self.expression()?;
            emit!(self, "spop @0 @1");
            emit!(self, "{} @0 @1", instruction);
        } else if expected == 2 {
            emit!(self, "{} @0 @0", instruction);
        } else {
            emit!(self, "{} @0", instruction);
        }
        self.expect_char(')')
    }

    /// Evaluate and push 0..max comma-separated arguments, enforcing the
    /// arity bounds at compile time.
    pub(super) fn load_system_function_params(
        &mut self,
        min: usize,
        max: usize,
        is_function: bool,
    ) -> CompileResult<usize> {
        let mut argc = 0;

        if is_function {
            self.expect_char('(')?;
            if self.token.is_char(')') {
                if min != 0 {
                    return Err(self.error("Expected expression"));
                }
                self.advance()?;
                return Ok(0);
            }
        } else if self.token.is_eol() || self.token == Token::Eof {
            if min != 0 {
                return Err(self.error("Expected expression"));
            }
            return Ok(0);
        }

        if max > 0 {
            loop {
                self.expression()?;
                emit!(self, "push @0");
                argc += 1;
                if !(argc < max && self.could_get_char(',')?) {
                    break;
                }
            }
        }
        if argc < min {
            self.expect_char(',')?;
        }
        if is_function {
            self.expect_char(')')?;
        }

        Ok(argc)
    }

    /// Lower a built-in to `sys <selector> <arity>`.
    pub(super) fn call_system_function(
        &mut self,
        call: SysCall,
        min: usize,
        max: usize,
        is_function: bool,
        get_next: bool,
    ) -> CompileResult<usize> {
        if get_next {
            self.advance()?;
        }
        let count = self.load_system_function_params(min, max, is_function)?;
        emit!(self, "sys {} {}", call.selector(), count);
        Ok(count)
    }

    /// Lower `CALL(...)` to `fcall <arity>`.
    pub(super) fn call_c_function(
        &mut self,
        is_function: bool,
        get_next: bool,
    ) -> CompileResult<usize> {
        if get_next {
            self.advance()?;
        }
        let count = self.load_system_function_params(1, 64, is_function)?;
        emit!(self, "fcall {}", count);
        Ok(count)
    }

    // ----- constant expressions -------------------------------------------

    /// Restricted expression for `constant` initializers: literals, unary
    /// sign, `|...|`, and arithmetic on the same.
    pub(super) fn const_expression(&mut self) -> CompileResult<()> {
        self.const_additive()
    }

    fn const_additive(&mut self) -> CompileResult<()> {
        self.const_multiplicative()?;
        while self.token.is_char('+') || self.token.is_char('-') {
            emit!(self, "push @0");
            if self.token.is_char('+') {
                self.advance()?;
                self.eat_newlines()?;
                self.const_multiplicative()?;
                emit!(self, "spadd");
            } else {
                self.advance()?;
                self.eat_newlines()?;
                self.const_multiplicative()?;
                emit!(self, "spsub");
            }
        }
        Ok(())
    }

    fn const_multiplicative(&mut self) -> CompileResult<()> {
        self.const_factor()?;
        while self.token.is_char('*') || self.token.is_char('/') || self.token.is_char('%') {
            emit!(self, "push @0");
            if self.token.is_char('*') {
                self.advance()?;
                self.eat_newlines()?;
                self.const_factor()?;
                emit!(self, "spmul");
            } else if self.token.is_char('/') {
                self.advance()?;
                self.eat_newlines()?;
                self.const_factor()?;
                emit!(self, "spdiv");
            } else {
                self.advance()?;
                self.eat_newlines()?;
                self.const_factor()?;
                emit!(self, "spmod");
            }
        }
        Ok(())
    }

    fn const_factor(&mut self) -> CompileResult<()> {
        if self.token.is_char('+') {
            self.advance()?;
            self.eat_newlines()?;
            return self.const_factor();
        }
        if self.token.is_char('-') {
            self.advance()?;
            self.eat_newlines()?;
            self.const_factor()?;
            emit!(self, "neg @0");
            return Ok(());
        }

        match &self.token {
            Token::Char('(') => {
                self.advance()?;
                self.const_expression()?;
                self.expect_char(')')
            }
            Token::Number { text, .. } => {
                let text = text.clone();
                emit!(self, "move @0 {}", text);
                self.advance()
            }
            Token::Str(s) => {
                let s = s.clone();
                emit!(self, "move @0 \"{}\"", s);
                self.advance()
            }
            Token::Char('|') => {
                self.advance()?;
                self.const_expression()?;
                self.expect_char('|')?;
                emit!(self, "abs @0");
                Ok(())
            }
            _ => Err(self.error("Invalid constant expression")),
        }
    }
}
