//! Function definitions and static calls.

use super::{emit, CodeGen};
use crate::error::CompileResult;
use crate::keywords::Keyword;
use crate::lexer::Token;
use crate::prescan::FuncId;

impl CodeGen<'_> {
    /// Compile a `function [name](params) ... endfunc` definition. The body
    /// is emitted where the definition appears, so the surrounding code
    /// jumps over it; `__<index>:` is the call entry.
    pub(super) fn function_def(&mut self) -> CompileResult<FuncId> {
        let function_index = self.function_index;

        self.advance()?;

        let key = match &self.token {
            Token::Name(name) => {
                if !self.blocks.is_empty() {
                    return Err(self.error("Static function definitions can't be conditional"));
                }
                let key = name.clone();
                self.advance()?;
                key
            }
            Token::Char('(') => function_index.to_string(),
            // Caught by the prescan already.
            _ => return Err(self.syntax_error()),
        };

        self.function_index += 1;

        emit!(self, "jmp __{}_end:", function_index);
        emit!(self, "__{}:", function_index);

        // The prescan built the definition; find it by name.
        let func = self
            .funcs
            .child(self.current, &key)
            .ok_or_else(|| self.error(format!("Could not find '{}' definition", key)))?;
        let anonymous = self.funcs.get(func).anonymous;
        let param_count = self.funcs.get(func).params.len();
        let func_name = self.funcs.get(func).name.clone();

        // Validate the argument count passed by the caller; the assembler
        // fuses this check into opt_pval.
        let message = if anonymous {
            match param_count {
                0 => "Anonymous function expected no arguments".to_string(),
                1 => "Anonymous function expected 1 argument".to_string(),
                n => format!("Anonymous function expected {} arguments", n),
            }
        } else {
            match param_count {
                0 => format!("'{}' expected no arguments", func_name),
                1 => format!("'{}' expected 1 argument", func_name),
                n => format!("'{}' expected {} arguments", func_name, n),
            }
        };
        emit!(self, "pop @0");
        emit!(self, "move @1 {}", param_count);
        emit!(self, "ecmp @0 @1");
        emit!(self, "jmpt __{}_ok:", function_index);
        emit!(self, "move @0 \"{}\"", message);
        emit!(self, "rte @0");
        emit!(self, "__{}_ok:", function_index);

        self.expect_char('(')?;
        // Push and load the local memory created by call.
        emit!(self, "mpush");
        emit!(self, "local");

        self.scopes.push_identifiers();

        // Bind parameters; they sit on the value stack in reverse order.
        let params = self.funcs.get(func).params.clone();
        for param in &params {
            self.scopes.add_identifier(param);

            self.advance()?;
            if self.token.is_char(',') {
                self.advance()?;
                self.eat_newlines()?;
            }

            emit!(self, "madd .{}", param);
            emit!(self, "mpush");
            emit!(self, "mload .{}", param);
            emit!(self, "pop @0");
            emit!(self, "mset @0");
            emit!(self, "mpop");
        }
        self.expect_char(')')?;

        // The caller's "this" is the last pushed value.
        self.scopes.add_identifier("this");
        emit!(self, "madd .this");
        emit!(self, "mpush");
        emit!(self, "mload .this");
        emit!(self, "pop @0");
        emit!(self, "mset @0");
        emit!(self, "mpop");

        self.local_scope += 1;
        self.current = func;
        self.block()?;
        self.current = self.funcs.get(func).parent.expect("not the root");
        if !self.token.is_keyword(Keyword::EndFunc) {
            return Err(self.error("Expected 'endfunc'"));
        }
        self.advance()?;
        if !anonymous {
            self.expect_newline()?;
        }
        self.local_scope -= 1;
        self.scopes.pop_identifiers();

        // Default return value; ret frees the local memory.
        emit!(self, "mpop");
        emit!(self, "clr @0");
        emit!(self, "ret");

        emit!(self, "__{}_end:", function_index);

        Ok(func)
    }

    /// Compile a call through the currently loaded variable. For a static
    /// function the definition is known and the argument count is checked
    /// here; for function values the check happens at the callee's entry.
    pub(super) fn call_function(&mut self, func: Option<FuncId>) -> CompileResult<()> {
        let mut arg_count = 0;

        // The loaded memory becomes the callee's "this".
        emit!(self, "lptbl @0");
        emit!(self, "push @0");

        self.expect_char('(')?;
        if !self.token.is_char(')') {
            loop {
                emit!(self, "mswap");
                self.expression()?;
                emit!(self, "mswap");
                emit!(self, "push @0");
                arg_count += 1;
                if !self.could_get_char(',')? {
                    break;
                }
            }
        }
        self.expect_char(')')?;

        if let Some(func) = func {
            let def = self.funcs.get(func);
            if arg_count != def.params.len() {
                let message = match def.params.len() {
                    0 => format!("'{}' expects no arguments but gets {}", def.name, arg_count),
                    1 => format!("'{}' expects 1 argument but gets {}", def.name, arg_count),
                    n => format!("'{}' expects {} arguments but gets {}", def.name, n, arg_count),
                };
                return Err(self.error(message));
            }
        }

        emit!(self, "move @0 {}", arg_count);
        emit!(self, "push @0");
        // The memory is still the loaded variable: get the label value and
        // swap out of it; the caller pops when done.
        emit!(self, "mget @0");
        emit!(self, "mswap");
        // Wanders off and returns with the result in register 0.
        emit!(self, "call @0");
        emit!(self, "mswap");
        Ok(())
    }
}
