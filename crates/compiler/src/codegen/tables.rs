//! Table construction: literals, `dim` and `fill`.

use super::{emit, CodeGen, FactorType};
use crate::error::CompileResult;
use crate::lexer::Token;

impl CodeGen<'_> {
    /// `[a, b, c]` (auto-indexed from 0) or `[x: a, y: b]` (keyed). The
    /// form is decided by peeking for a `:` after the first identifier.
    /// Newlines inside the brackets are consumed transparently.
    pub(super) fn table_factor(&mut self) -> CompileResult<FactorType> {
        self.expect_char('[')?;
        self.eat_newlines()?;
        emit!(self, "ctbl @0");

        let keyed = matches!(self.token, Token::Name(_)) && self.lexer.peek_for_char(':');
        if keyed {
            loop {
                self.eat_newlines()?;
                let name = match &self.token {
                    Token::Name(name) => name.clone(),
                    _ => return Err(self.error("Expected identifier")),
                };
                self.advance()?;
                self.eat_newlines()?;
                self.expect_char(':')?;
                self.eat_newlines()?;
                emit!(self, "push @0");

                self.expression()?;
                self.eat_newlines()?;
                emit!(self, "pop @1");
                emit!(self, "mpush");
                emit!(self, "mload @1");
                emit!(self, "madd .{}", name);
                emit!(self, "mload .{}", name);
                emit!(self, "mset @0");
                emit!(self, "mpop");
                emit!(self, "move @0 @1");

                if !self.could_get_char(',')? {
                    break;
                }
            }
            self.eat_newlines()?;
            self.expect_char(']')?;
            Ok(FactorType::Table)
        } else {
            if !self.token.is_char(']') {
                let mut index = 0;
                loop {
                    self.eat_newlines()?;

                    emit!(self, "push @0");
                    self.expression()?;
                    emit!(self, "pop @1");
                    emit!(self, "mpush");
                    emit!(self, "mload @1");
                    emit!(self, "madd {}", index);
                    emit!(self, "mload {}", index);
                    emit!(self, "mset @0");
                    emit!(self, "mpop");
                    emit!(self, "move @0 @1");

                    index += 1;
                    self.eat_newlines()?;
                    if !self.could_get_char(',')? {
                        break;
                    }
                }
            }
            self.eat_newlines()?;
            self.expect_char(']')?;
            Ok(FactorType::Array)
        }
    }

    /// `dim(n1[, n2 ...])`: a table of `n1` empty tables, each of `n2`
    /// empty tables, and so on.
    pub(super) fn dim(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.expect_char('(')?;
        self.dim_rec(false)?;
        self.expect_char(')')
    }

    /// `fill(filler, n1[, n2 ...])`: like `dim` but every leaf slot gets a
    /// deep copy of the filler.
    pub(super) fn fill(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.expect_char('(')?;
        self.expression()?;
        self.expect_char(',')?;
        emit!(self, "push @0");
        self.dim_rec(true)?;
        emit!(self, "pop @1");
        self.expect_char(')')?;
        // Leave any garbage tables to the gc; register 1 is clobbered soon
        // anyway but register 4 isn't used much.
        emit!(self, "clr @1");
        emit!(self, "clr @4");
        Ok(())
    }

    /// One dimension of a `dim`/`fill` allocation. Generates the loops
    /// inline instead of calling into the runtime, recursing per
    /// dimension; with `fill` set the filler is assumed on top of the
    /// stack.
    fn dim_rec(&mut self, fill: bool) -> CompileResult<()> {
        let label_index = self.next_label();

        // Create the table and keep it on the stack.
        emit!(self, "ctbl @0");
        emit!(self, "push @0");

        // Size of this dimension.
        self.expression()?;

        let last = !self.token.is_char(',');

        // Destination (dimension size) in @2, running index in @1.
        emit!(self, "move @2 @0");
        emit!(self, "move @1 0");

        emit!(self, "dim_{}_start:", label_index);
        emit!(self, "move @0 @1");
        emit!(self, "geql @0 @2");
        emit!(self, "jmpet @0 dim_{}_end:", label_index);

        // Add the index as a subvariable of the table being built.
        emit!(self, "pop @0");
        emit!(self, "mpush");
        emit!(self, "mload @0");
        emit!(self, "madd @1");
        if last && fill {
            // Copy the filler into the new slot, keeping the original on
            // the stack.
            emit!(self, "pop @4");
            emit!(self, "cpy @3 @4");
            emit!(self, "push @4");
            emit!(self, "mload @1");
            emit!(self, "mset @3");
        }
        emit!(self, "mpop");
        emit!(self, "push @0");

        if !last {
            self.advance()?;
            if fill {
                // The filler sits below the table on the stack; fish it
                // out and push both back in order.
                emit!(self, "pop @3");
                emit!(self, "pop @4");
                emit!(self, "push @4");
                emit!(self, "push @3");
            }
            // Save index and destination around the recursion.
            emit!(self, "push @1");
            emit!(self, "push @2");
            if fill {
                emit!(self, "push @4");
            }
            self.dim_rec(fill)?;
            if fill {
                emit!(self, "pop @4");
            }
            emit!(self, "pop @2");
            emit!(self, "pop @1");

            // Hang the inner table (@0) at the right index.
            emit!(self, "pop @3");
            emit!(self, "mpush");
            emit!(self, "mload @3");
            emit!(self, "mload @1");
            emit!(self, "mset @0");
            emit!(self, "mpop");
            emit!(self, "push @3");
        }

        // Step the index and loop.
        emit!(self, "move @3 1");
        emit!(self, "add @1 @3");
        emit!(self, "jmp dim_{}_start:", label_index);
        emit!(self, "dim_{}_end:", label_index);
        emit!(self, "pop @0");
        Ok(())
    }
}
