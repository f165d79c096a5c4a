//! Include handling and raw assembly blocks.

use super::{emit, CodeGen, SourceEnv};
use crate::error::CompileResult;
use crate::keywords::Keyword;
use crate::lexer::{Lexer, Token};
use crate::open_include;
use std::collections::HashSet;

/// Library namespace for an included file: `_` followed by the filename
/// with every non-alphanumeric byte replaced by `_`.
pub(super) fn lib_name_for(filename: &str) -> String {
    let mut name = String::with_capacity(filename.len() + 1);
    name.push('_');
    for c in filename.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c);
        } else {
            name.push('_');
        }
    }
    name
}

impl CodeGen<'_> {
    /// `include "<file>"`. The included file's globals live in a library
    /// table in program memory, allocated here exactly once; files already
    /// included are skipped without re-emission.
    pub(super) fn include_statement(&mut self) -> CompileResult<()> {
        self.advance()?;

        if !self.blocks.is_empty() {
            return Err(self.error("Include can't be conditional"));
        }
        let name = match &self.token {
            Token::Str(name) => name.clone(),
            _ => return Err(self.error("Expected string")),
        };

        let source = open_include(&self.user_lib_path, &self.lib_path, &name)
            .ok_or_else(|| self.error(format!("Could not open file '{}' for reading", name)))?;

        if !self.includes.add(&name) {
            self.advance()?;
            self.expect_newline()?;
            return Ok(());
        }

        let lib_name = lib_name_for(&name);

        // Save the current file and enter the included one.
        let saved_visibles = self.scopes.swap_visibles(HashSet::new());
        self.env.push(SourceEnv {
            lexer: std::mem::replace(&mut self.lexer, Lexer::from_source(&source)),
            filename: std::mem::replace(&mut self.filename, name),
            lib_name: std::mem::replace(&mut self.lib_name, Some(lib_name.clone())),
            visibles: saved_visibles,
        });
        self.scopes.push_identifiers();

        self.advance()?;

        // Create and load the library table in program memory.
        emit!(self, "mpush");
        emit!(self, "loadpm");
        emit!(self, "madd .{}", lib_name);
        emit!(self, "mload .{}", lib_name);
        emit!(self, "ctbl @0");
        emit!(self, "mset @0");

        emit!(self, "/file:{}", self.filename);
        emit!(self, "/line:{}", self.lexer.line());

        self.block()?;
        if self.token != Token::Eof {
            return Err(self.error_unexpected());
        }

        emit!(self, "mpop");

        // Restore the including file.
        self.scopes.pop_identifiers();
        self.directives.merge(self.lexer.directives());
        let env = self.env.pop().expect("pushed above");
        self.lexer = env.lexer;
        self.filename = env.filename;
        self.lib_name = env.lib_name;
        self.scopes.swap_visibles(env.visibles);

        emit!(self, "/file:{}", self.filename);
        emit!(self, "/line:{}", self.lexer.line());

        self.advance()?;
        self.expect_newline()
    }

    /// `asm ... endasm`: every line is pasted into the output verbatim.
    pub(super) fn asm_statement(&mut self) -> CompileResult<()> {
        self.lexer.set_asm_mode(true);
        self.advance()?;
        while let Token::Str(line) = &self.token {
            emit!(self, "{}", line);
            self.advance()?;
        }
        if !self.token.is_keyword(Keyword::EndAsm) {
            return Err(self.error("Expected 'endasm'"));
        }
        self.lexer.set_asm_mode(false);
        self.advance()?;
        Ok(())
    }
}
