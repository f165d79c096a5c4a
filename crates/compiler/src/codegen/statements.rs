//! Statement dispatch.
//!
//! A statement line starts with a keyword, an identifier (assignment or
//! call), `.` (shorthand for `this.`), or `this`. Dangling expressions are
//! not allowed; an identifier line must end up being an assignment, a
//! `free`, or a function call.

use super::{emit, CodeGen};
use crate::builtins::{free_command, statement_command};
use crate::error::CompileResult;
use crate::keywords::Keyword;
use crate::lexer::Token;
use n7_core::SysCall;

impl CodeGen<'_> {
    /// Compile statements until a block-ending keyword or end of file.
    pub(super) fn block(&mut self) -> CompileResult<()> {
        while self.statement()? {}
        Ok(())
    }

    /// Compile one statement; false when the enclosing block ends.
    pub(super) fn statement(&mut self) -> CompileResult<bool> {
        let mut is_free = false;

        while self.token.is_eol() {
            self.advance()?;
        }
        if self.end_of_block() {
            return Ok(false);
        }

        // free <lvalue> shares the assignment machinery.
        if self.token.is_keyword(Keyword::Free) {
            is_free = true;
            self.advance()?;
        }

        if matches!(self.token, Token::Name(_))
            || self.token.is_keyword(Keyword::This)
            || self.token.is_char('.')
        {
            self.assignment_or_call(is_free)?;
        } else if is_free {
            // free key(t, k), free image(img), ...
            let kind = match &self.token {
                Token::Keyword { kind, .. } => *kind,
                _ => return Err(self.syntax_error()),
            };
            match free_command(kind) {
                Some(sig) => {
                    self.call_system_function(sig.call, sig.min, sig.max, false, true)?;
                }
                None => return Err(self.syntax_error()),
            }
        } else if let Token::Keyword { kind, .. } = &self.token {
            let kind = *kind;
            match kind {
                Keyword::End => {
                    self.advance()?;
                    emit!(self, "end");
                }
                Keyword::Gc => {
                    self.advance()?;
                    emit!(self, "gc");
                }
                Keyword::Assert => self.assert_statement()?,
                // Block starters manage their own line endings because of
                // one-liners and optional terminators.
                Keyword::Include => {
                    self.include_statement()?;
                    return Ok(true);
                }
                Keyword::Asm => {
                    self.asm_statement()?;
                    return Ok(true);
                }
                Keyword::If => {
                    self.if_statement()?;
                    return Ok(true);
                }
                Keyword::Select => {
                    self.select_statement()?;
                    return Ok(true);
                }
                Keyword::While => {
                    self.while_statement()?;
                    return Ok(true);
                }
                Keyword::Do => {
                    self.do_statement()?;
                    return Ok(true);
                }
                Keyword::For => {
                    self.for_statement()?;
                    return Ok(true);
                }
                Keyword::Foreach => {
                    self.foreach_statement()?;
                    return Ok(true);
                }
                Keyword::Function => {
                    self.function_def()?;
                    return Ok(true);
                }
                // Jumpers.
                Keyword::Break => self.break_statement()?,
                Keyword::Return => self.return_statement()?,
                // Declarations.
                Keyword::Visible => self.visible_declaration()?,
                Keyword::Constant => self.constant_declaration()?,
                // Multi-keyword command spellings.
                Keyword::Clear => self.clear_statement()?,
                Keyword::Wln => self.wln_statement()?,
                Keyword::Write => self.write_statement()?,
                Keyword::Set => self.set_statement()?,
                Keyword::Load => self.load_statement()?,
                Keyword::Save => self.save_statement()?,
                Keyword::Create => self.create_statement()?,
                Keyword::Open => self.open_statement()?,
                Keyword::Draw => self.draw_statement()?,
                Keyword::Play => self.play_statement()?,
                Keyword::Stop => self.stop_statement()?,
                Keyword::File => self.file_statement()?,
                Keyword::CallFunction => {
                    self.call_c_function(false, true)?;
                }
                _ => match statement_command(kind) {
                    Some(sig) => {
                        self.call_system_function(sig.call, sig.min, sig.max, false, true)?;
                    }
                    None => return Err(self.syntax_error()),
                },
            }
        } else {
            return Err(self.syntax_error());
        }

        self.expect_newline()?;
        Ok(true)
    }

    /// A line beginning with an identifier, `this` or `.`: assignment,
    /// `free` target, or call, possibly through an indirection chain.
    fn assignment_or_call(&mut self, is_free: bool) -> CompileResult<()> {
        let mut name: String;
        let base_name: String;
        let mut is_this = false;

        if self.token.is_keyword(Keyword::This) {
            if self.local_scope == 0 {
                return Err(self.error_unexpected());
            }
            name = "this".to_string();
            base_name = "this".to_string();
            is_this = true;
            self.advance()?;
        } else if self.token.is_char('.') {
            // Treat '.' as 'this' and leave the dot for the chain below.
            if self.local_scope == 0 {
                return Err(self.error_unexpected());
            }
            name = "this".to_string();
            base_name = "this".to_string();
            is_this = true;
        } else {
            name = match &self.token {
                Token::Name(n) => n.clone(),
                _ => return Err(self.syntax_error()),
            };
            base_name = name.clone();
            self.advance()?;
        }

        emit!(self, "mpush");

        // Load program memory when the base is a global and we are inside
        // a function (constants additionally ignore the library table).
        let global = self.scopes.global(&name);
        if self.scopes.is_constant(&name) {
            if self.lib_name.is_some() {
                emit!(self, "loadpm");
            }
        } else if self.scopes.is_visible(&name) && self.local_scope > 0 {
            emit!(self, "loadpm");
            if let Some(lib) = self.lib_name.clone() {
                emit!(self, "mload .{}", lib);
            }
        }

        // What the previous chain component was: 0 name, 1 index, 2 call.
        let mut last = 0;
        // A function result's memory must be pushed to the value stack to
        // stay alive while it is used; pop when done.
        let mut did_push = false;
        let mut indir = 0;

        while self.token.is_char('.') || self.token.is_char('[') || self.token.is_char('(') {
            let mut func = None;
            if indir == 0 {
                if let Some(f) = self.find_function(&base_name) {
                    func = Some(f);
                    if !self.token.is_char('(') {
                        return Err(self.error(format!("'{}' is a static function", base_name)));
                    }
                } else if !self.scopes.declared(&base_name) {
                    return Err(self.error(format!("Undeclared identifier '{}'", base_name)));
                }
            }

            indir += 1;
            // Load the previous component's memory.
            if last == 0 {
                if let Some(f) = func {
                    emit!(self, "move @0 __{}:", self.funcs.get(f).index);
                    emit!(self, "push @0");
                    emit!(self, "mloads");
                    did_push = true;
                } else {
                    emit!(self, "mload .{}", name);
                    if did_push {
                        emit!(self, "pop @1");
                        did_push = false;
                    }
                }
            } else if last == 1 {
                emit!(self, "mload @0");
                if did_push {
                    emit!(self, "pop @1");
                    did_push = false;
                }
            } else {
                if did_push {
                    emit!(self, "pop @1");
                    did_push = false;
                }
                emit!(self, "push @0");
                emit!(self, "mloads");
                did_push = true;
            }

            if self.token.is_char('.') {
                self.advance()?;
                name = match &self.token {
                    Token::Name(n) => n.clone(),
                    _ => return Err(self.error("Expected identifier")),
                };
                self.advance()?;
                last = 0;
            } else if self.token.is_char('[') {
                self.advance()?;
                emit!(self, "mswap");
                self.expression()?;
                emit!(self, "mswap");
                self.expect_char(']')?;
                last = 1;
            } else {
                self.call_function(func)?;
                last = 2;
            }
        }

        if is_free {
            if self.find_function(&base_name).is_some() && indir == 0 {
                return Err(self.error(format!("'{}' is a static function", base_name)));
            }
            if global.map(|g| g.read_only()).unwrap_or(false) {
                return Err(self.error(format!("'{}' is a constant", base_name)));
            }

            if last == 0 {
                emit!(self, "mdel .{}", name);
            } else if last == 1 {
                emit!(self, "mdel @0");
            }

            emit!(self, "mpop");
            if did_push {
                emit!(self, "pop @1");
            }
        } else if self.token.is_char('=') {
            if indir == 0 && is_this {
                return Err(self.error("Invalid assignment"));
            }
            // Can't assign to a function call result.
            if last == 2 {
                return Err(self.error("Invalid assignment"));
            }
            if self.find_function(&base_name).is_some() && indir == 0 {
                return Err(self.error(format!("'{}' is a static function", base_name)));
            }
            if global.map(|g| g.read_only()).unwrap_or(false) {
                return Err(self.error(format!("'{}' is a constant", base_name)));
            }

            self.scopes.add_identifier(&base_name);

            // Add the field, load it and swap back; the assembler fuses
            // this into opt_mals.
            if last == 1 {
                emit!(self, "madd @0");
                emit!(self, "mload @0");
            } else {
                emit!(self, "madd .{}", name);
                emit!(self, "mload .{}", name);
            }
            emit!(self, "mswap");

            self.advance()?;
            self.eat_newlines()?;

            // Evaluate the right side into register 0, swap back to the
            // variable, set and pop (fused into opt_mssp).
            self.expression()?;
            emit!(self, "mswap");
            emit!(self, "mset @0");
            emit!(self, "mpop");
            if did_push {
                emit!(self, "pop @1");
            }
        } else {
            // Plain call; dangling expressions are not allowed.
            if last != 2 {
                return Err(self.syntax_error());
            }
            if did_push {
                emit!(self, "pop @1");
            }
            emit!(self, "mpop");
        }

        Ok(())
    }

    /// `assert <expr>[, <msg>]`
    fn assert_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.expression()?;
        emit!(self, "push @0");
        if self.token.is_char(',') {
            self.advance()?;
            self.expression()?;
        } else {
            emit!(self, "move @0 \"Assertion failed\"");
        }
        emit!(self, "spop @0 @1");
        emit!(self, "assert @0 @1");
        Ok(())
    }

    /// `visible id[ = expr][, ...]`, only at the top of a file.
    fn visible_declaration(&mut self) -> CompileResult<()> {
        self.advance()?;

        if self.local_scope > 0 {
            return Err(self.error("Visible declarations can't be local"));
        }
        if !self.blocks.is_empty() {
            return Err(self.error("Visible declarations can't be conditional"));
        }

        if self.token.is_eol() || self.token == Token::Eof {
            return Ok(());
        }
        loop {
            let name = match &self.token {
                Token::Name(n) => n.clone(),
                _ => return Err(self.error("Expected identifier")),
            };
            if self.find_function(&name).is_some() {
                return Err(self.error(format!("'{}' is a static function", name)));
            }
            if self.scopes.is_constant(&name) {
                return Err(self.error(format!(
                    "'{}' has already been declared as constant",
                    name
                )));
            }
            if self.scopes.is_visible(&name) {
                return Err(
                    self.error(format!("'{}' has already been declared as visible", name))
                );
            }

            self.scopes.add_visible(&name);
            self.advance()?;
            emit!(self, "mpush");
            emit!(self, "madd .{}", name);
            self.scopes.add_identifier(&name);
            if self.token.is_char('=') {
                self.advance()?;
                emit!(self, "mload .{}", name);
                emit!(self, "mswap");
                self.expression()?;
                emit!(self, "mswap");
                emit!(self, "mset @0");
            }
            emit!(self, "mpop");

            if !self.could_get_char(',')? {
                break;
            }
        }
        Ok(())
    }

    /// `constant id = constExpr[, ...]`, only at the top of a file.
    fn constant_declaration(&mut self) -> CompileResult<()> {
        self.advance()?;

        if self.local_scope > 0 {
            return Err(self.error("Constant declarations can't be local"));
        }
        if !self.blocks.is_empty() {
            return Err(self.error("Constant declarations can't be conditional"));
        }

        if self.token.is_eol() || self.token == Token::Eof {
            return Ok(());
        }
        loop {
            let name = match &self.token {
                Token::Name(n) => n.clone(),
                _ => return Err(self.error("Expected identifier")),
            };
            if self.find_function(&name).is_some() {
                return Err(self.error(format!("'{}' is a static function", name)));
            }
            if self.scopes.is_constant(&name) {
                return Err(self.error(format!(
                    "'{}' has already been declared as constant",
                    name
                )));
            }
            if self.scopes.is_visible(&name) {
                return Err(
                    self.error(format!("'{}' has already been declared as visible", name))
                );
            }

            self.scopes.add_constant(&name);
            self.advance()?;
            emit!(self, "mpush");
            // Constants always live directly in program memory.
            if self.lib_name.is_some() {
                emit!(self, "loadpm");
            }
            emit!(self, "madd .{}", name);
            self.expect_char('=')?;
            self.scopes.add_identifier(&name);
            emit!(self, "mload .{}", name);
            emit!(self, "mswap");
            self.const_expression()?;
            emit!(self, "mswap");
            emit!(self, "mset @0");
            emit!(self, "mpop");

            if !self.could_get_char(',')? {
                break;
            }
        }
        Ok(())
    }

    // ----- multi-keyword command spellings --------------------------------

    fn sub_keyword(&self) -> Option<Keyword> {
        match &self.token {
            Token::Keyword { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// `clear <table>` or `clear clip rect`.
    fn clear_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.sub_keyword() == Some(Keyword::Clip) {
            self.advance()?;
            if self.sub_keyword() == Some(Keyword::Rect) {
                self.call_system_function(SysCall::ClearImageClipRect, 0, 0, false, true)?;
            } else {
                return Err(self.syntax_error());
            }
        } else {
            self.call_system_function(SysCall::TblClear, 1, 1, false, false)?;
        }
        Ok(())
    }

    /// `wln [file f,] [expr]`.
    fn wln_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.sub_keyword() == Some(Keyword::File) {
            self.call_system_function(SysCall::FileWriteLine, 1, 2, false, true)?;
        } else {
            self.call_system_function(SysCall::WriteLine, 0, 1, false, false)?;
        }
        Ok(())
    }

    /// `write [file f,] expr`.
    fn write_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.sub_keyword() == Some(Keyword::File) {
            self.call_system_function(SysCall::FileWrite, 2, 4, false, true)?;
        } else {
            self.call_system_function(SysCall::Write, 1, 1, false, false)?;
        }
        Ok(())
    }

    fn set_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        let sub = match self.sub_keyword() {
            Some(sub) => sub,
            None => return Err(self.syntax_error()),
        };
        match sub {
            Keyword::Window => {
                self.call_system_function(SysCall::SetWindow, 3, 7, false, true)?;
            }
            Keyword::Redraw => {
                self.call_system_function(SysCall::SetRedraw, 1, 1, false, true)?;
            }
            Keyword::Mouse => {
                self.call_system_function(SysCall::SetMouse, 1, 2, false, true)?;
            }
            Keyword::Pixel => {
                self.call_system_function(SysCall::SetPixel, 2, 2, false, true)?;
            }
            Keyword::Caret => {
                self.call_system_function(SysCall::SetCaret, 2, 2, false, true)?;
            }
            Keyword::Font => {
                self.call_system_function(SysCall::SetFont, 1, 1, false, true)?;
            }
            Keyword::Clipboard => {
                self.call_system_function(SysCall::SetClipboard, 1, 1, false, true)?;
            }
            Keyword::Console => {
                self.call_system_function(SysCall::Console, 1, 1, false, true)?;
            }
            Keyword::Color => {
                // Two components is neither a color index, grayscale nor rgb.
                if self.call_system_function(SysCall::SetColor, 1, 4, false, true)? == 2 {
                    return Err(self.syntax_error());
                }
            }
            Keyword::ColorI => {
                self.call_system_function(SysCall::SetColorInt, 1, 1, false, true)?;
            }
            Keyword::Additive => {
                self.call_system_function(SysCall::SetAdditive, 1, 1, false, true)?;
            }
            Keyword::Clip => {
                self.advance()?;
                if self.sub_keyword() == Some(Keyword::Rect) {
                    self.call_system_function(SysCall::SetImageClipRect, 4, 4, false, true)?;
                } else {
                    return Err(self.syntax_error());
                }
            }
            Keyword::Image => {
                self.advance()?;
                if self.sub_keyword() == Some(Keyword::ColorKey) {
                    self.call_system_function(SysCall::SetImageColorKey, 4, 4, false, true)?;
                } else if self.sub_keyword() == Some(Keyword::Grid) {
                    self.call_system_function(SysCall::SetImageGrid, 3, 3, false, true)?;
                } else {
                    self.call_system_function(SysCall::SetImage, 1, 2, false, false)?;
                }
            }
            Keyword::Justification => self.set_justification()?,
            Keyword::Music => {
                self.advance()?;
                if self.sub_keyword() == Some(Keyword::Volume) {
                    self.call_system_function(SysCall::SetMusicVolume, 2, 2, false, true)?;
                } else {
                    return Err(self.syntax_error());
                }
            }
            _ => return Err(self.syntax_error()),
        }
        Ok(())
    }

    /// `set justification left|right|center|<expr>`.
    fn set_justification(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.sub_keyword() == Some(Keyword::Left) {
            self.advance()?;
            emit!(self, "move @0 1");
            emit!(self, "neg @0");
        } else if self.sub_keyword() == Some(Keyword::Right) {
            self.advance()?;
            emit!(self, "move @0 1");
        } else if self.sub_keyword() == Some(Keyword::Center) {
            self.advance()?;
            emit!(self, "move @0 0");
        } else {
            self.expression()?;
        }
        emit!(self, "push @0");
        emit!(self, "sys {} 1", SysCall::SetJustification.selector());
        Ok(())
    }

    fn load_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        match self.sub_keyword() {
            Some(Keyword::Image) => {
                let argc = self.call_system_function(SysCall::LoadImageLegacy, 2, 4, false, true)?;
                if !(argc == 2 || argc == 4) {
                    self.expect_char(',')?;
                }
            }
            Some(Keyword::Font) => {
                self.call_system_function(SysCall::LoadFontLegacy, 2, 2, false, true)?;
            }
            Some(Keyword::Sound) => {
                self.call_system_function(SysCall::LoadSoundLegacy, 2, 2, false, true)?;
            }
            Some(Keyword::Music) => {
                self.call_system_function(SysCall::LoadMusicLegacy, 2, 2, false, true)?;
            }
            _ => return Err(self.syntax_error()),
        }
        Ok(())
    }

    fn save_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        match self.sub_keyword() {
            Some(Keyword::Image) => {
                self.call_system_function(SysCall::SaveImage, 2, 2, false, true)?;
            }
            Some(Keyword::Font) => {
                self.call_system_function(SysCall::SaveFont, 2, 2, false, true)?;
            }
            _ => return Err(self.syntax_error()),
        }
        Ok(())
    }

    fn create_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        match self.sub_keyword() {
            Some(Keyword::File) => {
                self.call_system_function(SysCall::CreateFileLegacy, 2, 3, false, true)?;
            }
            Some(Keyword::Image) => {
                self.call_system_function(SysCall::CreateImageLegacy, 3, 3, false, true)?;
            }
            Some(Keyword::Sound) => {
                self.call_system_function(SysCall::CreateSoundLegacy, 4, 4, false, true)?;
            }
            Some(Keyword::Font) => {
                self.call_system_function(SysCall::CreateFontLegacy, 3, 7, false, true)?;
            }
            Some(Keyword::Zone) => {
                self.call_system_function(SysCall::CreateZoneLegacy, 5, 5, false, true)?;
            }
            _ => return Err(self.syntax_error()),
        }
        Ok(())
    }

    fn open_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.sub_keyword() == Some(Keyword::File) {
            self.call_system_function(SysCall::OpenFileLegacy, 2, 3, false, true)?;
        } else {
            return Err(self.syntax_error());
        }
        Ok(())
    }

    fn draw_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        let sub = match self.sub_keyword() {
            Some(sub) => sub,
            None => return Err(self.syntax_error()),
        };
        match sub {
            Keyword::Pixel => {
                self.call_system_function(SysCall::DrawPixel, 2, 2, false, true)?;
            }
            Keyword::Line => {
                self.advance()?;
                if self.sub_keyword() == Some(Keyword::To) {
                    self.call_system_function(SysCall::DrawLine, 2, 2, false, true)?;
                } else {
                    let argc = self.call_system_function(SysCall::DrawLine, 2, 4, false, false)?;
                    if !(argc == 2 || argc == 4) {
                        self.expect_char(',')?;
                    }
                }
            }
            Keyword::Rect => {
                self.call_system_function(SysCall::DrawRect, 4, 5, false, true)?;
            }
            Keyword::Ellipse => {
                self.call_system_function(SysCall::DrawEllipse, 4, 5, false, true)?;
            }
            Keyword::Poly => {
                self.advance()?;
                if self.sub_keyword() == Some(Keyword::Image) {
                    self.advance()?;
                    if self.sub_keyword() == Some(Keyword::Transformed) {
                        self.call_system_function(
                            SysCall::DrawPolygonImageTransformed,
                            9,
                            11,
                            false,
                            true,
                        )?;
                    } else {
                        self.call_system_function(SysCall::DrawPolygonImage, 2, 4, false, false)?;
                    }
                } else if self.sub_keyword() == Some(Keyword::Transformed) {
                    self.call_system_function(SysCall::DrawPolygonTransformed, 8, 10, false, true)?;
                } else {
                    self.call_system_function(SysCall::DrawPolygon, 1, 3, false, false)?;
                }
            }
            Keyword::Vraster => {
                self.call_system_function(SysCall::DrawVraster, 8, 8, false, true)?;
            }
            Keyword::Hraster => {
                self.call_system_function(SysCall::DrawHraster, 8, 8, false, true)?;
            }
            Keyword::Image => {
                self.advance()?;
                if self.sub_keyword() == Some(Keyword::Transformed) {
                    let argc =
                        self.call_system_function(SysCall::DrawImageTransformed, 8, 12, false, true)?;
                    if !(argc == 8 || argc == 9 || argc == 12) {
                        self.expect_char(',')?;
                    }
                } else {
                    let argc = self.call_system_function(SysCall::DrawImage, 3, 7, false, false)?;
                    if !(argc == 3 || argc == 4 || argc == 7) {
                        self.expect_char(',')?;
                    }
                }
            }
            _ => return Err(self.syntax_error()),
        }
        Ok(())
    }

    fn play_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        match self.sub_keyword() {
            Some(Keyword::Sound) => {
                self.call_system_function(SysCall::PlaySound, 1, 3, false, true)?;
            }
            Some(Keyword::Music) => {
                self.call_system_function(SysCall::PlayMusic, 1, 2, false, true)?;
            }
            _ => return Err(self.syntax_error()),
        }
        Ok(())
    }

    fn stop_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.sub_keyword() == Some(Keyword::Music) {
            self.call_system_function(SysCall::StopMusic, 1, 1, false, true)?;
        } else {
            return Err(self.syntax_error());
        }
        Ok(())
    }

    /// `file seek f, offset[, mode]`.
    fn file_statement(&mut self) -> CompileResult<()> {
        self.advance()?;
        if self.sub_keyword() == Some(Keyword::Seek) {
            self.call_system_function(SysCall::FileSeek, 2, 3, false, true)?;
        } else {
            return Err(self.syntax_error());
        }
        Ok(())
    }
}
