//! Source tokenizer.
//!
//! Produces one token at a time from an n7 source buffer. Whitespace and
//! `'` comments are skipped before every token. A `\n` yields a "real" end
//! of line (the line counter advances when the *next* token is requested,
//! so emitted `/line:` metadata points at the line of the next statement);
//! a `;` yields a statement break that does not advance the counter.
//!
//! The lexer also consumes `#` compile-time directives (win32, dbg, mem<N>)
//! into [`Directives`], and has a raw mode for `asm` blocks where every
//! line comes back as a single string token until `endasm`.

use crate::keywords::{Keyword, KeywordEntry, KeywordTable};
use n7_core::{DBG_FLAG, NUMBER_MAX_CHARS, STRING_MAX_CHARS, VAR_MAX_CHARS, WIN32_FLAG};
use std::fs;
use std::io;
use std::path::Path;

/// A lexed token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword {
        kind: Keyword,
        constant: Option<crate::keywords::Constant>,
        text: &'static str,
    },
    Name(String),
    Number {
        value: f64,
        text: String,
    },
    Str(String),
    Char(char),
    Eol {
        real: bool,
    },
    Eof,
}

impl Token {
    pub fn is_keyword(&self, kind: Keyword) -> bool {
        matches!(self, Token::Keyword { kind: k, .. } if *k == kind)
    }

    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Token::Char(ch) if *ch == c)
    }

    pub fn is_eol(&self) -> bool {
        matches!(self, Token::Eol { .. })
    }
}

/// Compile-time flags gathered from `#` directives.
#[derive(Debug, Clone, Copy, Default)]
pub struct Directives {
    pub runtime_flags: u32,
    pub memory_request: i32,
}

impl Directives {
    pub fn merge(&mut self, other: Directives) {
        self.runtime_flags |= other.runtime_flags;
        if other.memory_request > 0 {
            self.memory_request = other.memory_request;
        }
    }
}

/// Tokenizer over one source buffer.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    prev_was_real_eol: bool,
    line_bumped: bool,
    asm_mode: bool,
    directives: Directives,
}

impl Lexer {
    pub fn from_source(source: &str) -> Lexer {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            prev_was_real_eol: false,
            line_bumped: false,
            asm_mode: false,
            directives: Directives::default(),
        }
    }

    pub fn open(path: &Path) -> io::Result<Lexer> {
        Ok(Lexer::from_source(&fs::read_to_string(path)?))
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether the last `next` call advanced the line counter.
    pub fn take_line_bump(&mut self) -> bool {
        std::mem::take(&mut self.line_bumped)
    }

    pub fn set_asm_mode(&mut self, on: bool) {
        self.asm_mode = on;
    }

    pub fn directives(&self) -> Directives {
        self.directives
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Skip spaces, tabs, carriage returns and `'` comments, leaving any
    /// newline in place.
    fn eat_white(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.bump();
                }
                Some('\'') => {
                    self.bump();
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    /// Peek past spaces and tabs for a specific character without consuming
    /// anything. Used to tell keyed table literals from auto-indexed ones.
    pub fn peek_for_char(&self, wanted: char) -> bool {
        let mut pos = self.pos;
        while matches!(self.chars.get(pos), Some(' ') | Some('\t')) {
            pos += 1;
        }
        self.chars.get(pos) == Some(&wanted)
    }

    /// Fetch the next token. Errors carry the message only; the caller adds
    /// the source position.
    pub fn next(&mut self, keywords: &KeywordTable) -> Result<Token, String> {
        self.line_bumped = false;
        if self.prev_was_real_eol {
            self.line += 1;
            self.line_bumped = !self.asm_mode;
            self.prev_was_real_eol = false;
        }

        self.eat_white();
        let mut c = self.bump();

        if self.asm_mode {
            return self.next_asm_line(c, keywords);
        }

        // Compile-time directive, consumes the rest of the line.
        if c == Some('#') {
            let mut flag = String::new();
            c = self.bump();
            while !matches!(c, Some('\n') | None) {
                if flag.len() < 63 {
                    flag.extend(c.unwrap().to_lowercase());
                }
                c = self.bump();
            }
            if flag == "win32" {
                self.directives.runtime_flags |= WIN32_FLAG;
            } else if flag == "dbg" {
                self.directives.runtime_flags |= DBG_FLAG;
            } else if let Some(value) = flag.strip_prefix("mem") {
                if let Ok(request) = value.parse::<i32>() {
                    if request > 0 {
                        self.directives.memory_request = request;
                    }
                }
            }
        }

        match c {
            None => Ok(Token::Eof),
            Some('\n') => {
                self.prev_was_real_eol = true;
                Ok(Token::Eol { real: true })
            }
            Some(';') => Ok(Token::Eol { real: false }),
            Some(ch) if ch.is_ascii_alphabetic() => self.next_word(ch, keywords),
            Some(ch) if ch.is_ascii_digit() => Ok(self.next_number(ch)),
            Some('"') => self.next_string(),
            Some(ch) => Ok(Token::Char(ch)),
        }
    }

    fn next_word(&mut self, first: char, keywords: &KeywordTable) -> Result<Token, String> {
        let mut text = String::new();
        text.push(first);
        while let Some(ch) = self.peek() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            text.push(ch);
            self.bump();
            if text.len() > VAR_MAX_CHARS {
                return Err("Name too long".to_string());
            }
        }
        match keywords.get_key_value(text.as_str()) {
            Some((&key, entry)) => Ok(keyword_token(key, entry)),
            None => Ok(Token::Name(text)),
        }
    }

    fn next_number(&mut self, first: char) -> Token {
        let mut text = String::new();
        text.push(first);
        let mut decimals = 0;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                if text.len() < NUMBER_MAX_CHARS {
                    text.push(ch);
                }
                self.bump();
            } else if ch == '.' && decimals == 0 {
                decimals += 1;
                if text.len() < NUMBER_MAX_CHARS {
                    text.push('.');
                }
                self.bump();
            } else {
                break;
            }
        }
        let value = text.parse::<f64>().unwrap_or(0.0);
        Token::Number { value, text }
    }

    fn next_string(&mut self) -> Result<Token, String> {
        let mut text = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.bump();
                    return Ok(Token::Str(text));
                }
                Some('\n') => return Err("End of line in string constant".to_string()),
                None => return Err("End of file in string constant".to_string()),
                Some(ch) => {
                    if text.len() >= STRING_MAX_CHARS - 1 {
                        return Err("String constant too long".to_string());
                    }
                    text.push(ch);
                    self.bump();
                }
            }
        }
    }

    /// Raw-assembly mode: the rest of the current line is one string token,
    /// except a line starting with `endasm`, which ends the mode.
    fn next_asm_line(
        &mut self,
        mut c: Option<char>,
        keywords: &KeywordTable,
    ) -> Result<Token, String> {
        let mut text = String::new();
        loop {
            match c {
                Some('\n') | None => break,
                Some(ch) => {
                    if text.len() >= STRING_MAX_CHARS - 1 {
                        return Err("Assembler line too long".to_string());
                    }
                    text.push(ch);
                    c = self.bump();
                }
            }
        }
        if c.is_none() {
            return Err("End of file in assembler line".to_string());
        }
        self.line += 1;
        if text.starts_with("endasm") {
            let (&key, entry) = keywords
                .get_key_value("endasm")
                .expect("endasm is a keyword");
            Ok(keyword_token(key, entry))
        } else {
            Ok(Token::Str(text))
        }
    }
}

fn keyword_token(key: &'static str, entry: &KeywordEntry) -> Token {
    Token::Keyword {
        kind: entry.kind,
        constant: entry.constant.clone(),
        text: key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::keyword_table;

    fn lex_all(source: &str) -> Vec<Token> {
        let keywords = keyword_table();
        let mut lexer = Lexer::from_source(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next(&keywords).unwrap();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    #[test]
    fn words_numbers_and_strings() {
        let tokens = lex_all("x = 3.5 + \"hi\"\n");
        assert_eq!(tokens[0], Token::Name("x".to_string()));
        assert_eq!(tokens[1], Token::Char('='));
        assert!(
            matches!(&tokens[2], Token::Number { value, text } if *value == 3.5 && text == "3.5")
        );
        assert_eq!(tokens[3], Token::Char('+'));
        assert_eq!(tokens[4], Token::Str("hi".to_string()));
        assert_eq!(tokens[5], Token::Eol { real: true });
    }

    #[test]
    fn keywords_are_recognized() {
        let tokens = lex_all("while wend\n");
        assert!(tokens[0].is_keyword(Keyword::While));
        assert!(tokens[1].is_keyword(Keyword::Wend));
    }

    #[test]
    fn semicolon_is_an_unreal_line_break() {
        let tokens = lex_all("pln 1; pln 2\n");
        assert_eq!(tokens[2], Token::Eol { real: false });
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = lex_all("x ' a comment\ny\n");
        assert_eq!(tokens[0], Token::Name("x".to_string()));
        assert_eq!(tokens[1], Token::Eol { real: true });
        assert_eq!(tokens[2], Token::Name("y".to_string()));
    }

    #[test]
    fn line_counter_advances_on_the_token_after_a_real_eol() {
        let keywords = keyword_table();
        let mut lexer = Lexer::from_source("a\nb\n");
        assert_eq!(lexer.next(&keywords).unwrap(), Token::Name("a".to_string()));
        assert_eq!(lexer.line(), 1);
        lexer.next(&keywords).unwrap(); // eol
        assert_eq!(lexer.line(), 1);
        lexer.next(&keywords).unwrap(); // b, line bumps now
        assert_eq!(lexer.line(), 2);
        assert!(lexer.take_line_bump());
    }

    #[test]
    fn identifier_length_boundary() {
        let ok: String = "a".repeat(64) + "\n";
        assert_eq!(lex_all(&ok)[0], Token::Name("a".repeat(64)));

        let keywords = keyword_table();
        let mut lexer = Lexer::from_source(&("a".repeat(65) + "\n"));
        assert_eq!(lexer.next(&keywords).unwrap_err(), "Name too long");
    }

    #[test]
    fn string_length_boundary() {
        let keywords = keyword_table();
        let ok = format!("\"{}\"\n", "s".repeat(511));
        let mut lexer = Lexer::from_source(&ok);
        assert!(matches!(lexer.next(&keywords).unwrap(), Token::Str(s) if s.len() == 511));

        let too_long = format!("\"{}\"\n", "s".repeat(513));
        let mut lexer = Lexer::from_source(&too_long);
        assert_eq!(
            lexer.next(&keywords).unwrap_err(),
            "String constant too long"
        );
    }

    #[test]
    fn unterminated_string_errors() {
        let keywords = keyword_table();
        let mut lexer = Lexer::from_source("\"oops\nx\n");
        assert_eq!(
            lexer.next(&keywords).unwrap_err(),
            "End of line in string constant"
        );
        let mut lexer = Lexer::from_source("\"oops");
        assert_eq!(
            lexer.next(&keywords).unwrap_err(),
            "End of file in string constant"
        );
    }

    #[test]
    fn number_keeps_literal_text() {
        let tokens = lex_all("0.10000000000000001\n");
        assert!(matches!(&tokens[0], Token::Number { text, .. } if text == "0.10000000000000001"));
    }

    #[test]
    fn directives_set_flags() {
        let keywords = keyword_table();
        let mut lexer = Lexer::from_source("#dbg\n#mem2048\n#nonsense\nx\n");
        // Each directive line collapses into its end-of-line token.
        assert_eq!(lexer.next(&keywords).unwrap(), Token::Eol { real: true });
        assert_eq!(lexer.next(&keywords).unwrap(), Token::Eol { real: true });
        assert_eq!(lexer.next(&keywords).unwrap(), Token::Eol { real: true });
        assert_eq!(lexer.next(&keywords).unwrap(), Token::Name("x".to_string()));
        let directives = lexer.directives();
        assert_eq!(directives.runtime_flags, DBG_FLAG);
        assert_eq!(directives.memory_request, 2048);
    }

    #[test]
    fn asm_mode_returns_raw_lines() {
        let keywords = keyword_table();
        let mut lexer = Lexer::from_source("mpush\nmpop\nendasm\n");
        lexer.set_asm_mode(true);
        assert_eq!(lexer.next(&keywords).unwrap(), Token::Str("mpush".into()));
        assert_eq!(lexer.next(&keywords).unwrap(), Token::Str("mpop".into()));
        assert!(lexer.next(&keywords).unwrap().is_keyword(Keyword::EndAsm));
    }

    #[test]
    fn peek_for_char_skips_spaces_only() {
        let keywords = keyword_table();
        let mut lexer = Lexer::from_source("x  : 1]\n");
        lexer.next(&keywords).unwrap();
        assert!(lexer.peek_for_char(':'));
        assert!(!lexer.peek_for_char(']'));
    }
}
