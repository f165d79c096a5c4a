//! Assembler error type.

use std::fmt;

/// Error raised while assembling an n7a file.
///
/// Carries the position of the offending line when one is known; file-level
/// failures (unreadable input, unwritable output) have no position.
#[derive(Debug)]
pub struct AsmError {
    pub file: Option<String>,
    pub line: usize,
    pub message: String,
}

impl AsmError {
    pub fn at(file: &str, line: usize, message: impl Into<String>) -> Self {
        AsmError {
            file: Some(file.to_string()),
            line,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        AsmError {
            file: None,
            line: 0,
            message: message.into(),
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}: error: {}", file, self.line, self.message),
            None => write!(f, "error: {}", self.message),
        }
    }
}

impl std::error::Error for AsmError {}
