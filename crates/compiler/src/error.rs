//! Compiler error type.
//!
//! Every diagnostic renders as `<filename>:<line>: error: <message>`; the
//! first error aborts the compile and propagates to the driver through
//! `Result`, which also unwinds open include files and scope tables by
//! ordinary ownership.

use std::fmt;

/// A compile-time diagnostic.
#[derive(Debug)]
pub struct CompileError {
    position: Option<(String, usize)>,
    message: String,
}

impl CompileError {
    /// Error anchored to a source position.
    pub fn at(file: &str, line: usize, message: impl Into<String>) -> Self {
        CompileError {
            position: Some((file.to_string(), line)),
            message: message.into(),
        }
    }

    /// File-level error with no source position (unreadable input and the
    /// like).
    pub fn bare(message: impl Into<String>) -> Self {
        CompileError {
            position: None,
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some((file, line)) => write!(f, "{}:{}: error: {}", file, line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CompileError {}

pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positioned_error_format() {
        let err = CompileError::at("game.n7", 12, "Expected 'wend'");
        assert_eq!(err.to_string(), "game.n7:12: error: Expected 'wend'");
    }

    #[test]
    fn bare_error_format() {
        let err = CompileError::bare("Could not open file 'x.n7' for reading");
        assert_eq!(err.to_string(), "Could not open file 'x.n7' for reading");
    }
}
