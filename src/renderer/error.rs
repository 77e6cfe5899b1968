//! Errors raised while executing a template body

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{ParseError, Span};

/// Category of an execution error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Syntax,
    Read,
    UndefinedVariable,
    UnknownFunction,
    Argument,
    IncludeDepth,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Syntax => "syntax",
            ErrorCode::Read => "read",
            ErrorCode::UndefinedVariable => "undefined-variable",
            ErrorCode::UnknownFunction => "unknown-function",
            ErrorCode::Argument => "argument",
            ErrorCode::IncludeDepth => "include-depth",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable failure while rendering one template file
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{code} error in template \"{}\"{}: {message}", file.display(), line_suffix(*line))]
pub struct ExecutionError {
    pub code: ErrorCode,
    pub file: PathBuf,
    pub message: String,
    /// 1-based line of the offending tag
    pub line: Option<usize>,
}

fn line_suffix(line: Option<usize>) -> String {
    line.map(|l| format!(" on line {}", l)).unwrap_or_default()
}

impl ExecutionError {
    pub fn new(code: ErrorCode, file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            code,
            file: file.into(),
            message: message.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Collapse the syntax errors of one file into a single execution error
    pub fn from_parse(file: &Path, source: &str, errors: &[ParseError]) -> Self {
        let message = errors
            .iter()
            .map(|e| e.message().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        let error = Self::new(ErrorCode::Syntax, file, message);
        match errors.first() {
            Some(first) => error.with_line(line_of(source, first.span())),
            None => error,
        }
    }
}

/// 1-based line number of the start of `span`
pub fn line_of(source: &str, span: &Span) -> usize {
    let end = span.start.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
