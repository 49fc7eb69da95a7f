use thiserror::Error;

/// Unrecoverable conditions. Everything else the front end reports through
/// the diagnostic channel and keeps parsing.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Too many syntax errors")]
    TooManyErrors,

    #[error("Object I/O error")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Process exit status associated with the fatal condition.
    pub fn status(&self) -> i32 {
        match self {
            CompileError::TooManyErrors => -102,
            CompileError::Io { .. } => -101,
        }
    }
}

/// A recoverable lexical or syntax error. Lexical kinds ride inside error
/// tokens; syntax kinds are flagged directly by the parser.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    #[error("Invalid character")]
    InvalidCharacter,
    #[error("Invalid number")]
    InvalidNumber,
    #[error("Integer literal out of range")]
    RangeInteger,
    #[error("Real literal out of range")]
    RangeReal,
    #[error("Unrecognizable input")]
    Unrecognizable,
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Unexpected token")]
    UnexpectedToken,
    #[error("Missing BEGIN")]
    MissingBegin,
    #[error("Missing END")]
    MissingEnd,
    #[error("Missing ;")]
    MissingSemicolon,
    #[error("Missing :=")]
    MissingColonEquals,
    #[error("Missing identifier")]
    MissingIdentifier,
    #[error("Missing )")]
    MissingRightParen,
    #[error("Missing .")]
    MissingDot,
}
