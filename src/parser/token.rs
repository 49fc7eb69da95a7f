use std::fmt;

use crate::error::SyntaxErrorKind;

/// A decoded literal value carried by a token or a constant tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Real(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Lexical classification of a token.
///
/// A lexical failure is not a separate channel: it is the `Error` variant
/// carrying its kind, consumed by the same call sites as any other token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Identifier,
    Integer,
    Real,
    String,
    Error(SyntaxErrorKind),
    EndOfFile,

    // Reserved words
    And,
    Array,
    Begin,
    Case,
    Const,
    Div,
    Do,
    Downto,
    Else,
    End,
    File,
    For,
    Function,
    Goto,
    If,
    In,
    Label,
    Mod,
    Nil,
    Not,
    Of,
    Or,
    Packed,
    Procedure,
    Program,
    Record,
    Repeat,
    Set,
    Then,
    To,
    Type,
    Until,
    Var,
    While,
    With,

    // Symbols
    Plus,
    Minus,
    Star,
    Slash,
    ColonEquals,
    Dot,
    DotDot,
    Comma,
    Semicolon,
    Colon,
    Equals,
    NotEquals,
    LessThan,
    LessEquals,
    GreaterThan,
    GreaterEquals,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    UpCaret,
}

impl TokenType {
    /// Reserved-word lookup, case-insensitive.
    pub fn reserved_word(text: &str) -> Option<TokenType> {
        let word = match text.to_ascii_lowercase().as_str() {
            "and" => TokenType::And,
            "array" => TokenType::Array,
            "begin" => TokenType::Begin,
            "case" => TokenType::Case,
            "const" => TokenType::Const,
            "div" => TokenType::Div,
            "do" => TokenType::Do,
            "downto" => TokenType::Downto,
            "else" => TokenType::Else,
            "end" => TokenType::End,
            "file" => TokenType::File,
            "for" => TokenType::For,
            "function" => TokenType::Function,
            "goto" => TokenType::Goto,
            "if" => TokenType::If,
            "in" => TokenType::In,
            "label" => TokenType::Label,
            "mod" => TokenType::Mod,
            "nil" => TokenType::Nil,
            "not" => TokenType::Not,
            "of" => TokenType::Of,
            "or" => TokenType::Or,
            "packed" => TokenType::Packed,
            "procedure" => TokenType::Procedure,
            "program" => TokenType::Program,
            "record" => TokenType::Record,
            "repeat" => TokenType::Repeat,
            "set" => TokenType::Set,
            "then" => TokenType::Then,
            "to" => TokenType::To,
            "type" => TokenType::Type,
            "until" => TokenType::Until,
            "var" => TokenType::Var,
            "while" => TokenType::While,
            "with" => TokenType::With,
            _ => return None,
        };
        Some(word)
    }

    /// Operator/punctuation lookup by exact text.
    pub fn symbol(text: &str) -> Option<TokenType> {
        let symbol = match text {
            "+" => TokenType::Plus,
            "-" => TokenType::Minus,
            "*" => TokenType::Star,
            "/" => TokenType::Slash,
            ":=" => TokenType::ColonEquals,
            "." => TokenType::Dot,
            ".." => TokenType::DotDot,
            "," => TokenType::Comma,
            ";" => TokenType::Semicolon,
            ":" => TokenType::Colon,
            "=" => TokenType::Equals,
            "<>" => TokenType::NotEquals,
            "<" => TokenType::LessThan,
            "<=" => TokenType::LessEquals,
            ">" => TokenType::GreaterThan,
            ">=" => TokenType::GreaterEquals,
            "(" => TokenType::LeftParen,
            ")" => TokenType::RightParen,
            "[" => TokenType::LeftBracket,
            "]" => TokenType::RightBracket,
            "{" => TokenType::LeftBrace,
            "}" => TokenType::RightBrace,
            "^" => TokenType::UpCaret,
            _ => return None,
        };
        Some(symbol)
    }

    /// Whether `c` can start an operator or punctuation symbol.
    pub fn is_symbol_start(c: char) -> bool {
        matches!(
            c,
            '+' | '-'
                | '*'
                | '/'
                | '.'
                | ','
                | ';'
                | ':'
                | '='
                | '<'
                | '>'
                | '('
                | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | '^'
        )
    }
}

/// A classified, positioned fragment of source text. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,
    pub value: Option<Value>,
    pub line_number: usize,
    pub position: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        text: String,
        value: Option<Value>,
        line_number: usize,
        position: usize,
    ) -> Self {
        Self {
            token_type,
            text,
            value,
            line_number,
            position,
        }
    }

    pub fn eof(line_number: usize, position: usize) -> Self {
        Self::new(TokenType::EndOfFile, String::new(), None, line_number, position)
    }

    /// A pseudo-token folding a lexical error back into the token stream.
    pub fn error(kind: SyntaxErrorKind, text: String, line_number: usize, position: usize) -> Self {
        Self::new(TokenType::Error(kind), text, None, line_number, position)
    }

    pub fn is_eof(&self) -> bool {
        self.token_type == TokenType::EndOfFile
    }
}
