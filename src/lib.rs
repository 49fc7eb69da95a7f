//! Front end for a Pascal-like toy language: a line-buffered character
//! cursor, a single-lookahead scanner, a recursive-descent parser with
//! bounded error recovery, a scoped symbol-table stack, and an
//! intermediate-code tree, all reporting through a publish/subscribe
//! diagnostic channel. Backends are stubs that emit summary statistics.

pub mod backends;
pub mod error;
pub mod ir;
pub mod message;
pub mod parser;
pub mod source;

pub use backends::{Backend, Operation};
pub use error::{CompileError, SyntaxErrorKind};
pub use message::{Message, MessageHandler};
pub use parser::{ParseOutcome, Parser, Scanner, Token, TokenType, Value};
pub use source::{BufferedLineReader, Source};
