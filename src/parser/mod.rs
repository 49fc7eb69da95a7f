pub mod lexer;
pub mod parser;
pub mod token;

pub use lexer::Scanner;
pub use parser::{MAX_ERRORS, ParseOutcome, Parser};
pub use token::{Token, TokenType, Value};
