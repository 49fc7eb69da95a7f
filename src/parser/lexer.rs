//! Token extraction.
//!
//! The scanner owns the character cursor and hands the parser exactly one
//! token at a time. Lexical failures never unwind: they come back as error
//! tokens and scanning resumes at the next character.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::error::{CompileError, SyntaxErrorKind};
use crate::message::{Message, MessageHandler};
use crate::source::Source;

use super::token::{Token, TokenType, Value};

pub struct Scanner {
    source: Source,
    current: Token,
    messages: Rc<RefCell<MessageHandler>>,
}

impl Scanner {
    pub fn new(source: Source, messages: Rc<RefCell<MessageHandler>>) -> Self {
        Self {
            source,
            current: Token::eof(0, 0),
            messages,
        }
    }

    /// The token most recently produced by [`next_token`](Self::next_token).
    pub fn current_token(&self) -> &Token {
        &self.current
    }

    pub fn next_token(&mut self) -> Result<&Token, CompileError> {
        let token = self.extract_token()?;
        trace!("scanned {token:?}");
        if !token.is_eof() {
            self.messages.borrow_mut().send(&Message::Token {
                line_number: token.line_number,
                position: token.position,
                token_type: token.token_type,
                text: token.text.clone(),
                value: token.value.clone(),
            });
        }
        self.current = token;
        Ok(&self.current)
    }

    fn extract_token(&mut self) -> Result<Token, CompileError> {
        let current = self.skip_whitespace_and_comments()?;
        let line_number = self.source.line_number();
        let position = self.source.position();

        match current {
            None => Ok(Token::eof(line_number, position)),
            Some(c) if c.is_ascii_alphabetic() => self.extract_word(),
            Some('\'') => self.extract_string(),
            Some(c) if TokenType::is_symbol_start(c) => self.extract_symbol(c),
            Some(c) if c.is_ascii_digit() => self.extract_number(),
            Some(c) => {
                self.source.next()?;
                Ok(Token::error(
                    SyntaxErrorKind::InvalidCharacter,
                    c.to_string(),
                    line_number,
                    position,
                ))
            }
        }
    }

    /// Skip runs of whitespace, then a `{ ... }` comment, repeating until
    /// neither applies. An unterminated comment simply ends at end of file.
    fn skip_whitespace_and_comments(&mut self) -> Result<Option<char>, CompileError> {
        let mut current = self.source.current()?;
        loop {
            match current {
                Some(c) if c.is_whitespace() => current = self.source.next()?,
                Some('{') => {
                    loop {
                        match self.source.next()? {
                            Some('}') => break,
                            Some(_) => {}
                            None => return Ok(None),
                        }
                    }
                    current = self.source.next()?;
                }
                _ => return Ok(current),
            }
        }
    }

    fn extract_word(&mut self) -> Result<Token, CompileError> {
        let line_number = self.source.line_number();
        let position = self.source.position();

        let mut text = String::new();
        while let Some(c) = self.source.current()? {
            if !c.is_ascii_alphanumeric() {
                break;
            }
            text.push(c);
            self.source.next()?;
        }

        let token_type = TokenType::reserved_word(&text).unwrap_or(TokenType::Identifier);
        Ok(Token::new(token_type, text, None, line_number, position))
    }

    /// String literal: `'...'` with `''` as an escaped quote. The decoded
    /// value strips only the outer quotes; doubled quotes stay doubled.
    fn extract_string(&mut self) -> Result<Token, CompileError> {
        let line_number = self.source.line_number();
        let position = self.source.position();

        let mut text = String::from('\'');
        loop {
            match self.source.next()? {
                None => {
                    return Ok(Token::error(
                        SyntaxErrorKind::UnexpectedEof,
                        text,
                        line_number,
                        position,
                    ));
                }
                Some('\'') => {
                    text.push('\'');
                    if self.source.next()? == Some('\'') {
                        text.push('\'');
                    } else {
                        break;
                    }
                }
                Some(c) => text.push(c),
            }
        }

        let value = text[1..text.len() - 1].to_owned();
        Ok(Token::new(
            TokenType::String,
            text,
            Some(Value::Str(value)),
            line_number,
            position,
        ))
    }

    /// Longest-match symbol extraction: two-character sequences first, then
    /// the single character.
    fn extract_symbol(&mut self, first: char) -> Result<Token, CompileError> {
        let line_number = self.source.line_number();
        let position = self.source.position();

        let mut text = first.to_string();
        if let Some(second) = self.source.next()? {
            let two_characters = format!("{first}{second}");
            if matches!(two_characters.as_str(), ":=" | "<=" | ">=" | "<>" | "..") {
                self.source.next()?;
                text = two_characters;
            }
        }

        match TokenType::symbol(&text) {
            Some(token_type) => Ok(Token::new(token_type, text, None, line_number, position)),
            None => Ok(Token::error(
                SyntaxErrorKind::Unrecognizable,
                text,
                line_number,
                position,
            )),
        }
    }

    fn extract_number(&mut self) -> Result<Token, CompileError> {
        let line_number = self.source.line_number();
        let position = self.source.position();

        let mut token_type = TokenType::Integer;
        let whole_digits = self.extract_unsigned_integer()?;
        let mut text = whole_digits.clone();
        let mut fraction_digits = String::new();
        let mut exponent_digits = String::new();
        let mut exponent_sign = '+';

        let mut current = self.source.current()?;
        if current == Some('.') {
            // Two-character lookahead: `..` is the range operator, not a
            // fraction, and belongs to the next token.
            if self.source.peek()? == Some('.') {
                return Ok(self.integer_token(text, line_number, position));
            }
            if self.source.peek()?.is_some_and(|c| c.is_ascii_digit()) {
                self.source.next()?;
                token_type = TokenType::Real;
                fraction_digits = self.extract_unsigned_integer()?;
                text.push('.');
                text.push_str(&fraction_digits);
                current = self.source.current()?;
            }
        }

        if matches!(current, Some('e') | Some('E')) {
            token_type = TokenType::Real;
            text.push(current.unwrap_or('e'));

            let mut c = self.source.next()?;
            if matches!(c, Some('+') | Some('-')) {
                exponent_sign = c.unwrap_or('+');
                text.push(exponent_sign);
                c = self.source.next()?;
            }
            if !c.is_some_and(|c| c.is_ascii_digit()) {
                return Ok(Token::error(
                    SyntaxErrorKind::InvalidNumber,
                    text,
                    line_number,
                    position,
                ));
            }
            exponent_digits = self.extract_unsigned_integer()?;
            text.push_str(&exponent_digits);
        }

        if token_type == TokenType::Integer {
            return Ok(self.integer_token(text, line_number, position));
        }

        match compute_float_value(&whole_digits, &fraction_digits, &exponent_digits, exponent_sign)
        {
            Ok(value) => Ok(Token::new(
                TokenType::Real,
                text,
                Some(Value::Real(value)),
                line_number,
                position,
            )),
            Err(kind) => Ok(Token::error(kind, text, line_number, position)),
        }
    }

    fn integer_token(&self, text: String, line_number: usize, position: usize) -> Token {
        match compute_integer_value(&text) {
            Ok(value) => Token::new(
                TokenType::Integer,
                text,
                Some(Value::Integer(value)),
                line_number,
                position,
            ),
            Err(kind) => Token::error(kind, text, line_number, position),
        }
    }

    fn extract_unsigned_integer(&mut self) -> Result<String, CompileError> {
        let mut digits = String::new();
        while let Some(c) = self.source.current()? {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            self.source.next()?;
        }
        Ok(digits)
    }
}

/// Fold digits as 10·acc + digit with checked arithmetic; overflow is the
/// range error, not a panic.
fn compute_integer_value(digits: &str) -> Result<i64, SyntaxErrorKind> {
    digits.chars().try_fold(0i64, |acc, digit| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add((digit as u8 - b'0') as i64))
            .ok_or(SyntaxErrorKind::RangeInteger)
    })
}

/// Whole and fraction digits form an integer mantissa scaled by
/// 10^(exponent − fraction length).
fn compute_float_value(
    whole_digits: &str,
    fraction_digits: &str,
    exponent_digits: &str,
    exponent_sign: char,
) -> Result<f64, SyntaxErrorKind> {
    let mut exponent = if exponent_digits.is_empty() {
        0
    } else {
        compute_integer_value(exponent_digits)?
    };
    if exponent_sign == '-' {
        exponent = -exponent;
    }
    exponent -= fraction_digits.len() as i64;

    let mut value = whole_digits
        .chars()
        .chain(fraction_digits.chars())
        .fold(0f64, |acc, digit| {
            10.0 * acc + (digit as u8 - b'0') as f64
        });
    if exponent != 0 {
        value *= 10f64.powf(exponent as f64);
    }

    if !value.is_finite() {
        return Err(SyntaxErrorKind::RangeReal);
    }
    Ok(value)
}
