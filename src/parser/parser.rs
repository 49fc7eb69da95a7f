//! Recursive-descent parser for the compound/assignment/expression subset.
//!
//! One `Parser` context owns everything a parse mutates: the scanner, the
//! symbol-table stack, the tree under construction, and the error counter.
//! Productions are ordinary methods on the context. Recoverable errors are
//! flagged and parsing continues; only the 25-error threshold (and an I/O
//! fault) unwinds, as `Err` all the way out of `parse`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use log::debug;

use crate::error::{CompileError, SyntaxErrorKind};
use crate::ir::{
    EntryId, IntermediateCode, LookupScope, NodeAttribute, NodeId, NodeKey, NodeType, SymbolAttribute,
    SymbolTableKey, SymbolTableStack,
};
use crate::message::{Message, MessageHandler};

use super::lexer::Scanner;
use super::token::{Token, TokenType};

/// Hard ceiling on recoverable errors per run.
pub const MAX_ERRORS: usize = 25;

/// What a finished parse hands to the backend.
pub struct ParseOutcome {
    pub intermediate_code: IntermediateCode,
    pub symbols: SymbolTableStack,
    pub error_count: usize,
}

/// Counts and reports recoverable errors; trips the fatal threshold.
struct ErrorHandler {
    error_count: usize,
}

impl ErrorHandler {
    fn new() -> Self {
        Self { error_count: 0 }
    }

    fn flag(
        &mut self,
        token: &Token,
        kind: SyntaxErrorKind,
        messages: &Rc<RefCell<MessageHandler>>,
    ) -> Result<(), CompileError> {
        self.error_count += 1;
        messages.borrow_mut().send(&Message::SyntaxError {
            line_number: token.line_number,
            position: token.position,
            text: token.text.clone(),
            message: kind.to_string(),
        });

        if self.error_count >= MAX_ERRORS {
            return Err(CompileError::TooManyErrors);
        }
        Ok(())
    }
}

pub struct Parser {
    scanner: Scanner,
    symbols: SymbolTableStack,
    icode: IntermediateCode,
    errors: ErrorHandler,
    messages: Rc<RefCell<MessageHandler>>,
}

impl Parser {
    pub fn new(scanner: Scanner, messages: Rc<RefCell<MessageHandler>>) -> Self {
        Self {
            scanner,
            symbols: SymbolTableStack::new(),
            icode: IntermediateCode::new(),
            errors: ErrorHandler::new(),
            messages,
        }
    }

    /// Parse the whole input: a compound statement followed by `.`, then a
    /// drain to the end-of-file token. Emits one `ParserSummary`.
    pub fn parse(mut self) -> Result<ParseOutcome, CompileError> {
        let started = Instant::now();
        self.next_token()?;

        let root = if self.current_type() == TokenType::Begin {
            let root = self.parse_statement()?;
            if self.current_type() == TokenType::Dot {
                self.next_token()?;
            } else {
                self.flag_current(SyntaxErrorKind::MissingDot)?;
            }
            root
        } else {
            self.flag_current(SyntaxErrorKind::UnexpectedToken)?;
            let line = self.scanner.current_token().line_number;
            let noop = self.icode.create(NodeType::Noop);
            self.icode
                .set_attribute(noop, NodeKey::Line, NodeAttribute::Line(line));
            noop
        };
        self.icode.set_root(root);
        debug!("root node attached, {} errors so far", self.errors.error_count);

        while !self.scanner.current_token().is_eof() {
            self.next_token()?;
        }

        self.messages.borrow_mut().send(&Message::ParserSummary {
            line_number: self.scanner.current_token().line_number,
            error_count: self.errors.error_count,
            elapsed: started.elapsed(),
        });

        Ok(ParseOutcome {
            intermediate_code: self.icode,
            symbols: self.symbols,
            error_count: self.errors.error_count,
        })
    }

    /// Advance the scanner, flagging and skipping error tokens so that the
    /// productions only ever see well-formed tokens.
    fn next_token(&mut self) -> Result<(), CompileError> {
        loop {
            self.scanner.next_token()?;
            let TokenType::Error(kind) = self.scanner.current_token().token_type else {
                return Ok(());
            };
            self.flag_current(kind)?;
        }
    }

    fn current_type(&self) -> TokenType {
        self.scanner.current_token().token_type
    }

    fn flag_current(&mut self, kind: SyntaxErrorKind) -> Result<(), CompileError> {
        let token = self.scanner.current_token().clone();
        self.errors.flag(&token, kind, &self.messages)
    }

    fn node_at_line(&mut self, node_type: NodeType, line: usize) -> NodeId {
        let node = self.icode.create(node_type);
        self.icode
            .set_attribute(node, NodeKey::Line, NodeAttribute::Line(line));
        node
    }

    /// Dispatch on the current token. Anything that is not a statement start
    /// is consumed and becomes a no-op node; the list parser reports the
    /// separator damage.
    fn parse_statement(&mut self) -> Result<NodeId, CompileError> {
        let line = self.scanner.current_token().line_number;
        match self.current_type() {
            TokenType::Begin => self.parse_compound(),
            TokenType::Identifier => self.parse_assignment(),
            _ => {
                self.next_token()?;
                Ok(self.node_at_line(NodeType::Noop, line))
            }
        }
    }

    /// `BEGIN` statement-list `END`.
    fn parse_compound(&mut self) -> Result<NodeId, CompileError> {
        let line = self.scanner.current_token().line_number;
        if self.current_type() == TokenType::Begin {
            self.next_token()?;
        } else {
            self.flag_current(SyntaxErrorKind::MissingBegin)?;
        }

        let compound = self.node_at_line(NodeType::Compound, line);
        self.parse_statement_list(compound, TokenType::End)?;

        if self.current_type() == TokenType::End {
            self.next_token()?;
        } else {
            self.flag_current(SyntaxErrorKind::MissingEnd)?;
        }
        Ok(compound)
    }

    /// Statements terminated by `;`, synchronizing on `terminator`. A missing
    /// semicolon is flagged but never stops the parse; end of file before the
    /// terminator is flagged once.
    fn parse_statement_list(
        &mut self,
        parent: NodeId,
        terminator: TokenType,
    ) -> Result<(), CompileError> {
        loop {
            let current = self.current_type();
            if current == TokenType::EndOfFile {
                self.flag_current(SyntaxErrorKind::UnexpectedEof)?;
                break;
            }
            if current == terminator {
                break;
            }

            let statement = self.parse_statement()?;
            self.icode.add_child(parent, statement);

            match self.current_type() {
                TokenType::Semicolon => self.next_token()?,
                TokenType::EndOfFile => {}
                _ => self.flag_current(SyntaxErrorKind::MissingSemicolon)?,
            }
        }
        Ok(())
    }

    /// identifier `:=` expression. The target resolves through the whole
    /// stack, entering the local scope on a miss, and records the occurrence
    /// line for the cross-reference.
    fn parse_assignment(&mut self) -> Result<NodeId, CompileError> {
        let token = self.scanner.current_token().clone();
        let assign = self.node_at_line(NodeType::Assign, token.line_number);

        let variable = self.node_at_line(NodeType::Variable, token.line_number);
        if token.token_type == TokenType::Identifier {
            let entry = self.resolve_identifier(&token);
            self.symbols
                .entry_mut(entry)
                .set_attribute(SymbolTableKey::Kind, SymbolAttribute::Variable);
            self.icode
                .set_attribute(variable, NodeKey::Id, NodeAttribute::Id(entry));
            self.next_token()?;
        } else {
            self.flag_current(SyntaxErrorKind::MissingIdentifier)?;
        }
        self.icode.add_child(assign, variable);

        if self.current_type() == TokenType::ColonEquals {
            self.next_token()?;
        } else {
            // Recover as if the := had been present.
            self.flag_current(SyntaxErrorKind::MissingColonEquals)?;
        }

        let expression = self.parse_expression()?;
        self.icode.add_child(assign, expression);
        Ok(assign)
    }

    fn resolve_identifier(&mut self, token: &Token) -> EntryId {
        let entry = self.symbols.lookup_or_enter(&token.text, LookupScope::All);
        self.symbols
            .entry_mut(entry)
            .append_line_number(token.line_number);
        entry
    }

    /// simple-expression [ relop simple-expression ]; relational operators
    /// do not chain.
    fn parse_expression(&mut self) -> Result<NodeId, CompileError> {
        let node = self.parse_simple_expression()?;

        let Some(op_type) = relational_operator(self.current_type()) else {
            return Ok(node);
        };
        let line = self.scanner.current_token().line_number;
        let operator = self.node_at_line(op_type, line);
        self.next_token()?;

        let right = self.parse_simple_expression()?;
        self.icode.add_child(operator, node);
        self.icode.add_child(operator, right);
        Ok(operator)
    }

    /// [ sign ] term { (+|-|OR) term }, left-folded.
    fn parse_simple_expression(&mut self) -> Result<NodeId, CompileError> {
        let sign_line = self.scanner.current_token().line_number;
        let sign = match self.current_type() {
            TokenType::Plus | TokenType::Minus => {
                let sign = self.current_type();
                self.next_token()?;
                Some(sign)
            }
            _ => None,
        };

        let mut node = self.parse_term()?;
        if sign == Some(TokenType::Minus) {
            let negate = self.node_at_line(NodeType::Negate, sign_line);
            self.icode.add_child(negate, node);
            node = negate;
        }

        loop {
            let op_type = match self.current_type() {
                TokenType::Plus => NodeType::Add,
                TokenType::Minus => NodeType::Subtract,
                TokenType::Or => NodeType::Or,
                _ => break,
            };
            let line = self.scanner.current_token().line_number;
            let operator = self.node_at_line(op_type, line);
            self.next_token()?;

            let right = self.parse_term()?;
            self.icode.add_child(operator, node);
            self.icode.add_child(operator, right);
            node = operator;
        }
        Ok(node)
    }

    /// factor { (*|/|DIV|MOD|AND) factor }, left-folded.
    fn parse_term(&mut self) -> Result<NodeId, CompileError> {
        let mut node = self.parse_factor()?;

        loop {
            let op_type = match self.current_type() {
                TokenType::Star => NodeType::Multiply,
                TokenType::Slash => NodeType::FloatDivide,
                TokenType::Div => NodeType::IntegerDivide,
                TokenType::Mod => NodeType::Mod,
                TokenType::And => NodeType::And,
                _ => break,
            };
            let line = self.scanner.current_token().line_number;
            let operator = self.node_at_line(op_type, line);
            self.next_token()?;

            let right = self.parse_factor()?;
            self.icode.add_child(operator, node);
            self.icode.add_child(operator, right);
            node = operator;
        }
        Ok(node)
    }

    fn parse_factor(&mut self) -> Result<NodeId, CompileError> {
        let token = self.scanner.current_token().clone();
        match token.token_type {
            TokenType::Identifier => {
                let entry = self.resolve_identifier(&token);
                let variable = self.node_at_line(NodeType::Variable, token.line_number);
                self.icode
                    .set_attribute(variable, NodeKey::Id, NodeAttribute::Id(entry));
                self.next_token()?;
                Ok(variable)
            }
            TokenType::Integer => self.constant_factor(NodeType::IntegerConstant, &token),
            TokenType::Real => self.constant_factor(NodeType::RealConstant, &token),
            TokenType::String => self.constant_factor(NodeType::StringConstant, &token),
            TokenType::Not => {
                self.next_token()?;
                let not = self.node_at_line(NodeType::Not, token.line_number);
                let operand = self.parse_factor()?;
                self.icode.add_child(not, operand);
                Ok(not)
            }
            TokenType::LeftParen => {
                self.next_token()?;
                let node = self.parse_expression()?;
                if self.current_type() == TokenType::RightParen {
                    self.next_token()?;
                } else {
                    self.flag_current(SyntaxErrorKind::MissingRightParen)?;
                }
                Ok(node)
            }
            _ => {
                // Placeholder operand; the offending token is left for the
                // statement list to synchronize on.
                self.flag_current(SyntaxErrorKind::UnexpectedToken)?;
                Ok(self.node_at_line(NodeType::Noop, token.line_number))
            }
        }
    }

    fn constant_factor(
        &mut self,
        node_type: NodeType,
        token: &Token,
    ) -> Result<NodeId, CompileError> {
        let constant = self.node_at_line(node_type, token.line_number);
        if let Some(value) = token.value.clone() {
            self.icode
                .set_attribute(constant, NodeKey::Value, NodeAttribute::Value(value));
        }
        self.next_token()?;
        Ok(constant)
    }
}

fn relational_operator(token_type: TokenType) -> Option<NodeType> {
    let op = match token_type {
        TokenType::Equals => NodeType::Eq,
        TokenType::NotEquals => NodeType::Ne,
        TokenType::LessThan => NodeType::Lt,
        TokenType::LessEquals => NodeType::Le,
        TokenType::GreaterThan => NodeType::Gt,
        TokenType::GreaterEquals => NodeType::Ge,
        _ => return None,
    };
    Some(op)
}
