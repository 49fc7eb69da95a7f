//! Publish/subscribe channel decoupling the front end from presentation.
//!
//! The core only emits; whoever builds the pipeline registers listeners and
//! decides which events to render.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::parser::{TokenType, Value};

#[derive(Debug, Clone)]
pub enum Message {
    /// A source line became available to the cursor.
    SourceLine {
        line_number: usize,
        text: String,
    },
    /// A token was scanned.
    Token {
        line_number: usize,
        position: usize,
        token_type: TokenType,
        text: String,
        value: Option<Value>,
    },
    /// A recoverable error was flagged.
    SyntaxError {
        line_number: usize,
        position: usize,
        text: String,
        message: String,
    },
    /// The parse finished.
    ParserSummary {
        line_number: usize,
        error_count: usize,
        elapsed: Duration,
    },
    CompilerSummary {
        instruction_count: usize,
        elapsed: Duration,
    },
    InterpreterSummary {
        execution_count: usize,
        runtime_errors: usize,
        elapsed: Duration,
    },
}

pub type MessageListener = Box<dyn FnMut(&Message)>;

/// Listener registry. One handler is shared by the source, the scanner, the
/// parser, and the backend of a single run.
#[derive(Default)]
pub struct MessageHandler {
    listeners: Vec<MessageListener>,
}

impl MessageHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared handle the pipeline components clone among themselves.
    pub fn shared() -> Rc<RefCell<MessageHandler>> {
        Rc::new(RefCell::new(MessageHandler::new()))
    }

    pub fn add_listener(&mut self, listener: MessageListener) {
        self.listeners.push(listener);
    }

    pub fn send(&mut self, message: &Message) {
        for listener in &mut self.listeners {
            listener(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_receive_messages_in_order() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);

        let mut handler = MessageHandler::new();
        handler.add_listener(Box::new(move |message| {
            if let Message::SourceLine { line_number, .. } = message {
                sink.borrow_mut().push(*line_number);
            }
        }));

        for line_number in 1..=3 {
            handler.send(&Message::SourceLine {
                line_number,
                text: String::new(),
            });
        }

        assert_eq!(*received.borrow(), vec![1, 2, 3]);
    }
}
