use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use log::debug;

use crate::ir::{IntermediateCode, SymbolTableStack};
use crate::message::{Message, MessageHandler};

use super::Backend;

/// Executor stub: runs nothing yet, one summary event.
pub struct Executor {
    messages: Rc<RefCell<MessageHandler>>,
}

impl Executor {
    pub fn new(messages: Rc<RefCell<MessageHandler>>) -> Self {
        Self { messages }
    }
}

impl Backend for Executor {
    fn process(&mut self, _intermediate_code: &IntermediateCode, _symbols: &SymbolTableStack) {
        let started = Instant::now();
        let execution_count = 0;
        let runtime_errors = 0;
        debug!("execution pass (stub)");

        self.messages.borrow_mut().send(&Message::InterpreterSummary {
            execution_count,
            runtime_errors,
            elapsed: started.elapsed(),
        });
    }
}
