use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use log::debug;

use crate::ir::{IntermediateCode, SymbolTableStack};
use crate::message::{Message, MessageHandler};

use super::Backend;

/// Code-generator stub: no instructions yet, one summary event.
pub struct CodeGenerator {
    messages: Rc<RefCell<MessageHandler>>,
}

impl CodeGenerator {
    pub fn new(messages: Rc<RefCell<MessageHandler>>) -> Self {
        Self { messages }
    }
}

impl Backend for CodeGenerator {
    fn process(&mut self, _intermediate_code: &IntermediateCode, _symbols: &SymbolTableStack) {
        let started = Instant::now();
        let instruction_count = 0;
        debug!("code generation pass (stub)");

        self.messages.borrow_mut().send(&Message::CompilerSummary {
            instruction_count,
            elapsed: started.elapsed(),
        });
    }
}
