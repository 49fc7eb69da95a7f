//! Backend boundary. The front end hands over one tree and one symbol-table
//! stack; both backends here are stubs that only time themselves and emit a
//! summary event.

pub mod compiler;
pub mod executor;

use std::cell::RefCell;
use std::rc::Rc;

use crate::ir::{IntermediateCode, SymbolTableStack};
use crate::message::MessageHandler;

pub trait Backend {
    fn process(&mut self, intermediate_code: &IntermediateCode, symbols: &SymbolTableStack);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Compile,
    Execute,
}

impl Operation {
    pub fn create_backend(self, messages: Rc<RefCell<MessageHandler>>) -> Box<dyn Backend> {
        match self {
            Operation::Compile => Box::new(compiler::CodeGenerator::new(messages)),
            Operation::Execute => Box::new(executor::Executor::new(messages)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn run(operation: Operation) -> Vec<Message> {
        let messages = MessageHandler::shared();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        messages
            .borrow_mut()
            .add_listener(Box::new(move |message| sink.borrow_mut().push(message.clone())));

        let icode = IntermediateCode::new();
        let symbols = SymbolTableStack::new();
        operation
            .create_backend(Rc::clone(&messages))
            .process(&icode, &symbols);
        let messages = seen.borrow().clone();
        messages
    }

    #[test]
    fn compile_emits_one_compiler_summary() {
        let messages = run(Operation::Compile);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            Message::CompilerSummary {
                instruction_count: 0,
                ..
            }
        ));
    }

    #[test]
    fn execute_emits_one_interpreter_summary() {
        let messages = run(Operation::Execute);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            messages[0],
            Message::InterpreterSummary {
                execution_count: 0,
                runtime_errors: 0,
                ..
            }
        ));
    }
}
