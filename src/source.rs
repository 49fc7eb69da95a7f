//! Line-buffered cursor over the raw input.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Cursor};
use std::rc::Rc;

use log::trace;

use crate::error::CompileError;
use crate::message::{Message, MessageHandler};

/// End-of-line sentinel returned once per line, at position == line length.
pub const EOL: char = '\n';

/// How many lines may be read ahead of the cursor.
const BUFFER_SIZE: usize = 10;

/// Reads the underlying input at most [`BUFFER_SIZE`] lines ahead, so memory
/// stays bounded no matter how large the input is.
pub struct BufferedLineReader {
    input: Box<dyn BufRead>,
    buffered: VecDeque<String>,
    at_eof: bool,
}

impl BufferedLineReader {
    pub fn new(input: Box<dyn BufRead>) -> Self {
        Self {
            input,
            buffered: VecDeque::new(),
            at_eof: false,
        }
    }

    /// Next line without its trailing newline, or `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        if self.buffered.is_empty() {
            self.fill()?;
        }
        Ok(self.buffered.pop_front())
    }

    fn fill(&mut self) -> io::Result<()> {
        while !self.at_eof && self.buffered.len() < BUFFER_SIZE {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                self.at_eof = true;
                break;
            }
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            self.buffered.push_back(line);
        }
        Ok(())
    }
}

/// Character cursor over the line supply.
///
/// `position` is the zero-based index into the current line; `-2` means no
/// line has been read yet and `-1` means a line was just read but not yet
/// entered. Position `== line length` yields the [`EOL`] sentinel; a missing
/// line yields `None`, the end-of-file sentinel.
pub struct Source {
    reader: BufferedLineReader,
    line: Option<Vec<char>>,
    position: isize,
    line_number: usize,
    messages: Rc<RefCell<MessageHandler>>,
}

impl Source {
    pub fn new(reader: BufferedLineReader, messages: Rc<RefCell<MessageHandler>>) -> Self {
        Self {
            reader,
            line: None,
            position: -2,
            line_number: 0,
            messages,
        }
    }

    /// Cursor over an in-memory string; used by the tests and the tools that
    /// feed the front end without a file.
    pub fn from_string(text: &str, messages: Rc<RefCell<MessageHandler>>) -> Self {
        let reader = BufferedLineReader::new(Box::new(Cursor::new(text.to_owned())));
        Self::new(reader, messages)
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Cursor position clamped into the current line, for token construction.
    pub fn position(&self) -> usize {
        self.position.max(0) as usize
    }

    /// Character at the cursor without advancing.
    pub fn current(&mut self) -> Result<Option<char>, CompileError> {
        if self.position == -2 {
            self.read_line()?;
            return self.next();
        }

        let Some(line) = self.line.as_ref() else {
            return Ok(None);
        };
        let length = line.len() as isize;

        if self.position == -1 || self.position == length {
            Ok(Some(EOL))
        } else if self.position > length {
            self.read_line()?;
            self.next()
        } else {
            Ok(Some(line[self.position as usize]))
        }
    }

    /// Advance, then return the character at the cursor. On a fresh source
    /// the first line is read before the advance, so `next` lands on the
    /// first character just as `current` would.
    pub fn next(&mut self) -> Result<Option<char>, CompileError> {
        if self.position == -2 {
            self.read_line()?;
        }
        self.position += 1;
        self.current()
    }

    /// Character one position ahead, without advancing. Collapses to the EOL
    /// sentinel at the line boundary and to `None` past the last line.
    pub fn peek(&mut self) -> Result<Option<char>, CompileError> {
        self.current()?;
        let Some(line) = self.line.as_ref() else {
            return Ok(None);
        };

        let next_position = self.position + 1;
        if next_position < line.len() as isize {
            Ok(Some(line[next_position as usize]))
        } else {
            Ok(Some(EOL))
        }
    }

    fn read_line(&mut self) -> Result<(), CompileError> {
        let text = self.reader.read_line()?;
        self.position = -1;
        match text {
            Some(text) => {
                self.line_number += 1;
                trace!("line {}: {text}", self.line_number);
                self.messages.borrow_mut().send(&Message::SourceLine {
                    line_number: self.line_number,
                    text: text.clone(),
                });
                self.line = Some(text.chars().collect());
            }
            None => self.line = None,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> Source {
        Source::from_string(text, MessageHandler::shared())
    }

    #[test]
    fn current_does_not_advance() {
        let mut source = source("ab");
        assert_eq!(source.current().unwrap(), Some('a'));
        assert_eq!(source.current().unwrap(), Some('a'));
        assert_eq!(source.next().unwrap(), Some('b'));
    }

    #[test]
    fn next_as_first_operation_reads_the_first_line() {
        let mut cursor = source("ab\ncd");
        assert_eq!(cursor.next().unwrap(), Some('a'));
        assert_eq!(cursor.next().unwrap(), Some('b'));
        assert_eq!(cursor.line_number(), 1);

        let mut empty = source("");
        assert_eq!(empty.next().unwrap(), None);
    }

    #[test]
    fn eol_sentinel_once_per_line() {
        let mut source = source("ab\ncd");
        assert_eq!(source.current().unwrap(), Some('a'));
        assert_eq!(source.next().unwrap(), Some('b'));
        assert_eq!(source.next().unwrap(), Some(EOL));
        assert_eq!(source.next().unwrap(), Some('c'));
        assert_eq!(source.line_number(), 2);
    }

    #[test]
    fn peek_collapses_to_eol_at_line_boundary() {
        let mut source = source("ab\ncd");
        source.current().unwrap();
        source.next().unwrap(); // 'b', last character
        assert_eq!(source.peek().unwrap(), Some(EOL));
        // Peeking never advances.
        assert_eq!(source.current().unwrap(), Some('b'));
    }

    #[test]
    fn eof_after_last_line() {
        let mut source = source("x");
        assert_eq!(source.current().unwrap(), Some('x'));
        assert_eq!(source.next().unwrap(), Some(EOL));
        assert_eq!(source.next().unwrap(), None);
        assert_eq!(source.next().unwrap(), None);
    }

    #[test]
    fn empty_input_is_immediately_eof() {
        let mut source = source("");
        assert_eq!(source.current().unwrap(), None);
        assert_eq!(source.line_number(), 0);
    }

    #[test]
    fn empty_lines_yield_eol() {
        let mut source = source("a\n\nb");
        assert_eq!(source.current().unwrap(), Some('a'));
        assert_eq!(source.next().unwrap(), Some(EOL));
        assert_eq!(source.next().unwrap(), Some(EOL));
        assert_eq!(source.next().unwrap(), Some('b'));
        assert_eq!(source.line_number(), 3);
    }

    #[test]
    fn source_line_messages_are_emitted() {
        let messages = MessageHandler::shared();
        let seen = std::rc::Rc::new(RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&seen);
        messages.borrow_mut().add_listener(Box::new(move |message| {
            if let Message::SourceLine { line_number, text } = message {
                sink.borrow_mut().push((*line_number, text.clone()));
            }
        }));

        let mut source = Source::from_string("one\ntwo", messages);
        while source.next().unwrap().is_some() {}

        assert_eq!(
            *seen.borrow(),
            vec![(1, "one".to_owned()), (2, "two".to_owned())]
        );
    }

    #[test]
    fn reader_buffers_at_most_ten_lines() {
        let text = (0..25).map(|i| format!("line{i}\n")).collect::<String>();
        let mut reader = BufferedLineReader::new(Box::new(Cursor::new(text)));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("line0"));
        assert!(reader.buffered.len() < BUFFER_SIZE);
        for i in 1..25 {
            assert_eq!(reader.read_line().unwrap(), Some(format!("line{i}")));
        }
        assert_eq!(reader.read_line().unwrap(), None);
    }
}
