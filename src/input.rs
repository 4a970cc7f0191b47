// Line sources and validation for interactive input
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::debug;

use crate::constants::BACK_TOKENS;
use crate::error::{InputError, SessionError};

/// Source of user input lines.
///
/// Implementations report Ctrl-C as `SessionError::Interrupted` and a closed
/// stream as `SessionError::EndOfInput`.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, SessionError>;
}

/// Reads lines from any buffered reader, echoing the prompt to a writer.
///
/// Used when stdin is not a terminal.
pub struct ReaderInput<R, W> {
    reader: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> ReaderInput<R, W> {
    pub fn new(reader: R, prompt_out: W) -> Self {
        Self { reader, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for ReaderInput<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String, SessionError> {
        write!(self.prompt_out, "{prompt}")?;
        self.prompt_out.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(SessionError::EndOfInput);
        }
        // Keep the transcript readable when input is piped
        writeln!(self.prompt_out)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Pre-recorded lines, for tests and scripted runs.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
    /// Every prompt shown, in order
    pub prompts: Vec<String>,
    interrupt_when_exhausted: bool,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            interrupt_when_exhausted: false,
        }
    }

    /// Report Ctrl-C instead of end of input once the script runs out.
    pub fn interrupt_at_end(mut self) -> Self {
        self.interrupt_when_exhausted = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Result<String, SessionError> {
        self.prompts.push(prompt.to_string());
        match self.lines.pop_front() {
            Some(line) => Ok(line),
            None if self.interrupt_when_exhausted => Err(SessionError::Interrupted),
            None => Err(SessionError::EndOfInput),
        }
    }
}

enum InputEvent {
    Line(Result<String, SessionError>),
    Interrupted,
}

/// Ends a read pending on an [`InterruptibleInput`].
///
/// Cloneable and `Send`, so it can be handed to a signal handler.
#[derive(Debug, Clone)]
pub struct Interrupter {
    events: Sender<InputEvent>,
}

impl Interrupter {
    pub fn interrupt(&self) {
        if self.events.send(InputEvent::Interrupted).is_err() {
            debug!("interrupt received after input was closed");
        }
    }
}

/// Runs a blocking line source on a worker thread.
///
/// A read returns either the worker's line or `SessionError::Interrupted`,
/// whichever comes first.
pub struct InterruptibleInput {
    prompts: Sender<String>,
    events: Receiver<InputEvent>,
}

impl InterruptibleInput {
    /// Build the source on the worker thread and start serving reads.
    ///
    /// If the source cannot be built, the first read reports why and every
    /// later read reports end of input.
    pub fn spawn<S, F>(make_source: F) -> (Self, Interrupter)
    where
        S: LineSource,
        F: FnOnce() -> Result<S, SessionError> + Send + 'static,
    {
        let (prompt_tx, prompt_rx) = mpsc::channel::<String>();
        let (event_tx, event_rx) = mpsc::channel();
        let interrupter = Interrupter {
            events: event_tx.clone(),
        };

        thread::spawn(move || match make_source() {
            Ok(mut source) => {
                for prompt in prompt_rx {
                    let line = source.read_line(&prompt);
                    if event_tx.send(InputEvent::Line(line)).is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                let mut failure = Some(e);
                for _ in prompt_rx {
                    let line = Err(failure.take().unwrap_or(SessionError::EndOfInput));
                    if event_tx.send(InputEvent::Line(line)).is_err() {
                        break;
                    }
                }
            }
        });

        (
            Self {
                prompts: prompt_tx,
                events: event_rx,
            },
            interrupter,
        )
    }
}

impl LineSource for InterruptibleInput {
    fn read_line(&mut self, prompt: &str) -> Result<String, SessionError> {
        if self.prompts.send(prompt.to_string()).is_err() {
            return Err(SessionError::EndOfInput);
        }
        match self.events.recv() {
            Ok(InputEvent::Line(line)) => line,
            Ok(InputEvent::Interrupted) => Err(SessionError::Interrupted),
            Err(_) => Err(SessionError::EndOfInput),
        }
    }
}

/// Whether the input asks to go back one step
pub fn is_back_token(raw: &str) -> bool {
    let token = raw.trim().to_lowercase();
    BACK_TOKENS.iter().any(|t| *t == token)
}

/// Declared bounds and default for a numeric prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericField {
    pub label: &'static str,
    pub min: i64,
    pub max: i64,
    pub default: Option<i64>,
}

impl NumericField {
    pub const fn new(label: &'static str, min: i64, max: i64) -> Self {
        Self {
            label,
            min,
            max,
            default: None,
        }
    }

    pub const fn with_default(mut self, default: i64) -> Self {
        self.default = Some(default);
        self
    }

    /// Validate one line of input against the field.
    ///
    /// Empty input resolves to the default when there is one.
    pub fn parse(&self, raw: &str) -> Result<i64, InputError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return self.default.ok_or(InputError::NotANumber);
        }
        let value: i64 = trimmed.parse().map_err(|_| InputError::NotANumber)?;
        if value < self.min {
            return Err(InputError::BelowMinimum { min: self.min });
        }
        if value > self.max {
            return Err(InputError::AboveMaximum { max: self.max });
        }
        Ok(value)
    }

    pub fn prompt(&self, allow_back: bool) -> String {
        let mut prompt = self.label.to_string();
        if let Some(default) = self.default {
            prompt.push_str(&format!(" [default: {default}]"));
        }
        if allow_back {
            prompt.push_str(" ('back' to return)");
        }
        prompt.push_str(": ");
        prompt
    }
}

/// Outcome of a prompt that allows stepping back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry<T> {
    Value(T),
    Back,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    /// Never returns a line
    struct StalledInput;

    impl LineSource for StalledInput {
        fn read_line(&mut self, _prompt: &str) -> Result<String, SessionError> {
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
    }

    #[test]
    fn test_back_tokens() {
        assert!(is_back_token("back"));
        assert!(is_back_token("  BACK "));
        assert!(is_back_token("Назад"));
        assert!(is_back_token("н"));
        assert!(!is_back_token(""));
        assert!(!is_back_token("backward"));
        assert!(!is_back_token("0"));
    }

    #[test]
    fn test_numeric_parse() {
        let field = NumericField::new("Distance", 0, 10_000);
        assert_eq!(field.parse("850"), Ok(850));
        assert_eq!(field.parse(" 0 "), Ok(0));
        assert_eq!(field.parse("abc"), Err(InputError::NotANumber));
        assert_eq!(field.parse("12.5"), Err(InputError::NotANumber));
        assert_eq!(field.parse(""), Err(InputError::NotANumber));
        assert_eq!(field.parse("-1"), Err(InputError::BelowMinimum { min: 0 }));
        assert_eq!(field.parse("10001"), Err(InputError::AboveMaximum { max: 10_000 }));
    }

    #[test]
    fn test_empty_input_uses_default() {
        let field = NumericField::new("Altitude", -1000, 10_000).with_default(0);
        assert_eq!(field.parse(""), Ok(0));
        assert_eq!(field.parse("   "), Ok(0));
        assert_eq!(field.parse("-250"), Ok(-250));
    }

    #[test]
    fn test_prompt_text() {
        let field = NumericField::new("Altitude (m)", -1000, 10_000).with_default(0);
        assert_eq!(field.prompt(false), "Altitude (m) [default: 0]: ");
        assert!(field.prompt(true).contains("'back'"));
    }

    #[test]
    fn test_scripted_input() {
        let mut input = ScriptedInput::new(["1", "2"]);
        assert_eq!(input.read_line("a: ").unwrap(), "1");
        assert_eq!(input.read_line("b: ").unwrap(), "2");
        assert!(matches!(input.read_line("c: "), Err(SessionError::EndOfInput)));
        assert_eq!(input.prompts, vec!["a: ", "b: ", "c: "]);

        let mut interrupted = ScriptedInput::new(Vec::<String>::new()).interrupt_at_end();
        assert!(matches!(interrupted.read_line("x"), Err(SessionError::Interrupted)));
    }

    #[test]
    fn test_reader_input() {
        let mut out = Vec::new();
        {
            let mut input = ReaderInput::new(Cursor::new("850\r\nback\n"), &mut out);
            assert_eq!(input.read_line("Distance: ").unwrap(), "850");
            assert_eq!(input.read_line("Altitude: ").unwrap(), "back");
            assert!(matches!(input.read_line("Target: "), Err(SessionError::EndOfInput)));
        }
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Distance: "));
        assert!(transcript.contains("Target: "));
    }

    #[test]
    fn test_interruptible_input_passes_lines_through() {
        let (mut input, _interrupter) =
            InterruptibleInput::spawn(|| Ok(ScriptedInput::new(["850", "back"])));
        assert_eq!(input.read_line("Distance: ").unwrap(), "850");
        assert_eq!(input.read_line("Altitude: ").unwrap(), "back");
        assert!(matches!(input.read_line("Target: "), Err(SessionError::EndOfInput)));
        assert!(matches!(input.read_line("Target: "), Err(SessionError::EndOfInput)));
    }

    #[test]
    fn test_interrupt_ends_blocked_read() {
        let (mut input, interrupter) = InterruptibleInput::spawn(|| Ok(StalledInput));
        let signal = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            interrupter.interrupt();
        });

        assert!(matches!(input.read_line("Distance: "), Err(SessionError::Interrupted)));
        signal.join().unwrap();
    }

    #[test]
    fn test_failed_source_reports_once() {
        let (mut input, _interrupter) = InterruptibleInput::spawn(|| {
            Err::<ScriptedInput, _>(SessionError::Internal("no terminal".into()))
        });
        assert!(matches!(input.read_line("a: "), Err(SessionError::Internal(_))));
        assert!(matches!(input.read_line("b: "), Err(SessionError::EndOfInput)));
    }
}
