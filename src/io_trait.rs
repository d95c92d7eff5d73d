//! Core I/O trait for host presentation implementations
//!
//! This trait defines the interface the text core drives for screen and
//! transcript output and for line/key input, whether the implementation is
//! a real terminal or a headless harness for testing.

use std::fmt;

/// Synchronous callback fired while an input call is waiting.
/// Returning `Ok(true)` cancels the read.
pub type TimerCallback<'a> = &'a mut dyn FnMut() -> Result<bool, String>;

/// A finished line read: the text typed so far and the character code of
/// the key that ended it (13 for a normal enter, 0 for a timer cancel,
/// otherwise a function-key code from the terminator set).
#[derive(Debug, Clone)]
pub struct LineInput {
    pub text: String,
    pub terminator: u8,
}

/// Host I/O operations the text core drives
pub trait ZIo {
    /// Print text to the screen
    fn print(&mut self, text: &str) -> Result<(), IoError>;

    /// Print a single character to the screen
    fn print_char(&mut self, ch: char) -> Result<(), IoError>;

    /// Print a block of lines without wrapping, one row per entry
    fn print_rectangle(&mut self, lines: &[String]) -> Result<(), IoError>;

    /// Current cursor position, (row, column) with 1-based indexing
    fn cursor(&mut self) -> Result<(u16, u16), IoError>;

    /// Read a line of input.
    ///
    /// `time_tenths` of 0 means no timer; otherwise `timer` may be invoked
    /// every `time_tenths/10` seconds and can cancel the read.
    /// `terminators` lists function-key codes that end input in addition
    /// to enter (255 stands for every function key).
    fn read_line(
        &mut self,
        time_tenths: u16,
        terminators: &[u8],
        timer: Option<TimerCallback>,
    ) -> Result<LineInput, IoError>;

    /// Read a single key, translated to a character code via `translate`
    /// for printable keys. Returns 0 when cancelled by the timer.
    fn read_key(
        &mut self,
        time_tenths: u16,
        translate: &dyn Fn(char) -> u8,
        timer: Option<TimerCallback>,
    ) -> Result<u8, IoError>;

    /// Whether a transcript is being written
    fn transcripting(&self) -> bool;
    fn set_transcripting(&mut self, on: bool);

    /// Whether player commands are echoed to a command file
    fn writing_commands(&self) -> bool;
    fn set_writing_commands(&mut self, on: bool);

    /// Whether input is replayed from a command file
    fn reading_commands(&self) -> bool;
    fn set_reading_commands(&mut self, on: bool);

    /// Append text to the transcript
    fn print_transcript(&mut self, text: &str);
    fn print_transcript_char(&mut self, ch: char);

    /// Whether this host can display the character
    fn can_print(&self, ch: char) -> bool {
        ch == '\n' || (' '..='~').contains(&ch) || !ch.is_ascii()
    }

    /// Whether this host can deliver the character as input
    fn can_read(&self, ch: char) -> bool {
        (' '..='~').contains(&ch)
    }
}

/// I/O error type
#[derive(Debug, Clone)]
pub struct IoError {
    pub message: String,
}

impl IoError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I/O error: {}", self.message)
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(error: std::io::Error) -> Self {
        Self::new(format!("I/O error: {error}"))
    }
}

impl From<IoError> for String {
    fn from(error: IoError) -> String {
        error.message
    }
}
