//! Terminal I/O with timed, interruptible input
//!
//! Uses crossterm's event system for non-blocking reads: the OS wakes us
//! when input arrives (epoll/kqueue/IOCP), and a coarse poll tick lets the
//! timer callback fire at its interval without busy-waiting. Piped or
//! redirected stdin falls back to plain blocking reads.

use crate::io_trait::{IoError, LineInput, TimerCallback, ZIo};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, DisableLineWrap, EnableLineWrap},
};
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Character code sent by the enter key
const TERMINATOR_ENTER: u8 = 13;

/// Terminator-set entry meaning "any function key"
const TERMINATOR_ANY: u8 = 255;

pub struct TerminalIo {
    /// Whether we're currently in raw mode
    in_raw_mode: bool,
    /// Current input buffer being built
    buffer: String,
    /// Cursor position in buffer
    cursor_pos: usize,
    transcripting: bool,
    writing_commands: bool,
    reading_commands: bool,
    transcript: Option<File>,
}

/// Translate a function key to its input character code, if it has one
fn function_key_code(key: &KeyEvent) -> Option<u8> {
    match key.code {
        KeyCode::Up => Some(129),
        KeyCode::Down => Some(130),
        KeyCode::Left => Some(131),
        KeyCode::Right => Some(132),
        KeyCode::F(n) if (1..=12).contains(&n) => Some(132 + n),
        KeyCode::Esc => Some(27),
        _ => None,
    }
}

fn terminates(terminators: &[u8], code: u8) -> bool {
    terminators.contains(&code) || terminators.contains(&TERMINATOR_ANY)
}

impl TerminalIo {
    pub fn new() -> Self {
        TerminalIo {
            in_raw_mode: false,
            buffer: String::new(),
            cursor_pos: 0,
            transcripting: false,
            writing_commands: false,
            reading_commands: false,
            transcript: None,
        }
    }

    /// Ensure we're not in raw mode when leaving an input call
    fn cleanup(&mut self) {
        if self.in_raw_mode {
            let _ = terminal::disable_raw_mode();
            let _ = execute!(io::stdout(), EnableLineWrap);
            self.in_raw_mode = false;
        }
    }

    /// Standard blocking line read (for non-terminal input)
    fn read_line_standard(&self) -> Result<String, IoError> {
        let mut input = String::new();
        let bytes_read = io::stdin()
            .read_line(&mut input)
            .map_err(|e| IoError::new(format!("Failed to read input: {e}")))?;

        if bytes_read == 0 {
            debug!("EOF on stdin");
            return Err(IoError::new("EOF: stdin closed or no more input"));
        }

        // Remove trailing newline
        if input.ends_with('\n') {
            input.pop();
            if input.ends_with('\r') {
                input.pop();
            }
        }

        debug!("line from stdin: '{input}'");
        Ok(input)
    }

    /// Read line using non-blocking event-driven I/O
    fn read_line_nonblocking(
        &mut self,
        time_tenths: u16,
        terminators: &[u8],
        mut timer: Option<TimerCallback>,
    ) -> Result<LineInput, IoError> {
        debug!("entering non-blocking line input");

        self.buffer.clear();
        self.cursor_pos = 0;

        terminal::enable_raw_mode()
            .map_err(|e| IoError::new(format!("Failed to enable raw mode: {e}")))?;
        self.in_raw_mode = true;
        execute!(io::stdout(), DisableLineWrap)
            .map_err(|e| IoError::new(format!("Failed to disable line wrap: {e}")))?;

        let timeout = if time_tenths > 0 {
            Some(Duration::from_millis((time_tenths as u64) * 100))
        } else {
            None
        };
        let mut start_time = Instant::now();

        info!("non-blocking input active, timeout: {timeout:?}");

        let result = loop {
            // Timer expired? Ask the callback whether to keep waiting.
            if let Some(timeout_duration) = timeout {
                if start_time.elapsed() >= timeout_duration {
                    debug!("input timer expired after {:?}", start_time.elapsed());
                    match timer.as_mut() {
                        Some(cb) => match (cb)() {
                            Ok(true) => {
                                debug!("timer callback cancelled input");
                                break Ok(LineInput {
                                    text: self.buffer.clone(),
                                    terminator: 0,
                                });
                            }
                            Ok(false) => {
                                start_time = Instant::now();
                            }
                            Err(e) => {
                                self.cleanup();
                                return Err(IoError::new(format!("Timer callback error: {e}")));
                            }
                        },
                        None => {
                            break Ok(LineInput {
                                text: self.buffer.clone(),
                                terminator: 0,
                            });
                        }
                    }
                }
            }

            // event::poll blocks until an event arrives or the tick
            // elapses; the tick exists only so the timer check above runs.
            let poll_timeout = if timeout.is_some() {
                Duration::from_millis(100)
            } else {
                Duration::from_secs(3600)
            };

            if event::poll(poll_timeout).map_err(|e| IoError::new(format!("Event poll: {e}")))? {
                match event::read().map_err(|e| IoError::new(format!("Event read: {e}")))? {
                    Event::Key(key_event) => {
                        if let Some(code) = function_key_code(&key_event) {
                            if terminates(terminators, code) {
                                debug!("function key {code} terminated input");
                                break Ok(LineInput {
                                    text: self.buffer.clone(),
                                    terminator: code,
                                });
                            }
                            continue;
                        }
                        if let Some(line) = self.handle_key_event(key_event)? {
                            break Ok(LineInput {
                                text: line,
                                terminator: TERMINATOR_ENTER,
                            });
                        }
                    }
                    Event::Paste(text) => {
                        for ch in text.chars() {
                            self.buffer.insert(self.cursor_pos, ch);
                            self.cursor_pos += 1;
                        }
                        print!("{text}");
                        io::stdout().flush().ok();
                    }
                    _ => {
                        // Mouse, focus and resize events don't affect input
                    }
                }
            }
        };

        self.cleanup();

        // Print newline after input
        println!();
        io::stdout().flush().ok();

        result
    }

    /// Handle a key event, returning Some(line) if input is complete
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<String>, IoError> {
        match key.code {
            KeyCode::Enter => {
                debug!("enter pressed, returning: '{}'", self.buffer);
                Ok(Some(self.buffer.clone()))
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && c == 'c' {
                    return Err(IoError::new("Interrupted by Ctrl+C"));
                }

                self.buffer.insert(self.cursor_pos, c);
                self.cursor_pos += 1;

                // Echo the character
                print!("{c}");
                io::stdout().flush().ok();

                Ok(None)
            }
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    self.buffer.remove(self.cursor_pos);

                    execute!(
                        io::stdout(),
                        cursor::MoveLeft(1),
                        terminal::Clear(terminal::ClearType::UntilNewLine)
                    )
                    .ok();

                    // Reprint the rest of the buffer
                    print!("{}", &self.buffer[self.cursor_pos..]);
                    if self.buffer.len() > self.cursor_pos {
                        execute!(
                            io::stdout(),
                            cursor::MoveLeft((self.buffer.len() - self.cursor_pos) as u16)
                        )
                        .ok();
                    }
                    io::stdout().flush().ok();
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Read a single key from standard input (blocking, piped mode)
    fn read_key_standard(&self, translate: &dyn Fn(char) -> u8) -> Result<u8, IoError> {
        let mut input = String::new();
        let bytes_read = io::stdin()
            .read_line(&mut input)
            .map_err(|e| IoError::new(format!("Failed to read key: {e}")))?;
        if bytes_read == 0 {
            return Err(IoError::new("EOF: stdin closed or no more input"));
        }
        let ch = input.chars().next().unwrap_or('\n');
        debug!("key from stdin: '{ch}'");
        Ok(translate(ch))
    }

    /// Read single key using non-blocking event-driven I/O
    fn read_key_nonblocking(
        &mut self,
        time_tenths: u16,
        translate: &dyn Fn(char) -> u8,
        mut timer: Option<TimerCallback>,
    ) -> Result<u8, IoError> {
        debug!("entering non-blocking key input");

        terminal::enable_raw_mode()
            .map_err(|e| IoError::new(format!("Failed to enable raw mode: {e}")))?;
        self.in_raw_mode = true;

        let timeout = if time_tenths > 0 {
            Some(Duration::from_millis((time_tenths as u64) * 100))
        } else {
            None
        };
        let mut start_time = Instant::now();

        let result = loop {
            if let Some(timeout_duration) = timeout {
                if start_time.elapsed() >= timeout_duration {
                    debug!("key timer expired after {:?}", start_time.elapsed());
                    match timer.as_mut() {
                        Some(cb) => match (cb)() {
                            Ok(true) => break Ok(0),
                            Ok(false) => start_time = Instant::now(),
                            Err(e) => {
                                self.cleanup();
                                return Err(IoError::new(format!("Timer callback error: {e}")));
                            }
                        },
                        None => break Ok(0),
                    }
                }
            }

            let poll_timeout = if timeout.is_some() {
                Duration::from_millis(100)
            } else {
                Duration::from_secs(3600)
            };

            if event::poll(poll_timeout).map_err(|e| IoError::new(format!("Event poll: {e}")))? {
                if let Event::Key(key_event) =
                    event::read().map_err(|e| IoError::new(format!("Event read: {e}")))?
                {
                    if let Some(code) = function_key_code(&key_event) {
                        debug!("function key {code}");
                        break Ok(code);
                    }
                    match key_event.code {
                        KeyCode::Char(ch) => {
                            debug!("key received: '{ch}'");
                            break Ok(translate(ch));
                        }
                        KeyCode::Enter => break Ok(TERMINATOR_ENTER),
                        KeyCode::Backspace => break Ok(8),
                        _ => {
                            // Ignore other special keys
                        }
                    }
                }
            }
        };

        self.cleanup();
        result
    }

    fn transcript_file(&mut self) -> Option<&mut File> {
        if self.transcript.is_none() {
            match OpenOptions::new()
                .append(true)
                .create(true)
                .open("transcript.txt")
            {
                Ok(f) => self.transcript = Some(f),
                Err(e) => {
                    debug!("could not open transcript file: {e}");
                    return None;
                }
            }
        }
        self.transcript.as_mut()
    }
}

impl ZIo for TerminalIo {
    fn print(&mut self, text: &str) -> Result<(), IoError> {
        print!("{text}");
        io::stdout().flush()?;
        Ok(())
    }

    fn print_char(&mut self, ch: char) -> Result<(), IoError> {
        print!("{ch}");
        io::stdout().flush()?;
        Ok(())
    }

    fn print_rectangle(&mut self, lines: &[String]) -> Result<(), IoError> {
        for line in lines {
            println!("{line}");
        }
        io::stdout().flush()?;
        Ok(())
    }

    fn cursor(&mut self) -> Result<(u16, u16), IoError> {
        let (col, row) = cursor::position()
            .map_err(|e| IoError::new(format!("Cursor position unavailable: {e}")))?;
        Ok((row + 1, col + 1))
    }

    fn read_line(
        &mut self,
        time_tenths: u16,
        terminators: &[u8],
        timer: Option<TimerCallback>,
    ) -> Result<LineInput, IoError> {
        debug!(
            "read_line: time={} tenths ({}s)",
            time_tenths,
            time_tenths as f32 / 10.0
        );

        if !atty::is(atty::Stream::Stdin) {
            // Not a terminal - use standard blocking read
            debug!("input is piped/redirected - using standard read");
            let text = self.read_line_standard()?;
            return Ok(LineInput {
                text,
                terminator: TERMINATOR_ENTER,
            });
        }

        self.read_line_nonblocking(time_tenths, terminators, timer)
    }

    fn read_key(
        &mut self,
        time_tenths: u16,
        translate: &dyn Fn(char) -> u8,
        timer: Option<TimerCallback>,
    ) -> Result<u8, IoError> {
        debug!("read_key: time={time_tenths} tenths");

        if !atty::is(atty::Stream::Stdin) {
            debug!("input is piped/redirected - using standard key read");
            return self.read_key_standard(translate);
        }

        self.read_key_nonblocking(time_tenths, translate, timer)
    }

    fn transcripting(&self) -> bool {
        self.transcripting
    }

    fn set_transcripting(&mut self, on: bool) {
        self.transcripting = on;
    }

    fn writing_commands(&self) -> bool {
        self.writing_commands
    }

    fn set_writing_commands(&mut self, on: bool) {
        self.writing_commands = on;
    }

    fn reading_commands(&self) -> bool {
        self.reading_commands
    }

    fn set_reading_commands(&mut self, on: bool) {
        self.reading_commands = on;
    }

    fn print_transcript(&mut self, text: &str) {
        if let Some(f) = self.transcript_file() {
            let _ = write!(f, "{text}");
        }
    }

    fn print_transcript_char(&mut self, ch: char) {
        if let Some(f) = self.transcript_file() {
            let _ = write!(f, "{ch}");
        }
    }
}

impl Default for TerminalIo {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalIo {
    fn drop(&mut self) {
        self.cleanup();
    }
}
