//! Headless I/O implementation for testing and CI environments
//!
//! Collects screen and transcript output without displaying anything and
//! serves input from scripted lines and keys. A scripted timer lets tests
//! drive the timed-input paths: the callback fires the configured number
//! of times before any input is delivered.

use crate::io_trait::{IoError, LineInput, TimerCallback, ZIo};
use log::debug;
use std::collections::VecDeque;

#[derive(Default)]
pub struct HeadlessIo {
    buffer: Vec<String>,
    current_line: String,
    transcript: String,
    input_lines: VecDeque<String>,
    input_keys: VecDeque<char>,
    partial_input: String,
    timer_fires: usize,
    transcripting: bool,
    writing_commands: bool,
    reading_commands: bool,
}

impl HeadlessIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line of scripted input
    pub fn push_line(&mut self, line: &str) {
        self.input_lines.push_back(line.to_string());
    }

    /// Queue a scripted key press
    pub fn push_key(&mut self, ch: char) {
        self.input_keys.push_back(ch);
    }

    /// Fire the timer callback `n` times before delivering any input
    pub fn set_timer_fires(&mut self, n: usize) {
        self.timer_fires = n;
    }

    /// Text to report as already typed if the timer cancels a line read
    pub fn set_partial_input(&mut self, text: &str) {
        self.partial_input = text.to_string();
    }

    /// Get the current screen buffer content (for testing)
    pub fn screen_lines(&self) -> &[String] {
        &self.buffer
    }

    /// Get all screen output as a single string
    pub fn screen(&self) -> String {
        let mut output = self.buffer.join("\n");
        if !self.current_line.is_empty() {
            if !output.is_empty() {
                output.push('\n');
            }
            output.push_str(&self.current_line);
        }
        output
    }

    /// Get everything written to the transcript
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    fn flush_line(&mut self) {
        self.buffer.push(self.current_line.clone());
        self.current_line.clear();
    }

    /// Run the scripted timer; true means the read was cancelled
    fn run_timer(&mut self, timer: &mut Option<TimerCallback>) -> Result<bool, IoError> {
        while self.timer_fires > 0 {
            self.timer_fires -= 1;
            if let Some(cb) = timer.as_mut() {
                debug!("headless: firing scripted timer");
                if (cb)().map_err(IoError::new)? {
                    debug!("headless: timer cancelled input");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl ZIo for HeadlessIo {
    fn print(&mut self, text: &str) -> Result<(), IoError> {
        if !text.contains('\n') {
            self.current_line.push_str(text);
        } else {
            let lines: Vec<&str> = text.split('\n').collect();
            for (i, line) in lines.iter().enumerate() {
                self.current_line.push_str(line);
                if i < lines.len() - 1 {
                    self.flush_line();
                }
            }
        }
        Ok(())
    }

    fn print_char(&mut self, ch: char) -> Result<(), IoError> {
        if ch == '\n' {
            self.flush_line();
        } else {
            self.current_line.push(ch);
        }
        Ok(())
    }

    fn print_rectangle(&mut self, lines: &[String]) -> Result<(), IoError> {
        for line in lines {
            self.current_line.push_str(line);
            self.flush_line();
        }
        Ok(())
    }

    fn cursor(&mut self) -> Result<(u16, u16), IoError> {
        Ok((
            self.buffer.len() as u16 + 1,
            self.current_line.chars().count() as u16 + 1,
        ))
    }

    fn read_line(
        &mut self,
        _time_tenths: u16,
        _terminators: &[u8],
        mut timer: Option<TimerCallback>,
    ) -> Result<LineInput, IoError> {
        if self.run_timer(&mut timer)? {
            return Ok(LineInput {
                text: self.partial_input.clone(),
                terminator: 0,
            });
        }
        let text = self
            .input_lines
            .pop_front()
            .ok_or_else(|| IoError::new("script exhausted: no line input queued"))?;
        debug!("headless: line input '{text}'");
        Ok(LineInput {
            text,
            terminator: 13,
        })
    }

    fn read_key(
        &mut self,
        _time_tenths: u16,
        translate: &dyn Fn(char) -> u8,
        mut timer: Option<TimerCallback>,
    ) -> Result<u8, IoError> {
        if self.run_timer(&mut timer)? {
            return Ok(0);
        }
        let ch = self
            .input_keys
            .pop_front()
            .ok_or_else(|| IoError::new("script exhausted: no key queued"))?;
        debug!("headless: key input '{ch}'");
        Ok(translate(ch))
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
        self.transcript.push_str(text);
    }

    fn print_transcript_char(&mut self, ch: char) {
        self.transcript.push(ch);
    }
}
