//! Output stream routing
//!
//! Every piece of emitted text fans out across up to four logical streams:
//! the screen, the transcript, the command-file echo, and a stack of
//! in-memory capture tables. While any capture table is active it swallows
//! all character output; the screen and transcript see nothing until the
//! last table is closed.

use crate::charset::Charset;
use crate::io_trait::ZIo;
use crate::story::Story;
use log::debug;

/// Deepest legal nesting of memory capture tables
const MAX_CAPTURE_DEPTH: usize = 16;

/// Memory below this address is never a legal capture target
const MIN_CAPTURE_ADDR: u32 = 64;

/// One active memory capture: bytes accumulate here until the stream is
/// closed, then land at `table_addr` behind a 16-bit length prefix.
struct CaptureFrame {
    table_addr: u32,
    buffer: Vec<u8>,
}

/// Router state for the four output streams.
///
/// Streams 2 (transcript) and 4 (command echo) are flags owned by the I/O
/// host; stream 1 (screen) and the stream-3 capture stack live here.
pub struct OutputStreams {
    normal_output: bool,
    capture_stack: Vec<CaptureFrame>,
}

impl OutputStreams {
    pub fn new() -> Self {
        OutputStreams {
            normal_output: true,
            capture_stack: Vec::new(),
        }
    }

    /// True while any capture table is open
    pub fn capturing(&self) -> bool {
        !self.capture_stack.is_empty()
    }

    /// True when stream 1 (the screen) is selected
    pub fn normal_output(&self) -> bool {
        self.normal_output
    }

    /// Emit one character code
    pub fn put_charcode(
        &mut self,
        charset: &Charset,
        io: &mut dyn ZIo,
        code: u8,
    ) -> Result<(), String> {
        if code == 0 {
            return Ok(());
        }
        if let Some(frame) = self.capture_stack.last_mut() {
            frame.buffer.push(charset.encode(charset.decode(code)));
            return Ok(());
        }
        let ch = charset.decode(code);
        if self.normal_output {
            io.print_char(ch)?;
        }
        if io.transcripting() {
            io.print_transcript_char(ch);
        }
        Ok(())
    }

    /// Emit one host character
    pub fn put_unicode(
        &mut self,
        charset: &Charset,
        io: &mut dyn ZIo,
        ch: char,
    ) -> Result<(), String> {
        if let Some(frame) = self.capture_stack.last_mut() {
            frame.buffer.push(charset.encode(ch));
            return Ok(());
        }
        if self.normal_output {
            io.print_char(ch)?;
        }
        if io.transcripting() {
            io.print_transcript_char(ch);
        }
        Ok(())
    }

    /// Emit a host string
    pub fn put_string(
        &mut self,
        charset: &Charset,
        io: &mut dyn ZIo,
        text: &str,
    ) -> Result<(), String> {
        if let Some(frame) = self.capture_stack.last_mut() {
            for ch in text.chars() {
                frame.buffer.push(charset.encode(ch));
            }
            return Ok(());
        }
        if self.normal_output {
            io.print(text)?;
        }
        if io.transcripting() {
            io.print_transcript(text);
        }
        Ok(())
    }

    /// Emit a preformatted block. Rectangles go to the screen only; they
    /// are never captured and never transcripted.
    pub fn put_rectangle(&mut self, io: &mut dyn ZIo, lines: &[String]) -> Result<(), String> {
        io.print_rectangle(lines)?;
        Ok(())
    }

    /// Enable or disable an output stream (negative number = disable).
    ///
    /// Stream 3 nests: each enable pushes a fresh capture table and each
    /// disable closes the newest one, writing its bytes to memory behind a
    /// 16-bit length prefix.
    pub fn select(
        &mut self,
        story: &mut Story,
        io: &mut dyn ZIo,
        stream: i16,
        table_addr: u16,
    ) -> Result<(), String> {
        let enable = stream > 0;
        debug!("output stream {stream} table={table_addr:04x}");
        match stream.unsigned_abs() {
            1 => {
                self.normal_output = enable;
                Ok(())
            }
            2 => {
                io.set_transcripting(enable);
                Ok(())
            }
            3 => {
                if enable {
                    self.push_capture(story, table_addr as u32)
                } else {
                    self.pop_capture(story)
                }
            }
            4 => {
                io.set_writing_commands(enable);
                Ok(())
            }
            _ => Err(format!("invalid output stream {stream}")),
        }
    }

    fn push_capture(&mut self, story: &Story, table_addr: u32) -> Result<(), String> {
        if self.capture_stack.len() >= MAX_CAPTURE_DEPTH {
            return Err(format!(
                "output stream 3 nested deeper than {MAX_CAPTURE_DEPTH}"
            ));
        }
        if table_addr < MIN_CAPTURE_ADDR || table_addr + 1 >= story.rom_start() {
            return Err(format!(
                "output stream 3 table {table_addr:04x} outside writable memory"
            ));
        }
        self.capture_stack.push(CaptureFrame {
            table_addr,
            buffer: Vec::new(),
        });
        Ok(())
    }

    fn pop_capture(&mut self, story: &mut Story) -> Result<(), String> {
        let frame = match self.capture_stack.pop() {
            Some(frame) => frame,
            None => return Err("output stream 3 disabled while not enabled".to_string()),
        };
        let addr = frame.table_addr;
        // The push-time range check is authoritative; past it the write is
        // silently clipped at the ROM boundary.
        let room = (story.rom_start() - addr).saturating_sub(2) as usize;
        let len = frame.buffer.len().min(room);
        if len < frame.buffer.len() {
            debug!(
                "capture at {:04x} clipped from {} to {} bytes",
                addr,
                frame.buffer.len(),
                len
            );
        }
        story.write_word(addr, len as u16)?;
        for (i, &b) in frame.buffer[..len].iter().enumerate() {
            story.write_byte(addr + 2 + i as u32, b)?;
        }
        debug!("capture of {len} bytes flushed to {addr:04x}");
        Ok(())
    }
}

impl Default for OutputStreams {
    fn default() -> Self {
        Self::new()
    }
}
