//! The text subsystem as one VM-owned unit
//!
//! Owns the character set (frozen at startup from the header) and the
//! output-stream router, and exposes the operations the opcode dispatcher
//! calls for printing, stream control and cursor queries. Line and key
//! input live in `input`, on the same struct.

use crate::charset::Charset;
use crate::exec::{call_routine, Exec};
use crate::io_trait::ZIo;
use crate::lexer;
use crate::story::Story;
use crate::streams::OutputStreams;
use crate::text;
use log::debug;

pub struct TextSystem {
    pub charset: Charset,
    pub streams: OutputStreams,
}

impl TextSystem {
    /// Build the text subsystem for a loaded story
    pub fn new(story: &Story) -> Self {
        TextSystem {
            charset: Charset::new(story),
            streams: OutputStreams::new(),
        }
    }

    /// Print a single character code
    pub fn print_charcode(&mut self, io: &mut dyn ZIo, code: u8) -> Result<(), String> {
        self.streams.put_charcode(&self.charset, io, code)
    }

    /// Print a single host character
    pub fn print_unicode(&mut self, io: &mut dyn ZIo, ch: char) -> Result<(), String> {
        self.streams.put_unicode(&self.charset, io, ch)
    }

    /// Print a host string
    pub fn print_string(&mut self, io: &mut dyn ZIo, text: &str) -> Result<(), String> {
        self.streams.put_string(&self.charset, io, text)
    }

    /// Print a preformatted block of lines (screen only)
    pub fn print_rectangle(&mut self, io: &mut dyn ZIo, lines: &[String]) -> Result<(), String> {
        self.streams.put_rectangle(io, lines)
    }

    /// Decode the Z-string at a byte address
    pub fn decode_string_at(&self, story: &Story, addr: u32) -> Result<(String, usize), String> {
        text::decode_string(story, addr as usize, &self.charset)
    }

    /// Decode and print the Z-string at a byte address
    pub fn print_string_at(
        &mut self,
        story: &Story,
        io: &mut dyn ZIo,
        addr: u32,
    ) -> Result<usize, String> {
        let (decoded, len) = self.decode_string_at(story, addr)?;
        self.print_string(io, &decoded)?;
        Ok(len)
    }

    /// Enable or disable an output stream (negative = disable).
    /// `table_addr` matters only when enabling stream 3.
    pub fn set_output_stream(
        &mut self,
        story: &mut Story,
        io: &mut dyn ZIo,
        stream: i16,
        table_addr: u16,
    ) -> Result<(), String> {
        self.streams.select(story, io, stream, table_addr)
    }

    /// Select the input source: 0 = keyboard, 1 = command file
    pub fn set_input_stream(&self, io: &mut dyn ZIo, stream: u16) -> Result<(), String> {
        debug!("input stream {stream}");
        match stream {
            0 => {
                io.set_reading_commands(false);
                Ok(())
            }
            1 => {
                io.set_reading_commands(true);
                Ok(())
            }
            _ => Err(format!("invalid input stream {stream}")),
        }
    }

    /// Capability bits for a host character: bit 0 set when the host can
    /// display it, bit 1 when it can arrive as input.
    pub fn check_unicode(&self, io: &dyn ZIo, ch: char) -> u16 {
        let mut caps = 0;
        if io.can_print(ch) {
            caps |= 1;
        }
        if io.can_read(ch) {
            caps |= 2;
        }
        caps
    }

    /// Write the cursor position as two words (row, column) at `dst`
    pub fn get_cursor_pos(
        &self,
        story: &mut Story,
        io: &mut dyn ZIo,
        dst: u32,
    ) -> Result<(), String> {
        let (row, col) = io.cursor()?;
        story.write_word(dst, row)?;
        story.write_word(dst + 2, col)?;
        Ok(())
    }

    /// A sound effect finished: run its notification routine, discarding
    /// the result
    pub fn handle_sound_finished(
        &mut self,
        exec: &mut dyn Exec,
        routine: u16,
    ) -> Result<(), String> {
        debug!("sound finished, notifying routine {routine:04x}");
        call_routine(exec, routine)?;
        Ok(())
    }

    /// Tokenize the read buffer at `text_buffer` into `parse_buffer`
    pub fn tokenize(
        &self,
        story: &mut Story,
        text_buffer: u32,
        parse_buffer: u32,
        user_dict: u16,
        skip_unrecognized: bool,
    ) -> Result<(), String> {
        lexer::tokenize(
            story,
            &self.charset,
            text_buffer,
            parse_buffer,
            user_dict,
            skip_unrecognized,
        )
    }
}
