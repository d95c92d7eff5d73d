//! The read pipeline: timed line and key input
//!
//! Both reads hand control to the I/O host, bracketed by the
//! interpreter's external-wait markers. While the host waits it may
//! re-enter the machine synchronously through the timer callback, which
//! runs the story's interrupt routine to completion; a non-zero result
//! cancels the read.

use crate::exec::{call_routine, Exec};
use crate::io_trait::ZIo;
use crate::story::Story;
use crate::text_system::TextSystem;
use log::debug;

/// Longest terminating-characters table we will honour
const MAX_TERMINATORS: usize = 32;

/// The story's configured input-terminator set (function-key codes that
/// end a line read in addition to enter)
fn terminator_set(story: &Story) -> Vec<u8> {
    let mut set = Vec::new();
    let addr = story.header.terminating_chars as u32;
    if addr == 0 {
        return set;
    }
    let mut a = addr;
    loop {
        let b = story.read_byte(a);
        if b == 0 || set.len() >= MAX_TERMINATORS {
            break;
        }
        set.push(b);
        a += 1;
    }
    set
}

impl TextSystem {
    /// Read a line of input into the read buffer at `text_buffer`.
    ///
    /// Byte 0 of the buffer is its capacity; byte 1 holds the count of
    /// characters already present (continued input), and the new text is
    /// appended after them. When `parse_buffer` is non-zero the stored
    /// line is tokenized against the built-in dictionary. Returns the
    /// terminator character code (0 when the timer cancelled the read).
    #[allow(clippy::too_many_arguments)]
    pub fn read_line_impl(
        &self,
        story: &mut Story,
        io: &mut dyn ZIo,
        exec: &mut dyn Exec,
        text_buffer: u32,
        parse_buffer: u32,
        time: u16,
        routine: u16,
    ) -> Result<u8, String> {
        let max = story.read_byte(text_buffer) as usize;
        let offset = story.read_byte(text_buffer + 1) as usize;
        let terminators = terminator_set(story);

        debug!(
            "read_line: buffer={text_buffer:04x} parse={parse_buffer:04x} max={max} offset={offset} time={time} routine={routine:04x}"
        );

        exec.begin_external_wait();
        let line = if time > 0 && routine > 0 {
            let mut on_timer = || -> Result<bool, String> {
                debug!("input timer fired, calling routine {routine:04x}");
                Ok(call_routine(exec, routine)? != 0)
            };
            io.read_line(time, &terminators, Some(&mut on_timer))
        } else {
            io.read_line(time, &terminators, None)
        };
        exec.end_external_wait();

        let line = line.map_err(|e| format!("Error reading line input: {e}"))?;

        // Store the text, folded to lowercase, after any continued input
        let mut stored = 0usize;
        for ch in line.text.chars() {
            if offset + stored >= max {
                debug!("input truncated to {max} characters");
                break;
            }
            let ch = ch.to_lowercase().next().unwrap_or(ch);
            story.write_byte(
                text_buffer + 2 + (offset + stored) as u32,
                self.charset.encode(ch),
            )?;
            stored += 1;
        }
        story.write_byte(text_buffer + 1, (offset + stored) as u8)?;

        if parse_buffer != 0 {
            self.tokenize(story, text_buffer, parse_buffer, 0, false)?;
        }

        debug!(
            "read_line done: {} characters, terminator {}",
            offset + stored,
            line.terminator
        );
        Ok(line.terminator)
    }

    /// Read a single key, translated to a character code.
    /// Returns 0 when the timer cancelled the read.
    pub fn read_key_impl(
        &self,
        io: &mut dyn ZIo,
        exec: &mut dyn Exec,
        time: u16,
        routine: u16,
    ) -> Result<u8, String> {
        debug!("read_key: time={time} routine={routine:04x}");

        let charset = &self.charset;
        let translate = |ch: char| charset.encode(ch);

        exec.begin_external_wait();
        let key = if time > 0 && routine > 0 {
            let mut on_timer = || -> Result<bool, String> {
                debug!("key timer fired, calling routine {routine:04x}");
                Ok(call_routine(exec, routine)? != 0)
            };
            io.read_key(time, &translate, Some(&mut on_timer))
        } else {
            io.read_key(time, &translate, None)
        };
        exec.end_external_wait();

        key.map_err(|e| format!("Error reading key input: {e}"))
    }
}
