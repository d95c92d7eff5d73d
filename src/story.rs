use crate::header::Header;
use log::debug;

/// A loaded story with owned memory and a parsed header.
///
/// All tables the core works with (abbreviations, dictionaries, alphabet
/// overrides, read and parse buffers) live inside this byte image and are
/// addressed by byte offset. Writes are only legal below the static-memory
/// base; everything above it is ROM as far as the running story is
/// concerned.
pub struct Story {
    /// The raw story memory
    pub memory: Vec<u8>,
    /// The parsed header
    pub header: Header,
}

impl Story {
    /// Create a new story from memory bytes
    pub fn from_memory(memory: Vec<u8>) -> Result<Self, String> {
        if memory.len() < 64 {
            return Err("Story file too small for header".to_string());
        }
        let header = Header::new(&memory);
        Ok(Story { memory, header })
    }

    /// First ROM address; writes at or above this fail.
    pub fn rom_start(&self) -> u32 {
        self.header.base_static_mem as u32
    }

    /// Read a byte from memory
    pub fn read_byte(&self, addr: u32) -> u8 {
        if addr < self.memory.len() as u32 {
            self.memory[addr as usize]
        } else {
            0
        }
    }

    /// Read a word (2 bytes, big-endian) from memory
    pub fn read_word(&self, addr: u32) -> u16 {
        let high = self.read_byte(addr) as u16;
        let low = self.read_byte(addr + 1) as u16;
        (high << 8) | low
    }

    /// Read a run of bytes from memory, zero-filled past the end
    pub fn read_bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len).map(|i| self.read_byte(addr + i as u32)).collect()
    }

    /// Write a byte to memory (only in dynamic memory)
    pub fn write_byte(&mut self, addr: u32, value: u8) -> Result<(), String> {
        if addr >= self.rom_start() {
            debug!(
                "rejected write of {:02x} to static memory at {:04x}",
                value, addr
            );
            return Err(format!(
                "Attempt to write to non-dynamic memory at {addr:04x}"
            ));
        }
        if addr < self.memory.len() as u32 {
            self.memory[addr as usize] = value;
            Ok(())
        } else {
            Err(format!("Memory address out of bounds: {addr:04x}"))
        }
    }

    /// Write a word to memory (only in dynamic memory)
    pub fn write_word(&mut self, addr: u32, value: u16) -> Result<(), String> {
        self.write_byte(addr, (value >> 8) as u8)?;
        self.write_byte(addr + 1, (value & 0xFF) as u8)?;
        Ok(())
    }
}
