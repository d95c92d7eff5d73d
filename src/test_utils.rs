// Test utilities: synthetic story images and a scripted interpreter stub
use crate::charset::Charset;
use crate::exec::Exec;
use crate::story::Story;
use crate::text::encode_dictionary_key;
use std::collections::VecDeque;

/// Static memory starts here in test images; everything below is writable
pub const TEST_ROM_START: u16 = 0x0F00;

/// Built-in dictionary location in test images
pub const TEST_DICT_ADDR: u32 = 0x0A00;

/// Abbreviation table location in test images
pub const TEST_ABBREV_ADDR: u32 = 0x0500;

/// An 8 KiB version-5 story with an empty dictionary and abbreviation
/// table, and plenty of writable memory below 0x0F00.
pub fn test_story() -> Story {
    let mut memory = vec![0u8; 0x2000];
    memory[0x00] = 5; // Version 5
    memory[0x08] = (TEST_DICT_ADDR >> 8) as u8;
    memory[0x09] = (TEST_DICT_ADDR & 0xFF) as u8;
    memory[0x0E] = (TEST_ROM_START >> 8) as u8;
    memory[0x0F] = (TEST_ROM_START & 0xFF) as u8;
    memory[0x18] = (TEST_ABBREV_ADDR >> 8) as u8;
    memory[0x19] = (TEST_ABBREV_ADDR & 0xFF) as u8;
    for (i, b) in b"250801".iter().enumerate() {
        memory[0x12 + i] = *b;
    }

    // Empty dictionary: no separators, entry length 9, no entries
    memory[TEST_DICT_ADDR as usize] = 0;
    memory[TEST_DICT_ADDR as usize + 1] = 9;

    Story::from_memory(memory).unwrap()
}

/// Write big-endian words into memory
pub fn poke_words(story: &mut Story, addr: u32, words: &[u16]) {
    for (i, w) in words.iter().enumerate() {
        story.memory[addr as usize + 2 * i] = (w >> 8) as u8;
        story.memory[addr as usize + 2 * i + 1] = (w & 0xFF) as u8;
    }
}

/// Install a dictionary at `addr`.
///
/// Entries are 9 bytes (6-byte encoded word, 3 data bytes). With
/// `sorted` the words are stored in encoded-key order and the count is
/// written as-is; otherwise the given order is kept and the count is
/// stored negative, marking the table unsorted.
pub fn install_dictionary(
    story: &mut Story,
    addr: u32,
    separators: &[u8],
    words: &[&str],
    sorted: bool,
) {
    let charset = Charset::default();
    let mut keys: Vec<[u8; 6]> = words
        .iter()
        .map(|w| encode_dictionary_key(&charset, w.as_bytes()).unwrap())
        .collect();
    if sorted {
        keys.sort();
    }

    let a = addr as usize;
    story.memory[a] = separators.len() as u8;
    story.memory[a + 1..a + 1 + separators.len()].copy_from_slice(separators);
    let len_addr = a + 1 + separators.len();
    story.memory[len_addr] = 9;
    let count = if sorted {
        words.len() as u16
    } else {
        (-(words.len() as i16)) as u16
    };
    story.memory[len_addr + 1] = (count >> 8) as u8;
    story.memory[len_addr + 2] = (count & 0xFF) as u8;

    let mut entry = len_addr + 3;
    for key in &keys {
        story.memory[entry..entry + 6].copy_from_slice(key);
        entry += 9;
    }
}

/// First entry address of a dictionary installed by `install_dictionary`
pub fn dictionary_base(addr: u32, separators: usize) -> u16 {
    (addr + 1 + separators as u32 + 3) as u16
}

/// Set up a read buffer with the given capacity and stored text
pub fn set_input_text(story: &mut Story, buffer: u32, max: u8, text: &str) {
    story.memory[buffer as usize] = max;
    story.memory[buffer as usize + 1] = text.len() as u8;
    for (i, b) in text.bytes().enumerate() {
        story.memory[buffer as usize + 2 + i] = b;
    }
}

/// Interpreter stub: records routine calls and serves scripted results
#[derive(Default)]
pub struct MockExec {
    pub calls: Vec<u16>,
    pub results: VecDeque<u16>,
    pub wait_depth: i32,
    pub waits_seen: usize,
}

impl MockExec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_results(results: &[u16]) -> Self {
        MockExec {
            results: results.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl Exec for MockExec {
    fn enter_routine(&mut self, addr: u16, _args: &[u16]) -> Result<(), String> {
        self.calls.push(addr);
        Ok(())
    }

    fn run_to_return(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn pop_result(&mut self) -> Result<u16, String> {
        Ok(self.results.pop_front().unwrap_or(0))
    }

    fn begin_external_wait(&mut self) {
        self.wait_depth += 1;
        self.waits_seen += 1;
    }

    fn end_external_wait(&mut self) {
        self.wait_depth -= 1;
    }
}
