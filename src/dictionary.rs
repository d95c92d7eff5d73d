use crate::story::Story;
use log::debug;

/// A dictionary header resolved to absolute addresses.
///
/// Layout in memory: a separator-count byte, that many separator character
/// codes, an entry-length byte, a 16-bit entry count, then the entries.
/// The built-in dictionary always carries an unsigned count and sorted
/// entries; a user dictionary may store a negative count, which marks its
/// entries as unsorted.
#[derive(Debug, Clone)]
pub struct Dictionary {
    pub addr: u32,
    pub separators: Vec<u8>,
    pub entry_length: u8,
    pub entry_count: u16,
    pub sorted: bool,
    entries_addr: u32,
}

/// Bytes of each entry that hold the encoded word
const KEY_BYTES: usize = 6;

impl Dictionary {
    /// The story's built-in dictionary
    pub fn builtin(story: &Story) -> Dictionary {
        Self::at(story, story.header.dictionary as u32, false)
    }

    /// A game-supplied dictionary at an arbitrary address
    pub fn user(story: &Story, addr: u32) -> Dictionary {
        Self::at(story, addr, true)
    }

    fn at(story: &Story, addr: u32, signed_count: bool) -> Dictionary {
        let sep_count = story.read_byte(addr);
        let separators = story.read_bytes(addr + 1, sep_count as usize);
        let len_addr = addr + 1 + sep_count as u32;
        let entry_length = story.read_byte(len_addr);
        let raw_count = story.read_word(len_addr + 1);

        let (entry_count, sorted) = if signed_count && (raw_count as i16) < 0 {
            ((raw_count as i16).unsigned_abs(), false)
        } else {
            (raw_count, true)
        };

        debug!(
            "dictionary at {:04x}: {} entries, length {}, sorted={}",
            addr, entry_count, entry_length, sorted
        );

        Dictionary {
            addr,
            separators,
            entry_length,
            entry_count,
            sorted,
            entries_addr: len_addr + 3,
        }
    }

    /// Address of entry `index`
    fn entry_addr(&self, index: u32) -> u32 {
        self.entries_addr + index * self.entry_length as u32
    }

    /// Find the entry whose encoded word equals `key`.
    ///
    /// Returns the entry's byte address, or 0 when the word is unknown.
    /// Sorted dictionaries binary-search; unsorted ones scan.
    pub fn lookup(&self, story: &Story, key: &[u8; KEY_BYTES]) -> u16 {
        if self.sorted {
            self.lookup_sorted(story, key)
        } else {
            self.lookup_unsorted(story, key)
        }
    }

    fn entry_key(&self, story: &Story, index: u32) -> Vec<u8> {
        story.read_bytes(self.entry_addr(index), KEY_BYTES)
    }

    fn lookup_sorted(&self, story: &Story, key: &[u8; KEY_BYTES]) -> u16 {
        let mut low = 0i32;
        let mut high = self.entry_count as i32 - 1;

        while low <= high {
            let mid = (low + high) / 2;
            let entry = self.entry_key(story, mid as u32);

            match key[..].cmp(&entry[..]) {
                std::cmp::Ordering::Less => high = mid - 1,
                std::cmp::Ordering::Greater => low = mid + 1,
                std::cmp::Ordering::Equal => {
                    let addr = self.entry_addr(mid as u32);
                    debug!("dictionary hit at {addr:04x}");
                    return addr as u16;
                }
            }
        }

        debug!("dictionary miss for key {key:02x?}");
        0
    }

    fn lookup_unsorted(&self, story: &Story, key: &[u8; KEY_BYTES]) -> u16 {
        for i in 0..self.entry_count as u32 {
            if self.entry_key(story, i) == key {
                let addr = self.entry_addr(i);
                debug!("dictionary hit at {addr:04x} (linear)");
                return addr as u16;
            }
        }
        debug!("dictionary miss for key {key:02x?} (linear)");
        0
    }
}
