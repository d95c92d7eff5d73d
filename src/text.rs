use crate::charset::Charset;
use crate::story::Story;
use log::{debug, trace};

/// Decode a Z-string from memory starting at the given address
/// Returns the decoded string and the number of bytes consumed
pub fn decode_string(
    story: &Story,
    addr: usize,
    charset: &Charset,
) -> Result<(String, usize), String> {
    decode_string_recursive(story, addr, charset, 0)
}

/// Internal recursive function with depth tracking.
///
/// Abbreviations expand through a single level of recursion; an
/// abbreviation that itself names an abbreviation is malformed.
fn decode_string_recursive(
    story: &Story,
    addr: usize,
    charset: &Charset,
    depth: u8,
) -> Result<(String, usize), String> {
    if depth > 1 {
        debug!("abbreviation inside abbreviation at addr {addr:04x}");
        return Err("Abbreviation recursion too deep".to_string());
    }
    let mut result = String::new();
    let mut offset = addr;
    let max_string_length = 1000; // Prevent runaway string generation

    // First, collect all z-characters
    let mut all_zchars = Vec::new();
    let mut is_end = false;

    while !is_end && offset + 1 < story.memory.len() && all_zchars.len() < max_string_length {
        // Read word (2 bytes, big-endian)
        let word = story.read_word(offset as u32);
        offset += 2;

        // Check if this is the last word (bit 15 set)
        is_end = (word & 0x8000) != 0;

        // Extract the three 5-bit Z-characters
        let zchars = [
            ((word >> 10) & 0x1F) as u8,
            ((word >> 5) & 0x1F) as u8,
            (word & 0x1F) as u8,
        ];

        trace!("Z-word {word:04x} = Z-chars {zchars:?}, is_end={is_end}");

        all_zchars.extend_from_slice(&zchars);
    }

    // Now process all collected z-characters
    let mut abbrev_shift = 0;
    let mut current_alphabet = 0usize; // 0=A0, 1=A1, 2=A2

    let mut i = 0;
    while i < all_zchars.len() {
        let zc = all_zchars[i];
        i += 1;
        if abbrev_shift > 0 {
            // This is an abbreviation reference
            let abbrev_num = (abbrev_shift - 1) * 32 + zc;

            let abbrev_entry_addr =
                story.header.abbrev_table as usize + (abbrev_num as usize * 2);
            let abbrev_word_addr = story.read_word(abbrev_entry_addr as u32);
            let abbrev_byte_addr = (abbrev_word_addr as usize) * 2;

            if abbrev_byte_addr == 0 || abbrev_byte_addr + 1 >= story.memory.len() {
                debug!(
                    "Invalid abbreviation address {:04x} (memory size: {}), skipping",
                    abbrev_byte_addr,
                    story.memory.len()
                );
                abbrev_shift = 0;
                continue;
            }

            // Expand the abbreviation; its output is already-decoded text
            let (abbrev_str, _) =
                decode_string_recursive(story, abbrev_byte_addr, charset, depth + 1)?;
            result.push_str(&abbrev_str);

            abbrev_shift = 0;
            continue;
        }

        match zc {
            0 => result.push(' '),
            1..=3 => {
                // Abbreviation bank; the entry is named by the next Z-character
                abbrev_shift = zc;
            }
            4 => {
                // One-shot shift to A1 (uppercase)
                current_alphabet = 1;
            }
            5 => {
                // One-shot shift to A2 (punctuation)
                current_alphabet = 2;
            }
            6..=31 => {
                let index = (zc - 6) as usize;
                if current_alphabet == 2 && index == 0 {
                    // Literal escape - the next two Z-characters carry an
                    // 8-bit character code, high half first
                    if i + 1 < all_zchars.len() {
                        let high = all_zchars[i] as u16;
                        let low = all_zchars[i + 1] as u16;
                        let code = (high << 5) | low;
                        trace!("literal escape: high={high}, low={low}, code={code}");
                        i += 2;
                        result.push(charset.decode((code & 0xFF) as u8));
                    } else {
                        debug!("literal escape truncated at end of string");
                    }
                } else {
                    let code = charset.alphabet(current_alphabet)[index];
                    result.push(charset.decode(code));
                }
                // Shifts are one-shot; fall back to lowercase
                current_alphabet = 0;
            }
            _ => unreachable!(),
        }
    }

    Ok((result, offset - addr))
}

/// Decode a string at a packed address
pub fn decode_string_at_packed_addr(
    story: &Story,
    packed_addr: u16,
    charset: &Charset,
) -> Result<(String, usize), String> {
    let byte_addr = unpack_string_address(packed_addr, story.header.version);
    decode_string(story, byte_addr, charset)
}

/// Unpack a string address based on version
fn unpack_string_address(packed: u16, version: u8) -> usize {
    match version {
        1..=3 => (packed as usize) * 2,
        4..=7 => (packed as usize) * 4,
        8 => (packed as usize) * 8,
        _ => (packed as usize) * 2,
    }
}

/// Z-characters per word
const CHARS_PER_WORD: usize = 3;

/// Encode a run of character codes into packed Z-text.
///
/// `target` is the exact number of Z-characters to produce (a positive
/// multiple of three), or 0 for as-many-as-needed rounded up with pad
/// characters. Dictionary keys use a fixed width so lookups can compare
/// encoded bytes directly.
pub fn encode_zchars(charset: &Charset, src: &[u8], target: usize) -> Result<Vec<u16>, String> {
    if target != 0 && target % CHARS_PER_WORD != 0 {
        return Err(format!(
            "encode target of {target} Z-characters is not a multiple of three"
        ));
    }

    let mut zchars: Vec<u8> = Vec::with_capacity(target.max(src.len() * 4));
    for &b in src {
        let folded = {
            let ch = charset.decode(b);
            ch.to_lowercase().next().unwrap_or(ch)
        };
        if folded == ' ' {
            zchars.push(0);
            continue;
        }
        let code = charset.encode(folded);
        if let Some(i) = charset.alphabet_position(0, code) {
            zchars.push(i as u8 + 6);
        } else if let Some(i) = charset.alphabet_position(1, code) {
            zchars.push(4);
            zchars.push(i as u8 + 6);
        } else if let Some(i) = charset.alphabet_position(2, code) {
            zchars.push(5);
            zchars.push(i as u8 + 6);
        } else {
            // Literal escape carries the original byte, high half first
            zchars.push(5);
            zchars.push(6);
            zchars.push(b >> 5);
            zchars.push(b & 31);
        }
    }

    if target == 0 {
        while zchars.len() % CHARS_PER_WORD != 0 {
            zchars.push(5);
        }
    } else {
        zchars.truncate(target);
        while zchars.len() < target {
            zchars.push(5);
        }
    }

    let mut words: Vec<u16> = zchars
        .chunks(CHARS_PER_WORD)
        .map(|c| ((c[0] as u16) << 10) | ((c[1] as u16) << 5) | (c[2] as u16))
        .collect();
    if let Some(last) = words.last_mut() {
        *last |= 0x8000;
    }
    Ok(words)
}

/// Number of Z-characters in a dictionary key (9, packed into 6 bytes)
pub const KEY_ZCHARS: usize = 9;

/// Encode a token into the fixed 6-byte form dictionary entries begin with
pub fn encode_dictionary_key(charset: &Charset, text: &[u8]) -> Result<[u8; 6], String> {
    let words = encode_zchars(charset, text, KEY_ZCHARS)?;
    let mut key = [0u8; 6];
    for (i, w) in words.iter().enumerate() {
        key[2 * i] = (w >> 8) as u8;
        key[2 * i + 1] = (w & 0xFF) as u8;
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_story;

    #[test]
    fn test_simple_string() {
        // "hello": h=13, e=10, l=17, l=17, o=20 (alphabet index + 6)
        let mut story = test_story();

        // First word: 13, 10, 17 = 0x3551
        story.memory[0x110] = 0x35;
        story.memory[0x111] = 0x51;

        // Second word: 17, 20, pad = 0x4685, end bit set = 0xC685
        story.memory[0x112] = 0xC6;
        story.memory[0x113] = 0x85;

        let charset = Charset::default();
        let (result, len) = decode_string(&story, 0x110, &charset).unwrap();
        assert_eq!(result, "hello");
        assert_eq!(len, 4);
    }

    #[test]
    fn test_string_with_space() {
        // "a b" = 6, 0, 7 with the end bit = 0x9807
        let mut story = test_story();
        story.memory[0x120] = 0x98;
        story.memory[0x121] = 0x07;

        let charset = Charset::default();
        let (result, len) = decode_string(&story, 0x120, &charset).unwrap();
        assert_eq!(result, "a b");
        assert_eq!(len, 2);
    }

    #[test]
    fn test_decode_cat_period() {
        // "cat." = c a t, then shift-to-A2 and '.':
        // 8, 6, 25 = 0x20D9; 5, 18, 5 = 0x1645, end bit = 0x9645
        let mut story = test_story();
        story.memory[0x130] = 0x20;
        story.memory[0x131] = 0xD9;
        story.memory[0x132] = 0x96;
        story.memory[0x133] = 0x45;

        let charset = Charset::default();
        let (result, len) = decode_string(&story, 0x130, &charset).unwrap();
        assert_eq!(result, "cat.");
        assert_eq!(len, 4);
    }

    #[test]
    fn test_uppercase_shift() {
        // "Hi" = shift-A1, h, i = 4, 13, 14 with end bit = 0x91AE
        let mut story = test_story();
        story.memory[0x140] = 0x91;
        story.memory[0x141] = 0xAE;

        let charset = Charset::default();
        let (result, _) = decode_string(&story, 0x140, &charset).unwrap();
        assert_eq!(result, "Hi");
    }

    #[test]
    fn test_encode_is_fixed_width() {
        let charset = Charset::default();
        for target in [3, 6, 9, 12] {
            for text in [&b"x"[..], b"lantern", b"antidisestablishment"] {
                let words = encode_zchars(&charset, text, target).unwrap();
                assert_eq!(words.len(), target / 3);
            }
        }
    }

    #[test]
    fn test_encode_rejects_bad_width() {
        let charset = Charset::default();
        assert!(encode_zchars(&charset, b"abc", 7).is_err());
        assert!(encode_zchars(&charset, b"abc", 1).is_err());
    }

    #[test]
    fn test_terminator_bit_on_last_word_only() {
        let charset = Charset::default();
        let words = encode_zchars(&charset, b"grue lurking in darkness", 0).unwrap();
        for w in &words[..words.len() - 1] {
            assert_eq!(w & 0x8000, 0);
        }
        assert_eq!(words.last().unwrap() & 0x8000, 0x8000);
    }

    #[test]
    fn test_encode_literal_escape() {
        // '@' is in no alphabet: 5, 6, then 64 split as 2 and 0, padded
        let charset = Charset::default();
        let words = encode_zchars(&charset, b"@", 0).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], (5 << 10) | (6 << 5) | 2);
        assert_eq!(words[1], 0x8000 | (5 << 5) | 5);
    }

    #[test]
    fn test_encode_dictionary_key_width() {
        let charset = Charset::default();
        let key = encode_dictionary_key(&charset, b"xyzzy").unwrap();
        // 9 Z-characters in 3 words; only the last has the end bit
        assert_eq!(key.len(), 6);
        assert_eq!(key[0] & 0x80, 0);
        assert_eq!(key[2] & 0x80, 0);
        assert_eq!(key[4] & 0x80, 0x80);
    }

    #[test]
    fn test_key_pads_and_truncates() {
        let charset = Charset::default();
        // 9 chars exactly fill the key; everything past them is ignored
        let long = encode_dictionary_key(&charset, b"frobnicate").unwrap();
        let cut = encode_dictionary_key(&charset, b"frobnicat").unwrap();
        assert_eq!(long, cut);
        // short words pad with Z-character 5
        let short = encode_dictionary_key(&charset, b"at").unwrap();
        let words = encode_zchars(&charset, b"at", 9).unwrap();
        assert_eq!(words[1], (5 << 10) | (5 << 5) | 5);
        assert_eq!(short[2], (words[1] >> 8) as u8);
    }
}
