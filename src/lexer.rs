//! Input tokenization
//!
//! Splits a read buffer into words at whitespace and at the dictionary's
//! hard separators, then fills the caller's parse buffer with one quad per
//! token: dictionary address (0 for unknown words), token length, and the
//! token's offset within the read buffer.

use crate::charset::Charset;
use crate::dictionary::Dictionary;
use crate::story::Story;
use crate::text::encode_dictionary_key;
use log::debug;

/// A token's position within the input text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub len: usize,
}

fn is_space(b: u8) -> bool {
    b == b' ' || b == 9
}

/// Split input bytes into tokens.
///
/// Whitespace runs are skipped; a separator byte always stands alone as a
/// one-byte token; anything else runs until the next whitespace or
/// separator.
pub fn split_tokens(text: &[u8], separators: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < text.len() {
        let b = text[i];
        if is_space(b) {
            i += 1;
            continue;
        }
        if separators.contains(&b) {
            tokens.push(Token { start: i, len: 1 });
            i += 1;
            continue;
        }
        let start = i;
        while i < text.len() && !is_space(text[i]) && !separators.contains(&text[i]) {
            i += 1;
        }
        tokens.push(Token {
            start,
            len: i - start,
        });
    }
    tokens
}

/// Tokenize the read buffer at `text_buffer` into the parse buffer.
///
/// `user_dict` of 0 means the built-in dictionary. With
/// `skip_unrecognized` set, words the dictionary does not know leave no
/// quad behind; otherwise they are recorded with address 0, which games
/// inspect.
pub fn tokenize(
    story: &mut Story,
    charset: &Charset,
    text_buffer: u32,
    parse_buffer: u32,
    user_dict: u16,
    skip_unrecognized: bool,
) -> Result<(), String> {
    let len = story.read_byte(text_buffer + 1) as usize;
    let text = story.read_bytes(text_buffer + 2, len);

    let dict = if user_dict == 0 {
        Dictionary::builtin(story)
    } else {
        Dictionary::user(story, user_dict as u32)
    };

    let max_tokens = story.read_byte(parse_buffer) as usize;
    let mut count = 0usize;

    for token in split_tokens(&text, &dict.separators) {
        if count >= max_tokens {
            debug!("parse buffer full after {count} tokens");
            break;
        }
        let word = &text[token.start..token.start + token.len];
        let key = encode_dictionary_key(charset, word)?;
        let addr = dict.lookup(story, &key);
        debug!(
            "token '{}' at {} -> {:04x}",
            String::from_utf8_lossy(word),
            token.start,
            addr
        );
        if addr == 0 && skip_unrecognized {
            continue;
        }
        let quad = parse_buffer + 2 + 4 * count as u32;
        story.write_word(quad, addr)?;
        story.write_byte(quad + 2, token.len as u8)?;
        story.write_byte(quad + 3, (2 + token.start) as u8)?;
        count += 1;
    }

    story.write_byte(parse_buffer + 1, count as u8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_words() {
        let tokens = split_tokens(b"go north", &[]);
        assert_eq!(
            tokens,
            vec![Token { start: 0, len: 2 }, Token { start: 3, len: 5 }]
        );
    }

    #[test]
    fn test_split_collapses_whitespace() {
        let tokens = split_tokens(b"  take \t lamp  ", &[]);
        assert_eq!(
            tokens,
            vec![Token { start: 2, len: 4 }, Token { start: 9, len: 4 }]
        );
    }

    #[test]
    fn test_separator_is_its_own_token() {
        let tokens = split_tokens(b"look at door,", b",");
        assert_eq!(
            tokens,
            vec![
                Token { start: 0, len: 4 },
                Token { start: 5, len: 2 },
                Token { start: 8, len: 4 },
                Token { start: 12, len: 1 },
            ]
        );
    }

    #[test]
    fn test_separator_splits_without_space() {
        let tokens = split_tokens(b"all,lamp", b",");
        assert_eq!(
            tokens,
            vec![
                Token { start: 0, len: 3 },
                Token { start: 3, len: 1 },
                Token { start: 4, len: 4 },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(split_tokens(b"", b",").is_empty());
        assert!(split_tokens(b"   ", b",").is_empty());
    }

    #[test]
    fn test_tokens_cover_non_whitespace() {
        // concatenated token slices reproduce everything except whitespace
        let text = b"put all, then  some,in sack";
        let seps = b",";
        let tokens = split_tokens(text, seps);
        let mut rebuilt = Vec::new();
        for t in &tokens {
            rebuilt.extend_from_slice(&text[t.start..t.start + t.len]);
        }
        let expect: Vec<u8> = text
            .iter()
            .copied()
            .filter(|&b| b != b' ' && b != 9)
            .collect();
        assert_eq!(rebuilt, expect);
    }
}
