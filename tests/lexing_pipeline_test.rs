//! End-to-end pass over the public surface: load a hand-built story,
//! print through a capture table, then read and tokenize a command.

use lantern::charset::Charset;
use lantern::exec::Exec;
use lantern::io_headless::HeadlessIo;
use lantern::story::Story;
use lantern::text::{encode_dictionary_key, encode_zchars};
use lantern::text_system::TextSystem;

const DICT_ADDR: usize = 0x0A00;
const ROM_START: usize = 0x0F00;

struct NoExec;

impl Exec for NoExec {
    fn enter_routine(&mut self, _addr: u16, _args: &[u16]) -> Result<(), String> {
        Err("no routine should run in this test".to_string())
    }
    fn run_to_return(&mut self) -> Result<(), String> {
        Ok(())
    }
    fn pop_result(&mut self) -> Result<u16, String> {
        Ok(0)
    }
}

fn build_story() -> Story {
    let mut data = vec![0u8; 0x2000];

    // Header: version 5, dictionary, static base, abbreviations
    data[0x00] = 5;
    data[0x08] = (DICT_ADDR >> 8) as u8;
    data[0x09] = (DICT_ADDR & 0xFF) as u8;
    data[0x0E] = (ROM_START >> 8) as u8;
    data[0x0F] = (ROM_START & 0xFF) as u8;
    data[0x18] = 0x05;
    data[0x19] = 0x00;

    // Dictionary: one separator, 9-byte entries, sorted
    let charset = Charset::default();
    let mut words = ["open", "mailbox", "read", "leaflet"];
    words.sort_by_key(|w| encode_dictionary_key(&charset, w.as_bytes()).unwrap());

    data[DICT_ADDR] = 1;
    data[DICT_ADDR + 1] = b',';
    data[DICT_ADDR + 2] = 9;
    data[DICT_ADDR + 3] = 0;
    data[DICT_ADDR + 4] = words.len() as u8;
    let mut entry = DICT_ADDR + 5;
    for word in words {
        let key = encode_dictionary_key(&charset, word.as_bytes()).unwrap();
        data[entry..entry + 6].copy_from_slice(&key);
        entry += 9;
    }

    // A greeting string at 0x800
    let greeting = encode_zchars(&charset, b"welcome.", 0).unwrap();
    let mut at = 0x800;
    for w in greeting {
        data[at] = (w >> 8) as u8;
        data[at + 1] = (w & 0xFF) as u8;
        at += 2;
    }

    Story::from_memory(data).unwrap()
}

#[test]
fn story_round_trip() {
    let mut story = build_story();
    let mut io = HeadlessIo::new();
    let mut exec = NoExec;
    let mut ts = TextSystem::new(&story);

    // Decode the greeting straight out of memory and print it captured
    let (greeting, consumed) = ts.decode_string_at(&story, 0x800).unwrap();
    assert_eq!(greeting, "welcome.");
    assert_eq!(consumed, 6);

    ts.set_output_stream(&mut story, &mut io, 3, 0x300).unwrap();
    ts.print_string(&mut io, &greeting).unwrap();
    ts.set_output_stream(&mut story, &mut io, -3, 0).unwrap();
    assert_eq!(story.read_word(0x300), 8);
    assert_eq!(story.read_bytes(0x302, 8), b"welcome.");
    assert_eq!(io.screen(), "");

    // Read a command and tokenize it against the built-in dictionary
    io.push_line("Open mailbox, read leaflet");
    story.memory[0x100] = 40; // read buffer capacity
    story.memory[0x200] = 10; // parse buffer capacity

    let term = ts
        .read_line_impl(&mut story, &mut io, &mut exec, 0x100, 0x200, 0, 0)
        .unwrap();
    assert_eq!(term, 13);
    assert_eq!(
        story.read_bytes(0x102, story.read_byte(0x101) as usize),
        b"open mailbox, read leaflet"
    );

    // open, mailbox, ",", read, leaflet
    assert_eq!(story.read_byte(0x201), 5);

    let quad = |n: u32| {
        (
            story.read_word(0x202 + 4 * n),
            story.read_byte(0x204 + 4 * n),
            story.read_byte(0x205 + 4 * n),
        )
    };

    let (open_addr, open_len, open_off) = quad(0);
    assert_ne!(open_addr, 0);
    assert_eq!((open_len, open_off), (4, 2));

    let (mailbox_addr, mailbox_len, mailbox_off) = quad(1);
    assert_ne!(mailbox_addr, 0);
    assert_eq!((mailbox_len, mailbox_off), (7, 7));

    // The separator is a token by itself, and unknown to the dictionary
    let (comma_addr, comma_len, comma_off) = quad(2);
    assert_eq!(comma_addr, 0);
    assert_eq!((comma_len, comma_off), (1, 14));

    let (read_addr, ..) = quad(3);
    let (leaflet_addr, ..) = quad(4);
    assert_ne!(read_addr, 0);
    assert_ne!(leaflet_addr, 0);
    assert_ne!(read_addr, leaflet_addr);
}
