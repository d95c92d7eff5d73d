use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

fn get_word(bytes: &[u8], pos: usize) -> u16 {
    (bytes[pos] as u16) * 256 + (bytes[pos + 1] as u16)
}

/// The parsed story-file header.
///
/// The header is the configuration surface of the machine: every table the
/// text and lexing core consults (abbreviations, dictionary, alphabet and
/// extra-character overrides, input terminators) is reached through it.
pub struct Header {
    pub version: u8,
    pub release: u16,
    pub serial: String,
    pub base_high_mem: u16,
    pub base_static_mem: u16,
    pub initial_pc: u16,
    pub abbrev_table: u16,
    pub dictionary: u16,
    pub len_file: usize,
    pub checksum_file: u16,
    /// Terminating-characters table (0 = only newline terminates input)
    pub terminating_chars: u16,
    /// Custom alphabet table (0 = the default alphabets)
    pub alphabet_table: u16,
    /// Header extension table (0 = absent)
    pub header_extension: u16,
}

impl Header {
    pub fn new(bytes: &[u8]) -> Header {
        Header {
            version: bytes[0],
            release: get_word(bytes, 2),
            serial: String::from_utf8_lossy(&bytes[0x12..0x18]).into_owned(),
            base_high_mem: get_word(bytes, 4),
            base_static_mem: get_word(bytes, 0x0e),
            initial_pc: get_word(bytes, 6),
            abbrev_table: get_word(bytes, 0x18),
            dictionary: get_word(bytes, 0x08),
            len_file: get_word(bytes, 0x1a) as usize * 2,
            checksum_file: get_word(bytes, 0x1c),
            terminating_chars: get_word(bytes, 0x2e),
            alphabet_table: get_word(bytes, 0x34),
            header_extension: get_word(bytes, 0x36),
        }
    }

    /// Address of the unicode translation table, if the story provides one.
    ///
    /// Lives in word 3 of the header extension table; a missing extension
    /// table or a short one means the default extra characters apply.
    pub fn unicode_table(&self, bytes: &[u8]) -> Option<usize> {
        if self.header_extension == 0 {
            return None;
        }
        let ext = self.header_extension as usize;
        if ext + 7 >= bytes.len() {
            return None;
        }
        let words = get_word(bytes, ext);
        if words < 3 {
            return None;
        }
        match get_word(bytes, ext + 6) {
            0 => None,
            addr => Some(addr as usize),
        }
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(
            f,
            "
Z-code version:           {}
Release number:           {}
Size of resident memory:  {:#06x}
Start PC:                 {:#06x}
Dictionary address:       {:#06x}
Size of dynamic memory:   {:#06x}
Serial number:            {}
Abbreviations address:    {:#06x}
Terminating table:        {:#06x}
Alphabet table:           {:#06x}
File size:                {:#06x}
Checksum:                 {:#06x}
",
            self.version,
            self.release,
            self.base_high_mem,
            self.initial_pc,
            self.dictionary,
            self.base_static_mem,
            self.serial,
            self.abbrev_table,
            self.terminating_chars,
            self.alphabet_table,
            self.len_file,
            self.checksum_file,
        )
    }
}
