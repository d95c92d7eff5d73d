#[cfg(test)]
mod tests {
    use crate::charset::Charset;
    use crate::dictionary::Dictionary;
    use crate::test_utils::{dictionary_base, install_dictionary, test_story, TEST_DICT_ADDR};
    use crate::text::encode_dictionary_key;
    use test_log::test;

    const WORDS: [&str; 7] = ["look", "door", "cat", "take", "open", "go", "xyzzy"];

    /// Words ordered the way their encoded keys sort
    fn words_in_key_order(charset: &Charset) -> Vec<&'static str> {
        let mut words = WORDS.to_vec();
        words.sort_by_key(|w| encode_dictionary_key(charset, w.as_bytes()).unwrap());
        words
    }

    #[test]
    fn test_header_parse() {
        let mut story = test_story();
        install_dictionary(&mut story, TEST_DICT_ADDR, b",.", &WORDS, true);

        let dict = Dictionary::builtin(&story);
        assert_eq!(dict.separators, vec![b',', b'.']);
        assert_eq!(dict.entry_length, 9);
        assert_eq!(dict.entry_count, 7);
        assert!(dict.sorted);
    }

    #[test]
    fn test_lookup_finds_every_word() {
        let mut story = test_story();
        let charset = Charset::default();
        install_dictionary(&mut story, TEST_DICT_ADDR, b",", &WORDS, true);

        let dict = Dictionary::builtin(&story);
        let base = dictionary_base(TEST_DICT_ADDR, 1);
        for (k, word) in words_in_key_order(&charset).iter().enumerate() {
            let key = encode_dictionary_key(&charset, word.as_bytes()).unwrap();
            let addr = dict.lookup(&story, &key);
            assert_eq!(addr, base + 9 * k as u16, "word '{word}'");
        }
    }

    #[test]
    fn test_lookup_miss_returns_zero() {
        let mut story = test_story();
        let charset = Charset::default();
        install_dictionary(&mut story, TEST_DICT_ADDR, b",", &WORDS, true);

        let dict = Dictionary::builtin(&story);
        for word in ["grue", "zzz", "a", "cats"] {
            let key = encode_dictionary_key(&charset, word.as_bytes()).unwrap();
            assert_eq!(dict.lookup(&story, &key), 0, "word '{word}'");
        }
    }

    #[test]
    fn test_binary_and_linear_agree() {
        // The same sorted entries once with an unsigned count (binary
        // search) and once with a negative count (linear scan) must
        // resolve every key identically.
        let mut story = test_story();
        let charset = Charset::default();
        let ordered = words_in_key_order(&charset);

        install_dictionary(&mut story, TEST_DICT_ADDR, b",", &WORDS, true);
        install_dictionary(&mut story, 0x0B00, b",", &ordered, false);

        let builtin = Dictionary::builtin(&story);
        let user = Dictionary::user(&story, 0x0B00);
        assert!(!user.sorted);
        assert_eq!(user.entry_count, 7);

        let builtin_base = dictionary_base(TEST_DICT_ADDR, 1);
        let user_base = dictionary_base(0x0B00, 1);
        for word in WORDS.iter().chain(["grue", "mailbox"].iter()) {
            let key = encode_dictionary_key(&charset, word.as_bytes()).unwrap();
            let a = builtin.lookup(&story, &key);
            let b = user.lookup(&story, &key);
            if a == 0 {
                assert_eq!(b, 0, "word '{word}'");
            } else {
                assert_eq!(a - builtin_base, b - user_base, "word '{word}'");
            }
        }
    }

    #[test]
    fn test_user_dictionary_with_positive_count_is_sorted() {
        let mut story = test_story();
        let charset = Charset::default();
        install_dictionary(&mut story, 0x0B00, b"", &WORDS, true);

        let user = Dictionary::user(&story, 0x0B00);
        assert!(user.sorted);

        let key = encode_dictionary_key(&charset, b"xyzzy").unwrap();
        assert_ne!(user.lookup(&story, &key), 0);
    }

    #[test]
    fn test_lookup_uses_first_nine_characters_only() {
        let mut story = test_story();
        let charset = Charset::default();
        install_dictionary(&mut story, TEST_DICT_ADDR, b"", &["frobnicat"], true);

        let dict = Dictionary::builtin(&story);
        let key = encode_dictionary_key(&charset, b"frobnicator").unwrap();
        assert_ne!(dict.lookup(&story, &key), 0);
    }

    #[test]
    fn test_empty_dictionary() {
        let story = test_story();
        let charset = Charset::default();

        let dict = Dictionary::builtin(&story);
        assert_eq!(dict.entry_count, 0);
        let key = encode_dictionary_key(&charset, b"look").unwrap();
        assert_eq!(dict.lookup(&story, &key), 0);
    }
}
