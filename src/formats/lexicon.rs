use std::path::Path;

use super::{read_text, LineReader};
use crate::dictionary::Dictionary;
use crate::error::DecoderError;

const CONTEXT: &str = "lexicon";

pub fn read_lexicon(path: &Path) -> Result<Dictionary, DecoderError> {
    parse_lexicon(&read_text(path, "reading lexicon")?)
}

/// One `WORD PH1 PH2 ...` entry per line. A word seen again adds an
/// alternative pronunciation.
pub fn parse_lexicon(text: &str) -> Result<Dictionary, DecoderError> {
    let mut reader = LineReader::new(CONTEXT, text);
    let mut dictionary = Dictionary::new();
    let mut entries = 0usize;
    while let Some((_, line)) = reader.next_line() {
        let mut columns = line.split_whitespace();
        let Some(word) = columns.next() else {
            continue;
        };
        let phones: Vec<&str> = columns.collect();
        if phones.is_empty() {
            tracing::warn!(word, "lexicon: entry has no phones");
        }
        dictionary.add_pronunciation(word, phones);
        entries += 1;
    }
    tracing::debug!(entries, words = dictionary.len(), "lexicon: parsed");
    Ok(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_get_ids_in_file_order() {
        let dict = parse_lexicon("SIL sil\n\nHELLO hh ah l ow\n  WORLD w er l d  \n").unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.id("SIL"), Some(0));
        assert_eq!(dict.id("WORLD"), Some(2));
        assert_eq!(dict.pronunciations(1)[0], vec!["hh", "ah", "l", "ow"]);
    }

    #[test]
    fn repeated_word_adds_pronunciation() {
        let dict = parse_lexicon("TOMATO t ah m ey t ow\nTOMATO t ah m aa t ow\n").unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.pronunciations(0).len(), 2);
    }

    #[test]
    fn word_without_phones_is_kept() {
        let dict = parse_lexicon("EMPTY\nA a\n").unwrap();
        assert_eq!(dict.id("EMPTY"), Some(0));
        assert!(dict.pronunciations(0).is_empty());
    }
}
