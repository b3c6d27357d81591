use std::collections::HashMap;

use crate::types::WordId;

/// Pronunciation dictionary: dense word ids, each with one or more phone sequences.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    word_to_id: HashMap<String, WordId>,
    words: Vec<String>,
    pronunciations: Vec<Vec<Vec<String>>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pronunciation, allocating the next id on first sight of `word`.
    pub fn add_pronunciation<I, S>(&mut self, word: &str, phones: I) -> WordId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = match self.word_to_id.get(word) {
            Some(&id) => id,
            None => {
                let id = self.words.len();
                self.word_to_id.insert(word.to_string(), id);
                self.words.push(word.to_string());
                self.pronunciations.push(Vec::new());
                id
            }
        };
        let phones: Vec<String> = phones.into_iter().map(Into::into).collect();
        if !phones.is_empty() {
            self.pronunciations[id].push(phones);
        }
        id
    }

    pub fn id(&self, word: &str) -> Option<WordId> {
        self.word_to_id.get(word).copied()
    }

    pub fn word(&self, id: WordId) -> Option<&str> {
        self.words.get(id).map(String::as_str)
    }

    pub fn pronunciations(&self, id: WordId) -> &[Vec<String>] {
        self.pronunciations.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_first_appearance() {
        let mut dict = Dictionary::new();
        assert_eq!(dict.add_pronunciation("ONE", ["w", "ah", "n"]), 0);
        assert_eq!(dict.add_pronunciation("TWO", ["t", "uw"]), 1);
        assert_eq!(dict.add_pronunciation("ONE", ["hh", "w", "ah", "n"]), 0);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.id("TWO"), Some(1));
        assert_eq!(dict.word(0), Some("ONE"));
        assert_eq!(dict.pronunciations(0).len(), 2);
        assert_eq!(dict.pronunciations(1), &[vec!["t".to_string(), "uw".to_string()]]);
    }

    #[test]
    fn unknown_lookups_are_empty() {
        let dict = Dictionary::new();
        assert!(dict.is_empty());
        assert_eq!(dict.id("X"), None);
        assert_eq!(dict.word(3), None);
        assert!(dict.pronunciations(3).is_empty());
    }

    #[test]
    fn empty_pronunciation_registers_word_only() {
        let mut dict = Dictionary::new();
        let id = dict.add_pronunciation("SIL", Vec::<String>::new());
        assert_eq!(dict.word(id), Some("SIL"));
        assert!(dict.pronunciations(id).is_empty());
    }
}
