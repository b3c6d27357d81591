use crate::dictionary::Dictionary;
use crate::error::DecoderError;
use crate::types::{RecognizedWord, Score, WordId};

/// Handle to a record in a `HistoryArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryId(usize);

impl HistoryId {
    pub(crate) fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Word boundary crossed by a hypothesis. Records are never mutated and
/// only point backwards, so the arena forms a tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordLinkRecord {
    pub frame: usize,
    /// Cumulative path score at the boundary.
    pub score: Score,
    /// `None` for word nodes whose label is not in the dictionary.
    pub word_id: Option<WordId>,
    pub parent: Option<HistoryId>,
}

/// Append-only store of word-link records for one utterance.
#[derive(Debug, Clone, Default)]
pub struct HistoryArena {
    records: Vec<WordLinkRecord>,
}

impl HistoryArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: WordLinkRecord) -> HistoryId {
        debug_assert!(record.parent.map_or(true, |p| p.0 < self.records.len()));
        let id = HistoryId(self.records.len());
        self.records.push(record);
        id
    }

    pub fn get(&self, id: HistoryId) -> &WordLinkRecord {
        &self.records[id.0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Records from `start` back to the root, newest first.
    pub fn ancestors(&self, start: Option<HistoryId>) -> impl Iterator<Item = &WordLinkRecord> {
        std::iter::successors(start.map(|id| self.get(id)), |record| {
            record.parent.map(|id| self.get(id))
        })
    }
}

/// Rebuilds the recognized word sequence ending at `final_history`.
/// Each word's score is the gain over the previous word's cumulative score.
pub fn backtrace(
    final_history: Option<HistoryId>,
    arena: &HistoryArena,
    dictionary: &Dictionary,
) -> Result<Vec<RecognizedWord>, DecoderError> {
    let Some(last) = final_history else {
        return Err(DecoderError::EmptyHistory);
    };

    let mut chain = arena
        .ancestors(Some(last))
        .filter_map(|record| record.word_id.map(|id| (id, record.frame, record.score)))
        .collect::<Vec<_>>();
    chain.reverse();

    let mut previous = 0.0;
    let mut words = Vec::with_capacity(chain.len());
    for (word_id, frame, score) in chain {
        let word = dictionary.word(word_id).ok_or_else(|| {
            DecoderError::invalid_input(format!("history references unknown word id {word_id}"))
        })?;
        tracing::debug!(word, end_frame = frame, score, "backtrace: word");
        words.push(RecognizedWord {
            word: word.to_string(),
            end_frame: frame,
            score_delta: score - previous,
        });
        previous = score;
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> Dictionary {
        let mut dict = Dictionary::new();
        dict.add_pronunciation("SIL", ["sil"]);
        dict.add_pronunciation("HELLO", ["hh", "ah", "l", "ow"]);
        dict.add_pronunciation("WORLD", ["w", "er", "l", "d"]);
        dict
    }

    fn record(frame: usize, score: Score, word_id: Option<WordId>, parent: Option<HistoryId>) -> WordLinkRecord {
        WordLinkRecord {
            frame,
            score,
            word_id,
            parent,
        }
    }

    #[test]
    fn empty_history_is_an_error() {
        let arena = HistoryArena::new();
        let result = backtrace(None, &arena, &dictionary());
        assert!(matches!(result, Err(DecoderError::EmptyHistory)));
    }

    #[test]
    fn words_come_out_in_chronological_order_with_deltas() {
        let mut arena = HistoryArena::new();
        let a = arena.push(record(4, -10.0, Some(0), None));
        let b = arena.push(record(9, -25.0, Some(1), Some(a)));
        let c = arena.push(record(15, -31.0, Some(2), Some(b)));

        let words = backtrace(Some(c), &arena, &dictionary()).unwrap();
        let summary: Vec<_> = words
            .iter()
            .map(|w| (w.word.as_str(), w.end_frame, w.score_delta))
            .collect();
        assert_eq!(
            summary,
            vec![("SIL", 4, -10.0), ("HELLO", 9, -15.0), ("WORLD", 15, -6.0)]
        );
    }

    #[test]
    fn records_without_word_are_skipped() {
        let mut arena = HistoryArena::new();
        let a = arena.push(record(2, -5.0, Some(1), None));
        let b = arena.push(record(3, -6.0, None, Some(a)));
        let c = arena.push(record(7, -9.0, Some(2), Some(b)));
        let words = backtrace(Some(c), &arena, &dictionary()).unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].word, "WORLD");
        assert_eq!(words[1].score_delta, -4.0);
    }

    #[test]
    fn shared_ancestors_serve_several_branches() {
        let mut arena = HistoryArena::new();
        let root = arena.push(record(1, -1.0, Some(0), None));
        let left = arena.push(record(5, -4.0, Some(1), Some(root)));
        let right = arena.push(record(6, -3.0, Some(2), Some(root)));
        assert_eq!(arena.ancestors(Some(left)).count(), 2);
        assert_eq!(arena.ancestors(Some(right)).count(), 2);
        let words = backtrace(Some(right), &arena, &dictionary()).unwrap();
        assert_eq!(words[0].word, "SIL");
        assert_eq!(words[1].word, "WORLD");
    }

    #[test]
    fn unknown_word_id_is_reported() {
        let mut arena = HistoryArena::new();
        let a = arena.push(record(1, -1.0, Some(42), None));
        assert!(backtrace(Some(a), &arena, &dictionary()).is_err());
    }
}
