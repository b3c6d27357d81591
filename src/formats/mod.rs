//! Readers for the on-disk lexicon, model, emission-state, transition,
//! network and feature files.

use std::path::Path;
use std::str::FromStr;

use crate::error::DecoderError;

mod features;
mod lexicon;
mod models;
mod network;
mod states;
mod transitions;

pub use features::{decode_features, read_features};
pub use lexicon::{parse_lexicon, read_lexicon};
pub use models::{parse_models, read_models};
pub use network::{parse_network, read_network};
pub use states::{parse_states, read_states};
pub use transitions::{parse_transitions, read_transitions};

fn read_text(path: &Path, context: &'static str) -> Result<String, DecoderError> {
    std::fs::read_to_string(path).map_err(|e| DecoderError::io(context, e))
}

/// Cursor over the non-blank lines of a text file, tracking 1-based line numbers.
struct LineReader<'a> {
    context: &'static str,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> LineReader<'a> {
    fn new(context: &'static str, text: &'a str) -> Self {
        Self {
            context,
            lines: text.lines().enumerate(),
            last_line: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        for (i, line) in self.lines.by_ref() {
            self.last_line = i + 1;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Some((i + 1, trimmed));
            }
        }
        None
    }

    fn expect_line(&mut self, what: &str) -> Result<(usize, &'a str), DecoderError> {
        self.next_line()
            .ok_or_else(|| self.error(self.last_line + 1, format!("unexpected end of file, expected {what}")))
    }

    /// Next line of the form `key: value` (or `key = value`); the key itself is not checked.
    fn field(&mut self, what: &str) -> Result<(usize, &'a str), DecoderError> {
        let (line_no, line) = self.expect_line(what)?;
        let value = value_after(line, &[':', '='])
            .ok_or_else(|| self.error(line_no, format!("expected '{what}: <value>', found '{line}'")))?;
        Ok((line_no, value))
    }

    fn error(&self, line: usize, message: impl Into<String>) -> DecoderError {
        DecoderError::parse(self.context, line, message)
    }

    fn number<T: FromStr>(&self, line: usize, token: &str, what: &str) -> Result<T, DecoderError> {
        token
            .trim()
            .parse()
            .map_err(|_| self.error(line, format!("invalid {what} '{}'", token.trim())))
    }

    fn numbers<T: FromStr>(&self, line: usize, text: &str, what: &str) -> Result<Vec<T>, DecoderError> {
        text.split_whitespace()
            .map(|token| self.number(line, token, what))
            .collect()
    }
}

/// Text after the first of `separators`, trimmed.
fn value_after<'a>(line: &'a str, separators: &[char]) -> Option<&'a str> {
    line.split_once(separators).map(|(_, value)| value.trim())
}
