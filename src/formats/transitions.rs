use std::collections::HashMap;
use std::path::Path;

use super::{read_text, LineReader};
use crate::error::DecoderError;
use crate::model::TransitionMatrix;

const CONTEXT: &str = "transitions";

pub fn read_transitions(path: &Path) -> Result<HashMap<usize, TransitionMatrix>, DecoderError> {
    parse_transitions(&read_text(path, "reading transitions")?)
}

/// Matrices introduced by an `<index>.<rows>` header line followed by
/// `rows` lines of probabilities.
pub fn parse_transitions(text: &str) -> Result<HashMap<usize, TransitionMatrix>, DecoderError> {
    let mut reader = LineReader::new(CONTEXT, text);
    let mut matrices = HashMap::new();
    while let Some((line_no, line)) = reader.next_line() {
        if line.starts_with("num_transitions") {
            continue;
        }
        let (index, rows) = line.split_once('.').ok_or_else(|| {
            reader.error(line_no, format!("expected '<index>.<rows>' header, found '{line}'"))
        })?;
        let index: usize = reader.number(line_no, index, "matrix index")?;
        let rows: usize = reader.number(line_no, rows, "row count")?;

        let mut probs = Vec::with_capacity(rows);
        for _ in 0..rows {
            let (row_line, row) = reader.expect_line("matrix row")?;
            probs.push(reader.numbers::<f64>(row_line, row, "probability")?);
        }
        let matrix = TransitionMatrix::from_rows(probs)
            .map_err(|e| reader.error(line_no, format!("matrix {index}: {e}")))?;
        if matrices.insert(index, matrix).is_some() {
            return Err(reader.error(line_no, format!("matrix {index} defined twice")));
        }
    }
    tracing::debug!(matrices = matrices.len(), "transitions: parsed");
    Ok(matrices)
}
