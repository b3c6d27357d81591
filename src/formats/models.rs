use std::path::Path;

use super::{read_text, value_after, LineReader};
use crate::error::DecoderError;
use crate::model::Hmm;

const CONTEXT: &str = "models";

pub fn read_models(path: &Path) -> Result<Vec<Hmm>, DecoderError> {
    parse_models(&read_text(path, "reading models")?)
}

/// Model blocks introduced by `index: i`, followed in order by the label,
/// state count, transition index and state index list lines. A leading
/// `num_models` line is informational.
pub fn parse_models(text: &str) -> Result<Vec<Hmm>, DecoderError> {
    let mut reader = LineReader::new(CONTEXT, text);
    let mut models = Vec::new();
    while let Some((line_no, line)) = reader.next_line() {
        if line.starts_with("num_models") {
            continue;
        }
        if !line.starts_with("index") {
            return Err(reader.error(line_no, format!("expected 'index: <n>', found '{line}'")));
        }
        let index_text = value_after(line, &[':'])
            .ok_or_else(|| reader.error(line_no, "missing model index"))?;
        let index = reader.number(line_no, index_text, "model index")?;

        let (_, label) = reader.field("label")?;
        let (count_line, count_text) = reader.field("number of states")?;
        let state_count: usize = reader.number(count_line, count_text, "state count")?;
        let (trans_line, trans_text) = reader.field("transition index")?;
        let transition_index = reader.number(trans_line, trans_text, "transition index")?;
        let (list_line, list_text) = reader.field("state indices")?;
        let state_indices: Vec<usize> = reader.numbers(list_line, list_text, "state index")?;

        if state_indices.len() != state_count {
            return Err(reader.error(
                list_line,
                format!(
                    "model '{label}' declares {state_count} states but lists {} state indices",
                    state_indices.len()
                ),
            ));
        }
        models.push(Hmm {
            label: label.to_string(),
            index,
            state_indices,
            transition_index,
        });
    }
    tracing::debug!(models = models.len(), "models: parsed");
    Ok(models)
}
