use std::path::Path;

use super::{read_text, value_after, LineReader};
use crate::error::DecoderError;
use crate::model::{EmissionState, Mixture};

const CONTEXT: &str = "states";

pub fn read_states(path: &Path) -> Result<Vec<EmissionState>, DecoderError> {
    parse_states(&read_text(path, "reading states")?)
}

struct PendingState {
    line: usize,
    mixtures: Vec<Option<Mixture>>,
}

/// Parses the emission-state table. States are addressed by their position
/// in the file; the `State: i` label is informational.
pub fn parse_states(text: &str) -> Result<Vec<EmissionState>, DecoderError> {
    let mut reader = LineReader::new(CONTEXT, text);
    let mut dimension: Option<usize> = None;
    let mut declared: Option<usize> = None;
    let mut pending: Vec<PendingState> = Vec::new();

    while let Some((line_no, line)) = reader.next_line() {
        if line.starts_with("feature_size") {
            let value = value_after(line, &['='])
                .ok_or_else(|| reader.error(line_no, "expected 'feature_size = <D>'"))?;
            dimension = Some(reader.number(line_no, value, "feature size")?);
            let (count_line, count) = reader.field("num_states")?;
            declared = Some(reader.number(count_line, count, "state count")?);
        } else if line.starts_with("State") {
            pending.push(PendingState {
                line: line_no,
                mixtures: Vec::new(),
            });
        } else if line.starts_with("nummixes") {
            let state = pending
                .last_mut()
                .ok_or_else(|| reader.error(line_no, "'nummixes' before any 'State'"))?;
            let value = value_after(line, &[':'])
                .ok_or_else(|| reader.error(line_no, "expected 'nummixes: <m>'"))?;
            let count: usize = reader.number(line_no, value, "mixture count")?;
            state.mixtures = vec![None; count];
        } else if line.starts_with("mixture") {
            let dim = dimension
                .ok_or_else(|| reader.error(line_no, "'mixture' before 'feature_size'"))?;
            let value = value_after(line, &[':'])
                .ok_or_else(|| reader.error(line_no, "expected 'mixture: <k>'"))?;
            let k: usize = reader.number(line_no, value, "mixture number")?;
            let mixture = parse_mixture(&mut reader, dim)?;

            let state = pending
                .last_mut()
                .ok_or_else(|| reader.error(line_no, "'mixture' before any 'State'"))?;
            let count = state.mixtures.len();
            let slot = k
                .checked_sub(1)
                .and_then(|i| state.mixtures.get_mut(i))
                .ok_or_else(|| reader.error(line_no, format!("mixture {k} outside 1..={count}")))?;
            *slot = Some(mixture);
        } else {
            return Err(reader.error(line_no, format!("unrecognized line '{line}'")));
        }
    }

    let dim = dimension.ok_or_else(|| reader.error(1, "missing 'feature_size' header"))?;
    if let Some(declared) = declared.filter(|&d| d != pending.len()) {
        tracing::warn!(declared, found = pending.len(), "states: count differs from header");
    }

    let states = pending
        .into_iter()
        .map(|state| {
            let mixtures = state
                .mixtures
                .into_iter()
                .enumerate()
                .map(|(i, m)| {
                    m.ok_or_else(|| reader.error(state.line, format!("mixture {} is missing", i + 1)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            EmissionState::new(dim, mixtures)
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(states = states.len(), dimension = dim, "states: parsed");
    Ok(states)
}

/// Weight, mean, precision and normalizer lines of one mixture component.
fn parse_mixture(reader: &mut LineReader<'_>, dimension: usize) -> Result<Mixture, DecoderError> {
    let (weight_line, weight) = reader.field("mixture weight")?;
    let log_weight = reader.number(weight_line, weight, "mixture weight")?;
    let (mean_line, mean) = reader.field("mean")?;
    let mean: Vec<f64> = reader.numbers(mean_line, mean, "mean value")?;
    let (prec_line, precision) = reader.field("precision")?;
    let precision: Vec<f64> = reader.numbers(prec_line, precision, "precision value")?;
    let (norm_line, norm) = reader.field("normalizer")?;
    let norm_term = reader.number(norm_line, norm, "normalizer")?;

    for (line, values, what) in [(mean_line, &mean, "mean"), (prec_line, &precision, "precision")] {
        if values.len() != dimension {
            return Err(reader.error(
                line,
                format!("{what} has {} values, feature size is {dimension}", values.len()),
            ));
        }
    }
    Ok(Mixture {
        log_weight,
        mean,
        precision,
        norm_term,
    })
}
