use crate::error::DecoderError;

/// Square matrix of transition probabilities (not logs); 0 means no edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    size: usize,
    probs: Vec<f64>,
}

impl TransitionMatrix {
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, DecoderError> {
        let size = rows.len();
        let mut probs = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(DecoderError::invalid_model(format!(
                    "transition row {i} has {} columns, expected {size}",
                    row.len()
                )));
            }
            if let Some(p) = row.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                return Err(DecoderError::invalid_model(format!(
                    "transition row {i} holds {p}, probabilities must lie in [0, 1]"
                )));
            }
            probs.extend(row);
        }
        Ok(Self { size, probs })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn prob(&self, from: usize, to: usize) -> f64 {
        self.probs[from * self.size + to]
    }
}

/// Phone model topology. States 0 and N-1 are non-emitting.
#[derive(Debug, Clone, PartialEq)]
pub struct Hmm {
    pub label: String,
    /// Index declared by the model provider.
    pub index: usize,
    /// Global emission-state index per HMM state; ends are placeholders.
    pub state_indices: Vec<usize>,
    pub transition_index: usize,
}

impl Hmm {
    pub fn state_count(&self) -> usize {
        self.state_indices.len()
    }

    /// Range of emitting HMM states, `1..N-1`.
    pub fn emitting_states(&self) -> std::ops::Range<usize> {
        1..self.state_count().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_accepts_square_probabilities() {
        let trans =
            TransitionMatrix::from_rows(vec![vec![0.0, 1.0, 0.0], vec![0.0, 0.5, 0.5], vec![0.0; 3]])
                .unwrap();
        assert_eq!(trans.size(), 3);
        assert_eq!(trans.prob(0, 1), 1.0);
        assert_eq!(trans.prob(1, 2), 0.5);
        assert_eq!(trans.prob(2, 2), 0.0);
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let result = TransitionMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]);
        assert!(matches!(result, Err(DecoderError::InvalidModel { .. })));
    }

    #[test]
    fn from_rows_rejects_log_values() {
        let result = TransitionMatrix::from_rows(vec![vec![0.0, -0.3], vec![0.0, 0.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn emitting_states_skip_entry_and_exit() {
        let hmm = Hmm {
            label: "ah".to_string(),
            index: 4,
            state_indices: vec![0, 11, 12, 13, 0],
            transition_index: 2,
        };
        assert_eq!(hmm.state_count(), 5);
        assert_eq!(hmm.emitting_states(), 1..4);
    }
}
