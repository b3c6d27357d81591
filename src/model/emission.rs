use crate::error::DecoderError;

/// Mixture terms further than this below the running maximum are skipped
/// (natural log of 1e-10).
pub const LOG_EPS: f64 = -23.02585093;

#[derive(Debug, Clone, PartialEq)]
pub struct Mixture {
    pub log_weight: f64,
    pub mean: Vec<f64>,
    /// Elementwise inverse variance.
    pub precision: Vec<f64>,
    /// Precomputed log-normalizer argument, scaled by -0.5 at evaluation.
    pub norm_term: f64,
}

impl Mixture {
    fn log_score(&self, features: &[f64]) -> f64 {
        let mahalanobis: f64 = features
            .iter()
            .zip(&self.mean)
            .zip(&self.precision)
            .map(|((&x, &mean), &precision)| {
                let diff = x - mean;
                diff * diff * precision
            })
            .sum();
        self.log_weight - 0.5 * (self.norm_term + mahalanobis)
    }
}

/// Gaussian-mixture emission density of one HMM state.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionState {
    dimension: usize,
    mixtures: Vec<Mixture>,
}

impl EmissionState {
    pub fn new(dimension: usize, mixtures: Vec<Mixture>) -> Result<Self, DecoderError> {
        if mixtures.is_empty() {
            return Err(DecoderError::invalid_model(
                "emission state has no mixture components",
            ));
        }
        for (i, mixture) in mixtures.iter().enumerate() {
            if mixture.mean.len() != dimension || mixture.precision.len() != dimension {
                return Err(DecoderError::invalid_model(format!(
                    "mixture {i} has mean/precision lengths {}/{} but state dimension is {dimension}",
                    mixture.mean.len(),
                    mixture.precision.len()
                )));
            }
        }
        Ok(Self {
            dimension,
            mixtures,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn mixture_count(&self) -> usize {
        self.mixtures.len()
    }

    pub fn mixtures(&self) -> &[Mixture] {
        &self.mixtures
    }

    /// Natural-log likelihood of `features` under this state's mixture.
    pub fn log_likelihood(&self, features: &[f64]) -> Result<f64, DecoderError> {
        if features.len() != self.dimension {
            return Err(DecoderError::DimensionMismatch {
                expected: self.dimension,
                actual: features.len(),
            });
        }
        Ok(self
            .mixtures
            .iter()
            .map(|m| m.log_score(features))
            .fold(f64::NEG_INFINITY, log_add))
    }
}

/// Incremental log-sum-exp step: `ln(exp(acc) + exp(score))`, dropping the
/// smaller term when it is below `LOG_EPS` relative to the larger one.
pub fn log_add(acc: f64, score: f64) -> f64 {
    let (hi, lo) = if acc >= score { (acc, score) } else { (score, acc) };
    let diff = lo - hi;
    // NaN (both -inf) fails the comparison and keeps `hi`.
    if diff >= LOG_EPS {
        hi + diff.exp().ln_1p()
    } else {
        hi
    }
}

/// One-frame memo per emission state, indexed like the state table.
#[derive(Debug, Clone, Default)]
pub struct EmissionCache {
    entries: Vec<Option<(usize, f64)>>,
}

impl EmissionCache {
    pub fn new(state_count: usize) -> Self {
        Self {
            entries: vec![None; state_count],
        }
    }

    pub fn evaluate(
        &mut self,
        states: &[EmissionState],
        state_index: usize,
        features: &[f64],
        frame: usize,
    ) -> Result<f64, DecoderError> {
        let state = states.get(state_index).ok_or_else(|| {
            DecoderError::invalid_model(format!("emission state {state_index} does not exist"))
        })?;
        if features.len() != state.dimension() {
            return Err(DecoderError::DimensionMismatch {
                expected: state.dimension(),
                actual: features.len(),
            });
        }
        if self.entries.len() < states.len() {
            self.entries.resize(states.len(), None);
        }
        if let Some((cached_frame, score)) = self.entries[state_index] {
            if cached_frame == frame {
                return Ok(score);
            }
        }
        let score = state.log_likelihood(features)?;
        self.entries[state_index] = Some((frame, score));
        Ok(score)
    }

    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }
}
