use std::fmt;

/// Result of a training run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptimResult<F> {
    /// Number of weight updates performed.
    pub iterations: usize,
    /// Cost (sum of the cost array) observed before each update.
    pub cost_history: Vec<F>,
    /// Cost after the last update.
    pub final_cost: F,
    /// Reason for termination.
    pub termination: TerminationReason,
}

impl<F: Copy> OptimResult<F> {
    /// Cost seen before the first update, or the final cost if none was made.
    pub fn initial_cost(&self) -> F {
        self.cost_history.first().copied().unwrap_or(self.final_cost)
    }
}

/// Why the optimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerminationReason {
    /// Reached the configured number of iterations.
    MaxIterations,
    /// The model exposes no weights to update.
    NoTrainableParameters,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::MaxIterations => write!(f, "maximum iterations reached"),
            TerminationReason::NoTrainableParameters => write!(f, "no trainable parameters"),
        }
    }
}
