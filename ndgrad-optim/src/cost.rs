//! Cost functions over graph nodes.

use ndgrad::{Float, Param, Result};

/// Objective of the optimizer: `(target, prediction) → cost node`.
pub type CostFn<F> = fn(&Param<F>, &Param<F>) -> Result<Param<F>>;

/// Elementwise binary cross-entropy, `−(y ⊙ ln ŷ + (1 − y) ⊙ ln(1 − ŷ))`.
pub fn cross_entropy<F: Float>(y: &Param<F>, y_hat: &Param<F>) -> Result<Param<F>> {
    let one = F::one();
    let positive = y.hadamard(&y_hat.ln())?;
    let negative = y.rsub_scalar(one).hadamard(&y_hat.rsub_scalar(one).ln())?;
    Ok(positive.add(&negative)?.mul_scalar(-one))
}

/// Elementwise squared error, `(y − ŷ) ⊙ (y − ŷ)`.
pub fn squared_error<F: Float>(y: &Param<F>, y_hat: &Param<F>) -> Result<Param<F>> {
    let diff = y.sub(y_hat)?;
    diff.hadamard(&diff)
}

/// Scalar reading of an array-valued cost: the sum of its elements.
///
/// This is the quantity whose gradient a query seeded with ones computes.
pub fn cost_value<F: Float>(cost: &Param<F>) -> F {
    cost.value().sum()
}
