use log::{debug, warn};
use ndgrad::{gradients, Differentiable, Error, Float, Param, Result, Tensor};

use crate::cost::{cost_value, CostFn};
use crate::result::{OptimResult, TerminationReason};

/// Configuration for plain gradient descent.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SgdConfig<F> {
    /// Step size applied to every gradient (default: 0.05).
    pub learning_rate: F,
    /// Number of updates to perform (default: 100).
    pub max_iter: usize,
}

impl Default for SgdConfig<f64> {
    fn default() -> Self {
        SgdConfig {
            learning_rate: 0.05,
            max_iter: 100,
        }
    }
}

impl Default for SgdConfig<f32> {
    fn default() -> Self {
        SgdConfig {
            learning_rate: 0.05,
            max_iter: 100,
        }
    }
}

/// A cost function paired with a step configuration.
#[derive(Debug, Clone)]
pub struct Sgd<F: Float> {
    cost: CostFn<F>,
    config: SgdConfig<F>,
}

impl<F: Float> Sgd<F> {
    pub fn new(cost: CostFn<F>, config: SgdConfig<F>) -> Self {
        Sgd { cost, config }
    }

    pub fn config(&self) -> &SgdConfig<F> {
        &self.config
    }

    /// Train `model` so that `model.forward(inputs)` approaches `y`.
    pub fn optimize<M>(
        &self,
        model: &mut M,
        inputs: &[Param<F>],
        y: &Tensor<F>,
    ) -> Result<OptimResult<F>>
    where
        M: Differentiable<F> + ?Sized,
    {
        sgd(model, inputs, y, self.cost, &self.config)
    }
}

/// Evaluate `cost(y, model(inputs))` as a scalar without touching the model.
pub fn evaluate<F, M>(
    model: &M,
    inputs: &[Param<F>],
    y: &Tensor<F>,
    cost: CostFn<F>,
) -> Result<F>
where
    F: Float,
    M: Differentiable<F> + ?Sized,
{
    let prediction = model.forward(inputs)?;
    let target = prediction.graph().param(y.clone());
    Ok(cost_value(&cost(&target, &prediction)?))
}

/// Gradient descent on every trainable weight of `model`.
///
/// Each iteration rebuilds the graph with a fresh forward pass, takes the
/// gradient of the summed cost with respect to all trainable weights in one
/// sweep, then applies `w ← w − learning_rate · ∂cost/∂w`. There is no
/// convergence test: exactly `max_iter` updates are made.
///
/// # Errors
///
/// Anything raised by the model's forward pass, the cost function or the
/// gradient query, including [`Error::TargetNotFound`] when a trainable
/// weight does not feed the prediction.
pub fn sgd<F, M>(
    model: &mut M,
    inputs: &[Param<F>],
    y: &Tensor<F>,
    cost: CostFn<F>,
    config: &SgdConfig<F>,
) -> Result<OptimResult<F>>
where
    F: Float,
    M: Differentiable<F> + ?Sized,
{
    if model.trainable_ids().is_empty() {
        warn!("sgd: model exposes no trainable parameters, nothing to do");
        return Ok(OptimResult {
            iterations: 0,
            cost_history: Vec::new(),
            final_cost: evaluate(model, inputs, y, cost)?,
            termination: TerminationReason::NoTrainableParameters,
        });
    }

    let mut cost_history = Vec::with_capacity(config.max_iter);
    for iter in 0..config.max_iter {
        let prediction = model.forward(inputs)?;
        let target = prediction.graph().param(y.clone());
        let loss = cost(&target, &prediction)?;
        let value = cost_value(&loss);
        debug!("sgd iter {}: cost = {}", iter, value);
        cost_history.push(value);

        let ids = model.trainable_ids();
        let grads = gradients(&loss, &ids)?;
        for id in ids {
            let grad = grads.get(id).ok_or(Error::TargetNotFound(id))?;
            model.update(id, &grad.mul_scalar(config.learning_rate))?;
        }
    }

    let final_cost = evaluate(model, inputs, y, cost)?;
    debug!(
        "sgd finished after {} iterations: cost = {}",
        config.max_iter, final_cost
    );
    Ok(OptimResult {
        iterations: config.max_iter,
        cost_history,
        final_cost,
        termination: TerminationReason::MaxIterations,
    })
}
