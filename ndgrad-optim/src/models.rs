//! Regression models over a single weight node.

use ndgrad::{Differentiable, Error, Float, Graph, NodeId, Param, Result, Tensor};
use rand::Rng;

fn single_input<'a, F: Float>(op: &'static str, inputs: &'a [Param<F>]) -> Result<&'a Param<F>> {
    match inputs {
        [x] => Ok(x),
        _ => Err(Error::Arity {
            op,
            expected: 1,
            got: inputs.len(),
        }),
    }
}

fn step<F: Float>(weights: &mut Param<F>, id: NodeId, delta: &Tensor<F>) -> Result<()> {
    if id == weights.id() {
        let next = weights.value().sub(delta)?;
        weights.set_value(next);
    }
    Ok(())
}

/// `ŷ = X · b` with `b` shaped `[features, 1]`.
///
/// `update` applies `b ← b − delta` when given the weight's identity.
#[derive(Clone, Debug)]
pub struct LinearRegression<F: Float> {
    weights: Param<F>,
}

impl<F: Float> LinearRegression<F> {
    /// Weights drawn uniformly from `[0, 1)`.
    pub fn new<R: Rng>(graph: &Graph, features: usize, rng: &mut R) -> Self {
        Self::with_weights(graph, Tensor::random_uniform(&[features, 1], rng))
    }

    pub fn with_weights(graph: &Graph, weights: Tensor<F>) -> Self {
        LinearRegression {
            weights: graph.param(weights),
        }
    }

    pub fn weights(&self) -> &Param<F> {
        &self.weights
    }
}

impl<F: Float> Differentiable<F> for LinearRegression<F> {
    fn forward(&self, inputs: &[Param<F>]) -> Result<Param<F>> {
        single_input("linear regression", inputs)?.mul(&self.weights)
    }

    fn trainable_ids(&self) -> Vec<NodeId> {
        vec![self.weights.id()]
    }

    fn update(&mut self, id: NodeId, delta: &Tensor<F>) -> Result<()> {
        step(&mut self.weights, id, delta)
    }
}

/// `ŷ = sigmoid(X · w)` with `w` shaped `[features, 1]`.
///
/// Each row of `ŷ` is the predicted probability of the positive class.
/// `update` applies `w ← w − delta` when given the weight's identity.
#[derive(Clone, Debug)]
pub struct LogisticRegression<F: Float> {
    weights: Param<F>,
}

impl<F: Float> LogisticRegression<F> {
    /// Weights drawn uniformly from `[0, 1)`.
    pub fn new<R: Rng>(graph: &Graph, features: usize, rng: &mut R) -> Self {
        Self::with_weights(graph, Tensor::random_uniform(&[features, 1], rng))
    }

    pub fn with_weights(graph: &Graph, weights: Tensor<F>) -> Self {
        LogisticRegression {
            weights: graph.param(weights),
        }
    }

    pub fn weights(&self) -> &Param<F> {
        &self.weights
    }
}

impl<F: Float> Differentiable<F> for LogisticRegression<F> {
    fn forward(&self, inputs: &[Param<F>]) -> Result<Param<F>> {
        Ok(single_input("logistic regression", inputs)?
            .mul(&self.weights)?
            .sigmoid())
    }

    fn trainable_ids(&self) -> Vec<NodeId> {
        vec![self.weights.id()]
    }

    fn update(&mut self, id: NodeId, delta: &Tensor<F>) -> Result<()> {
        step(&mut self.weights, id, delta)
    }
}
