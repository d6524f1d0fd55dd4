//! The differentiable-model capability.

use crate::error::Result;
use crate::float::Float;
use crate::graph::NodeId;
use crate::param::Param;
use crate::tensor::Tensor;

/// Anything callable as a function from input nodes to one output node.
///
/// The two hooks are optional. A model that keeps the defaults has no
/// trainable state and cannot be optimized.
pub trait Differentiable<F: Float> {
    /// Evaluate the model, building its graph from scratch.
    fn forward(&self, inputs: &[Param<F>]) -> Result<Param<F>>;

    /// Identities of the weight nodes an optimizer may update.
    fn trainable_ids(&self) -> Vec<NodeId> {
        Vec::new()
    }

    /// Step the weight identified by `id` by `delta`.
    ///
    /// The default does nothing. Implementors apply `w ← w − delta` to the
    /// weight they own under `id` and ignore identities they do not own.
    fn update(&mut self, id: NodeId, delta: &Tensor<F>) -> Result<()> {
        let _ = (id, delta);
        Ok(())
    }
}
