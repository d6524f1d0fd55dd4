//! Chain-rule composition operators.
//!
//! Each edge of the graph stores a [`Combinator`] next to its local partial. The
//! backward sweep calls [`Combinator::apply`] with the gradient arriving at the
//! child node and gets back the contribution for the parent.

use crate::error::{Error, Result};
use crate::float::Float;
use crate::tensor::Tensor;

/// How an upstream gradient is composed with a recorded local partial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// `upstream ⊙ partial`, shapes must match.
    Hadamard,
    /// `upstream · partial`. Left operand of a matrix product (partial is `Bᵀ`).
    MatMulLeft,
    /// `partial · upstream`. Right operand of a matrix product (partial is `Aᵀ`).
    MatMulRight,
    /// `upstream ⊙ partial` with a one-element operand broadcast over the other.
    Broadcast,
    /// `upstream × p` where `p` is the partial's only element.
    Scale,
    /// Softmax Jacobian-vector product. The partial holds the softmax output `s`:
    /// `s ⊙ (upstream − Σ upstream ⊙ s)`.
    SoftmaxJvp,
}

impl Combinator {
    /// Compose `upstream` with `partial`.
    pub fn apply<F: Float>(self, upstream: &Tensor<F>, partial: &Tensor<F>) -> Result<Tensor<F>> {
        match self {
            Combinator::Hadamard => upstream.hadamard(partial),
            Combinator::MatMulLeft => upstream.matmul(partial),
            Combinator::MatMulRight => partial.matmul(upstream),
            Combinator::Broadcast => upstream.broadcast_mul(partial),
            Combinator::Scale => {
                let p = partial
                    .item()
                    .map_err(|_| Error::shape_mismatch("scale", upstream.shape(), partial.shape()))?;
                Ok(upstream.mul_scalar(p))
            }
            Combinator::SoftmaxJvp => {
                let weighted = upstream.hadamard(partial)?.sum();
                partial.hadamard(&upstream.sub_scalar(weighted))
            }
        }
    }
}
