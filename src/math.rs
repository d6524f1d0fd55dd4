//! Elementwise functions and their closed-form derivatives on [`Tensor`].

use crate::error::Result;
use crate::float::Float;
use crate::tensor::Tensor;

#[inline]
fn sigmoid_scalar<F: Float>(x: F) -> F {
    F::one() / (F::one() + (-x).exp())
}

pub fn sqrt<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.sqrt())
}

pub fn d_sqrt<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    let two = F::lit(2.0);
    x.map(|v| F::one() / (two * v.sqrt()))
}

pub fn exp<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.exp())
}

/// Natural logarithm.
pub fn ln<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.ln())
}

pub fn d_ln<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.recip())
}

pub fn sin<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.sin())
}

pub fn cos<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.cos())
}

pub fn d_cos<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| -v.sin())
}

pub fn tan<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.tan())
}

pub fn d_tan<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| {
        let c = v.cos();
        F::one() / (c * c)
    })
}

pub fn tanh<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| v.tanh())
}

pub fn d_tanh<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| {
        let t = v.tanh();
        F::one() - t * t
    })
}

pub fn sigmoid<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(sigmoid_scalar)
}

pub fn d_sigmoid<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| {
        let s = sigmoid_scalar(v);
        s * (F::one() - s)
    })
}

pub fn relu<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| if v > F::zero() { v } else { F::zero() })
}

/// Subgradient 0 at the kink.
pub fn d_relu<F: Float>(x: &Tensor<F>) -> Tensor<F> {
    x.map(|v| if v > F::zero() { F::one() } else { F::zero() })
}

pub fn powf<F: Float>(x: &Tensor<F>, p: F) -> Tensor<F> {
    x.map(|v| v.powf(p))
}

pub fn d_powf<F: Float>(x: &Tensor<F>, p: F) -> Tensor<F> {
    x.map(|v| p * v.powf(p - F::one()))
}

/// Softmax over all elements, shifted by the maximum for stability.
pub fn softmax<F: Float>(x: &Tensor<F>) -> Result<Tensor<F>> {
    let shifted = x.sub_scalar(x.max()?);
    let e = exp(&shifted);
    let total = e.sum();
    Ok(e.div_scalar(total))
}

/// Full softmax Jacobian `diag(s) − s sᵀ` for a 1-D or column input, shaped `[n, n]`.
///
/// Entry `[i, j]` is `∂s_i/∂x_j`. The backward sweep never materialises this
/// matrix; it is provided for checking softmax gradients against the dense form.
pub fn softmax_jacobian<F: Float>(x: &Tensor<F>) -> Result<Tensor<F>> {
    let s = softmax(x)?;
    let n = s.len();
    let col = s.reshape(&[n, 1])?;
    let diag = Tensor::from_diag(&s.reshape(&[n])?)?;
    diag.sub(&col.matmul(&col.transpose()?)?)
}
