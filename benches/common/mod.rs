#![allow(dead_code)]

use ndgrad::{Graph, Param, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(0x5eed)
}

pub fn random_matrix(rows: usize, cols: usize) -> Tensor<f64> {
    Tensor::random_uniform(&[rows, cols], &mut seeded_rng())
}

// ─── Chains ────────────────────────────────────────────────────────────────

/// `depth` repetitions of `x ← sin(x) · 0.5 + x`, elementwise.
pub fn elementwise_chain(x: &Param<f64>, depth: usize) -> Param<f64> {
    let mut y = x.clone();
    for _ in 0..depth {
        let step = &y.sin() * 0.5;
        y = step.add(&y).expect("same shape");
    }
    y
}

// ─── Two-layer network ─────────────────────────────────────────────────────
// sigmoid(relu(X · W1) · W2), the shape of a small classifier forward pass.

pub struct Mlp {
    pub x: Param<f64>,
    pub w1: Param<f64>,
    pub w2: Param<f64>,
}

impl Mlp {
    pub fn new(graph: &Graph, samples: usize, features: usize, hidden: usize) -> Self {
        Mlp {
            x: graph.param(random_matrix(samples, features)),
            w1: graph.param(random_matrix(features, hidden)),
            w2: graph.param(random_matrix(hidden, 1)),
        }
    }

    pub fn forward(&self) -> Param<f64> {
        let h = self.x.mul(&self.w1).expect("inner dims").relu();
        h.mul(&self.w2).expect("inner dims").sigmoid()
    }
}
