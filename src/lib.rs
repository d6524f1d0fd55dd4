//! Reverse-mode automatic differentiation over dense N-dimensional arrays.
//!
//! Arithmetic on [`Param`] nodes evaluates eagerly and records, per operand, a
//! local partial and a [`Combinator`]. [`gradient_of`] walks the recorded graph
//! backward from any node to any ancestor.
//!
//! ```
//! use ndgrad::{Graph, Tensor};
//!
//! let g = Graph::new();
//! let x = g.param(Tensor::scalar(0.5_f64));
//! let y = (2.0 * &x).sin();
//! let dy = y.partial_wrt(x.id()).unwrap();
//! assert!((dy.item().unwrap() - 2.0 * 1.0_f64.cos()).abs() < 1e-12);
//! ```

pub mod backward;
pub mod combinator;
pub mod error;
pub mod float;
pub mod graph;
pub mod math;
pub mod model;
mod ops;
pub mod param;
pub mod tensor;

pub use backward::{gradient_of, gradients, Gradients};
pub use combinator::Combinator;
pub use error::{Error, Result};
pub use float::Float;
pub use graph::{Graph, IdAllocator, NodeId};
pub use model::Differentiable;
pub use param::Param;
pub use tensor::Tensor;

/// Type alias for `f64` arrays.
pub type Tensor64 = Tensor<f64>;
/// Type alias for `f32` arrays.
pub type Tensor32 = Tensor<f32>;
/// Type alias for `f64` graph nodes.
pub type Param64 = Param<f64>;
/// Type alias for `f32` graph nodes.
pub type Param32 = Param<f32>;
