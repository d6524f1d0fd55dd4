use std::fmt::{Debug, Display};

use approx::{AbsDiffEq, RelativeEq};
use ndarray::{LinalgScalar, ScalarOperand};
use num_traits::{Float as NumFloat, FloatConst, FromPrimitive};

/// Marker trait for array element types (`f32`, `f64`).
///
/// Bundles the numeric traits needed by the derivative rules together with the
/// `ndarray` scalar traits required for matrix products and scalar broadcast.
pub trait Float:
    NumFloat
    + FloatConst
    + FromPrimitive
    + LinalgScalar
    + ScalarOperand
    + AbsDiffEq<Epsilon = Self>
    + RelativeEq
    + Send
    + Sync
    + Default
    + Debug
    + Display
    + 'static
{
    /// Lift an `f64` literal. Never fails for the primitive float types.
    #[inline]
    fn lit(x: f64) -> Self {
        Self::from_f64(x).unwrap_or_else(Self::nan)
    }
}

impl Float for f32 {}
impl Float for f64 {}
