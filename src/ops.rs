//! Operator overloads for node ∘ scalar arithmetic.
//!
//! Only the infallible combinations get operators. Node ∘ node arithmetic can
//! fail on shapes and stays on the `Result`-returning methods of [`Param`].

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::float::Float;
use crate::param::Param;

impl<F: Float> Neg for &Param<F> {
    type Output = Param<F>;
    #[inline]
    fn neg(self) -> Param<F> {
        self.negate()
    }
}

impl<F: Float> Neg for Param<F> {
    type Output = Param<F>;
    #[inline]
    fn neg(self) -> Param<F> {
        self.negate()
    }
}

// Mixed ops: Param<F> with primitive floats, generated for f32 and f64.
macro_rules! impl_param_scalar_ops {
    ($f:ty) => {
        impl Add<$f> for &Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn add(self, rhs: $f) -> Param<$f> {
                self.add_scalar(rhs)
            }
        }

        impl Add<&Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn add(self, rhs: &Param<$f>) -> Param<$f> {
                rhs.add_scalar(self)
            }
        }

        impl Sub<$f> for &Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn sub(self, rhs: $f) -> Param<$f> {
                self.sub_scalar(rhs)
            }
        }

        impl Sub<&Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn sub(self, rhs: &Param<$f>) -> Param<$f> {
                rhs.rsub_scalar(self)
            }
        }

        impl Mul<$f> for &Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn mul(self, rhs: $f) -> Param<$f> {
                self.mul_scalar(rhs)
            }
        }

        impl Mul<&Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn mul(self, rhs: &Param<$f>) -> Param<$f> {
                rhs.mul_scalar(self)
            }
        }

        impl Div<$f> for &Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn div(self, rhs: $f) -> Param<$f> {
                self.div_scalar(rhs)
            }
        }

        impl Div<&Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn div(self, rhs: &Param<$f>) -> Param<$f> {
                rhs.rdiv_scalar(self)
            }
        }

        // Owned node operands.

        impl Add<$f> for Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn add(self, rhs: $f) -> Param<$f> {
                self.add_scalar(rhs)
            }
        }

        impl Add<Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn add(self, rhs: Param<$f>) -> Param<$f> {
                rhs.add_scalar(self)
            }
        }

        impl Sub<$f> for Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn sub(self, rhs: $f) -> Param<$f> {
                self.sub_scalar(rhs)
            }
        }

        impl Sub<Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn sub(self, rhs: Param<$f>) -> Param<$f> {
                rhs.rsub_scalar(self)
            }
        }

        impl Mul<$f> for Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn mul(self, rhs: $f) -> Param<$f> {
                self.mul_scalar(rhs)
            }
        }

        impl Mul<Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn mul(self, rhs: Param<$f>) -> Param<$f> {
                rhs.mul_scalar(self)
            }
        }

        impl Div<$f> for Param<$f> {
            type Output = Param<$f>;
            #[inline]
            fn div(self, rhs: $f) -> Param<$f> {
                self.div_scalar(rhs)
            }
        }

        impl Div<Param<$f>> for $f {
            type Output = Param<$f>;
            #[inline]
            fn div(self, rhs: Param<$f>) -> Param<$f> {
                rhs.rdiv_scalar(self)
            }
        }
    };
}

impl_param_scalar_ops!(f32);
impl_param_scalar_ops!(f64);
