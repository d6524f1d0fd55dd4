//! Dense N-dimensional array consumed by the differentiation core.
//!
//! [`Tensor`] wraps an owned `ndarray::ArrayD` and exposes a fixed, checked
//! arithmetic contract: every operation that can see incompatible shapes returns
//! [`Error`] instead of panicking, so node construction can propagate it with `?`.

use std::fmt;
use std::ops::{Index, IndexMut, Range};

use approx::{AbsDiffEq, RelativeEq};
use ndarray::{concatenate, Array2, ArrayD, ArrayView2, Axis, Ix1, Ix2, IxDyn, Slice, Zip};
use rand::Rng;

use crate::error::{Error, Result};
use crate::float::Float;

/// Owned, shape-tagged dense array.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tensor<F> {
    data: ArrayD<F>,
}

impl<F: Float> From<ArrayD<F>> for Tensor<F> {
    fn from(data: ArrayD<F>) -> Self {
        Tensor { data }
    }
}

impl<F: Float> Tensor<F> {
    // ── Construction ──

    /// Wrap an existing `ndarray` array.
    pub fn from_array(data: ArrayD<F>) -> Self {
        Tensor { data }
    }

    /// Build from a row-major buffer. Fails if `data.len()` does not match `shape`.
    pub fn from_shape_vec(shape: &[usize], data: Vec<F>) -> Result<Self> {
        let len = data.len();
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(Tensor::from_array)
            .map_err(|_| Error::shape_mismatch("from_shape_vec", shape, &[len]))
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Tensor::from_array(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn ones(shape: &[usize]) -> Self {
        Tensor::from_array(ArrayD::ones(IxDyn(shape)))
    }

    pub fn full(shape: &[usize], value: F) -> Self {
        Tensor::from_array(ArrayD::from_elem(IxDyn(shape), value))
    }

    /// One-element array of shape `[1]`.
    pub fn scalar(value: F) -> Self {
        Tensor::full(&[1], value)
    }

    /// `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Tensor::from_array(Array2::eye(n).into_dyn())
    }

    /// Array filled with samples from `U[0, 1)`.
    pub fn random_uniform<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        Tensor::from_array(ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            F::lit(rng.gen::<f64>())
        }))
    }

    /// Square matrix with `diagonal` (a 1-D array) on its diagonal.
    pub fn from_diag(diagonal: &Tensor<F>) -> Result<Self> {
        let v = diagonal.data.view().into_dimensionality::<Ix1>().map_err(|_| {
            Error::shape_mismatch("from_diag", diagonal.shape(), &[diagonal.len()])
        })?;
        Ok(Tensor::from_array(Array2::from_diag(&v).into_dyn()))
    }

    // ── Queries ──

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Shape is exactly `[1]`.
    pub fn is_scalar(&self) -> bool {
        self.shape() == [1]
    }

    pub fn is_vector(&self) -> bool {
        self.ndim() == 1
    }

    pub fn is_matrix(&self) -> bool {
        self.ndim() == 2
    }

    pub fn is_square(&self) -> bool {
        self.is_matrix() && self.shape()[0] == self.shape()[1]
    }

    pub fn as_array(&self) -> &ArrayD<F> {
        &self.data
    }

    pub fn into_array(self) -> ArrayD<F> {
        self.data
    }

    /// Elements in logical (row-major) order.
    pub fn iter(&self) -> impl Iterator<Item = &F> + '_ {
        self.data.iter()
    }

    /// The only element of a one-element array, of any rank.
    pub fn item(&self) -> Result<F> {
        self.single()
            .ok_or_else(|| Error::shape_mismatch("item", self.shape(), &[1]))
    }

    fn single(&self) -> Option<F> {
        if self.len() == 1 {
            self.data.iter().next().copied()
        } else {
            None
        }
    }

    // ── Elementwise arithmetic ──

    fn zip_with(&self, other: &Tensor<F>, op: &'static str, f: impl Fn(F, F) -> F) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(op, self.shape(), other.shape()));
        }
        let data = Zip::from(&self.data)
            .and(&other.data)
            .map_collect(|&a, &b| f(a, b));
        Ok(Tensor::from_array(data))
    }

    pub fn add(&self, other: &Tensor<F>) -> Result<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn sub(&self, other: &Tensor<F>) -> Result<Self> {
        self.zip_with(other, "sub", |a, b| a - b)
    }

    /// Elementwise product; shapes must match exactly.
    pub fn hadamard(&self, other: &Tensor<F>) -> Result<Self> {
        self.zip_with(other, "hadamard", |a, b| a * b)
    }

    /// In-place `self += other`, shapes must match.
    pub fn accumulate(&mut self, other: &Tensor<F>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch("accumulate", self.shape(), other.shape()));
        }
        Zip::from(&mut self.data)
            .and(&other.data)
            .for_each(|a, &b| *a = *a + b);
        Ok(())
    }

    /// Elementwise product that also accepts a one-element operand on either side.
    pub fn broadcast_mul(&self, other: &Tensor<F>) -> Result<Self> {
        if self.shape() == other.shape() {
            return self.hadamard(other);
        }
        if let Some(s) = other.single() {
            return Ok(self.mul_scalar(s));
        }
        if let Some(s) = self.single() {
            return Ok(other.mul_scalar(s));
        }
        Err(Error::shape_mismatch("broadcast_mul", self.shape(), other.shape()))
    }

    // ── Products ──

    fn as_matrix(&self, op: &'static str) -> Result<ArrayView2<'_, F>> {
        self.data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| Error::NotMatrix {
                op,
                shape: self.shape().to_vec(),
            })
    }

    /// Strict matrix product of two 2-D arrays, `[m, k] · [k, n] → [m, n]`.
    pub fn matmul(&self, other: &Tensor<F>) -> Result<Self> {
        let a = self.as_matrix("matmul")?;
        let b = other.as_matrix("matmul")?;
        if a.ncols() != b.nrows() {
            return Err(Error::shape_mismatch("matmul", self.shape(), other.shape()));
        }
        Ok(Tensor::from_array(a.dot(&b).into_dyn()))
    }

    /// Flat inner product. Element counts must agree.
    pub fn dot(&self, other: &Tensor<F>) -> Result<F> {
        if self.len() != other.len() {
            return Err(Error::shape_mismatch("dot", self.shape(), other.shape()));
        }
        Ok(self
            .data
            .iter()
            .zip(other.data.iter())
            .fold(F::zero(), |acc, (&a, &b)| acc + a * b))
    }

    /// The general `*` of the array algebra.
    ///
    /// - `[1] * [1]` and a `[1]` operand on either side scale the other operand,
    /// - two 1-D operands reduce to their dot product, shaped `[1]`,
    /// - two 2-D operands take the matrix product.
    ///
    /// Anything else is a shape error.
    pub fn product(&self, other: &Tensor<F>) -> Result<Self> {
        if self.is_scalar() && other.is_scalar() {
            return Ok(Tensor::scalar(self.item()? * other.item()?));
        }
        if self.is_scalar() {
            return Ok(other.mul_scalar(self.item()?));
        }
        if other.is_scalar() {
            return Ok(self.mul_scalar(other.item()?));
        }
        if self.is_vector() && other.is_vector() {
            return self.dot(other).map(Tensor::scalar);
        }
        self.matmul(other)
    }

    /// Transpose of a 2-D array.
    pub fn transpose(&self) -> Result<Self> {
        let m = self.as_matrix("transpose")?;
        Ok(Tensor::from_array(
            m.t().as_standard_layout().into_owned().into_dyn(),
        ))
    }

    // ── Scalar broadcast ──

    pub fn map(&self, f: impl Fn(F) -> F) -> Self {
        Tensor::from_array(self.data.mapv(f))
    }

    pub fn add_scalar(&self, s: F) -> Self {
        self.map(|x| x + s)
    }

    pub fn sub_scalar(&self, s: F) -> Self {
        self.map(|x| x - s)
    }

    pub fn mul_scalar(&self, s: F) -> Self {
        self.map(|x| x * s)
    }

    pub fn div_scalar(&self, s: F) -> Self {
        self.map(|x| x / s)
    }

    /// `s - self`, elementwise.
    pub fn rsub_scalar(&self, s: F) -> Self {
        self.map(|x| s - x)
    }

    /// `s / self`, elementwise.
    pub fn rdiv_scalar(&self, s: F) -> Self {
        self.map(|x| s / x)
    }

    pub fn neg(&self) -> Self {
        self.map(|x| -x)
    }

    // ── Reductions ──

    fn check_axis(&self, axis: usize) -> Result<Axis> {
        if axis >= self.ndim() {
            return Err(Error::InvalidAxis {
                axis,
                ndim: self.ndim(),
            });
        }
        if self.shape()[axis] == 0 {
            return Err(Error::EmptyReduction { op: "axis reduction" });
        }
        Ok(Axis(axis))
    }

    pub fn sum(&self) -> F {
        self.data.sum()
    }

    /// Sum along `axis`, keeping it with length 1.
    pub fn sum_axis(&self, axis: usize) -> Result<Self> {
        let ax = self.check_axis(axis)?;
        Ok(Tensor::from_array(self.data.sum_axis(ax).insert_axis(ax)))
    }

    pub fn mean(&self) -> Result<F> {
        self.data
            .mean()
            .ok_or(Error::EmptyReduction { op: "mean" })
    }

    /// Mean along `axis`, keeping it with length 1.
    pub fn mean_axis(&self, axis: usize) -> Result<Self> {
        let ax = self.check_axis(axis)?;
        self.data
            .mean_axis(ax)
            .map(|m| Tensor::from_array(m.insert_axis(ax)))
            .ok_or(Error::EmptyReduction { op: "mean" })
    }

    /// Population variance of all elements.
    pub fn variance(&self) -> Result<F> {
        if self.is_empty() {
            return Err(Error::EmptyReduction { op: "variance" });
        }
        Ok(self.data.var(F::zero()))
    }

    /// Population variance along `axis`, keeping it with length 1.
    pub fn variance_axis(&self, axis: usize) -> Result<Self> {
        let ax = self.check_axis(axis)?;
        Ok(Tensor::from_array(
            self.data.var_axis(ax, F::zero()).insert_axis(ax),
        ))
    }

    pub fn stddev(&self) -> Result<F> {
        self.variance().map(|v| v.sqrt())
    }

    pub fn stddev_axis(&self, axis: usize) -> Result<Self> {
        self.variance_axis(axis).map(|v| v.map(|x| x.sqrt()))
    }

    pub fn max(&self) -> Result<F> {
        self.data
            .iter()
            .copied()
            .reduce(|acc, x| if x > acc { x } else { acc })
            .ok_or(Error::EmptyReduction { op: "max" })
    }

    // ── Indexing ──

    /// Bounds-checked element read.
    pub fn get(&self, index: &[usize]) -> Result<F> {
        self.data
            .get(index)
            .copied()
            .ok_or_else(|| Error::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape().to_vec(),
            })
    }

    /// Bounds-checked element write.
    pub fn set(&mut self, index: &[usize], value: F) -> Result<()> {
        let shape = self.shape().to_vec();
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                index: index.to_vec(),
                shape,
            }),
        }
    }

    /// Owned copy of the block selected by one half-open range per axis.
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<Self> {
        if ranges.len() != self.ndim() {
            return Err(Error::shape_mismatch("slice", self.shape(), &[ranges.len()]));
        }
        for (axis, (r, &len)) in ranges.iter().zip(self.shape()).enumerate() {
            if r.start >= r.end || r.end > len {
                return Err(Error::InvalidRange {
                    axis,
                    start: r.start,
                    end: r.end,
                    len,
                });
            }
        }
        let view = self
            .data
            .slice_each_axis(|ax| Slice::from(ranges[ax.axis.index()].clone()));
        Ok(Tensor::from_array(view.to_owned()))
    }

    /// Join along an existing axis; all other axes must agree.
    pub fn concat(&self, other: &Tensor<F>, axis: usize) -> Result<Self> {
        if self.ndim() != other.ndim() || axis >= self.ndim() {
            return Err(Error::shape_mismatch("concat", self.shape(), other.shape()));
        }
        concatenate(Axis(axis), &[self.data.view(), other.data.view()])
            .map(Tensor::from_array)
            .map_err(|_| Error::shape_mismatch("concat", self.shape(), other.shape()))
    }

    /// Same elements under a new shape with the same element count.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        self.data
            .to_shape(IxDyn(shape))
            .map(|a| Tensor::from_array(a.into_owned()))
            .map_err(|_| Error::shape_mismatch("reshape", self.shape(), shape))
    }

    /// Drop every axis of length 1. A fully squeezed array keeps shape `[1]`.
    pub fn squeeze(&self) -> Self {
        let mut shape: Vec<usize> = self.shape().iter().copied().filter(|&d| d != 1).collect();
        if shape.is_empty() {
            shape.push(1);
        }
        match self.reshape(&shape) {
            Ok(t) => t,
            // Element count is unchanged, so the reshape cannot fail.
            Err(_) => self.clone(),
        }
    }

    /// Main diagonal of a square matrix.
    pub fn diag(&self) -> Result<Self> {
        let m = self.as_matrix("diag")?;
        if !self.is_square() {
            return Err(Error::shape_mismatch("diag", self.shape(), &[m.nrows(), m.nrows()]));
        }
        Ok(Tensor::from_array(m.diag().to_owned().into_dyn()))
    }

    // ── Comparison ──

    /// Same shape and every element within `eps` (absolute).
    pub fn approx_eq(&self, other: &Tensor<F>, eps: F) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| (a - b).abs() <= eps)
    }
}

impl<F: Float> Index<&[usize]> for Tensor<F> {
    type Output = F;

    /// Unchecked-by-contract access; panics on a bad index like `ndarray`.
    fn index(&self, index: &[usize]) -> &F {
        &self.data[index]
    }
}

impl<F: Float> IndexMut<&[usize]> for Tensor<F> {
    fn index_mut(&mut self, index: &[usize]) -> &mut F {
        &mut self.data[index]
    }
}

impl<F: Float> AbsDiffEq for Tensor<F> {
    type Epsilon = F;

    fn default_epsilon() -> F {
        <F as AbsDiffEq>::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: F) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| <F as AbsDiffEq>::abs_diff_eq(a, b, epsilon))
    }
}

impl<F: Float> RelativeEq for Tensor<F> {
    fn default_max_relative() -> F {
        <F as RelativeEq>::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: F, max_relative: F) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| <F as RelativeEq>::relative_eq(a, b, epsilon, max_relative))
    }
}

impl<F: Float> fmt::Display for Tensor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}
