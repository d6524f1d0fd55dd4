//! Differentiable graph nodes.
//!
//! A [`Param`] is an immutable node: its value plus one edge per operand, each
//! edge holding the operand node, the local partial evaluated when the node was
//! built, and the [`Combinator`] that composes it with an upstream gradient.
//! Forward evaluation and graph construction are the same step.

use std::fmt;
use std::rc::Rc;

use crate::backward;
use crate::combinator::Combinator;
use crate::error::{Error, Result};
use crate::float::Float;
use crate::graph::{Graph, NodeId};
use crate::math;
use crate::tensor::Tensor;

#[derive(Clone)]
struct Edge<F: Float> {
    parent: Param<F>,
    partial: Tensor<F>,
    combinator: Combinator,
}

struct Node<F: Float> {
    id: NodeId,
    value: Tensor<F>,
    op: &'static str,
    graph: Graph,
    edges: Vec<Edge<F>>,
}

impl<F: Float> Drop for Node<F> {
    // Unlink ancestors with a work-list so dropping a long chain does not
    // recurse once per node.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.edges);
        while let Some(edge) = pending.pop() {
            if let Ok(mut parent) = Rc::try_unwrap(edge.parent.node) {
                pending.append(&mut parent.edges);
            }
        }
    }
}

/// A node of the computation graph.
///
/// Cloning is cheap and shares the recorded ancestry; it does not create a new
/// identity. Parents are held by shared ownership, so a node used on several
/// branches keeps one identity and the backward sweep sums over all of them.
#[derive(Clone)]
pub struct Param<F: Float> {
    node: Rc<Node<F>>,
}

impl<F: Float> Param<F> {
    pub(crate) fn leaf(graph: Graph, value: Tensor<F>) -> Self {
        let id = graph.next_id();
        Param {
            node: Rc::new(Node {
                id,
                value,
                op: "leaf",
                graph,
                edges: Vec::new(),
            }),
        }
    }

    fn derived(graph: &Graph, op: &'static str, value: Tensor<F>, edges: Vec<Edge<F>>) -> Self {
        Param {
            node: Rc::new(Node {
                id: graph.next_id(),
                value,
                op,
                graph: graph.clone(),
                edges,
            }),
        }
    }

    fn unary(&self, op: &'static str, value: Tensor<F>, partial: Tensor<F>, combinator: Combinator) -> Self {
        let edge = Edge {
            parent: self.clone(),
            partial,
            combinator,
        };
        Param::derived(&self.node.graph, op, value, vec![edge])
    }

    fn binary(
        &self,
        other: &Param<F>,
        op: &'static str,
        value: Tensor<F>,
        lhs: (Tensor<F>, Combinator),
        rhs: (Tensor<F>, Combinator),
    ) -> Self {
        let edges = vec![
            Edge {
                parent: self.clone(),
                partial: lhs.0,
                combinator: lhs.1,
            },
            Edge {
                parent: other.clone(),
                partial: rhs.0,
                combinator: rhs.1,
            },
        ];
        Param::derived(&self.node.graph, op, value, edges)
    }

    fn check_graph(&self, other: &Param<F>, op: &'static str) -> Result<()> {
        if self.node.graph.same_as(&other.node.graph) {
            Ok(())
        } else {
            Err(Error::GraphMismatch { op })
        }
    }

    // ── Accessors ──

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn value(&self) -> &Tensor<F> {
        &self.node.value
    }

    pub fn shape(&self) -> &[usize] {
        self.node.value.shape()
    }

    /// Name of the operation that produced this node (`"leaf"` for leaves).
    pub fn op(&self) -> &'static str {
        self.node.op
    }

    /// The graph whose allocator issued this node's identity.
    pub fn graph(&self) -> &Graph {
        &self.node.graph
    }

    pub fn is_leaf(&self) -> bool {
        self.node.edges.is_empty()
    }

    pub fn num_parents(&self) -> usize {
        self.node.edges.len()
    }

    pub fn parents(&self) -> impl Iterator<Item = &Param<F>> + '_ {
        self.node.edges.iter().map(|e| &e.parent)
    }

    /// Local partials, aligned with [`Param::parents`].
    pub fn local_partials(&self) -> impl Iterator<Item = &Tensor<F>> + '_ {
        self.node.edges.iter().map(|e| &e.partial)
    }

    /// Combinators, aligned with [`Param::parents`].
    pub fn combinators(&self) -> impl Iterator<Item = Combinator> + '_ {
        self.node.edges.iter().map(|e| e.combinator)
    }

    pub(crate) fn edges(&self) -> impl Iterator<Item = (&Param<F>, &Tensor<F>, Combinator)> + '_ {
        self.node
            .edges
            .iter()
            .map(|e| (&e.parent, &e.partial, e.combinator))
    }

    /// Overwrite the value, keeping identity and recorded edges.
    ///
    /// Only this handle sees the new value: graphs built earlier keep the node
    /// they were built from. Intended for a model's own trainable weights.
    pub fn set_value(&mut self, value: Tensor<F>) {
        self.node = Rc::new(Node {
            id: self.node.id,
            value,
            op: self.node.op,
            graph: self.node.graph.clone(),
            edges: self.node.edges.clone(),
        });
    }

    /// Gradient of this node with respect to the ancestor `target`.
    ///
    /// See [`backward::gradient_of`].
    pub fn partial_wrt(&self, target: NodeId) -> Result<Tensor<F>> {
        backward::gradient_of(self, target)
    }

    // ── Node ∘ node arithmetic ──

    /// `A + B`.
    pub fn add(&self, other: &Param<F>) -> Result<Self> {
        self.check_graph(other, "add")?;
        let value = self.value().add(other.value())?;
        Ok(self.binary(
            other,
            "add",
            value,
            (Tensor::ones(self.shape()), Combinator::Hadamard),
            (Tensor::ones(other.shape()), Combinator::Hadamard),
        ))
    }

    /// `A − B`.
    pub fn sub(&self, other: &Param<F>) -> Result<Self> {
        self.check_graph(other, "sub")?;
        let value = self.value().sub(other.value())?;
        Ok(self.binary(
            other,
            "sub",
            value,
            (Tensor::ones(self.shape()), Combinator::Hadamard),
            (Tensor::full(other.shape(), -F::one()), Combinator::Hadamard),
        ))
    }

    /// `A * B` under the array algebra's product.
    ///
    /// Two matrices take the matrix product and record `Bᵀ`, `Aᵀ` as partials,
    /// composed by matrix products on the correct side. Every other combination
    /// (scalar broadcast, vector dot) records `B`, `A` composed elementwise.
    pub fn mul(&self, other: &Param<F>) -> Result<Self> {
        self.check_graph(other, "mul")?;
        let (a, b) = (self.value(), other.value());
        if a.is_matrix() && b.is_matrix() {
            let value = a.matmul(b)?;
            return Ok(self.binary(
                other,
                "matmul",
                value,
                (b.transpose()?, Combinator::MatMulLeft),
                (a.transpose()?, Combinator::MatMulRight),
            ));
        }
        let value = a.product(b)?;
        Ok(self.binary(
            other,
            "mul",
            value,
            (b.clone(), Combinator::Broadcast),
            (a.clone(), Combinator::Broadcast),
        ))
    }

    /// Flat inner product, a one-element node.
    ///
    /// Operands only need equal element counts. Each partial is the other
    /// operand laid out in this operand's shape.
    pub fn dot(&self, other: &Param<F>) -> Result<Self> {
        self.check_graph(other, "dot")?;
        let value = Tensor::scalar(self.value().dot(other.value())?);
        Ok(self.binary(
            other,
            "dot",
            value,
            (other.value().reshape(self.shape())?, Combinator::Broadcast),
            (self.value().reshape(other.shape())?, Combinator::Broadcast),
        ))
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Param<F>) -> Result<Self> {
        self.check_graph(other, "hadamard")?;
        let value = self.value().hadamard(other.value())?;
        Ok(self.binary(
            other,
            "hadamard",
            value,
            (other.value().clone(), Combinator::Hadamard),
            (self.value().clone(), Combinator::Hadamard),
        ))
    }

    // ── Node ∘ scalar arithmetic ──

    /// `X + s`.
    pub fn add_scalar(&self, s: F) -> Self {
        self.unary(
            "add_scalar",
            self.value().add_scalar(s),
            Tensor::ones(self.shape()),
            Combinator::Hadamard,
        )
    }

    /// `X − s`.
    pub fn sub_scalar(&self, s: F) -> Self {
        self.unary(
            "sub_scalar",
            self.value().sub_scalar(s),
            Tensor::ones(self.shape()),
            Combinator::Hadamard,
        )
    }

    /// `s − X`.
    pub fn rsub_scalar(&self, s: F) -> Self {
        self.unary(
            "rsub_scalar",
            self.value().rsub_scalar(s),
            Tensor::full(self.shape(), -F::one()),
            Combinator::Hadamard,
        )
    }

    /// `X · s`.
    pub fn mul_scalar(&self, s: F) -> Self {
        self.unary(
            "mul_scalar",
            self.value().mul_scalar(s),
            Tensor::scalar(s),
            Combinator::Scale,
        )
    }

    /// `X / s`.
    pub fn div_scalar(&self, s: F) -> Self {
        self.unary(
            "div_scalar",
            self.value().div_scalar(s),
            Tensor::scalar(s.recip()),
            Combinator::Scale,
        )
    }

    /// `s / X`, partial `−s / X²`.
    pub fn rdiv_scalar(&self, s: F) -> Self {
        let partial = self.value().map(|x| -s / (x * x));
        self.unary(
            "rdiv_scalar",
            self.value().rdiv_scalar(s),
            partial,
            Combinator::Hadamard,
        )
    }

    /// `−X`.
    pub fn negate(&self) -> Self {
        self.unary(
            "neg",
            self.value().neg(),
            Tensor::full(self.shape(), -F::one()),
            Combinator::Hadamard,
        )
    }

    // ── Shape ──

    /// Matrix transpose.
    ///
    /// The recorded partial is the pre-transpose value composed elementwise, so
    /// gradients flowing through a transpose only type-check for square
    /// matrices and then equal `upstream ⊙ X`. Not a true transpose rule.
    pub fn t(&self) -> Result<Self> {
        let value = self.value().transpose()?;
        Ok(self.unary("transpose", value, self.value().clone(), Combinator::Hadamard))
    }

    // ── Reductions ──

    /// Sum of all elements as a one-element node.
    pub fn sum(&self) -> Self {
        self.unary(
            "sum",
            Tensor::scalar(self.value().sum()),
            Tensor::ones(self.shape()),
            Combinator::Broadcast,
        )
    }

    /// Mean of all elements as a one-element node.
    pub fn mean(&self) -> Result<Self> {
        let value = Tensor::scalar(self.value().mean()?);
        let n = F::from_usize(self.value().len()).unwrap_or_else(F::one);
        Ok(self.unary(
            "mean",
            value,
            Tensor::full(self.shape(), n.recip()),
            Combinator::Broadcast,
        ))
    }

    // ── Elementwise functions ──

    fn elementwise(&self, op: &'static str, value: Tensor<F>, partial: Tensor<F>) -> Self {
        self.unary(op, value, partial, Combinator::Hadamard)
    }

    pub fn sqrt(&self) -> Self {
        let x = self.value();
        self.elementwise("sqrt", math::sqrt(x), math::d_sqrt(x))
    }

    pub fn exp(&self) -> Self {
        let value = math::exp(self.value());
        self.elementwise("exp", value.clone(), value)
    }

    /// Natural logarithm.
    pub fn ln(&self) -> Self {
        let x = self.value();
        self.elementwise("ln", math::ln(x), math::d_ln(x))
    }

    pub fn sin(&self) -> Self {
        let x = self.value();
        self.elementwise("sin", math::sin(x), math::cos(x))
    }

    pub fn cos(&self) -> Self {
        let x = self.value();
        self.elementwise("cos", math::cos(x), math::d_cos(x))
    }

    pub fn tan(&self) -> Self {
        let x = self.value();
        self.elementwise("tan", math::tan(x), math::d_tan(x))
    }

    pub fn tanh(&self) -> Self {
        let x = self.value();
        self.elementwise("tanh", math::tanh(x), math::d_tanh(x))
    }

    pub fn sigmoid(&self) -> Self {
        let x = self.value();
        self.elementwise("sigmoid", math::sigmoid(x), math::d_sigmoid(x))
    }

    pub fn relu(&self) -> Self {
        let x = self.value();
        self.elementwise("relu", math::relu(x), math::d_relu(x))
    }

    /// `X^p` elementwise.
    pub fn powf(&self, p: F) -> Self {
        let x = self.value();
        self.elementwise("powf", math::powf(x, p), math::d_powf(x, p))
    }

    /// Softmax over all elements.
    ///
    /// Records the softmax output as the partial and composes through the
    /// softmax Jacobian-vector product rather than elementwise.
    pub fn softmax(&self) -> Result<Self> {
        let value = math::softmax(self.value())?;
        Ok(self.unary("softmax", value.clone(), value, Combinator::SoftmaxJvp))
    }
}

impl<F: Float> fmt::Debug for Param<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parents: Vec<NodeId> = self.parents().map(Param::id).collect();
        f.debug_struct("Param")
            .field("id", &self.id())
            .field("op", &self.op())
            .field("shape", &self.shape())
            .field("parents", &parents)
            .finish()
    }
}

impl<F: Float> fmt::Display for Param<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
