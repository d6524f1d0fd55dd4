//! Identity allocation for computation-graph nodes.
//!
//! Every node gets a [`NodeId`] from the [`Graph`] it was built in. Identities
//! are drawn from one process-wide monotonic sequence, so an identity issued by
//! one graph never names a node of another. A `Graph` is a cheap handle that
//! also counts the identities it has handed out.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::float::Float;
use crate::param::Param;
use crate::tensor::Tensor;

/// Stable identity of a node, unique within the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u64);

impl NodeId {
    /// Raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Source of node identities. Identities are never reused within a process.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: Cell<u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next identity.
    #[inline]
    pub fn allocate(&self) -> NodeId {
        self.issued.set(self.issued.get() + 1);
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of identities this allocator has handed out.
    pub fn allocated(&self) -> u64 {
        self.issued.get()
    }
}

/// Graph-construction context: owns the identity allocator shared by every
/// node built from it.
///
/// Single-threaded by construction (`Rc`), matching the synchronous model of
/// graph building and gradient queries.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    ids: Rc<IdAllocator>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a raw array as a leaf node with a fresh identity.
    pub fn param<F: Float>(&self, value: Tensor<F>) -> Param<F> {
        Param::leaf(self.clone(), value)
    }

    /// Alias of [`Graph::param`].
    pub fn leaf<F: Float>(&self, value: Tensor<F>) -> Param<F> {
        self.param(value)
    }

    /// Leaf holding a one-element array.
    pub fn scalar<F: Float>(&self, value: F) -> Param<F> {
        self.param(Tensor::scalar(value))
    }

    /// Number of identities handed out so far.
    pub fn allocated(&self) -> u64 {
        self.ids.allocated()
    }

    /// True when both handles share one allocator.
    pub fn same_as(&self, other: &Graph) -> bool {
        Rc::ptr_eq(&self.ids, &other.ids)
    }

    #[inline]
    pub(crate) fn next_id(&self) -> NodeId {
        self.ids.allocate()
    }
}
