//! Backward gradient queries.
//!
//! A query walks the graph from a sink toward one or more target identities.
//! Nodes are collected once each by an explicit-stack depth-first search, then
//! swept sink-first in reverse topological order with an adjoint map keyed by
//! [`NodeId`]. Contributions that reach a node along different paths are added,
//! so a node used several times gets the sum over all of its uses.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use log::trace;

use crate::error::{Error, Result};
use crate::float::Float;
use crate::graph::NodeId;
use crate::param::Param;
use crate::tensor::Tensor;

/// Gradients of one sink with respect to several targets.
#[derive(Clone, Debug)]
pub struct Gradients<F> {
    by_id: HashMap<NodeId, Tensor<F>>,
}

impl<F: Float> Gradients<F> {
    pub fn get(&self, id: NodeId) -> Option<&Tensor<F>> {
        self.by_id.get(&id)
    }

    /// Gradient with respect to `param`'s identity.
    pub fn wrt(&self, param: &Param<F>) -> Option<&Tensor<F>> {
        self.get(param.id())
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Tensor<F>> {
        self.by_id.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Tensor<F>)> + '_ {
        self.by_id.iter().map(|(&id, g)| (id, g))
    }
}

/// Gradient of `sink` with respect to the ancestor identified by `target`.
///
/// The sweep is seeded with `ones(sink.shape())`, so for an array-valued sink
/// this is the gradient of the sum of its elements. A node queried for its own
/// identity returns the seed.
///
/// # Errors
///
/// [`Error::TargetNotFound`] if `target` is not `sink` or one of its ancestors.
/// Shape errors raised while composing partials are returned unchanged.
pub fn gradient_of<F: Float>(sink: &Param<F>, target: NodeId) -> Result<Tensor<F>> {
    let mut grads = gradients(sink, &[target])?;
    grads.remove(target).ok_or(Error::TargetNotFound(target))
}

/// Gradients of `sink` with respect to every identity in `targets`, in one sweep.
///
/// Fails with [`Error::TargetNotFound`] (naming the smallest missing identity)
/// before doing any arithmetic if some target is unreachable.
pub fn gradients<F: Float>(sink: &Param<F>, targets: &[NodeId]) -> Result<Gradients<F>> {
    let targets: HashSet<NodeId> = targets.iter().copied().collect();
    let order = topological_order(sink);

    let reachable: HashSet<NodeId> = order.iter().map(Param::id).collect();
    if let Some(&missing) = targets.iter().filter(|t| !reachable.contains(t)).min() {
        return Err(Error::TargetNotFound(missing));
    }

    // A node matters if it is a target or lies on a path to one. Parents come
    // first in `order`, so one forward pass settles this.
    let mut relevant: HashSet<NodeId> = HashSet::with_capacity(order.len());
    for node in &order {
        if targets.contains(&node.id()) || node.parents().any(|p| relevant.contains(&p.id())) {
            relevant.insert(node.id());
        }
    }
    trace!(
        "backward from {}: {} reachable, {} on a path to {} target(s)",
        sink.id(),
        order.len(),
        relevant.len(),
        targets.len()
    );

    let mut adjoints: HashMap<NodeId, Tensor<F>> = HashMap::new();
    adjoints.insert(sink.id(), Tensor::ones(sink.shape()));

    for node in order.iter().rev() {
        let id = node.id();
        if !relevant.contains(&id) {
            continue;
        }
        // Every consumer has already been swept, so this adjoint is complete.
        let upstream = if targets.contains(&id) {
            match adjoints.get(&id) {
                Some(g) => g.clone(),
                None => continue,
            }
        } else {
            match adjoints.remove(&id) {
                Some(g) => g,
                None => continue,
            }
        };

        for (parent, partial, combinator) in node.edges() {
            if !relevant.contains(&parent.id()) {
                continue;
            }
            let contribution = combinator.apply(&upstream, partial)?;
            let contribution = unbroadcast(contribution, parent.shape())?;
            match adjoints.entry(parent.id()) {
                Entry::Occupied(mut slot) => slot.get_mut().accumulate(&contribution)?,
                Entry::Vacant(slot) => {
                    slot.insert(contribution);
                }
            }
        }
    }

    adjoints.retain(|id, _| targets.contains(id));
    Ok(Gradients { by_id: adjoints })
}

/// Every node reachable from `sink`, once per identity, parents before children.
fn topological_order<F: Float>(sink: &Param<F>) -> Vec<Param<F>> {
    let mut order = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    // (node, parents already pushed)
    let mut stack: Vec<(Param<F>, bool)> = vec![(sink.clone(), false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        if !visited.insert(node.id()) {
            continue;
        }
        let parents: Vec<Param<F>> = node
            .parents()
            .filter(|p| !visited.contains(&p.id()))
            .cloned()
            .collect();
        stack.push((node, true));
        stack.extend(parents.into_iter().map(|p| (p, false)));
    }
    order
}

/// Fold a contribution back onto its parent's shape.
///
/// A one-element parent that was broadcast over a larger operand receives the
/// sum of the contribution. Any other disagreement is a shape error.
fn unbroadcast<F: Float>(contribution: Tensor<F>, shape: &[usize]) -> Result<Tensor<F>> {
    if contribution.shape() == shape {
        return Ok(contribution);
    }
    if shape.iter().product::<usize>() == 1 {
        return Ok(Tensor::full(shape, contribution.sum()));
    }
    Err(Error::shape_mismatch("gradient", contribution.shape(), shape))
}
