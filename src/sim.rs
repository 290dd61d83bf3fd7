//! Combinational simulation of an AIG.
//!
//! Mostly used to check that a rewrite preserved the Boolean function of
//! every output: take the truth table before, rewrite, take it again,
//! compare.

use std::{collections::HashMap, ops::Deref};

use thiserror::Error;

use crate::{Aig, AigEdge, AigNode, NodeId, Result};

/// Largest input count accepted by [`truth_table`] (2^16 assignments).
pub const MAX_TRUTH_TABLE_INPUTS: usize = 16;

/// Error returned when simulation is impossible.
#[derive(Debug, Error)]
pub enum SimError {
    /// Every input must be assigned a value.
    #[error("no value assigned to input {0}")]
    UnassignedInput(NodeId),

    /// Only combinational networks can be evaluated.
    #[error("cannot simulate a sequential network")]
    SequentialNetwork,

    /// Exhaustive simulation is exponential in the input count.
    #[error("too many inputs for exhaustive simulation: {0}")]
    TooManyInputs(usize),
}

fn eval_edge(values: &HashMap<NodeId, bool>, edge: &AigEdge) -> bool {
    // Every fanin has been evaluated already (topological order).
    values[&edge.get_node_id()] ^ edge.get_complement()
}

/// Evaluate every output of the AIG under a total input assignment.
///
/// Outputs are returned in the order they were registered with
/// [`Aig::add_output`].
pub fn simulate(aig: &Aig, inputs: &HashMap<NodeId, bool>) -> Result<Vec<bool>> {
    let mut values: HashMap<NodeId, bool> = HashMap::from([(0, false)]);

    for node in aig.get_topological_sort()? {
        let value = match node.borrow().deref() {
            AigNode::False => false,
            AigNode::Input(id) => *inputs.get(id).ok_or(SimError::UnassignedInput(*id))?,
            AigNode::And { fanin0, fanin1, .. } => {
                eval_edge(&values, fanin0) && eval_edge(&values, fanin1)
            }
            AigNode::Latch { .. } => return Err(SimError::SequentialNetwork.into()),
        };
        values.insert(node.borrow().get_id(), value);
    }

    Ok(aig
        .get_outputs()
        .iter()
        .map(|output| eval_edge(&values, output))
        .collect())
}

/// Exhaustive simulation: one row of output values per input assignment.
///
/// Inputs are enumerated in ascending id order; assignment `m` sets input
/// number `k` to bit `k` of `m`. Fails on networks with more than
/// [`MAX_TRUTH_TABLE_INPUTS`] inputs.
pub fn truth_table(aig: &Aig) -> Result<Vec<Vec<bool>>> {
    let mut input_ids: Vec<NodeId> = aig.get_inputs_id().into_iter().collect();
    input_ids.sort_unstable();

    let n = input_ids.len();
    if n > MAX_TRUTH_TABLE_INPUTS {
        return Err(SimError::TooManyInputs(n).into());
    }

    let mut table = Vec::with_capacity(1 << n);
    for m in 0..(1u32 << n) {
        let assignment: HashMap<NodeId, bool> = input_ids
            .iter()
            .enumerate()
            .map(|(k, &id)| (id, m & (1 << k) != 0))
            .collect();
        table.push(simulate(aig, &assignment)?);
    }
    Ok(table)
}
