//! Depth and critical-path annotation for combinational AIGs.
//!
//! A [`DepthView`] is a snapshot: it is computed from an [`Aig`] and stays
//! valid only as long as the AIG is not mutated. After any structural change
//! (typically a [`Aig::substitute_node`]), call [`DepthView::update`] before
//! reading levels or critical-path flags again.

use std::{
    collections::{HashMap, HashSet},
    ops::Deref,
};

use thiserror::Error;

use crate::{Aig, AigNode, NodeId, Result};

/// Error returned when depth annotation is impossible.
///
/// It is raised once at setup: this is a configuration error, not something
/// the rewriting engine recovers from.
#[derive(Debug, Error)]
pub enum DepthError {
    /// Combinational depth is undefined on a network with latches.
    #[error("network contains latches, combinational depth is undefined")]
    SequentialNetwork,
}

/// Levels and critical-path flags for every node reachable from an output.
///
/// The level of an input (and of the constant) is 0; the level of a gate is
/// one more than the deepest of its fanins. The depth of the network is the
/// maximum level over its outputs, and a node is on the critical path iff it
/// lies on some input-to-output path of that length.
#[derive(Debug, Clone)]
pub struct DepthView {
    levels: HashMap<NodeId, u32>,
    critical: HashSet<NodeId>,
    depth: u32,
}

impl DepthView {
    /// Annotate the given AIG. Fails on sequential networks.
    pub fn new(aig: &Aig) -> Result<Self> {
        let mut view = DepthView {
            levels: HashMap::new(),
            critical: HashSet::new(),
            depth: 0,
        };
        view.update(aig)?;
        Ok(view)
    }

    /// Recompute all levels and critical-path flags from scratch.
    ///
    /// Must be invoked after every structural change before the annotations
    /// are read again; until then they describe the previous network.
    pub fn update(&mut self, aig: &Aig) -> Result<()> {
        if !aig.get_latches_id().is_empty() {
            return Err(DepthError::SequentialNetwork.into());
        }

        self.levels.clear();
        self.critical.clear();

        // Fanins come first in the topological sort.
        let sort = aig.get_topological_sort()?;
        for node in &sort {
            let level = match node.borrow().deref() {
                AigNode::False | AigNode::Input(_) => 0,
                AigNode::And { fanin0, fanin1, .. } => {
                    let l0 = self.level(fanin0.get_node_id());
                    let l1 = self.level(fanin1.get_node_id());
                    1 + l0.max(l1)
                }
                AigNode::Latch { .. } => return Err(DepthError::SequentialNetwork.into()),
            };
            self.levels.insert(node.borrow().get_id(), level);
        }

        self.depth = aig
            .get_outputs()
            .iter()
            .map(|output| self.level(output.get_node_id()))
            .max()
            .unwrap_or(0);

        // Critical-path marking: deepest outputs, then the backward closure
        // over fanins sitting exactly one level down.
        for output in aig.get_outputs() {
            let id = output.get_node_id();
            if self.level(id) == self.depth {
                self.critical.insert(id);
            }
        }
        for node in sort.iter().rev() {
            let id = node.borrow().get_id();
            if !self.critical.contains(&id) {
                continue;
            }
            let level = self.level(id);
            for fanin in node.borrow().get_fanins() {
                let fanin_id = fanin.get_node_id();
                if self.level(fanin_id) + 1 == level {
                    self.critical.insert(fanin_id);
                }
            }
        }

        Ok(())
    }

    /// Level of a node. Nodes unreachable from the outputs report level 0.
    pub fn level(&self, id: NodeId) -> u32 {
        self.levels.get(&id).copied().unwrap_or(0)
    }

    /// Whether the node lies on some longest input-to-output path.
    pub fn is_on_critical_path(&self, id: NodeId) -> bool {
        self.critical.contains(&id)
    }

    /// Maximum level over the network outputs.
    pub fn depth(&self) -> u32 {
        self.depth
    }
}
