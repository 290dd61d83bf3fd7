use std::ops::Deref;

use crate::{Aig, AigEdge, AigError, AigNode, Result};

impl Aig {
    /// Performs a real recursive clone of the AIG.
    ///
    /// We are not just incrementing reference counters, but instead creating
    /// brand new nodes, completely unrelated with the previous AIG.
    ///
    /// Basically :
    /// - create inputs
    /// - create dummy latches
    /// - create and gates
    /// - update latches fanins
    /// - register outputs
    pub fn deep_clone(&self) -> Result<Self> {
        self.check_integrity()?;

        let mut aig = Aig::new();
        let node_false = aig.get_false();

        // Adding inputs
        for input in &self.get_inputs() {
            if let AigNode::Input(id) = input.borrow().deref() {
                aig.add_node(AigNode::Input(*id))?;
            } else {
                panic!("Expected input, got node {:?}", input);
            }
        }

        // Adding latches with dummy fanins
        for latch in self.get_latches() {
            if let AigNode::Latch { id, init, .. } = latch.borrow().deref() {
                aig.add_node(AigNode::Latch {
                    id: *id,
                    next: AigEdge::new(node_false.clone(), false),
                    init: *init,
                })?;
            } else {
                panic!("Expected latch, got node {:?}", latch);
            }
        }

        // Adding and gates in topological order
        for node in self.get_topological_sort()? {
            if let AigNode::And {
                id, fanin0, fanin1, ..
            } = node.borrow().deref()
            {
                // Beware, we also must recreate the corresponding fanins
                let i0 = fanin0.get_node_id();
                let new_fanin0 = AigEdge::new(
                    aig.get_node(i0).ok_or(AigError::NodeDoesNotExist(i0))?,
                    fanin0.get_complement(),
                );
                let i1 = fanin1.get_node_id();
                let new_fanin1 = AigEdge::new(
                    aig.get_node(i1).ok_or(AigError::NodeDoesNotExist(i1))?,
                    fanin1.get_complement(),
                );

                aig.add_node(AigNode::and(*id, new_fanin0, new_fanin1))?;
            }
        }

        // Edit the fanin of the latches
        for id in aig.get_latches_id() {
            let latch_ref = self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;
            if let AigNode::Latch { next, .. } = latch_ref.borrow().deref() {
                aig.replace_fanin(
                    id,
                    crate::FaninId::Fanin0,
                    next.get_node_id(),
                    next.get_complement(),
                )?;
            } else {
                panic!("Expected latch, got node {:?}", latch_ref);
            }
        }

        // Mark outputs
        for output in self.get_outputs() {
            aig.add_output(output.get_node_id(), output.get_complement())?;
        }

        aig.update();
        aig.check_integrity()?;

        Ok(aig)
    }
}
