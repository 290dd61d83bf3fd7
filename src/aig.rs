//! Module defining the [`Aig`] struct, as well as [`AigNode`], [`AigEdge`] and some others relevant structs.
//!
//! To reduce the depth of a combinational AIG, check [`crate::rewrite`] docs.

mod clone;
pub mod edge;
pub mod error;
mod integrity;
pub mod node;

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    ops::Deref,
    rc::Rc,
};

pub use edge::{AigEdge, FaninId};
pub use error::{AigError, Result};
pub(crate) use node::AigNodeWeak;
pub use node::{AigNode, AigNodeRef, NodeId};

/// Normalized gate shape: both fanins as (node id, complement), smaller pair first.
type StrashKey = ((NodeId, bool), (NodeId, bool));

fn strash_key(fanin0: &AigEdge, fanin1: &AigEdge) -> StrashKey {
    let k0 = (fanin0.get_node_id(), fanin0.get_complement());
    let k1 = (fanin1.get_node_id(), fanin1.get_complement());
    if k0 <= k1 { (k0, k1) } else { (k1, k0) }
}

/// A whole AIG.
///
/// Nodes are kept alive artificially to allow rewrites of the structure.
/// Once you are done with rewriting (ie, your AIG should now be in a relevant state), you can
/// call the [`.update()`] method to remove all unused nodes.
///
/// For example, if you just created a gate using [`.create_and(fanin0, fanin1)`], this gate isn't
/// used as a fanin to any other node for now. It won't be deleted directly (fortunately!).
/// But if after finishing your rewrite you call [`.update()`] and the gate still is not used
/// by any other node, then, it will get deleted.
///
/// [`.update()`]: Aig::update
/// [`.create_and(fanin0, fanin1)`]: Aig::create_and
///
/// Gate creation through [`Aig::create_and`] (and the [`Aig::create_or`] /
/// [`Aig::create_nand`] encodings on top of it) performs structural hashing:
/// requesting a fanin pair that already exists returns the existing gate
/// instead of duplicating logic.
///
/// The use of [`Rc`] and [`AigNodeRef`] allows us not to worry about having to drop manually nodes
/// that are no longer used, eg. nodes that were used before by node `A` as their `fanin0`,
/// but `A` is rewritten to use another `fanin0`.
///
/// Note that [`Aig::clone`] will perform a shallow copy of the AIG (the nodes won't be copied).
/// If you want to recursively clone the data structure (ie not incrementing Rc
/// but creating new nodes), use [`Aig::deep_clone`] instead.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: HashMap<NodeId, AigNodeWeak>,
    /// Inputs must be kept artificially alive as
    /// we don't want to remove them even if the outputs do not depend on them.
    inputs: HashMap<NodeId, AigNodeRef>,
    /// Latches must be kept artificially alive as
    /// we don't want to remove them even if the outputs do not depend on them.
    latches: HashMap<NodeId, AigNodeRef>,
    outputs: Vec<AigEdge>,
    keep_nodes_alive: Vec<AigNodeRef>,
    /// Structural hashing table. Entries can go stale when a gate dies or has
    /// its fanins rewired; lookups validate before trusting an entry.
    strash: HashMap<StrashKey, AigNodeWeak>,
    /// Next candidate id for fresh gate allocation.
    next_id: NodeId,
    // Keep alive node false.
    _node_false: AigNodeRef,
}

impl Aig {
    /// Create a brand new AIG (constant node [`AigNode::False`] included).
    pub fn new() -> Self {
        let node_false = Rc::new(RefCell::new(AigNode::False));
        let nodes = HashMap::from([(0, Rc::downgrade(&node_false))]);
        Aig {
            nodes,
            inputs: HashMap::new(),
            latches: HashMap::new(),
            outputs: Vec::new(),
            keep_nodes_alive: Vec::new(),
            strash: HashMap::new(),
            next_id: 1,
            _node_false: node_false,
        }
    }

    /// Retrieves a node from its id.
    pub fn get_node(&self, id: NodeId) -> Option<AigNodeRef> {
        self.nodes.get(&id)?.upgrade()
    }

    /// Retrieves the constant false node.
    pub fn get_false(&self) -> AigNodeRef {
        self._node_false.clone()
    }

    /// Call this function when you are done with your rewrite.
    /// All nodes that are not part of the AIG anymore (ie not reachable from an output) will be deleted.
    pub fn update(&mut self) {
        // Stop keeping nodes artificially alive
        self.keep_nodes_alive.clear();

        // Removing no longer valid entries from the nodes
        self.nodes
            .retain(|_, weak_node| weak_node.upgrade().is_some());
        self.strash
            .retain(|_, weak_node| weak_node.upgrade().is_some());
    }

    /// Retrieves inputs reference.
    pub fn get_inputs(&self) -> Vec<AigNodeRef> {
        self.inputs.values().cloned().collect()
    }

    /// Retrieves inputs id.
    pub fn get_inputs_id(&self) -> HashSet<NodeId> {
        self.inputs.keys().copied().collect()
    }

    /// Retrieves latches reference.
    pub fn get_latches(&self) -> Vec<AigNodeRef> {
        self.latches.values().cloned().collect()
    }

    /// Retrieves latches id.
    pub fn get_latches_id(&self) -> HashSet<NodeId> {
        self.latches.keys().copied().collect()
    }

    /// Retrieves outputs reference.
    pub fn get_outputs(&self) -> Vec<AigEdge> {
        self.outputs.clone()
    }

    /// Ids of all the currently live AND gates, in ascending order.
    ///
    /// This is the enumeration the rewriting engine sweeps over. The order is
    /// stable for a given node set; nodes created or deleted during a sweep
    /// are only picked up by the next call.
    pub fn gate_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, weak)| {
                weak.upgrade()
                    .map(|node| node.borrow().is_and())
                    .unwrap_or(false)
            })
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn topological_visit(
        &self,
        node: AigNodeRef,
        sort: &mut Vec<AigNodeRef>,
        seen: &mut HashSet<NodeId>,
        done: &mut HashSet<NodeId>,
        outputs_to_visit: &mut Vec<AigNodeRef>,
    ) -> Result<()> {
        let mut stack: Vec<(AigNodeRef, bool)> = Vec::new();
        stack.push((node, false));

        while let Some((node, last_time)) = stack.pop() {
            let id = node.borrow().get_id();

            // Post order check
            if last_time {
                done.insert(id);
                sort.push(node);
                continue;
            }

            if done.contains(&id) {
                return Ok(());
            } else if seen.contains(&id) {
                return Err(AigError::InvalidState("found a cycle".to_string()));
            }

            seen.insert(id);
            stack.push((node.clone(), true));

            // Time to add potential fanins
            match node.borrow().deref() {
                // For latches, we don't want to detect "cycles" so we add their fanins
                // to the list of outputs to visit for later.
                AigNode::Latch { next, .. } => {
                    if !done.contains(&next.get_node().borrow().get_id()) {
                        outputs_to_visit.push(next.get_node());
                    }
                }
                // For and gates, we simply keep going on the DFS.
                AigNode::And { fanin0, fanin1, .. } => {
                    for fanin in [fanin0, fanin1] {
                        if !done.contains(&fanin.get_node().borrow().get_id()) {
                            stack.push((fanin.get_node(), false));
                        }
                    }
                }
                _ => (),
            }
        }

        Ok(())
    }

    /// Returns a topological sort of the AIG nodes, will error if a cycle is detected.
    ///
    /// The "topological" sort makes sense only for the purely combinational part of the AIG,
    /// ie only without latches. Indeed, latches are allowed to create cycles through their next-state fanin.
    pub fn get_topological_sort(&self) -> Result<Vec<AigNodeRef>> {
        let mut sort = Vec::new();
        let mut seen = HashSet::new();
        let mut done = HashSet::new();
        let mut outputs_to_visit = self
            .outputs
            .iter()
            .map(|output| output.get_node())
            .collect::<Vec<AigNodeRef>>();

        while let Some(node) = outputs_to_visit.pop() {
            self.topological_visit(node, &mut sort, &mut seen, &mut done, &mut outputs_to_visit)?;
        }
        Ok(sort)
    }

    fn check_valid_node_to_add(&self, node: &AigNode) -> Result<()> {
        match node {
            AigNode::False => Ok(()),
            AigNode::Input(id) => {
                if *id == 0 {
                    Err(AigError::IdZeroButNotFalse)
                } else {
                    Ok(())
                }
            }
            AigNode::And {
                id, fanin0, fanin1, ..
            } => {
                if *id == 0 {
                    Err(AigError::IdZeroButNotFalse)
                } else {
                    let fanin0_id = fanin0.get_node_id();
                    let fanin1_id = fanin1.get_node_id();
                    if !self.nodes.contains_key(&fanin0_id) {
                        Err(AigError::NodeDoesNotExist(fanin0_id))
                    } else if !self.nodes.contains_key(&fanin1_id) {
                        Err(AigError::NodeDoesNotExist(fanin1_id))
                    } else {
                        Ok(())
                    }
                }
            }
            AigNode::Latch { id, next, .. } => {
                if *id == 0 {
                    Err(AigError::IdZeroButNotFalse)
                } else {
                    let next_id = next.get_node_id();
                    if !self.nodes.contains_key(&next_id) {
                        Err(AigError::NodeDoesNotExist(next_id))
                    } else {
                        Ok(())
                    }
                }
            }
        }
    }

    /// Create a new (or retrieve existing) node within the AIG.
    /// This will fail if a different node with the same id already exists in the AIG,
    /// or if a node uses id 0 (reserved for constant node [`AigNode::False`]).
    ///
    /// ```rust
    /// use optaig::{Aig, AigEdge, AigNode};
    /// let mut aig = Aig::new();
    /// let node_false = aig.add_node(AigNode::False).unwrap();
    /// let i1 = aig.add_node(AigNode::Input(1)).unwrap();
    /// let i1_ = aig.add_node(AigNode::Input(1)).unwrap(); // will simply retrieve the existing node
    /// assert_eq!(i1, i1_);
    ///
    /// let and_gate =
    ///     aig.add_node(AigNode::and(
    ///         2,
    ///         AigEdge::new(i1.clone(), false),
    ///         AigEdge::new(i1.clone(), true)
    ///     )).unwrap(); // represent i1 ^ !i1 so will be false all the time (just an example)
    ///
    /// // Some stuff we cannot do
    /// // Node with id 0
    /// assert!(aig.add_node(AigNode::Input(0)).is_err());
    /// // Id 1 is already taken by an input
    /// assert!(
    ///     aig.add_node(AigNode::and(
    ///         1,
    ///         AigEdge::new(i1.clone(), false),
    ///         AigEdge::new(i1.clone(), false)
    ///     ))
    ///     .is_err()
    /// );
    /// ```
    pub fn add_node(&mut self, node: AigNode) -> Result<AigNodeRef> {
        self.check_valid_node_to_add(&node)?;

        let id = node.get_id();
        match self.get_node(id) {
            // No node with this id, let's create a new one
            None => {
                let n: Rc<RefCell<AigNode>> = Rc::new(RefCell::new(node));
                self.nodes.insert(id, Rc::downgrade(&n));
                self.keep_nodes_alive.push(n.clone());
                self.next_id = self.next_id.max(id + 1);
                // If the node is an input or a latch, we must add it to the map
                // If the node is a gate or a latch, we must register it as a fanout of its fanins
                match n.borrow().deref() {
                    AigNode::Input(_) => {
                        self.inputs.insert(id, n.clone());
                    }
                    AigNode::Latch { next, .. } => {
                        self.latches.insert(id, n.clone());
                        next.get_node()
                            .borrow_mut()
                            .add_fanout(id, Rc::downgrade(&n))?;
                    }
                    AigNode::And { fanin0, fanin1, .. } => {
                        fanin0
                            .get_node()
                            .borrow_mut()
                            .add_fanout(id, Rc::downgrade(&n))?;
                        fanin1
                            .get_node()
                            .borrow_mut()
                            .add_fanout(id, Rc::downgrade(&n))?;
                        let key = strash_key(fanin0, fanin1);
                        if self.strash_lookup(&key).is_none() {
                            self.strash.insert(key, Rc::downgrade(&n));
                        }
                    }
                    _ => (),
                };
                Ok(n)
            }
            // A node was found, maybe it is just the one we're trying to create
            Some(n) => {
                if *n.borrow() == node {
                    Ok(n)
                } else {
                    Err(AigError::DuplicateId(id))
                }
            }
        }
    }

    /// Create a new and node (or retrieve it if the exact same node already exists).
    pub fn new_and(&mut self, id: NodeId, fanin0: AigEdge, fanin1: AigEdge) -> Result<AigNodeRef> {
        let candidate = AigNode::and(id, fanin0, fanin1);
        self.add_node(candidate)
    }

    /// Validated structural hashing lookup. A hit is only trusted when the
    /// node is still alive, still registered, and still has the hashed fanin
    /// pair (substitution can rewire a gate long after it was hashed).
    /// Stale entries are dropped.
    fn strash_lookup(&mut self, key: &StrashKey) -> Option<AigNodeRef> {
        let weak = self.strash.get(key)?;
        if let Some(node) = weak.upgrade() {
            let registered = self
                .nodes
                .get(&node.borrow().get_id())
                .and_then(|w| w.upgrade())
                .is_some_and(|n| Rc::ptr_eq(&n, &node));
            if registered {
                let fanins = node.borrow().get_fanins();
                if fanins.len() == 2 && strash_key(&fanins[0], &fanins[1]) == *key {
                    return Some(node);
                }
            }
        }
        self.strash.remove(key);
        None
    }

    /// Create an AND gate over two signals, with structural deduplication:
    /// requesting an existing fanin pair returns the existing gate as a
    /// non-complemented edge rather than creating a duplicate.
    ///
    /// Trivial shapes fold without creating a gate: a constant fanin, twice
    /// the same signal, or a signal and its complement.
    pub fn create_and(&mut self, fanin0: AigEdge, fanin1: AigEdge) -> Result<AigEdge> {
        if fanin0.is_cst_false() || fanin1.is_cst_false() || fanin0.is_complement_of(&fanin1) {
            return Ok(AigEdge::new(self._node_false.clone(), false));
        }
        if fanin0.is_cst_true() {
            return Ok(fanin1);
        }
        if fanin1.is_cst_true() {
            return Ok(fanin0);
        }
        if fanin0 == fanin1 {
            return Ok(fanin0);
        }

        let key = strash_key(&fanin0, &fanin1);
        if let Some(node) = self.strash_lookup(&key) {
            return Ok(AigEdge::new(node, false));
        }

        // Store fanins in normalized order so the gate matches its key.
        let k0 = (fanin0.get_node_id(), fanin0.get_complement());
        let k1 = (fanin1.get_node_id(), fanin1.get_complement());
        let (a, b) = if k0 <= k1 {
            (fanin0, fanin1)
        } else {
            (fanin1, fanin0)
        };
        let id = self.fresh_id();
        let node = self.add_node(AigNode::and(id, a, b))?;
        Ok(AigEdge::new(node, false))
    }

    /// Create an OR over two signals, encoded as `!(AND(!a, !b))`.
    pub fn create_or(&mut self, fanin0: AigEdge, fanin1: AigEdge) -> Result<AigEdge> {
        Ok(!self.create_and(!fanin0, !fanin1)?)
    }

    /// Create a NAND over two signals, encoded as `!(AND(a, b))`.
    pub fn create_nand(&mut self, fanin0: AigEdge, fanin1: AigEdge) -> Result<AigEdge> {
        Ok(!self.create_and(fanin0, fanin1)?)
    }

    fn fresh_id(&mut self) -> NodeId {
        while self.nodes.contains_key(&self.next_id) {
            self.next_id += 1;
        }
        self.next_id
    }

    /// Mark an existing node as an output.
    pub fn add_output(&mut self, id: NodeId, complement: bool) -> Result<()> {
        let node = self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;
        self.outputs.push(AigEdge::new(node, complement));
        Ok(())
    }

    /// Remove a fanin from the outputs. Do not error if node refered by fanin does not exist
    /// or if fanin was not an output, simply returns None instead of the node.
    pub fn remove_output(&mut self, id: NodeId, complement: bool) -> Option<AigNodeRef> {
        let node = self.get_node(id)?;
        let output = AigEdge::new(node.clone(), complement);
        let len_before = self.outputs.len();
        self.outputs.retain(|out| *out != output);
        if self.outputs.len() < len_before {
            Some(node)
        } else {
            None
        }
    }

    /// Replace the given fanin of a node by a new fanin.
    /// Both nodes need to already exist in the AIG.
    pub fn replace_fanin(
        &mut self,
        parent_id: NodeId,
        fanin_id: FaninId,
        child_id: NodeId,
        complement: bool,
    ) -> Result<()> {
        let parent = self
            .get_node(parent_id)
            .ok_or(AigError::NodeDoesNotExist(parent_id))?;
        let child = self
            .get_node(child_id)
            .ok_or(AigError::NodeDoesNotExist(child_id))?;

        let fanin = AigEdge::new(child, complement);

        let weak_parent = Rc::downgrade(&parent);
        parent.borrow_mut().set_fanin(&fanin, fanin_id, weak_parent)
    }

    /// Substitute a gate by an equivalent signal: every consumer of `old_id`
    /// (gate fanins, latch next-state edges and network outputs) is rewired to
    /// `replacement`, composing complement bits, so every consumer keeps its
    /// truth value provided the replacement computes the same function as the
    /// old gate.
    ///
    /// The old gate is left in place with no consumers; it will be reclaimed
    /// by the next [`Aig::update`] if nothing else references it.
    ///
    /// The replacement signal must not depend on `old_id` (this would create a
    /// combinational cycle): the caller is responsible for substituting with a
    /// signal built from the old gate's cone or from unrelated logic, as
    /// [`Aig::check_integrity`] will report the cycle only after the fact.
    pub fn substitute_node(&mut self, old_id: NodeId, replacement: AigEdge) -> Result<()> {
        let old = self
            .get_node(old_id)
            .ok_or(AigError::NodeDoesNotExist(old_id))?;
        if !old.borrow().is_and() {
            return Err(AigError::InvalidState(format!(
                "substitution target {} is not an and gate",
                old_id
            )));
        }
        let new_id = replacement.get_node_id();
        self.get_node(new_id)
            .ok_or(AigError::NodeDoesNotExist(new_id))?;
        if new_id == old_id {
            return Err(AigError::InvalidState(format!(
                "substituting node {} by itself",
                old_id
            )));
        }

        let fanouts: Vec<AigNodeRef> = old
            .borrow()
            .get_and_fanouts()
            .unwrap() // unwrap cause old is an and gate and carries fanouts
            .values()
            .filter_map(|weak| weak.upgrade())
            .collect();

        for fanout in fanouts {
            let fanins = fanout.borrow().get_fanins();
            for (slot, edge) in fanins.iter().enumerate() {
                if edge.get_node_id() == old_id {
                    let rewired = AigEdge::new(
                        replacement.get_node(),
                        replacement.get_complement() ^ edge.get_complement(),
                    );
                    let weak = Rc::downgrade(&fanout);
                    fanout
                        .borrow_mut()
                        .set_fanin(&rewired, FaninId::from(slot), weak)?;
                }
            }
        }

        // The old gate might also drive outputs directly.
        for output in &mut self.outputs {
            if output.get_node_id() == old_id {
                let complement = replacement.get_complement() ^ output.get_complement();
                *output = AigEdge::new(replacement.get_node(), complement);
            }
        }

        Ok(())
    }
}

impl PartialEq for Aig {
    /// Compares the two AIGs. They are equal iff:
    /// - their inputs are equal (in terms of set)
    /// - their outputs are equal
    /// - their latches are equal
    /// - their valid nodes are equal.
    fn eq(&self, other: &Self) -> bool {
        self.outputs == other.outputs
            && self.inputs == other.inputs
            && self.latches == other.latches
            && self
                .nodes
                .iter()
                .filter_map(|(&id, weak)| Some((id, weak.upgrade()?)))
                .collect::<HashMap<NodeId, AigNodeRef>>()
                == other
                    .nodes
                    .iter()
                    .filter_map(|(&id, weak)| Some((id, weak.upgrade()?)))
                    .collect::<HashMap<NodeId, AigNodeRef>>()
    }
}
