//! Algebraic depth rewriting for combinational AIGs.
//!
//! The engine applies three local, function-preserving rewrites to gates on
//! the critical path - associativity, two-layer distributivity and
//! three-layer distributivity - until a full sweep over the network applies
//! nothing. Each accepted rewrite shortens the longest path through the
//! rewritten gate, so the overall depth never increases.
//!
//! ```rust
//! use optaig::{Aig, AigEdge, AigNode, algebraic_depth_rewriting};
//! let mut aig = Aig::new();
//! let i1 = aig.add_node(AigNode::Input(1)).unwrap();
//! let i2 = aig.add_node(AigNode::Input(2)).unwrap();
//! aig.new_and(3, AigEdge::new(i1, false), AigEdge::new(i2, false)).unwrap();
//! aig.add_output(3, false).unwrap();
//! let stats = algebraic_depth_rewriting(&mut aig).unwrap();
//! assert_eq!(stats.applications(), 0); // nothing to improve here
//! ```

use std::collections::{HashSet, VecDeque};

use log::{debug, trace};

use crate::{
    Aig, AigEdge, AigNodeRef, NodeId, Result,
    depth::DepthView,
};

/// Profitability thresholds for the depth-sensitive rules.
///
/// These are policy, not correctness: any margin yields a function-preserving
/// network, the defaults reproduce the classical behavior. Two-layer
/// distributivity has no threshold - factoring the shared critical term out
/// of both branches is always worthwhile.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// Associativity fires when `level(non_pivot) + assoc_margin <= level(nephew)`.
    pub assoc_margin: u32,
    /// Three-layer distributivity fires when
    /// `level(chain head) > level(first other signal) + chain_margin`.
    pub chain_margin: u32,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            assoc_margin: 1,
            chain_margin: 2,
        }
    }
}

impl CostModel {
    pub fn associativity_profitable(&self, non_pivot_level: u32, nephew_level: u32) -> bool {
        non_pivot_level + self.assoc_margin <= nephew_level
    }

    pub fn chain_profitable(&self, chain_level: u32, other_level: u32) -> bool {
        chain_level > other_level + self.chain_margin
    }
}

/// Counters reported by a rewriting run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    pub associativity: usize,
    pub distributivity: usize,
    pub three_layer_distributivity: usize,
    pub depth_before: u32,
    pub depth_after: u32,
}

impl RewriteStats {
    /// Total number of accepted rewrites.
    pub fn applications(&self) -> usize {
        self.associativity + self.distributivity + self.three_layer_distributivity
    }

    fn record(&mut self, rule: Rule) {
        match rule {
            Rule::Associativity => self.associativity += 1,
            Rule::Distributivity => self.distributivity += 1,
            Rule::ThreeLayerDistributivity => self.three_layer_distributivity += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Associativity,
    Distributivity,
    ThreeLayerDistributivity,
}

/// A candidate shape found around a critical-path gate.
///
/// The three shapes are mutually exclusive, keyed by the polarity and
/// criticality of the gate's fanins, so the first structural match is the
/// only possible one.
#[derive(Debug)]
enum Pattern {
    /// `n = non_pivot & (pivot_off & nephew)` with only the nephew side deep:
    /// re-associating moves the nephew up one level.
    AndChain {
        non_pivot: AigEdge,
        pivot_off: AigEdge,
        nephew: AigEdge,
    },
    /// `n = !(shared & other0) & !(shared & other1)`: the gate computes
    /// `NAND(shared, other0 | other1)`, with the shared term duplicated on
    /// both critical branches.
    OrOfAnds {
        shared: AigEdge,
        other0: AigEdge,
        other1: AigEdge,
    },
    /// A three-deep chain of complemented critical fanins, one off-path
    /// signal peeled per layer (the third layer only requires criticality).
    ChainedNand {
        chain: [AigEdge; 3],
        other: [AigEdge; 3],
    },
}

impl Pattern {
    fn rule(&self) -> Rule {
        match self {
            Pattern::AndChain { .. } => Rule::Associativity,
            Pattern::OrOfAnds { .. } => Rule::Distributivity,
            Pattern::ChainedNand { .. } => Rule::ThreeLayerDistributivity,
        }
    }

    fn profitable(&self, view: &DepthView, cost: &CostModel) -> bool {
        match self {
            Pattern::AndChain {
                non_pivot, nephew, ..
            } => cost.associativity_profitable(
                view.level(non_pivot.get_node_id()),
                view.level(nephew.get_node_id()),
            ),
            Pattern::OrOfAnds { .. } => true,
            Pattern::ChainedNand { chain, other } => cost.chain_profitable(
                view.level(chain[0].get_node_id()),
                view.level(other[0].get_node_id()),
            ),
        }
    }
}

/// Match the associativity shape around `id` (see [`Pattern::AndChain`]).
fn match_and_chain(aig: &Aig, view: &DepthView, id: NodeId) -> Option<Pattern> {
    // Gates fed by inputs only have nothing to re-associate.
    if view.level(id) <= 1 {
        return None;
    }
    let node = aig.get_node(id)?;
    let fanins = node.borrow().get_fanins();
    let f0_critical = view.is_on_critical_path(fanins[0].get_node_id());
    let f1_critical = view.is_on_critical_path(fanins[1].get_node_id());

    // The pivot is the single critical, non-complemented fanin; the other
    // fanin must sit off the critical path.
    let (pivot, non_pivot) = match (f0_critical, f1_critical) {
        (true, false) if !fanins[0].get_complement() => (fanins[0].clone(), fanins[1].clone()),
        (false, true) if !fanins[1].get_complement() => (fanins[1].clone(), fanins[0].clone()),
        _ => return None,
    };
    if view.level(pivot.get_node_id()) <= 1 {
        return None;
    }

    // Exactly one of the pivot's fanins may be critical: the nephew.
    let pivot_node = pivot.get_node();
    let pivot_fanins = pivot_node.borrow().get_fanins();
    let p0_critical = view.is_on_critical_path(pivot_fanins[0].get_node_id());
    let p1_critical = view.is_on_critical_path(pivot_fanins[1].get_node_id());
    let (nephew, pivot_off) = match (p0_critical, p1_critical) {
        (true, false) => (pivot_fanins[0].clone(), pivot_fanins[1].clone()),
        (false, true) => (pivot_fanins[1].clone(), pivot_fanins[0].clone()),
        _ => return None,
    };

    Some(Pattern::AndChain {
        non_pivot,
        pivot_off,
        nephew,
    })
}

/// Partition a child's fanins into (critical, off-path), requiring exactly
/// one of each.
fn split_child(view: &DepthView, child: &AigNodeRef) -> Option<(AigEdge, AigEdge)> {
    let fanins = child.borrow().get_fanins();
    if fanins.len() != 2 {
        return None;
    }
    let c0_critical = view.is_on_critical_path(fanins[0].get_node_id());
    let c1_critical = view.is_on_critical_path(fanins[1].get_node_id());
    match (c0_critical, c1_critical) {
        (true, false) => Some((fanins[0].clone(), fanins[1].clone())),
        (false, true) => Some((fanins[1].clone(), fanins[0].clone())),
        _ => None,
    }
}

/// Match the two-layer distributivity shape around `id` (see
/// [`Pattern::OrOfAnds`]).
fn match_or_of_ands(aig: &Aig, view: &DepthView, id: NodeId) -> Option<Pattern> {
    let node = aig.get_node(id)?;
    let fanins = node.borrow().get_fanins();

    // In an AIG an OR is an AND with inverting inputs: both children must be
    // complemented and critical for the gate to encode an OR over two
    // critical product terms.
    for fanin in &fanins {
        if !fanin.get_complement() || !view.is_on_critical_path(fanin.get_node_id()) {
            return None;
        }
    }

    let (shared0, other0) = split_child(view, &fanins[0].get_node())?;
    let (shared1, other1) = split_child(view, &fanins[1].get_node())?;
    if shared0 != shared1 {
        return None;
    }

    Some(Pattern::OrOfAnds {
        shared: shared0,
        other0,
        other1,
    })
}

/// One classification step of the three-layer matcher: critical complemented
/// fanins extend the chain, off-path fanins join the peeled signals, and
/// critical non-complemented fanins disqualify nothing but contribute
/// nothing either.
fn split_layer(view: &DepthView, node: &AigNodeRef) -> (Vec<AigEdge>, Vec<AigEdge>) {
    let mut chain = Vec::new();
    let mut other = Vec::new();
    for fanin in node.borrow().get_fanins() {
        let critical = view.is_on_critical_path(fanin.get_node_id());
        if critical && fanin.get_complement() {
            chain.push(fanin);
        } else if !critical {
            other.push(fanin);
        }
    }
    (chain, other)
}

/// Match the three-layer distributivity shape around `id` (see
/// [`Pattern::ChainedNand`]).
fn match_chained_nand(aig: &Aig, view: &DepthView, id: NodeId) -> Option<Pattern> {
    let node = aig.get_node(id)?;
    let mut chain: Vec<AigEdge> = Vec::new();
    let mut other: Vec<AigEdge> = Vec::new();

    let (c, o) = split_layer(view, &node);
    chain.extend(c);
    other.extend(o);
    if chain.len() != 1 || other.len() != 1 {
        return None;
    }

    let (c, o) = split_layer(view, &chain[0].get_node());
    chain.extend(c);
    other.extend(o);
    if chain.len() != 2 || other.len() != 2 {
        return None;
    }

    // Third layer: polarity no longer matters, only criticality.
    for fanin in chain[1].get_node().borrow().get_fanins() {
        if view.is_on_critical_path(fanin.get_node_id()) {
            chain.push(fanin);
        } else {
            other.push(fanin);
        }
    }
    if chain.len() != 3 || other.len() != 3 {
        return None;
    }

    Some(Pattern::ChainedNand {
        chain: chain.try_into().ok()?,
        other: other.try_into().ok()?,
    })
}

/// Try the three shapes in priority order. They are mutually exclusive, so
/// at most one can match a given gate.
fn match_pattern(aig: &Aig, view: &DepthView, id: NodeId) -> Option<Pattern> {
    match_and_chain(aig, view, id)
        .or_else(|| match_or_of_ands(aig, view, id))
        .or_else(|| match_chained_nand(aig, view, id))
}

/// Build the replacement logic for a matched pattern and substitute the gate.
/// Returns the replacement signal, or `None` when structural hashing handed
/// the gate itself back (nothing to rewire).
fn apply(aig: &mut Aig, id: NodeId, pattern: Pattern) -> Result<Option<AigEdge>> {
    let replacement = match pattern {
        // (non_pivot & pivot_off) & nephew: the nephew moves up one level.
        Pattern::AndChain {
            non_pivot,
            pivot_off,
            nephew,
        } => {
            let shallow = aig.create_and(non_pivot, pivot_off)?;
            aig.create_and(shallow, nephew)?
        }
        // NAND(shared, other0 | other1): the gate itself computes the NAND;
        // OR-flavored consumers read it through their complemented edges,
        // which substitution preserves.
        Pattern::OrOfAnds {
            shared,
            other0,
            other1,
        } => {
            let or = aig.create_or(other0, other1)?;
            aig.create_nand(shared, or)?
        }
        // (other0 & !other1) | (other0 & chain2 & other2), which is what the
        // three-layer chain computes once unfolded.
        Pattern::ChainedNand { chain, other } => {
            let [_, _, c2] = chain;
            let [o0, o1, o2] = other;
            let a1 = aig.create_and(o2, o0.clone())?;
            let a2 = aig.create_and(c2, a1)?;
            let a3 = aig.create_and(o0, !o1)?;
            aig.create_nand(!a2, !a3)?
        }
    };

    if replacement.get_node_id() == id {
        return Ok(None);
    }
    aig.substitute_node(id, replacement.clone())?;
    Ok(Some(replacement))
}

/// Try the rule set on one gate. Returns the applied rule and the
/// replacement signal, or `None` when no rule matched or the matched rule is
/// not profitable - both are ordinary outcomes, not errors.
fn try_gate(
    aig: &mut Aig,
    view: &DepthView,
    cost: &CostModel,
    id: NodeId,
) -> Result<Option<(Rule, AigEdge)>> {
    // The gate may have died or left the critical path since it was queued.
    let Some(node) = aig.get_node(id) else {
        return Ok(None);
    };
    if !node.borrow().is_and() || !view.is_on_critical_path(id) {
        return Ok(None);
    }

    let Some(pattern) = match_pattern(aig, view, id) else {
        return Ok(None);
    };
    if !pattern.profitable(view, cost) {
        trace!("node {}: {:?} matched but is not profitable", id, pattern.rule());
        return Ok(None);
    }

    let rule = pattern.rule();
    Ok(apply(aig, id, pattern)?.map(|replacement| (rule, replacement)))
}

fn enqueue_dirty(replacement: &AigEdge, queue: &mut VecDeque<NodeId>, queued: &mut HashSet<NodeId>) {
    let mut dirty = vec![replacement.get_node_id()];
    if let Some(fanouts) = replacement.get_node().borrow().get_and_fanouts() {
        dirty.extend(fanouts.keys().copied());
    }
    for id in dirty {
        if queued.insert(id) {
            queue.push_back(id);
        }
    }
}

/// Reduce the depth of a combinational AIG with the default [`CostModel`].
///
/// Mutates the network in place and returns once no further rule application
/// changes it. Fails fast (before any rewriting) if the network does not
/// support depth annotation, ie if it is sequential.
pub fn algebraic_depth_rewriting(aig: &mut Aig) -> Result<RewriteStats> {
    algebraic_depth_rewriting_with(aig, &CostModel::default())
}

/// Same as [`algebraic_depth_rewriting`], with caller-supplied profitability
/// thresholds.
pub fn algebraic_depth_rewriting_with(aig: &mut Aig, cost: &CostModel) -> Result<RewriteStats> {
    let mut view = DepthView::new(aig)?;
    let mut stats = RewriteStats {
        depth_before: view.depth(),
        depth_after: view.depth(),
        ..RewriteStats::default()
    };

    let mut queue: VecDeque<NodeId> = aig.gate_ids().into_iter().collect();
    let mut queued: HashSet<NodeId> = queue.iter().copied().collect();

    loop {
        // Drain the dirty queue. Levels and critical-path flags are re-read
        // from the freshly updated view on every pop, never cached across a
        // substitution.
        while let Some(id) = queue.pop_front() {
            queued.remove(&id);
            if let Some((rule, replacement)) = try_gate(aig, &view, cost, id)? {
                view.update(aig)?;
                stats.record(rule);
                debug!(
                    "applied {:?} at node {}, depth is now {}",
                    rule,
                    id,
                    view.depth()
                );
                enqueue_dirty(&replacement, &mut queue, &mut queued);
            }
        }

        aig.update();

        // A substitution can pull far-away nodes onto the critical path, so
        // the fixpoint is only reached once a full pass over the current gate
        // set applies nothing. Any application refills the queue and goes
        // back to draining it.
        let mut changed = false;
        for id in aig.gate_ids() {
            if let Some((rule, replacement)) = try_gate(aig, &view, cost, id)? {
                view.update(aig)?;
                stats.record(rule);
                debug!(
                    "applied {:?} at node {} (sweep), depth is now {}",
                    rule,
                    id,
                    view.depth()
                );
                enqueue_dirty(&replacement, &mut queue, &mut queued);
                changed = true;
                break;
            }
        }
        if !changed {
            break;
        }
    }

    aig.update();
    stats.depth_after = view.depth();
    debug!(
        "fixpoint reached: depth {} -> {}, {} rewrites",
        stats.depth_before,
        stats.depth_after,
        stats.applications()
    );
    Ok(stats)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::AigNode;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn input(aig: &mut Aig, id: NodeId) -> AigEdge {
        AigEdge::new(aig.add_node(AigNode::Input(id)).unwrap(), false)
    }

    /// out = ((i1 & i2) & i3) & i4, a left-leaning chain of depth 3.
    fn chain_aig() -> Aig {
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let g5 = aig.create_and(i1, i2).unwrap();
        let g6 = aig.create_and(g5, i3).unwrap();
        let g7 = aig.create_and(g6, i4).unwrap();
        aig.add_output(g7.get_node_id(), false).unwrap();
        aig
    }

    #[test]
    fn associativity_balances_chain() {
        init_logger();
        let mut aig = chain_aig();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.depth_before, 3);
        assert_eq!(stats.depth_after, 2);
        assert_eq!(stats.associativity, 1);
        assert_eq!(stats.distributivity, 0);
        assert_eq!(stats.three_layer_distributivity, 0);
    }

    #[test]
    fn associativity_requires_noncomplemented_pivot() {
        // out = !((i1 & i2) & i3) & i4: the deep fanin is complemented, so
        // there is no pivot and nothing may be rewritten.
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let g5 = aig.create_and(i1, i2).unwrap();
        let g6 = aig.create_and(g5, i3).unwrap();
        let g7 = aig.create_and(!g6, i4).unwrap();
        aig.add_output(g7.get_node_id(), false).unwrap();

        let view = DepthView::new(&aig).unwrap();
        assert!(match_pattern(&aig, &view, g7.get_node_id()).is_none());

        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.applications(), 0);
    }

    #[test]
    fn associativity_requires_profit() {
        // Both sides of the top gate are equally deep: re-associating would
        // not shorten anything.
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let i5 = input(&mut aig, 5);
        let left = aig.create_and(i1, i2).unwrap();
        let deep = aig.create_and(i3, i4).unwrap();
        let pivot = aig.create_and(deep, i5).unwrap();
        let top = aig.create_and(left, pivot).unwrap();
        aig.add_output(top.get_node_id(), false).unwrap();

        let view = DepthView::new(&aig).unwrap();
        // The shape is there...
        let pattern = match_pattern(&aig, &view, top.get_node_id());
        assert!(matches!(&pattern, Some(Pattern::AndChain { .. })));
        // ...but level(left) == level(deep), so the default margin rejects it.
        assert!(!pattern.unwrap().profitable(&view, &CostModel::default()));
    }

    #[test]
    fn distributivity_requires_both_children_complemented() {
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let s = aig.create_and(i3, i4).unwrap();
        let c0 = aig.create_and(i1, s.clone()).unwrap();
        let c1 = aig.create_and(i2, s.clone()).unwrap();
        // Only one inverting input: this is not an OR over the two products.
        let top = aig.create_and(!c0, c1).unwrap();
        aig.add_output(top.get_node_id(), true).unwrap();

        let view = DepthView::new(&aig).unwrap();
        assert!(match_or_of_ands(&aig, &view, top.get_node_id()).is_none());
    }

    #[test]
    fn chained_nand_needs_three_layers() {
        // Two layers of complemented critical fanins only: the third
        // classification step finds no gate to unfold.
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let g5 = aig.create_and(i1, i2).unwrap();
        let g6 = aig.create_and(!g5, i3).unwrap();
        let g7 = aig.create_and(!g6, i4).unwrap();
        aig.add_output(g7.get_node_id(), false).unwrap();

        let view = DepthView::new(&aig).unwrap();
        assert!(match_chained_nand(&aig, &view, g7.get_node_id()).is_none());
    }

    #[test]
    fn cost_model_margins() {
        let cost = CostModel::default();
        assert!(cost.associativity_profitable(0, 1));
        assert!(cost.associativity_profitable(1, 2));
        assert!(!cost.associativity_profitable(1, 1));
        assert!(!cost.associativity_profitable(2, 1));

        assert!(cost.chain_profitable(3, 0));
        assert!(!cost.chain_profitable(2, 0));
        assert!(!cost.chain_profitable(0, 3));

        // A stricter model rejects the one-level win.
        let strict = CostModel {
            assoc_margin: 2,
            ..cost
        };
        assert!(!strict.associativity_profitable(0, 1));
    }

    #[test]
    fn associativity_adopts_deep_nephew() {
        init_logger();
        // n = (i1 & i2) & ((i3 & i4) & ((i5 & i6) & i1)): on the path to the
        // deep branch, the top gate swaps its shallow side down one level.
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let i5 = input(&mut aig, 5);
        let i6 = input(&mut aig, 6);
        let a = aig.create_and(i1.clone(), i2).unwrap();
        let b = aig.create_and(i3, i4).unwrap();
        let d = aig.create_and(i5, i6).unwrap();
        let c = aig.create_and(d, i1).unwrap();
        let pivot = aig.create_and(b, c).unwrap();
        let n = aig.create_and(a, pivot).unwrap();
        aig.add_output(n.get_node_id(), false).unwrap();

        let before = crate::sim::truth_table(&aig).unwrap();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.depth_before, 4);
        assert_eq!(stats.depth_after, 3);
        assert_eq!(stats.associativity, 1);
        assert_eq!(stats.applications(), 1);
        assert_eq!(crate::sim::truth_table(&aig).unwrap(), before);
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    fn distributivity_factors_shared_term() {
        init_logger();
        // out = (i1 & s) | (i2 & s) with s = i3 & i4 duplicated on both
        // critical branches; factoring gives out = s & (i1 | i2), one level
        // shallower.
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let s = aig.create_and(i3, i4).unwrap();
        let c0 = aig.create_and(i1, s.clone()).unwrap();
        let c1 = aig.create_and(i2, s.clone()).unwrap();
        let root = aig.create_and(!c0, !c1).unwrap();
        aig.add_output(root.get_node_id(), true).unwrap();

        let before = crate::sim::truth_table(&aig).unwrap();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.depth_before, 3);
        assert_eq!(stats.depth_after, 2);
        assert_eq!(stats.distributivity, 1);
        assert_eq!(stats.applications(), 1);
        assert_eq!(crate::sim::truth_table(&aig).unwrap(), before);
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    fn three_layer_distributivity_unfolds_chain() {
        init_logger();
        // A three-deep chain of complemented critical fanins over a balanced
        // subtree, with one shallow signal peeled per layer. Neither
        // associativity nor two-layer distributivity applies anywhere.
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let i5 = input(&mut aig, 5);
        let i6 = input(&mut aig, 6);
        let i7 = input(&mut aig, 7);
        let e1 = aig.create_and(i1, i2).unwrap();
        let e2 = aig.create_and(i3, i4).unwrap();
        let c2 = aig.create_and(e1, e2).unwrap();
        let g2 = aig.create_and(c2, i5).unwrap();
        let g1 = aig.create_and(!g2, i6).unwrap();
        let n = aig.create_and(!g1, i7).unwrap();
        aig.add_output(n.get_node_id(), false).unwrap();

        let before = crate::sim::truth_table(&aig).unwrap();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.depth_before, 5);
        assert_eq!(stats.depth_after, 4);
        assert_eq!(stats.three_layer_distributivity, 1);
        assert_eq!(stats.applications(), 1);
        assert_eq!(crate::sim::truth_table(&aig).unwrap(), before);
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    fn no_rewrite_without_shared_term() {
        init_logger();
        // out = (i1 & s0) | (i2 & s1) with distinct s0, s1: the OR-of-ANDs
        // shape is there but nothing can be factored, and the network must
        // come out untouched.
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        let i2 = input(&mut aig, 2);
        let i3 = input(&mut aig, 3);
        let i4 = input(&mut aig, 4);
        let i5 = input(&mut aig, 5);
        let i6 = input(&mut aig, 6);
        let s0 = aig.create_and(i3, i4).unwrap();
        let s1 = aig.create_and(i5, i6).unwrap();
        let c0 = aig.create_and(i1, s0).unwrap();
        let c1 = aig.create_and(i2, s1).unwrap();
        let root = aig.create_and(!c0, !c1).unwrap();
        aig.add_output(root.get_node_id(), true).unwrap();
        aig.update();

        let snapshot = aig.deep_clone().unwrap();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.applications(), 0);
        assert_eq!(stats.depth_before, stats.depth_after);
        assert_eq!(aig, snapshot);
    }

    #[test]
    fn rebalances_long_chain() {
        init_logger();
        // An 8-input left-leaning AND chain. Greedy local rebalancing cannot
        // reach the perfectly balanced tree of depth 3, but it does get from
        // 7 down to 4 in three associativity steps.
        let mut aig = Aig::new();
        let edges: Vec<AigEdge> = (1..=8).map(|k| input(&mut aig, k)).collect();
        let mut acc = edges[0].clone();
        for edge in &edges[1..] {
            acc = aig.create_and(acc, edge.clone()).unwrap();
        }
        aig.add_output(acc.get_node_id(), false).unwrap();

        let before = crate::sim::truth_table(&aig).unwrap();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.depth_before, 7);
        assert_eq!(stats.depth_after, 4);
        assert_eq!(stats.applications(), stats.associativity);
        assert_eq!(crate::sim::truth_table(&aig).unwrap(), before);
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    fn preserves_function_with_mixed_polarities() {
        init_logger();
        // Complemented edges everywhere, two outputs of opposite polarity.
        let mut aig = Aig::new();
        let x1 = input(&mut aig, 1);
        let x2 = input(&mut aig, 2);
        let x3 = input(&mut aig, 3);
        let x4 = input(&mut aig, 4);
        let x5 = input(&mut aig, 5);
        let g = aig.create_and(x1, !x2).unwrap();
        let h = aig.create_and(g.clone(), x3).unwrap();
        let k = aig.create_and(!h, x4).unwrap();
        let m = aig.create_and(k, !x5).unwrap();
        aig.add_output(m.get_node_id(), false).unwrap();
        aig.add_output(g.get_node_id(), true).unwrap();

        let before = crate::sim::truth_table(&aig).unwrap();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert!(stats.depth_after <= stats.depth_before);
        assert_eq!(crate::sim::truth_table(&aig).unwrap(), before);
        assert!(aig.check_integrity().is_ok());
    }

    #[test]
    fn idempotent_at_fixpoint() {
        init_logger();
        let mut aig = chain_aig();
        algebraic_depth_rewriting(&mut aig).unwrap();

        let snapshot = aig.deep_clone().unwrap();
        let stats = algebraic_depth_rewriting(&mut aig).unwrap();
        assert_eq!(stats.applications(), 0);
        assert_eq!(stats.depth_before, stats.depth_after);
        assert_eq!(aig, snapshot);
    }

    #[test]
    fn rejects_sequential_network() {
        let mut aig = Aig::new();
        let i1 = input(&mut aig, 1);
        aig.add_node(AigNode::latch(2, i1.clone(), None)).unwrap();
        let l2 = AigEdge::new(aig.get_node(2).unwrap(), false);
        let g3 = aig.create_and(i1, l2).unwrap();
        aig.add_output(g3.get_node_id(), false).unwrap();
        assert!(algebraic_depth_rewriting(&mut aig).is_err());
    }
}
