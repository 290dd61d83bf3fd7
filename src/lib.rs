//! A library to reduce the depth of And-Inverter Graphs (AIGs) using
//! algebraic rewriting.
//!
//! Build or load a combinational [`Aig`], then call
//! [`algebraic_depth_rewriting`] to rebalance its critical path in place.
//! Functional equivalence can be checked with [`sim::truth_table`] on small
//! networks.

pub mod aig;
pub mod depth;
pub mod rewrite;
pub mod sim;

pub use aig::{Aig, AigEdge, AigError, AigNode, AigNodeRef, FaninId, NodeId, Result};
pub use depth::DepthView;
pub use rewrite::{
    CostModel, RewriteStats, algebraic_depth_rewriting, algebraic_depth_rewriting_with,
};
