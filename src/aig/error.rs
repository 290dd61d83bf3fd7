use thiserror::Error;

use crate::depth::DepthError;
use crate::sim::SimError;

use super::NodeId;

/// The result of an AIG operation.
pub type Result<T> = std::result::Result<T, AigError>;

/// Error returned when an AIG operation failed.
#[derive(Debug, Error)]
pub enum AigError {
    /// A different node with the given id already exists.
    #[error("a different node with id={0} already exists")]
    DuplicateId(NodeId),

    /// The id 0 is reserved for the `False` constant node only.
    #[error("id=0 is for node False only")]
    IdZeroButNotFalse,

    /// The node with given id does not exist.
    #[error("node with id={0} does not exist")]
    NodeDoesNotExist(NodeId),

    /// Invalid operation on a node which does not have such specified fanin.
    /// Latches only have [`FaninId::Fanin0`].
    ///
    /// [`FaninId::Fanin0`]: super::FaninId::Fanin0
    #[error("the node has no such fanin")]
    NoFanin,

    /// The AIG has reached an invalid state. This should never happen.
    /// For example, when tracking the nodes internally with the hashmap nodes,
    /// node `nodes[id]` should have id `id`. If this error is raised, my code is garbage.
    #[error("the AIG has reached an invalid state - this should not happen - error: {0}")]
    InvalidState(String),

    /// Just forwarding a [`DepthError`].
    ///
    /// [`DepthError`]: crate::depth::DepthError
    #[error("{0}")]
    DepthError(#[from] DepthError),

    /// Just forwarding a [`SimError`].
    ///
    /// [`SimError`]: crate::sim::SimError
    #[error("{0}")]
    SimError(#[from] SimError),
}
