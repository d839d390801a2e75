//! Graph sink interface
//!
//!     The walker never builds the corpus itself. It drives a [`GraphSink`]
//!     through a small set of calls: nodes are created at a level and stay
//!     active until terminated; every slot created links to all active nodes.
//!     Features may be set on any node the sink knows, terminated or not.
//!
//!     Every call can fail on an invalid sequence (terminating a node twice,
//!     resuming an active node, using the sink after it finished).

pub mod corpus;
pub mod memory;

pub use corpus::{Corpus, CorpusNode, FeatureType};
pub use memory::{GraphOp, MemoryGraph};

use std::collections::BTreeSet;
use std::fmt;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    UnknownNode(NodeId),
    /// The node is not active (terminate of a terminated node, slot owner gone).
    Terminated(NodeId),
    /// The node is active and cannot be resumed.
    NotTerminated(NodeId),
    /// The node was still active when the sink finished.
    StillActive(NodeId),
    Finished,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::UnknownNode(id) => write!(f, "unknown node {}", id),
            GraphError::Terminated(id) => write!(f, "node {} is already terminated", id),
            GraphError::NotTerminated(id) => write!(f, "node {} is active and cannot be resumed", id),
            GraphError::StillActive(id) => write!(f, "node {} was never terminated", id),
            GraphError::Finished => write!(f, "graph is already finished"),
        }
    }
}

impl std::error::Error for GraphError {}

pub trait GraphSink {
    /// Creates an active node at `level`.
    fn create_node(&mut self, level: &str) -> Result<NodeId, GraphError>;

    /// Creates the next slot and links it to every active node.
    fn create_slot(&mut self) -> Result<NodeId, GraphError>;

    fn set_feature(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), GraphError>;

    fn get_feature(&self, node: NodeId, name: &str) -> Result<Option<String>, GraphError>;

    fn terminate(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Makes a terminated node active again.
    fn resume(&mut self, node: NodeId) -> Result<(), GraphError>;

    /// Whether at least one slot is linked to `node`.
    fn is_linked(&self, node: NodeId) -> Result<bool, GraphError>;

    fn is_active(&self, node: NodeId) -> Result<bool, GraphError>;

    /// Levels with at least one active node.
    fn active_levels(&self) -> BTreeSet<String>;
}
