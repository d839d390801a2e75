//! In-memory reference sink with an operation log

use super::corpus::{Corpus, CorpusNode};
use super::{GraphError, GraphSink, NodeId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One call made against the sink, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GraphOp {
    Node { id: NodeId, level: String },
    Slot { id: NodeId },
    Feature { id: NodeId, name: String, value: String },
    Terminate { id: NodeId },
    Resume { id: NodeId },
}

impl fmt::Display for GraphOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphOp::Node { id, level } => write!(f, "node {} {}", id, level),
            GraphOp::Slot { id } => write!(f, "slot {}", id),
            GraphOp::Feature { id, name, value } => write!(f, "feature {} {}={}", id, name, value),
            GraphOp::Terminate { id } => write!(f, "terminate {}", id),
            GraphOp::Resume { id } => write!(f, "resume {}", id),
        }
    }
}

#[derive(Debug, Clone)]
struct Record {
    level: String,
    is_slot: bool,
    active: bool,
    /// Slot numbers, 1-based.
    slots: Vec<usize>,
    features: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct MemoryGraph {
    slot_type: String,
    records: Vec<Record>,
    slot_ids: Vec<NodeId>,
    ops: Vec<GraphOp>,
    finished: bool,
}

impl MemoryGraph {
    pub fn new(slot_type: impl Into<String>) -> Self {
        Self {
            slot_type: slot_type.into(),
            records: Vec::new(),
            slot_ids: Vec::new(),
            ops: Vec::new(),
            finished: false,
        }
    }

    pub fn ops(&self) -> &[GraphOp] {
        &self.ops
    }

    pub fn slot_count(&self) -> usize {
        self.slot_ids.len()
    }

    pub fn last_slot(&self) -> Option<NodeId> {
        self.slot_ids.last().copied()
    }

    pub fn level_of(&self, node: NodeId) -> Result<&str, GraphError> {
        Ok(&self.record(node)?.level)
    }

    fn record(&self, node: NodeId) -> Result<&Record, GraphError> {
        self.records.get(node).ok_or(GraphError::UnknownNode(node))
    }

    fn record_mut(&mut self, node: NodeId) -> Result<&mut Record, GraphError> {
        if self.finished {
            return Err(GraphError::Finished);
        }
        self.records.get_mut(node).ok_or(GraphError::UnknownNode(node))
    }

    fn live(&self) -> Result<(), GraphError> {
        if self.finished {
            Err(GraphError::Finished)
        } else {
            Ok(())
        }
    }

    /// Nodes that ended up without any slot.
    pub fn empty_nodes(&self) -> Vec<NodeId> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_slot && r.slots.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Every node is terminated and linked, and every node's slots are
    /// strictly increasing.
    pub fn check_invariants(&self) -> Result<(), String> {
        for (id, record) in self.records.iter().enumerate().filter(|(_, r)| !r.is_slot) {
            if record.active {
                return Err(format!("node {} ({}) is still active", id, record.level));
            }
            if record.slots.is_empty() {
                return Err(format!("node {} ({}) has no slots", id, record.level));
            }
            if record.slots.windows(2).any(|w| w[0] >= w[1]) {
                return Err(format!("node {} ({}) has unordered slots", id, record.level));
            }
        }
        Ok(())
    }

    /// Closes the sink and hands out the corpus.
    pub fn finish(&mut self, meta: BTreeMap<String, String>) -> Result<Corpus, GraphError> {
        self.live()?;
        if let Some(id) = self.records.iter().position(|r| !r.is_slot && r.active) {
            return Err(GraphError::StillActive(id));
        }
        self.finished = true;
        let slots = self
            .slot_ids
            .iter()
            .map(|id| self.records[*id].features.clone())
            .collect();
        let nodes = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.is_slot)
            .map(|(id, r)| CorpusNode {
                id,
                level: r.level.clone(),
                slots: r.slots.clone(),
                features: r.features.clone(),
            })
            .collect();
        Ok(Corpus::new(self.slot_type.clone(), slots, nodes, meta))
    }
}

impl GraphSink for MemoryGraph {
    fn create_node(&mut self, level: &str) -> Result<NodeId, GraphError> {
        self.live()?;
        let id = self.records.len();
        self.records.push(Record {
            level: level.to_string(),
            is_slot: false,
            active: true,
            slots: Vec::new(),
            features: BTreeMap::new(),
        });
        self.ops.push(GraphOp::Node {
            id,
            level: level.to_string(),
        });
        Ok(id)
    }

    fn create_slot(&mut self) -> Result<NodeId, GraphError> {
        self.live()?;
        let id = self.records.len();
        let number = self.slot_ids.len() + 1;
        for record in self.records.iter_mut().filter(|r| r.active && !r.is_slot) {
            record.slots.push(number);
        }
        self.records.push(Record {
            level: self.slot_type.clone(),
            is_slot: true,
            active: false,
            slots: vec![number],
            features: BTreeMap::new(),
        });
        self.slot_ids.push(id);
        self.ops.push(GraphOp::Slot { id });
        Ok(id)
    }

    fn set_feature(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), GraphError> {
        self.record_mut(node)?
            .features
            .insert(name.to_string(), value.to_string());
        self.ops.push(GraphOp::Feature {
            id: node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn get_feature(&self, node: NodeId, name: &str) -> Result<Option<String>, GraphError> {
        Ok(self.record(node)?.features.get(name).cloned())
    }

    fn terminate(&mut self, node: NodeId) -> Result<(), GraphError> {
        let record = self.record_mut(node)?;
        if !record.active {
            return Err(GraphError::Terminated(node));
        }
        record.active = false;
        self.ops.push(GraphOp::Terminate { id: node });
        Ok(())
    }

    fn resume(&mut self, node: NodeId) -> Result<(), GraphError> {
        let record = self.record_mut(node)?;
        if record.active {
            return Err(GraphError::NotTerminated(node));
        }
        if record.is_slot {
            return Err(GraphError::Terminated(node));
        }
        record.active = true;
        self.ops.push(GraphOp::Resume { id: node });
        Ok(())
    }

    fn is_linked(&self, node: NodeId) -> Result<bool, GraphError> {
        Ok(!self.record(node)?.slots.is_empty())
    }

    fn is_active(&self, node: NodeId) -> Result<bool, GraphError> {
        Ok(self.record(node)?.active)
    }

    fn active_levels(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter(|r| r.active && !r.is_slot)
            .map(|r| r.level.clone())
            .collect()
    }
}
