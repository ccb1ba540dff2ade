//! Z-ordered list of the nodes composing the stage.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DisplayListError {
    #[error("Node {0:?} is already in the display list")]
    AlreadyInserted(NodeId),
    #[error("Sibling {0:?} is not in the display list")]
    SiblingNotFound(NodeId),
    #[error("Node {0:?} is not in the display list")]
    NotFound(NodeId),
}

/// Children are kept bottom to top; a node's z-index is its position.
#[derive(Debug, Default)]
pub struct DisplayList {
    order: Vec<NodeId>,
    next_id: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a fresh id. The node is not part of the list until inserted.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserts `node` on top of every other node.
    pub fn push(&mut self, node: NodeId) -> Result<(), DisplayListError> {
        if self.contains(node) {
            return Err(DisplayListError::AlreadyInserted(node));
        }
        self.order.push(node);
        Ok(())
    }

    pub fn insert_below(&mut self, node: NodeId, sibling: NodeId) -> Result<(), DisplayListError> {
        let index = self.sibling_index(node, sibling)?;
        self.order.insert(index, node);
        Ok(())
    }

    pub fn insert_above(&mut self, node: NodeId, sibling: NodeId) -> Result<(), DisplayListError> {
        let index = self.sibling_index(node, sibling)?;
        self.order.insert(index + 1, node);
        Ok(())
    }

    fn sibling_index(&self, node: NodeId, sibling: NodeId) -> Result<usize, DisplayListError> {
        if self.contains(node) {
            return Err(DisplayListError::AlreadyInserted(node));
        }
        self.z_index(sibling)
            .ok_or(DisplayListError::SiblingNotFound(sibling))
    }

    pub fn remove(&mut self, node: NodeId) -> Result<(), DisplayListError> {
        let index = self.z_index(node).ok_or(DisplayListError::NotFound(node))?;
        self.order.remove(index);
        Ok(())
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.order.contains(&node)
    }

    pub fn z_index(&self, node: NodeId) -> Option<usize> {
        self.order.iter().position(|n| *n == node)
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
