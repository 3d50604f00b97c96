use crate::editing::BlockId;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Blocks created, edited, moved or removed by the command; empty for a no-op
    pub changed: Vec<BlockId>,
    /// Session version after the command
    pub version: u64,
}

impl Patch {
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}
