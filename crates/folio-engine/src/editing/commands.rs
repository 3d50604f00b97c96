use crate::editing::{BlockId, BlockKind, Document, EditError};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    Insert { kind: BlockKind },
    Update { id: BlockId, payload: String },
    Remove { id: BlockId },
    Reorder { source: BlockId, target: BlockId },
    MoveUp { id: BlockId },
    MoveDown { id: BlockId },
}

/// Apply a command, returning the new document and the ids it touched
pub(crate) fn apply_command(
    doc: &Document,
    cmd: &Cmd,
) -> Result<(Document, Vec<BlockId>), EditError> {
    match cmd {
        Cmd::Insert { kind } => {
            let (next, id) = doc.insert(*kind);
            Ok((next, vec![id]))
        }
        Cmd::Update { id, payload } => {
            let next = doc.update(*id, payload.as_str())?;
            Ok((next, vec![*id]))
        }
        Cmd::Remove { id } => Ok((doc.remove(*id)?, vec![*id])),
        Cmd::Reorder { source, target } => {
            let next = doc.reorder(*source, *target)?;
            Ok(moved(doc, next, *source))
        }
        Cmd::MoveUp { id } => {
            let next = doc.move_up(*id)?;
            Ok(moved(doc, next, *id))
        }
        Cmd::MoveDown { id } => {
            let next = doc.move_down(*id)?;
            Ok(moved(doc, next, *id))
        }
    }
}

/// Reorders report the moved block unless the order did not change
fn moved(before: &Document, after: Document, id: BlockId) -> (Document, Vec<BlockId>) {
    let changed = if after == *before { Vec::new() } else { vec![id] };
    (after, changed)
}

impl Document {
    /// Apply a command to this document
    pub fn apply(&self, cmd: &Cmd) -> Result<Document, EditError> {
        apply_command(self, cmd).map(|(next, _)| next)
    }
}
