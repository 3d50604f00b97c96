use std::collections::HashSet;

use crate::editing::block::normalize_payload;
use crate::editing::{Block, BlockId, BlockKind, EditError};

/// Ordered block sequence making up one post body
///
/// Documents are values: every edit borrows the current document and returns
/// a new one, leaving the original untouched.
///
/// ## Invariants
///
/// - Every block id is unique within the document
/// - Divider payloads are always empty
/// - Block order is rendering order
///
/// ## Usage Pattern
///
/// ```rust
/// # use folio_engine::editing::{Document, BlockKind};
/// let doc = Document::new();
/// let (doc, heading) = doc.insert(BlockKind::Heading);
/// let doc = doc.update(heading, "My Title").unwrap();
///
/// assert_eq!(doc.len(), 2);
/// assert_eq!(doc.blocks()[1].payload, "My Title");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Document for a brand new post: a single empty paragraph
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::new(BlockKind::Paragraph, "")],
        }
    }

    /// Document with no blocks at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a document from existing blocks
    ///
    /// Blocks repeating an id already seen are dropped (first occurrence wins)
    /// so the unique-id invariant holds for any input.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut seen = HashSet::new();
        let blocks = blocks
            .into_iter()
            .filter(|block| seen.insert(block.id))
            .map(|block| Block::with_id(block.id, block.kind, block.payload))
            .collect();
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block ids in document order
    pub fn ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().map(|b| b.id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Index of the block in document order
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    fn require(&self, id: BlockId) -> Result<usize, EditError> {
        self.position(id).ok_or(EditError::NotFound(id))
    }

    /// Append an empty block of `kind`, returning the new document and the minted id
    pub fn insert(&self, kind: BlockKind) -> (Self, BlockId) {
        let block = Block::new(kind, "");
        let id = block.id;
        let mut blocks = self.blocks.clone();
        blocks.push(block);
        (Self { blocks }, id)
    }

    /// Replace the payload of block `id`
    pub fn update(&self, id: BlockId, payload: impl Into<String>) -> Result<Self, EditError> {
        let index = self.require(id)?;
        let mut blocks = self.blocks.clone();
        let block = &mut blocks[index];
        block.payload = normalize_payload(block.kind, payload.into());
        Ok(Self { blocks })
    }

    /// Drop block `id`; survivors keep their order and ids
    pub fn remove(&self, id: BlockId) -> Result<Self, EditError> {
        let index = self.require(id)?;
        let mut blocks = self.blocks.clone();
        blocks.remove(index);
        Ok(Self { blocks })
    }

    /// Move block `source` into the slot currently held by `target`
    ///
    /// List-splice semantics: the source is taken out, then reinserted at the
    /// target's index. Moving down therefore lands the source *after* the
    /// target, moving up lands it *before*. All other blocks keep their
    /// relative order and every id is preserved.
    pub fn reorder(&self, source: BlockId, target: BlockId) -> Result<Self, EditError> {
        let from = self.require(source)?;
        let to = self.require(target)?;
        if from == to {
            return Ok(self.clone());
        }

        let mut blocks = self.blocks.clone();
        let block = blocks.remove(from);
        blocks.insert(to, block);
        Ok(Self { blocks })
    }

    /// Swap block `id` with its predecessor; no-op for the first block
    pub fn move_up(&self, id: BlockId) -> Result<Self, EditError> {
        let index = self.require(id)?;
        match index.checked_sub(1) {
            Some(prev) => self.reorder(id, self.blocks[prev].id),
            None => Ok(self.clone()),
        }
    }

    /// Swap block `id` with its successor; no-op for the last block
    pub fn move_down(&self, id: BlockId) -> Result<Self, EditError> {
        let index = self.require(id)?;
        match self.blocks.get(index + 1) {
            Some(next) => self.reorder(id, next.id),
            None => Ok(self.clone()),
        }
    }

    /// Image blocks still waiting for an upload
    pub fn pending_images(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.is_pending())
    }

    /// Copy of this document without pending image blocks, for saving
    pub fn without_pending_images(&self) -> Self {
        Self {
            blocks: self
                .blocks
                .iter()
                .filter(|b| !b.is_pending())
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{paragraphs, payloads};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ids(doc: &Document) -> Vec<BlockId> {
        doc.ids().collect()
    }

    // ============ Construction ============

    #[test]
    fn test_new_document_has_one_empty_paragraph() {
        let doc = Document::new();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.blocks()[0].kind, BlockKind::Paragraph);
        assert_eq!(doc.blocks()[0].payload, "");
    }

    #[test]
    fn test_from_blocks_drops_duplicate_ids() {
        let a = Block::new(BlockKind::Paragraph, "first");
        let mut dup = Block::new(BlockKind::Quote, "second");
        dup.id = a.id;
        let c = Block::new(BlockKind::Heading, "third");

        let doc = Document::from_blocks([a.clone(), dup, c.clone()]);

        assert_eq!(ids(&doc), vec![a.id, c.id]);
        assert_eq!(payloads(&doc), vec!["first", "third"]);
    }

    #[test]
    fn test_from_blocks_normalizes_divider_payload() {
        let mut divider = Block::new(BlockKind::Divider, "");
        divider.payload = "junk".to_string();

        let doc = Document::from_blocks([divider]);
        assert_eq!(doc.blocks()[0].payload, "");
    }

    // ============ Insert / update ============

    #[test]
    fn test_insert_appends_empty_block_and_leaves_original_untouched() {
        let doc = Document::new();
        let (next, id) = doc.insert(BlockKind::Image);

        assert_eq!(doc.len(), 1);
        assert_eq!(next.len(), 2);
        let block = next.get(id).unwrap();
        assert_eq!(block.kind, BlockKind::Image);
        assert_eq!(block.payload, "");
        assert_eq!(next.position(id), Some(1));
    }

    #[test]
    fn test_update_replaces_only_target_payload() {
        let doc = paragraphs(&["a", "b", "c"]);
        let target = doc.blocks()[1].id;

        let next = doc.update(target, "<em>B</em>").unwrap();

        assert_eq!(payloads(&next), vec!["a", "<em>B</em>", "c"]);
        assert_eq!(ids(&next), ids(&doc));
    }

    #[test]
    fn test_update_divider_keeps_payload_empty() {
        let (doc, id) = Document::new().insert(BlockKind::Divider);
        let next = doc.update(id, "not allowed").unwrap();
        assert_eq!(next.get(id).unwrap().payload, "");
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let doc = Document::new();
        let missing = BlockId::new();
        assert_eq!(
            doc.update(missing, "x"),
            Err(EditError::NotFound(missing))
        );
    }

    // ============ Remove ============

    #[test]
    fn test_remove_preserves_order_of_survivors() {
        let doc = paragraphs(&["A", "B", "C"]);
        let [a, b, c]: [BlockId; 3] = ids(&doc).try_into().unwrap();

        let next = doc.remove(b).unwrap();

        assert_eq!(ids(&next), vec![a, c]);
        assert_eq!(payloads(&next), vec!["A", "C"]);
    }

    #[test]
    fn test_remove_missing_id_leaves_document_unchanged() {
        let doc = paragraphs(&["A"]);
        let missing = BlockId::new();
        assert_eq!(doc.remove(missing), Err(EditError::NotFound(missing)));
        assert_eq!(payloads(&doc), vec!["A"]);
    }

    #[test]
    fn test_removed_id_is_not_reused_by_later_inserts() {
        let doc = paragraphs(&["A", "B"]);
        let removed = doc.blocks()[1].id;
        let mut doc = doc.remove(removed).unwrap();

        for kind in BlockKind::ALL {
            let (next, id) = doc.insert(kind);
            assert_ne!(id, removed);
            doc = next;
        }
    }

    // ============ Reorder ============

    #[rstest]
    #[case::last_to_second(3, 1, &["A", "D", "B", "C"])]
    #[case::first_to_third(0, 2, &["B", "C", "A", "D"])]
    #[case::adjacent_down(1, 2, &["A", "C", "B", "D"])]
    #[case::adjacent_up(2, 1, &["A", "C", "B", "D"])]
    #[case::first_to_last(0, 3, &["B", "C", "D", "A"])]
    fn test_reorder_splice_semantics(
        #[case] source: usize,
        #[case] target: usize,
        #[case] expected: &[&str],
    ) {
        let doc = paragraphs(&["A", "B", "C", "D"]);
        let all = ids(&doc);

        let next = doc.reorder(all[source], all[target]).unwrap();

        assert_eq!(payloads(&next), expected.to_vec());
    }

    #[test]
    fn test_reorder_is_a_permutation() {
        let doc = paragraphs(&["A", "B", "C", "D"]);
        let all = ids(&doc);

        let next = doc.reorder(all[3], all[1]).unwrap();

        let mut before = all.clone();
        let mut after = ids(&next);
        before.sort();
        after.sort();
        assert_eq!(before, after);
        for block in next.blocks() {
            assert_eq!(doc.get(block.id), Some(block));
        }
    }

    #[test]
    fn test_reorder_same_id_is_noop() {
        let doc = paragraphs(&["A", "B"]);
        let a = doc.blocks()[0].id;
        assert_eq!(doc.reorder(a, a), Ok(doc.clone()));
    }

    #[test]
    fn test_reorder_missing_id_is_not_found() {
        let doc = paragraphs(&["A", "B"]);
        let a = doc.blocks()[0].id;
        let missing = BlockId::new();
        assert_eq!(doc.reorder(a, missing), Err(EditError::NotFound(missing)));
        assert_eq!(doc.reorder(missing, a), Err(EditError::NotFound(missing)));
    }

    #[test]
    fn test_move_up_and_down_swap_neighbours() {
        let doc = paragraphs(&["A", "B", "C"]);
        let b = doc.blocks()[1].id;

        assert_eq!(payloads(&doc.move_up(b).unwrap()), vec!["B", "A", "C"]);
        assert_eq!(payloads(&doc.move_down(b).unwrap()), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_move_at_edges_is_noop() {
        let doc = paragraphs(&["A", "B"]);
        let [a, b]: [BlockId; 2] = ids(&doc).try_into().unwrap();

        assert_eq!(doc.move_up(a), Ok(doc.clone()));
        assert_eq!(doc.move_down(b), Ok(doc.clone()));
    }

    // ============ Pending images ============

    #[test]
    fn test_without_pending_images_filters_only_empty_images() {
        let doc = Document::new();
        let (doc, pending) = doc.insert(BlockKind::Image);
        let (doc, done) = doc.insert(BlockKind::Image);
        let doc = doc.update(done, "/uploads/a.webp").unwrap();

        let pending_ids: Vec<_> = doc.pending_images().map(|b| b.id).collect();
        assert_eq!(pending_ids, vec![pending]);

        let saved = doc.without_pending_images();
        assert_eq!(saved.len(), 2);
        assert!(saved.get(pending).is_none());
        assert!(saved.get(done).is_some());
    }
}
