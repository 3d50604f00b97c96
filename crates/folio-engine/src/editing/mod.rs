/*!
 * # Block Editing Core
 *
 * A post body is edited as an ordered list of typed **blocks** rather than as
 * one HTML string. This module owns that structured model and the session that
 * drives it.
 *
 * ## Architecture Overview
 *
 * ### 1. Immutable Documents
 * - A `Document` is a plain value: an ordered `Vec<Block>`
 * - Every edit (`insert`, `update`, `remove`, `reorder`) returns a **new** `Document`
 * - An edit either fully applies or returns an `EditError`; a half-applied edit is impossible
 *
 * ### 2. Stable Block Identity
 * - Each block carries a `BlockId` (v4 UUID) minted when the block is created
 * - Ids survive payload edits and reorders, so UI state keyed by id (focus,
 *   upload progress) follows the block when it moves
 * - Ids are never derived from content and never reused
 *
 * ### 3. Command-Based Editing
 * - Hosts describe edits as `Cmd` values and hand them to an `EditingSession`
 * - The session commits the new document, bumps its version and re-serializes
 *   before returning a `Patch`
 *
 * ### 4. HTML Boundary
 * - `crate::html::parse` hydrates a document from stored post content
 * - `crate::html::serialize` renders it back; see that module for the exact fragments
 *
 * ## Module Structure
 *
 * - **`block`**: `Block`, `BlockId`, `BlockKind`
 * - **`document`**: the immutable `Document` and its edit operations
 * - **`commands`**: the `Cmd` enum and its application to a document
 * - **`patch`**: edit result metadata
 * - **`session`**: `EditingSession`, cached serialization and upload bookkeeping
 *
 * ## Usage Pattern
 *
 * ```rust
 * use folio_engine::editing::*;
 *
 * let mut session = EditingSession::from_html("<p>Hello</p>");
 * let id = session.document().blocks()[0].id;
 *
 * let patch = session.apply(Cmd::Update { id, payload: "Hello world".to_string() });
 * assert_eq!(patch.changed, vec![id]);
 * assert_eq!(session.html(), "<p>Hello world</p>");
 * ```
 */

pub mod block;
pub mod commands;
pub mod document;
pub mod patch;
pub mod session;

// Public API re-exports
pub use block::{Block, BlockId, BlockKind};
pub use commands::Cmd;
pub use document::Document;
pub use patch::Patch;
pub use session::{EditingSession, UploadOutcome, UploadStatus, UploadTicket};

/// Structural edit failures. Hosts usually treat these as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Block not found: {0}")]
    NotFound(BlockId),
    #[error("Block {id} is a {kind}, not an image")]
    NotAnImage { id: BlockId, kind: BlockKind },
}
