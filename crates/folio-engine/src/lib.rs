pub mod editing;
pub mod html;
pub mod io;
pub mod models;
pub mod upload;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{
    Block, BlockId, BlockKind, Cmd, Document, EditError, EditingSession, Patch, UploadOutcome,
    UploadStatus, UploadTicket,
};
pub use io::{FsPostStore, IoError, PostStore};
pub use models::{Post, slugify};
pub use upload::{ImageUploader, LocalUploader, UploadError};
