use std::collections::HashMap;

use crate::editing::commands::apply_command;
use crate::editing::{BlockId, BlockKind, Cmd, Document, EditError, Patch};
use crate::html;
use crate::upload::UploadError;

/// Handle for one upload into one image block
///
/// Issued by [`EditingSession::begin_upload`]; the host passes it back with
/// the upload result. A ticket goes stale when the block is removed, when a
/// newer upload is started for the same block, or when it is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket {
    pub block: BlockId,
    serial: u64,
}

/// Upload state of an image block, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    /// The last attempt failed; the block stays pending
    Failed(String),
}

/// What happened to an upload result handed back to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The URL was written into the block
    Applied(Patch),
    /// The ticket was stale; the result was dropped without touching the document
    Discarded,
    /// The upload failed; the message should be surfaced to the user
    Failed(String),
}

#[derive(Debug, Clone)]
struct UploadState {
    serial: u64,
    status: UploadStatus,
}

/// One editing session over one post body
///
/// The session is the single writer of its [`Document`]. Each command is
/// applied synchronously; before [`apply`](Self::apply) returns, the new
/// document is committed, the version is bumped and the serialized HTML is
/// recomputed. Observers reading [`html`](Self::html) therefore never see a
/// serialization older than the last committed edit.
///
/// Structural misses (unknown block ids) are recovered here: the command is
/// dropped, the document and version stay as they were, and the returned
/// patch is empty.
///
/// ```rust
/// # use folio_engine::editing::{EditingSession, Cmd, BlockKind};
/// let mut session = EditingSession::new();
/// let patch = session.apply(Cmd::Insert { kind: BlockKind::Divider });
/// assert_eq!(patch.version, 1);
/// assert_eq!(session.html(), r#"<p></p><hr class="my-12 border-gray-200" />"#);
/// ```
#[derive(Debug, Clone)]
pub struct EditingSession {
    document: Document,
    html: String,
    version: u64,
    uploads: HashMap<BlockId, UploadState>,
    next_serial: u64,
}

impl EditingSession {
    /// Session for a new post
    pub fn new() -> Self {
        Self::from_document(Document::new())
    }

    /// Session hydrated from stored post content
    pub fn from_html(input: &str) -> Self {
        Self::from_document(html::parse(input))
    }

    pub fn from_document(document: Document) -> Self {
        let html = html::serialize(&document);
        Self {
            document,
            html,
            version: 0,
            uploads: HashMap::new(),
            next_serial: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Serialized HTML of the current document
    pub fn html(&self) -> &str {
        &self.html
    }

    /// HTML to hand to the post store: pending image blocks are left out
    pub fn html_for_save(&self) -> String {
        html::serialize(&self.document.without_pending_images())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a command; unknown block ids make it a no-op
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        match apply_command(&self.document, &cmd) {
            Ok((_, changed)) if changed.is_empty() => Patch {
                changed,
                version: self.version,
            },
            Ok((next, changed)) => {
                match &cmd {
                    Cmd::Remove { id } => {
                        self.uploads.remove(id);
                    }
                    // A URL set by hand supersedes any upload still in flight
                    Cmd::Update { id, payload } if !payload.is_empty() => {
                        self.uploads.remove(id);
                    }
                    _ => {}
                }
                self.commit(next, changed)
            }
            Err(e) => {
                log::debug!("Ignoring {cmd:?}: {e}");
                Patch {
                    changed: Vec::new(),
                    version: self.version,
                }
            }
        }
    }

    fn commit(&mut self, next: Document, changed: Vec<BlockId>) -> Patch {
        self.document = next;
        self.version += 1;
        self.html = html::serialize(&self.document);
        Patch {
            changed,
            version: self.version,
        }
    }

    /// Start an upload into image block `id`
    ///
    /// The block is put back into pending state (empty payload) until the
    /// matching [`finish_upload`](Self::finish_upload) call. Other commands
    /// can be applied freely in the meantime.
    pub fn begin_upload(&mut self, id: BlockId) -> Result<UploadTicket, EditError> {
        let block = self.document.get(id).ok_or(EditError::NotFound(id))?;
        if block.kind != BlockKind::Image {
            return Err(EditError::NotAnImage {
                id,
                kind: block.kind,
            });
        }

        if !block.payload.is_empty() {
            let next = self.document.update(id, "")?;
            self.commit(next, vec![id]);
        }

        self.next_serial += 1;
        let serial = self.next_serial;
        self.uploads.insert(
            id,
            UploadState {
                serial,
                status: UploadStatus::Uploading,
            },
        );
        log::debug!("Upload {serial} started for block {id}");
        Ok(UploadTicket { block: id, serial })
    }

    /// Hand back the result of an upload started with `begin_upload`
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, UploadError>,
    ) -> UploadOutcome {
        let id = ticket.block;
        let current = matches!(
            self.uploads.get(&id),
            Some(state) if state.serial == ticket.serial && state.status == UploadStatus::Uploading
        );
        if !current {
            log::debug!("Discarding stale upload {} for block {id}", ticket.serial);
            return UploadOutcome::Discarded;
        }

        match result {
            Ok(url) => {
                self.uploads.remove(&id);
                match self.document.update(id, url) {
                    Ok(next) => UploadOutcome::Applied(self.commit(next, vec![id])),
                    Err(e) => {
                        log::debug!("Discarding upload for vanished block: {e}");
                        UploadOutcome::Discarded
                    }
                }
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Upload into block {id} failed: {message}");
                self.uploads.insert(
                    id,
                    UploadState {
                        serial: ticket.serial,
                        status: UploadStatus::Failed(message.clone()),
                    },
                );
                UploadOutcome::Failed(message)
            }
        }
    }

    /// Forget an in-flight upload; its result will be discarded.
    /// Returns whether an upload was in flight.
    pub fn cancel_upload(&mut self, id: BlockId) -> bool {
        match self.uploads.get(&id) {
            Some(state) if state.status == UploadStatus::Uploading => {
                self.uploads.remove(&id);
                true
            }
            _ => false,
        }
    }

    pub fn upload_status(&self, id: BlockId) -> Option<&UploadStatus> {
        self.uploads.get(&id).map(|state| &state.status)
    }

    pub fn has_uploads_in_flight(&self) -> bool {
        self.uploads
            .values()
            .any(|state| state.status == UploadStatus::Uploading)
    }
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new()
    }
}
