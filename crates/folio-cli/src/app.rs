use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Result;
use chrono::NaiveDate;
use crossterm::event::KeyCode;
use folio_engine::editing::{BlockId, BlockKind, Cmd, EditingSession, UploadOutcome, UploadTicket};
use folio_engine::upload::spawn_upload;
use folio_engine::{FsPostStore, ImageUploader, Post, PostStore, UploadError, slugify};
use ratatui::widgets::ListState;

type UploadResult = (UploadTicket, Result<String, UploadError>);

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What the keyboard is currently driving
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    EditPayload { id: BlockId, buffer: String },
    EditTitle { buffer: String },
    EditSlug { buffer: String },
    EditDate { buffer: String },
    EditExcerpt { buffer: String },
    UploadPath { id: BlockId, buffer: String },
    CoverPath { buffer: String },
    ConfirmDelete,
}

impl Mode {
    pub fn prompt(&self) -> Option<(&'static str, &str)> {
        match self {
            Mode::Normal => None,
            Mode::EditPayload { buffer, .. } => Some(("Content", buffer.as_str())),
            Mode::EditTitle { buffer } => Some(("Title", buffer.as_str())),
            Mode::EditSlug { buffer } => Some(("Slug", buffer.as_str())),
            Mode::EditDate { buffer } => Some(("Date (YYYY-MM-DD)", buffer.as_str())),
            Mode::EditExcerpt { buffer } => Some(("Excerpt", buffer.as_str())),
            Mode::UploadPath { buffer, .. } => Some(("Image file", buffer.as_str())),
            Mode::CoverPath { buffer } => Some(("Cover image file", buffer.as_str())),
            Mode::ConfirmDelete => Some(("Delete this post and its cover image? [y/N]", "")),
        }
    }

    fn buffer_mut(&mut self) -> Option<&mut String> {
        match self {
            Mode::Normal | Mode::ConfirmDelete => None,
            Mode::EditPayload { buffer, .. }
            | Mode::EditTitle { buffer }
            | Mode::EditSlug { buffer }
            | Mode::EditDate { buffer }
            | Mode::EditExcerpt { buffer }
            | Mode::UploadPath { buffer, .. }
            | Mode::CoverPath { buffer } => Some(buffer),
        }
    }
}

pub struct App {
    store: FsPostStore,
    uploader: Arc<dyn ImageUploader>,
    /// The post as last saved; `None` until a new post is first saved
    saved: Option<Post>,
    /// Metadata as opened or last saved, for change tracking
    baseline: Post,
    saved_version: u64,
    /// Only posts started with `--new` derive their slug from the title
    slug_follows_title: bool,
    quit_armed: bool,
    pub deleted: bool,
    pub post: Post,
    pub session: EditingSession,
    pub block_list_state: ListState,
    pub mode: Mode,
    pub status: String,
    upload_tx: Sender<UploadResult>,
    upload_rx: Receiver<UploadResult>,
}

impl App {
    /// Open `slug` from the store, or start a new post under that slug
    pub fn open(store: FsPostStore, uploader: Arc<dyn ImageUploader>, slug: &str) -> Result<Self> {
        let (saved, post, status) = match store.get(slug)? {
            Some(post) => (Some(post.clone()), post, format!("Editing {slug}")),
            None => {
                let mut post = Post::new(slug);
                post.slug = slug.to_string();
                (None, post, format!("New post {slug}"))
            }
        };
        Ok(Self::with_post(store, uploader, saved, post, status))
    }

    /// Start an untitled post; its slug follows the title until first save
    pub fn new_post(store: FsPostStore, uploader: Arc<dyn ImageUploader>) -> Self {
        let post = Post::new("");
        let mut app = Self::with_post(store, uploader, None, post, "New post".to_string());
        app.slug_follows_title = true;
        app
    }

    fn with_post(
        store: FsPostStore,
        uploader: Arc<dyn ImageUploader>,
        saved: Option<Post>,
        post: Post,
        status: String,
    ) -> Self {
        let session = EditingSession::from_html(&post.content);
        let (upload_tx, upload_rx) = mpsc::channel();
        let mut block_list_state = ListState::default();
        if !session.document().is_empty() {
            block_list_state.select(Some(0));
        }

        Self {
            store,
            uploader,
            saved,
            baseline: post.clone(),
            saved_version: session.version(),
            slug_follows_title: false,
            quit_armed: false,
            deleted: false,
            post,
            session,
            block_list_state,
            mode: Mode::Normal,
            status,
            upload_tx,
            upload_rx,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.session.version() != self.saved_version || self.post != self.baseline
    }

    pub fn selected_id(&self) -> Option<BlockId> {
        let index = self.block_list_state.selected()?;
        self.session.document().blocks().get(index).map(|b| b.id)
    }

    fn select_id(&mut self, id: BlockId) {
        if let Some(index) = self.session.document().position(id) {
            self.block_list_state.select(Some(index));
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.session.document().len();
        let selected = match self.block_list_state.selected() {
            _ if len == 0 => None,
            Some(i) => Some(i.min(len - 1)),
            None => Some(0),
        };
        self.block_list_state.select(selected);
    }

    fn next_block(&mut self) {
        let len = self.session.document().len();
        if len == 0 {
            return;
        }
        let i = match self.block_list_state.selected() {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.block_list_state.select(Some(i));
    }

    fn previous_block(&mut self) {
        let len = self.session.document().len();
        if len == 0 {
            return;
        }
        let i = match self.block_list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.block_list_state.select(Some(i));
    }

    /// Handle one key press. Returns `false` when the app should quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match self.mode {
            Mode::Normal => return self.handle_normal_key(code),
            Mode::ConfirmDelete => return self.handle_delete_confirmation(code),
            _ => {}
        }

        match code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Cancelled".to_string();
            }
            KeyCode::Enter => {
                let mode = std::mem::replace(&mut self.mode, Mode::Normal);
                self.commit_input(mode);
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.mode.buffer_mut() {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.mode.buffer_mut() {
                    buffer.push(c);
                }
            }
            _ => {}
        }
        true
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> bool {
        let quit_armed = std::mem::take(&mut self.quit_armed);

        match code {
            KeyCode::Char('q') => {
                if quit_armed || !self.session.has_uploads_in_flight() {
                    return false;
                }
                self.quit_armed = true;
                self.status = "An upload is still running, press q again to quit".to_string();
            }
            KeyCode::Down | KeyCode::Char('j') => self.next_block(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_block(),
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.insert_block(BlockKind::ALL[index]);
            }
            KeyCode::Enter | KeyCode::Char('e') => self.edit_selected(),
            KeyCode::Char('u') => {
                if let Some(id) = self.selected_id() {
                    self.mode = Mode::UploadPath {
                        id,
                        buffer: String::new(),
                    };
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id()
                    && !self.session.apply(Cmd::Remove { id }).is_noop()
                {
                    self.clamp_selection();
                    self.status = "Block removed".to_string();
                }
            }
            KeyCode::Char('J') => self.move_selected(|id| Cmd::MoveDown { id }),
            KeyCode::Char('K') => self.move_selected(|id| Cmd::MoveUp { id }),
            KeyCode::Char('t') => {
                self.mode = Mode::EditTitle {
                    buffer: self.post.title.clone(),
                }
            }
            KeyCode::Char('n') => {
                if self.saved.is_some() {
                    self.status = "A saved post keeps its slug".to_string();
                } else {
                    self.mode = Mode::EditSlug {
                        buffer: self.post.slug.clone(),
                    }
                }
            }
            KeyCode::Char('d') => {
                self.mode = Mode::EditDate {
                    buffer: self.post.date.clone(),
                }
            }
            KeyCode::Char('E') => {
                self.mode = Mode::EditExcerpt {
                    buffer: self.post.excerpt.clone(),
                }
            }
            KeyCode::Char('c') => {
                self.mode = Mode::CoverPath {
                    buffer: String::new(),
                }
            }
            KeyCode::Char('D') => {
                if self.saved.is_some() {
                    self.mode = Mode::ConfirmDelete;
                } else {
                    self.status = "This post has not been saved yet".to_string();
                }
            }
            KeyCode::Char('s') => {
                if let Err(e) = self.save() {
                    log::error!("Save failed: {e:#}");
                    self.status = format!("Save failed: {e}");
                }
            }
            _ => {}
        }
        true
    }

    fn handle_delete_confirmation(&mut self, code: KeyCode) -> bool {
        self.mode = Mode::Normal;
        if code != KeyCode::Char('y') {
            self.status = "Delete cancelled".to_string();
            return true;
        }

        match self.delete_post() {
            Ok(()) => false,
            Err(e) => {
                log::error!("Delete failed: {e:#}");
                self.status = format!("Delete failed: {e}");
                true
            }
        }
    }

    fn insert_block(&mut self, kind: BlockKind) {
        let patch = self.session.apply(Cmd::Insert { kind });
        let Some(&id) = patch.changed.first() else {
            return;
        };
        self.select_id(id);
        self.mode = match kind {
            BlockKind::Image => Mode::UploadPath {
                id,
                buffer: String::new(),
            },
            kind if kind.carries_markup() => Mode::EditPayload {
                id,
                buffer: String::new(),
            },
            _ => Mode::Normal,
        };
        self.status = format!("Added {}", kind.label());
    }

    fn edit_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let Some(block) = self.session.document().get(id) else {
            return;
        };
        self.mode = match block.kind {
            BlockKind::Image => Mode::UploadPath {
                id,
                buffer: String::new(),
            },
            kind if kind.carries_markup() => Mode::EditPayload {
                id,
                buffer: block.payload.clone(),
            },
            _ => return,
        };
    }

    fn move_selected(&mut self, cmd: impl FnOnce(BlockId) -> Cmd) {
        if let Some(id) = self.selected_id() {
            if self.session.apply(cmd(id)).is_noop() {
                self.status = "Block is already at the edge".to_string();
            }
            self.select_id(id);
        }
    }

    fn commit_input(&mut self, mode: Mode) {
        match mode {
            Mode::Normal | Mode::ConfirmDelete => {}
            Mode::EditPayload { id, buffer } => {
                self.session.apply(Cmd::Update {
                    id,
                    payload: buffer,
                });
            }
            Mode::EditTitle { buffer } => {
                if self.slug_follows_title {
                    self.post.slug = slugify(&buffer);
                }
                self.post.title = buffer;
            }
            Mode::EditSlug { buffer } => {
                let slug = slugify(buffer.trim());
                if slug.is_empty() {
                    self.status = "The slug cannot be empty".to_string();
                } else {
                    self.post.slug = slug;
                    self.slug_follows_title = false;
                }
            }
            Mode::EditDate { buffer } => {
                match NaiveDate::parse_from_str(buffer.trim(), DATE_FORMAT) {
                    Ok(date) => self.post.date = date.format(DATE_FORMAT).to_string(),
                    Err(e) => self.status = format!("Invalid date {buffer:?}: {e}"),
                }
            }
            Mode::EditExcerpt { buffer } => self.post.excerpt = buffer,
            Mode::UploadPath { id, buffer } => self.start_upload(id, &buffer),
            Mode::CoverPath { buffer } => self.upload_cover(&buffer),
        }
    }

    fn start_upload(&mut self, id: BlockId, path: &str) {
        let (file_name, bytes) = match read_image(path) {
            Ok(read) => read,
            Err(e) => {
                self.status = format!("Cannot read {path}: {e}");
                return;
            }
        };

        match self.session.begin_upload(id) {
            Ok(ticket) => {
                spawn_upload(
                    Arc::clone(&self.uploader),
                    ticket,
                    file_name,
                    bytes,
                    self.upload_tx.clone(),
                );
                self.status = "Uploading...".to_string();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn upload_cover(&mut self, path: &str) {
        let result = read_image(path)
            .map_err(UploadError::Io)
            .and_then(|(name, bytes)| self.uploader.upload(&name, &bytes));
        match result {
            Ok(url) => {
                self.post.cover_image = url;
                self.status = "Cover image uploaded".to_string();
            }
            Err(e) => self.status = format!("Cover upload failed: {e}"),
        }
    }

    /// Feed finished uploads back into the session
    pub fn poll_uploads(&mut self) {
        while let Ok((ticket, result)) = self.upload_rx.try_recv() {
            match self.session.finish_upload(ticket, result) {
                UploadOutcome::Applied(_) => self.status = "Image uploaded".to_string(),
                UploadOutcome::Failed(message) => {
                    self.status = format!("Upload failed: {message}")
                }
                UploadOutcome::Discarded => {}
            }
        }
    }

    /// Write the post to the store and clean up a replaced cover image
    pub fn save(&mut self) -> Result<()> {
        if self.post.title.trim().is_empty() {
            self.status = "A title is required before saving".to_string();
            return Ok(());
        }
        if self.saved.is_none() && self.store.get(&self.post.slug)?.is_some() {
            self.status = format!(
                "A post with slug {} already exists, pick another slug",
                self.post.slug
            );
            return Ok(());
        }

        self.post.content = self.session.html_for_save();
        self.store.upsert(&self.post)?;

        if let Some(saved) = &self.saved
            && let Some(old_cover) = self.post.replaced_cover(saved)
            && let Err(e) = self.uploader.remove(old_cover)
        {
            log::warn!("Failed to remove old cover image {old_cover}: {e}");
        }

        let pending = self.session.document().pending_images().count();
        self.status = if pending > 0 {
            format!("Saved {} ({pending} empty image block(s) left out)", self.post.slug)
        } else {
            format!("Saved {}", self.post.slug)
        };
        self.saved = Some(self.post.clone());
        self.baseline = self.post.clone();
        self.saved_version = self.session.version();
        self.slug_follows_title = false;
        Ok(())
    }

    /// Remove the saved post and the cover images it references
    fn delete_post(&mut self) -> Result<()> {
        let Some(saved) = &self.saved else {
            return Ok(());
        };
        self.store.delete(&saved.slug)?;

        let mut covers = vec![saved.cover_image.as_str()];
        if self.post.cover_image != saved.cover_image {
            covers.push(self.post.cover_image.as_str());
        }
        for cover in covers.into_iter().filter(|c| !c.is_empty()) {
            if let Err(e) = self.uploader.remove(cover) {
                log::warn!("Failed to remove cover image {cover}: {e}");
            }
        }

        self.status = format!("Deleted {}", saved.slug);
        self.saved = None;
        self.baseline = self.post.clone();
        self.saved_version = self.session.version();
        self.deleted = true;
        Ok(())
    }
}

fn read_image(path: &str) -> std::io::Result<(String, Vec<u8>)> {
    let path = Path::new(path.trim());
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    Ok((file_name, bytes))
}
