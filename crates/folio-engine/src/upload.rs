use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use uuid::Uuid;

use crate::editing::UploadTicket;

static UNSAFE_FILE_CHARS: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Upload rejected: {0}")]
    Rejected(String),
}

/// Image storage: turns bytes into a URL the post can reference
pub trait ImageUploader: Send + Sync {
    /// Store `bytes` and return the public URL of the stored image
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, UploadError>;

    /// Delete a previously uploaded image by its URL; unknown URLs are ignored
    fn remove(&self, url: &str) -> Result<(), UploadError>;
}

/// Stores uploads as files in a directory served under `url_prefix`
#[derive(Debug, Clone)]
pub struct LocalUploader {
    dir: PathBuf,
    url_prefix: String,
}

impl LocalUploader {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn url_for(&self, stored_name: &str) -> String {
        format!("{}/{stored_name}", self.url_prefix.trim_end_matches('/'))
    }
}

impl ImageUploader for LocalUploader {
    fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }

        fs::create_dir_all(&self.dir)?;
        let stored_name = unique_file_name(file_name);
        fs::write(self.dir.join(&stored_name), bytes)?;
        log::info!("Stored upload {stored_name} ({} bytes)", bytes.len());
        Ok(self.url_for(&stored_name))
    }

    fn remove(&self, url: &str) -> Result<(), UploadError> {
        let Some(name) = file_name_from_url(url) else {
            return Ok(());
        };
        let path = self.dir.join(name);
        if path.is_file() {
            fs::remove_file(&path)?;
            log::info!("Removed upload {name}");
        }
        Ok(())
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    let re = UNSAFE_FILE_CHARS
        .get_or_init(|| Regex::new(r"[^a-zA-Z0-9.-]").expect("Invalid file name regex"));
    re.replace_all(name, "_").into_owned()
}

/// `<unix-millis>-<8 hex>-<sanitized name>`, so repeated uploads never collide
fn unique_file_name(original: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{millis}-{}-{}", &nonce[..8], sanitize_file_name(original))
}

/// Last path segment of an upload URL, if it names a plain file
pub fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next()?;
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Run an upload on a worker thread
///
/// The result is sent back with its ticket so the host's event loop can hand
/// it to `EditingSession::finish_upload`. If the receiver is gone the result
/// is dropped.
pub fn spawn_upload(
    uploader: Arc<dyn ImageUploader>,
    ticket: UploadTicket,
    file_name: String,
    bytes: Vec<u8>,
    results: Sender<(UploadTicket, Result<String, UploadError>)>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let result = uploader.upload(&file_name, &bytes);
        if results.send((ticket, result)).is_err() {
            log::debug!("Upload for block {} finished after the session closed", ticket.block);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{BlockKind, Cmd, EditingSession, UploadOutcome};
    use crate::tests::create_test_dir;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::mpsc;

    struct RejectingUploader;

    impl ImageUploader for RejectingUploader {
        fn upload(&self, _file_name: &str, _bytes: &[u8]) -> Result<String, UploadError> {
            Err(UploadError::Rejected("bucket not found".to_string()))
        }

        fn remove(&self, _url: &str) -> Result<(), UploadError> {
            Ok(())
        }
    }

    #[rstest]
    #[case("photo.webp", "photo.webp")]
    #[case("my photo (1).jpg", "my_photo__1_.jpg")]
    #[case("año-nuevo.png", "a_o-nuevo.png")]
    #[case("../../etc/passwd", ".._.._etc_passwd")]
    fn test_sanitize_file_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(sanitize_file_name(name), expected);
    }

    #[rstest]
    #[case("/uploads/123-abc-photo.webp", Some("123-abc-photo.webp"))]
    #[case("https://cdn.example/uploads/a.webp?v=2", Some("a.webp"))]
    #[case("a.webp", Some("a.webp"))]
    #[case("/uploads/", None)]
    #[case("", None)]
    #[case("/uploads/..", None)]
    fn test_file_name_from_url(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(file_name_from_url(url), expected);
    }

    #[test]
    fn test_local_upload_writes_file_and_returns_url() {
        let dir = create_test_dir();
        let uploader = LocalUploader::new(dir.path().join("uploads"), "/uploads/");

        let url = uploader.upload("sunset.webp", b"image-bytes").unwrap();

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with("-sunset.webp"));
        let name = file_name_from_url(&url).unwrap();
        let stored = fs::read(dir.path().join("uploads").join(name)).unwrap();
        assert_eq!(stored, b"image-bytes");
    }

    #[test]
    fn test_repeated_uploads_do_not_collide() {
        let dir = create_test_dir();
        let uploader = LocalUploader::new(dir.path(), "/uploads");

        let a = uploader.upload("same.webp", b"1").unwrap();
        let b = uploader.upload("same.webp", b"2").unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_upload_is_rejected() {
        let dir = create_test_dir();
        let uploader = LocalUploader::new(dir.path(), "/uploads");
        assert!(matches!(
            uploader.upload("empty.webp", b""),
            Err(UploadError::EmptyFile)
        ));
    }

    #[test]
    fn test_remove_deletes_file_and_ignores_unknown() {
        let dir = create_test_dir();
        let uploader = LocalUploader::new(dir.path(), "/uploads");
        let url = uploader.upload("cover.webp", b"x").unwrap();
        let path = dir.path().join(file_name_from_url(&url).unwrap());
        assert!(path.exists());

        uploader.remove(&url).unwrap();
        assert!(!path.exists());

        uploader.remove(&url).unwrap();
        uploader.remove("/uploads/").unwrap();
    }

    #[test]
    fn test_spawned_upload_result_reaches_session() {
        let dir = create_test_dir();
        let uploader: Arc<dyn ImageUploader> =
            Arc::new(LocalUploader::new(dir.path(), "/uploads"));
        let (tx, rx) = mpsc::channel();

        let mut session = EditingSession::new();
        let image = session.apply(Cmd::Insert {
            kind: BlockKind::Image,
        });
        let ticket = session.begin_upload(image.changed[0]).unwrap();

        spawn_upload(uploader, ticket, "a.webp".to_string(), b"px".to_vec(), tx)
            .join()
            .unwrap();
        let (ticket, result) = rx.recv().unwrap();

        assert!(matches!(
            session.finish_upload(ticket, result),
            UploadOutcome::Applied(_)
        ));
        assert!(session.document().pending_images().next().is_none());
    }

    #[test]
    fn test_spawned_upload_failure_is_reported() {
        let (tx, rx) = mpsc::channel();
        let mut session = EditingSession::new();
        let image = session.apply(Cmd::Insert {
            kind: BlockKind::Image,
        });
        let ticket = session.begin_upload(image.changed[0]).unwrap();

        spawn_upload(Arc::new(RejectingUploader), ticket, "a.webp".to_string(), b"px".to_vec(), tx)
            .join()
            .unwrap();
        let (ticket, result) = rx.recv().unwrap();

        assert_eq!(
            session.finish_upload(ticket, result),
            UploadOutcome::Failed("Upload rejected: bucket not found".to_string())
        );
    }

    #[test]
    fn test_spawned_upload_without_receiver_does_not_panic() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut session = EditingSession::new();
        let image = session.apply(Cmd::Insert {
            kind: BlockKind::Image,
        });
        let ticket = session.begin_upload(image.changed[0]).unwrap();

        let handle = spawn_upload(
            Arc::new(RejectingUploader),
            ticket,
            "a.webp".to_string(),
            b"px".to_vec(),
            tx,
        );
        assert!(handle.join().is_ok());
    }
}
