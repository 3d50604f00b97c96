use crate::models::Post;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed post file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),
    #[error("Invalid posts directory: {0}")]
    InvalidPostsDir(String),
}

/// Where posts live. The editor only ever hands it serialized HTML inside a [`Post`].
pub trait PostStore {
    fn get(&self, slug: &str) -> Result<Option<Post>, IoError>;
    /// All posts, newest first
    fn list(&self) -> Result<Vec<Post>, IoError>;
    fn upsert(&self, post: &Post) -> Result<(), IoError>;
    /// Deleting a post that does not exist is not an error
    fn delete(&self, slug: &str) -> Result<(), IoError>;
}

/// Post store keeping one pretty-printed JSON file per post: `<root>/<slug>.json`
#[derive(Debug, Clone)]
pub struct FsPostStore {
    root: PathBuf,
}

impl FsPostStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, slug: &str) -> Result<PathBuf, IoError> {
        let slug = slug.strip_suffix(".json").unwrap_or(slug);
        if slug.is_empty() || slug.contains(['/', '\\']) || slug.contains("..") {
            return Err(IoError::InvalidSlug(slug.to_string()));
        }
        Ok(self.root.join(format!("{slug}.json")))
    }

    fn read_post(path: &Path) -> Result<Post, IoError> {
        let content = fs::read_to_string(path)?;
        let mut post: Post = serde_json::from_str(&content)?;
        // The file name is authoritative for the slug
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            post.slug = stem.to_string();
        }
        Ok(post)
    }
}

impl PostStore for FsPostStore {
    fn get(&self, slug: &str) -> Result<Option<Post>, IoError> {
        let path = self.path_for(slug)?;
        if !path.exists() {
            return Ok(None);
        }
        Self::read_post(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<Post>, IoError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file()
                && let Some(ext) = path.extension()
                && ext == "json"
            {
                posts.push(Self::read_post(&path)?);
            }
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        Ok(posts)
    }

    fn upsert(&self, post: &Post) -> Result<(), IoError> {
        let path = self.path_for(&post.slug)?;
        fs::create_dir_all(&self.root)?;
        let content = serde_json::to_string_pretty(post)?;
        fs::write(&path, content)?;
        log::info!("Saved post {} to {}", post.slug, path.display());
        Ok(())
    }

    fn delete(&self, slug: &str) -> Result<(), IoError> {
        let path = self.path_for(slug)?;
        if path.exists() {
            fs::remove_file(&path)?;
            log::info!("Deleted post {slug}");
        }
        Ok(())
    }
}

pub fn validate_posts_dir(path: &Path) -> Result<(), IoError> {
    if path.exists() && !path.is_dir() {
        return Err(IoError::InvalidPostsDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
