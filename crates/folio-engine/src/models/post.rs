use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_SLUG_CHARS: OnceLock<Regex> = OnceLock::new();

/// A blog post as kept by the post store
///
/// `content` is the serialized block document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub cover_image: String,
    /// Publication date, `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub content: String,
}

impl Post {
    /// A fresh post dated today, with its slug derived from the title
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            slug: slugify(&title),
            title,
            excerpt: String::new(),
            cover_image: String::new(),
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            content: String::new(),
        }
    }

    /// The cover image this post no longer uses compared to `previous`, if any
    ///
    /// Callers delete the returned upload after saving.
    pub fn replaced_cover<'a>(&self, previous: &'a Post) -> Option<&'a str> {
        let old = previous.cover_image.as_str();
        (!old.is_empty() && old != self.cover_image).then_some(old)
    }
}

/// Derive a URL slug from a title
///
/// Lowercases the title and turns every run of characters outside `[a-z0-9]`
/// into a single `-`.
pub fn slugify(title: &str) -> String {
    let re = NON_SLUG_CHARS.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("Invalid slug regex"));
    re.replace_all(&title.to_lowercase(), "-").into_owned()
}
