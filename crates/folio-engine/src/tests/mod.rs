use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::editing::{BlockKind, Document};

/// Create a temporary directory for store and upload tests
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test file with content
pub fn create_test_file(dir: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}

/// Build a document of paragraphs with the given payloads, in order
pub fn paragraphs(payloads: &[&str]) -> Document {
    let mut doc = Document::empty();
    for payload in payloads {
        let (next, id) = doc.insert(BlockKind::Paragraph);
        doc = next.update(id, *payload).unwrap();
    }
    doc
}

/// Payloads of a document, in order
pub fn payloads(doc: &Document) -> Vec<&str> {
    doc.blocks().iter().map(|b| b.payload.as_str()).collect()
}
