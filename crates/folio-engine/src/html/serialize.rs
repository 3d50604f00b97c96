use crate::editing::{Block, BlockKind, Document};

/// Emitted for every divider, whatever its payload
pub const DIVIDER_FRAGMENT: &str = r#"<hr class="my-12 border-gray-200" />"#;

/// Render a document as HTML, one fragment per block with no separators
///
/// Payloads are embedded as-is; they are trusted to be valid inline markup.
pub fn serialize(doc: &Document) -> String {
    doc.blocks().iter().map(fragment).collect()
}

/// HTML fragment for a single block
pub fn fragment(block: &Block) -> String {
    match block.kind {
        BlockKind::Paragraph => format!("<p>{}</p>", block.payload),
        BlockKind::Heading => format!("<h2>{}</h2>", block.payload),
        BlockKind::Quote => format!("<blockquote>{}</blockquote>", block.payload),
        BlockKind::Image => format!(
            r#"<img src="{}" alt="Blog Image" class="w-full h-auto my-8 rounded-sm" />"#,
            block.payload
        ),
        BlockKind::Divider => DIVIDER_FRAGMENT.to_string(),
    }
}
