use std::fmt;

use uuid::Uuid;

/// Unique identifier for a block
///
/// Minted fresh for every new or parsed block. Two blocks never share an id,
/// even after one of them has been removed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct BlockId(pub Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of block types a post body is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Body text; payload is inline markup
    Paragraph,
    /// Section title; payload is inline markup, always rendered as `<h2>`
    Heading,
    /// Picture; payload is its URL, empty while awaiting upload
    Image,
    /// Pull quote; payload is inline markup
    Quote,
    /// Horizontal rule; payload is always empty
    Divider,
}

impl BlockKind {
    /// All kinds in toolbar order
    pub const ALL: [BlockKind; 5] = [
        BlockKind::Paragraph,
        BlockKind::Heading,
        BlockKind::Image,
        BlockKind::Quote,
        BlockKind::Divider,
    ];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading => "heading",
            BlockKind::Image => "image",
            BlockKind::Quote => "quote",
            BlockKind::Divider => "divider",
        }
    }

    /// Name shown on toolbar buttons
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "Text",
            BlockKind::Heading => "Title",
            BlockKind::Image => "Image",
            BlockKind::Quote => "Quote",
            BlockKind::Divider => "Divider",
        }
    }

    /// Whether the payload is inline markup (as opposed to a URL or nothing)
    pub fn carries_markup(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::Heading | BlockKind::Quote
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of post content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Kind-dependent data: inline markup, an image URL, or nothing
    pub payload: String,
}

impl Block {
    /// Create a block with a freshly minted id
    pub fn new(kind: BlockKind, payload: impl Into<String>) -> Self {
        Self::with_id(BlockId::new(), kind, payload)
    }

    pub(crate) fn with_id(id: BlockId, kind: BlockKind, payload: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            payload: normalize_payload(kind, payload.into()),
        }
    }

    /// An image block still waiting for its upload
    pub fn is_pending(&self) -> bool {
        self.kind == BlockKind::Image && self.payload.is_empty()
    }
}

/// Dividers never carry a payload
pub(crate) fn normalize_payload(kind: BlockKind, payload: String) -> String {
    match kind {
        BlockKind::Divider => String::new(),
        _ => payload,
    }
}
