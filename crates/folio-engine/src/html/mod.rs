//! HTML boundary of the block model.
//!
//! Stored posts keep their body as one flat HTML string. [`parse`] splits that
//! string into blocks, one per top-level element, and [`serialize`] glues the
//! blocks back together. Inline markup inside a block is carried verbatim in
//! both directions and never inspected.
//!
//! The pair is structurally round-trippable for anything the editor produced:
//! `parse(&serialize(&doc))` gives back the same kinds and payloads in the
//! same order (with fresh ids). Heading levels are not: every heading is
//! written as `<h2>`.

mod parse;
mod serialize;

pub use parse::parse;
pub use serialize::{DIVIDER_FRAGMENT, fragment, serialize};
