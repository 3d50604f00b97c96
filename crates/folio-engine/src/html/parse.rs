use kuchikiki::NodeRef;
use kuchikiki::traits::*;

use crate::editing::{Block, BlockKind, Document};

/// Build a document from stored post HTML
///
/// Each top-level element becomes one block with a fresh id:
///
/// | element | block | payload |
/// |---|---|---|
/// | `p` | paragraph | inner HTML |
/// | `h1`, `h2`, `h3` | heading | inner HTML (level dropped) |
/// | `blockquote` | quote | inner HTML |
/// | `img` | image | raw `src` attribute |
/// | `hr` | divider | empty |
/// | anything else | paragraph | outer HTML of the element |
///
/// Children are never decomposed further. Input without any element (empty,
/// or bare text) becomes a single paragraph holding the input verbatim, so
/// parsing never fails and never returns an empty document.
pub fn parse(input: &str) -> Document {
    let root = kuchikiki::parse_html().one(input);

    // The HTML5 tree builder hoists metadata elements (style, meta, ...) into
    // <head>, so both containers are walked to keep every top-level element.
    let blocks: Vec<Block> = ["head", "body"]
        .into_iter()
        .filter_map(|container| root.select_first(container).ok())
        .flat_map(|container| container.as_node().children())
        .filter_map(|node| block_for_element(&node))
        .collect();

    if blocks.is_empty() {
        if !input.is_empty() {
            log::debug!("No top-level elements in post content, keeping it as one paragraph");
        }
        return Document::from_blocks([Block::new(BlockKind::Paragraph, input)]);
    }

    Document::from_blocks(blocks)
}

fn block_for_element(node: &NodeRef) -> Option<Block> {
    let element = node.as_element()?;
    let tag = element.name.local.to_lowercase();

    let block = match tag.as_str() {
        "p" => Block::new(BlockKind::Paragraph, inner_html(node)),
        "h1" | "h2" | "h3" => Block::new(BlockKind::Heading, inner_html(node)),
        "blockquote" => Block::new(BlockKind::Quote, inner_html(node)),
        "img" => {
            let src = element
                .attributes
                .borrow()
                .get("src")
                .unwrap_or_default()
                .to_string();
            Block::new(BlockKind::Image, src)
        }
        "hr" => Block::new(BlockKind::Divider, ""),
        _ => Block::new(BlockKind::Paragraph, node.to_string()),
    };
    Some(block)
}

fn inner_html(node: &NodeRef) -> String {
    node.children().map(|child| child.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::serialize;
    use crate::tests::payloads;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(doc: &Document) -> Vec<BlockKind> {
        doc.blocks().iter().map(|b| b.kind).collect()
    }

    #[test]
    fn test_empty_input_gives_one_empty_paragraph() {
        let doc = parse("");
        assert_eq!(kinds(&doc), vec![BlockKind::Paragraph]);
        assert_eq!(payloads(&doc), vec![""]);
    }

    #[rstest]
    #[case::bare_text("just some words")]
    #[case::whitespace("  \n ")]
    #[case::entity_text("fish &amp; chips")]
    fn test_input_without_elements_is_kept_literally(#[case] input: &str) {
        let doc = parse(input);
        assert_eq!(kinds(&doc), vec![BlockKind::Paragraph]);
        assert_eq!(payloads(&doc), vec![input]);
    }

    #[rstest]
    #[case("<p>Hello <em>there</em></p>", BlockKind::Paragraph, "Hello <em>there</em>")]
    #[case("<h1>One</h1>", BlockKind::Heading, "One")]
    #[case("<h2>Two</h2>", BlockKind::Heading, "Two")]
    #[case("<h3>Three <a href=\"/x\">link</a></h3>", BlockKind::Heading, "Three <a href=\"/x\">link</a>")]
    #[case("<blockquote><p>Quoted</p></blockquote>", BlockKind::Quote, "<p>Quoted</p>")]
    #[case("<img src=\"/uploads/a.webp\" alt=\"Alt\" class=\"x\">", BlockKind::Image, "/uploads/a.webp")]
    #[case("<img alt=\"no source\">", BlockKind::Image, "")]
    #[case("<hr class=\"my-12\">", BlockKind::Divider, "")]
    #[case("<P>Upper</P>", BlockKind::Paragraph, "Upper")]
    fn test_single_element_classification(
        #[case] input: &str,
        #[case] kind: BlockKind,
        #[case] payload: &str,
    ) {
        let doc = parse(input);
        assert_eq!(kinds(&doc), vec![kind]);
        assert_eq!(payloads(&doc), vec![payload]);
    }

    #[rstest]
    #[case("<h4>Deep</h4>")]
    #[case("<ul><li>one</li><li>two</li></ul>")]
    #[case("<div class=\"gallery\"><p>inner</p></div>")]
    fn test_unrecognized_elements_keep_outer_html(#[case] input: &str) {
        let doc = parse(input);
        assert_eq!(kinds(&doc), vec![BlockKind::Paragraph]);
        assert_eq!(payloads(&doc), vec![input]);
    }

    #[test]
    fn test_sequence_of_top_level_elements() {
        let input = "<h2>Trip</h2>\n<p>Day one</p>\n<img src=\"/uploads/1.webp\">\n<hr>\n<blockquote>Wow</blockquote>";
        let doc = parse(input);

        assert_eq!(
            kinds(&doc),
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::Image,
                BlockKind::Divider,
                BlockKind::Quote,
            ]
        );
        assert_eq!(
            payloads(&doc),
            vec!["Trip", "Day one", "/uploads/1.webp", "", "Wow"]
        );
    }

    #[test]
    fn test_stray_text_between_elements_is_not_a_block() {
        let doc = parse("<p>a</p> loose text <p>b</p>");
        assert_eq!(payloads(&doc), vec!["a", "b"]);
    }

    #[test]
    fn test_head_hoisted_elements_are_kept() {
        let doc = parse("<style>p { color: red }</style><p>body</p>");
        assert_eq!(
            payloads(&doc),
            vec!["<style>p { color: red }</style>", "body"]
        );
    }

    #[test]
    fn test_parsed_ids_are_fresh_each_time() {
        let a = parse("<p>x</p>");
        let b = parse("<p>x</p>");
        assert_ne!(a.blocks()[0].id, b.blocks()[0].id);
    }

    #[test]
    fn test_heading_levels_collapse_to_h2() {
        let doc = parse("<h1>Big</h1><h3>Small</h3>");
        assert_eq!(serialize(&doc), "<h2>Big</h2><h2>Small</h2>");
    }

    #[test]
    fn test_editor_output_round_trips() {
        let html = concat!(
            "<p>Intro with <strong>bold</strong></p>",
            "<h2>Section</h2>",
            r#"<img src="https://cdn.example/a.webp" alt="Blog Image" class="w-full h-auto my-8 rounded-sm" />"#,
            "<blockquote>Said someone</blockquote>",
            r#"<hr class="my-12 border-gray-200" />"#,
            "<p></p>",
        );
        assert_eq!(serialize(&parse(html)), html);
    }
}
