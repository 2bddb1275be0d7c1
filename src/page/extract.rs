//! Caption text extraction.

use super::NodeSnapshot;

/// Flattens the caption container markup into one display string.
///
/// Players render one block element per caption line, often repeating the
/// text in nested inline wrappers, so block children are read individually
/// (trimmed, blanks dropped) and joined with a single space. A container
/// without block children falls back to its whole trimmed text. Empty
/// string means no caption.
pub fn caption_text(container: &NodeSnapshot) -> String {
    let blocks: Vec<&NodeSnapshot> = match container {
        NodeSnapshot::Element { children, .. } => {
            children.iter().filter(|child| child.is_block()).collect()
        }
        NodeSnapshot::Text(_) => Vec::new(),
    };

    if blocks.is_empty() {
        return container.text_content().trim().to_string();
    }

    blocks
        .iter()
        .map(|block| block.text_content().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> NodeSnapshot {
        NodeSnapshot::element("div", vec![NodeSnapshot::text(text)])
    }

    #[test]
    fn joins_block_lines_with_single_space() {
        let container = NodeSnapshot::element("div", vec![line("오늘 날씨가"), line("좋네요")]);
        assert_eq!(caption_text(&container), "오늘 날씨가 좋네요");
    }

    #[test]
    fn drops_blank_lines() {
        let container = NodeSnapshot::element("div", vec![line("  "), line("안녕하세요")]);
        assert_eq!(caption_text(&container), "안녕하세요");
    }

    #[test]
    fn nested_inline_markup_is_flattened() {
        let nested = NodeSnapshot::element(
            "div",
            vec![NodeSnapshot::element(
                "span",
                vec![NodeSnapshot::element(
                    "span",
                    vec![NodeSnapshot::text(" 안녕하세요 ")],
                )],
            )],
        );
        let container = NodeSnapshot::element("div", vec![nested]);
        assert_eq!(caption_text(&container), "안녕하세요");
    }

    #[test]
    fn falls_back_to_whole_text_without_block_children() {
        let container = NodeSnapshot::element(
            "div",
            vec![NodeSnapshot::element(
                "span",
                vec![NodeSnapshot::text("  bare text  ")],
            )],
        );
        assert_eq!(caption_text(&container), "bare text");
    }

    #[test]
    fn empty_container_yields_empty_string() {
        let container = NodeSnapshot::element("div", Vec::new());
        assert_eq!(caption_text(&container), "");
    }

    #[test]
    fn all_blank_block_children_yield_empty_string() {
        // Blank blocks count as "qualifying children": no whole-text fallback.
        let container = NodeSnapshot::element(
            "div",
            vec![line("   "), NodeSnapshot::text("stray text run")],
        );
        assert_eq!(caption_text(&container), "");
    }
}
