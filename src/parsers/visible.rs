use ego_tree::iter::Edge;
use scraper::{Html, Node};

/// Elements whose contents never render as page text.
const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

fn is_skipped(name: &str) -> bool {
    SKIPPED_ELEMENTS
        .iter()
        .any(|skipped| name.eq_ignore_ascii_case(skipped))
}

/// Extract the visible text of an HTML document as trimmed, non-empty
/// fragments in document order.
///
/// Walks the parse tree keeping a skip depth that is raised when a
/// script/style/noscript element opens and lowered when it closes. Text is
/// only collected at depth zero. Malformed markup never fails; the parser
/// repairs what it can and the depth never drops below zero.
pub fn extract_visible_text(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut skip_depth: usize = 0;
    let mut fragments = Vec::new();

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) if is_skipped(element.name()) => {
                    skip_depth += 1;
                }
                Node::Text(text) if skip_depth == 0 => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        fragments.push(trimmed.to_string());
                    }
                }
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(element) = node.value() {
                    if is_skipped(element.name()) {
                        skip_depth = skip_depth.saturating_sub(1);
                    }
                }
            }
        }
    }

    fragments
}
