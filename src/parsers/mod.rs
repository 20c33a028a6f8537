pub mod visible;
pub mod volatile;

pub use visible::*;
pub use volatile::*;

/// Turn a raw HTML document into canonical text: visible fragments with
/// volatile tokens removed, one per line.
pub fn canonical_text(html: &str) -> String {
    normalize_fragments(extract_visible_text(html))
}
