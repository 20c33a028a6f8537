use once_cell::sync::Lazy;
use regex::Regex;

/// Clock times such as `14:32`, `2:05:09 PM` or `9:41am`.
static CLOCK_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}:\d{2}(?::\d{2})?\s?(?:AM|PM|am|pm)?\b")
        .expect("Invalid clock time regex")
});

/// ISO calendar dates such as `2024-01-15`.
static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("Invalid ISO date regex")
});

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Normalize a single fragment. Returns `None` when nothing is left once
/// volatile tokens and surplus whitespace are gone.
pub fn normalize_fragment(raw: &str) -> Option<String> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    let line = CLOCK_TIME_REGEX.replace_all(line, "");
    let line = ISO_DATE_REGEX.replace_all(&line, "");
    let line = WHITESPACE_REGEX.replace_all(&line, " ");
    let line = line.trim();

    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Normalize every fragment and join the survivors with newlines, keeping
/// their relative order.
pub fn normalize_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .filter_map(|fragment| normalize_fragment(fragment.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
