//! Text helpers shared by the codec, the remote client and the journal.

/// Longest excerpt of an HTTP body quoted in an error.
const ERROR_EXCERPT_CHARS: usize = 180;

/// Trimmed text, or `None` when absent or blank.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Whether `value` is an absolute http(s) URL. The scheme is matched without
/// regard to case.
pub fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Collapse every run of whitespace, line breaks included, into one space.
///
/// Titles become Markdown headings, which cannot span lines.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One-line excerpt of a response body for error messages.
pub fn error_excerpt(body: &str) -> String {
    let line = single_line(body);
    if line.chars().count() <= ERROR_EXCERPT_CHARS {
        return line;
    }
    let mut excerpt = line
        .chars()
        .take(ERROR_EXCERPT_CHARS - 3)
        .collect::<String>();
    excerpt.push_str("...");
    excerpt
}
