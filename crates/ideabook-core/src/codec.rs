//! Markdown codec for per-day idea documents.
//!
//! A day document looks like:
//!
//! ```text
//! # Ideas - 2026-10-19
//!
//! ## Title
//! <!-- id: 0192b5c4-... -->
//!
//! Description, possibly
//! over several lines
//!
//! *Created: 2026-10-19 08:30 UTC*
//!
//! ---
//!
//! ```
//!
//! Nothing is escaped. A title or description containing `## ` at the start
//! of a line or `---` anywhere will not survive a round-trip.

use std::fmt::Write as _;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use crate::models::{Entry, EntryId};

/// Directory in the repository holding the day documents.
pub const DOCUMENT_DIR: &str = "ideas";
/// Block separator.
pub const SEPARATOR: &str = "---";
/// Body of a document for a day without entries.
pub const EMPTY_PLACEHOLDER: &str = "No ideas yet for today.";

const HEADING_PREFIX: &str = "## ";
const DAY_FORMAT: &str = "%Y-%m-%d";
const FOOTER_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Repository path of the document for `day`.
#[must_use]
pub fn document_path(day: NaiveDate) -> String {
    format!("{DOCUMENT_DIR}/{}.md", day.format(DAY_FORMAT))
}

/// Entries created on `day` (UTC), in list order.
#[must_use]
pub fn entries_for_day(entries: &[Entry], day: NaiveDate) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| entry.day() == day)
        .cloned()
        .collect()
}

/// Filter `entries` to `day` and encode the result.
#[must_use]
pub fn render_day_document(entries: &[Entry], day: NaiveDate) -> String {
    encode(&entries_for_day(entries, day), day)
}

/// Encode `entries` as the document for `day`.
///
/// Entries are written in the order given; the caller is responsible for
/// passing only entries of that day.
#[must_use]
pub fn encode(entries: &[Entry], day: NaiveDate) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Ideas - {}", day.format(DAY_FORMAT));
    let _ = writeln!(output);

    if entries.is_empty() {
        let _ = writeln!(output, "{EMPTY_PLACEHOLDER}");
        return output;
    }

    for entry in entries {
        let _ = writeln!(output, "{HEADING_PREFIX}{}", entry.title);
        let _ = writeln!(output, "<!-- id: {} -->", entry.id);
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", entry.description);
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "*Created: {}*",
            entry.created_at.format(FOOTER_FORMAT)
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "{SEPARATOR}");
        let _ = writeln!(output);
    }

    output
}

/// Parse a day document back into entries.
///
/// Best effort: fragments without a heading or a readable footer date are
/// skipped, so the result may be empty but is never an error. Entries keep
/// the id from their identifier comment, or get a fresh one when it is
/// missing.
#[must_use]
pub fn decode(document: &str) -> Vec<Entry> {
    document
        .split(SEPARATOR)
        .filter(|fragment| !fragment.trim().is_empty())
        .filter_map(decode_fragment)
        .collect()
}

fn decode_fragment(fragment: &str) -> Option<Entry> {
    let lines = fragment.trim().lines().collect::<Vec<_>>();

    let heading_index = lines
        .iter()
        .position(|line| line.starts_with(HEADING_PREFIX))?;
    let title = lines[heading_index][HEADING_PREFIX.len()..].trim().to_string();

    let body = &lines[heading_index + 1..];
    let (footer_offset, created_at) = body.iter().enumerate().find_map(|(offset, line)| {
        let captures = footer_pattern().captures(line)?;
        parse_created(captures[1].trim()).map(|created_at| (offset, created_at))
    })?;

    let mut id = None;
    let mut description_lines = Vec::with_capacity(footer_offset);
    for line in &body[..footer_offset] {
        if let Some(captures) = id_pattern().captures(line.trim()) {
            if id.is_none() {
                id = captures[1].parse::<EntryId>().ok();
            }
            continue;
        }
        description_lines.push(*line);
    }

    Some(Entry {
        id: id.unwrap_or_default(),
        title,
        description: description_lines.join("\n").trim().to_string(),
        created_at,
    })
}

/// Parse a footer date.
///
/// Accepts the footer format written by [`encode`], RFC 3339, and the bare
/// `YYYY-MM-DD` / `YYYY/M/D` day forms. Day-only values map to midnight UTC.
fn parse_created(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(value) = NaiveDateTime::parse_from_str(raw, FOOTER_FORMAT) {
        return Some(value.and_utc());
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }

    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc())
}

fn footer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\*Created: ([^*]+)\*").expect("Invalid regex"))
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^<!--\s*id:\s*(\S+)\s*-->$").expect("Invalid regex"))
}
