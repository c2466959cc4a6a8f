//! Post-processing: deterministic cleanup of model-written article text.
//!
//! The article prompt asks for plain paragraphs with no title and no
//! markdown, and models still occasionally send fences, `**bold**`, a `#`
//! heading or the topic repeated as the first line. Fixing that here keeps
//! the prompt about content, and each rule stays independently testable.
//!
//! ## Rule Order
//!
//! Line endings are normalised before fence stripping so the fence regex
//! only has to match `\n`, and emphasis is removed before the heading
//! comparison so `**Edge AI**` still counts as a repeated title.

use once_cell::sync::Lazy;
use regex::Regex;

/// Turn the raw article answer into print paragraphs.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip outer markdown fences
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 4. Per line: strip `**`/`__` emphasis and leading `#` markers, then trim
/// 5. Drop empty lines and lines equal to `heading` (case-insensitive)
pub fn clean_article(raw: &str, heading: &str) -> Vec<String> {
    let s = normalise_line_endings(raw);
    let s = strip_markdown_fences(&s);
    let s = remove_invisible_chars(&s);
    let heading = heading.trim().to_lowercase();

    s.lines()
        .map(clean_line)
        .filter(|line| !line.is_empty() && line.to_lowercase() != heading)
        .collect()
}

static RE_HEADING_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\s"'“”‘’*_#]+|[\s"'“”‘’*_.:;!]+$"#).unwrap());

/// Clean the topic answer into a single heading line.
///
/// Keeps the first non-empty line and strips surrounding quotes, markdown
/// markers and trailing punctuation.
pub fn clean_heading(raw: &str) -> String {
    let s = remove_invisible_chars(&normalise_line_endings(raw));
    let first = s.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    RE_HEADING_QUOTES.replace_all(first, "").to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Strip inline markdown per line ───────────────────────────────────

static RE_LEADING_HASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#+\s*").unwrap());

fn clean_line(line: &str) -> String {
    let line = line.replace("**", "").replace("__", "");
    RE_LEADING_HASHES.replace(&line, "").trim().to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────────
