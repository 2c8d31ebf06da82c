//! SQL extraction from raw LLM output.
//!
//! The model may wrap its answer in markdown fences, prefix it with prose, or
//! return bare SQL. Extraction recovers a single candidate query string; it
//! never judges validity, that is the policy's job.

use std::sync::LazyLock;

use regex::Regex;

static SELECT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bselect\b").expect("select pattern is valid"));

/// Extracts a candidate SQL string from raw generated text.
///
/// Priority order:
/// 1. the first triple-backtick fenced block (optionally tagged `sql`);
/// 2. everything from the first case-insensitive `SELECT` keyword onward;
/// 3. the raw text unmodified.
///
/// The result is trimmed and a single trailing `;` is stripped. Repeated
/// trailing semicolons are left alone; a later residual-semicolon check
/// rejects them instead.
pub fn extract_sql(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let candidate = if let Some(block) = extract_fenced_block(raw) {
        block
    } else if let Some(from_select) = slice_from_select(raw) {
        from_select
    } else {
        raw
    };

    let trimmed = candidate.trim();
    trimmed
        .strip_suffix(';')
        .unwrap_or(trimmed)
        .trim_end()
        .to_string()
}

/// Returns the inner content of the first fenced code block, if any.
///
/// Accepts a bare ``` fence or one tagged `sql` (any case); the opening
/// fence must be followed by a newline.
fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let mut rest = &text[start + 3..];

    if rest
        .get(..3)
        .is_some_and(|tag| tag.eq_ignore_ascii_case("sql"))
    {
        rest = &rest[3..];
    }

    let body = rest.strip_prefix('\n')?;
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Returns the text from the first whole-word `select` to the end, if present.
fn slice_from_select(text: &str) -> Option<&str> {
    SELECT_KEYWORD.find(text).map(|m| &text[m.start()..])
}
