//! Text cleanup for scraped HTML fragments.
//!
//! Page text arrives full of whitespace noise, query-string junk and
//! abbreviations; everything downstream assumes these helpers ran first.

/// Collapse a one-line HTML text fragment: trim plus single spaces.
pub fn oneline(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse a multi-line HTML text fragment: each line cleaned like
/// [`oneline`], blank-line runs squeezed to one paragraph break.
pub fn multiline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blanks = 0usize;
    for line in text.trim().lines() {
        let line = oneline(line);
        if line.is_empty() {
            blanks += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blanks > 0 {
                out.push('\n');
            }
        }
        blanks = 0;
        out.push_str(&line);
    }
    out
}

/// Expand the abbreviations the source site loves.
pub fn english(text: &str) -> String {
    text.replace("Sr.", "Senior")
        .replace("Sen.", "Senior")
        .replace("Jr.", "Junior")
        .replace("Jun.", "Junior")
        .replace("Grad.", "Graduate")
        .replace("front-end", "frontend")
        .replace("back-end", "backend")
        .replace("Front-end", "Frontend")
        .replace("Back-end", "Backend")
}

/// Remove the query part of a URL (everything after the first `?`).
pub fn rmquery(text: &str) -> &str {
    text.trim().split('?').next().unwrap_or("")
}

/// Get the last path element of a URI, query stripped.
pub fn endofpath(text: &str) -> &str {
    rmquery(text).rsplit('/').next().unwrap_or("")
}

/// Turn free text into its likely identifier form: lowercase alphanumerics
/// and dashes only.
pub fn identifier(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

/// Number of characters in `text`. Schema bounds count characters, not bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Truncate `text` to at most `max_chars` characters, preferring the latest
/// sentence or paragraph boundary that fits; hard cut when none does.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }

    // Byte offset of the hard-cut point.
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let prefix = &text[..cut];

    let mut boundary = None;
    let mut chars = prefix.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\n' => boundary = Some(i),
            '.' | '!' | '?' => {
                if let Some((_, next)) = chars.peek() {
                    if next.is_whitespace() {
                        boundary = Some(i + c.len_utf8());
                    }
                } else {
                    boundary = Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    match boundary {
        Some(end) => prefix[..end].trim_end().to_string(),
        None => prefix.trim_end().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oneline_collapses_whitespace() {
        assert_eq!(oneline("  Senior \t Rust\nEngineer  "), "Senior Rust Engineer");
        assert_eq!(oneline(""), "");
    }

    #[test]
    fn multiline_squeezes_blank_runs() {
        let text = "First  line\n\n\n   \nSecond line\nThird   line";
        assert_eq!(multiline(text), "First line\n\nSecond line\nThird line");
    }

    #[test]
    fn english_expands_abbreviations() {
        assert_eq!(english("Sr. Back-end Dev"), "Senior Backend Dev");
        assert_eq!(english("Jr. front-end"), "Junior frontend");
    }

    #[test]
    fn url_helpers() {
        assert_eq!(rmquery("https://x.test/a/b?v=4&s=1"), "https://x.test/a/b");
        assert_eq!(endofpath("/jobs/companies/acme?r=home"), "acme");
        assert_eq!(endofpath("acme"), "acme");
        assert_eq!(identifier("Acme Corp!"), "acmecorp");
    }

    #[test]
    fn truncate_prefers_sentence_boundary() {
        let text = "One sentence. Another sentence that is longer. Tail text here";
        let cut = truncate_text(text, 40);
        assert_eq!(cut, "One sentence.");
        assert!(char_len(&cut) <= 40);
    }

    #[test]
    fn truncate_prefers_latest_boundary() {
        let text = "A. B. C. Ddddddddddddddddddddddd";
        assert_eq!(truncate_text(text, 10), "A. B. C.");
    }

    #[test]
    fn truncate_paragraph_boundary() {
        let text = "First paragraph\n\nSecond paragraph with much more text following";
        let cut = truncate_text(text, 30);
        assert_eq!(cut, "First paragraph");
    }

    #[test]
    fn truncate_hard_cut_without_boundary() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        assert_eq!(truncate_text(text, 10), "abcdefghij");
    }

    #[test]
    fn truncate_short_text_untouched() {
        assert_eq!(truncate_text("short", 90), "short");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "éééééééééééééééééééé no boundary";
        let cut = truncate_text(text, 10);
        assert_eq!(char_len(&cut), 10);
    }
}
