//! Relative-date resolution and the synthetic values the destination
//! schema demands but the source site does not provide.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;

/// Matches things like "7d ago", "< 1h ago", "2w ago".
static AGO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)([a-zA-Z]) +ago").expect("ago regex"));

/// Bounds of the stale-date fallback, in days.
///
/// An unparseable "ago" text resolves to a uniformly random timestamp
/// roughly 25 days old instead of a fixed default. This randomization is
/// long-standing behavior and kept as an explicit policy; see DESIGN.md.
pub const STALE_FALLBACK_MIN_DAYS: i64 = 5;
pub const STALE_FALLBACK_MAX_DAYS: i64 = 45;

fn unit_seconds(unit: char) -> i64 {
    match unit.to_ascii_lowercase() {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        'w' => 604_800,
        'y' => 31_536_000,
        // Unknown units read as days.
        _ => 86_400,
    }
}

/// Resolve a relative-date text to a timestamp, falling back to
/// [`stale_fallback`] when the text does not parse.
pub fn from_ago_text(text: &str) -> DateTime<Utc> {
    match parse_ago_seconds(text) {
        Some(seconds) => Utc::now() - Duration::seconds(seconds),
        None => stale_fallback(),
    }
}

fn parse_ago_seconds(text: &str) -> Option<i64> {
    let caps = AGO_RE.captures(text)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = caps[2].chars().next()?;
    Some(amount * unit_seconds(unit))
}

/// The stale-date fallback policy: a random timestamp 5–45 days old.
pub fn stale_fallback() -> DateTime<Utc> {
    let days = fastrand::i64(STALE_FALLBACK_MIN_DAYS..=STALE_FALLBACK_MAX_DAYS);
    Utc::now() - Duration::days(days)
}

/// A couple of weeks of posting lifetime after the publish date.
pub fn few_weeks_after(start: DateTime<Utc>) -> DateTime<Utc> {
    start + Duration::weeks(fastrand::i64(2..=4))
}

/// Vacancy count for an offer.
pub fn random_vacancies() -> u32 {
    fastrand::u32(3..=9)
}

/// A (min, max) job duration pair in months, max strictly above min.
pub fn random_job_duration() -> (u32, u32) {
    let min = fastrand::u32(1..=4);
    let max = fastrand::u32(min + 1..=2 * min + 1);
    (min, max)
}

/// A placeholder contact number in the destination's country format.
pub fn random_phone_number() -> String {
    let mut phone = String::from("+351 2");
    for _ in 0..8 {
        phone.push(char::from_digit(fastrand::u32(1..=8), 10).unwrap_or('0'));
    }
    phone
}

/// Biased coin flip: true with probability `p`.
pub fn random_bool(p: f64) -> bool {
    fastrand::f64() <= p
}

/// A random element of a non-empty slice.
pub fn random_of<'a>(values: &'a [&'a str]) -> &'a str {
    values[fastrand::usize(0..values.len())]
}
