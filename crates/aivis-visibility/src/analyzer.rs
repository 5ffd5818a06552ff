//! Pure parsing of a platform's free-text response into mention facts.
//!
//! No I/O, no randomness: the same `(text, brand, competitors)` always
//! produces the same `Analysis`, which is what makes longitudinal
//! comparison of stored checks valid.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Coarse classification of how substantively a response treats the brand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseQuality {
    /// The brand appears with descriptive context in a substantial answer.
    Detailed,
    /// The brand appears, but as little more than a name-drop.
    Brief,
    /// The brand does not appear at all.
    None,
}

/// Everything the analyzer can read out of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub is_mentioned: bool,
    /// Sentence-ish excerpt around the first mention; `None` when not
    /// mentioned.
    pub mention_context: Option<String>,
    /// 1-based rank among detected list entries. `None` when the response
    /// has no enumerable structure — mentioned-but-unranked is a distinct,
    /// valid state and is never defaulted to 1.
    pub position: Option<u32>,
    /// Known competitors found in the text, in caller order, excluding the
    /// brand itself.
    pub competitors_found: Vec<String>,
    pub response_quality: ResponseQuality,
}

/// Responses shorter than this are never classified `Detailed`.
const DETAILED_MIN_RESPONSE_CHARS: usize = 300;
/// Mention context shorter than this counts as a bare name-drop.
const DETAILED_MIN_CONTEXT_CHARS: usize = 60;
/// Upper bound on the stored mention excerpt.
const EXCERPT_MAX_CHARS: usize = 240;

/// `1.` / `2)` style enumeration markers, inline or at line starts.
static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}[.)]\s+").expect("static regex compiles"));

/// `- entry` / `* entry` / `• entry` bullet lines.
static BULLET_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*•]\s+(.+)$").expect("static regex compiles"));

/// Analyze one raw response for brand visibility.
#[must_use]
pub fn analyze(text: &str, brand: &str, competitors: &[String]) -> Analysis {
    let competitors_found: Vec<String> = competitors
        .iter()
        .filter(|c| !c.eq_ignore_ascii_case(brand))
        .filter(|c| contains_ci(text, c))
        .cloned()
        .collect();

    let Some(hit) = find_mention(text, brand) else {
        return Analysis {
            is_mentioned: false,
            mention_context: None,
            position: None,
            competitors_found,
            response_quality: ResponseQuality::None,
        };
    };

    let context = mention_excerpt(text, &hit);
    let position = list_position(text, brand);
    let response_quality = if text.chars().count() >= DETAILED_MIN_RESPONSE_CHARS
        && context.chars().count() >= DETAILED_MIN_CONTEXT_CHARS
    {
        ResponseQuality::Detailed
    } else {
        ResponseQuality::Brief
    };

    Analysis {
        is_mentioned: true,
        mention_context: Some(context),
        position,
        competitors_found,
        response_quality,
    }
}

/// First case-insensitive occurrence of the brand, trying the literal name
/// and then the normalized domain-root form (`drinkcann.com` → `drinkcann`).
fn find_mention(text: &str, brand: &str) -> Option<Range<usize>> {
    if let Some(hit) = find_ci(text, brand) {
        return Some(hit);
    }
    let root = domain_root(brand);
    if root.len() >= 3 && !root.eq_ignore_ascii_case(brand.trim()) {
        return find_ci(text, &root);
    }
    None
}

fn find_ci(text: &str, needle: &str) -> Option<Range<usize>> {
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }
    let re = RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()?;
    re.find(text).map(|m| m.range())
}

fn contains_ci(text: &str, needle: &str) -> bool {
    find_ci(text, needle).is_some()
}

/// Lowercased domain root of a brand name: scheme, `www.`, TLD, and any
/// path are stripped (`https://www.drinkcann.com/shop` → `drinkcann`).
fn domain_root(brand: &str) -> String {
    let lower = brand.trim().to_lowercase();
    let no_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let no_www = no_scheme.strip_prefix("www.").unwrap_or(no_scheme);
    no_www
        .split(['.', '/'])
        .next()
        .unwrap_or(no_www)
        .to_string()
}

/// 1-based rank of the brand among detected list entries, if any.
fn list_position(text: &str, brand: &str) -> Option<u32> {
    let entries = list_entries(text)?;
    let idx = entries.iter().position(|entry| entry_mentions(entry, brand))?;
    u32::try_from(idx + 1).ok()
}

fn entry_mentions(entry: &str, brand: &str) -> bool {
    if contains_ci(entry, brand) {
        return true;
    }
    let root = domain_root(brand);
    root.len() >= 3 && contains_ci(entry, &root)
}

/// Detected enumeration entries, in order. Numbered lists win over
/// bullets, bullets over separator lists; `None` when the text has no
/// enumerable structure.
fn list_entries(text: &str) -> Option<Vec<String>> {
    numbered_entries(text)
        .or_else(|| bullet_entries(text))
        .or_else(|| separated_entries(text))
}

fn numbered_entries(text: &str) -> Option<Vec<String>> {
    let markers: Vec<regex::Match<'_>> = NUMBERED_MARKER.find_iter(text).collect();
    if markers.len() < 2 {
        return None;
    }

    let mut entries = Vec::with_capacity(markers.len());
    for (i, marker) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(text.len(), regex::Match::start);
        let raw = &text[marker.end()..end];
        // Entries stop at the line break: trailing prose after a list
        // shouldn't be glued onto the last entry.
        let entry = raw
            .split('\n')
            .next()
            .unwrap_or(raw)
            .trim()
            .trim_end_matches(['.', ',', ';'])
            .trim();
        entries.push(entry.to_string());
    }
    Some(entries)
}

fn bullet_entries(text: &str) -> Option<Vec<String>> {
    let entries: Vec<String> = BULLET_LINE
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect();
    (entries.len() >= 2).then_some(entries)
}

/// Comma/semicolon brand lists like "Nike, Adidas, and Reebok". Only lines
/// with at least three short items qualify, which keeps ordinary prose
/// with incidental commas from being read as a ranking.
fn separated_entries(text: &str) -> Option<Vec<String>> {
    for line in text.lines() {
        let items: Vec<&str> = line
            .split([',', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if items.len() >= 3 && items.iter().all(|item| item.chars().count() <= 60) {
            return Some(
                items
                    .iter()
                    .map(|item| item.trim_start_matches("and ").trim().to_string())
                    .collect(),
            );
        }
    }
    None
}

/// Sentence-ish excerpt around the first mention. Sentence boundaries
/// ignore periods directly after digits so `2. Adidas` list markers don't
/// truncate the excerpt.
fn mention_excerpt(text: &str, hit: &Range<usize>) -> String {
    let mut begin = 0usize;
    let mut prev: Option<char> = None;
    for (i, c) in text.char_indices() {
        if i >= hit.start {
            break;
        }
        if is_sentence_break(c, prev) {
            begin = i + c.len_utf8();
        }
        prev = Some(c);
    }

    let mut finish = text.len();
    let mut prev_tail: Option<char> = None;
    for (i, c) in text[hit.end..].char_indices() {
        if is_sentence_break(c, prev_tail) {
            finish = hit.end + i + c.len_utf8();
            break;
        }
        prev_tail = Some(c);
    }

    truncate_chars(text[begin..finish].trim(), EXCERPT_MAX_CHARS)
}

fn is_sentence_break(c: char, prev: Option<char>) -> bool {
    match c {
        '!' | '?' | '\n' => true,
        '.' => !prev.is_some_and(|p| p.is_ascii_digit()),
        _ => false,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max).collect();
    format!("{}…", cut.trim_end())
}
