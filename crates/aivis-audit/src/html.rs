//! Minimal HTML-to-visible-text reduction for description measurement.
//!
//! Scoring only needs to know how much human-readable text a description
//! carries, so this strips tags, decodes the handful of entities storefront
//! editors actually emit, and collapses whitespace. It is deliberately not
//! a general HTML parser.

/// Reduce an HTML fragment to its visible text.
#[must_use]
pub(crate) fn visible_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                if in_tag {
                    in_tag = false;
                    // Tag boundaries separate words ("<p>a</p><p>b</p>").
                    out.push(' ');
                } else {
                    out.push('>');
                }
            }
            _ if in_tag => {}
            _ => out.push(c),
        }
    }

    let decoded = decode_entities(&out);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible character count of an optional HTML description.
#[must_use]
pub(crate) fn visible_len(html: Option<&str>) -> usize {
    html.map(visible_text)
        .map_or(0, |text| text.chars().count())
}

/// Decode the common named entities plus `&#39;`. Unknown entities pass
/// through untouched.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
