//! Rendering and detection of shields.io badge snippets.
//!
//! A badge snippet has exactly one shape:
//!
//! ```text
//! <a href="<link>">![<label>](https://img.shields.io/badge/<percentage>-<color>?logo=<logo>&label=<label>&style=<style>)</a>
//! ```
//!
//! with the `<a>` wrapper omitted when there is no link target. [`render`]
//! produces it and [`find_badge`] recognises it, both from the constants in
//! this module, so a rendered snippet is always found again.
//!
//! A document can also reserve the badge position with a seed line such as
//! `<a>![koverage](place_holder)</a>`; [`find_badge`] reports it as
//! [`LineScan::Placeholder`] so the first run replaces it in place.

use std::ops::Range;

use once_cell::sync::Lazy;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::Regex;

use crate::style::BadgeStyle;

pub const SHIELDS_BADGE_URL: &str = "https://img.shields.io/badge/";
pub const DEFAULT_LOGO: &str = "kotlin";
/// Image target of a seed line that marks where the badge should go.
pub const PLACEHOLDER_TARGET: &str = "place_holder";

// RFC 3986 unreserved characters stay readable, everything else is escaped.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

static BADGE_RE: Lazy<Regex> = Lazy::new(|| {
    let styles = BadgeStyle::ALL
        .iter()
        .map(|style| regex::escape(style.token()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        concat!(
            r#"(?P<open><a href="(?P<href>[^"]*)">)?"#,
            r"!\[(?P<alt>[^\]\r\n]*)\]\(",
            "{url}",
            r"(?P<percentage>\d+(?:\.\d+)?)-(?P<color>[^?\s)]+)",
            r"\?logo=(?P<logo>[^&\s)]*)&label=(?P<label>[^&\s)]*)&style=(?P<style>{styles})\)",
            r"(?P<close></a>)?",
        ),
        url = regex::escape(SHIELDS_BADGE_URL),
        styles = styles,
    ))
    .unwrap()
});

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?P<open><a(?:\s[^>]*)?>)?!\[[^\]\r\n]*\]\({}\)(?P<close></a>)?",
        regex::escape(PLACEHOLDER_TARGET)
    ))
    .unwrap()
});

/// Everything needed to draw one badge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Badge<'a> {
    pub percentage: f64,
    pub color: &'a str,
    pub label: &'a str,
    pub logo: &'a str,
    pub style: BadgeStyle,
    pub link: Option<&'a str>,
}

impl Badge<'_> {
    pub fn render(&self) -> String {
        let image = format!(
            "![{alt}]({url}{percentage}-{color}?logo={logo}&label={label}&style={style})",
            alt = alt_text(self.label),
            url = SHIELDS_BADGE_URL,
            percentage = format_percentage(self.percentage),
            color = utf8_percent_encode(self.color, COMPONENT_ENCODE_SET),
            logo = utf8_percent_encode(self.logo, COMPONENT_ENCODE_SET),
            label = utf8_percent_encode(self.label, COMPONENT_ENCODE_SET),
            style = self.style.token(),
        );
        match self.link {
            Some(link) => format!("<a href=\"{}\">{image}</a>", link.replace('"', "&quot;")),
            None => image,
        }
    }
}

/// Render a badge with the default logo.
pub fn render(
    percentage: f64,
    color: &str,
    label: &str,
    style: BadgeStyle,
    link: Option<&str>,
) -> String {
    Badge {
        percentage,
        color,
        label,
        logo: DEFAULT_LOGO,
        style,
        link,
    }
    .render()
}

/// Shortest decimal form of `percentage` that always keeps a fractional
/// digit: `85` renders as `85.0`, `85.25` as `85.25`.
pub fn format_percentage(percentage: f64) -> String {
    let digits = percentage.to_string();
    if digits.contains('.') || !percentage.is_finite() {
        digits
    } else {
        format!("{digits}.0")
    }
}

fn alt_text(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .map(|c| if matches!(c, '\r' | '\n') { ' ' } else { c })
        .collect()
}

/// A well-formed badge found inside a line.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeMatch {
    /// Byte range of the badge within the scanned line.
    pub range: Range<usize>,
    pub href: Option<String>,
    pub percentage: String,
    pub color: String,
    pub label: String,
    pub style: BadgeStyle,
}

/// Outcome of scanning one line for a badge.
#[derive(Debug, Clone, PartialEq)]
pub enum LineScan {
    Badge(BadgeMatch),
    /// A seed line reserving the badge position; the range covers the seed.
    Placeholder(Range<usize>),
    /// Mentions the shields.io badge URL but not in a shape we produce.
    Malformed,
    Absent,
}

/// Scan a single line (without its terminator) for a badge of any label,
/// color or style.
pub fn find_badge(line: &str) -> LineScan {
    for caps in BADGE_RE.captures_iter(line) {
        // A half-wrapped badge would leave a dangling tag behind on replace.
        if caps.name("open").is_some() != caps.name("close").is_some() {
            continue;
        }
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(style) = caps
            .name("style")
            .and_then(|m| BadgeStyle::from_name(m.as_str()))
        else {
            continue;
        };
        let text = |name: &str| {
            caps.name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };
        return LineScan::Badge(BadgeMatch {
            range: whole.range(),
            href: caps.name("href").map(|m| m.as_str().to_string()),
            percentage: text("percentage"),
            color: text("color"),
            label: text("label"),
            style,
        });
    }
    if let Some(seed) = PLACEHOLDER_RE
        .captures_iter(line)
        .find(|caps| caps.name("open").is_some() == caps.name("close").is_some())
        .and_then(|caps| caps.get(0))
    {
        return LineScan::Placeholder(seed.range());
    }
    if line.contains(SHIELDS_BADGE_URL) {
        LineScan::Malformed
    } else {
        LineScan::Absent
    }
}
