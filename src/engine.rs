//! Report in, patched document out.

use serde::Serialize;
use tracing::debug;

use crate::{
    badge::Badge,
    config::BadgeConfig,
    error::{BadgeError, Result},
    patch::patch,
    report::extract_percentage,
};

/// A rendered badge, before it is placed anywhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBadge {
    pub percentage: f64,
    pub color: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeOutcome {
    #[serde(skip)]
    pub document: String,
    pub changed: bool,
    pub color: String,
    pub percentage: f64,
    pub snippet: String,
    pub previous: Option<String>,
}

/// Runs parse, color, render and patch in that order for one configuration.
///
/// Stateless: every call starts from the report and document it is given, and
/// the first failing stage aborts the run before the document is touched.
#[derive(Debug, Clone, Copy)]
pub struct BadgeEngine<'a> {
    config: &'a BadgeConfig,
}

impl<'a> BadgeEngine<'a> {
    pub fn new(config: &'a BadgeConfig) -> Self {
        Self { config }
    }

    /// Produce the badge for `report` without touching any document.
    pub fn render(&self, report: &str, link: Option<&str>) -> Result<RenderedBadge> {
        let config = self.config;
        if config.spectrum.is_empty() {
            return Err(BadgeError::EmptySpectrum);
        }
        let percentage = extract_percentage(report, config.format, &config.descriptor)?;
        let color = config.spectrum.resolve_color(percentage)?;
        debug!(percentage, color, "resolved coverage color");
        let snippet = Badge {
            percentage,
            color,
            label: &config.label,
            logo: &config.logo,
            style: config.style,
            link: link.or(config.link.as_deref()),
        }
        .render();
        Ok(RenderedBadge {
            percentage,
            color: color.to_string(),
            snippet,
        })
    }

    /// Produce the updated `document` for `report`.
    pub fn generate(
        &self,
        report: &str,
        document: &str,
        link: Option<&str>,
    ) -> Result<BadgeOutcome> {
        let badge = self.render(report, link)?;
        let patched = patch(document, &badge.snippet);
        Ok(BadgeOutcome {
            document: patched.text,
            changed: patched.changed,
            color: badge.color,
            percentage: badge.percentage,
            snippet: badge.snippet,
            previous: patched.previous,
        })
    }
}

/// One-shot form of [`BadgeEngine::generate`].
pub fn generate(
    report: &str,
    document: &str,
    config: &BadgeConfig,
    link: Option<&str>,
) -> Result<BadgeOutcome> {
    BadgeEngine::new(config).generate(report, document, link)
}
