//! Coverage badges for project READMEs.
//!
//! Reads the percentage out of a coverage report, picks a color from a
//! threshold spectrum, renders a shields.io badge and puts it into a document,
//! replacing the badge from the previous run when there is one.

pub mod badge;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod git;
pub mod patch;
pub mod report;
pub mod spectrum;
pub mod style;

pub use badge::{Badge, BadgeMatch, LineScan, find_badge, render};
pub use config::BadgeConfig;
pub use engine::{BadgeEngine, BadgeOutcome, RenderedBadge, generate};
pub use error::{BadgeError, Result};
pub use git::GitAction;
pub use patch::{Patch, patch};
pub use report::{CoverageParser, ReportFormat, parse_percentage};
pub use spectrum::{ColorBand, Spectrum};
pub use style::BadgeStyle;
