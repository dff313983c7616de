//! Error types for badge generation.

/// Failures raised by the badge pipeline.
///
/// Every variant is fatal to a single generation run: the document is never
/// touched once one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BadgeError {
    #[error("no coverage percentage found in report")]
    CoverageNotFound,
    #[error("color spectrum has no bands")]
    EmptySpectrum,
    #[error("coverage {percentage}% is below the lowest band threshold {lowest}")]
    NoMatchingBand { percentage: f64, lowest: f64 },
    #[error("unknown badge style: {0}")]
    UnknownStyle(String),
    #[error("invalid color band `{0}`, expected <color>=<threshold>")]
    InvalidBand(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BadgeError>;
