//! Color spectrum: maps a coverage percentage onto a color band.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BadgeError, Result};

/// One point of the spectrum: coverage at or above `threshold` (and below the
/// next band's threshold) is drawn in `color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBand {
    pub color: String,
    pub threshold: f64,
}

impl ColorBand {
    pub fn new(color: impl Into<String>, threshold: f64) -> Self {
        Self {
            color: color.into(),
            threshold,
        }
    }
}

/// Parses the `<color>=<threshold>` form used on the command line.
impl FromStr for ColorBand {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self> {
        let (color, threshold) = s
            .split_once('=')
            .ok_or_else(|| BadgeError::InvalidBand(s.to_string()))?;
        let color = color.trim();
        if color.is_empty() {
            return Err(BadgeError::InvalidBand(s.to_string()));
        }
        let threshold = threshold
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| BadgeError::InvalidBand(s.to_string()))?;
        if !threshold.is_finite() {
            return Err(BadgeError::InvalidBand(s.to_string()));
        }
        Ok(ColorBand::new(color, threshold))
    }
}

/// Bands sorted ascending by threshold.
///
/// Input order is irrelevant: construction always re-sorts, and the sort is
/// stable so equal thresholds keep the order they were given in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<ColorBand>")]
pub struct Spectrum {
    bands: Vec<ColorBand>,
}

impl Spectrum {
    pub fn new(mut bands: Vec<ColorBand>) -> Self {
        bands.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        Self { bands }
    }

    pub fn bands(&self) -> &[ColorBand] {
        &self.bands
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Resolve `percentage` to the color of the highest band whose threshold
    /// is `<= percentage`. Band boundaries are lower-inclusive.
    ///
    /// When several bands share a threshold the last one given wins.
    pub fn resolve_color(&self, percentage: f64) -> Result<&str> {
        let lowest = self.bands.first().ok_or(BadgeError::EmptySpectrum)?;
        self.bands
            .iter()
            .rev()
            .find(|band| band.threshold <= percentage)
            .map(|band| band.color.as_str())
            .ok_or(BadgeError::NoMatchingBand {
                percentage,
                lowest: lowest.threshold,
            })
    }
}

/// Rejects thresholds that are NaN or infinite, which have no place in the
/// ordering.
impl TryFrom<Vec<ColorBand>> for Spectrum {
    type Error = BadgeError;

    fn try_from(bands: Vec<ColorBand>) -> Result<Self> {
        if let Some(band) = bands.iter().find(|band| !band.threshold.is_finite()) {
            return Err(BadgeError::InvalidBand(format!(
                "{}={}",
                band.color, band.threshold
            )));
        }
        Ok(Spectrum::new(bands))
    }
}

/// red from 0, yellow from 50, green from 95.
impl Default for Spectrum {
    fn default() -> Self {
        Spectrum::new(vec![
            ColorBand::new("red", 0.0),
            ColorBand::new("yellow", 50.0),
            ColorBand::new("green", 95.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::Strategy;

    fn traffic_light() -> Vec<ColorBand> {
        vec![
            ColorBand::new("red", 0.0),
            ColorBand::new("yellow", 50.0),
            ColorBand::new("green", 95.0),
        ]
    }

    #[test]
    fn boundaries_are_lower_inclusive() {
        let spectrum = Spectrum::new(traffic_light());
        assert_eq!(spectrum.resolve_color(0.0).unwrap(), "red");
        assert_eq!(spectrum.resolve_color(49.9).unwrap(), "red");
        assert_eq!(spectrum.resolve_color(50.0).unwrap(), "yellow");
        assert_eq!(spectrum.resolve_color(85.0).unwrap(), "yellow");
        assert_eq!(spectrum.resolve_color(94.99).unwrap(), "yellow");
        assert_eq!(spectrum.resolve_color(95.0).unwrap(), "green");
        assert_eq!(spectrum.resolve_color(100.0).unwrap(), "green");
    }

    #[test]
    fn unsorted_input_is_sorted() {
        let mut bands = traffic_light();
        bands.reverse();
        let spectrum = Spectrum::new(bands);
        let thresholds: Vec<f64> = spectrum.bands().iter().map(|b| b.threshold).collect();
        assert_eq!(thresholds, vec![0.0, 50.0, 95.0]);
    }

    #[test]
    fn empty_spectrum_fails() {
        let spectrum = Spectrum::new(Vec::new());
        assert_eq!(spectrum.resolve_color(50.0), Err(BadgeError::EmptySpectrum));
    }

    #[test]
    fn below_every_band_fails() {
        let spectrum = Spectrum::new(vec![ColorBand::new("blue", 80.0)]);
        assert_eq!(
            spectrum.resolve_color(79.9),
            Err(BadgeError::NoMatchingBand {
                percentage: 79.9,
                lowest: 80.0
            })
        );
        assert_eq!(spectrum.resolve_color(85.0).unwrap(), "blue");
    }

    #[test]
    fn equal_thresholds_prefer_last_given() {
        let spectrum = Spectrum::new(vec![
            ColorBand::new("red", 0.0),
            ColorBand::new("orange", 50.0),
            ColorBand::new("yellow", 50.0),
        ]);
        assert_eq!(spectrum.resolve_color(60.0).unwrap(), "yellow");
    }

    #[test]
    fn default_is_traffic_light() {
        assert_eq!(Spectrum::default().bands(), traffic_light().as_slice());
    }

    #[test]
    fn band_from_str_accepts_percent_suffix() {
        assert_eq!(
            "green=95%".parse::<ColorBand>().unwrap(),
            ColorBand::new("green", 95.0)
        );
        assert_eq!(
            " brightgreen = 99.5 ".parse::<ColorBand>().unwrap(),
            ColorBand::new("brightgreen", 99.5)
        );
    }

    #[test]
    fn band_from_str_rejects_garbage() {
        for input in [
            "green", "=50", "green=high", "", "green=NaN", "green=inf", "red=-inf%",
        ] {
            assert!(matches!(
                input.parse::<ColorBand>(),
                Err(BadgeError::InvalidBand(_))
            ));
        }
    }

    #[test]
    fn deserializing_non_finite_threshold_fails() {
        let err = serde_json::from_str::<Spectrum>(r#"[{"color":"green","threshold":1e999}]"#);
        assert!(err.is_err());
        assert_eq!(
            Spectrum::try_from(vec![ColorBand::new("green", f64::NAN)]),
            Err(BadgeError::InvalidBand("green=NaN".to_string()))
        );
    }

    #[test]
    fn deserializes_and_sorts() {
        let spectrum: Spectrum = serde_json::from_str(
            r#"[{"color":"green","threshold":95},{"color":"red","threshold":0}]"#,
        )
        .unwrap();
        assert_eq!(spectrum.bands()[0].color, "red");
    }

    // Any permutation of the bands resolves every percentage to the same color.
    #[test]
    fn resolution_ignores_band_order() {
        let bands = traffic_light();
        let permuted = proptest::strategy::Just(bands.clone()).prop_shuffle();
        proptest::proptest!(|(shuffled in permuted, pct in 0.0f64..=100.0)| {
            let reference = Spectrum::new(bands.clone());
            let candidate = Spectrum::new(shuffled);
            proptest::prop_assert_eq!(
                reference.resolve_color(pct).unwrap(),
                candidate.resolve_color(pct).unwrap()
            );
        })
    }

    // The resolved band is never above the percentage, and the next band up is.
    #[test]
    fn resolved_band_brackets_percentage() {
        proptest::proptest!(|(pct in 0.0f64..=100.0)| {
            let spectrum = Spectrum::new(traffic_light());
            let color = spectrum.resolve_color(pct).unwrap();
            let idx = spectrum.bands().iter().position(|b| b.color == color).unwrap();
            proptest::prop_assert!(spectrum.bands()[idx].threshold <= pct);
            if let Some(next) = spectrum.bands().get(idx + 1) {
                proptest::prop_assert!(next.threshold > pct);
            }
        })
    }
}
