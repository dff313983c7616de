//! Shields.io badge styles.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BadgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BadgeStyle {
    #[default]
    Flat,
    FlatSquare,
    Plastic,
    ForTheBadge,
    Social,
}

impl BadgeStyle {
    pub const ALL: [BadgeStyle; 5] = [
        BadgeStyle::Flat,
        BadgeStyle::FlatSquare,
        BadgeStyle::Plastic,
        BadgeStyle::ForTheBadge,
        BadgeStyle::Social,
    ];

    /// The `style=` query value shields.io expects.
    pub fn token(self) -> &'static str {
        match self {
            BadgeStyle::Flat => "flat",
            BadgeStyle::FlatSquare => "flat-square",
            BadgeStyle::Plastic => "plastic",
            BadgeStyle::ForTheBadge => "for-the-badge",
            BadgeStyle::Social => "social",
        }
    }

    /// Look a style up by name, ignoring case, dashes, underscores and spaces.
    ///
    /// `ForTheBadge`, `for-the-badge` and `FOR_THE_BADGE` are the same style.
    pub fn from_name(name: &str) -> Option<Self> {
        let canonical: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|style| style.token().replace('-', "") == canonical)
    }
}

impl fmt::Display for BadgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for BadgeStyle {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BadgeStyle::from_name(s).ok_or_else(|| BadgeError::UnknownStyle(s.to_string()))
    }
}

impl Serialize for BadgeStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for BadgeStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
