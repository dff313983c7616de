//! Badge configuration and its TOML file form.
//!
//! ```toml
//! label = "koverage"
//! style = "for-the-badge"
//! document = "README.md"
//! git_action = "commit-document"
//! git_repository = "."
//!
//! [[spectrum]]
//! color = "red"
//! threshold = 0
//!
//! [[spectrum]]
//! color = "green"
//! threshold = 90
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::{
    badge::DEFAULT_LOGO,
    error::{BadgeError, Result},
    git::GitAction,
    report::{DEFAULT_DESCRIPTOR, ReportFormat},
    spectrum::Spectrum,
    style::BadgeStyle,
};

pub const DEFAULT_CONFIG_FILE: &str = "kover-badge.toml";
pub const DEFAULT_LABEL: &str = "koverage";
pub const DEFAULT_DOCUMENT: &str = "README.md";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BadgeConfig {
    pub label: String,
    pub style: BadgeStyle,
    pub logo: String,
    pub spectrum: Spectrum,
    /// The file the badge lives in.
    pub document: PathBuf,
    /// Fixed link target; a `--html-report` given on the command line wins.
    pub link: Option<String>,
    /// Words in front of `coverage: NN%` in a log report.
    pub descriptor: String,
    pub format: ReportFormat,
    pub git_action: GitAction,
    /// Directory whose repository the git step runs in; defaults to the
    /// document's directory.
    pub git_repository: Option<PathBuf>,
    /// Template with `{label}` and `{document}` placeholders.
    pub commit_message: Option<String>,
    /// Forces CI detection on or off.
    pub ci: Option<bool>,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            style: BadgeStyle::default(),
            logo: DEFAULT_LOGO.to_string(),
            spectrum: Spectrum::default(),
            document: PathBuf::from(DEFAULT_DOCUMENT),
            link: None,
            descriptor: DEFAULT_DESCRIPTOR.to_string(),
            format: ReportFormat::default(),
            git_action: GitAction::default(),
            git_repository: None,
            commit_message: None,
            ci: None,
        }
    }
}

impl BadgeConfig {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| BadgeError::Config(e.to_string()))
    }

    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] in the
    /// current directory when it exists. A path that was asked for explicitly
    /// must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&source)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Directory the git step looks for a repository from.
    pub fn git_workdir(&self) -> &Path {
        self.git_repository
            .as_deref()
            .or_else(|| self.document.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }

    /// Commit message for the git step.
    pub fn commit_message(&self) -> String {
        let document = self
            .document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.document.display().to_string());
        match &self.commit_message {
            Some(template) => template
                .replace("{label}", &self.label)
                .replace("{document}", &document),
            None => format!("Added {} Badge to {document}", self.label),
        }
    }

    /// Whether this run happens under CI, using `env` to read variables
    /// unless the configuration forces an answer.
    pub fn is_ci<F>(&self, env: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        self.ci.unwrap_or_else(|| detect_ci(env))
    }
}

/// CI is signalled by a `CI` variable whose value is `true` in any case.
pub fn detect_ci<F>(env: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    env("CI")
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Reads variables from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::ColorBand;

    #[test]
    fn defaults_match_kover_conventions() {
        let config = BadgeConfig::default();
        assert_eq!(config.label, "koverage");
        assert_eq!(config.style, BadgeStyle::Flat);
        assert_eq!(config.logo, "kotlin");
        assert_eq!(config.document, PathBuf::from("README.md"));
        assert_eq!(config.git_action, GitAction::Stage);
        assert_eq!(config.format, ReportFormat::Log);
        assert_eq!(config.spectrum, Spectrum::default());
    }

    #[test]
    fn parses_full_file() {
        let config = BadgeConfig::from_toml(
            r#"
label = "coverage"
style = "FOR_THE_BADGE"
logo = "rust"
document = "docs/INDEX.md"
descriptor = "total line"
format = "lcov"
git_action = "new-branch:badges"
commit_message = "chore: {label} badge in {document}"
ci = false

[[spectrum]]
color = "green"
threshold = 90

[[spectrum]]
color = "red"
threshold = 0.0
"#,
        )
        .expect("valid config");
        assert_eq!(config.style, BadgeStyle::ForTheBadge);
        assert_eq!(config.format, ReportFormat::Lcov);
        assert_eq!(
            config.git_action,
            GitAction::CommitAllToNewBranch {
                branch: "badges".to_string()
            }
        );
        assert_eq!(
            config.spectrum.bands(),
            &[ColorBand::new("red", 0.0), ColorBand::new("green", 90.0)]
        );
        assert_eq!(config.commit_message(), "chore: coverage badge in INDEX.md");
        assert_eq!(config.ci, Some(false));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = BadgeConfig::from_toml("label = \"cov\"\n").expect("valid config");
        assert_eq!(config.label, "cov");
        assert_eq!(config.spectrum, Spectrum::default());
    }

    #[test]
    fn rejects_unknown_keys_and_styles() {
        assert!(matches!(
            BadgeConfig::from_toml("colour = \"red\""),
            Err(BadgeError::Config(_))
        ));
        let err = BadgeConfig::from_toml("style = \"rounded\"").unwrap_err();
        assert!(err.to_string().contains("unknown badge style: rounded"));
        let err = BadgeConfig::from_toml("[[spectrum]]\ncolor = \"green\"\nthreshold = nan\n")
            .unwrap_err();
        assert!(err.to_string().contains("green=NaN"), "{err}");
    }

    #[test]
    fn git_workdir_prefers_chosen_repository() {
        assert_eq!(BadgeConfig::default().git_workdir(), Path::new("."));
        let config = BadgeConfig::from_toml("document = \"docs/README.md\"\n").expect("valid");
        assert_eq!(config.git_workdir(), Path::new("docs"));
        let config = BadgeConfig::from_toml(
            "document = \"docs/README.md\"\ngit_repository = \"../monorepo\"\n",
        )
        .expect("valid");
        assert_eq!(config.git_workdir(), Path::new("../monorepo"));
    }

    #[test]
    fn default_commit_message_names_document() {
        assert_eq!(
            BadgeConfig::default().commit_message(),
            "Added koverage Badge to README.md"
        );
    }

    #[test]
    fn ci_detection_reads_injected_env() {
        assert!(detect_ci(|name| (name == "CI").then(|| "true".to_string())));
        assert!(detect_ci(|_| Some("TRUE".to_string())));
        assert!(!detect_ci(|_| Some("1".to_string())));
        assert!(!detect_ci(|_| None));
    }

    #[test]
    fn ci_override_wins() {
        let config = BadgeConfig {
            ci: Some(false),
            ..BadgeConfig::default()
        };
        assert!(!config.is_ci(|_| Some("true".to_string())));
        let config = BadgeConfig {
            ci: Some(true),
            ..BadgeConfig::default()
        };
        assert!(config.is_ci(|_| None));
    }

    #[test]
    fn load_without_default_file_uses_defaults() {
        let dir = tempfile::TempDir::new().expect("tmp dir");
        let missing = dir.path().join("nope.toml");
        assert!(BadgeConfig::load(Some(&missing)).is_err());

        let path = dir.path().join("badge.toml");
        std::fs::write(&path, "label = \"from-file\"").expect("write config");
        assert_eq!(
            BadgeConfig::load(Some(&path)).expect("load").label,
            "from-file"
        );
    }
}
