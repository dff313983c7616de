use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use kover_badge::{BadgeConfig, BadgeStyle, ColorBand, GitAction, ReportFormat, Spectrum};
use url::Url;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file [default: kover-badge.toml, when present]
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Put the coverage badge into the document and run the git action
    Apply {
        #[command(flatten)]
        badge: BadgeArgs,

        /// Document holding the badge [default: README.md]
        #[arg(long, value_name = "FILE")]
        document: Option<PathBuf>,

        /// none, stage, commit-document, commit-all or new-branch:<name>
        #[arg(long, value_name = "ACTION")]
        git_action: Option<GitAction>,

        /// Directory whose git repository the git action uses [default: the document's directory]
        #[arg(long, value_name = "DIR")]
        git_repository: Option<PathBuf>,

        /// Treat this run as CI (skips git) instead of reading $CI
        #[arg(long, value_name = "BOOL")]
        ci: Option<bool>,

        /// Write nothing; exit with status 1 if the document would change
        #[arg(long)]
        check: bool,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Print the badge snippet for a report
    Render {
        #[command(flatten)]
        badge: BadgeArgs,
    },
}

#[derive(Args, Debug)]
pub struct BadgeArgs {
    /// Coverage report to read the percentage from
    #[arg(long, value_name = "FILE")]
    pub report: PathBuf,

    /// Report format: log (kover) or lcov
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Words in front of `coverage: NN%` in a log report
    #[arg(long, value_name = "TEXT")]
    pub descriptor: Option<String>,

    #[arg(long)]
    pub label: Option<String>,

    /// flat, flat-square, plastic, for-the-badge or social
    #[arg(long)]
    pub style: Option<BadgeStyle>,

    /// shields.io logo name
    #[arg(long)]
    pub logo: Option<String>,

    /// Color band as <color>=<threshold>; repeat to build a spectrum
    #[arg(long = "band", value_name = "COLOR=THRESHOLD")]
    pub bands: Vec<ColorBand>,

    /// HTML report directory; the badge links to its index.html
    #[arg(long, value_name = "DIR", conflicts_with = "link")]
    pub html_report: Option<PathBuf>,

    /// URL the badge links to
    #[arg(long, value_name = "URL")]
    pub link: Option<String>,
}

impl BadgeArgs {
    /// Command-line values take precedence over the file configuration.
    pub fn apply_to(&self, config: &mut BadgeConfig) {
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(descriptor) = &self.descriptor {
            config.descriptor = descriptor.clone();
        }
        if let Some(label) = &self.label {
            config.label = label.clone();
        }
        if let Some(style) = self.style {
            config.style = style;
        }
        if let Some(logo) = &self.logo {
            config.logo = logo.clone();
        }
        if !self.bands.is_empty() {
            config.spectrum = Spectrum::new(self.bands.clone());
        }
    }

    /// Link target for the badge, if one was given.
    pub fn link_target(&self) -> anyhow::Result<Option<String>> {
        if let Some(link) = &self.link {
            return Ok(Some(link.clone()));
        }
        self.html_report
            .as_deref()
            .map(html_report_url)
            .transpose()
    }
}

/// `file://` URL of `<dir>/index.html`.
pub fn html_report_url(dir: &Path) -> anyhow::Result<String> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("HTML report directory {} not found", dir.display()))?;
    let index = dir.join("index.html");
    Url::from_file_path(&index)
        .map(|url| url.to_string())
        .map_err(|()| anyhow::anyhow!("cannot express {} as a URL", index.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_apply_with_overrides() {
        let cli = Cli::try_parse_from([
            "kover-badge",
            "-vv",
            "apply",
            "--report",
            "build/kover.log",
            "--style",
            "FOR_THE_BADGE",
            "--band",
            "green=95",
            "--band",
            "red=0",
            "--git-action",
            "new-branch:badge",
            "--ci",
            "false",
            "--git-repository",
            "..",
        ])
        .expect("parse");
        assert_eq!(cli.verbose, 2);
        let Command::Apply {
            badge,
            git_action,
            git_repository,
            ci,
            ..
        } = cli.command
        else {
            panic!("expected apply");
        };
        assert_eq!(
            git_action,
            Some(GitAction::CommitAllToNewBranch {
                branch: "badge".to_string()
            })
        );
        assert_eq!(ci, Some(false));
        assert_eq!(git_repository, Some(PathBuf::from("..")));

        let mut config = BadgeConfig::default();
        badge.apply_to(&mut config);
        assert_eq!(config.style, BadgeStyle::ForTheBadge);
        assert_eq!(config.spectrum.bands()[0], ColorBand::new("red", 0.0));
        assert_eq!(config.label, "koverage");
    }

    #[test]
    fn rejects_bad_band_and_style() {
        assert!(Cli::try_parse_from(["kover-badge", "render", "--report", "r", "--band", "green"]).is_err());
        assert!(Cli::try_parse_from(["kover-badge", "render", "--report", "r", "--style", "round"]).is_err());
    }

    #[test]
    fn link_and_html_report_conflict() {
        assert!(
            Cli::try_parse_from([
                "kover-badge",
                "render",
                "--report",
                "r",
                "--link",
                "https://x",
                "--html-report",
                "build/html",
            ])
            .is_err()
        );
    }

    #[test]
    fn html_report_becomes_file_url() {
        let dir = TempDir::new().expect("tmp dir");
        let url = html_report_url(dir.path()).expect("url");
        assert!(url.starts_with("file:///"), "{url}");
        assert!(url.ends_with("/index.html"), "{url}");
        assert!(html_report_url(&dir.path().join("missing")).is_err());
    }
}
