//! Staging and committing the patched document.
//!
//! Shells out to the `git` binary. `GIT_DIR` and `GIT_WORK_TREE` are stripped
//! so the explicit `-C` path always decides which repository is touched.

use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    str::FromStr,
};

use anyhow::{Context, bail};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::error::BadgeError;

/// What to do with the document once the badge changed it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GitAction {
    None,
    /// `git add` the document only.
    #[default]
    Stage,
    /// Stage and commit just the document, leaving other changes alone.
    CommitDocumentOnly,
    /// Stage everything and commit it.
    CommitAll,
    /// Stage everything, switch to a new branch, and commit there.
    CommitAllToNewBranch { branch: String },
}

impl FromStr for GitAction {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || {
            BadgeError::Config(format!(
                "invalid git action: {s} (expected none, stage, commit-document, commit-all or new-branch:<name>)"
            ))
        };
        let (kind, branch) = match s.split_once(':') {
            Some((kind, branch)) => (kind, Some(branch.trim())),
            None => (s, None),
        };
        let kind: String = kind
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match (kind.as_str(), branch) {
            ("none" | "dontcommit", None) => Ok(GitAction::None),
            ("stage" | "add", None) => Ok(GitAction::Stage),
            ("commitdocument" | "commitreadme", None) => Ok(GitAction::CommitDocumentOnly),
            ("commitall" | "commit", None) => Ok(GitAction::CommitAll),
            ("newbranch" | "committonewbranch", Some(branch)) if !branch.is_empty() => {
                Ok(GitAction::CommitAllToNewBranch {
                    branch: branch.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for GitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitAction::None => f.write_str("none"),
            GitAction::Stage => f.write_str("stage"),
            GitAction::CommitDocumentOnly => f.write_str("commit-document"),
            GitAction::CommitAll => f.write_str("commit-all"),
            GitAction::CommitAllToNewBranch { branch } => write!(f, "new-branch:{branch}"),
        }
    }
}

impl<'de> Deserialize<'de> for GitAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether the git step should run at all.
///
/// Nothing happens for an unchanged document, for [`GitAction::None`], or when
/// running under CI.
pub fn should_run(action: &GitAction, changed: bool, is_ci: bool) -> bool {
    changed && !is_ci && *action != GitAction::None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOutcome {
    /// [`GitAction::None`] was configured.
    Skipped,
    /// No repository found around the document.
    NoRepository,
    Staged,
    Committed { branch: Option<String> },
}

fn git_cmd() -> Command {
    let mut cmd = Command::new("git");
    cmd.env_remove("GIT_DIR").env_remove("GIT_WORK_TREE");
    cmd
}

pub fn git_available() -> bool {
    git_cmd()
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Top level of the work tree containing `path`, if any.
pub fn repo_root(path: &Path) -> Option<PathBuf> {
    let output = git_cmd()
        .arg("-C")
        .arg(path)
        .args(["rev-parse", "--show-toplevel"])
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!root.is_empty()).then(|| PathBuf::from(root))
}

fn run(root: &Path, args: &[&str]) -> anyhow::Result<String> {
    debug!(?args, root = %root.display(), "running git");
    let output = git_cmd()
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .with_context(|| format!("failed to spawn git {}", args.join(" ")))?;
    if !output.status.success() {
        bail!(
            "git {} failed ({}): {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Path of `document` relative to `root`, as git expects for a pathspec.
fn pathspec(root: &Path, document: &Path) -> anyhow::Result<String> {
    let document = document
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", document.display()))?;
    let root = root
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", root.display()))?;
    let relative = document.strip_prefix(&root).with_context(|| {
        format!(
            "{} is outside the repository at {}",
            document.display(),
            root.display()
        )
    })?;
    Ok(relative.to_string_lossy().replace('\\', "/"))
}

/// Carry out `action` for `document` inside the repository around `workdir`.
///
/// `workdir` picks the repository. Staging or committing only the document
/// requires it to live in that repository; the commit-everything actions do
/// not look at `document`.
///
/// A missing repository is not an error: it is logged and reported as
/// [`GitOutcome::NoRepository`].
pub fn apply(
    action: &GitAction,
    workdir: &Path,
    document: &Path,
    message: &str,
) -> anyhow::Result<GitOutcome> {
    if *action == GitAction::None {
        return Ok(GitOutcome::Skipped);
    }
    let Some(root) = repo_root(workdir) else {
        warn!(dir = %workdir.display(), "no git repository found, skipping {action}");
        return Ok(GitOutcome::NoRepository);
    };
    match action {
        GitAction::None => Ok(GitOutcome::Skipped),
        GitAction::Stage => {
            let spec = pathspec(&root, document)?;
            run(&root, &["add", "--", &spec])?;
            info!(path = %spec, "staged document");
            Ok(GitOutcome::Staged)
        }
        GitAction::CommitDocumentOnly => {
            let spec = pathspec(&root, document)?;
            run(&root, &["add", "--", &spec])?;
            run(&root, &["commit", "-m", message, "--only", "--", &spec])?;
            info!(path = %spec, "committed document");
            Ok(GitOutcome::Committed { branch: None })
        }
        GitAction::CommitAll => {
            run(&root, &["add", "."])?;
            run(&root, &["commit", "-m", message])?;
            info!("committed all changes");
            Ok(GitOutcome::Committed { branch: None })
        }
        GitAction::CommitAllToNewBranch { branch } => {
            run(&root, &["add", "."])?;
            run(&root, &["checkout", "-b", branch])?;
            run(&root, &["commit", "-m", message])?;
            info!(%branch, "committed all changes to new branch");
            Ok(GitOutcome::Committed {
                branch: Some(branch.clone()),
            })
        }
    }
}
