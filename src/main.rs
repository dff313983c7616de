use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use kover_badge::{
    BadgeConfig, BadgeEngine,
    badge::format_percentage,
    config::process_env,
    document::{read_document, write_document},
    git::{self, GitOutcome},
};
use owo_colors::{OwoColorize, Stream};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::cli::{BadgeArgs, Cli, Command};

mod cli;

fn main() -> anyhow::Result<ExitCode> {
    let args = Cli::parse();
    init_tracing(args.verbose);
    let config = BadgeConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Render { badge } => {
            let (config, link) = merge(config, &badge)?;
            let report = read_report(&badge)?;
            let rendered = BadgeEngine::new(&config).render(&report, link.as_deref())?;
            println!("{}", rendered.snippet);
            Ok(ExitCode::SUCCESS)
        }
        Command::Apply {
            badge,
            document,
            git_action,
            git_repository,
            ci,
            check,
            json,
        } => {
            let (mut config, link) = merge(config, &badge)?;
            if let Some(document) = document {
                config.document = document;
            }
            if let Some(action) = git_action {
                config.git_action = action;
            }
            if git_repository.is_some() {
                config.git_repository = git_repository;
            }
            if ci.is_some() {
                config.ci = ci;
            }

            let report = read_report(&badge)?;
            let existing = read_document(&config.document)?;
            let outcome = BadgeEngine::new(&config).generate(&report, &existing, link.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            let doc = config.document.display();
            let summary = format!(
                "({}% → {})",
                format_percentage(outcome.percentage),
                outcome.color
            );

            if check {
                if outcome.changed {
                    eprintln!(
                        "{} {doc} is out of date {summary}",
                        "✗".if_supports_color(Stream::Stderr, |t| t.red())
                    );
                    return Ok(ExitCode::from(1));
                }
                eprintln!(
                    "{} {doc} is up to date {summary}",
                    "✓".if_supports_color(Stream::Stderr, |t| t.green())
                );
                return Ok(ExitCode::SUCCESS);
            }

            if !outcome.changed {
                eprintln!(
                    "{} {doc} already up to date {summary}",
                    "·".if_supports_color(Stream::Stderr, |t| t.dimmed())
                );
                return Ok(ExitCode::SUCCESS);
            }

            write_document(&config.document, &outcome.document)?;
            info!(path = %doc, "wrote document");
            eprintln!(
                "{} {doc} updated {summary}",
                "✓".if_supports_color(Stream::Stderr, |t| t.green())
            );

            let is_ci = config.is_ci(process_env);
            if is_ci {
                info!("running under CI, skipping git action {}", config.git_action);
            }
            if git::should_run(&config.git_action, outcome.changed, is_ci) {
                let message = config.commit_message();
                match git::apply(
                    &config.git_action,
                    config.git_workdir(),
                    &config.document,
                    &message,
                )? {
                    GitOutcome::Staged => eprintln!("  staged {doc}"),
                    GitOutcome::Committed { branch: Some(branch) } => {
                        eprintln!("  committed \"{message}\" on new branch {branch}")
                    }
                    GitOutcome::Committed { branch: None } => {
                        eprintln!("  committed \"{message}\"")
                    }
                    GitOutcome::NoRepository | GitOutcome::Skipped => {}
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn merge(mut config: BadgeConfig, badge: &BadgeArgs) -> anyhow::Result<(BadgeConfig, Option<String>)> {
    badge.apply_to(&mut config);
    let link = badge.link_target()?;
    Ok((config, link))
}

fn read_report(badge: &BadgeArgs) -> anyhow::Result<String> {
    std::fs::read_to_string(&badge.report)
        .with_context(|| format!("failed to read coverage report {}", badge.report.display()))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
