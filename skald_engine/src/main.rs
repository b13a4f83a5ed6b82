#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Skald **
//! Plays a Skald script in the terminal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::info;

use skald_engine::style::StoryStyle;
use skald_engine::{SKALD_VERSION, Session, load_config, load_document, run_repl};

#[derive(Parser)]
#[command(author, version, about = "Play a Skald narrative script in the terminal.")]
struct Cli {
    /// Script (`.ska`) or compiled document (`.json`, `.ron`).
    script: PathBuf,
    /// Testbed to seed the opening state from.
    #[arg(long, short)]
    testbed: Option<String>,
    /// Configuration file (defaults to $SKALD_CONFIG, then ./skald.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("while loading configuration")?;
    info!("Start: loading script {}", cli.script.display());
    let doc = load_document(&cli.script).context("while loading script")?;

    let testbed = cli.testbed.as_deref().or(config.session.default_testbed.as_deref());
    let mut session = Session::start(&doc, testbed).context("while starting session")?;

    println!(
        "{}  {}",
        "SKALD".bright_yellow().underline(),
        format!("v{SKALD_VERSION}").dimmed()
    );
    println!(
        "{}",
        format!(
            "{} - {} sections, {} testbeds. Type help for commands.",
            cli.script.display(),
            doc.sections.len(),
            doc.testbeds.len()
        )
        .prompt_style()
    );

    run_repl(&mut session, &config)
}
