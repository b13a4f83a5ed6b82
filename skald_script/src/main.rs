//! CLI entry point for skald_script.
//! Usage: cargo run -p skald_script -- compile scripts/intro.ska --format ron

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use skald_script::{OutputFormat, ParseReport, parse_script_with_report, render_document};
use walkdir::WalkDir;

const SOURCE_EXTENSION: &str = "ska";

#[derive(Parser)]
#[command(author, version, about = "Compile and check Skald narrative scripts.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a script (or a directory of scripts) to JSON or RON.
    Compile(CompileArgs),
    /// Parse only and print diagnostics.
    Check(CheckArgs),
}

#[derive(Args)]
struct CompileArgs {
    /// A `.ska` file or a directory searched recursively.
    path: PathBuf,
    /// Output file (single script) or directory (directory input). Defaults to stdout.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Args)]
struct CheckArgs {
    /// A `.ska` file or a directory searched recursively.
    path: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Ron,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Ron => OutputFormat::Ron,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Compile(args) => run_compile(&args),
        Commands::Check(args) => run_check(&args),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        },
    }
}

/// Returns Ok(false) when at least one script failed to parse.
fn run_compile(args: &CompileArgs) -> Result<bool> {
    let format = OutputFormat::from(args.format);
    if !args.path.is_dir() {
        return compile_one(&args.path, args.out.as_deref(), format);
    }

    let Some(out_dir) = args.out.as_deref() else {
        bail!("compiling a directory requires --out <DIR>");
    };
    let mut all_ok = true;
    for source in script_files(&args.path) {
        let relative = source.strip_prefix(&args.path).unwrap_or(&source);
        let target = out_dir.join(relative).with_extension(format.extension());
        all_ok &= compile_one(&source, Some(&target), format)?;
    }
    Ok(all_ok)
}

fn compile_one(path: &Path, out: Option<&Path>, format: OutputFormat) -> Result<bool> {
    let report = read_and_parse(path)?;
    print_diagnostics(path, &report);
    let Some(doc) = report.document else {
        eprintln!("{}: resolve errors before continuing.", path.display());
        return Ok(false);
    };

    let text = render_document(&doc, format).with_context(|| format!("serializing '{}'", path.display()))?;
    match out {
        Some(target) => {
            if let Some(parent) = target.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| format!("creating '{}'", parent.display()))?;
            }
            fs::write(target, text).with_context(|| format!("writing '{}'", target.display()))?;
            info!("compiled '{}' -> '{}'", path.display(), target.display());
        },
        None => println!("{text}"),
    }
    Ok(true)
}

fn run_check(args: &CheckArgs) -> Result<bool> {
    let sources = if args.path.is_dir() {
        script_files(&args.path)
    } else {
        vec![args.path.clone()]
    };
    let mut all_ok = true;
    for source in &sources {
        let report = read_and_parse(source)?;
        print_diagnostics(source, &report);
        all_ok &= report.is_ok();
    }
    Ok(all_ok)
}

fn read_and_parse(path: &Path) -> Result<ParseReport> {
    let source = fs::read_to_string(path).with_context(|| format!("unable to read '{}'", path.display()))?;
    Ok(parse_script_with_report(&source))
}

fn print_diagnostics(path: &Path, report: &ParseReport) {
    for warning in &report.warnings {
        eprintln!("{}:{}: warning: {}", path.display(), warning.line, warning.kind);
    }
    for error in &report.errors {
        match error.line {
            Some(line) => eprintln!("{}:{line}: {}", path.display(), error.kind),
            None => eprintln!("{}: {}", path.display(), error.kind),
        }
        if !error.text.is_empty() {
            eprintln!("    > {}", error.text);
        }
    }
    if !report.warnings.is_empty() {
        eprintln!("{} warnings", report.warnings.len());
    }
    if !report.errors.is_empty() {
        eprintln!("{} errors", report.errors.len());
    }
}

/// Every `.ska` file under `dir`, in a stable order. Unreadable entries are skipped with a warning.
fn script_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable entry: {err}");
                None
            },
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION))
        .collect();
    files.sort();
    files
}
