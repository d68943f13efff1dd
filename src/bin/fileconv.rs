//! CLI binary for fileconv.
//!
//! A thin shim over the library crate that maps CLI flags
//! to a `ConversionRequest` and `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use fileconv::{
    convert_async, inspect, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    ConversionRequest, FailureKind, FormatClass, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner whose message follows the
/// dispatcher's stages. Conversions are a single file, so there is no
/// counter to show.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(input: &Path) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.set_message(input.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        let prefix = match stage {
            Stage::Validating => "Checking",
            Stage::Decoding => "Reading",
            Stage::Encoding => "Writing",
            Stage::Done => "Done",
        };
        self.bar.set_prefix(prefix);
    }

    fn on_complete(&self, output: &ConversionOutput) {
        self.bar.finish_and_clear();
        let detail = match (output.records, output.dimensions) {
            (Some(n), _) => format!("{n} records"),
            (_, Some((w, h))) => format!("{w}×{h}"),
            _ => String::new(),
        };
        eprintln!(
            "{} {} → {}  {}",
            green("✔"),
            output.source,
            bold(&output.output_path.display().to_string()),
            dim(&format!("{detail}  {}ms", output.duration_ms)),
        );
    }

    fn on_failure(&self, kind: FailureKind, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}  {}", red("✘"), red(message), dim(&kind.to_string()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Table to JSON, written next to the input
  fileconv people.csv --to json

  # Into another folder
  fileconv people.yaml --to csv -o exports/

  # First worksheet of a workbook
  fileconv budget.xlsx --to csv

  # Drop transparency and re-encode as JPEG
  fileconv logo.png --to jpg

  # Word document to PDF with a specific LibreOffice
  fileconv report.docx --to pdf --soffice /opt/libreoffice/program/soffice

  # What can this file become?
  fileconv --list-targets photo.webp

  # Machine-readable result
  fileconv --json people.csv --to yaml

SUPPORTED CONVERSIONS:
  Source                 Targets
  ─────────────────────  ─────────────────────
  txt csv json yaml      txt csv json yaml
  xlsx                   csv
  png jpg jpeg webp      png jpg webp
  docx                   pdf (needs LibreOffice)

ENVIRONMENT VARIABLES:
  FILECONV_TO           Default target extension
  FILECONV_OUTPUT_DIR   Default output folder
  FILECONV_SOFFICE      LibreOffice executable (default: soffice on PATH)
  RUST_LOG              Override log filter (e.g. fileconv=debug)
"#;

/// Convert a single file between tabular, image and document formats.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert a single file between tabular, image and document formats",
    long_about = "Convert one file into another format: tables between txt, csv, json, yaml \
(and from xlsx), images between png, jpg and webp, and docx documents to pdf via LibreOffice. \
The output is written as {stem}.{target} in the output folder.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// File to convert.
    input: PathBuf,

    /// Target extension (e.g. json, csv, jpg, pdf).
    #[arg(
        short,
        long,
        env = "FILECONV_TO",
        required_unless_present = "list_targets"
    )]
    to: Option<String>,

    /// Output folder. Default: the input file's folder.
    #[arg(short, long, env = "FILECONV_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// LibreOffice executable used for docx → pdf.
    #[arg(long, env = "FILECONV_SOFFICE")]
    soffice: Option<PathBuf>,

    /// Output a JSON summary (ConversionOutput) on stdout.
    #[arg(long, env = "FILECONV_JSON")]
    json: bool,

    /// Print the input's format class and legal targets, no conversion.
    #[arg(long)]
    list_targets: bool,

    /// Disable the spinner.
    #[arg(long, env = "FILECONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILECONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILECONV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and summary line cover what INFO logs would say.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List-targets mode ────────────────────────────────────────────────
    if cli.list_targets {
        let info = inspect(&cli.input);

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialise format info")?
            );
        } else {
            println!("File:     {}", cli.input.display());
            println!("Class:    {}", info.class);
            if info.class == FormatClass::Unsupported {
                println!("Targets:  {}", dim("none"));
            } else {
                println!("Targets:  {}", info.allowed_targets.join(", "));
            }
        }
        return Ok(());
    }

    // ── Build request and config ─────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new(&cli.input);
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let request = ConversionRequest::new(
        &cli.input,
        output_dir_for(&cli),
        cli.to.clone().unwrap_or_default(),
    );
    let config = build_config(&cli, progress_cb);

    // ── Run conversion ───────────────────────────────────────────────────
    let output = match convert_async(request, config).await {
        Ok(output) => output,
        Err(e) => {
            let kind = e.kind();
            return Err(anyhow::Error::new(e).context(format!("Conversion failed ({kind})")));
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        // The callback already printed a summary when the spinner is on.
        eprintln!(
            "Converted {} → {} in {}ms",
            cli.input.display(),
            output.output_path.display(),
            output.duration_ms
        );
    }

    Ok(())
}

/// `--output-dir`, else the folder holding the input.
fn output_dir_for(cli: &Cli) -> PathBuf {
    if let Some(ref dir) = cli.output_dir {
        return dir.clone();
    }
    match cli.input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> ConversionConfig {
    let mut builder = ConversionConfig::builder();

    if let Some(ref program) = cli.soffice {
        builder = builder.soffice_program(program);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build()
}
