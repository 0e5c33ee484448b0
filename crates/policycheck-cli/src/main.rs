//! # policycheck CLI
//!
//! Checks a policy document against the DPDPA checklist (or a checklist
//! file) and prints the compliance report.
//!
//! ```text
//! policycheck check privacy.txt --section 6 --mode document --format json
//! cat privacy.txt | policycheck check - --industry Fintech
//! policycheck segment privacy.txt
//! policycheck checklist --section 5
//! ```

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use policycheck_core::{segment, ChecklistRegistry, EvaluationMode, MatchLevel, DEFAULT_MIN_BLOCK_WORDS};
use policycheck_runtime::{ComplianceRunner, RunOptions, RuntimeConfig, SectionScope};

mod render;

/// Policy compliance checks against regulatory checklists.
#[derive(Parser, Debug)]
#[command(name = "policycheck", version, about)]
struct Cli {
    /// Checklist file (YAML or JSON) instead of the built-in DPDPA checklist
    #[arg(long, global = true)]
    checklist: Option<PathBuf>,

    /// More logging on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a policy document and print the compliance report.
    Check(CheckArgs),
    /// Show how a document is split into blocks for block mode.
    Segment(SegmentArgs),
    /// List checklist sections and items.
    Checklist(ChecklistArgs),
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Policy text file, or "-" for stdin
    input: PathBuf,

    /// Section id, comma-separated ids, or "all"
    #[arg(short, long, default_value = "all")]
    section: String,

    /// Block-by-block or whole-document evaluation
    #[arg(short, long, value_enum, default_value_t = ModeArg::Block)]
    mode: ModeArg,

    /// Industry context, e.g. Automotive, Healthcare, Fintech
    #[arg(long)]
    industry: Option<String>,

    /// Runtime configuration file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured provider (anthropic, openai)
    #[arg(long)]
    provider: Option<String>,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Override the number of concurrent oracle calls
    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(clap::Args, Debug)]
struct SegmentArgs {
    /// Policy text file, or "-" for stdin
    input: PathBuf,

    /// Minimum words for a block to be sent
    #[arg(long, default_value_t = DEFAULT_MIN_BLOCK_WORDS)]
    min_words: usize,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(clap::Args, Debug)]
struct ChecklistArgs {
    /// Only this section
    #[arg(short, long)]
    section: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Block,
    Document,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Block => EvaluationMode::Block,
            ModeArg::Document => EvaluationMode::Document,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[derive(Serialize)]
struct BlockPreview<'a> {
    block_id: &'a str,
    words: usize,
    sent: bool,
    text: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = load_registry(cli.checklist.as_deref())?;

    match cli.command {
        Commands::Check(args) => check(args, registry).await,
        Commands::Segment(args) => segment_preview(args),
        Commands::Checklist(args) => list_checklist(args, &registry),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_registry(path: Option<&Path>) -> Result<ChecklistRegistry> {
    match path {
        Some(path) => ChecklistRegistry::from_file(path)
            .with_context(|| format!("loading checklist {}", path.display())),
        None => Ok(ChecklistRegistry::dpdpa()),
    }
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("reading policy text from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
    }
}

/// Write `value` in `format`. Text output comes from `text`, the structured
/// formats from serde.
fn emit<W, T, F>(out: &mut W, value: &T, format: OutputFormat, text: F) -> Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&mut W) -> io::Result<()>,
{
    match format {
        OutputFormat::Text => text(out)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => serde_yaml::to_writer(&mut *out, value)?,
    }
    Ok(())
}

async fn check(args: CheckArgs, registry: ChecklistRegistry) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    if let Some(model) = args.model {
        config.model = Some(model);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }

    let document = read_input(&args.input)?;
    if document.trim().is_empty() {
        tracing::warn!("Policy text is empty");
    }

    let runner = ComplianceRunner::from_config(config, registry)?;
    let options = RunOptions {
        mode: args.mode.into(),
        scope: SectionScope::parse(&args.section),
        industry: args.industry,
    };

    let result = runner.run(&document, &options).await?;

    emit(&mut io::stdout().lock(), &result, args.format, |out| {
        render::report(out, &result, runner.registry())
    })?;

    if result.report.document_match_level == MatchLevel::Error {
        bail!("every oracle call failed; see the log for details");
    }
    Ok(())
}

fn segment_preview(args: SegmentArgs) -> Result<()> {
    if args.min_words == 0 {
        bail!("--min-words must be at least 1");
    }

    let document = read_input(&args.input)?;
    let blocks = segment(&document);

    let preview: Vec<BlockPreview> = blocks
        .iter()
        .map(|b| BlockPreview {
            block_id: &b.block_id,
            words: b.word_count(),
            sent: b.word_count() >= args.min_words,
            text: &b.text,
        })
        .collect();

    emit(&mut io::stdout().lock(), &preview, args.format, |out| {
        render::blocks(out, &blocks, args.min_words)
    })?;
    Ok(())
}

fn list_checklist(args: ChecklistArgs, registry: &ChecklistRegistry) -> Result<()> {
    let sections = match &args.section {
        Some(id) => vec![registry.require_section(id)?],
        None => registry.sections().iter().collect(),
    };

    emit(&mut io::stdout().lock(), &sections, args.format, |out| {
        render::sections(out, &sections)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_defaults() {
        let cli = Cli::parse_from(["policycheck", "check", "policy.txt"]);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.section, "all");
                assert_eq!(args.mode, ModeArg::Block);
                assert_eq!(args.format, OutputFormat::Text);
                assert!(args.industry.is_none());
            }
            other => panic!("Expected check, got {:?}", other),
        }
    }

    #[test]
    fn test_check_overrides() {
        let cli = Cli::parse_from([
            "policycheck", "-vv", "check", "-", "--section", "6", "--mode", "document",
            "--industry", "Healthcare", "--provider", "openai", "--format", "json",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Check(args) => {
                assert_eq!(args.input, PathBuf::from("-"));
                assert_eq!(EvaluationMode::from(args.mode), EvaluationMode::Document);
                assert_eq!(args.provider.as_deref(), Some("openai"));
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("Expected check, got {:?}", other),
        }
    }

    #[test]
    fn test_emit_uses_renderer_only_for_text() {
        let registry = ChecklistRegistry::dpdpa();
        let sections: Vec<_> = registry.sections().iter().take(1).collect();
        let render = |out: &mut Vec<u8>| render::sections(out, &sections);

        let mut text = Vec::new();
        emit(&mut text, &sections, OutputFormat::Text, render).unwrap();
        let mut expected = Vec::new();
        render::sections(&mut expected, &sections).unwrap();
        assert_eq!(text, expected);

        let mut json = Vec::new();
        emit(&mut json, &sections, OutputFormat::Json, render).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(1));
        assert!(json.ends_with(b"\n"));

        let mut yaml = Vec::new();
        emit(&mut yaml, &sections, OutputFormat::Yaml, render).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_slice(&yaml).unwrap();
        assert!(parsed.as_sequence().is_some());
        assert_ne!(yaml, expected);
    }

    #[test]
    fn test_checklist_file_is_global() {
        let cli = Cli::parse_from(["policycheck", "checklist", "--checklist", "gdpr.yaml"]);
        assert_eq!(cli.checklist, Some(PathBuf::from("gdpr.yaml")));
    }
}
