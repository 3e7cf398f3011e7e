use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use moduleaudit::analysis::{RunOutcome, Runner};
use moduleaudit::config::Settings;
use moduleaudit::discovery::Workspace;
use moduleaudit::oracle::CachedOracle;
use moduleaudit::report::{self, Reporter};

const DEFAULT_SNAPSHOTS: [&str; 3] = [
    "moduleaudit-snapshot.json",
    "moduleaudit-snapshot.yaml",
    "moduleaudit-snapshot.yml",
];

/// ModuleAudit - Dependency correctness checks for multi-module Gradle builds
#[derive(Parser, Debug)]
#[command(name = "moduleaudit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the workspace root
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Workspace snapshot produced by the source scanner
    /// (default: moduleaudit-snapshot.{json,yaml,yml} in the workspace root)
    #[arg(short, long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rewrite build files to fix findings
    #[arg(long, conflicts_with = "no_auto_correct")]
    auto_correct: bool,

    /// Only report, never touch build files
    #[arg(long = "no-autocorrect")]
    no_auto_correct: bool,

    /// Delete unused declarations instead of commenting them out
    #[arg(long)]
    delete_unused: bool,

    /// Fail when a fix pass fails, and stop fixing after the first failure
    #[arg(long)]
    strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Compute and print source set depths
    #[arg(long)]
    depths: bool,

    /// Ask before writing fixes to build files
    #[arg(long)]
    interactive: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for report::ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => report::ReportFormat::Terminal,
            OutputFormat::Json => report::ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completions
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("ModuleAudit v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut settings = load_config(&cli)?;

    if cli.interactive && settings.auto_correct && !confirm_auto_correct()? {
        settings.auto_correct = false;
    }

    let outcome = run_analysis(&settings, &cli)?;
    if !outcome.is_success(settings.strict) {
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Settings> {
    let mut settings = if let Some(config_path) = &cli.config {
        Settings::from_file(config_path)?
    } else {
        // Try to load from default locations
        Settings::from_default_locations(&cli.path)?
    };

    // Override with CLI arguments
    if cli.auto_correct {
        settings.auto_correct = true;
    }
    if cli.no_auto_correct {
        settings.auto_correct = false;
    }
    if cli.delete_unused {
        settings.delete_unused = true;
    }
    if cli.strict {
        settings.strict = true;
    }
    if cli.depths {
        settings.checks.depths = true;
    }

    Ok(settings)
}

fn confirm_auto_correct() -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt("Apply fixes to build files?")
        .default(false)
        .interact()
        .into_diagnostic()
}

fn find_snapshot(cli: &Cli) -> Result<PathBuf> {
    if let Some(snapshot) = &cli.snapshot {
        return Ok(snapshot.clone());
    }
    DEFAULT_SNAPSHOTS
        .iter()
        .map(|name| cli.path.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            miette::miette!(
                help = "pass --snapshot or generate one with the source scanner",
                "no workspace snapshot found in {}",
                cli.path.display()
            )
        })
}

fn run_analysis(settings: &Settings, cli: &Cli) -> Result<RunOutcome> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::{Duration, Instant};

    let start_time = Instant::now();

    // Step 1: Load the workspace snapshot
    let snapshot = find_snapshot(cli)?;
    info!("Loading workspace snapshot {}", snapshot.display());
    let Workspace { root, mut graph, oracle } = Workspace::load(&snapshot)?;
    info!("Found {} projects", graph.len());

    // Step 2: Run the rule phases, fixing between them
    let spinner = ProgressBar::new_spinner();
    if !cli.quiet {
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .into_diagnostic()?,
        );
        spinner.set_message(format!("Checking {} projects...", graph.len()));
        spinner.enable_steady_tick(Duration::from_millis(100));
    }

    let oracle = CachedOracle::new(oracle);
    let runner = Runner::new(settings, &oracle)?;
    info!("Running {} checks", runner.rules().rules().len());
    let outcome = runner.run(&mut graph);
    spinner.finish_and_clear();
    let outcome = outcome?;

    // Step 3: Report results
    let report_format = report::ReportFormat::from(cli.format);
    let options = report::ReportOptions {
        output_path: cli.output.clone().or_else(|| settings.reports.json.clone()),
        base_path: Some(root),
        show_depths: settings.checks.depths,
        depths_path: settings.reports.depths.clone(),
    };
    Reporter::with_options(report_format, options).report(&outcome)?;

    // Also write the JSON report when configured alongside terminal output
    if matches!(cli.format, OutputFormat::Terminal) {
        if let Some(path) = settings.reports.json.as_deref() {
            write_json_report(path, &outcome)?;
        }
    }

    // Print timing
    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(outcome)
}

fn write_json_report(path: &Path, outcome: &RunOutcome) -> Result<()> {
    report::JsonReporter::new(Some(path.to_path_buf())).report(outcome)?;
    Ok(())
}
