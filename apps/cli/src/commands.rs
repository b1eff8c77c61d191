//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bmadconv_core::{ConversionSummary, ConvertOptions, ProgressReporter, convert};
use bmadconv_shared::{AppConfig, Target, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bmad-convert: turn a BMAD installation into agent and skill files.
#[derive(Parser)]
#[command(
    name = "bmad-convert",
    version,
    about = "Convert BMAD agents, workflows and tasks into opencode, claude or agents files.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v lists every entity, -vv, -vvv add debug logs).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a `_bmad` directory into one output convention.
    Convert {
        /// Source `_bmad` directory (holds `_config/`).
        #[arg(short, long, env = "BMADCONV_SOURCE")]
        source: Option<PathBuf>,

        /// Directory the `.opencode`/`.claude`/`.agents` root is created in.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output convention: opencode, claude, or agents.
        #[arg(short, long)]
        target: Option<Target>,

        /// Config file to use instead of `~/.bmadconv/bmadconv.toml`.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 | 1 => "bmadconv=warn",
        2 => "bmadconv=debug",
        _ => "bmadconv=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Convert {
            source,
            output,
            target,
            config,
        } => {
            let app_config = match config {
                Some(path) => load_config_from(&path)?,
                None => load_config()?,
            };
            let options = convert_options(&app_config, source, output, target, cli.verbose > 0);
            cmd_convert(&options)
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Init => cmd_config_init()?,
                ConfigAction::Show => cmd_config_show()?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Flags override the config file, which overrides built-in defaults.
fn convert_options(
    config: &AppConfig,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    target: Option<Target>,
    verbose: bool,
) -> ConvertOptions {
    let mut options = ConvertOptions::from(config);
    if let Some(source) = source {
        options.source_dir = source;
    }
    if let Some(output) = output {
        options.output_dir = output;
    }
    if let Some(target) = target {
        options.target = target;
    }
    options.verbose = verbose;
    options
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_convert(options: &ConvertOptions) -> Result<ExitCode> {
    info!(
        source = %options.source_dir.display(),
        target = %options.target,
        "convert requested"
    );

    let progress = CliProgress::new();
    let summary = convert(options, &progress).wrap_err_with(|| {
        format!(
            "conversion into {} failed",
            options.output_dir.join(options.target.root_dir()).display()
        )
    })?;

    print_summary(options.target, &summary);

    if summary.has_errors() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn print_summary(target: Target, summary: &ConversionSummary) {
    for warning in &summary.warnings {
        eprintln!("warning: {warning}");
    }

    if summary.has_errors() {
        eprintln!();
        eprintln!("  Conversion finished with {} error(s):", summary.errors.len());
        for error in &summary.errors {
            eprintln!("  - {error}");
        }
        eprintln!();
        return;
    }

    println!();
    println!("  Conversion complete ({target})");
    println!("  Agents:   {}", summary.directive_count);
    println!("  Skills:   {}", summary.document_count);
    println!("  Warnings: {}", summary.warnings.len());
    println!("  Output:   {}", summary.output_root.display());
    println!(
        "  Time:     {:.1}s",
        summary.elapsed.as_secs_f64()
    );
    println!();
}

/// Spinner showing the current phase; verbose lines print above it.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn detail(&self, line: &str) {
        self.spinner.println(format!("  {line}"));
    }

    fn done(&self, _summary: &ConversionSummary) {
        self.spinner.finish_and_clear();
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_convert_flags() {
        let cli = Cli::try_parse_from([
            "bmad-convert",
            "-v",
            "convert",
            "--source",
            "vendor/_bmad",
            "--target",
            "claude",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Convert { source, target, output, .. } => {
                assert_eq!(source, Some(PathBuf::from("vendor/_bmad")));
                assert_eq!(target, Some(Target::Claude));
                assert_eq!(output, None);
            }
            Command::Config { .. } => panic!("expected convert"),
        }
    }

    #[test]
    fn rejects_unknown_target() {
        assert!(Cli::try_parse_from(["bmad-convert", "convert", "--target", "vim"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        config.defaults.target = Target::Agents;
        config.defaults.output_dir = "out".into();

        let options = convert_options(&config, None, None, None, false);
        assert_eq!(options.target, Target::Agents);
        assert_eq!(options.output_dir, PathBuf::from("out"));
        assert_eq!(options.source_dir, PathBuf::from("_bmad"));

        let options = convert_options(
            &config,
            Some("src/_bmad".into()),
            Some("dist".into()),
            Some(Target::Claude),
            true,
        );
        assert_eq!(options.target, Target::Claude);
        assert_eq!(options.output_dir, PathBuf::from("dist"));
        assert_eq!(options.source_dir, PathBuf::from("src/_bmad"));
        assert!(options.verbose);
    }
}
