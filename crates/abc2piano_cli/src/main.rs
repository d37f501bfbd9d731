//! abc2piano - command-line entry point
//!
//! Handles:
//! - Configuration loading
//! - Application-level logging initialization
//! - One conversion, mapped to a process exit code

use std::path::PathBuf;
use std::process;

use clap::Parser;

use abc2piano_core::config::ConfigManager;
use abc2piano_core::logging::{init_tracing, LogLevel};
use abc2piano_core::models::{ConversionRequest, OutputFormat};
use abc2piano_core::orchestrator::{exit_code, ConversionError, Orchestrator};
use abc2piano_core::reverb::catalog;

/// Render an ABC notation file to piano audio.
#[derive(Parser, Debug)]
#[command(name = "abc2piano", version, about)]
struct Args {
    /// Notation file to convert
    #[arg(required_unless_present = "list_presets")]
    input: Option<PathBuf>,

    /// Output format: wav, mp3 or opus
    #[arg(short, long, default_value = "wav")]
    format: String,

    /// Reverb preset (`none` to skip the reverb)
    #[arg(short, long)]
    reverb: Option<String>,

    /// Output file (defaults to the input name with the format's extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "ABC2PIANO_CONFIG", default_value = ".config/abc2piano.toml")]
    config: PathBuf,

    /// List the reverb presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Echo the request log to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    if args.list_presets {
        for preset in catalog().iter() {
            println!("{:<16} {}", preset.name, preset.label);
        }
        return;
    }

    let mut config_manager = ConfigManager::new(&args.config);
    if let Err(e) = config_manager.load_or_create() {
        eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
    }

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config_manager.settings().logging.level
    };
    init_tracing(level);

    tracing::debug!("abc2piano core {}", abc2piano_core::version());
    tracing::debug!("Config: {}", args.config.display());

    if let Err(e) = config_manager.ensure_dirs_exist() {
        tracing::warn!("Failed to create directories: {}", e);
    }

    let code = match run(args, config_manager) {
        Ok(output) => {
            println!("{}", output.display());
            exit_code::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            if let Some(diagnostics) = e.stage_error().and_then(|s| s.diagnostics()) {
                if !diagnostics.is_empty() {
                    eprintln!("{}", diagnostics);
                }
            }
            e.exit_code()
        }
    };
    process::exit(code);
}

fn run(args: Args, config_manager: ConfigManager) -> Result<PathBuf, ConversionError> {
    let format: OutputFormat = args.format.parse()?;
    let input = args
        .input
        .ok_or_else(|| ConversionError::invalid_request("no input file given"))?;

    let mut request = ConversionRequest::new(input, format);
    if let Some(reverb) = args.reverb {
        request = request.with_reverb(reverb);
    }
    if let Some(output) = args.output {
        request = request.with_output(output);
    }

    let mut orchestrator = Orchestrator::new(config_manager.into_settings());
    if args.verbose {
        orchestrator = orchestrator.with_log_callback(|line| eprintln!("{}", line));
    }

    orchestrator.convert(&request)
}
