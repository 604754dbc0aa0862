//! Command-line interface implementation

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{locate_vivliostyle_config, ConfigLoader, LoadOptions, ParsedConfig};
use crate::error::format_error;
use crate::logging::{init_logging, LogLevel};

/// Exit codes
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;

/// When to color diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Color when writing to a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self, stream: atty::Stream) -> bool {
        match self {
            ColorChoice::Auto => atty::is(stream),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

/// vs-config - Locate, load and validate Vivliostyle config files
#[derive(Parser)]
#[command(name = "vs-config")]
#[command(about = "Locate, load and validate Vivliostyle config files")]
#[command(version)]
pub struct Cli {
    /// Config file path (default: vivliostyle.config.{js,mjs,cjs,json} in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Working directory (default: current directory)
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Log level: silent, info, verbose, debug
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LogLevel,

    /// Color diagnostics
    #[arg(long, global = true, value_enum, default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the path of the config file that would be loaded
    Locate,
    /// Load and validate the config
    Check,
    /// Load the config and print it as JSON
    Show,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    let options = LoadOptions { config: cli.config.clone(), config_data: None, cwd: cli.cwd.clone() };

    match cli.command {
        Commands::Locate => run_locate(&options),
        Commands::Check => run_load(&options, cli.color, |config| {
            let path = config.inline_options.config.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
            println!("{}: {} task(s) OK", path, config.tasks.len());
            Ok(())
        }),
        Commands::Show => run_load(&options, cli.color, |config| {
            let json = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
            println!("{}", json);
            Ok(())
        }),
    }
}

/// Execute the locate command
fn run_locate(options: &LoadOptions) -> ExitCode {
    match locate_vivliostyle_config(options) {
        Some(path) => {
            println!("{}", path.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        None => {
            eprintln!("Error: No Vivliostyle config file found");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Load the config and hand it to `report`
fn run_load(
    options: &LoadOptions,
    color: ColorChoice,
    report: impl FnOnce(&ParsedConfig) -> Result<(), String>,
) -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Failed to start runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let loader = ConfigLoader::new().with_color(color.enabled(atty::Stream::Stderr));
    match runtime.block_on(loader.load_vivliostyle_config(options)) {
        Ok(Some(config)) => match report(&config) {
            Ok(()) => ExitCode::from(EXIT_SUCCESS),
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        },
        Ok(None) => {
            eprintln!("Error: No Vivliostyle config file found");
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, color.enabled(atty::Stream::Stderr)));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
