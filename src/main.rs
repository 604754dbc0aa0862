//! vs-config - Command-line tool for locating and validating Vivliostyle configs

use std::process::ExitCode;

use vivliostyle_config::cli;

fn main() -> ExitCode {
    cli::run()
}
