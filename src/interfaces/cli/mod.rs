use std::path::PathBuf;

use clap::Parser;

use crate::io::format::efgkit_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted `efgkit` heading to the `efgkit-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    efgkit_output!("╭─────────────────────────────────────────────────────────────────────────────╮");
    efgkit_output!("│    ███████╗███████╗ ██████╗ ██╗  ██╗██╗████████╗                            │");
    efgkit_output!("│    ██╔════╝██╔════╝██╔════╝ ██║ ██╔╝██║╚══██╔══╝                            │");
    efgkit_output!("│    █████╗  █████╗  ██║  ███╗█████╔╝ ██║   ██║                               │");
    efgkit_output!("│    ██╔══╝  ██╔══╝  ██║   ██║██╔═██╗ ██║   ██║                               │");
    efgkit_output!("│    ███████╗██║     ╚██████╔╝██║  ██╗██║   ██║                               │");
    efgkit_output!("│    ╚══════╝╚═╝      ╚═════╝ ╚═╝  ╚═╝╚═╝   ╚═╝                               │");
    efgkit_output!("│                                                                             │");
    efgkit_output!("│    Electric field gradients and quadrupolar couplings          {version:>13} │");
    efgkit_output!("╰─────────────────────────────────────────────────────────────────────────────╯");
    efgkit_output!("");
}

/// Command-line arguments of the `efgkit` binary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML input file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to a file to which the output is also written.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to a YAML file containing a custom NMR reference dataset, overriding any given in
    /// the input file.
    #[arg(short, long)]
    pub nmr_data: Option<PathBuf>,
}
