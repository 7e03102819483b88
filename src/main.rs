use std::path::Path;
use std::process;

use anyhow::{self, Context};
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use efgkit::interfaces::cli::{log_heading, Cli};
use efgkit::interfaces::input::Input;
use efgkit::interfaces::InputHandle;
use efgkit::io::read_efgkit_yaml;

/// Configures `log4rs` so that the `efgkit-output` logger writes plain lines to the standard
/// output (and to `output`, if given), while all other records at warning level or above go
/// to the standard error.
fn configure_logging(output: Option<&Path>) -> Result<(), anyhow::Error> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{h({l})} [{M}] {m}{n}")))
        .build();

    let mut config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .appender(Appender::builder().build("stderr", Box::new(stderr)));
    let mut output_logger = Logger::builder().appender("stdout");
    if let Some(path) = output {
        let file = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{m}{n}")))
            .append(false)
            .build(path)
            .with_context(|| format!("Unable to create the output file `{}`", path.display()))?;
        config = config.appender(Appender::builder().build("file", Box::new(file)));
        output_logger = output_logger.appender("file");
    }
    let config = config
        .logger(
            output_logger
                .additive(false)
                .build("efgkit-output", LevelFilter::Info),
        )
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn))
        .with_context(|| "Unable to configure logging")?;
    log4rs::init_config(config).with_context(|| "Unable to initialise logging")?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), anyhow::Error> {
    configure_logging(cli.output.as_deref())?;
    log_heading();

    let mut input = read_efgkit_yaml::<Input, _>(&cli.config)
        .with_context(|| format!("Unable to read the input file `{}`", cli.config.display()))?;
    if let Some(nmr_data) = cli.nmr_data.as_ref() {
        input.nmr_data = Some(nmr_data.clone());
    }
    input.handle()
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("efgkit: {err:#}");
        process::exit(1);
    }
}
