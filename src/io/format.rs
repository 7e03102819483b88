//! Nice `efgkit` output formatting.

use std::fmt;

const EFGKIT_BANNER_LENGTH: usize = 79;

/// Logs an error to the `efgkit-output` logger.
macro_rules! efgkit_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "efgkit-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a warning to the `efgkit-output` logger.
macro_rules! efgkit_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::warn!($fmt, $($($arg)*)?);
        log::warn!(target: "efgkit-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a main output line to the `efgkit-output` logger.
macro_rules! efgkit_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "efgkit-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {efgkit_error, efgkit_output, efgkit_warn};

/// Logs a nicely formatted section title to the `efgkit-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(EFGKIT_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    efgkit_output!("┌──{bar}──┐");
    efgkit_output!("│§ {title:^length$} §│");
    efgkit_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `efgkit-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    efgkit_output!("{}", subtitle);
    efgkit_output!("{}", bar);
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging `efgkit` outputs nicely.
pub(crate) trait EfgkitOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            efgkit_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> EfgkitOutput for T where T: fmt::Debug + fmt::Display {}
