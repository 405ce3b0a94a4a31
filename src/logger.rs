use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Log to the terminal, `verbose` includes debug messages.
///
/// The http stack is kept quiet, the client's own request events are enough.
pub fn init(verbose: bool) -> Result<(), SetLoggerError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    TermLogger::init(
        level,
        ConfigBuilder::default()
            .add_filter_ignore_str("hyper")
            .add_filter_ignore_str("reqwest")
            .add_filter_ignore_str("rustls")
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
}
