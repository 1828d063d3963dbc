use error_stack::{Report, ResultExt};
use log::LevelFilter;

use crate::error::DdanError;

fn dispatch(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .level_for("ureq", LevelFilter::Warn)
        .level_for("ureq_proto", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .chain(std::io::stderr())
}

/// Initialize logging for the application.
/// Should be called once at the start of main().
///
/// # Errors
///
/// Returns [`DdanError::Configuration`] if a global logger is already set.
pub fn init_logging(level: LevelFilter) -> Result<(), Report<DdanError>> {
    dispatch(level)
        .apply()
        .change_context(DdanError::Configuration {
            message: "Failed to install logger".into(),
        })
}

/// Map a `-v` count to a level: warn, info, debug, then trace.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log level helper to determine if debug logging is enabled
pub fn is_debug_enabled() -> bool {
    log::log_enabled!(log::Level::Debug)
}
