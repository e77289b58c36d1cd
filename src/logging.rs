use std::io::Write;

use env_logger::Builder;
use log::SetLoggerError;

pub const LOG_ENV: &str = "MIDIUTILS_LOGLEVEL";

fn log_filter(level: Option<String>, rust_log: Option<String>) -> String {
    level.or(rust_log).unwrap_or_else(|| format!("{}=info", env!("CARGO_CRATE_NAME")))
}

/// Installs the `env_logger` backend.
///
/// The filter is read from `MIDIUTILS_LOGLEVEL`, then `RUST_LOG`. Calling it
/// again once a logger is set only returns the error.
pub fn initialize_logging() -> Result<(), SetLoggerError> {
    let filter = log_filter(std::env::var(LOG_ENV).ok(), std::env::var("RUST_LOG").ok());

    Builder::new()
        .parse_filters(&filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {} {}:{}: {}",
                buf.timestamp_micros(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_precedence() {
        assert_eq!(log_filter(Some("debug".into()), Some("warn".into())), "debug");
        assert_eq!(log_filter(None, Some("warn".into())), "warn");
        assert_eq!(log_filter(None, None), "midiutils=info");
    }

    #[test]
    fn test_initialize_twice() {
        let _ = initialize_logging();
        assert!(initialize_logging().is_err());
    }
}
