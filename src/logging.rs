//! Filesystem logging facility
//!
//! Implements the `log` facade for the filesystem. The device has no console
//! of its own, so formatted records are handed to a sink function supplied by
//! the firmware (a UART writer, a ring buffer, a debug probe channel).
//! Log levels are configured based on build configuration (debug/release).

use core::fmt::Arguments;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Receives one formatted `[LEVEL] message` line per record
pub type LogSink = fn(Arguments<'_>);

/// Global logger instance
pub static LOGGER: Logger = Logger::new();

/// Thread-safe logger implementation
pub struct Logger {
    sink: Mutex<Option<LogSink>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Creates a logger with no sink; records are dropped until one is set
    pub const fn new() -> Logger {
        Logger {
            sink: Mutex::new(None),
        }
    }

    pub fn set_sink(&self, sink: LogSink) {
        *self.sink.lock() = Some(sink);
    }
}

impl Log for Logger {
    /// Returns true if the message level is less than or equal to the maximum configured level
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    /// Formats messages as "[LEVEL] message"
    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let sink = self.sink.lock();
            if let Some(sink) = *sink {
                sink(format_args!("[{}] {}", record.level(), record.args()));
            }
        }
    }

    fn flush(&self) {}
}

/// Installs `LOGGER` as the global logger, writing to `sink`
///
/// # Notes
/// * Sets different log levels for debug/release builds:
///   - Debug builds: LevelFilter::Debug
///   - Release builds: LevelFilter::Info
pub fn init(sink: LogSink) -> Result<(), SetLoggerError> {
    LOGGER.set_sink(sink);
    log::set_logger(&LOGGER).map(|()| {
        log::set_max_level(
            #[cfg(debug_assertions)]
            LevelFilter::Debug,
            #[cfg(not(debug_assertions))]
            LevelFilter::Info,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrayvec::ArrayString;
    use core::fmt::Write;
    use log::Level;

    static CAPTURED: Mutex<ArrayString<128>> = Mutex::new(ArrayString::new_const());

    fn capture(args: Arguments<'_>) {
        let mut out = CAPTURED.lock();
        out.clear();
        let _ = out.write_fmt(args);
    }

    #[test]
    fn test_record_reaches_sink() {
        log::set_max_level(LevelFilter::Trace);
        let logger = Logger::new();
        logger.set_sink(capture);

        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("cluster {} corrupted", 7))
                .build(),
        );

        assert_eq!(CAPTURED.lock().as_str(), "[WARN] cluster 7 corrupted");
    }

    #[test]
    fn test_no_sink_drops_records() {
        let logger = Logger::new();
        logger.log(&Record::builder().level(Level::Error).args(format_args!("lost")).build());
        logger.flush();
    }
}
