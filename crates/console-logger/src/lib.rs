//! Console Logger
//!
//! `log` backend writing timestamped lines to the browser console, or to
//! stderr when running natively (tests, tooling).

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// `[HH:MM:SS.mmm] LEVEL target: message`
    pub fn format_record(&self, record: &Record) -> String {
        format!(
            "[{}] {:<5} {}: {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        write_line(record.level(), &self.format_record(record));
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn write_line(level: Level, line: &str) {
    use wasm_bindgen::JsValue;
    use web_sys::console;

    let line = JsValue::from_str(line);
    match level {
        Level::Error => console::error_1(&line),
        Level::Warn => console::warn_1(&line),
        Level::Info => console::info_1(&line),
        Level::Debug | Level::Trace => console::debug_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write_line(_level: Level, line: &str) {
    eprintln!("{}", line);
}

/// Parse a level name such as "debug"; unknown or missing names fall back to `default`
pub fn parse_level(name: Option<&str>, default: LevelFilter) -> LevelFilter {
    name.and_then(|n| n.trim().parse().ok()).unwrap_or(default)
}

/// Install the console logger as the global `log` backend
pub fn init_logger(app_name: &str, level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = ConsoleLogger::new(level);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    log::info!("{} logging at {}", app_name, level);
    Ok(())
}
