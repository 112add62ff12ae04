/*！

本模块利用 log crate 提供日志功能, 启动时调用 `init` 安装 logger.

*/

use log::{self, Level, LevelFilter, Log, Metadata, Record};

use crate::println;
use super::utils::cpu_id;

use spin::Mutex;

static LOG_MUTEX: Mutex<()> = Mutex::new(());
struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        let _lock = LOG_MUTEX.lock();
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 34,  // Blue
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        println!(
            "\u{1B}[{}m[{:>5} {}] [dasics] {}\u{1B}[0m",
            color,
            record.level(),
            cpu_id(),
            record.args(),
        );
    }
    fn flush(&self) {
        let _lock = LOG_MUTEX.lock();
    }
}

fn level_from_env(level: Option<&str>) -> LevelFilter {
    match level {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        Some("OFF") => LevelFilter::Off,
        _ => LevelFilter::Debug,
    }
}

/// Installs the console logger. Called once during boot; a second call keeps the
/// logger that is already installed.
pub fn init() {
    static LOGGER: SimpleLogger = SimpleLogger;
    if log::set_logger(&LOGGER).is_err() {
        return;
    }
    log::set_max_level(level_from_env(option_env!("LOG")));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing() {
        assert_eq!(level_from_env(Some("WARN")), LevelFilter::Warn);
        assert_eq!(level_from_env(Some("OFF")), LevelFilter::Off);
        assert_eq!(level_from_env(None), LevelFilter::Debug);
        assert_eq!(level_from_env(Some("verbose")), LevelFilter::Debug);
    }

    #[test]
    fn init_twice_is_harmless() {
        init();
        init();
        log::debug!("logger installed");
    }
}
