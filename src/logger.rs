// Levelled console logger.
//
// Used for everything around the tests themselves: configuration, image
// loading, resource errors. Test progress goes through `console` instead.
// Lines end with "\r\n" like the rest of the output.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Success,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[37m",
            LogLevel::Info => "\x1b[36m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Success => "\x1b[32m",
        }
    }
}

pub struct Logger {
    min_level: LogLevel,
    color: bool,
}

impl Logger {
    pub fn new(min_level: LogLevel) -> Self {
        Logger {
            min_level,
            color: io::IsTerminal::is_terminal(&io::stdout()),
        }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// `YYYY-MM-DD HH:MM:SS` in UTC.
    fn get_timestamp() -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        format_timestamp(secs)
    }

    /// Formats one record without colour codes.
    pub fn format_line(level: LogLevel, timestamp: &str, message: &str) -> String {
        format!("[{}] {}: {}\r\n", timestamp, level.as_str(), message)
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }

        let line = Self::format_line(level, &Self::get_timestamp(), message);
        let mut out = io::stdout().lock();
        let _ = if self.color {
            write!(out, "{}{}\x1b[0m", level.color_code(), line)
        } else {
            write!(out, "{}", line)
        };
        let _ = out.flush();
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn log_fmt(&self, level: LogLevel, args: std::fmt::Arguments) {
        if level < self.min_level {
            return;
        }
        self.log(level, &args.to_string());
    }

    pub fn debug_fmt(&self, args: std::fmt::Arguments) {
        self.log_fmt(LogLevel::Debug, args);
    }

    pub fn info_fmt(&self, args: std::fmt::Arguments) {
        self.log_fmt(LogLevel::Info, args);
    }

    pub fn warn_fmt(&self, args: std::fmt::Arguments) {
        self.log_fmt(LogLevel::Warn, args);
    }

    pub fn error_fmt(&self, args: std::fmt::Arguments) {
        self.log_fmt(LogLevel::Error, args);
    }

    pub fn success_fmt(&self, args: std::fmt::Arguments) {
        self.log_fmt(LogLevel::Success, args);
    }
}

/// Civil date and time for seconds since the epoch.
fn format_timestamp(secs: u64) -> String {
    let mut remaining_days = secs / 86400;
    let seconds_today = secs % 86400;

    let is_leap = |year: u64| year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);

    let mut year = 1970;
    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let days_in_months = if is_leap(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 1;
    let mut day_of_month = remaining_days + 1;
    for &days_in_month in &days_in_months {
        if day_of_month <= days_in_month {
            break;
        }
        day_of_month -= days_in_month;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day_of_month,
        seconds_today / 3600,
        (seconds_today % 3600) / 60,
        seconds_today % 60
    )
}

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();

pub fn init_logger(min_level: LogLevel) -> io::Result<()> {
    GLOBAL_LOGGER.set(Logger::new(min_level)).map_err(|_| {
        io::Error::new(io::ErrorKind::AlreadyExists, "Logger already initialized")
    })
}

pub fn get_logger() -> Option<&'static Logger> {
    GLOBAL_LOGGER.get()
}

macro_rules! generate_global_log_fn {
    ($fn_name:ident, $method:ident, $level:literal, $fallback:ident) => {
        pub fn $fn_name(message: &str) {
            if let Some(logger) = get_logger() {
                logger.$method(message);
            } else {
                $fallback!("{}: {}", $level, message);
            }
        }
    };
    ($fn_name:ident, $method:ident, $fallback:ident) => {
        pub fn $fn_name(message: &str) {
            if let Some(logger) = get_logger() {
                logger.$method(message);
            } else {
                $fallback!("{}", message);
            }
        }
    };
}

generate_global_log_fn!(log_info, info, println);
generate_global_log_fn!(log_warn, warn, "WARNING", eprintln);

// Before `init_logger` runs (and in unit tests) debug output is dropped,
// everything else falls back to plain println/eprintln.

#[macro_export]
macro_rules! log_debug_fmt {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::get_logger() {
            logger.debug_fmt(format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_info_fmt {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::get_logger() {
            logger.info_fmt(format_args!($($arg)*));
        } else {
            println!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn_fmt {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::get_logger() {
            logger.warn_fmt(format_args!($($arg)*));
        } else {
            eprintln!("WARNING: {}", format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_error_fmt {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::get_logger() {
            logger.error_fmt(format_args!($($arg)*));
        } else {
            eprintln!("ERROR: {}", format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_success_fmt {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::get_logger() {
            logger.success_fmt(format_args!($($arg)*));
        } else {
            println!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_civil_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        // 2000-02-29 12:34:56, a leap day in a century leap year.
        assert_eq!(format_timestamp(951_827_696), "2000-02-29 12:34:56");
        assert_eq!(format_timestamp(1_704_067_199), "2023-12-31 23:59:59");
    }

    #[test]
    fn records_end_with_crlf() {
        let line = Logger::format_line(LogLevel::Warn, "2024-01-01 00:00:00", "version mismatch");
        assert_eq!(line, "[2024-01-01 00:00:00] WARN: version mismatch\r\n");
    }

    #[test]
    fn levels_are_ordered_for_filtering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        let logger = Logger::new(LogLevel::Warn);
        assert_eq!(logger.min_level(), LogLevel::Warn);
    }

    #[test]
    fn global_helpers_fall_back_before_init() {
        // No logger is installed in unit tests, so these go to stdout/stderr.
        assert!(get_logger().is_none());
        log_info("core binding skipped");
        log_warn("core binding failed");
    }
}
