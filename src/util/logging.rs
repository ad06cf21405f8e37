use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use once_cell::sync::Lazy;

static LOGGER_CONFIG: Lazy<RwLock<LoggingConfig>> =
    Lazy::new(|| RwLock::new(LoggingConfig::default()));

#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub enum LogLevel {
    INFO,
    VERBOSE,
}

#[macro_export]
macro_rules! logln {
    ($fmt:literal) => {
        if $crate::logging::is_enabled(Self::CC) {
            println!("[{}:{}] {}", file!(), line!(), $fmt);
        }
    };
    ($fmt:literal, $($arg:tt)*) => {
        if $crate::logging::is_enabled(Self::CC) {
            print!("[{}:{}] ", file!(), line!());
            println!($fmt, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! logvbln {
    ($fmt:literal) => {
        if $crate::logging::is_enabled(Self::CC) && $crate::logging::is_at_level(Self::CC, $crate::logging::LogLevel::VERBOSE) {
            println!("[{}:{}] {}", file!(), line!(), $fmt);
        }
    };
    ($fmt:literal, $($arg:tt)*) => {
        if $crate::logging::is_enabled(Self::CC) && $crate::logging::is_at_level(Self::CC, $crate::logging::LogLevel::VERBOSE) {
            print!("[{}:{}] ", file!(), line!());
            println!($fmt, $($arg)*);
        }
    }
}

pub fn is_enabled(cc: &'static str) -> bool {
    LOGGER_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .cc_enabled(cc)
}

pub fn is_at_level(cc: &'static str, level: LogLevel) -> bool {
    LOGGER_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .cc_at_level(cc, level)
}

fn with_config<F: FnOnce(&mut LoggingConfig)>(f: F) {
    f(&mut LOGGER_CONFIG.write().unwrap_or_else(PoisonError::into_inner));
}

pub fn disable_cc(cc: &'static str) {
    with_config(|config| config.disable_cc(cc));
}

pub fn enable_cc(cc: &'static str, level: LogLevel) {
    with_config(|config| config.enable_cc(cc, level));
}

pub fn set_global_logging(enabled: bool) {
    with_config(|config| {
        if enabled {
            config.enable_global_tracing()
        } else {
            config.disable_global_tracing()
        }
    });
}

pub fn set_global_level(level: LogLevel) {
    with_config(|config| config.set_global_level(level));
}

#[derive(Debug)]
pub struct LoggingConfig {
    global_tracing_enabled: bool,
    global_level: LogLevel,
    flags: HashMap<&'static str, (bool, LogLevel)>, // <component, (tracing enabled, trace level)>
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_tracing_enabled: true,
            global_level: LogLevel::INFO,
            flags: Default::default(),
        }
    }
}

impl LoggingConfig {
    pub fn cc_enabled(&self, cc: &str) -> bool {
        if !self.global_tracing_enabled {
            return false;
        }

        self.flags.get(cc).unwrap_or(&(true, LogLevel::INFO)).0
    }

    pub fn cc_at_level(&self, cc: &str, level: LogLevel) -> bool {
        if self.global_level >= level {
            return true;
        }

        self.flags.get(cc).unwrap_or(&(true, LogLevel::INFO)).1 >= level
    }

    pub fn enable_cc(&mut self, cc: &'static str, level: LogLevel) {
        self.flags.insert(cc, (true, level));
    }

    pub fn disable_cc(&mut self, cc: &'static str) {
        self.flags.insert(cc, (false, LogLevel::INFO));
    }

    pub fn enable_global_tracing(&mut self) {
        self.global_tracing_enabled = true;
    }

    pub fn disable_global_tracing(&mut self) {
        self.global_tracing_enabled = false;
    }

    pub fn set_global_level(&mut self, level: LogLevel) {
        self.global_level = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_defaults_to_enabled_at_info() {
        let config = LoggingConfig::default();

        assert!(config.cc_enabled("LocationFilter"));
        assert!(config.cc_at_level("LocationFilter", LogLevel::INFO));
        assert!(!config.cc_at_level("LocationFilter", LogLevel::VERBOSE));
    }

    #[test]
    fn test_component_level_overrides() {
        let mut config = LoggingConfig::default();
        config.enable_cc("PolarParser", LogLevel::VERBOSE);
        config.disable_cc("ZephyrParser");

        assert!(config.cc_at_level("PolarParser", LogLevel::VERBOSE));
        assert!(!config.cc_enabled("ZephyrParser"));

        config.enable_cc("ZephyrParser", LogLevel::INFO);
        assert!(config.cc_enabled("ZephyrParser"));
    }

    #[test]
    fn test_global_switches() {
        let mut config = LoggingConfig::default();
        config.set_global_level(LogLevel::VERBOSE);
        assert!(config.cc_at_level("Anything", LogLevel::VERBOSE));

        config.disable_global_tracing();
        assert!(!config.cc_enabled("Anything"));
    }
}
