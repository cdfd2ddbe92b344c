use crate::config::{AppConfig, LogSettings};
use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static SERVICE_LOGGER: Lazy<ServiceLogger> = Lazy::new(ServiceLogger::new);

const REQUEST_TAG_OPEN: &str = "[req:";

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let max_level = config.min_level.to_log_level_filter();
    SERVICE_LOGGER.update_config(config)?;

    if let Err(e) = log::set_logger(&*SERVICE_LOGGER) {
        return Err(format!("Failed to set logger: {:?}", e));
    }

    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_log_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_log_level_filter(&self) -> log::LevelFilter {
        self.to_log_level().to_level_filter()
    }

    pub fn from_log_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// One emitted log line. Serialized as-is in JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl LogEntry {
    /// Messages that start with `[req:<id>] ` have the id lifted into
    /// `request_id` so JSON consumers can filter on it.
    pub fn new(level: LogLevel, message: String, module: String, line: u32) -> Self {
        let (request_id, message) = split_request_tag(message);
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level,
            message,
            module,
            line,
            request_id,
        }
    }
}

fn split_request_tag(message: String) -> (Option<String>, String) {
    if let Some(rest) = message.strip_prefix(REQUEST_TAG_OPEN) {
        if let Some((id, tail)) = rest.split_once("] ") {
            if !id.is_empty() && !id.contains(' ') {
                return (Some(id.to_string()), tail.to_string());
            }
        }
    }
    (None, message)
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_module: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_module: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &LogSettings) -> Result<Self, String> {
        let level = LogLevel::parse(&settings.level)
            .ok_or_else(|| format!("LOG_LEVEL has an invalid value: {}", settings.level))?;
        let mut config = if settings.json {
            Self::production()
        } else {
            Self::default()
        };
        config.min_level = level;
        config.log_file_path = settings.file.clone();
        Ok(config)
    }
}

pub struct ServiceLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl ServiceLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) -> Result<(), String> {
        let file = match &new_config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| format!("Failed to open log file {}: {}", path, e))?,
            ),
            None => None,
        };

        if let Ok(mut log_file) = self.log_file.lock() {
            *log_file = file;
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
        Ok(())
    }

    fn format_plain(entry: &LogEntry, config: &LoggerConfig) -> String {
        let level = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };
        let mut output = format!(
            "{} [{}] ",
            entry.timestamp.format(&config.timestamp_format),
            level
        );
        if config.show_module && !entry.module.is_empty() {
            output.push_str(&format!("{}:: ", entry.module));
        }
        output.push_str(&entry.message);
        if let Some(request_id) = &entry.request_id {
            output.push_str(&format!(" [req:{}]", request_id));
        }
        output
    }

    fn format_colored(entry: &LogEntry, config: &LoggerConfig) -> String {
        let level = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };
        let mut output = format!(
            "{} [{}] ",
            entry
                .timestamp
                .format(&config.timestamp_format)
                .to_string()
                .bright_black(),
            level.color(entry.level.color()).bold()
        );
        if config.show_module && !entry.module.is_empty() {
            output.push_str(&format!("{}:: ", entry.module.bright_blue()));
        }
        output.push_str(&entry.message.white().bold().to_string());
        if let Some(request_id) = &entry.request_id {
            output.push_str(&format!(" [req:{}]", request_id.bright_yellow()));
        }
        output
    }

    fn render(entry: &LogEntry, config: &LoggerConfig, colored: bool) -> String {
        if config.output_json {
            serde_json::to_string(entry).unwrap_or_default()
        } else if colored && config.show_colors {
            Self::format_colored(entry, config)
        } else {
            Self::format_plain(entry, config)
        }
    }
}

impl log::Log for ServiceLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level.to_log_level(),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::new(
            LogLevel::from_log_level(record.level()),
            record.args().to_string(),
            record.module_path().unwrap_or("unknown").to_string(),
            record.line().unwrap_or(0),
        );

        let Ok(config) = self.config.lock() else {
            return;
        };

        println!("{}", Self::render(&entry, &config, true));

        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let line = Self::render(&entry, &config, false) + "\n";
                let _ = file.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Measures a pipeline step and logs its duration when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!(
            "⏱️  Timer '{}' completed in {}ms",
            self.name,
            self.elapsed().as_millis()
        );
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_startup_info(app_name: &str, version: &str, config: &AppConfig) {
    log::info!("🚀 Starting {} v{}", app_name, version);
    log::info!(
        "🌐 Listening on http://{}:{}",
        config.server.host,
        config.server.port
    );
}

/// Never prints the credential itself, only its length.
pub fn log_config_info(config: &AppConfig) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   Model: {}", config.gemini.model);
    log::info!("   Gemini endpoint: {}", config.gemini.base_url);
    log::info!("   API key length: {}", config.gemini.api_key.len());
    log::info!(
        "   Generation timeout: {}s (keep-alive {}s)",
        config.gemini.timeout.as_secs(),
        config.keep_alive().as_secs()
    );
    log::info!(
        "   Media host: {} (raw hint {})",
        config.assets.media_base_url,
        if config.assets.raw_hint { "✅" } else { "❌" }
    );
    log::info!("   Asset timeout: {}s", config.assets.timeout.as_secs());
    log::info!(
        "   Hotlink headers: {}",
        if config.assets.user_agent.is_some() || config.assets.referer.is_some() {
            "✅"
        } else {
            "❌"
        }
    );
}
