mod sink;

pub use sink::{ ConsoleSink, RotatingFileSink, Sink };

use chrono::{ Local, Utc };
use log::{ Level, LevelFilter, Log, Metadata, Record };
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{ Path, PathBuf };
use std::sync::{ Arc, Mutex, PoisonError };

pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_BACKUP_COUNT: usize = 3;

/// Named logger writing `[timestamp] LEVEL: message` lines to every attached sink.
pub struct Logger {
    name: String,
    level: LevelFilter,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(Level::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.emit(Level::Info, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(Level::Warn, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Level::Error, message);
    }

    fn emit(&self, level: Level, message: impl fmt::Display) {
        self.log(
            &Record::builder()
                .level(level)
                .target(&self.name)
                .args(format_args!("{}", message))
                .build()
        );
    }
}

pub fn format_line(level: Level, args: &fmt::Arguments<'_>) -> String {
    format!("[{}] {}: {}", Local::now().format("%Y-%m-%d %H:%M:%S,%3f"), level, args)
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), record.args());
        for sink in &self.sinks {
            if let Err(e) = sink.write_line(&line) {
                eprintln!("logger '{}' failed to write: {}", self.name, e);
            }
        }
    }

    fn flush(&self) {
        for sink in &self.sinks {
            let _ = sink.flush();
        }
    }
}

/// Hands out one configured [`Logger`] per name. Constructed once by the
/// process root and passed to every component that logs.
pub struct LoggerFactory {
    log_dir: PathBuf,
    level: LevelFilter,
    max_bytes: u64,
    backup_count: usize,
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
    files: Mutex<HashMap<PathBuf, Arc<dyn Sink>>>,
}

impl LoggerFactory {
    pub fn new<P: AsRef<Path>>(log_dir: P, level: LevelFilter) -> Self {
        Self {
            log_dir: log_dir.as_ref().to_path_buf(),
            level,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            loggers: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_rotation(mut self, max_bytes: u64, backup_count: usize) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    /// Returns the logger registered under `name`, creating it with a console
    /// sink and a rotating file sink on first use.
    pub fn get_logger(&self, name: &str) -> io::Result<Arc<Logger>> {
        let mut loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(logger) = loggers.get(name) {
            return Ok(logger.clone());
        }

        fs::create_dir_all(&self.log_dir)?;
        let console: Arc<dyn Sink> = Arc::new(ConsoleSink);
        let file = self.file_sink(self.log_dir.join(format!("{}.log", Utc::now().format("%Y-%m-%d"))))?;

        let logger = Arc::new(Logger {
            name: name.to_string(),
            level: self.level,
            sinks: vec![console, file],
        });
        loggers.insert(name.to_string(), logger.clone());
        Ok(logger)
    }

    // Loggers created on the same day share one file handle so rotation is
    // driven by a single writer.
    fn file_sink(&self, path: PathBuf) -> io::Result<Arc<dyn Sink>> {
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sink) = files.get(&path) {
            return Ok(sink.clone());
        }
        let sink: Arc<dyn Sink> = Arc::new(RotatingFileSink::open(&path, self.max_bytes, self.backup_count)?);
        files.insert(path, sink.clone());
        Ok(sink)
    }
}
