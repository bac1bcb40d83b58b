pub mod reload;

use crate::logging::Logger;
use clap::{ ArgAction, Parser, ValueEnum };
use log::LevelFilter;
use std::env;
use std::ffi::OsString;
use std::path::{ Path, PathBuf };
use std::time::Duration;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    Mongodb,
    Memory,
}

/// Origins accepted by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    pub fn parse(value: &str) -> Result<Self, String> {
        let hosts: Vec<String> = value
            .split(',')
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect();

        if hosts.is_empty() || hosts.iter().any(|h| h == "*") {
            return Ok(AllowedOrigins::Any);
        }
        Ok(AllowedOrigins::List(hosts))
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Role-based chat gateway for GroqCloud", long_about = None)]
pub struct Settings {
    // --- Server Args ---
    /// Interface the HTTP listener binds to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the HTTP listener binds to
    #[arg(long, env = "PORT", default_value_t = 5000, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Restart the server whenever the settings file changes
    #[arg(long, env = "RELOAD", default_value = "True", action = ArgAction::Set, value_parser = parse_flag)]
    pub reload: bool,

    /// How often the settings file is checked for changes, in milliseconds
    #[arg(long, env = "RELOAD_POLL_MS", default_value_t = 1000)]
    pub reload_poll_ms: u64,

    /// Comma-separated CORS origins, or * for any origin
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "*", value_parser = AllowedOrigins::parse)]
    pub allowed_origins: AllowedOrigins,

    // --- Chat LLM Provider Args ---
    /// GroqCloud API key. Checked when the first completion is requested.
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Model identifier sent with every completion request
    #[arg(long, env = "GROQ_MODEL", default_value = "openai/gpt-oss-20b")]
    pub groq_model: String,

    /// Base URL of the OpenAI-compatible Groq API
    #[arg(long, env = "GROQ_BASE_URL", default_value = "https://api.groq.com/openai/v1")]
    pub groq_base_url: String,

    /// Upper bound on one completion request, in seconds
    #[arg(long, env = "GROQ_TIMEOUT_SECS", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub groq_timeout_secs: u64,

    // --- Role Store Args ---
    /// Role store backend (mongodb, memory)
    #[arg(long, env = "ROLE_STORE_TYPE", value_enum, default_value_t = StoreType::Mongodb, ignore_case = true)]
    pub role_store_type: StoreType,

    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    #[arg(long, env = "MONGODB_DATABASE", default_value = "custom_chatgpt")]
    pub mongodb_database: String,

    #[arg(long, env = "MONGODB_COLLECTION", default_value = "personas")]
    pub mongodb_collection: String,

    // --- Logging Args ---
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value_t = LogLevel::Info, ignore_case = true)]
    pub log_level: LogLevel,

    /// Directory holding the daily rotating log files
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,
}

/// Loads `.env` from the working directory or one of its parents and returns
/// the path of the file that was read.
pub fn load_env_file() -> Option<PathBuf> {
    dotenv::dotenv().ok()
}

/// Re-applies every entry of a settings file, replacing values already present
/// in the process environment.
pub fn apply_env_file(path: &Path) -> Result<(), dotenv::Error> {
    for item in dotenv::from_path_iter(path)? {
        let (key, value) = item?;
        env::set_var(key, value);
    }
    Ok(())
}

impl Settings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn groq_timeout(&self) -> Duration {
        Duration::from_secs(self.groq_timeout_secs)
    }

    /// Re-reads the settings after `env_file` changed. A file that cannot be
    /// read or values that do not validate are logged and the current
    /// settings are kept.
    pub fn reloaded(&self, env_file: Option<&Path>, args: &[OsString], logger: &Logger) -> Settings {
        if let Some(path) = env_file {
            if let Err(e) = apply_env_file(path) {
                logger.error(
                    format_args!("Failed to read settings file {}: {}; keeping previous settings", path.display(), e)
                );
                return self.clone();
            }
        }

        match Settings::try_parse_from(args) {
            Ok(settings) => settings,
            Err(e) => {
                logger.error(format_args!("Invalid settings after reload: {}; keeping previous settings", e));
                self.clone()
            }
        }
    }

    pub fn log_summary(&self, logger: &Logger) {
        logger.info("--- Core Configuration ---");
        logger.info(format_args!("Bind Address: {}", self.bind_addr()));
        logger.info(format_args!("Auto Reload: {}", self.reload));
        logger.info(format_args!("Allowed Origins: {:?}", self.allowed_origins));
        logger.info(format_args!("Groq Model: {}", self.groq_model));
        logger.info(format_args!("Groq Base URL: {}", self.groq_base_url));
        logger.info(format_args!("Groq API Key Set: {}", self.groq_api_key.is_some()));
        logger.info(format_args!("Groq Timeout: {}s", self.groq_timeout_secs));
        logger.info(format_args!("Role Store Type: {:?}", self.role_store_type));
        if self.role_store_type == StoreType::Mongodb {
            logger.info(
                format_args!("Role Collection: {}.{}", self.mongodb_database, self.mongodb_collection)
            );
        }
        logger.info(format_args!("Log Level: {:?}", self.log_level));
        logger.info("-------------------------");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    const VARS: &[&str] = &[
        "HOST",
        "PORT",
        "RELOAD",
        "ALLOWED_ORIGINS",
        "GROQ_API_KEY",
        "GROQ_MODEL",
        "LOG_LEVEL",
        "GROQ_BASE_URL",
        "MONGODB_URI",
        "MONGODB_DATABASE",
        "MONGODB_COLLECTION",
        "ROLE_STORE_TYPE",
        "RELOAD_POLL_MS",
        "LOG_DIR",
        "GROQ_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn parse() -> Settings {
        Settings::try_parse_from(["persona-gateway"]).unwrap()
    }

    #[test]
    #[serial]
    fn defaults_apply_when_environment_is_empty() {
        clear_env();
        let settings = parse();

        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 5000);
        assert!(settings.reload);
        assert_eq!(settings.allowed_origins, AllowedOrigins::Any);
        assert_eq!(settings.groq_api_key, None);
        assert_eq!(settings.groq_model, "openai/gpt-oss-20b");
        assert_eq!(settings.log_level, LogLevel::Info);
        assert_eq!(settings.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(settings.mongodb_database, "custom_chatgpt");
        assert_eq!(settings.mongodb_collection, "personas");
        assert_eq!(settings.role_store_type, StoreType::Mongodb);
        assert_eq!(settings.groq_timeout(), Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear_env();
        env::set_var("HOST", "127.0.0.1");
        env::set_var("PORT", "8080");
        env::set_var("RELOAD", "False");
        env::set_var("ALLOWED_ORIGINS", "http://localhost:5173, https://chat.example.com");
        env::set_var("GROQ_API_KEY", "gsk_test");
        env::set_var("LOG_LEVEL", "DEBUG");
        env::set_var("ROLE_STORE_TYPE", "memory");

        let settings = parse();
        clear_env();

        assert_eq!(settings.bind_addr(), "127.0.0.1:8080");
        assert!(!settings.reload);
        assert_eq!(
            settings.allowed_origins,
            AllowedOrigins::List(vec![
                "http://localhost:5173".to_string(),
                "https://chat.example.com".to_string()
            ])
        );
        assert_eq!(settings.groq_api_key.as_deref(), Some("gsk_test"));
        assert_eq!(settings.log_level.to_level_filter(), LevelFilter::Debug);
        assert_eq!(settings.role_store_type, StoreType::Memory);
    }

    #[test]
    #[serial]
    fn port_zero_is_rejected() {
        clear_env();
        env::set_var("PORT", "0");
        let result = Settings::try_parse_from(["persona-gateway"]);
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    fn warning_is_accepted_as_a_level() {
        let level = LogLevel::from_str("WARNING", true).unwrap();
        assert_eq!(level, LogLevel::Warn);
    }

    #[test]
    fn origin_lists_drop_blanks_and_honour_the_wildcard() {
        assert_eq!(AllowedOrigins::parse("*").unwrap(), AllowedOrigins::Any);
        assert_eq!(AllowedOrigins::parse("http://a, *").unwrap(), AllowedOrigins::Any);
        assert_eq!(
            AllowedOrigins::parse(" http://a ,,http://b ").unwrap(),
            AllowedOrigins::List(vec!["http://a".to_string(), "http://b".to_string()])
        );
    }

    #[test]
    fn reload_flag_is_lenient() {
        assert_eq!(parse_flag("True"), Ok(true));
        assert_eq!(parse_flag("yes"), Ok(true));
        assert_eq!(parse_flag("False"), Ok(false));
        assert_eq!(parse_flag("anything"), Ok(false));
    }

    #[test]
    #[serial]
    fn settings_file_values_replace_the_environment() {
        clear_env();
        env::set_var("GROQ_MODEL", "old-model");
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "GROQ_MODEL=new-model\nPORT=6000\n").unwrap();

        apply_env_file(&path).unwrap();
        let settings = parse();
        clear_env();

        assert_eq!(settings.groq_model, "new-model");
        assert_eq!(settings.port, 6000);
    }

    fn reload_logger(dir: &Path) -> std::sync::Arc<Logger> {
        crate::logging::LoggerFactory::new(dir.join("logs"), LevelFilter::Info).get_logger("Config").unwrap()
    }

    #[test]
    #[serial]
    fn reload_picks_up_valid_changes() {
        clear_env();
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        let args = [OsString::from("persona-gateway")];
        let current = parse();

        fs::write(&path, "PORT=6100\nGROQ_TIMEOUT_SECS=5\n").unwrap();
        let next = current.reloaded(Some(&path), &args, &reload_logger(dir.path()));
        clear_env();

        assert_eq!(next.port, 6100);
        assert_eq!(next.groq_timeout(), Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn invalid_values_keep_the_previous_settings() {
        clear_env();
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        let args = [OsString::from("persona-gateway")];
        let logger = reload_logger(dir.path());
        let current = parse();

        for contents in ["PORT=0\n", "PORT=abc\n"] {
            fs::write(&path, contents).unwrap();
            let next = current.reloaded(Some(&path), &args, &logger);
            assert_eq!(next.port, 5000, "{}", contents.trim());
        }
        clear_env();
    }

    #[test]
    #[serial]
    fn unreadable_settings_file_keeps_the_previous_settings() {
        clear_env();
        let dir = tempdir().unwrap();
        let args = [OsString::from("persona-gateway")];
        env::set_var("PORT", "7000");
        let current = parse();
        env::set_var("PORT", "7100");

        let next = current.reloaded(Some(&dir.path().join("missing.env")), &args, &reload_logger(dir.path()));
        clear_env();

        assert_eq!(next.port, 7000);
    }
}
