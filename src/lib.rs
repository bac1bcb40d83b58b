pub mod config;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod server;
pub mod store;

use clap::Parser;
use config::Settings;
use logging::LoggerFactory;
use server::api::AppState;
use server::{ shutdown_signal, Server, ShutdownReason };
use std::error::Error;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Builds the application state for one server generation.
pub fn build_state(settings: &Settings, loggers: &LoggerFactory) -> Result<AppState, Box<dyn Error + Send + Sync>> {
    let chat = llm::new_client(settings, loggers.get_logger("GroqClient")?)?;
    let roles = store::create_role_store_provider(settings, loggers.get_logger("RoleStore")?);
    Ok(AppState {
        chat,
        roles,
        logger: loggers.get_logger("Api")?,
    })
}

/// Runs the gateway until Ctrl-C. With auto-reload on, a change to `env_file`
/// stops the server, re-reads the settings and starts it again.
pub async fn run(env_file: Option<PathBuf>) -> Result<(), Box<dyn Error + Send + Sync>> {
    let args: Vec<OsString> = std::env::args_os().collect();
    let mut settings = Settings::parse_from(&args);
    let loggers = LoggerFactory::new(&settings.log_dir, settings.log_level.to_level_filter());
    let logger = loggers.get_logger("App")?;

    loop {
        settings.log_summary(&*loggers.get_logger("Config")?);

        let watch = match (settings.reload, &env_file) {
            (true, Some(path)) => {
                logger.info(format_args!("Auto reload enabled, watching {}", path.display()));
                Some(path.clone())
            }
            (true, None) => {
                logger.warn("Auto reload enabled but no settings file was loaded; running static");
                None
            }
            (false, _) => None,
        };

        let state = build_state(&settings, &loggers)?;
        logger.info(format_args!("Chat model: {}", state.chat.get_model()));
        logger.info(
            format_args!(
                "Starting server on {}, reload={}",
                settings.bind_addr(),
                settings.reload
            )
        );

        let poll = Duration::from_millis(settings.reload_poll_ms.max(1));
        let server = Server::new(settings.clone(), state, logger.clone());
        match server.run(shutdown_signal(watch, poll)).await? {
            ShutdownReason::Signal => break,
            ShutdownReason::SettingsChanged => {
                logger.info("Settings file changed, reloading...");
                settings = settings.reloaded(env_file.as_deref(), &args, &logger);
            }
        }
    }

    logger.info("Shutdown complete");
    Ok(())
}
