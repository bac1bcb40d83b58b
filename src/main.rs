use persona_gateway::config::load_env_file;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let env_file = load_env_file();
    // Application components log through their own named loggers; this only
    // surfaces records emitted by dependencies.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    persona_gateway::run(env_file).await
}
