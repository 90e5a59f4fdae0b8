use std::sync::Arc;

use tracing::{error, info};

use kodama::provider::{ItemProvider, QuestProvider};
use kodama::{ChannelServer, CharacterRegistry, Config, ScriptEngine, ScriptRegistry};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = kodama::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        kodama::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = run(config).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> kodama::Result<()> {
    config.validate()?;

    let items = ItemProvider::load(&config.data.items)?;
    let quests = QuestProvider::load(&config.data.quests)?;
    let characters = CharacterRegistry::with_timeout(config.lock.acquire_timeout());
    let scripts = ScriptRegistry::with_content();
    info!("Registered {} scripts", scripts.len());

    let engine = Arc::new(ScriptEngine::new(
        &config.script,
        scripts,
        Arc::new(characters),
        Arc::new(items),
        Arc::new(quests),
    ));

    info!("kodama channel server");
    let server = ChannelServer::bind(&config.server).await?;
    server.run(engine).await
}
