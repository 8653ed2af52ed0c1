use std::sync::Arc;

use tracing::{error, info};

use filestore::{Config, FileStore, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = filestore::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filestore::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("FileStore - flat file storage server");

    let store = match FileStore::open(&config.files.storage_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(
                "Failed to open storage root {}: {}",
                config.files.storage_path, e
            );
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(&config.server, &config.files, store) {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
