use actix_web::{middleware, web, App, HttpServer};
use std::sync::{Arc, Mutex};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod handlers;

use bankroll::config::{ServerConfig, StakingConfig};
use bankroll::data::{open_store, CachedStore, Store, SystemClock};

pub type SharedStore = CachedStore<Box<dyn Store + Send + Sync>, SystemClock>;

/// Application state shared across handlers
pub struct AppState {
    pub store: Mutex<SharedStore>,
    pub staking: StakingConfig,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let config = ServerConfig::from_env();
    let addr = config.bind_addr();

    info!("Using data directory {:?}", config.data_dir);
    if let Some(mirror) = &config.mirror_dir {
        info!("Mirroring saves to {:?}", mirror);
    }

    let store = open_store(&config.data_dir, config.mirror_dir.as_deref());
    let app_state = Arc::new(AppState {
        store: Mutex::new(CachedStore::new(store, config.cache_ttl_ms(), SystemClock)),
        staking: StakingConfig::default(),
    });

    info!("Starting Bankroll API server at http://{}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::routes)
    })
    .bind(&addr)?
    .run()
    .await
}
