mod config;
mod error;
mod handler;
mod http;
mod ingest;
mod logger;
mod routing;
mod server;
mod store;
mod template;

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::config::{AppState, Config};
use crate::store::{PgProductStore, ProductStore};
use crate::template::Templates;

fn main() -> anyhow::Result<()> {
    // Config path from first CLI argument, default "config"
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)
        .with_context(|| format!("failed to load configuration '{config_path}'"))?;
    logger::init(&cfg)?;

    // One logical thread: a current-thread runtime driving a LocalSet
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let result = runtime.block_on(async_main(cfg));
    if let Err(e) = &result {
        logger::log_error(&format!("Server stopped: {e:#}"));
    }
    result
}

async fn async_main(cfg: Config) -> anyhow::Result<()> {
    let addr = cfg
        .get_socket_addr()
        .map_err(anyhow::Error::msg)?;

    handler::ensure_public_dirs(&cfg.resources)
        .await
        .context("failed to create public directories")?;

    // Serving against an unreachable database is pointless: fail fast
    let store = PgProductStore::connect(&cfg.database)
        .await
        .context("failed to connect to the database")?;
    store
        .ensure_schema()
        .await
        .context("failed to create the products table")?;

    if let Some(seed_file) = &cfg.resources.seed_file {
        let products = store::load_seed_file(seed_file).await?;
        let inserted = store.seed(&products).await.context("failed to seed products")?;
        if inserted > 0 {
            logger::log_info(&format!(
                "Seeded {inserted} products from {}",
                seed_file.display()
            ));
        }
    }

    let templates = Templates::load(&cfg.resources.template_dir).await;
    let pool = store.clone();
    let state = Arc::new(AppState::new(&cfg, Arc::new(store), templates));

    let listener = server::create_reusable_listener(addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await;

    pool.close().await;
    logger::log_info("Database pool closed, bye");
    Ok(())
}
