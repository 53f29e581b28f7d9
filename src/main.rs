//! LingoBee API server

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lingobee::{
    auth::JwtValidator,
    config::Args,
    db::{MemoryStore, MongoClient, MongoStore, Store},
    server,
    services::{seed, Catalog},
    storage::FileStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("lingobee={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  LingoBee API");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!("Uploads: {}", args.upload_dir.display());
    info!("======================================");

    let jwt = match args.jwt_secret.clone().filter(|s| !s.is_empty()) {
        Some(secret) => JwtValidator::new(secret, args.jwt_expiry_seconds)?,
        None => {
            warn!("JWT_SECRET not set, using dev secret");
            JwtValidator::new_dev()
        }
    };

    let mut seeded = false;
    let store: Arc<dyn Store> = match connect_mongo(&args).await {
        Ok(store) => {
            info!("MongoDB connected successfully (db: {})", store.db_name());
            Arc::new(store)
        }
        Err(e) if args.dev_mode => {
            warn!("MongoDB connection failed (dev mode, using memory store): {}", e);
            let store = MemoryStore::new();
            if args.seed_file.is_none() {
                seed::import(&store, Catalog::demo()?).await?;
                seeded = true;
            }
            Arc::new(store)
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.seed_file {
        let catalog = Catalog::load(path).await?;
        let summary = seed::import(store.as_ref(), catalog).await?;
        info!(
            "Seed file {} imported: {} sections, {} nodes",
            path.display(),
            summary.sections,
            summary.nodes
        );
    } else if !seeded {
        info!("No SEED_FILE configured; using catalog already in the store");
    }

    let files = FileStore::new(&args.upload_dir, &args.public_url).await?;

    let state = Arc::new(server::AppState::new(args, store, jwt, files));

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn connect_mongo(args: &Args) -> lingobee::Result<MongoStore> {
    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    MongoStore::new(&client).await
}
