//! Car listings - a CRUD backend for car listings.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use car_listings::{
    config::{CheckConfig, Cli, Command, ServeConfig, TokenConfig},
    listing::{ListingService, ListingStore, MongoListingStore},
    server::{create_router, Claims, JwtAuth, RouterConfig},
    upload::CloudinaryUploader,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Token(config) => run_token(config),
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("car-listings v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Cloudinary cloud: {}", config.cloud_name);
    info!("  Upload folder: {}", config.cloud_folder);
    if config.cloud_api_base != car_listings::upload::DEFAULT_CLOUDINARY_API_BASE {
        warn!("  Upload API: {} (non-default)", config.cloud_api_base);
    }
    info!("  Body limit: {} MiB", config.max_body_bytes / (1024 * 1024));
    match config.cors_origins {
        Some(ref origins) => info!("  CORS origins: {}", origins.join(", ")),
        None => info!("  CORS origins: any"),
    }

    info!("");
    info!("Connecting to MongoDB...");
    let store = match connect_store(&config.mongo_url, &config.mongo_database).await {
        Ok(store) => {
            info!("  Connected to database '{}'", store.database_name());
            store
        }
        Err(e) => {
            error!("  Failed to connect to MongoDB: {}", e);
            error!("");
            error!("  Please check:");
            error!("    - MONGO_URL points at a reachable server");
            error!("    - The credentials in the connection string are valid");
            return ExitCode::FAILURE;
        }
    };

    let uploader = CloudinaryUploader::new(config.cloudinary());
    let service = ListingService::new(store, uploader);
    let router = create_router(service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/listings", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Connect to MongoDB and make sure the server answers.
async fn connect_store(uri: &str, fallback_database: &str) -> Result<MongoListingStore, String> {
    let store = MongoListingStore::connect(uri, fallback_database)
        .await
        .map_err(|e| e.to_string())?;
    store.ping().await.map_err(|e| e.to_string())?;
    Ok(store)
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "car_listings=debug,tower_http=debug"
    } else {
        "car_listings=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new(config.jwt_secret.as_str())
        .with_max_body_bytes(config.max_body_bytes)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}

// =============================================================================
// Token Command
// =============================================================================

fn run_token(config: TokenConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let auth = JwtAuth::new(&config.jwt_secret);
    let token = if config.ttl == 0 {
        auth.issue_claims(&Claims {
            id: Some(config.user_id.clone()),
            ..Claims::default()
        })
    } else {
        auth.issue(&config.user_id, Duration::from_secs(config.ttl))
    };

    match token {
        Ok(token) => {
            println!("{}", token);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Car Listings Configuration Check");
    println!("═════════════════════════════════");
    println!();

    print!("Testing MongoDB connection... ");
    let store = match connect_store(&config.mongo_url, &config.mongo_database).await {
        Ok(store) => {
            println!("✓ success");
            println!("  Database: {}", store.database_name());
            store
        }
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - MONGO_URL points at a reachable server");
            println!("  - The credentials in the connection string are valid");
            return ExitCode::FAILURE;
        }
    };

    if config.count_listings {
        println!();
        print!("Counting listings... ");
        match store.list_all().await {
            Ok(listings) => println!("✓ {} listing(s)", listings.len()),
            Err(e) => {
                println!("✗ failed");
                println!("  Error: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    println!();
    println!("═════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
