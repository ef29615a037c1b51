//! Kilroy - a scene sharing server.
//!
//! This binary resolves configuration and secrets, then serves the resource
//! tree below `--dbdir`.

use clap::Parser;
use kilroy::prelude::*;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let secrets = match SecretStore::from_env() {
        Ok(secrets) => secrets,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Resource root: {}", config.dbdir.display());
    info!("  Deployment: {:?}", config.deployment);
    info!("  Session TTL: {}s", config.session_ttl_secs);
    if config.deployment.is_development() {
        warn!("  Failure detail is shown to clients. Use --env production when deployed.");
    }

    let storage = FileSystemStorage::new(&config.dbdir);
    let strategy = TestUserStrategy::new(secrets.test_user_auth());
    let app = KilroyServer::new(config.server_config(secrets)).build(storage, strategy);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Server listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "kilroy=debug,kilroy_server=debug,kilroy_fs=debug,tower_http=debug"
    } else {
        "kilroy=info,kilroy_server=info,kilroy_fs=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
