//! Patient Registration - Entry point.

use anyhow::Context;
use patient_registration::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    config::Config,
    FileStore, LogNotifier, MailRelayNotifier, MemoryStore, Notifier, RandomPincodeGenerator,
    RecordStore, RegistrationCoordinator, RegistrationPolicy, UuidGenerator,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Patient Registration service");

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    // Initialize storage
    let store: Arc<dyn RecordStore> = if config.store.persist {
        let store = FileStore::open(&config.store.path)
            .await
            .with_context(|| format!("Failed to open store at {:?}", config.store.path))?;
        info!(
            "Loaded {} registrations from {:?}",
            store.count().await?,
            store.path()
        );
        Arc::new(store)
    } else {
        warn!("Persistence disabled, registrations will be lost on restart");
        Arc::new(MemoryStore::new())
    };

    // Initialize email delivery
    let notifier: Arc<dyn Notifier> = match &config.notifier.relay_url {
        Some(url) => {
            let relay = MailRelayNotifier::new(
                url.clone(),
                config.notifier.sender.clone(),
                config.notifier.api_token.clone(),
                config.notifier.timeout(),
            )
            .context("Failed to create mail relay client")?;

            if relay.health_check().await {
                info!(relay_url = %url, "Delivering pincodes through mail relay");
            } else {
                warn!(relay_url = %url, "Mail relay not reachable yet, registrations will fail until it is");
            }
            Arc::new(relay)
        }
        None => {
            warn!("No mail relay configured, pincode emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let policy = RegistrationPolicy::new(config.registration.max_attempts);
    info!(max_attempts = policy.max_attempts, "Registration policy loaded");

    let coordinator = RegistrationCoordinator::new(
        Arc::new(UuidGenerator),
        Arc::new(RandomPincodeGenerator::new(config.registration.pincode_digits)),
        notifier,
        store,
        policy,
    );

    // Create router with rate limiting
    let state = AppState::new(coordinator);
    let rate_limit = RateLimitState::new(config.rate_limit.global_per_minute);
    let app = create_router_with_rate_limit(state, rate_limit);

    let ip: IpAddr = config
        .server
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
