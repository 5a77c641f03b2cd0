use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::PasswordHasher;
use auth::TokenSigner;
use identity_service::config::Config;
use identity_service::config::EmailTransport;
use identity_service::config::StoreBackend;
use identity_service::domain::user::email::LinkBuilder;
use identity_service::domain::user::ports::IdentityServicePort;
use identity_service::domain::user::ports::UserRepository;
use identity_service::domain::user::service::IdentityService;
use identity_service::domain::user::tokens::spawn_cleanup;
use identity_service::domain::user::tokens::TokenLifetimes;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::email::HttpEmailSender;
use identity_service::outbound::email::LogEmailSender;
use identity_service::outbound::repositories::InMemoryUserRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        backend = ?config.database.backend,
        http_port = config.server.http_port,
        email_transport = ?config.email.transport,
        public_base_url = %config.email.public_base_url,
        "Configuration loaded"
    );

    let password_hasher = PasswordHasher::with_params((&config.hashing).into())?;
    let token_signer = TokenSigner::new(
        config.jwt.secret.as_bytes(),
        chrono::Duration::hours(config.jwt.expiration_hours),
    );
    let authenticator = Arc::new(Authenticator::new(password_hasher, token_signer)?);

    let identity_service = match config.database.backend {
        StoreBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            build_service(
                Arc::new(PostgresUserRepository::new(pg_pool)),
                &config,
                Arc::clone(&authenticator),
            )?
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory user store, accounts are lost on restart");
            build_service(
                Arc::new(InMemoryUserRepository::new()),
                &config,
                Arc::clone(&authenticator),
            )?
        }
    };

    if config.tokens.cleanup_interval_minutes > 0 {
        spawn_cleanup(
            Arc::clone(&identity_service),
            Duration::from_secs(config.tokens.cleanup_interval_minutes * 60),
        );
        tracing::info!(
            interval_minutes = config.tokens.cleanup_interval_minutes,
            "Expired token cleanup scheduled"
        );
    }

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(identity_service, authenticator)).await?;

    tracing::info!("Server exited");
    Ok(())
}

fn build_service<UR>(
    repository: Arc<UR>,
    config: &Config,
    authenticator: Arc<Authenticator>,
) -> Result<Arc<dyn IdentityServicePort>, anyhow::Error>
where
    UR: UserRepository,
{
    let lifetimes = TokenLifetimes::from(&config.tokens);
    let links = LinkBuilder::new(config.email.public_base_url.as_str());

    let service: Arc<dyn IdentityServicePort> = match config.email.transport {
        EmailTransport::Http => Arc::new(IdentityService::new(
            repository,
            Arc::new(HttpEmailSender::new(&config.email)?),
            authenticator,
            lifetimes,
            links,
        )),
        EmailTransport::Log => Arc::new(IdentityService::new(
            repository,
            Arc::new(LogEmailSender),
            authenticator,
            lifetimes,
            links,
        )),
    };

    Ok(service)
}
