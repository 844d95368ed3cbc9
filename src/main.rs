use checkout_engine::cache::store_redis::RedisPaymentCache;
use checkout_engine::cache::PaymentCache;
use checkout_engine::circuit::breaker::CircuitBreaker;
use checkout_engine::config::AppConfig;
use checkout_engine::http::routes::build_router;
use checkout_engine::repo::cards_repo::CardsRepo;
use checkout_engine::repo::fraud_repo::FraudRepo;
use checkout_engine::repo::payments_repo::PaymentsRepo;
use checkout_engine::repo::tokens_repo::TokensRepo;
use checkout_engine::service::payment_service::PaymentService;
use checkout_engine::service::token_service::{TokenService, TokenSettings};
use checkout_engine::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let cache: Option<Arc<dyn PaymentCache>> = if cfg.use_redis {
        let ttl = Duration::from_secs(cfg.payment_cache_ttl_seconds);
        Some(Arc::new(RedisPaymentCache::new(&cfg.redis_url, ttl)?))
    } else {
        tracing::info!("payment cache disabled, set USE_REDIS to enable");
        None
    };

    let payment_service = PaymentService {
        payments: Arc::new(PaymentsRepo { pool: pool.clone() }),
        cards: Arc::new(CardsRepo { pool: pool.clone() }),
        fraud: Arc::new(FraudRepo { pool: pool.clone() }),
        cache,
        breaker: CircuitBreaker::new("payment-engine", cfg.breaker.clone()),
        limits: cfg.limits.clone(),
        finalize_declines: cfg.finalize_declined_payments,
    };

    let token_service = TokenService::new(
        Arc::new(TokensRepo { pool: pool.clone() }),
        TokenSettings {
            secret: cfg.jwt_secret.clone(),
            access_ttl: chrono::Duration::minutes(cfg.jwt_access_expiration_minutes),
            refresh_ttl: chrono::Duration::days(cfg.jwt_refresh_expiration_days),
            leeway_seconds: cfg.jwt_leeway_seconds,
        },
    );

    let app = build_router(AppState {
        payment_service,
        token_service,
    });

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
