mod core;
mod features;
mod shared;

use crate::core::config::{Config, CounterBackend, RateLimitConfig};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::ai_content::{routes as ai_content_routes, ContentService, OpenAiChatClient};
use crate::features::ai_gate::AiGate;
use crate::features::auth::{self, IdentityResolver};
use crate::features::rate_limits::models::EndpointCategory;
use crate::features::rate_limits::stores::{
    CounterStore, MemoryCounterStore, PgCounterStore, RedisCounterStore,
};
use crate::features::rate_limits::workers::CounterPurger;
use crate::features::rate_limits::{
    routes as rate_limits_routes, RateLimitOptions, RateLimitService,
};
use crate::features::usage::{
    routes as usage_routes, PgUsageStore, UsageLogger, UsageRecorder, UsageSink,
};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Every AI category must be covered before anything is served
    config
        .rate_limit
        .policies
        .ensure_covers(&EndpointCategory::ALL)?;
    for policy in config.rate_limit.policies.iter() {
        tracing::info!(
            "Rate limit policy: {} = {} per {}s",
            policy.category,
            policy.max_requests,
            policy.window_secs()
        );
    }

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize auth
    let jwks_client = Arc::new(auth::JwksClient::new(
        &config.auth.jwks_url,
        config.auth.jwks_cache_ttl,
    ));
    let identity_resolver: Arc<dyn IdentityResolver> = Arc::new(auth::JwtValidator::new(
        jwks_client,
        config.auth.issuer.clone(),
        config.auth.audience.clone(),
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    // Initialize rate limiting
    let counter_store = counter_store(&config.rate_limit, &pool).await?;
    let rate_limit_service = Arc::new(RateLimitService::new(
        counter_store,
        config.rate_limit.policies.clone(),
        RateLimitOptions::from(&config.rate_limit),
    ));
    tracing::info!("Rate limit service initialized");

    // Initialize usage recording
    let usage_store = Arc::new(PgUsageStore::new(pool.clone()));
    let (usage_logger, usage_receiver) = UsageLogger::channel(config.usage.channel_capacity);
    let recorder = UsageRecorder::new(
        usage_receiver,
        Arc::clone(&usage_store) as Arc<dyn UsageSink>,
        config.usage.batch_size,
    );
    let usage_recorder = tokio::spawn(async move {
        recorder.run().await;
    });
    tracing::info!("Usage recorder worker spawned");

    let ai_gate = Arc::new(AiGate::new(
        Arc::clone(&identity_resolver),
        Arc::clone(&rate_limit_service),
        usage_logger,
    ));

    // Initialize AI content generation
    let chat_model = Arc::new(OpenAiChatClient::new(&config.ai)?);
    let content_service = Arc::new(ContentService::new(chat_model));
    tracing::info!(
        "AI content service initialized (model: {}, provider: {})",
        config.ai.model,
        config.ai.base_url
    );

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Gated AI routes authenticate inside the gate
    let gated_routes = ai_content_routes::routes(content_service, &ai_gate)?;

    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(rate_limits_routes::routes(Arc::clone(&rate_limit_service)))
        .merge(rate_limits_routes::admin_routes(Arc::clone(
            &rate_limit_service,
        )))
        .merge(usage_routes::routes(Arc::clone(&usage_store)))
        .merge(usage_routes::admin_routes(Arc::clone(&usage_store)))
        .route_layer(axum::middleware::from_fn_with_state(
            identity_resolver,
            middleware::auth_middleware,
        ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(gated_routes)
        .merge(protected_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the last logger lets the recorder flush what is queued and exit
    drop(ai_gate);
    if let Err(e) = usage_recorder.await {
        tracing::warn!("Usage recorder ended abnormally: {}", e);
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Connect the configured counter backend
async fn counter_store(
    config: &RateLimitConfig,
    pool: &sqlx::PgPool,
) -> anyhow::Result<Arc<dyn CounterStore>> {
    let store: Arc<dyn CounterStore> = match config.backend {
        CounterBackend::Postgres => {
            let store = Arc::new(PgCounterStore::new(pool.clone()));
            let purger = CounterPurger::new(Arc::clone(&store), config.purge_interval);
            tokio::spawn(async move {
                purger.run().await;
            });
            tracing::info!("Rate limit counter purger spawned");
            store
        }
        CounterBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("REDIS_URL is required for the redis backend"))?;
            Arc::new(RedisCounterStore::connect(url).await?)
        }
        CounterBackend::Memory => {
            tracing::warn!(
                "Using in-memory rate limit counters: quotas are per process and reset on restart"
            );
            Arc::new(MemoryCounterStore::new())
        }
    };

    tracing::info!("Rate limit counters stored in {}", store.backend_name());
    Ok(store)
}
