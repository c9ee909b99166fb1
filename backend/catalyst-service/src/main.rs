use actix_web::{dev::Service, web, App, HttpServer};
use anyhow::Context;
use catalyst_cache::{CachePort, JsonCache, MemoryCache, MemoryCacheConfig, RedisCache};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalyst_service::config::{CacheBackend, CacheConfig, Config};
use catalyst_service::db::{
    self, PgBranchRepository, PgInteractionRepository, PgTimelineRepository,
    PgTrendingRepository,
};
use catalyst_service::handlers::{self, AppState};
use catalyst_service::jobs::trending_refresh::{start_trending_refresh, TrendingRefreshConfig};
use catalyst_service::metrics;
use catalyst_service::middleware::GatewayIdentity;
use catalyst_service::services::{
    BranchService, InteractionService, TimelineService, TrendingService,
};

async fn build_cache(config: &CacheConfig) -> anyhow::Result<JsonCache> {
    let ttl = Duration::from_secs(config.ttl_secs);

    let port: Arc<dyn CachePort> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new(&MemoryCacheConfig {
            max_capacity: config.max_capacity,
            ttl,
            eviction: config.eviction,
        })),
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("REDIS_URL is required for the redis cache backend")?;
            Arc::new(
                RedisCache::connect(url, ttl)
                    .await
                    .context("failed to connect to Redis")?,
            )
        }
    };

    info!(backend = port.backend(), ttl_secs = config.ttl_secs, "Timeline cache ready");
    Ok(JsonCache::new(port))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting catalyst-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let pool = db::create_pool(&config.database)
        .await
        .context("database pool creation failed")?;

    if config.database.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("database migrations failed")?;
        info!("Database migrations applied");
    }

    let cache = build_cache(&config.cache).await?;

    let trending = Arc::new(TrendingService::new(
        Arc::new(PgTrendingRepository::new(pool.clone())),
        config.trending.window_days,
    ));
    let timeline = Arc::new(TimelineService::new(
        Arc::new(PgTimelineRepository::new(pool.clone())),
        cache,
        config.timeline.page_size,
        config.timeline.global_source_limit,
    ));
    let interactions = Arc::new(InteractionService::new(
        Arc::new(PgInteractionRepository::new(pool.clone())),
        timeline.clone(),
    ));
    let branches = Arc::new(BranchService::new(
        Arc::new(PgBranchRepository::new(pool.clone())),
        timeline.clone(),
    ));

    let refresh_service = trending.clone();
    let refresh_config = TrendingRefreshConfig::from(&config.trending);
    tokio::spawn(async move {
        start_trending_refresh(refresh_service, refresh_config).await;
    });

    let state = web::Data::new(AppState {
        trending,
        timeline,
        interactions,
        branches,
    });

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    info!("HTTP server listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(GatewayIdentity)
            .wrap(TracingLogger::default())
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req
                    .match_pattern()
                    .unwrap_or_else(|| req.path().to_string());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    let result = fut.await;
                    metrics::observe_http_request(
                        &method,
                        &path,
                        metrics::response_status(&result),
                        start.elapsed(),
                    );
                    result
                }
            })
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/api/v1/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
