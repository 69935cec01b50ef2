//! # Corridor
//!
//! Main entry point for the routing engine service.

use corridor::api::rest::handlers::AppState;
use corridor::api::rest::routes::create_router;
use corridor::application::pipeline::{
    DepositService, ExecutionService, QuoteService, RoutingPipeline, SimulatedOtcDesk,
    SimulatedStepExecutor,
};
use corridor::application::prefetch::PrefetchOrchestrator;
use corridor::application::router::Router;
use corridor::application::scorer::SettlementScorer;
use corridor::config::{AppConfig, FxFeedConfig};
use corridor::infrastructure::cache::EdgeCache;
use corridor::infrastructure::clock::{Clock, SystemClock};
use corridor::infrastructure::providers::fx::FxPair;
use corridor::infrastructure::providers::{
    BatchFxConfig, BatchFxProvider, QuoteProvider, SinglePairFxConfig, SinglePairFxProvider,
    StaticBookProvider,
};
use corridor::infrastructure::store::{KeyValueStore, MemoryStore, RedisStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

fn parse_pairs(feed: &FxFeedConfig) -> Vec<FxPair> {
    feed.pairs
        .iter()
        .filter_map(|code| {
            let (base, quote) = code.split_once('/')?;
            match FxPair::new(base, quote) {
                Ok(pair) => Some(pair),
                Err(e) => {
                    warn!(feed = feed.venue_id, pair = code, error = %e, "skipping malformed pair");
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .json()
        .init();

    info!("Starting corridor v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn KeyValueStore> = match &config.store.redis_url {
        Some(url) => {
            info!("connecting to redis store");
            Arc::new(RedisStore::connect(url).await?)
        }
        None => {
            info!("running on the in-memory store");
            Arc::new(MemoryStore::new(clock.clone()))
        }
    };

    let cache = Arc::new(EdgeCache::new(store.clone(), clock.clone()));

    // Providers per configuration.
    let mut providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
    if config.providers.static_book {
        providers.push(Arc::new(StaticBookProvider::with_default_book(
            clock.clone(),
        )));
    }
    if let Some(feed) = &config.providers.fx_single {
        let fx_config = SinglePairFxConfig::new(feed.venue_id.as_str(), feed.base_url.clone())
            .with_pairs(parse_pairs(feed));
        providers.push(Arc::new(SinglePairFxProvider::new(fx_config, clock.clone())?));
    }
    if let Some(feed) = &config.providers.fx_batch {
        let fx_config = BatchFxConfig::new(feed.venue_id.as_str(), feed.base_url.clone())
            .with_pairs(parse_pairs(feed));
        providers.push(Arc::new(BatchFxProvider::new(fx_config, clock.clone())?));
    }

    let orchestrator = Arc::new(PrefetchOrchestrator::new(
        cache.clone(),
        providers,
        config.prefetch.clone(),
    ));
    let prefetch_handles = orchestrator.spawn();

    // Pipeline wiring.
    let pipeline = Arc::new(RoutingPipeline::new(
        Arc::new(Router::new(cache.clone(), clock.clone())),
        Arc::new(SettlementScorer::new(config.scoring.clone())),
        Arc::new(QuoteService::new(store.clone(), clock.clone())),
        Arc::new(DepositService::new(
            store.clone(),
            clock.clone(),
            config.deposits.clone(),
        )),
        Arc::new(ExecutionService::new(
            store.clone(),
            clock.clone(),
            Arc::new(SimulatedStepExecutor::new(Duration::from_millis(
                config.executor.step_delay_ms,
            ))),
        )),
        Arc::new(SimulatedOtcDesk),
    ));

    let state = Arc::new(AppState { pipeline, cache });
    let router = create_router(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "corridor listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    for handle in prefetch_handles {
        handle.abort();
    }
    info!("corridor stopped");
    Ok(())
}
