//! geocodable - resolve addresses and measure distances between them
//!
//! This is the composition root that wires together all the components.
//! Every argument is a query; the first one is the origin for distances.

use geocodable::adapters::outbound::{
    CannedGeocodeProvider, HttpGeocodeProvider, HttpProviderConfig, SqliteGeocodeStore,
};
use geocodable::config::load_config;
use geocodable::{DistanceEngine, GeocodeCache, GeocodeProvider};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let queries: Vec<String> = std::env::args().skip(1).collect();
    if queries.is_empty() {
        eprintln!("usage: geocodable <query> [<query> ...]");
        return Ok(());
    }

    tracing::info!(
        "starting geocodable db={} units={} formula={}",
        cfg.db_path,
        cfg.units,
        cfg.formula
    );

    // ===== COMPOSITION ROOT =====

    // 1. Create outbound adapters
    let store = Arc::new(SqliteGeocodeStore::open(cfg.db_path.clone()).await?);

    let timeout = Duration::from_secs(cfg.provider_timeout_secs);
    let provider: Arc<dyn GeocodeProvider> = if cfg.offline {
        tracing::info!("offline mode, answering from the built-in table");
        Arc::new(CannedGeocodeProvider::fixtures())
    } else {
        Arc::new(HttpGeocodeProvider::new(HttpProviderConfig {
            base_url: cfg.provider_url.clone(),
            user_agent: cfg.user_agent.clone(),
            timeout,
        })?)
    };

    // 2. Create application service
    let cache = GeocodeCache::new(store, provider).with_timeout(timeout);

    // 3. Resolve and report
    let mut resolved = Vec::with_capacity(queries.len());
    for query in &queries {
        let geocode = cache.find_or_create_by_query(query).await?;
        match &geocode {
            Some(g) => println!("{}\t{}\t{}", query.trim(), g.coordinates(), g.precision),
            None => println!("{}\tnot found", query.trim()),
        }
        resolved.push(geocode);
    }

    let Some(origin) = resolved.first() else {
        return Ok(());
    };
    for (query, geocode) in queries.iter().zip(&resolved).skip(1) {
        let distance = DistanceEngine::distance(origin.as_ref(), geocode.as_ref(), cfg.units, cfg.formula)?;
        if let Some(d) = distance {
            println!("{} -> {}\t{:.2} {}", queries[0].trim(), query.trim(), d, cfg.units);
        }
    }

    Ok(())
}
