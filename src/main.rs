use std::sync::Arc;

use storefront_core::core::config::Config;
use storefront_core::features::categories::CategoryService;
use storefront_core::features::products::ProductService;
use storefront_core::features::reviews::RatingAggregator;
use storefront_core::modules::memory::MemoryCatalogStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded for {} (empty rating policy: {})",
        config.app.name,
        config.catalog.empty_rating_policy
    );

    let store = match &config.catalog.seed_path {
        Some(path) => {
            let store = MemoryCatalogStore::from_seed_file(path).await?;
            tracing::info!("Catalog seeded from {}", path);
            store
        }
        None => {
            tracing::warn!("CATALOG_SEED_PATH not set, starting with an empty catalog");
            MemoryCatalogStore::new()
        }
    };
    let store = Arc::new(store);

    let category_service = CategoryService::new(store.clone());
    let product_service = ProductService::new(store.clone());
    let aggregator = RatingAggregator::new(store.clone(), &config.catalog);

    // Seed files may carry stale cached ratings
    let refreshed = aggregator.refresh_all().await?;
    tracing::info!(
        "Refreshed ratings of {} products ({} in stock)",
        refreshed,
        product_service.list().await?.len()
    );

    let output = match &config.catalog.root_slug {
        Some(slug) => serde_json::to_string_pretty(&category_service.products_tree(slug).await?)?,
        None => serde_json::to_string_pretty(&category_service.list_tree().await?)?,
    };
    println!("{}", output);

    Ok(())
}
