use std::sync::Arc;

use movie_recommender::{
    config::Config,
    routes::{create_router, AppState},
    services::{CsvCatalog, MovieCatalog},
    views::Views,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let catalog = CsvCatalog::from_config(&config);
    let files = catalog.files();
    tracing::info!(
        sorted_movies = %files.sorted_movies.display(),
        average_movies = %files.average_movies.display(),
        favorites = %files.favorites.display(),
        cache = config.cache_datasets,
        "Using recommendation files"
    );
    let catalog: Arc<dyn MovieCatalog> = Arc::new(catalog);

    let views = Views::from_config(&config)?;
    let state = Arc::new(AppState::new(catalog, views));

    // Create the router with all routes
    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
