use std::{sync::Arc, time::Duration};

use reelkeep::{
    AppState,
    config::Config,
    coordinator::{CoordinatorConfig, FilmCoordinator},
    db,
    docstore::{DocumentStore, MemoryDocumentStore, RestDocumentStore},
    images::ImageUrls,
    onboarding::OnboardingFlags,
    preferences::PreferencesStore,
    routes,
    session::Session,
    tmdb::TmdbClient,
    watchlist::WatchlistStore,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelkeep=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let http = wreq::Client::builder().timeout(Duration::from_secs(30)).build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;

    let tmdb = TmdbClient::new(
        http.clone(),
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );
    let coordinator = FilmCoordinator::new(
        Arc::new(tmdb),
        CoordinatorConfig {
            listing_pages: config.listing_pages,
            search_pages: config.search_pages,
            ..CoordinatorConfig::default()
        },
    );

    let docs: Arc<dyn DocumentStore> = match &config.prefs_base_url {
        Some(url) => {
            Arc::new(RestDocumentStore::new(http.clone(), url.clone(), config.prefs_token.clone()))
        },
        None => {
            tracing::warn!("PREFS_BASE_URL not set, preferences are kept in memory");
            Arc::new(MemoryDocumentStore::new())
        },
    };
    let flags = Arc::new(OnboardingFlags::load(&config.onboarding_cache_path));
    let prefs = PreferencesStore::new(docs, Session::new(), flags, config.prefs_write_timeout);

    let state = Arc::new(AppState::new(
        coordinator,
        WatchlistStore::new(db),
        Arc::new(prefs),
        ImageUrls::new(config.tmdb_image_base_url.clone()),
    ));

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
