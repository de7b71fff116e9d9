pub mod config;
pub mod coordinator;
pub mod db;
pub mod docstore;
pub mod entities;
pub mod error;
pub mod images;
pub mod models;
pub mod onboarding;
pub mod preferences;
pub mod routes;
pub mod session;
pub mod tmdb;
pub mod watched;
pub mod watchlist;

use std::sync::Arc;

use crate::{
    coordinator::FilmCoordinator, images::ImageUrls, preferences::PreferencesStore,
    watched::WatchedHistory, watchlist::WatchlistStore,
};

pub struct AppState {
    pub coordinator: FilmCoordinator,
    pub watchlist: WatchlistStore,
    pub prefs: Arc<PreferencesStore>,
    pub watched: WatchedHistory,
    pub images: ImageUrls,
}

impl AppState {
    pub fn new(
        coordinator: FilmCoordinator,
        watchlist: WatchlistStore,
        prefs: Arc<PreferencesStore>,
        images: ImageUrls,
    ) -> Self {
        let watched = WatchedHistory::new(prefs.clone());
        Self { coordinator, watchlist, prefs, watched, images }
    }
}

pub(crate) fn now_ms() -> i64 {
    jiff::Timestamp::now().as_millisecond()
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;

    /// Serves `router` on an ephemeral local port and returns its base URL.
    pub(crate) async fn serve_local(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }
}
