use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    models::{Film, UserPreferences, WatchedMovieInfo},
    now_ms,
    preferences::PreferencesStore,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchedOutcome {
    Added,
    AlreadyWatched,
}

/// Watched-film history stored inside the preferences document. The id list
/// and the detail list are rewritten together with a full-document write.
#[derive(Clone)]
pub struct WatchedHistory {
    prefs: Arc<PreferencesStore>,
}

impl WatchedHistory {
    pub fn new(prefs: Arc<PreferencesStore>) -> Self {
        Self { prefs }
    }

    pub async fn add(&self, film: &Film) -> AppResult<WatchedOutcome> {
        let mut prefs = self.load().await?;
        if prefs.has_watched(film.id) {
            debug!(film_id = film.id, "already watched");
            return Ok(WatchedOutcome::AlreadyWatched);
        }

        prefs.watched_movies.push(film.id);
        prefs.watched_movies_details.push(WatchedMovieInfo::from_film(film, now_ms()));
        self.prefs.write(prefs).await?;
        debug!(film_id = film.id, "marked watched");
        Ok(WatchedOutcome::Added)
    }

    /// Returns `false` when the film was not in the history.
    pub async fn remove(&self, film_id: i32) -> AppResult<bool> {
        let mut prefs = self.load().await?;
        if !prefs.has_watched(film_id) {
            warn!(film_id = film_id, "film not in watched history");
            return Ok(false);
        }

        prefs.watched_movies.retain(|&id| id != film_id);
        prefs.watched_movies_details.retain(|d| d.movie_id != film_id);
        self.prefs.write(prefs).await?;
        debug!(film_id = film_id, "removed from watched history");
        Ok(true)
    }

    pub async fn is_watched(&self, film_id: i32) -> AppResult<bool> {
        Ok(self.prefs.current().await?.is_some_and(|p| p.has_watched(film_id)))
    }

    pub async fn list(&self) -> AppResult<Vec<WatchedMovieInfo>> {
        Ok(self.prefs.current().await?.map(|p| p.watched_movies_details).unwrap_or_default())
    }

    /// Read failures degrade to an empty list.
    pub async fn watched_ids(&self) -> Vec<i32> {
        self.read_or_default().await.watched_movies
    }

    /// Read failures degrade to an empty list.
    pub async fn favorite_genres(&self) -> Vec<i32> {
        self.read_or_default().await.favorite_genres
    }

    async fn load(&self) -> AppResult<UserPreferences> {
        self.prefs
            .current()
            .await?
            .ok_or_else(|| AppError::NotFound("user preferences".to_string()))
    }

    async fn read_or_default(&self) -> UserPreferences {
        match self.prefs.current().await {
            Ok(prefs) => prefs.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "failed to read preferences");
                UserPreferences::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::tests::signed_in_store;

    fn film(id: i32) -> Film {
        Film {
            id,
            title: Some(format!("Film {id}")),
            overview: None,
            poster_path: Some(format!("/{id}.jpg")),
            vote_average: Some(7.5),
            release_date: Some("2014-11-05".into()),
        }
    }

    async fn history(dir: &tempfile::TempDir) -> WatchedHistory {
        let (store, _) = signed_in_store(dir);
        let store = Arc::new(store);
        store
            .write(UserPreferences { favorite_genres: vec![878], ..UserPreferences::default() })
            .await
            .unwrap();
        WatchedHistory::new(store)
    }

    #[tokio::test]
    async fn add_keeps_ids_and_details_in_lockstep() {
        let dir = tempfile::tempdir().unwrap();
        let history = history(&dir).await;

        assert_eq!(history.add(&film(157336)).await.unwrap(), WatchedOutcome::Added);
        assert_eq!(history.add(&film(157336)).await.unwrap(), WatchedOutcome::AlreadyWatched);
        assert_eq!(history.add(&film(27205)).await.unwrap(), WatchedOutcome::Added);

        assert_eq!(history.watched_ids().await, [157336, 27205]);
        let details = history.list().await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].release_year, "2014");
        assert!(history.is_watched(27205).await.unwrap());
    }

    #[tokio::test]
    async fn remove_drops_both_lists() {
        let dir = tempfile::tempdir().unwrap();
        let history = history(&dir).await;
        history.add(&film(1)).await.unwrap();
        history.add(&film(2)).await.unwrap();

        assert!(history.remove(1).await.unwrap());
        assert!(!history.remove(1).await.unwrap());

        assert_eq!(history.watched_ids().await, [2]);
        let details = history.list().await.unwrap();
        assert_eq!(details.iter().map(|d| d.movie_id).collect::<Vec<_>>(), [2]);
        assert_eq!(history.favorite_genres().await, [878]);
    }

    #[tokio::test]
    async fn adding_without_preferences_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = signed_in_store(&dir);
        let history = WatchedHistory::new(Arc::new(store));

        assert!(matches!(history.add(&film(1)).await, Err(AppError::NotFound(_))));
        assert!(history.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn signed_out_reads_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = history(&dir).await;
        history.prefs.session().sign_out();

        assert!(history.watched_ids().await.is_empty());
        assert!(history.favorite_genres().await.is_empty());
        assert!(history.is_watched(1).await.is_err());
    }
}
