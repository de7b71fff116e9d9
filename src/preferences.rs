use std::{sync::Arc, time::Duration};

use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    docstore::{DocumentStore, Fields},
    error::{AppResult, StoreError},
    models::{Film, UserPreferences, WatchedMovieInfo},
    now_ms,
    onboarding::OnboardingFlags,
    session::{Session, SignedInUser},
};

pub const COLLECTION: &str = "userPreferences";

/// The per-user preferences document in the cloud store.
///
/// Two write paths exist for the same fields: [`PreferencesStore::write`]
/// replaces the whole document, the `update_*`/`mark_*` helpers patch single
/// fields. Neither carries a version, so concurrent writers race with
/// last-writer-wins.
pub struct PreferencesStore {
    docs: Arc<dyn DocumentStore>,
    session: Session,
    flags: Arc<OnboardingFlags>,
    write_timeout: Duration,
}

impl PreferencesStore {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        session: Session,
        flags: Arc<OnboardingFlags>,
        write_timeout: Duration,
    ) -> Self {
        Self { docs, session, flags, write_timeout }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `Ok(None)` when the user has no preferences yet.
    pub async fn read(&self, user_id: &str) -> AppResult<Option<UserPreferences>> {
        let Some(doc) = self.docs.get(COLLECTION, user_id).await? else {
            debug!(user_id = %user_id, "no preferences document");
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(doc)?))
    }

    pub async fn current(&self) -> AppResult<Option<UserPreferences>> {
        let user = self.session.require()?;
        self.read(&user.uid).await
    }

    /// Overwrites the signed-in user's document with `prefs`, stamping the
    /// identity fields and `updatedAt`.
    pub async fn write(&self, prefs: UserPreferences) -> AppResult<UserPreferences> {
        let user = self.session.require()?;
        let prefs = stamp(prefs, &user);

        if let Err(err) = self.docs.enable_network().await {
            warn!(error = %err, "failed to enable network, writing anyway");
        }

        let doc = serde_json::to_value(&prefs)?;
        match tokio::time::timeout(self.write_timeout, self.docs.set(COLLECTION, &user.uid, doc))
            .await
        {
            Err(_) => {
                warn!(
                    uid = %user.uid,
                    timeout_secs = self.write_timeout.as_secs(),
                    "preferences write timed out"
                );
                return Err(StoreError::Timeout.into());
            },
            Ok(Err(err)) => {
                warn!(uid = %user.uid, error = %err, "preferences write failed");
                return Err(err.into());
            },
            Ok(Ok(())) => {},
        }
        info!(uid = %user.uid, "saved preferences");

        match self.docs.get(COLLECTION, &user.uid).await {
            Ok(Some(_)) => debug!(uid = %user.uid, "verified preferences write"),
            Ok(None) => warn!(uid = %user.uid, "preferences document missing right after write"),
            Err(err) => warn!(uid = %user.uid, error = %err, "could not verify preferences write"),
        }

        Ok(prefs)
    }

    /// Final onboarding step: writes a fresh document with the chosen genres
    /// and already-watched films, then records the local flag.
    pub async fn complete_onboarding(
        &self,
        favorite_genres: Vec<i32>,
        watched: &[Film],
    ) -> AppResult<UserPreferences> {
        let now = now_ms();
        let prefs = UserPreferences {
            favorite_genres,
            watched_movies: watched.iter().map(|f| f.id).collect(),
            watched_movies_details: watched
                .iter()
                .map(|f| WatchedMovieInfo::from_film(f, now))
                .collect(),
            onboarding_completed: true,
            created_at: now,
            ..UserPreferences::default()
        };

        let saved = self.write(prefs).await?;
        self.remember_onboarded(&saved.user_id);
        Ok(saved)
    }

    pub async fn update_favorite_genres(&self, genre_ids: &[i32]) -> AppResult<()> {
        self.patch("favoriteGenres", json!(genre_ids)).await
    }

    pub async fn update_watched_movies(&self, film_ids: &[i32]) -> AppResult<()> {
        self.patch("watchedMovies", json!(film_ids)).await
    }

    pub async fn mark_onboarding_complete(&self) -> AppResult<()> {
        self.patch("onboardingCompleted", json!(true)).await?;
        let user = self.session.require()?;
        self.remember_onboarded(&user.uid);
        Ok(())
    }

    /// Local flag first; falls back to the remote document and caches a
    /// positive answer.
    pub async fn is_onboarding_complete(&self) -> AppResult<bool> {
        let user = self.session.require()?;
        if self.flags.is_complete(&user.uid) {
            return Ok(true);
        }

        let done = self.read(&user.uid).await?.is_some_and(|p| p.onboarding_completed);
        debug!(uid = %user.uid, done = done, "remote onboarding status");
        if done {
            self.remember_onboarded(&user.uid);
        }
        Ok(done)
    }

    /// Drops locally cached state, e.g. on sign-out.
    pub fn forget_local_state(&self) {
        if let Err(err) = self.flags.clear() {
            warn!(error = %err, "failed to clear onboarding flags");
        }
    }

    async fn patch(&self, field: &str, value: serde_json::Value) -> AppResult<()> {
        let user = self.session.require()?;

        let mut fields = Fields::new();
        fields.insert(field.to_string(), value);
        fields.insert("updatedAt".to_string(), json!(now_ms()));

        self.docs.update(COLLECTION, &user.uid, fields).await.inspect_err(|err| {
            warn!(uid = %user.uid, field = %field, error = %err, "preferences patch failed")
        })?;
        debug!(uid = %user.uid, field = %field, "patched preferences");
        Ok(())
    }

    fn remember_onboarded(&self, user_id: &str) {
        if let Err(err) = self.flags.mark(user_id) {
            warn!(user_id = %user_id, error = %err, "failed to persist onboarding flag");
        }
    }
}

fn stamp(mut prefs: UserPreferences, user: &SignedInUser) -> UserPreferences {
    prefs.user_id = user.uid.clone();
    prefs.email = user.email.clone().unwrap_or_default();
    prefs.updated_at = now_ms();
    if prefs.created_at == 0 {
        prefs.created_at = prefs.updated_at;
    }
    prefs
}
