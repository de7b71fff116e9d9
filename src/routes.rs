use std::{convert::Infallible, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post, put},
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        Actor, ActorDetail, Credits, Film, FilmDetail, Genre, UserPreferences, WatchedMovieInfo,
        WatchlistEntry,
    },
    session::SignedInUser,
    watched::WatchedOutcome,
};

type AppStateRef = State<Arc<AppState>>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/films/popular", get(popular))
        .route("/films/top-rated", get(top_rated))
        .route("/films/upcoming", get(upcoming))
        .route("/films/now-playing", get(now_playing))
        .route("/films/trending", get(trending))
        .route("/films/{id}", get(film_detail))
        .route("/films/{id}/credits", get(credits))
        .route("/films/{id}/similar", get(similar))
        .route("/genres", get(genres))
        .route("/genres/{id}/films", get(films_by_genre))
        .route("/search", get(search))
        .route("/actors/popular", get(popular_actors))
        .route("/actors/search", get(search_actors))
        .route("/actors/{id}", get(actor_detail))
        .route("/actors/{id}/films", get(films_by_actor))
        .route("/watchlist", get(watchlist).post(add_to_watchlist).delete(clear_watchlist))
        .route("/watchlist/count", get(watchlist_count))
        .route("/watchlist/toggle", post(toggle_watchlist))
        .route("/watchlist/events", get(watchlist_events))
        .route("/watchlist/{id}", get(watchlist_entry).delete(remove_from_watchlist))
        .route("/session", post(sign_in).delete(sign_out))
        .route("/preferences", get(preferences).put(write_preferences))
        .route("/preferences/genres", put(update_genres))
        .route("/preferences/watched", put(update_watched_ids))
        .route("/preferences/onboarding", get(onboarding_status).post(complete_onboarding))
        .route("/preferences/onboarding/complete", post(mark_onboarding_complete))
        .route("/watched", get(watched).post(add_watched))
        .route("/watched/{id}", axum::routing::delete(remove_watched))
        .route("/recommendations", get(recommendations))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

pub async fn popular(State(state): AppStateRef) -> Json<Vec<Film>> {
    Json(state.coordinator.popular().await)
}

pub async fn top_rated(State(state): AppStateRef) -> Json<Vec<Film>> {
    Json(state.coordinator.top_rated().await)
}

pub async fn upcoming(State(state): AppStateRef) -> Json<Vec<Film>> {
    Json(state.coordinator.upcoming().await)
}

pub async fn now_playing(State(state): AppStateRef) -> Json<Vec<Film>> {
    Json(state.coordinator.now_playing().await)
}

pub async fn trending(State(state): AppStateRef) -> Json<Vec<Film>> {
    Json(state.coordinator.trending().await)
}

pub async fn films_by_genre(State(state): AppStateRef, Path(id): Path<i32>) -> Json<Vec<Film>> {
    Json(state.coordinator.by_genre(id).await)
}

/// A blank query serves the popular listing instead of an empty result.
pub async fn search(State(state): AppStateRef, Query(q): Query<SearchQuery>) -> Json<Vec<Film>> {
    if q.query.trim().is_empty() {
        return Json(state.coordinator.popular().await);
    }
    Json(state.coordinator.search(&q.query).await)
}

pub async fn similar(State(state): AppStateRef, Path(id): Path<i32>) -> Json<Vec<Film>> {
    Json(state.coordinator.similar(id).await)
}

pub async fn genres(State(state): AppStateRef) -> Json<Vec<Genre>> {
    Json(state.coordinator.genres().await)
}

#[derive(Debug, Serialize)]
pub struct FilmDetailView {
    #[serde(flatten)]
    detail: FilmDetail,
    poster_url: Option<String>,
    in_watchlist: bool,
    watched: bool,
}

pub async fn film_detail(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<FilmDetailView>> {
    let detail = state.coordinator.film_detail(id).await?;
    let in_watchlist = state.watchlist.contains(id).await?;
    let watched = match state.prefs.session().current() {
        Some(_) => state.watched.is_watched(id).await.unwrap_or_else(|err| {
            tracing::warn!(film_id = id, error = %err, "watched lookup failed");
            false
        }),
        None => false,
    };
    let poster_url = state.images.poster(detail.poster_path.as_deref());
    Ok(Json(FilmDetailView { detail, poster_url, in_watchlist, watched }))
}

pub async fn credits(State(state): AppStateRef, Path(id): Path<i32>) -> AppResult<Json<Credits>> {
    Ok(Json(state.coordinator.credits(id).await?))
}

pub async fn popular_actors(State(state): AppStateRef) -> Json<Vec<Actor>> {
    Json(state.coordinator.popular_actors().await)
}

pub async fn search_actors(
    State(state): AppStateRef,
    Query(q): Query<SearchQuery>,
) -> Json<Vec<Actor>> {
    Json(state.coordinator.search_actors(&q.query).await)
}

#[derive(Debug, Serialize)]
pub struct ActorDetailView {
    #[serde(flatten)]
    detail: ActorDetail,
    profile_url: Option<String>,
}

pub async fn actor_detail(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<ActorDetailView>> {
    let detail = state.coordinator.actor_detail(id).await?;
    let profile_url = state.images.profile(detail.profile_path.as_deref());
    Ok(Json(ActorDetailView { detail, profile_url }))
}

pub async fn films_by_actor(State(state): AppStateRef, Path(id): Path<i32>) -> Json<Vec<Film>> {
    Json(state.coordinator.films_by_actor(id).await)
}

pub async fn watchlist(State(state): AppStateRef) -> AppResult<Json<Vec<WatchlistEntry>>> {
    Ok(Json(state.watchlist.entries().await?))
}

pub async fn add_to_watchlist(
    State(state): AppStateRef,
    Json(film): Json<Film>,
) -> AppResult<(StatusCode, Json<WatchlistEntry>)> {
    let entry = state.watchlist.add_film(&film).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn clear_watchlist(State(state): AppStateRef) -> AppResult<Json<Value>> {
    let removed = state.watchlist.clear().await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn watchlist_count(State(state): AppStateRef) -> AppResult<Json<Value>> {
    Ok(Json(json!({ "count": state.watchlist.count().await? })))
}

pub async fn watchlist_entry(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<WatchlistEntry>> {
    state
        .watchlist
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("watchlist entry {id}")))
}

pub async fn remove_from_watchlist(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    Ok(Json(json!({ "removed": state.watchlist.remove(id).await? })))
}

pub async fn toggle_watchlist(
    State(state): AppStateRef,
    Json(film): Json<Film>,
) -> AppResult<Json<Value>> {
    Ok(Json(json!({ "in_watchlist": state.watchlist.toggle(&film).await? })))
}

/// Pushes the full watchlist on connect and after every change.
pub async fn watchlist_events(
    State(state): AppStateRef,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = state.watchlist.observe_entries().map(|entries| {
        let event = match entries {
            Ok(entries) => Event::default()
                .event("watchlist")
                .json_data(&entries)
                .unwrap_or_else(|err| Event::default().event("error").data(err.to_string())),
            Err(err) => Event::default().event("error").data(err.to_string()),
        };
        Ok(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn sign_in(
    State(state): AppStateRef,
    Json(user): Json<SignedInUser>,
) -> AppResult<StatusCode> {
    if user.uid.trim().is_empty() {
        return Err(AppError::Invalid("uid is required".to_string()));
    }
    state.prefs.session().sign_in(user);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sign_out(State(state): AppStateRef) -> StatusCode {
    if let Some(user) = state.prefs.session().sign_out() {
        tracing::info!(uid = %user.uid, "signed out");
    }
    state.prefs.forget_local_state();
    StatusCode::NO_CONTENT
}

pub async fn preferences(State(state): AppStateRef) -> AppResult<Json<Option<UserPreferences>>> {
    Ok(Json(state.prefs.current().await?))
}

pub async fn write_preferences(
    State(state): AppStateRef,
    Json(prefs): Json<UserPreferences>,
) -> AppResult<Json<UserPreferences>> {
    Ok(Json(state.prefs.write(prefs).await?))
}

#[derive(Debug, Deserialize)]
pub struct GenresBody {
    genre_ids: Vec<i32>,
}

pub async fn update_genres(
    State(state): AppStateRef,
    Json(body): Json<GenresBody>,
) -> AppResult<StatusCode> {
    state.prefs.update_favorite_genres(&body.genre_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct WatchedIdsBody {
    film_ids: Vec<i32>,
}

pub async fn update_watched_ids(
    State(state): AppStateRef,
    Json(body): Json<WatchedIdsBody>,
) -> AppResult<StatusCode> {
    state.prefs.update_watched_movies(&body.film_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn onboarding_status(State(state): AppStateRef) -> AppResult<Json<Value>> {
    Ok(Json(json!({ "completed": state.prefs.is_onboarding_complete().await? })))
}

#[derive(Debug, Deserialize)]
pub struct OnboardingBody {
    #[serde(default)]
    favorite_genres: Vec<i32>,
    #[serde(default)]
    watched: Vec<Film>,
}

pub async fn complete_onboarding(
    State(state): AppStateRef,
    Json(body): Json<OnboardingBody>,
) -> AppResult<Json<UserPreferences>> {
    Ok(Json(state.prefs.complete_onboarding(body.favorite_genres, &body.watched).await?))
}

pub async fn mark_onboarding_complete(State(state): AppStateRef) -> AppResult<StatusCode> {
    state.prefs.mark_onboarding_complete().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn watched(State(state): AppStateRef) -> AppResult<Json<Vec<WatchedMovieInfo>>> {
    Ok(Json(state.watched.list().await?))
}

pub async fn add_watched(
    State(state): AppStateRef,
    Json(film): Json<Film>,
) -> AppResult<Json<WatchedOutcome>> {
    Ok(Json(state.watched.add(&film).await?))
}

pub async fn remove_watched(
    State(state): AppStateRef,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    Ok(Json(json!({ "removed": state.watched.remove(id).await? })))
}

/// Films from the user's first favourite genre.
pub async fn recommendations(State(state): AppStateRef) -> Json<Vec<Film>> {
    let genres = state.watched.favorite_genres().await;
    Json(state.coordinator.films_for_genres(&genres).await)
}
