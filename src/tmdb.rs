use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::AppResult,
    models::{Actor, ActorCredits, ActorDetail, Credits, Film, FilmDetail, Genre, Page},
};

/// Typed access to the remote movie catalog. One method per endpoint; no
/// retries, no fallbacks.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn popular(&self, page: u32) -> AppResult<Page<Film>>;
    async fn top_rated(&self, page: u32) -> AppResult<Page<Film>>;
    async fn upcoming(&self, page: u32) -> AppResult<Page<Film>>;
    async fn now_playing(&self, page: u32) -> AppResult<Page<Film>>;
    async fn trending(&self, page: u32) -> AppResult<Page<Film>>;
    async fn by_genre(&self, genre_id: i32, page: u32) -> AppResult<Page<Film>>;
    async fn search_films(&self, query: &str, page: u32) -> AppResult<Page<Film>>;
    async fn film_detail(&self, film_id: i32) -> AppResult<FilmDetail>;
    async fn credits(&self, film_id: i32) -> AppResult<Credits>;
    async fn similar(&self, film_id: i32, page: u32) -> AppResult<Page<Film>>;
    async fn recommended(&self, film_id: i32, page: u32) -> AppResult<Page<Film>>;
    async fn genres(&self) -> AppResult<Vec<Genre>>;
    async fn popular_actors(&self, page: u32) -> AppResult<Page<Actor>>;
    async fn search_actors(&self, query: &str, page: u32) -> AppResult<Page<Actor>>;
    async fn actor_detail(&self, actor_id: i32) -> AppResult<ActorDetail>;
    async fn actor_credits(&self, actor_id: i32) -> AppResult<ActorCredits>;
}

pub struct TmdbClient {
    client: wreq::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: wreq::Client, api_key: String, base_url: String, rps: u32) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no TMDB_API_KEY provided, catalog requests will be rejected");
        }

        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(rps.max(1)).unwrap_or(NonZeroU32::MIN),
        )));
        Self { client, api_key, base_url, limiter }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!(path = %path, "catalog request");

        let resp = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(resp)
    }

    async fn page(&self, path: &str, page: u32) -> AppResult<Page<Film>> {
        self.get(path, &[("page", page.to_string())]).await
    }
}

#[async_trait]
impl CatalogGateway for TmdbClient {
    async fn popular(&self, page: u32) -> AppResult<Page<Film>> {
        self.page("movie/popular", page).await
    }

    async fn top_rated(&self, page: u32) -> AppResult<Page<Film>> {
        self.page("movie/top_rated", page).await
    }

    async fn upcoming(&self, page: u32) -> AppResult<Page<Film>> {
        self.page("movie/upcoming", page).await
    }

    async fn now_playing(&self, page: u32) -> AppResult<Page<Film>> {
        self.page("movie/now_playing", page).await
    }

    async fn trending(&self, page: u32) -> AppResult<Page<Film>> {
        self.page("trending/movie/week", page).await
    }

    async fn by_genre(&self, genre_id: i32, page: u32) -> AppResult<Page<Film>> {
        self.get(
            "discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("sort_by", "popularity.desc".to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    async fn search_films(&self, query: &str, page: u32) -> AppResult<Page<Film>> {
        self.get("search/movie", &[("query", query.to_string()), ("page", page.to_string())])
            .await
    }

    async fn film_detail(&self, film_id: i32) -> AppResult<FilmDetail> {
        self.get(&format!("movie/{film_id}"), &[]).await
    }

    async fn credits(&self, film_id: i32) -> AppResult<Credits> {
        self.get(&format!("movie/{film_id}/credits"), &[]).await
    }

    async fn similar(&self, film_id: i32, page: u32) -> AppResult<Page<Film>> {
        self.page(&format!("movie/{film_id}/similar"), page).await
    }

    async fn recommended(&self, film_id: i32, page: u32) -> AppResult<Page<Film>> {
        self.page(&format!("movie/{film_id}/recommendations"), page).await
    }

    async fn genres(&self) -> AppResult<Vec<Genre>> {
        let resp: GenreList = self.get("genre/movie/list", &[]).await?;
        Ok(resp.genres)
    }

    async fn popular_actors(&self, page: u32) -> AppResult<Page<Actor>> {
        self.get("person/popular", &[("page", page.to_string())]).await
    }

    async fn search_actors(&self, query: &str, page: u32) -> AppResult<Page<Actor>> {
        self.get("search/person", &[("query", query.to_string()), ("page", page.to_string())])
            .await
    }

    async fn actor_detail(&self, actor_id: i32) -> AppResult<ActorDetail> {
        self.get(&format!("person/{actor_id}"), &[]).await
    }

    async fn actor_credits(&self, actor_id: i32) -> AppResult<ActorCredits> {
        self.get(&format!("person/{actor_id}/movie_credits"), &[]).await
    }
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Vec<Genre>,
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Mutex};

    use axum::{
        Json, Router,
        extract::Query,
        http::{StatusCode, Uri},
        response::IntoResponse,
    };
    use serde_json::json;

    use super::*;
    use crate::{error::AppError, testing::serve_local};

    type Requests = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

    /// Catalog server that answers every path with a body every response type
    /// decodes from. `/movie/13` fails with a 500 and `/person/13` sends a
    /// body that is not JSON.
    async fn catalog(api_key: &str) -> (TmdbClient, Requests) {
        let requests = Requests::default();
        let seen = requests.clone();
        let router = Router::new().fallback(
            move |uri: Uri, Query(params): Query<HashMap<String, String>>| {
                let seen = seen.clone();
                async move {
                    let path = uri.path().to_string();
                    seen.lock().unwrap().push((path.clone(), params));
                    match path.as_str() {
                        "/movie/13" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                        "/person/13" => "<html>not json</html>".into_response(),
                        _ => Json(json!({
                            "id": 1,
                            "name": "stub",
                            "page": 1,
                            "results": [{"id": 550, "title": "Fight Club"}],
                            "genres": [],
                            "cast": []
                        }))
                        .into_response(),
                    }
                }
            },
        );
        let base_url = format!("{}/", serve_local(router).await);
        let client = TmdbClient::new(wreq::Client::new(), api_key.to_string(), base_url, 1000);
        (client, requests)
    }

    fn paths(requests: &Requests) -> Vec<String> {
        requests.lock().unwrap().iter().map(|(path, _)| path.clone()).collect()
    }

    #[tokio::test]
    async fn every_endpoint_hits_its_path_with_the_api_key() {
        let (client, requests) = catalog("secret").await;

        assert_eq!(client.popular(1).await.unwrap().results[0].id, 550);
        client.top_rated(1).await.unwrap();
        client.upcoming(1).await.unwrap();
        client.now_playing(1).await.unwrap();
        client.trending(1).await.unwrap();
        client.by_genre(878, 1).await.unwrap();
        client.search_films("dune", 1).await.unwrap();
        client.film_detail(550).await.unwrap();
        client.credits(550).await.unwrap();
        client.similar(550, 1).await.unwrap();
        client.recommended(550, 1).await.unwrap();
        assert!(client.genres().await.unwrap().is_empty());
        client.popular_actors(1).await.unwrap();
        client.search_actors("pitt", 1).await.unwrap();
        assert_eq!(client.actor_detail(287).await.unwrap().name, "stub");
        client.actor_credits(287).await.unwrap();

        assert_eq!(
            paths(&requests),
            [
                "/movie/popular",
                "/movie/top_rated",
                "/movie/upcoming",
                "/movie/now_playing",
                "/trending/movie/week",
                "/discover/movie",
                "/search/movie",
                "/movie/550",
                "/movie/550/credits",
                "/movie/550/similar",
                "/movie/550/recommendations",
                "/genre/movie/list",
                "/person/popular",
                "/search/person",
                "/person/287",
                "/person/287/movie_credits",
            ]
        );
        assert!(
            requests
                .lock()
                .unwrap()
                .iter()
                .all(|(_, params)| params.get("api_key").map(String::as_str) == Some("secret"))
        );
    }

    #[tokio::test]
    async fn page_genre_and_query_are_forwarded() {
        let (client, requests) = catalog("k").await;

        client.popular(3).await.unwrap();
        client.by_genre(878, 2).await.unwrap();
        client.search_films("star wars", 4).await.unwrap();
        client.search_actors("brad pitt", 1).await.unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].1["page"], "3");

        assert_eq!(requests[1].1["with_genres"], "878");
        assert_eq!(requests[1].1["sort_by"], "popularity.desc");
        assert_eq!(requests[1].1["page"], "2");

        assert_eq!(requests[2].1["query"], "star wars");
        assert_eq!(requests[2].1["page"], "4");

        assert_eq!(requests[3].0, "/search/person");
        assert_eq!(requests[3].1["query"], "brad pitt");
    }

    #[tokio::test]
    async fn error_status_and_bad_body_surface_as_http_errors() {
        let (client, _) = catalog("k").await;

        assert!(matches!(client.film_detail(13).await, Err(AppError::Http(_))));
        assert!(matches!(client.actor_detail(13).await, Err(AppError::Http(_))));
    }

    #[test]
    fn listing_page_decodes() {
        let body = r#"{
            "page": 2,
            "results": [{"id": 1, "title": "A"}, {"id": 2, "title": null, "poster_path": "/b.jpg"}],
            "total_pages": 500,
            "total_results": 10000
        }"#;
        let page: Page<Film> = serde_json::from_str(body).unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].poster_path.as_deref(), Some("/b.jpg"));
        assert_eq!(page.total_pages, 500);
    }

    #[test]
    fn genre_list_decodes() {
        let body = r#"{"genres": [{"id": 28, "name": "Action"}, {"id": 35, "name": "Comedy"}]}"#;
        let list: GenreList = serde_json::from_str(body).unwrap();
        assert_eq!(list.genres.len(), 2);
        assert_eq!(list.genres[0].name, "Action");
    }

    #[test]
    fn actor_credits_decode_films() {
        let body =
            r#"{"id": 287, "cast": [{"id": 550, "title": "Fight Club", "character": "Tyler"}]}"#;
        let credits: ActorCredits = serde_json::from_str(body).unwrap();
        assert_eq!(credits.cast[0].id, 550);
    }
}
