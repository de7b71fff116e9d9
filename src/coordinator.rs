use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    error::AppResult,
    models::{Actor, ActorDetail, Credits, Film, FilmDetail, Genre, Page},
    tmdb::CatalogGateway,
};

#[derive(Clone, Copy, Debug)]
pub struct CoordinatorConfig {
    /// Pages concatenated for the aggregated listings.
    pub listing_pages: u32,
    /// Upper bound on search pages.
    pub search_pages: u32,
    /// A page shorter than this ends a search early.
    pub full_page_size: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { listing_pages: 3, search_pages: 2, full_page_size: 20 }
    }
}

/// Listings served by multi-page aggregation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Listing {
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
    ByGenre(i32),
}

impl Listing {
    pub fn label(self) -> &'static str {
        match self {
            Listing::Popular => "popular",
            Listing::TopRated => "top_rated",
            Listing::Upcoming => "upcoming",
            Listing::NowPlaying => "now_playing",
            Listing::ByGenre(_) => "by_genre",
        }
    }
}

/// Aggregates catalog pages and applies the fallback chains.
///
/// Every list accessor comes in two flavours: `try_*` returns the error left
/// over once every fallback has failed, the plain one logs it and yields an
/// empty list.
#[derive(Clone)]
pub struct FilmCoordinator {
    gateway: Arc<dyn CatalogGateway>,
    config: CoordinatorConfig,
}

impl FilmCoordinator {
    pub fn new(gateway: Arc<dyn CatalogGateway>, config: CoordinatorConfig) -> Self {
        Self { gateway, config }
    }

    pub async fn try_listing(&self, listing: Listing) -> AppResult<Vec<Film>> {
        match self.fetch_listing_pages(listing).await {
            Ok(films) => Ok(films),
            Err(err) => {
                warn!(
                    listing = listing.label(),
                    error = %err,
                    "multi-page fetch failed, falling back to first page"
                );
                Ok(self.fetch_listing_page(listing, 1).await?.results)
            },
        }
    }

    pub async fn listing(&self, listing: Listing) -> Vec<Film> {
        collapse(self.try_listing(listing).await, listing.label())
    }

    pub async fn popular(&self) -> Vec<Film> {
        self.listing(Listing::Popular).await
    }

    pub async fn top_rated(&self) -> Vec<Film> {
        self.listing(Listing::TopRated).await
    }

    pub async fn upcoming(&self) -> Vec<Film> {
        self.listing(Listing::Upcoming).await
    }

    pub async fn now_playing(&self) -> Vec<Film> {
        self.listing(Listing::NowPlaying).await
    }

    pub async fn by_genre(&self, genre_id: i32) -> Vec<Film> {
        self.listing(Listing::ByGenre(genre_id)).await
    }

    /// Films for a set of favourite genres. Only the first genre is queried.
    pub async fn films_for_genres(&self, genre_ids: &[i32]) -> Vec<Film> {
        match genre_ids.first() {
            Some(&genre_id) => self.by_genre(genre_id).await,
            None => Vec::new(),
        }
    }

    pub async fn try_search(&self, query: &str) -> AppResult<Vec<Film>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        match self.fetch_search_pages(query).await {
            Ok(films) => Ok(films),
            Err(err) => {
                warn!(
                    query = %query,
                    error = %err,
                    "multi-page search failed, falling back to first page"
                );
                Ok(self.gateway.search_films(query, 1).await?.results)
            },
        }
    }

    pub async fn search(&self, query: &str) -> Vec<Film> {
        collapse(self.try_search(query).await, "search")
    }

    /// Similar films, substituting recommendations when the lookup fails.
    pub async fn try_similar(&self, film_id: i32) -> AppResult<Vec<Film>> {
        match self.gateway.similar(film_id, 1).await {
            Ok(page) => Ok(page.results),
            Err(err) => {
                warn!(
                    film_id = film_id,
                    error = %err,
                    "similar lookup failed, trying recommendations"
                );
                Ok(self.gateway.recommended(film_id, 1).await?.results)
            },
        }
    }

    pub async fn similar(&self, film_id: i32) -> Vec<Film> {
        collapse(self.try_similar(film_id).await, "similar")
    }

    pub async fn try_trending(&self) -> AppResult<Vec<Film>> {
        Ok(self.gateway.trending(1).await?.results)
    }

    pub async fn trending(&self) -> Vec<Film> {
        collapse(self.try_trending().await, "trending")
    }

    pub async fn try_genres(&self) -> AppResult<Vec<Genre>> {
        self.gateway.genres().await
    }

    pub async fn genres(&self) -> Vec<Genre> {
        collapse(self.try_genres().await, "genres")
    }

    pub async fn try_popular_actors(&self) -> AppResult<Vec<Actor>> {
        Ok(self.gateway.popular_actors(1).await?.results)
    }

    pub async fn popular_actors(&self) -> Vec<Actor> {
        collapse(self.try_popular_actors().await, "popular_actors")
    }

    pub async fn try_search_actors(&self, query: &str) -> AppResult<Vec<Actor>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.gateway.search_actors(query, 1).await?.results)
    }

    pub async fn search_actors(&self, query: &str) -> Vec<Actor> {
        collapse(self.try_search_actors(query).await, "search_actors")
    }

    pub async fn try_films_by_actor(&self, actor_id: i32) -> AppResult<Vec<Film>> {
        Ok(self.gateway.actor_credits(actor_id).await?.cast)
    }

    pub async fn films_by_actor(&self, actor_id: i32) -> Vec<Film> {
        collapse(self.try_films_by_actor(actor_id).await, "films_by_actor")
    }

    pub async fn film_detail(&self, film_id: i32) -> AppResult<FilmDetail> {
        self.gateway.film_detail(film_id).await
    }

    pub async fn credits(&self, film_id: i32) -> AppResult<Credits> {
        self.gateway.credits(film_id).await
    }

    pub async fn actor_detail(&self, actor_id: i32) -> AppResult<ActorDetail> {
        self.gateway.actor_detail(actor_id).await
    }

    async fn fetch_listing_page(&self, listing: Listing, page: u32) -> AppResult<Page<Film>> {
        match listing {
            Listing::Popular => self.gateway.popular(page).await,
            Listing::TopRated => self.gateway.top_rated(page).await,
            Listing::Upcoming => self.gateway.upcoming(page).await,
            Listing::NowPlaying => self.gateway.now_playing(page).await,
            Listing::ByGenre(genre_id) => self.gateway.by_genre(genre_id, page).await,
        }
    }

    async fn fetch_listing_pages(&self, listing: Listing) -> AppResult<Vec<Film>> {
        let mut out = Vec::new();
        for page in 1..=self.config.listing_pages {
            let films = self.fetch_listing_page(listing, page).await?.results;
            debug!(
                listing = listing.label(),
                page = page,
                count = films.len(),
                "fetched listing page"
            );
            out.extend(films);
        }
        Ok(out)
    }

    async fn fetch_search_pages(&self, query: &str) -> AppResult<Vec<Film>> {
        let mut out = Vec::new();
        for page in 1..=self.config.search_pages {
            let films = self.gateway.search_films(query, page).await?.results;
            let last = films.len() < self.config.full_page_size;
            debug!(query = %query, page = page, count = films.len(), "fetched search page");
            out.extend(films);
            if last {
                break;
            }
        }
        Ok(out)
    }
}

fn collapse<T>(result: AppResult<Vec<T>>, what: &str) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            warn!(accessor = what, error = %err, "list request failed, returning empty");
            Vec::new()
        },
    }
}
