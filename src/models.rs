use serde::{Deserialize, Serialize};

pub const UNKNOWN_TITLE: &str = "Unknown Title";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl Film {
    pub fn rating(&self) -> f64 {
        self.vote_average.unwrap_or(0.0)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }

    /// First four characters of the release date, when there is one.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|d| d.get(..4))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilmDetail {
    pub id: i32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl FilmDetail {
    pub fn rating(&self) -> f64 {
        self.vote_average.unwrap_or(0.0)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN_TITLE)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cast {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credits {
    pub id: i32,
    #[serde(default)]
    pub cast: Vec<Cast>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub known_for_department: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub known_for: Vec<Film>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorDetail {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub profile_path: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub place_of_birth: Option<String>,
    #[serde(default)]
    pub known_for_department: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorCredits {
    pub id: i32,
    #[serde(default)]
    pub cast: Vec<Film>,
}

/// One page of a paginated catalog listing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: i32,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: f64,
    pub release_date: Option<String>,
    /// Epoch milliseconds.
    pub added_date: i64,
}

impl WatchlistEntry {
    pub fn from_film(film: &Film, added_date: i64) -> Self {
        Self {
            id: film.id,
            title: film.display_title().to_string(),
            overview: film.overview.clone(),
            poster_path: film.poster_path.clone(),
            vote_average: film.rating(),
            release_date: film.release_date.clone(),
            added_date,
        }
    }

    pub fn from_detail(detail: &FilmDetail, added_date: i64) -> Self {
        Self {
            id: detail.id,
            title: detail.display_title().to_string(),
            overview: detail.overview.clone(),
            poster_path: detail.poster_path.clone(),
            vote_average: detail.rating(),
            release_date: detail.release_date.clone(),
            added_date,
        }
    }
}

/// Per-user preferences document. Field names match the stored document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub favorite_genres: Vec<i32>,
    pub watched_movies: Vec<i32>,
    pub watched_movies_details: Vec<WatchedMovieInfo>,
    pub onboarding_completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserPreferences {
    pub fn has_watched(&self, film_id: i32) -> bool {
        self.watched_movies.contains(&film_id)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchedMovieInfo {
    pub movie_id: i32,
    pub title: String,
    pub poster_url: String,
    pub genre: String,
    pub release_year: String,
    pub rating: f64,
    pub watched_date: i64,
    pub notes: String,
    pub personal_rating: f64,
}

impl WatchedMovieInfo {
    pub fn from_film(film: &Film, watched_date: i64) -> Self {
        Self {
            movie_id: film.id,
            title: film.display_title().to_string(),
            poster_url: film.poster_path.clone().unwrap_or_default(),
            genre: String::new(),
            release_year: film.release_year().unwrap_or_default().to_string(),
            rating: film.rating(),
            watched_date,
            notes: String::new(),
            personal_rating: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn film_decodes_from_catalog_payload_with_missing_fields() {
        let film: Film =
            serde_json::from_str(r#"{"id": 550, "title": "Fight Club", "vote_average": 8.4}"#)
                .unwrap();
        assert_eq!(film.id, 550);
        assert_eq!(film.poster_path, None);
        assert_eq!(film.rating(), 8.4);

        let untitled: Film = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(untitled.display_title(), UNKNOWN_TITLE);
        assert_eq!(untitled.rating(), 0.0);
    }

    #[test]
    fn preferences_use_document_field_names() {
        let prefs = UserPreferences {
            user_id: "uid-1".into(),
            favorite_genres: vec![28, 35],
            onboarding_completed: true,
            created_at: 1_000,
            ..UserPreferences::default()
        };

        let value = serde_json::to_value(&prefs).unwrap();
        assert_eq!(value["userId"], "uid-1");
        assert_eq!(value["onboardingCompleted"], true);
        assert_eq!(value["favoriteGenres"], serde_json::json!([28, 35]));
        assert_eq!(value["createdAt"], 1_000);
        assert!(value.get("watchedMoviesDetails").is_some());
    }

    #[test]
    fn preferences_tolerate_sparse_documents() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"userId": "u", "watchedMovies": [3]}"#).unwrap();
        assert!(prefs.has_watched(3));
        assert!(!prefs.onboarding_completed);
        assert!(prefs.watched_movies_details.is_empty());
    }

    #[test]
    fn watched_info_takes_release_year_prefix() {
        let film = Film {
            id: 7,
            title: Some("Se7en".into()),
            overview: None,
            poster_path: Some("/p.jpg".into()),
            vote_average: Some(8.3),
            release_date: Some("1995-09-22".into()),
        };
        let info = WatchedMovieInfo::from_film(&film, 42);
        assert_eq!(info.release_year, "1995");
        assert_eq!(info.poster_url, "/p.jpg");
        assert_eq!(info.watched_date, 42);
    }
}
