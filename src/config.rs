use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    pub tmdb_rps: u32,
    pub database_url: String,
    pub prefs_base_url: Option<String>,
    pub prefs_token: Option<String>,
    pub prefs_write_timeout: Duration,
    pub onboarding_cache_path: PathBuf,
    pub listing_pages: u32,
    pub search_pages: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let addr = bind_addr(std::env::var("HOST").ok(), std::env::var("PORT").ok())?;

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_image_base_url = std::env::var("TMDB_IMAGE_BASE_URL")
            .unwrap_or_else(|_| "https://image.tmdb.org/t/p".to_string());

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(20);

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://reelkeep.db?mode=rwc".to_string());

        let prefs_base_url = std::env::var("PREFS_BASE_URL").ok().filter(|s| !s.trim().is_empty());
        let prefs_token = std::env::var("PREFS_TOKEN").ok().filter(|s| !s.trim().is_empty());

        let prefs_write_timeout_secs: u64 = std::env::var("PREFS_WRITE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let onboarding_cache_path = std::env::var("ONBOARDING_CACHE_PATH")
            .unwrap_or_else(|_| "reelkeep-onboarding.json".to_string())
            .into();

        let listing_pages: u32 =
            std::env::var("LISTING_PAGES").ok().and_then(|s| s.parse().ok()).unwrap_or(3);

        let search_pages: u32 =
            std::env::var("SEARCH_PAGES").ok().and_then(|s| s.parse().ok()).unwrap_or(2);

        Ok(Self {
            addr,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_image_base_url,
            tmdb_rps,
            database_url,
            prefs_base_url,
            prefs_token,
            prefs_write_timeout: Duration::from_secs(prefs_write_timeout_secs),
            onboarding_cache_path,
            listing_pages: listing_pages.max(1),
            search_pages: search_pages.max(1),
        })
    }
}

/// Loopback on port 3000 unless `HOST`/`PORT` are set.
fn bind_addr(host: Option<String>, port: Option<String>) -> anyhow::Result<SocketAddr> {
    let host = host.filter(|h| !h.trim().is_empty()).unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = port.as_deref().unwrap_or("3000").parse().context("PORT")?;
    format!("{host}:{port}").parse().context("HOST/PORT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_to_loopback_by_default() {
        let addr = bind_addr(None, None).unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn host_and_port_override_the_default() {
        let addr = bind_addr(Some("0.0.0.0".into()), Some("8080".into())).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
        assert!(bind_addr(None, Some("http".into())).is_err());
    }
}
