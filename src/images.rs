//! Poster and profile image URLs on the catalog's image CDN.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageSize {
    W185,
    W200,
    W300,
    W342,
    W500,
    Original,
}

impl ImageSize {
    pub fn as_segment(self) -> &'static str {
        match self {
            ImageSize::W185 => "w185",
            ImageSize::W200 => "w200",
            ImageSize::W300 => "w300",
            ImageSize::W342 => "w342",
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImageUrls {
    base_url: String,
}

impl ImageUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// `None` when the catalog returned no path for the image.
    pub fn url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        let path = path.map(str::trim).filter(|p| !p.is_empty())?;
        let sep = if path.starts_with('/') { "" } else { "/" };
        Some(format!(
            "{}/{}{}{}",
            self.base_url.trim_end_matches('/'),
            size.as_segment(),
            sep,
            path
        ))
    }

    pub fn poster(&self, path: Option<&str>) -> Option<String> {
        self.url(path, ImageSize::W500)
    }

    pub fn profile(&self, path: Option<&str>) -> Option<String> {
        self.url(path, ImageSize::W200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_size_and_path() {
        let urls = ImageUrls::new("https://image.tmdb.org/t/p/");
        assert_eq!(
            urls.poster(Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(
            urls.url(Some("xyz.png"), ImageSize::W185).as_deref(),
            Some("https://image.tmdb.org/t/p/w185/xyz.png")
        );
    }

    #[test]
    fn missing_path_has_no_url() {
        let urls = ImageUrls::new("https://image.tmdb.org/t/p");
        assert_eq!(urls.poster(None), None);
        assert_eq!(urls.profile(Some("  ")), None);
    }
}
