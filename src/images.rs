pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    PosterMedium,
    PosterLarge,
    ProfileMedium,
}

impl ImageSize {
    pub fn token(&self) -> &'static str {
        match self {
            ImageSize::PosterMedium => "w342",
            ImageSize::PosterLarge => "w500",
            ImageSize::ProfileMedium => "w185",
        }
    }
}

/// `None` when the record has no image; callers render a placeholder.
pub fn image_url(size: ImageSize, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{IMAGE_BASE}/{}{p}", size.token()))
}
