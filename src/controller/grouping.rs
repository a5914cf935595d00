use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};

use crate::models::{Movie, MoviesByYear};

/// Label for movies without a parseable release date.
pub const UNKNOWN_YEAR: &str = "Unknown";

pub fn release_year(date: Option<&str>) -> Option<String> {
    let date = date?.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| format!("{:04}", d.year()))
}

/// Dedupes by id (first wins), buckets by release year, orders each bucket
/// by descending release date and the buckets by descending label. Labels
/// compare as strings.
pub fn group_by_year(movies: &[Movie]) -> Vec<MoviesByYear> {
    let mut seen = HashSet::new();
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<Movie>> = HashMap::new();

    for movie in movies.iter().filter(|m| seen.insert(m.id)) {
        let year = release_year(movie.release_date.as_deref())
            .unwrap_or_else(|| UNKNOWN_YEAR.to_string());
        if !buckets.contains_key(&year) {
            order.push(year.clone());
        }
        buckets.entry(year).or_default().push(movie.clone());
    }

    let mut groups: Vec<MoviesByYear> = order
        .into_iter()
        .map(|year| {
            let mut movies = buckets.remove(&year).unwrap_or_default();
            movies.sort_by(|a, b| b.release_date.cmp(&a.release_date));
            MoviesByYear { year, movies }
        })
        .collect();
    groups.sort_by(|a, b| b.year.cmp(&a.year));
    groups
}

pub fn flatten(groups: &[MoviesByYear]) -> Vec<Movie> {
    groups.iter().flat_map(|g| g.movies.iter().cloned()).collect()
}
