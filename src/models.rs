use serde::{Deserialize, Serialize};

use crate::images::{self, ImageSize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: f64,
    pub is_on_watchlist: bool,
}

impl Movie {
    pub fn poster_url(&self, size: ImageSize) -> Option<String> {
        images::image_url(size, self.poster_path.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub tagline: Option<String>,
    pub revenue: i64,
    pub release_date: Option<String>,
    pub status: Option<String>,
    pub vote_average: f64,
    pub vote_count: i32,
    pub genres: Vec<String>,
    pub runtime_minutes: Option<i32>,
    pub is_on_watchlist: bool,
}

impl MovieDetail {
    pub fn poster_url(&self, size: ImageSize) -> Option<String> {
        images::image_url(size, self.poster_path.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Actor,
    Director,
    Other,
}

/// A person credited on a movie. Identity is the `(id, role)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieContributor {
    pub id: i32,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub popularity: f64,
    pub role: Role,
}

impl MovieContributor {
    pub fn key(&self) -> (i32, Role) {
        (self.id, self.role)
    }
}

pub const TOP_CONTRIBUTORS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedMovieContributors {
    pub actors: Vec<MovieContributor>,
    pub directors: Vec<MovieContributor>,
}

impl GroupedMovieContributors {
    /// Keeps the five most popular actors and directors. `sort_by` is stable,
    /// so equal popularity keeps accumulation order.
    pub fn rank(contributors: &[MovieContributor]) -> Self {
        Self {
            actors: top_by_popularity(contributors, Role::Actor),
            directors: top_by_popularity(contributors, Role::Director),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty() && self.directors.is_empty()
    }
}

fn top_by_popularity(contributors: &[MovieContributor], role: Role) -> Vec<MovieContributor> {
    let mut picked: Vec<MovieContributor> = contributors
        .iter()
        .filter(|c| c.role == role)
        .cloned()
        .collect();
    picked.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    picked.truncate(TOP_CONTRIBUTORS);
    picked
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviesByYear {
    pub year: String,
    pub movies: Vec<Movie>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i32, popularity: f64, role: Role) -> MovieContributor {
        MovieContributor {
            id,
            name: format!("Person {id}"),
            profile_image_url: None,
            popularity,
            role,
        }
    }

    #[test]
    fn ranks_top_five_per_role() {
        let mut all: Vec<_> = (1..=7).map(|i| person(i, i as f64, Role::Actor)).collect();
        all.push(person(100, 3.0, Role::Director));
        all.push(person(101, 9.0, Role::Director));
        all.push(person(102, 50.0, Role::Other));

        let grouped = GroupedMovieContributors::rank(&all);
        let actor_ids: Vec<_> = grouped.actors.iter().map(|c| c.id).collect();
        assert_eq!(actor_ids, vec![7, 6, 5, 4, 3]);
        let director_ids: Vec<_> = grouped.directors.iter().map(|c| c.id).collect();
        assert_eq!(director_ids, vec![101, 100]);
    }

    #[test]
    fn equal_popularity_keeps_accumulation_order() {
        let all = vec![
            person(30, 1.0, Role::Actor),
            person(10, 1.0, Role::Actor),
            person(20, 1.0, Role::Actor),
        ];
        let grouped = GroupedMovieContributors::rank(&all);
        let ids: Vec<_> = grouped.actors.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }
}
