use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{MovieError, MovieResult};
use crate::mapper;
use crate::models::{GroupedMovieContributors, Movie, MovieContributor, MovieDetail, Role};
use crate::tmdb::{CatalogApi, MovieRecord};
use crate::watchlist::{WatchlistResult, WatchlistStore};

/// Similar movies are a teaser row, not a paged list.
pub const SIMILAR_MOVIES_LIMIT: usize = 5;

const DIRECTOR_JOB: &str = "Director";

/// Joins catalog responses with local watchlist membership.
#[derive(Clone)]
pub struct MovieCatalog {
    api: Arc<dyn CatalogApi>,
    watchlist: Arc<dyn WatchlistStore>,
}

impl MovieCatalog {
    pub fn new(api: Arc<dyn CatalogApi>, watchlist: Arc<dyn WatchlistStore>) -> Self {
        Self { api, watchlist }
    }

    pub async fn popular_movies(&self, page: u32) -> MovieResult<Vec<Movie>> {
        let response = self.api.popular_movies(page).await?;
        Ok(self.enrich(response.results).await)
    }

    pub async fn search_movies(&self, query: &str, page: u32) -> MovieResult<Vec<Movie>> {
        let response = self.api.search_movies(query, page).await?;
        Ok(self.enrich(response.results).await)
    }

    pub async fn movie_details(&self, id: i32) -> MovieResult<MovieDetail> {
        let record = self.api.movie_detail(id).await?;
        Ok(mapper::detail_from_record(record, self.watchlist.as_ref()).await)
    }

    pub async fn similar_movies(&self, id: i32) -> MovieResult<Vec<Movie>> {
        let mut response = self.api.similar_movies(id, 1).await?;
        response.results.truncate(SIMILAR_MOVIES_LIMIT);
        Ok(self.enrich(response.results).await)
    }

    /// Fetches credits for every id concurrently and merges cast and
    /// directors. A failed fetch never cancels its siblings; the call only
    /// fails when every fetch failed, and then with the error of the first
    /// id in `ids`.
    pub async fn credits_for_movies(&self, ids: &[i32]) -> MovieResult<Vec<MovieContributor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = join_all(ids.iter().map(|&id| self.api.movie_credits(id))).await;

        let mut contributors: Vec<MovieContributor> = Vec::new();
        let mut present: HashSet<(i32, Role)> = HashSet::new();
        let mut first_error: Option<MovieError> = None;
        let mut successful_fetches = 0usize;

        for (id, result) in ids.iter().zip(results) {
            let credits = match result {
                Ok(credits) => credits,
                Err(e) => {
                    warn!(movie_id = *id, "Credits fetch failed: {}", e);
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            successful_fetches += 1;

            for cast in &credits.cast {
                if present.insert((cast.id, Role::Actor)) {
                    contributors.push(mapper::contributor_from_cast(cast));
                }
            }
            for crew in credits
                .crew
                .iter()
                .filter(|c| c.job.as_deref() == Some(DIRECTOR_JOB))
            {
                if !present.contains(&(crew.id, Role::Director)) {
                    let mapped = mapper::contributor_from_crew(crew);
                    present.insert(mapped.key());
                    contributors.push(mapped);
                }
            }
        }

        if successful_fetches == 0 {
            if let Some(e) = first_error {
                return Err(e);
            }
        }
        debug!(
            requested = ids.len(),
            succeeded = successful_fetches,
            contributors = contributors.len(),
            "Merged credits"
        );
        Ok(dedupe_contributors(contributors))
    }

    /// Top actors and directors across the given movies.
    pub async fn grouped_credits(&self, ids: &[i32]) -> MovieResult<GroupedMovieContributors> {
        if ids.is_empty() {
            return Ok(GroupedMovieContributors::default());
        }
        let contributors = self.credits_for_movies(ids).await?;
        Ok(GroupedMovieContributors::rank(&contributors))
    }

    pub async fn is_on_watchlist(&self, id: i32) -> WatchlistResult<bool> {
        self.watchlist.contains(id).await
    }

    pub async fn add_to_watchlist(&self, id: i32) -> WatchlistResult<()> {
        self.watchlist.add(id).await
    }

    pub async fn remove_from_watchlist(&self, id: i32) -> WatchlistResult<()> {
        self.watchlist.remove(id).await
    }

    pub async fn watchlist_ids(&self) -> WatchlistResult<HashSet<i32>> {
        self.watchlist.list_all().await
    }

    /// Flips membership and returns the new state.
    pub async fn toggle_watchlist(&self, id: i32) -> WatchlistResult<bool> {
        if self.watchlist.contains(id).await? {
            self.watchlist.remove(id).await?;
            Ok(false)
        } else {
            self.watchlist.add(id).await?;
            Ok(true)
        }
    }

    async fn enrich(&self, records: Vec<MovieRecord>) -> Vec<Movie> {
        let mut movies = Vec::with_capacity(records.len());
        for record in records {
            movies.push(mapper::movie_from_record(record, self.watchlist.as_ref()).await);
        }
        movies
    }
}

fn dedupe_contributors(contributors: Vec<MovieContributor>) -> Vec<MovieContributor> {
    let mut seen = HashSet::new();
    contributors
        .into_iter()
        .filter(|c| seen.insert(c.key()))
        .collect()
}
