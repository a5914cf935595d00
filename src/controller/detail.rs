use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::SectionState;
use crate::catalog::MovieCatalog;
use crate::models::{GroupedMovieContributors, Movie, MovieDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSection {
    Details,
    /// Credits depend on the similar list, so both retry together.
    SimilarMoviesAndCredits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    pub detail: SectionState<MovieDetail>,
    pub similar_movies: SectionState<Vec<Movie>>,
    pub similar_credits: SectionState<GroupedMovieContributors>,
    pub is_loading: bool,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            detail: SectionState::Loading,
            similar_movies: SectionState::Loading,
            similar_credits: SectionState::Loading,
            is_loading: true,
        }
    }
}

impl DetailState {
    pub fn is_overall_loading(&self) -> bool {
        self.detail.is_loading()
            || self.similar_movies.is_loading()
            || self.similar_credits.is_loading()
    }
}

struct DetailInner {
    catalog: MovieCatalog,
    movie_id: i32,
    state: watch::Sender<DetailState>,
    // One counter per independently restartable load. A result is published
    // only while its counter still holds the value it started with.
    load_generation: AtomicU64,
    detail_generation: AtomicU64,
    similar_generation: AtomicU64,
}

/// Loads one movie's detail screen: the movie itself, a few similar movies
/// and the people behind them. Each section loads and fails on its own.
pub struct DetailController {
    inner: Arc<DetailInner>,
    tasks: Mutex<JoinSet<()>>,
}

impl DetailController {
    pub fn new(catalog: MovieCatalog, movie_id: i32) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        let controller = Self {
            inner: Arc::new(DetailInner {
                catalog,
                movie_id,
                state,
                load_generation: AtomicU64::new(0),
                detail_generation: AtomicU64::new(0),
                similar_generation: AtomicU64::new(0),
            }),
            tasks: Mutex::new(JoinSet::new()),
        };
        controller.reload();
        controller
    }

    pub fn movie_id(&self) -> i32 {
        self.inner.movie_id
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> DetailState {
        self.inner.state.borrow().clone()
    }

    pub fn reload(&self) {
        let inner = self.inner.clone();
        self.spawn(async move { inner.load_all().await });
    }

    pub fn retry(&self, section: DetailSection) {
        let inner = self.inner.clone();
        self.spawn(async move { inner.retry(section).await });
    }

    /// No-op until the detail section has loaded.
    pub fn toggle_watchlist(&self) {
        let inner = self.inner.clone();
        self.spawn(async move { inner.toggle_watchlist().await });
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|p| p.into_inner());
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }
}

impl DetailInner {
    async fn load_all(&self) {
        let load = bump(&self.load_generation);
        let detail = bump(&self.detail_generation);
        let similar = bump(&self.similar_generation);
        self.state.send_replace(DetailState::default());
        tokio::join!(self.load_detail(detail), self.load_similar_and_credits(similar));
        if is_current(&self.load_generation, load) {
            self.state.send_modify(|s| s.is_loading = false);
        }
    }

    async fn retry(&self, section: DetailSection) {
        debug!(movie_id = self.movie_id, ?section, "Retrying section");
        match section {
            DetailSection::Details => {
                let generation = bump(&self.detail_generation);
                self.state.send_modify(|s| s.detail = SectionState::Loading);
                self.load_detail(generation).await;
            }
            DetailSection::SimilarMoviesAndCredits => {
                let generation = bump(&self.similar_generation);
                self.state.send_modify(|s| {
                    s.similar_movies = SectionState::Loading;
                    s.similar_credits = SectionState::Loading;
                });
                self.load_similar_and_credits(generation).await;
            }
        }
    }

    async fn load_detail(&self, generation: u64) {
        let result = self.catalog.movie_details(self.movie_id).await;
        if !is_current(&self.detail_generation, generation) {
            debug!(movie_id = self.movie_id, "Discarding stale movie detail");
            return;
        }
        if let Err(e) = &result {
            warn!(movie_id = self.movie_id, "Movie detail failed: {}", e);
        }
        self.state
            .send_modify(|s| s.detail = SectionState::from_result(result));
    }

    async fn load_similar_and_credits(&self, generation: u64) {
        let similar = self.catalog.similar_movies(self.movie_id).await;
        if !is_current(&self.similar_generation, generation) {
            debug!(movie_id = self.movie_id, "Discarding stale similar movies");
            return;
        }
        let movies = match similar {
            Ok(movies) => movies,
            Err(e) => {
                warn!(movie_id = self.movie_id, "Similar movies failed: {}", e);
                let message = e.user_message().to_string();
                self.state.send_modify(|s| {
                    s.similar_movies = SectionState::Error(message.clone());
                    s.similar_credits = SectionState::Error(message);
                });
                return;
            }
        };

        let ids: Vec<i32> = movies.iter().map(|m| m.id).collect();
        self.state.send_modify(|s| {
            s.similar_movies = SectionState::Success(movies);
            s.similar_credits = SectionState::Loading;
        });

        let credits = self.catalog.grouped_credits(&ids).await;
        if !is_current(&self.similar_generation, generation) {
            debug!(movie_id = self.movie_id, "Discarding stale similar credits");
            return;
        }
        if let Err(e) = &credits {
            warn!(movie_id = self.movie_id, "Similar credits failed: {}", e);
        }
        self.state
            .send_modify(|s| s.similar_credits = SectionState::from_result(credits));
    }

    async fn toggle_watchlist(&self) {
        let loaded_id = self.state.borrow().detail.data().map(|d| d.id);
        let Some(id) = loaded_id else {
            debug!(movie_id = self.movie_id, "Ignoring watchlist toggle before detail loaded");
            return;
        };
        match self.catalog.toggle_watchlist(id).await {
            Ok(on_watchlist) => self.state.send_modify(|s| {
                if let SectionState::Success(detail) = &mut s.detail {
                    if detail.id == id {
                        detail.is_on_watchlist = on_watchlist;
                    }
                }
            }),
            Err(e) => warn!(movie_id = id, "Watchlist toggle failed: {}", e),
        }
    }
}

fn bump(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

fn is_current(counter: &AtomicU64, generation: u64) -> bool {
    counter.load(Ordering::SeqCst) == generation
}
