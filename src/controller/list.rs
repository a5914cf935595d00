use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::debounce::{Debouncer, SEARCH_DEBOUNCE};
use super::grouping;
use crate::catalog::MovieCatalog;
use crate::error::{MovieResult, UserMessage};
use crate::models::{Movie, MoviesByYear};

pub const MIN_QUERY_LENGTH: usize = 3;

/// How close to the end of the list a scroll position triggers the next page.
pub const LOAD_MORE_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Browse,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoMessage {
    QueryTooShort,
    NoSearchResults(String),
    PopularEmpty,
}

impl std::fmt::Display for InfoMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfoMessage::QueryTooShort => write!(
                f,
                "Please enter at least {MIN_QUERY_LENGTH} characters to search."
            ),
            InfoMessage::NoSearchResults(query) => write!(f, "No results found for \"{query}\"."),
            InfoMessage::PopularEmpty => write!(f, "No popular movies found."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub query: String,
    pub mode: ListMode,
    pub page: u32,
    pub can_load_more: bool,
    pub movies_by_year: Vec<MoviesByYear>,
    /// First page of a fresh list is in flight.
    pub is_loading: bool,
    pub is_loading_next_page: bool,
    pub error_message: Option<String>,
    pub info: Option<InfoMessage>,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            query: String::new(),
            mode: ListMode::Browse,
            page: 1,
            can_load_more: true,
            movies_by_year: Vec::new(),
            is_loading: false,
            is_loading_next_page: false,
            error_message: None,
            info: None,
        }
    }
}

impl ListState {
    pub fn movie_count(&self) -> usize {
        self.movies_by_year.iter().map(|g| g.movies.len()).sum()
    }

    pub fn movies(&self) -> Vec<Movie> {
        grouping::flatten(&self.movies_by_year)
    }
}

#[derive(Debug, Clone)]
struct PageRequest {
    mode: ListMode,
    query: String,
    page: u32,
    generation: u64,
}

struct ListInner {
    catalog: MovieCatalog,
    state: watch::Sender<ListState>,
    debouncer: Mutex<Debouncer>,
    // Bumped whenever the list is reset; responses from older generations are dropped.
    generation: AtomicU64,
}

/// Drives the browse/search movie list.
///
/// Event methods return immediately and do their work on background tasks
/// owned by the controller. Dropping the controller aborts them.
pub struct ListController {
    inner: Arc<ListInner>,
    tasks: Mutex<JoinSet<()>>,
}

impl ListController {
    /// Starts loading the first page of popular movies. Must be called from
    /// within a Tokio runtime.
    pub fn new(catalog: MovieCatalog) -> Self {
        let (state, _) = watch::channel(ListState::default());
        let controller = Self {
            inner: Arc::new(ListInner {
                catalog,
                state,
                debouncer: Mutex::new(Debouncer::default()),
                generation: AtomicU64::new(0),
            }),
            tasks: Mutex::new(JoinSet::new()),
        };
        let inner = controller.inner.clone();
        controller.spawn(async move { inner.reload_popular().await });
        controller
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> ListState {
        self.inner.state.borrow().clone()
    }

    pub fn query_changed(&self, query: &str) {
        let query = query.to_string();
        let mut cleared = false;
        self.inner.state.send_modify(|s| {
            let trimmed_len = query.trim().chars().count();
            if s.mode == ListMode::Search && trimmed_len < MIN_QUERY_LENGTH {
                s.movies_by_year.clear();
                s.info = (trimmed_len > 0).then_some(InfoMessage::QueryTooShort);
                cleared = true;
            }
            s.query = query.clone();
        });

        let ticket = {
            let mut debouncer = lock(&self.inner.debouncer);
            // Results are gone, so typing the previous query back must search again.
            if cleared {
                debouncer.reset_emitted();
            }
            debouncer.push(query)
        };
        let inner = self.inner.clone();
        self.spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            let settled = lock(&inner.debouncer).settle(ticket);
            if let Some(query) = settled {
                inner.handle_query(query).await;
            }
        });
    }

    /// Applies the query at once, skipping the debounce delay.
    pub fn query_submitted(&self, query: &str) {
        let query = query.trim().to_string();
        let fresh = lock(&self.inner.debouncer).flush(query.clone());
        self.inner.state.send_modify(|s| s.query = query.clone());
        if !fresh {
            debug!(query = %query, "Query unchanged, keeping current results");
            return;
        }
        let inner = self.inner.clone();
        self.spawn(async move { inner.handle_query(query).await });
    }

    pub fn load_next_page(&self) {
        let inner = self.inner.clone();
        self.spawn(async move { inner.load_next_page().await });
    }

    /// Reports the flat index of the last visible movie.
    pub fn scrolled_to(&self, index: usize) {
        let total = self.inner.state.borrow().movie_count();
        if total > 0 && index + LOAD_MORE_THRESHOLD >= total {
            self.load_next_page();
        }
    }

    pub fn toggle_watchlist(&self, movie_id: i32) {
        let inner = self.inner.clone();
        self.spawn(async move { inner.toggle_watchlist(movie_id).await });
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = lock(&self.tasks);
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }
}

impl ListInner {
    async fn handle_query(&self, query: String) {
        let trimmed = query.trim();
        let search_active = self.state.borrow().mode == ListMode::Search;

        if trimmed.is_empty() {
            if search_active {
                self.reload_popular().await;
            } else {
                self.state.send_modify(|s| s.info = None);
            }
        } else if trimmed.chars().count() < MIN_QUERY_LENGTH {
            self.show_query_too_short(query.clone());
        } else {
            self.start_search(trimmed.to_string()).await;
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn reload_popular(&self) {
        let generation = self.next_generation();
        self.state.send_modify(|s| {
            *s = ListState {
                is_loading: true,
                ..ListState::default()
            };
        });
        info!("Loading popular movies");
        self.fetch_page(PageRequest {
            mode: ListMode::Browse,
            query: String::new(),
            page: 1,
            generation,
        })
        .await;
    }

    async fn start_search(&self, query: String) {
        let generation = self.next_generation();
        self.state.send_modify(|s| {
            *s = ListState {
                query: query.clone(),
                mode: ListMode::Search,
                is_loading: true,
                ..ListState::default()
            };
        });
        info!(query = %query, "Searching movies");
        self.fetch_page(PageRequest {
            mode: ListMode::Search,
            query,
            page: 1,
            generation,
        })
        .await;
    }

    fn show_query_too_short(&self, query: String) {
        // Invalidates any search still in flight.
        self.next_generation();
        self.state.send_modify(|s| {
            *s = ListState {
                query,
                mode: ListMode::Search,
                can_load_more: false,
                info: Some(InfoMessage::QueryTooShort),
                ..ListState::default()
            };
        });
    }

    async fn load_next_page(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let mut request = None;
        self.state.send_if_modified(|s| {
            if s.is_loading || s.is_loading_next_page || !s.can_load_more {
                return false;
            }
            s.is_loading_next_page = true;
            s.error_message = None;
            s.info = None;
            request = Some(PageRequest {
                mode: s.mode,
                query: s.query.trim().to_string(),
                page: s.page + 1,
                generation,
            });
            true
        });
        if let Some(request) = request {
            debug!(page = request.page, "Loading next page");
            self.fetch_page(request).await;
        }
    }

    async fn fetch_page(&self, request: PageRequest) {
        let result = match request.mode {
            ListMode::Browse => self.catalog.popular_movies(request.page).await,
            ListMode::Search => {
                self.catalog
                    .search_movies(&request.query, request.page)
                    .await
            }
        };
        self.apply_page(&request, result);
    }

    fn apply_page(&self, request: &PageRequest, result: MovieResult<Vec<Movie>>) {
        if self.generation.load(Ordering::SeqCst) != request.generation {
            debug!(page = request.page, "Discarding stale page");
            return;
        }
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.is_loading_next_page = false;
            match result {
                Ok(fetched) => {
                    let mut all = if request.page == 1 {
                        Vec::new()
                    } else {
                        grouping::flatten(&s.movies_by_year)
                    };
                    s.can_load_more = !fetched.is_empty();
                    all.extend(fetched);
                    s.movies_by_year = grouping::group_by_year(&all);
                    s.page = request.page;
                    s.error_message = None;
                }
                Err(e) => {
                    warn!(page = request.page, "Movie list page failed: {}", e);
                    s.error_message = Some(e.user_message().to_string());
                    s.can_load_more = false;
                }
            }
            s.info = empty_list_info(request, s.movies_by_year.is_empty());
        });
    }

    async fn toggle_watchlist(&self, movie_id: i32) {
        match self.catalog.toggle_watchlist(movie_id).await {
            Ok(on_watchlist) => self.state.send_modify(|s| {
                s.movies_by_year
                    .iter_mut()
                    .flat_map(|g| g.movies.iter_mut())
                    .filter(|m| m.id == movie_id)
                    .for_each(|m| m.is_on_watchlist = on_watchlist);
            }),
            Err(e) => {
                warn!(movie_id, "Watchlist toggle failed: {}", e);
                self.state.send_modify(|s| {
                    s.error_message = Some(UserMessage::UnexpectedData.to_string());
                });
            }
        }
    }
}

fn empty_list_info(request: &PageRequest, empty: bool) -> Option<InfoMessage> {
    if !empty || request.page != 1 {
        return None;
    }
    match request.mode {
        ListMode::Browse => Some(InfoMessage::PopularEmpty),
        ListMode::Search => Some(InfoMessage::NoSearchResults(request.query.clone())),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
