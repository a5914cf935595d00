#![allow(dead_code)]

use cinelist::catalog::MovieCatalog;
use cinelist::error::{MovieError, MovieResult};
use cinelist::tmdb::{
    validate_id, validate_query, CastRecord, CatalogApi, CreditsRecord, CrewRecord,
    MovieDetailRecord, MoviePage, MovieRecord,
};
use cinelist::watchlist::{WatchlistError, WatchlistResult, WatchlistStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Default)]
struct Responses {
    popular: HashMap<u32, MovieResult<Vec<MovieRecord>>>,
    search: HashMap<(String, u32), MovieResult<Vec<MovieRecord>>>,
    detail: HashMap<i32, MovieResult<MovieDetailRecord>>,
    similar: HashMap<i32, MovieResult<Vec<MovieRecord>>>,
    credits: HashMap<i32, MovieResult<CreditsRecord>>,
}

/// Scripted catalog. Unscripted pages come back empty, unscripted details
/// and credits as 404. Every call is recorded as a label such as
/// `popular:2`, `search:dune:1` or `credits:7`.
#[derive(Default)]
pub struct FakeCatalog {
    responses: Mutex<Responses>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn popular(&self, page: u32, result: MovieResult<Vec<MovieRecord>>) {
        self.responses.lock().unwrap().popular.insert(page, result);
    }

    pub fn search(&self, query: &str, page: u32, result: MovieResult<Vec<MovieRecord>>) {
        self.responses
            .lock()
            .unwrap()
            .search
            .insert((query.to_string(), page), result);
    }

    pub fn detail(&self, id: i32, result: MovieResult<MovieDetailRecord>) {
        self.responses.lock().unwrap().detail.insert(id, result);
    }

    pub fn similar(&self, id: i32, result: MovieResult<Vec<MovieRecord>>) {
        self.responses.lock().unwrap().similar.insert(id, result);
    }

    pub fn credits(&self, id: i32, result: MovieResult<CreditsRecord>) {
        self.responses.lock().unwrap().credits.insert(id, result);
    }

    pub fn delay(&self, label: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(label.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    async fn enter(&self, label: &str) {
        self.calls.lock().unwrap().push(label.to_string());
        let delay = self.delays.lock().unwrap().get(label).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn finish(&self, label: &str) {
        self.completed.lock().unwrap().push(label.to_string());
    }
}

#[async_trait::async_trait]
impl CatalogApi for FakeCatalog {
    async fn popular_movies(&self, page: u32) -> MovieResult<MoviePage> {
        let label = format!("popular:{page}");
        self.enter(&label).await;
        let result = self.responses.lock().unwrap().popular.get(&page).cloned();
        self.finish(&label);
        result
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(|results| MoviePage { page, results })
    }

    async fn search_movies(&self, query: &str, page: u32) -> MovieResult<MoviePage> {
        let query = validate_query(query)?;
        let label = format!("search:{query}:{page}");
        self.enter(&label).await;
        let result = self
            .responses
            .lock()
            .unwrap()
            .search
            .get(&(query.to_string(), page))
            .cloned();
        self.finish(&label);
        result
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(|results| MoviePage { page, results })
    }

    async fn movie_detail(&self, id: i32) -> MovieResult<MovieDetailRecord> {
        validate_id(id)?;
        let label = format!("detail:{id}");
        self.enter(&label).await;
        let result = self.responses.lock().unwrap().detail.get(&id).cloned();
        self.finish(&label);
        result.unwrap_or_else(|| Err(http(404)))
    }

    async fn similar_movies(&self, id: i32, page: u32) -> MovieResult<MoviePage> {
        validate_id(id)?;
        let label = format!("similar:{id}");
        self.enter(&label).await;
        let result = self.responses.lock().unwrap().similar.get(&id).cloned();
        self.finish(&label);
        result
            .unwrap_or_else(|| Ok(Vec::new()))
            .map(|results| MoviePage { page, results })
    }

    async fn movie_credits(&self, id: i32) -> MovieResult<CreditsRecord> {
        validate_id(id)?;
        let label = format!("credits:{id}");
        self.enter(&label).await;
        let result = self.responses.lock().unwrap().credits.get(&id).cloned();
        self.finish(&label);
        result.unwrap_or_else(|| Err(http(404)))
    }
}

#[derive(Default)]
pub struct FakeWatchlist {
    ids: Mutex<HashSet<i32>>,
    pub failing: AtomicBool,
}

impl FakeWatchlist {
    pub fn ids(&self) -> HashSet<i32> {
        self.ids.lock().unwrap().clone()
    }

    pub fn seed(&self, ids: &[i32]) {
        self.ids.lock().unwrap().extend(ids);
    }

    fn check(&self) -> WatchlistResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WatchlistError::Io(std::io::Error::other("disk unavailable")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WatchlistStore for FakeWatchlist {
    async fn add(&self, id: i32) -> WatchlistResult<()> {
        self.check()?;
        self.ids.lock().unwrap().insert(id);
        Ok(())
    }

    async fn remove(&self, id: i32) -> WatchlistResult<()> {
        self.check()?;
        self.ids.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn contains(&self, id: i32) -> WatchlistResult<bool> {
        self.check()?;
        Ok(self.ids.lock().unwrap().contains(&id))
    }

    async fn list_all(&self) -> WatchlistResult<HashSet<i32>> {
        self.check()?;
        Ok(self.ids())
    }
}

pub struct Fixture {
    pub api: Arc<FakeCatalog>,
    pub watchlist: Arc<FakeWatchlist>,
    pub catalog: MovieCatalog,
}

pub fn fixture() -> Fixture {
    let api = Arc::new(FakeCatalog::default());
    let watchlist = Arc::new(FakeWatchlist::default());
    let catalog = MovieCatalog::new(api.clone(), watchlist.clone());
    Fixture {
        api,
        watchlist,
        catalog,
    }
}

pub fn movie(id: i32, title: &str, release_date: Option<&str>) -> MovieRecord {
    MovieRecord {
        id,
        title: title.to_string(),
        overview: Some(format!("About {title}")),
        poster_path: Some(format!("/poster{id}.jpg")),
        release_date: release_date.map(str::to_string),
        vote_average: Some(7.0),
        genre_ids: None,
        popularity: None,
    }
}

/// Movies released on the first of January of `year`.
pub fn movies_in(year: i32, ids: impl IntoIterator<Item = i32>) -> Vec<MovieRecord> {
    ids.into_iter()
        .map(|id| movie(id, &format!("Movie {id}"), Some(&format!("{year}-01-01"))))
        .collect()
}

pub fn detail_record(id: i32, title: &str) -> MovieDetailRecord {
    MovieDetailRecord {
        id,
        title: title.to_string(),
        overview: Some("Plot".to_string()),
        poster_path: Some(format!("/detail{id}.jpg")),
        release_date: Some("2019-05-01".to_string()),
        vote_average: Some(8.1),
        tagline: Some("Tagline".to_string()),
        revenue: Some(1_000_000),
        status: Some("Released".to_string()),
        vote_count: Some(1200),
        genres: None,
        runtime: Some(120),
    }
}

pub fn cast(id: i32, name: &str, popularity: f64) -> CastRecord {
    CastRecord {
        id,
        name: name.to_string(),
        profile_path: None,
        popularity,
        known_for_department: Some("Acting".to_string()),
    }
}

pub fn crew(id: i32, name: &str, job: &str, department: &str, popularity: f64) -> CrewRecord {
    CrewRecord {
        id,
        name: name.to_string(),
        job: Some(job.to_string()),
        department: Some(department.to_string()),
        profile_path: None,
        popularity,
    }
}

pub fn director(id: i32, name: &str, popularity: f64) -> CrewRecord {
    crew(id, name, "Director", "Directing", popularity)
}

pub fn credits(cast: Vec<CastRecord>, crew: Vec<CrewRecord>) -> CreditsRecord {
    CreditsRecord { cast, crew }
}

pub fn http(status_code: u16) -> MovieError {
    MovieError::HttpError {
        status_code,
        raw_body: None,
        api_message: None,
    }
}

pub fn offline() -> MovieError {
    MovieError::NetworkConnectionProblem {
        details: "connection refused".to_string(),
    }
}

/// Waits for a published state matching `pred`, failing instead of hanging.
pub async fn wait_until<T: Clone>(
    rx: &mut watch::Receiver<T>,
    pred: impl FnMut(&T) -> bool,
) -> T {
    let state = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
    (*state).clone()
}
