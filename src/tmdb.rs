use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{MovieError, MovieResult};

const API_KEY_PARAM: &str = "api_key";

/// Remote catalog operations. Implementations never panic or raise past
/// this boundary: every failure comes back as a [`MovieError`].
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn popular_movies(&self, page: u32) -> MovieResult<MoviePage>;
    async fn search_movies(&self, query: &str, page: u32) -> MovieResult<MoviePage>;
    async fn movie_detail(&self, id: i32) -> MovieResult<MovieDetailRecord>;
    async fn similar_movies(&self, id: i32, page: u32) -> MovieResult<MoviePage>;
    async fn movie_credits(&self, id: i32) -> MovieResult<CreditsRecord>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &Config) -> Result<Self> {
        let user_agent = format!("cinelist/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build catalog HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            language: config.language.clone(),
        })
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> MovieResult<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = self.url_for(path, query)?;
        debug!(path = %path, "Requesting catalog");
        let client = self.client.clone();
        // Requests run on a runtime worker so a panic in decoding stays a Failure.
        tokio::spawn(async move { fetch_json::<T>(&client, url).await })
            .await
            .unwrap_or_else(|e| Err(MovieError::unexpected(format!("request task failed: {e}"))))
    }

    fn url_for(&self, path: &str, query: &[(&str, String)]) -> MovieResult<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| MovieError::unexpected(format!("invalid catalog URL: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(with_api_key(url, &self.api_key))
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn popular_movies(&self, page: u32) -> MovieResult<MoviePage> {
        let query = [
            ("language", self.language.clone()),
            ("page", page.to_string()),
        ];
        self.get_json("movie/popular", &query).await
    }

    async fn search_movies(&self, query: &str, page: u32) -> MovieResult<MoviePage> {
        let trimmed = validate_query(query)?;
        let params = [
            ("query", trimmed.to_string()),
            ("language", self.language.clone()),
            ("page", page.to_string()),
            ("include_adult", "false".to_string()),
        ];
        self.get_json("search/movie", &params).await
    }

    async fn movie_detail(&self, id: i32) -> MovieResult<MovieDetailRecord> {
        validate_id(id)?;
        let query = [("language", self.language.clone())];
        self.get_json(&format!("movie/{id}"), &query).await
    }

    async fn similar_movies(&self, id: i32, page: u32) -> MovieResult<MoviePage> {
        validate_id(id)?;
        let query = [
            ("language", self.language.clone()),
            ("page", page.to_string()),
        ];
        self.get_json(&format!("movie/{id}/similar"), &query).await
    }

    async fn movie_credits(&self, id: i32) -> MovieResult<CreditsRecord> {
        validate_id(id)?;
        let query = [("language", self.language.clone())];
        self.get_json(&format!("movie/{id}/credits"), &query).await
    }
}

async fn fetch_json<T: DeserializeOwned>(client: &Client, url: Url) -> MovieResult<T> {
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|e| MovieError::from_transport(&e))?;
    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|e| MovieError::from_transport(&e))?;
    if !status.is_success() {
        return Err(http_error(status.as_u16(), text));
    }
    serde_json::from_str(&text)
        .map_err(|e| MovieError::unexpected(format!("JSON parse failed: {e}")))
}

pub fn validate_query(query: &str) -> MovieResult<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(MovieError::validation("Query cannot be blank"));
    }
    Ok(trimmed)
}

pub fn validate_id(id: i32) -> MovieResult<()> {
    if id <= 0 {
        return Err(MovieError::validation(format!("Invalid movie id {id}")));
    }
    Ok(())
}

/// Adds the key unless the URL already carries one.
pub fn with_api_key(mut url: Url, api_key: &str) -> Url {
    let present = url.query_pairs().any(|(k, _)| k == API_KEY_PARAM);
    if !present {
        url.query_pairs_mut().append_pair(API_KEY_PARAM, api_key);
    }
    url
}

fn http_error(status_code: u16, body: String) -> MovieError {
    #[derive(Deserialize)]
    struct ErrorBody {
        status_message: Option<String>,
    }

    let api_message = if body.trim().is_empty() {
        None
    } else {
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.status_message,
            Err(e) => {
                warn!(status = status_code, "Failed to parse catalog error body: {}", e);
                None
            }
        }
    };
    MovieError::HttpError {
        status_code,
        raw_body: (!body.is_empty()).then_some(body),
        api_message,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieRecord {
    pub id: i32,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub genre_ids: Option<Vec<i32>>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenreRecord {
    pub id: Option<i32>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovieDetailRecord {
    pub id: i32,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub tagline: Option<String>,
    pub revenue: Option<i64>,
    pub status: Option<String>,
    pub vote_count: Option<i32>,
    pub genres: Option<Vec<GenreRecord>>,
    pub runtime: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreditsRecord {
    #[serde(default)]
    pub cast: Vec<CastRecord>,
    #[serde(default)]
    pub crew: Vec<CrewRecord>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CastRecord {
    pub id: i32,
    pub name: String,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
    pub known_for_department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CrewRecord {
    pub id: i32,
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}
