use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_BIND: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub watchlist_db: PathBuf,
    pub bind: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .context("TMDB_API_KEY not set")?;
        let base_url = env_or("TMDB_BASE_URL", DEFAULT_BASE_URL);
        let language = env_or("TMDB_LANGUAGE", DEFAULT_LANGUAGE);
        let watchlist_db = match env::var("WATCHLIST_DB_PATH") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => default_watchlist_path()?,
        };
        let bind = env_or("CINELIST_BIND", DEFAULT_BIND)
            .parse()
            .context("CINELIST_BIND is not a socket address")?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
            watchlist_db,
            bind,
        })
    }

    /// Settings for tests and tools that talk to a local catalog stand-in.
    pub fn for_catalog(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            watchlist_db: PathBuf::from("watchlist.db"),
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn default_watchlist_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Could not determine app data directory")?;
    Ok(data_dir.join("cinelist").join("watchlist.db"))
}
