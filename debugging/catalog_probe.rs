//! Run catalog operations against the live service and print the mapped results.
//! Usage:
//!   cargo run --bin catalog_probe -- popular [page]
//!   cargo run --bin catalog_probe -- search <query> [page]
//!   cargo run --bin catalog_probe -- movie <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported). Uses a throwaway
//! in-memory watchlist, so every watchlist flag prints as false.

use anyhow::{Context, Result};
use cinelist::catalog::MovieCatalog;
use cinelist::config::Config;
use cinelist::controller::group_by_year;
use cinelist::tmdb::TmdbClient;
use cinelist::watchlist::SqliteWatchlist;
use dotenvy::dotenv;
use serde::Serialize;
use serde_json::json;
use std::env;
use std::sync::Arc;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin catalog_probe -- popular [page]");
    eprintln!("       cargo run --bin catalog_probe -- search <query> [page]");
    eprintln!("       cargo run --bin catalog_probe -- movie <tmdb_id>");
    std::process::exit(1);
}

fn page_arg(arg: Option<&String>) -> Result<u32> {
    arg.map(|p| p.parse().context("page must be a positive integer"))
        .transpose()
        .map(|p| p.unwrap_or(1))
}

fn print<T: Serialize>(label: &str, value: &T) -> Result<()> {
    println!("== {label}");
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let config = Config::from_env()?;
    let api = Arc::new(TmdbClient::new(&config)?);
    let watchlist = Arc::new(SqliteWatchlist::open_in_memory()?);
    let catalog = MovieCatalog::new(api, watchlist);

    match args[1].as_str() {
        "popular" => {
            let page = page_arg(args.get(2))?;
            let movies = catalog.popular_movies(page).await?;
            print(&format!("popular page {page}"), &group_by_year(&movies))?;
        }
        "search" => {
            let query = args.get(2).unwrap_or_else(|| usage());
            let page = page_arg(args.get(3))?;
            let movies = catalog.search_movies(query, page).await?;
            print(&format!("search \"{query}\" page {page}"), &group_by_year(&movies))?;
        }
        "movie" => {
            let id: i32 = args
                .get(2)
                .unwrap_or_else(|| usage())
                .parse()
                .context("tmdb_id must be an integer")?;
            let detail = catalog.movie_details(id).await?;
            print("detail", &detail)?;

            let similar = catalog.similar_movies(id).await?;
            let titles: Vec<_> = similar
                .iter()
                .map(|m| json!({ "id": m.id, "title": m.title, "release_date": m.release_date }))
                .collect();
            print("similar", &titles)?;

            let ids: Vec<i32> = similar.iter().map(|m| m.id).collect();
            print("contributors", &catalog.grouped_credits(&ids).await?)?;
        }
        _ => usage(),
    }

    Ok(())
}
