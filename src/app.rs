use crate::catalog::MovieCatalog;
use crate::config::Config;
use crate::controller::group_by_year;
use crate::error::MovieError;
use crate::models::{GroupedMovieContributors, Movie, MovieDetail, MoviesByYear};
use crate::tmdb::TmdbClient;
use crate::watchlist::{SqliteWatchlist, WatchlistError};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub catalog: MovieCatalog,
}

pub async fn run_server(config: Config) -> Result<()> {
    let api = Arc::new(TmdbClient::new(&config)?);
    let watchlist = Arc::new(SqliteWatchlist::open(&config.watchlist_db)?);
    let state = AppState {
        catalog: MovieCatalog::new(api, watchlist),
    };

    let app = build_router(state);

    info!("Listening on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/movies/popular", get(popular))
        .route("/movies/popular/by-year", get(popular_by_year))
        .route("/movies/search", get(search))
        .route("/movies/:id", get(detail))
        .route("/movies/:id/similar", get(similar))
        .route("/movies/:id/contributors", get(contributors))
        .route("/watchlist", get(watchlist))
        .route(
            "/watchlist/:id",
            put(add_to_watchlist).delete(remove_from_watchlist),
        )
        .route("/watchlist/:id/toggle", post(toggle_watchlist))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<u32>,
}

impl PageParams {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    page: Option<u32>,
}

async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    Ok(Json(state.catalog.popular_movies(params.page()).await?))
}

async fn popular_by_year(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<MoviesByYear>>, ApiError> {
    let movies = state.catalog.popular_movies(params.page()).await?;
    Ok(Json(group_by_year(&movies)))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    Ok(Json(state.catalog.search_movies(&params.query, page).await?))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MovieDetail>, ApiError> {
    Ok(Json(state.catalog.movie_details(id).await?))
}

async fn similar(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    Ok(Json(state.catalog.similar_movies(id).await?))
}

async fn contributors(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GroupedMovieContributors>, ApiError> {
    let similar = state.catalog.similar_movies(id).await?;
    let ids: Vec<i32> = similar.iter().map(|m| m.id).collect();
    Ok(Json(state.catalog.grouped_credits(&ids).await?))
}

async fn watchlist(State(state): State<AppState>) -> Result<Json<Vec<i32>>, ApiError> {
    let mut ids: Vec<i32> = state.catalog.watchlist_ids().await?.into_iter().collect();
    ids.sort_unstable();
    Ok(Json(ids))
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.catalog.add_to_watchlist(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.catalog.remove_from_watchlist(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_watchlist(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let on_watchlist = state.catalog.toggle_watchlist(id).await?;
    info!(movie_id = id, on_watchlist, "Toggled watchlist");
    Ok(Json(json!({ "on_watchlist": on_watchlist })))
}

#[derive(Debug)]
pub enum ApiError {
    Catalog(MovieError),
    Storage(WatchlistError),
}

impl From<MovieError> for ApiError {
    fn from(e: MovieError) -> Self {
        ApiError::Catalog(e)
    }
}

impl From<WatchlistError> for ApiError {
    fn from(e: WatchlistError) -> Self {
        ApiError::Storage(e)
    }
}

pub fn status_for(e: &MovieError) -> StatusCode {
    match e {
        MovieError::ApiValidationProblem { .. } => StatusCode::BAD_REQUEST,
        MovieError::HttpError { status_code, .. } => StatusCode::from_u16(*status_code)
            .ok()
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_GATEWAY),
        MovieError::NetworkConnectionProblem { .. } => StatusCode::SERVICE_UNAVAILABLE,
        MovieError::UnexpectedDataSourceError { .. } => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Catalog(e) => {
                warn!("Catalog request failed: {}", e);
                (status_for(&e), e.user_message().to_string())
            }
            ApiError::Storage(e) => {
                error!("Watchlist storage failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not update the watchlist.".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
