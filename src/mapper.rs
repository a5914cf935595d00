use tracing::warn;

use crate::images::{self, ImageSize};
use crate::models::{Movie, MovieContributor, MovieDetail, Role};
use crate::tmdb::{CastRecord, CrewRecord, MovieDetailRecord, MovieRecord};
use crate::watchlist::WatchlistStore;

pub async fn movie_from_record(record: MovieRecord, watchlist: &dyn WatchlistStore) -> Movie {
    let is_on_watchlist = watchlist_flag(watchlist, record.id).await;
    Movie {
        id: record.id,
        title: record.title,
        overview: record.overview,
        poster_path: record.poster_path,
        release_date: record.release_date,
        vote_average: record.vote_average.unwrap_or(0.0),
        is_on_watchlist,
    }
}

pub async fn detail_from_record(
    record: MovieDetailRecord,
    watchlist: &dyn WatchlistStore,
) -> MovieDetail {
    let is_on_watchlist = watchlist_flag(watchlist, record.id).await;
    let genres = record
        .genres
        .unwrap_or_default()
        .into_iter()
        .filter_map(|g| g.name)
        .collect();
    MovieDetail {
        id: record.id,
        title: record.title,
        overview: record.overview,
        poster_path: record.poster_path,
        tagline: record.tagline,
        revenue: record.revenue.unwrap_or(0),
        release_date: record.release_date,
        status: record.status,
        vote_average: record.vote_average.unwrap_or(0.0),
        vote_count: record.vote_count.unwrap_or(0),
        genres,
        runtime_minutes: record.runtime,
        is_on_watchlist,
    }
}

pub fn contributor_from_cast(record: &CastRecord) -> MovieContributor {
    MovieContributor {
        id: record.id,
        name: record.name.clone(),
        profile_image_url: images::image_url(ImageSize::ProfileMedium, record.profile_path.as_deref()),
        popularity: record.popularity,
        role: Role::Actor,
    }
}

pub fn contributor_from_crew(record: &CrewRecord) -> MovieContributor {
    MovieContributor {
        id: record.id,
        name: record.name.clone(),
        profile_image_url: images::image_url(ImageSize::ProfileMedium, record.profile_path.as_deref()),
        popularity: record.popularity,
        role: crew_role(record.department.as_deref(), record.job.as_deref()),
    }
}

/// Directing department is matched exactly, the job title in any case.
pub fn crew_role(department: Option<&str>, job: Option<&str>) -> Role {
    let directing = department == Some("Directing");
    let director = job.is_some_and(|j| j.eq_ignore_ascii_case("Director"));
    if directing && director {
        Role::Director
    } else {
        Role::Other
    }
}

async fn watchlist_flag(watchlist: &dyn WatchlistStore, id: i32) -> bool {
    match watchlist.contains(id).await {
        Ok(flag) => flag,
        Err(e) => {
            warn!(movie_id = id, "Watchlist lookup failed, treating as absent: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdb::GenreRecord;
    use crate::watchlist::SqliteWatchlist;

    fn crew(department: &str, job: &str) -> CrewRecord {
        CrewRecord {
            id: 9,
            name: "Crew".to_string(),
            job: Some(job.to_string()),
            department: Some(department.to_string()),
            profile_path: None,
            popularity: 1.0,
        }
    }

    #[test]
    fn classifies_directors_by_department_and_job() {
        assert_eq!(contributor_from_crew(&crew("Directing", "director")).role, Role::Director);
        assert_eq!(contributor_from_crew(&crew("Directing", "DIRECTOR")).role, Role::Director);
        assert_eq!(contributor_from_crew(&crew("Directing", "Producer")).role, Role::Other);
        assert_eq!(contributor_from_crew(&crew("Writing", "Director")).role, Role::Other);
        assert_eq!(crew_role(None, Some("Director")), Role::Other);
        assert_eq!(crew_role(Some("Directing"), None), Role::Other);
    }

    #[test]
    fn cast_is_always_actor_with_profile_url() {
        let cast = CastRecord {
            id: 3,
            name: "Lead".to_string(),
            profile_path: Some("/lead.jpg".to_string()),
            popularity: 12.5,
            known_for_department: Some("Directing".to_string()),
        };
        let mapped = contributor_from_cast(&cast);
        assert_eq!(mapped.role, Role::Actor);
        assert_eq!(
            mapped.profile_image_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w185/lead.jpg")
        );
    }

    #[tokio::test]
    async fn fills_numeric_defaults_and_watchlist_flag() {
        let store = SqliteWatchlist::open_in_memory().unwrap();
        store.add(11).await.unwrap();

        let record = MovieDetailRecord {
            id: 11,
            title: "Detail".to_string(),
            overview: None,
            poster_path: None,
            release_date: Some("2020-02-02".to_string()),
            vote_average: None,
            tagline: None,
            revenue: None,
            status: Some("Released".to_string()),
            vote_count: None,
            genres: Some(vec![
                GenreRecord {
                    id: Some(1),
                    name: Some("Drama".to_string()),
                },
                GenreRecord { id: Some(2), name: None },
                GenreRecord {
                    id: Some(3),
                    name: Some("Crime".to_string()),
                },
            ]),
            runtime: Some(101),
        };
        let detail = detail_from_record(record, &store).await;
        assert_eq!(detail.vote_average, 0.0);
        assert_eq!(detail.vote_count, 0);
        assert_eq!(detail.revenue, 0);
        assert_eq!(detail.genres, vec!["Drama".to_string(), "Crime".to_string()]);
        assert!(detail.is_on_watchlist);

        let movie = movie_from_record(
            MovieRecord {
                id: 12,
                title: "Other".to_string(),
                overview: None,
                poster_path: None,
                release_date: None,
                vote_average: Some(7.5),
                genre_ids: None,
                popularity: None,
            },
            &store,
        )
        .await;
        assert_eq!(movie.vote_average, 7.5);
        assert!(!movie.is_on_watchlist);
    }
}
