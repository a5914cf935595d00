mod debounce;
mod detail;
mod grouping;
mod list;

pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use detail::{DetailController, DetailSection, DetailState};
pub use grouping::{flatten, group_by_year, release_year, UNKNOWN_YEAR};
pub use list::{InfoMessage, ListController, ListMode, ListState, LOAD_MORE_THRESHOLD, MIN_QUERY_LENGTH};

use crate::error::MovieResult;

/// One independently loading part of a screen.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionState<T> {
    Loading,
    Success(T),
    /// User facing message, never raw error text.
    Error(String),
}

impl<T> SectionState<T> {
    pub fn from_result(result: MovieResult<T>) -> Self {
        match result {
            Ok(value) => SectionState::Success(value),
            Err(e) => SectionState::Error(e.user_message().to_string()),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            SectionState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SectionState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SectionState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }
}
