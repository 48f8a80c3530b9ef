use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::country::{RawCountry, SortField};
use crate::view_state::DEFAULT_PAGE_SIZE;

pub const COUNTRIES_ENDPOINT: &str = "https://countries.trevorblades.com";

pub const LOADING_TEXT: &str = "Loading Countries...";
pub const LOAD_ERROR_TEXT: &str = "Error Loading Countries!";

pub const HELP_TEXT: &str = "\
q        quit
↑ ↓ k j  move row
← → h l  move column
n p      next / previous page
g G      first / last page
s        toggle sort on column
a d      sort ascending / descending
z        toggle page size (5 / 20)
/        search code, name, continent
c        copy cell
y        copy row
?        this help
Esc      close / clear search";

#[derive(Debug, Error)]
pub enum CVError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("query returned errors: {}", .0.join("; "))]
    GraphQL(Vec<String>),
    #[error("response carried no countries")]
    MissingData,
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct CVConfig {
    pub endpoint: String,
    pub page_size: usize,
    pub sort_field: Option<SortField>,
    pub event_poll_time: u64,
}

impl Default for CVConfig {
    fn default() -> Self {
        CVConfig {
            endpoint: COUNTRIES_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: Some(SortField::Name),
            event_poll_time: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    SortAscending,
    SortDescending,
    ToggleSort,
    TogglePageSize,
    Search,
    CopyCell,
    CopyRow,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
    Loaded(Result<Vec<RawCountry>, String>),
}
