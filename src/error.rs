//! Error types for the timetable pipeline.
//!
//! Unparseable schedule segments, rows without a sequence number and empty
//! week info are not errors; they are dropped or treated as unknown where they
//! occur. Only the failures below ever reach a caller.

/// Result type for pipeline operations
pub type TkbResult<T> = Result<T, TkbError>;

#[derive(Debug, thiserror::Error)]
pub enum TkbError {
    #[error("Could not read background template: {0}")]
    BackgroundRead(#[from] std::io::Error),

    #[error("Could not fetch background template: {0}")]
    BackgroundFetch(#[from] reqwest::Error),

    #[error("Could not decode background template: {0}")]
    BackgroundDecode(String),

    #[error("Row data is not valid JSON: {0}")]
    InvalidRows(#[from] serde_json::Error),

    #[error("Row data must be a JSON array of row objects")]
    RowsNotArray,

    #[error("Could not read table: {0}")]
    InvalidTable(#[from] csv::Error),

    #[error("Could not encode image: {0}")]
    Encode(String),

    #[error("Render worker failed: {0}")]
    Worker(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TkbError {
    /// True when the failure was caused by the submitted rows rather than by
    /// the server side of the render.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TkbError::InvalidRows(_) | TkbError::RowsNotArray | TkbError::InvalidTable(_)
        )
    }
}

impl From<image::ImageError> for TkbError {
    fn from(e: image::ImageError) -> Self {
        TkbError::BackgroundDecode(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for TkbError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        TkbError::Worker(e.to_string())
    }
}
