use thiserror::Error;

/// Failure taxonomy for one scraping or messaging operation.
///
/// `Authentication`, `TokenNotFound` and `PageAccess` are transient at
/// operation granularity and worth retrying from scratch;
/// `ExtractionStructure` is not, since re-fetching cannot fix markup the
/// extractor no longer understands.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("anti-forgery token (C13CT) not found on index page")]
    TokenNotFound,

    #[error("unexpected status {status} from {url}")]
    PageAccess { status: u16, url: String },

    #[error("result page structure unrecognized: {0}")]
    ExtractionStructure(String),

    #[error("browser engine error: {0}")]
    Browser(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("all {attempts} attempts failed, last error: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<ScrapeError>,
    },
}
