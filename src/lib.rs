pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use client::models::{Candidate, Credentials, FilterCriteria, ScoutMessage, SendOutcome};
pub use client::session::{CookieCache, CookieSnapshot, MemoryCookieCache};
pub use client::AmbiClient;
pub use config::Config;
pub use error::ScrapeError;
