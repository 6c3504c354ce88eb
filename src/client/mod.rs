//! Hybrid authenticated client for the AMBI recruiting platform.
//!
//! One search or send operation is a strictly sequential pipeline: browser
//! login → cookie snapshot → token fetch → form POSTs → extraction. The
//! browser and HTTP phases never run concurrently; independent operations
//! share nothing, so an [`AmbiClient`] can serve parallel callers without
//! locking.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, info};

pub mod browser;
pub mod fetcher;
pub mod models;
pub mod params;
pub mod parser;
pub mod scout;
pub mod session;

use crate::config::Config;
use crate::error::ScrapeError;
use crate::retry::with_retries;
use models::{Candidate, Credentials, FilterCriteria, ScoutMessage, SendOutcome};
use scout::{AckHeuristic, SubstringHeuristic};
use session::{CookieCache, CookieSnapshot};

pub struct AmbiClient {
    cfg: Config,
    http: Client,
    cookie_cache: Option<Arc<dyn CookieCache>>,
    heuristic: Box<dyn AckHeuristic>,
}

impl AmbiClient {
    pub fn new(cfg: Config) -> Result<Self, ScrapeError> {
        let http = fetcher::build_client(&cfg)?;
        Ok(Self {
            cfg,
            http,
            cookie_cache: None,
            heuristic: Box::new(SubstringHeuristic),
        })
    }

    /// Attach an external cookie cache. A hit skips the browser login; a
    /// miss falls back to it transparently.
    pub fn with_cookie_cache(mut self, cache: Arc<dyn CookieCache>) -> Self {
        self.cookie_cache = Some(cache);
        self
    }

    /// Replace the send-acknowledgment heuristic.
    pub fn with_ack_heuristic(mut self, heuristic: Box<dyn AckHeuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Runs the whole bootstrap+search pipeline under the configured retry
    /// policy. Each attempt re-authenticates from scratch.
    pub async fn search_with_retries(
        &self,
        credentials: &Credentials,
        filters: &FilterCriteria,
    ) -> Result<Vec<Candidate>, ScrapeError> {
        with_retries(self.cfg.retry_attempts, self.cfg.retry_delay, || {
            self.search(credentials, filters)
        })
        .await
    }

    /// One search attempt: login, token, page 1, discovered pages, in order.
    pub async fn search(
        &self,
        credentials: &Credentials,
        filters: &FilterCriteria,
    ) -> Result<Vec<Candidate>, ScrapeError> {
        let cookies = self.establish_session(credentials).await?;

        let index_url = fetcher::index_url(&self.cfg);
        let search_url = fetcher::search_url(&self.cfg);

        let token = fetcher::fetch_token(&self.http, &self.cfg, &cookies, &index_url).await?;

        let mut form = params::build_search_params(filters);
        params::extend_with_session(&mut form, &self.cfg, &token);

        let first_page =
            fetcher::post_form(&self.http, &search_url, &form, &cookies, &index_url, false)
                .await?;
        let mut candidates = parser::extract_candidates(&first_page)?;
        info!(count = candidates.len(), "first result page fetched");

        if !filters.fetch_all_pages && filters.max_pages <= 1 {
            return Ok(candidates);
        }

        let offsets = parser::discover_offsets(&first_page);
        if offsets.is_empty() {
            info!("no further page links found");
            return Ok(candidates);
        }
        let selected = select_offsets(&offsets, filters.fetch_all_pages, filters.max_pages);

        let cookies = &cookies;
        let index_url = &index_url;
        traverse_offsets(&mut candidates, &selected, self.cfg.page_delay, |offset| {
            let page_url = format!("{}&per_page={}", search_url, offset);
            let mut page_form = form.clone();
            page_form.push(("per_page".to_string(), offset.to_string()));
            async move {
                fetcher::post_form(&self.http, &page_url, &page_form, cookies, index_url, false)
                    .await
            }
        })
        .await?;

        Ok(candidates)
    }

    /// Sends one scout message, bootstrapping a session first.
    pub async fn send_scout(
        &self,
        credentials: &Credentials,
        message: &ScoutMessage,
    ) -> Result<SendOutcome, ScrapeError> {
        let cookies = self.establish_session(credentials).await?;
        scout::send_message(
            &self.http,
            &self.cfg,
            &cookies,
            message,
            self.heuristic.as_ref(),
        )
        .await
    }

    /// Sends a batch over one session. Per-recipient failures are collected,
    /// never allowed to abort the rest of the batch; only a failure to
    /// establish the session at all fails the whole call.
    pub async fn send_scout_batch(
        &self,
        credentials: &Credentials,
        messages: &[ScoutMessage],
    ) -> Result<Vec<Result<SendOutcome, ScrapeError>>, ScrapeError> {
        let cookies = self.establish_session(credentials).await?;

        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            let result = scout::send_message(
                &self.http,
                &self.cfg,
                &cookies,
                message,
                self.heuristic.as_ref(),
            )
            .await;
            if let Err(err) = &result {
                info!(recipient = message.recipient_id, error = %err, "batch item failed");
            }
            outcomes.push(result);
        }
        Ok(outcomes)
    }

    async fn establish_session(
        &self,
        credentials: &Credentials,
    ) -> Result<CookieSnapshot, ScrapeError> {
        if let Some(snapshot) = cached_session(self.cookie_cache.as_deref(), &credentials.username)
        {
            debug!(username = %credentials.username, "session restored from cookie cache");
            return Ok(snapshot);
        }

        let snapshot = browser::bootstrap_login(&self.cfg, credentials).await?;
        if let Some(cache) = &self.cookie_cache {
            cache.store(&credentials.username, &snapshot);
        }
        Ok(snapshot)
    }
}

/// Returns a cached snapshot only when it is actually usable. A miss, or a
/// cached entry missing a required cookie, falls through to full bootstrap.
fn cached_session(cache: Option<&dyn CookieCache>, username: &str) -> Option<CookieSnapshot> {
    let snapshot = cache?.load(username)?;
    if snapshot.has_required() {
        Some(snapshot)
    } else {
        None
    }
}

/// Walks the selected row offsets in order, appending each page's candidates.
/// The first page yielding zero candidates ends traversal immediately, even
/// when further offsets remain; any fetch or extraction failure is terminal.
async fn traverse_offsets<F, Fut>(
    candidates: &mut Vec<Candidate>,
    offsets: &[u64],
    page_delay: Duration,
    mut fetch_page: F,
) -> Result<(), ScrapeError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<String, ScrapeError>>,
{
    for (i, offset) in offsets.iter().enumerate() {
        let page = i + 2;
        info!(page, offset, "fetching result page");

        let html = fetch_page(*offset).await?;
        let page_candidates = parser::extract_candidates(&html)?;
        if page_candidates.is_empty() {
            info!(page, "page returned no candidates, stopping traversal");
            break;
        }
        candidates.extend(page_candidates);

        // Courtesy rate limiting between pages.
        sleep(page_delay).await;
    }
    Ok(())
}

/// Picks which discovered offsets to follow. Page 1 is already fetched, so a
/// `max_pages` of N allows N − 1 additional offsets unless `fetch_all`.
fn select_offsets(offsets: &[u64], fetch_all: bool, max_pages: u32) -> Vec<u64> {
    if fetch_all {
        offsets.to_vec()
    } else {
        let additional = max_pages.saturating_sub(1) as usize;
        offsets.iter().copied().take(additional).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_pages_bounds_additional_offsets() {
        assert_eq!(select_offsets(&[20, 40, 60], false, 2), vec![20]);
        assert_eq!(select_offsets(&[20, 40, 60], false, 3), vec![20, 40]);
    }

    #[test]
    fn max_pages_one_selects_nothing() {
        assert!(select_offsets(&[20, 40, 60], false, 1).is_empty());
    }

    #[test]
    fn fetch_all_ignores_the_cap() {
        assert_eq!(select_offsets(&[20, 40, 60], true, 1), vec![20, 40, 60]);
    }

    #[test]
    fn fewer_offsets_than_cap_is_fine() {
        assert_eq!(select_offsets(&[20], false, 5), vec![20]);
        assert!(select_offsets(&[], false, 5).is_empty());
    }

    fn one_row_page(id: u64) -> String {
        format!(
            r#"<html><body><div class="userSet">
                <input class="js_sid" value="{}">
            </div></body></html>"#,
            id
        )
    }

    const EMPTY_PAGE: &str = "<html><body><p>0件</p></body></html>";

    #[tokio::test]
    async fn max_pages_two_issues_exactly_one_additional_fetch() {
        let discovered = [20, 40, 60];
        let selected = select_offsets(&discovered, false, 2);

        let requested = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = requested.clone();

        let mut candidates = vec![Candidate::default()];
        traverse_offsets(&mut candidates, &selected, Duration::ZERO, move |offset| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(offset);
                Ok(one_row_page(offset))
            }
        })
        .await
        .unwrap();

        assert_eq!(*requested.lock().unwrap(), vec![20]);
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn empty_page_stops_traversal_even_when_fetching_all() {
        let selected = select_offsets(&[20, 40, 60], true, 1);
        assert_eq!(selected, vec![20, 40, 60]);

        let requested = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = requested.clone();

        let mut candidates = vec![Candidate::default()];
        traverse_offsets(&mut candidates, &selected, Duration::ZERO, move |offset| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(offset);
                Ok(EMPTY_PAGE.to_string())
            }
        })
        .await
        .unwrap();

        // Offset 20 came back empty, so 40 and 60 are never requested.
        assert_eq!(*requested.lock().unwrap(), vec![20]);
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn traversal_appends_in_fetch_order() {
        let selected = [20u64, 40];
        let mut candidates = Vec::new();
        traverse_offsets(&mut candidates, &selected, Duration::ZERO, |offset| async move {
            Ok(one_row_page(offset))
        })
        .await
        .unwrap();

        let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Some(20), Some(40)]);
    }

    #[tokio::test]
    async fn fetch_failure_is_terminal() {
        let mut candidates = Vec::new();
        let result = traverse_offsets(&mut candidates, &[20], Duration::ZERO, |_| async {
            Err(ScrapeError::PageAccess {
                status: 403,
                url: "https://en-ambi.com/company/scout/search_list/".to_string(),
            })
        })
        .await;
        assert!(matches!(result, Err(ScrapeError::PageAccess { .. })));
    }

    #[test]
    fn usable_cached_session_skips_bootstrap() {
        use session::MemoryCookieCache;

        let cache = MemoryCookieCache::default();
        cache.store(
            "alice",
            &CookieSnapshot::from_pairs([("PHPSESSID", "s"), ("C13CC", "c")]),
        );

        let hit = cached_session(Some(&cache as &dyn CookieCache), "alice");
        assert!(hit.is_some());
        assert!(hit.unwrap().has_required());
    }

    #[test]
    fn cache_miss_or_stale_entry_falls_back_to_bootstrap() {
        use session::MemoryCookieCache;

        let cache = MemoryCookieCache::default();
        assert!(cached_session(Some(&cache as &dyn CookieCache), "alice").is_none());

        // Entry missing a required cookie is not usable either.
        cache.store("alice", &CookieSnapshot::from_pairs([("PHPSESSID", "s")]));
        assert!(cached_session(Some(&cache as &dyn CookieCache), "alice").is_none());

        assert!(cached_session(None, "alice").is_none());
    }
}
