//! HTTP replay side of the hybrid client.
//!
//! Runs on the cookie snapshot the browser phase produced. Every request
//! carries the full cookie header and a referer matching the page a real
//! browser session would have come from; the target treats a mismatch the
//! same as an unauthenticated request.

use reqwest::header::{HeaderMap, HeaderValue, COOKIE, ORIGIN, REFERER};
use reqwest::Client;
use tracing::debug;

use crate::client::parser;
use crate::client::session::CookieSnapshot;
use crate::config::Config;
use crate::error::ScrapeError;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub fn build_client(cfg: &Config) -> Result<Client, ScrapeError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "accept",
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        "accept-language",
        HeaderValue::from_static("ja,en-US;q=0.9,en;q=0.8"),
    );
    headers.insert("cache-control", HeaderValue::from_static("no-cache"));
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    if let Ok(origin) = HeaderValue::from_str(&cfg.base_url) {
        headers.insert(ORIGIN, origin);
    }

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(cfg.request_timeout)
        .build()?;
    Ok(client)
}

/// Fetches the index page and extracts the current anti-forgery token.
///
/// Tokens are short-lived and scoped to the page that produced them; this is
/// called fresh immediately before every state-changing POST and the result
/// is never reused across endpoints.
pub async fn fetch_token(
    client: &Client,
    cfg: &Config,
    cookies: &CookieSnapshot,
    referer: &str,
) -> Result<String, ScrapeError> {
    let url = index_url(cfg);
    let response = client
        .get(&url)
        .header(COOKIE, cookies.header_value())
        .header(REFERER, referer)
        .send()
        .await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(ScrapeError::PageAccess {
            status: status.as_u16(),
            url,
        });
    }

    let body = response.text().await?;
    parser::extract_token(&body).ok_or(ScrapeError::TokenNotFound)
}

/// POSTs a url-encoded form and returns the body, failing on any non-200.
pub async fn post_form(
    client: &Client,
    url: &str,
    params: &[(String, String)],
    cookies: &CookieSnapshot,
    referer: &str,
    xhr: bool,
) -> Result<String, ScrapeError> {
    let (status, body) = post_form_lenient(client, url, params, cookies, referer, xhr).await?;
    if status != 200 {
        return Err(ScrapeError::PageAccess {
            status,
            url: url.to_string(),
        });
    }
    Ok(body)
}

/// POSTs a url-encoded form and returns status and body without judging the
/// status. The scout send path classifies its own responses.
pub async fn post_form_lenient(
    client: &Client,
    url: &str,
    params: &[(String, String)],
    cookies: &CookieSnapshot,
    referer: &str,
    xhr: bool,
) -> Result<(u16, String), ScrapeError> {
    let mut request = client
        .post(url)
        .header(COOKIE, cookies.header_value())
        .header(REFERER, referer)
        .form(params);
    if xhr {
        request = request.header("x-requested-with", "XMLHttpRequest");
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    debug!(%url, status, "form posted");

    let body = response.text().await?;
    Ok((status, body))
}

pub fn index_url(cfg: &Config) -> String {
    format!("{}/company/scout/index/action/?PK=3FFFF4", cfg.base_url)
}

pub fn search_url(cfg: &Config) -> String {
    format!("{}/company/scout/search_list/?PK=3FFFF4", cfg.base_url)
}

pub fn login_url(cfg: &Config) -> String {
    format!("{}/company_login/login/?PK=CC1E9D", cfg.base_url)
}
