//! Browser-driven login phase.
//!
//! The login form sets its session cookies through scripted redirects a
//! plain HTTP client cannot follow, so authentication runs in a real
//! Chromium instance. The browser is fully torn down before HTTP replay
//! begins; the phases meet only at the extracted [`CookieSnapshot`].

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::client::fetcher;
use crate::client::models::Credentials;
use crate::client::session::CookieSnapshot;
use crate::config::Config;
use crate::error::ScrapeError;

const LOGIN_ID_INPUT: &str = r#"input[name="accLoginID"]"#;
const LOGIN_PW_INPUT: &str = r#"input[name="accLoginPW"]"#;
const LOGIN_BUTTON: &str = "button.loginbtn";
/// A post-submit URL still under this path means the login was rejected.
const LOGIN_PATH: &str = "/company_login/login/";

fn engine<E: std::fmt::Display>(err: E) -> ScrapeError {
    ScrapeError::Browser(err.to_string())
}

/// Drives the login flow in headless Chromium and harvests the session
/// cookies. The browser context is closed on every exit path, including
/// failure and timeout.
pub async fn bootstrap_login(
    cfg: &Config,
    credentials: &Credentials,
) -> Result<CookieSnapshot, ScrapeError> {
    let browser_cfg = BrowserConfig::builder()
        .build()
        .map_err(ScrapeError::Browser)?;
    let (mut browser, mut handler) = Browser::launch(browser_cfg).await.map_err(engine)?;
    let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

    let outcome = timeout(
        cfg.navigation_timeout,
        drive_login(&browser, cfg, credentials),
    )
    .await;

    if let Err(err) = browser.close().await {
        warn!(error = %err, "browser close failed");
    }
    let _ = browser.wait().await;
    handler_task.abort();

    match outcome {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::Browser(format!(
            "login phase exceeded {:?}",
            cfg.navigation_timeout
        ))),
    }
}

async fn drive_login(
    browser: &Browser,
    cfg: &Config,
    credentials: &Credentials,
) -> Result<CookieSnapshot, ScrapeError> {
    let login_url = fetcher::login_url(cfg);
    info!(url = %login_url, "starting browser login");

    let page = browser.new_page(login_url).await.map_err(engine)?;

    fill_field(&page, LOGIN_ID_INPUT, &credentials.username).await?;
    fill_field(&page, LOGIN_PW_INPUT, &credentials.password).await?;

    let submit = page.find_element(LOGIN_BUTTON).await.map_err(engine)?;
    submit.click().await.map_err(engine)?;

    page.wait_for_navigation().await.map_err(engine)?;
    // The post-login page keeps loading fragments after navigation settles.
    sleep(cfg.settle_delay).await;

    let url = require_url(page.url().await.map_err(engine)?)?;
    check_left_login_page(&url)?;

    let cookies = page.get_cookies().await.map_err(engine)?;
    let snapshot = harvest_cookies(cookies.into_iter().map(|c| (c.name, c.value)))?;

    info!(cookies = snapshot.cookies().len(), "browser login succeeded");
    Ok(snapshot)
}

fn require_url(url: Option<String>) -> Result<String, ScrapeError> {
    url.ok_or_else(|| ScrapeError::Browser("post-submit page reported no URL".to_string()))
}

fn check_left_login_page(url: &str) -> Result<(), ScrapeError> {
    if url.contains(LOGIN_PATH) {
        return Err(ScrapeError::Authentication(
            "credentials rejected, still on login page".to_string(),
        ));
    }
    Ok(())
}

fn harvest_cookies<I>(pairs: I) -> Result<CookieSnapshot, ScrapeError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let snapshot = CookieSnapshot::from_pairs(pairs);
    let missing = snapshot.missing_required();
    if !missing.is_empty() {
        return Err(ScrapeError::Authentication(format!(
            "required cookies not set after login: {}",
            missing.join(", ")
        )));
    }
    Ok(snapshot)
}

async fn fill_field(
    page: &chromiumoxide::Page,
    selector: &str,
    value: &str,
) -> Result<(), ScrapeError> {
    let element = page.find_element(selector).await.map_err(engine)?;
    element.click().await.map_err(engine)?;
    element.type_str(value).await.map_err(engine)?;
    Ok(())
}
