use std::collections::BTreeMap;
use std::sync::Mutex;

/// Cookies the login page must have set for the HTTP phase to be accepted.
pub const REQUIRED_COOKIES: [&str; 2] = ["PHPSESSID", "C13CC"];

/// Immutable snapshot of the cookies captured from the browser context.
///
/// This is the only value that crosses from the browser phase to the HTTP
/// phase; requests render it into an explicit `Cookie` header instead of
/// sharing a mutable jar, so tests can inject a fake snapshot without
/// driving a real browser.
#[derive(Debug, Clone)]
pub struct CookieSnapshot {
    cookies: BTreeMap<String, String>,
}

impl CookieSnapshot {
    pub fn new(cookies: BTreeMap<String, String>) -> Self {
        Self { cookies }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cookies: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Names of required cookies absent from this snapshot.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_COOKIES
            .iter()
            .copied()
            .filter(|name| !self.cookies.contains_key(*name))
            .collect()
    }

    pub fn has_required(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Renders the `Cookie` request header value.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }
}

/// Optional external cookie store, keyed by username.
///
/// A hit skips the browser login; a miss (or a cached snapshot missing a
/// required cookie) falls back to the full bootstrap transparently.
/// Persistence lives outside this crate.
pub trait CookieCache: Send + Sync {
    fn load(&self, username: &str) -> Option<CookieSnapshot>;
    fn store(&self, username: &str, snapshot: &CookieSnapshot);
}

/// In-process cache, suitable for embedding callers and tests.
#[derive(Default)]
pub struct MemoryCookieCache {
    entries: Mutex<BTreeMap<String, BTreeMap<String, String>>>,
}

impl CookieCache for MemoryCookieCache {
    fn load(&self, username: &str) -> Option<CookieSnapshot> {
        let entries = self.entries.lock().ok()?;
        entries.get(username).cloned().map(CookieSnapshot::new)
    }

    fn store(&self, username: &str, snapshot: &CookieSnapshot) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(username.to_string(), snapshot.cookies().clone());
        }
    }
}
