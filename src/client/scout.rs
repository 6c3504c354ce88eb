//! Outbound scout message delivery.
//!
//! The send endpoint returns no structured acknowledgment; success is judged
//! by a substring heuristic the platform's behavior forces on us. The
//! heuristic sits behind [`AckHeuristic`] so a structured signal can replace
//! it if the platform ever grows one, without touching the send path.

use reqwest::Client;
use tracing::info;

use crate::client::fetcher;
use crate::client::models::{ScoutMessage, SendOutcome};
use crate::client::session::CookieSnapshot;
use crate::config::Config;
use crate::error::ScrapeError;

/// Classifies a scout-send response. Implementations must not retry or
/// mutate anything; they only read the response.
pub trait AckHeuristic: Send + Sync {
    fn classify(&self, status: u16, body: &str) -> SendOutcome;
}

/// Default verdict: HTTP 200 with no failure-indicator substring anywhere in
/// the body. Both indicators are literal ("エラー" and case-insensitive
/// "error"), so a body that legitimately mentions the word reads as failure
/// and a silent server failure on 200 reads as success. Approximate by
/// construction; do not "fix" it by guessing intent.
pub struct SubstringHeuristic;

const FAILURE_INDICATOR_JA: &str = "エラー";
const FAILURE_INDICATOR_EN: &str = "error";

impl AckHeuristic for SubstringHeuristic {
    fn classify(&self, status: u16, body: &str) -> SendOutcome {
        if status != 200 {
            return SendOutcome::Rejected {
                reason: format!("send endpoint returned status {}", status),
            };
        }
        if body.contains(FAILURE_INDICATOR_JA)
            || body.to_lowercase().contains(FAILURE_INDICATOR_EN)
        {
            return SendOutcome::Rejected {
                reason: "response body contains a failure indicator".to_string(),
            };
        }
        SendOutcome::Accepted
    }
}

/// Sends one scout message over an established session.
///
/// Fetches a fresh token for each state-changing call; the pre-warm and the
/// send never share one. A supplied `prior_search_id` makes the folder
/// pre-warm mandatory; its failure is a send failure, not a silent skip.
pub async fn send_message(
    http: &Client,
    cfg: &Config,
    cookies: &CookieSnapshot,
    message: &ScoutMessage,
    heuristic: &dyn AckHeuristic,
) -> Result<SendOutcome, ScrapeError> {
    let token_referer = format!("{}/company_login/login/", cfg.base_url);

    if let Some(search_id) = message.prior_search_id {
        let token = fetcher::fetch_token(http, cfg, cookies, &token_referer).await?;
        prewarm_folder(http, cfg, cookies, message.recipient_id, search_id, &token).await?;
    }

    let token = fetcher::fetch_token(http, cfg, cookies, &token_referer).await?;
    let params = encode_message(message, &token);

    let url = format!("{}/company/api/scout_send/run", cfg.base_url);
    let (status, body) = fetcher::post_form_lenient(
        http,
        &url,
        &params,
        cookies,
        &fetcher::index_url(cfg),
        false,
    )
    .await?;

    let outcome = heuristic.classify(status, &body);
    info!(recipient = message.recipient_id, ?outcome, "scout send classified");
    Ok(outcome)
}

/// Folder-listing call the server expects before a send that references an
/// earlier search. Settles server-side state; nothing in the response is
/// consumed.
async fn prewarm_folder(
    http: &Client,
    cfg: &Config,
    cookies: &CookieSnapshot,
    recipient_id: u64,
    search_id: u64,
    token: &str,
) -> Result<(), ScrapeError> {
    let url = format!(
        "{}/company/api/scout_list_message_frame/index/scoutfolder/?sendpage=scoutfolder&SearchID={}",
        cfg.base_url, search_id
    );
    let referer = format!(
        "{}/company/scout/folder/?SearchID={}&PK=CC1E9D",
        cfg.base_url, search_id
    );
    let params = vec![
        ("SID".to_string(), recipient_id.to_string()),
        ("C13CT".to_string(), token.to_string()),
    ];

    fetcher::post_form(http, &url, &params, cookies, &referer, true).await?;
    Ok(())
}

/// Flattens a message into the send endpoint's form fields. Attachments go
/// out as an indexed array; optional controls are omitted entirely when
/// unset.
pub fn encode_message(message: &ScoutMessage, token: &str) -> Vec<(String, String)> {
    let mut params = vec![
        ("C13CT".to_string(), token.to_string()),
        ("UID".to_string(), message.recipient_id.to_string()),
        ("ScoutType".to_string(), message.scout_type.to_string()),
    ];

    for (i, work_id) in message.attached_work_ids.iter().enumerate() {
        params.push((format!("attachedWorkID[{}]", i), work_id.to_string()));
    }

    params.push(("Title".to_string(), message.title.clone()));
    params.push(("Body".to_string(), message.body.clone()));

    let mut optional = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            params.push((key.to_string(), value));
        }
    };
    optional("ReplyDeadline", message.reply_deadline.clone());
    optional("isScout", message.is_scout.map(|v| v.to_string()));
    optional("sendPage", message.send_page.map(|v| v.to_string()));
    optional("rescout", message.rescout.map(|v| v.to_string()));
    optional("retransmission", message.retransmission.map(|v| v.to_string()));
    optional(
        "rescoutTransSelect",
        message.rescout_trans_select.map(|v| v.to_string()),
    );
    optional("rescoutTitle", message.rescout_title.clone());
    optional("rescoutBody", message.rescout_body.clone());

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_message() -> ScoutMessage {
        ScoutMessage {
            recipient_id: 111222,
            scout_type: 10,
            attached_work_ids: vec![3284016, 3284017],
            title: "ご経歴を拝見しました".to_string(),
            body: "ぜひ一度お話しませんか。".to_string(),
            reply_deadline: None,
            is_scout: None,
            send_page: None,
            rescout: None,
            retransmission: None,
            rescout_trans_select: None,
            rescout_title: None,
            rescout_body: None,
            prior_search_id: None,
        }
    }

    fn get<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn attachments_encode_as_indexed_fields() {
        let params = encode_message(&base_message(), "tok");
        assert_eq!(get(&params, "attachedWorkID[0]"), Some("3284016"));
        assert_eq!(get(&params, "attachedWorkID[1]"), Some("3284017"));
        assert_eq!(get(&params, "attachedWorkID[2]"), None);
        assert_eq!(get(&params, "UID"), Some("111222"));
        assert_eq!(get(&params, "ScoutType"), Some("10"));
        assert_eq!(get(&params, "C13CT"), Some("tok"));
    }

    #[test]
    fn unset_optional_controls_are_omitted() {
        let params = encode_message(&base_message(), "tok");
        for key in ["ReplyDeadline", "isScout", "sendPage", "rescout", "rescoutTitle"] {
            assert_eq!(get(&params, key), None, "{} should be absent", key);
        }

        let mut message = base_message();
        message.rescout = Some(1);
        message.rescout_title = Some("再スカウト".to_string());
        let params = encode_message(&message, "tok");
        assert_eq!(get(&params, "rescout"), Some("1"));
        assert_eq!(get(&params, "rescoutTitle"), Some("再スカウト"));
    }

    #[test]
    fn heuristic_accepts_clean_200() {
        let verdict = SubstringHeuristic.classify(200, "<html><body>送信完了</body></html>");
        assert_eq!(verdict, SendOutcome::Accepted);
    }

    #[test]
    fn heuristic_rejects_failure_indicators() {
        assert!(matches!(
            SubstringHeuristic.classify(200, "エラーが発生しました"),
            SendOutcome::Rejected { .. }
        ));
        assert!(matches!(
            SubstringHeuristic.classify(200, "An ERROR occurred"),
            SendOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn heuristic_rejects_non_200() {
        assert!(matches!(
            SubstringHeuristic.classify(302, "redirected"),
            SendOutcome::Rejected { .. }
        ));
    }
}
