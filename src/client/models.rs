use serde::{Deserialize, Serialize};

/// Login credentials supplied by the caller. Never persisted by this crate.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Sparse search filter. Every field is independently optional; unset numeric
/// fields are sent to the server as present-but-empty parameters, which the
/// form treats differently from an omitted key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub school: Option<u32>,
    pub job_change: Option<u32>,
    pub income_min: Option<u32>,
    pub income_max: Option<u32>,
    pub situation: Option<u32>,

    pub search_keyword1: Option<String>,
    pub search_keyword2: Option<String>,
    pub search_keyword3: Option<String>,

    pub search_out_keyword1: Option<String>,
    pub search_out_keyword2: Option<String>,
    pub search_out_keyword3: Option<String>,

    /// Emitted on the wire only when true; the server keys off presence,
    /// not value.
    pub scout_user_flg: bool,

    /// Follow every discovered pagination offset when true.
    pub fetch_all_pages: bool,
    /// Page cap when `fetch_all_pages` is false. 1 means first page only.
    pub max_pages: u32,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            age_min: None,
            age_max: None,
            school: None,
            job_change: None,
            income_min: None,
            income_max: None,
            situation: None,
            search_keyword1: None,
            search_keyword2: None,
            search_keyword3: None,
            search_out_keyword1: None,
            search_out_keyword2: None,
            search_out_keyword3: None,
            scout_user_flg: false,
            fetch_all_pages: false,
            max_pages: 1,
        }
    }
}

/// One candidate extracted from a result row. Absence of any field in the
/// source markup is expected, not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Option<i64>,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    /// Sequence number printed on the row ("No.12").
    pub no: Option<u32>,
    pub company: Option<String>,
    pub sub_info: Option<String>,
    pub education: Option<String>,
    /// Free text; the site renders a phrase, not a bare count.
    pub job_change: Option<String>,
    pub past_jobs: Vec<String>,
    pub language: Option<String>,
    pub summary: Option<String>,
}

/// One outbound scout message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutMessage {
    /// Target user id (UID on the wire).
    pub recipient_id: u64,
    /// Message-kind code (ScoutType on the wire; 10 = regular scout).
    pub scout_type: u32,
    pub attached_work_ids: Vec<u64>,
    pub title: String,
    pub body: String,

    pub reply_deadline: Option<String>,
    pub is_scout: Option<u8>,
    pub send_page: Option<u32>,
    pub rescout: Option<u8>,
    pub retransmission: Option<u8>,
    pub rescout_trans_select: Option<u8>,
    pub rescout_title: Option<String>,
    pub rescout_body: Option<String>,
    /// When set, a folder-listing pre-warm request is issued before sending.
    pub prior_search_id: Option<u64>,
}

/// Outcome of a scout send, classified heuristically.
///
/// The platform returns no structured acknowledgment; `Accepted` means HTTP
/// 200 with no failure-indicator substring in the body. That signal can
/// false-negative (body legitimately mentions the word) and false-positive
/// (silent server failure). It is an approximation and must be read as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendOutcome {
    Accepted,
    Rejected { reason: String },
}
