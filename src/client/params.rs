//! Mapping from a sparse [`FilterCriteria`] to the exact flat parameter set
//! the search form posts.
//!
//! The form's conventions are asymmetric and load-bearing: numeric fields are
//! always sent, empty when unset, while the `ScoutUserFlg` checkbox is sent
//! only when checked. Thirty numbered keyword slots exist in the form; only
//! the first three are ever populated, the rest go out empty.

use crate::client::models::FilterCriteria;
use crate::config::Config;

const KEYWORD_SLOTS: usize = 30;

type Params = Vec<(String, String)>;

fn push(params: &mut Params, key: &str, value: impl Into<String>) {
    params.push((key.to_string(), value.into()));
}

fn num(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Pure mapping from filter record to form parameters, server-required
/// defaults included.
pub fn build_search_params(filters: &FilterCriteria) -> Params {
    let mut p = Params::new();

    push(&mut p, "saved", "");
    push(&mut p, "HopeIncomeMin", "");
    push(&mut p, "IncludeNoHopeAreaFlg", "1");

    let keywords = [
        &filters.search_keyword1,
        &filters.search_keyword2,
        &filters.search_keyword3,
    ];
    for slot in 1..=KEYWORD_SLOTS {
        let value = keywords.get(slot - 1).map(|k| text(k)).unwrap_or_default();
        push(&mut p, &format!("SearchKeyword{}", slot), value);
    }

    push(&mut p, "SearchOutKeyword1", text(&filters.search_out_keyword1));
    push(&mut p, "SearchOutKeyword2", text(&filters.search_out_keyword2));
    push(&mut p, "SearchOutKeyword3", text(&filters.search_out_keyword3));

    // Language/qualification axes are fixed at the form's "no constraint"
    // values; the form rejects submissions that omit them.
    push(&mut p, "EnglishLevel", "0");
    push(&mut p, "EnglishConversation", "0");
    push(&mut p, "EnglishComprehension", "0");
    push(&mut p, "EnglishComposition", "0");
    push(&mut p, "Toeic", "");
    push(&mut p, "Toefl", "");
    push(&mut p, "OtherLanguageID", "0");
    push(&mut p, "OtherLanguageName", "");
    for i in 1..=5 {
        push(&mut p, &format!("QualificationOther{}", i), "");
    }
    for i in 1..=5 {
        push(&mut p, &format!("DepartmentName{}", i), "");
    }
    push(&mut p, "CareerManageNumber", "");
    push(&mut p, "UnemployedTerm", "0");
    for i in 1..=10 {
        push(&mut p, &format!("SchoolEducation{}", i), "");
    }
    push(&mut p, "SchoolTypeIDList", "");

    push(&mut p, "AgeMin", num(filters.age_min));
    push(&mut p, "AgeMax", num(filters.age_max));
    push(&mut p, "School", num(filters.school));
    push(&mut p, "JobChange", num(filters.job_change));
    push(&mut p, "IncomeMin", num(filters.income_min));
    push(&mut p, "IncomeMax", num(filters.income_max));
    // Unlike the other numeric axes, Situation's "unset" wire value is 0.
    push(
        &mut p,
        "Situation",
        filters.situation.map(|v| v.to_string()).unwrap_or_else(|| "0".to_string()),
    );

    if filters.scout_user_flg {
        push(&mut p, "ScoutUserFlg", "1");
    }

    p
}

/// Appends the rotating token and the fixed session identifiers every search
/// POST must carry. `Site[]` is intentionally repeated: the server reads it
/// as a multi-value selector.
pub fn extend_with_session(params: &mut Params, cfg: &Config, token: &str) {
    push(params, "C13CT", token);
    push(params, "TargetFirst", "1");
    push(params, "UserDateType", "0");
    push(params, "UserDateRange", "0");
    push(params, "ScoutReceiveCount", "-1");
    push(params, "Site[]", "2");
    push(params, "Site[]", "1");
    push(params, "CID", cfg.cid.clone());
    push(params, "isAvailableScoutMerge", "1");
    push(params, "AccID", cfg.acc_id.clone());
    push(params, "VicariousAccID", "0");
    push(params, "SalesAccountID", "0");
    push(params, "isInputEnglish", "0");
    push(params, "isSaveCondition", "");
    push(params, "isSendMail", "");
}
