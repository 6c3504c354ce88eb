//! Extraction of candidate records and pagination offsets from result pages.
//!
//! The target exposes no API; its server-rendered markup is the contract.
//! Everything keyed to a class name or literal token lives in the [`markup`]
//! table so drift in the site's markup is a data change here, not a logic
//! change. Per-field extraction is best-effort: a missing sub-element nulls
//! that field only.

use std::collections::BTreeSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::client::models::Candidate;
use crate::error::ScrapeError;

/// Declarative map of the target's markup contract.
pub mod markup {
    /// Container for one candidate row.
    pub const RESULT_ROW: &str = "div.userSet";
    /// Hidden input carrying the internal candidate id.
    pub const ID_INPUT: &str = "input.js_sid";
    /// Gender / age / location line.
    pub const PROFILE: &str = "div.prof";
    /// "No.N" sequence label.
    pub const SEQUENCE: &str = "div.num";
    pub const COMPANY: &str = "div.companyData";
    pub const COMPANY_NAME: &str = "div.name";
    pub const COMPANY_SUB: &str = "div.sub";
    /// Labeled detail items, classified by the class tags below.
    pub const DATA_ITEM: &str = "li.data";
    pub const SUMMARY: &str = "div.resumeContent";
    /// Pagination links at the bottom of a result page.
    pub const PAGE_LINK: &str = "ul.pageList li a.link";
    /// Hidden input holding the rotating anti-forgery token.
    pub const TOKEN_INPUT: &str = "input[name=\"C13CT\"]";

    pub const TAG_EDUCATION: &str = "school";
    pub const TAG_JOB_CHANGE: &str = "change";
    pub const TAG_PAST_JOB: &str = "pastjob";
    pub const TAG_LANGUAGE: &str = "language";

    /// Site renders gender as one of these literal tokens.
    pub const GENDER_FEMALE: &str = "女性";
    pub const GENDER_MALE: &str = "男性";
    /// Label prefix stripped from the job-change item.
    pub const JOB_CHANGE_LABEL: &str = "転職回数：";
    pub const SEQUENCE_PREFIX: &str = "No.";
    /// Digit group before the age unit suffix.
    pub const AGE_PATTERN: &str = r"(\d+)歳";
    /// Text segment following the age suffix and separator.
    pub const LOCATION_PATTERN: &str = r"歳\s*/\s*(\S+)";
    /// Row-offset parameter embedded in each pagination link's query string.
    pub const OFFSET_PATTERN: &str = r"per_page=(\d+)";
}

// Selectors and patterns below are static table entries; parsing them can
// only fail if the markup table itself is edited into invalid syntax.
fn sel(source: &str) -> Selector {
    Selector::parse(source).expect("invalid selector in markup table")
}

fn flat_text(el: &ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

/// Parses one result page into candidate records, in document order.
///
/// Zero rows is a valid, empty result. The only error is the coarse sanity
/// check that the page has a document structure at all; callers may ignore
/// it and treat the page as empty.
pub fn extract_candidates(html: &str) -> Result<Vec<Candidate>, ScrapeError> {
    let doc = Html::parse_document(html);
    if doc.select(&sel("html")).next().is_none() {
        return Err(ScrapeError::ExtractionStructure(
            "page has no document root".to_string(),
        ));
    }

    let row_sel = sel(markup::RESULT_ROW);
    let age_re = Regex::new(markup::AGE_PATTERN).expect("invalid pattern in markup table");
    let loc_re = Regex::new(markup::LOCATION_PATTERN).expect("invalid pattern in markup table");

    let candidates = doc
        .select(&row_sel)
        .map(|row| extract_row(&row, &age_re, &loc_re))
        .collect();
    Ok(candidates)
}

fn extract_row(row: &ElementRef, age_re: &Regex, loc_re: &Regex) -> Candidate {
    let mut c = Candidate::default();

    c.id = row
        .select(&sel(markup::ID_INPUT))
        .next()
        .and_then(|el| el.value().attr("value"))
        .and_then(|v| v.trim().parse::<i64>().ok());

    if let Some(prof) = row.select(&sel(markup::PROFILE)).next() {
        let text = flat_text(&prof);
        c.gender = if text.contains(markup::GENDER_FEMALE) {
            Some(markup::GENDER_FEMALE.to_string())
        } else if text.contains(markup::GENDER_MALE) {
            Some(markup::GENDER_MALE.to_string())
        } else {
            None
        };
        c.age = age_re
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u32>().ok());
        c.location = loc_re.captures(&text).map(|caps| caps[1].to_string());
    }

    c.no = row
        .select(&sel(markup::SEQUENCE))
        .next()
        .map(|el| flat_text(&el))
        .and_then(|text| {
            text.strip_prefix(markup::SEQUENCE_PREFIX)
                .and_then(|n| n.trim().parse::<u32>().ok())
        });

    if let Some(company) = row.select(&sel(markup::COMPANY)).next() {
        c.company = company
            .select(&sel(markup::COMPANY_NAME))
            .next()
            .map(|el| flat_text(&el));
        c.sub_info = company
            .select(&sel(markup::COMPANY_SUB))
            .next()
            .map(|el| flat_text(&el));
    }

    for item in row.select(&sel(markup::DATA_ITEM)) {
        let text = flat_text(&item);
        let classes: Vec<&str> = item.value().classes().collect();
        if classes.contains(&markup::TAG_EDUCATION) {
            c.education = Some(text);
        } else if classes.contains(&markup::TAG_JOB_CHANGE) {
            c.job_change = Some(text.replace(markup::JOB_CHANGE_LABEL, ""));
        } else if classes.contains(&markup::TAG_PAST_JOB) {
            c.past_jobs.push(text);
        } else if classes.contains(&markup::TAG_LANGUAGE) {
            c.language = Some(text);
        }
    }

    c.summary = row
        .select(&sel(markup::SUMMARY))
        .next()
        .map(|el| flat_text(&el));

    c
}

/// Collects the distinct positive row offsets embedded in the page's
/// pagination links, ascending. The site encodes "go to page N" as a
/// cumulative row offset, not a page index; no page-count endpoint exists.
pub fn discover_offsets(html: &str) -> Vec<u64> {
    let doc = Html::parse_document(html);
    let link_sel = sel(markup::PAGE_LINK);
    let offset_re = Regex::new(markup::OFFSET_PATTERN).expect("invalid pattern in markup table");

    let mut offsets = BTreeSet::new();
    for link in doc.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if let Some(caps) = offset_re.captures(href) {
            if let Ok(value) = caps[1].parse::<u64>() {
                if value > 0 {
                    offsets.insert(value);
                }
            }
        }
    }
    offsets.into_iter().collect()
}

/// Extracts the rotating anti-forgery token from an index page body.
pub fn extract_token(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&sel(markup::TOKEN_INPUT))
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ROW_PAGE: &str = r#"
        <html><body>
        <div class="userSet">
          <input class="js_sid" type="hidden" value="1234567">
          <div class="prof">女性 / 28歳 / 東京都</div>
          <div class="num">No.1</div>
          <div class="companyData">
            <div class="name">株式会社サンプル</div>
            <div class="sub">IT・通信</div>
          </div>
          <ul>
            <li class="data school">早稲田大学</li>
            <li class="data change">転職回数：2回</li>
            <li class="data pastjob">営業</li>
            <li class="data pastjob">マーケティング</li>
            <li class="data language">英語（ビジネス）</li>
          </ul>
          <div class="resumeContent">自己PRです。</div>
        </div>
        <div class="userSet">
          <input class="js_sid" type="hidden" value="7654321">
          <div class="prof">男性 / 大阪府</div>
          <div class="num">No.2</div>
        </div>
        </body></html>
    "#;

    #[test]
    fn extracts_fully_populated_row() {
        let candidates = extract_candidates(TWO_ROW_PAGE).unwrap();
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.id, Some(1234567));
        assert_eq!(first.gender.as_deref(), Some("女性"));
        assert_eq!(first.age, Some(28));
        assert_eq!(first.location.as_deref(), Some("東京都"));
        assert_eq!(first.no, Some(1));
        assert_eq!(first.company.as_deref(), Some("株式会社サンプル"));
        assert_eq!(first.sub_info.as_deref(), Some("IT・通信"));
        assert_eq!(first.education.as_deref(), Some("早稲田大学"));
        assert_eq!(first.job_change.as_deref(), Some("2回"));
        assert_eq!(first.past_jobs, vec!["営業", "マーケティング"]);
        assert_eq!(first.language.as_deref(), Some("英語（ビジネス）"));
        assert_eq!(first.summary.as_deref(), Some("自己PRです。"));
    }

    #[test]
    fn missing_age_nulls_only_that_field() {
        let candidates = extract_candidates(TWO_ROW_PAGE).unwrap();
        let second = &candidates[1];
        assert_eq!(second.age, None);
        assert_eq!(second.location, None);
        assert_eq!(second.id, Some(7654321));
        assert_eq!(second.gender.as_deref(), Some("男性"));
        assert_eq!(second.no, Some(2));
        assert_eq!(second.company, None);
        assert!(second.past_jobs.is_empty());
    }

    #[test]
    fn zero_rows_is_empty_not_error() {
        let candidates = extract_candidates("<html><body><p>0件</p></body></html>").unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn row_order_follows_document_order() {
        let candidates = extract_candidates(TWO_ROW_PAGE).unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Some(1234567), Some(7654321)]);
    }

    #[test]
    fn non_numeric_id_degrades_to_null() {
        let page = r#"<html><body>
            <div class="userSet"><input class="js_sid" value="n/a"></div>
        </body></html>"#;
        let candidates = extract_candidates(page).unwrap();
        assert_eq!(candidates[0].id, None);
    }

    #[test]
    fn offsets_are_distinct_positive_ascending() {
        let page = r#"<html><body><ul class="pageList">
            <li><a class="link" href="/search?per_page=40">3</a></li>
            <li><a class="link" href="/search?per_page=20">2</a></li>
            <li><a class="link" href="/search?per_page=20">2 (dup)</a></li>
            <li><a class="link" href="/search?per_page=0">zero</a></li>
            <li><a class="link" href="/search?page=9">no offset</a></li>
        </ul></body></html>"#;
        assert_eq!(discover_offsets(page), vec![20, 40]);
    }

    #[test]
    fn no_pagination_links_yields_no_offsets() {
        assert!(discover_offsets("<html><body></body></html>").is_empty());
    }

    #[test]
    fn token_extraction_reads_hidden_input() {
        let page = r#"<html><body>
            <form><input type="hidden" name="C13CT" value="abc-token"></form>
        </body></html>"#;
        assert_eq!(extract_token(page).as_deref(), Some("abc-token"));
        assert_eq!(extract_token("<html><body></body></html>"), None);
    }
}
