// Request and response shapes exchanged with the keyscore API, plus the
// small value types the CLI builds them from.

use crate::detector::TypeTag;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Highest page the search endpoint will serve.
pub const MAX_PAGE: u32 = 10;
/// Largest page size the search endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Data types a search or count can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Login,
    Password,
    Url,
    Email,
    Domain,
    #[value(name = "email_domain")]
    EmailDomain,
    Username,
    Ip,
    Hash,
    Phone,
    Uuid,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Login => "login",
            SearchType::Password => "password",
            SearchType::Url => "url",
            SearchType::Email => "email",
            SearchType::Domain => "domain",
            SearchType::EmailDomain => "email_domain",
            SearchType::Username => "username",
            SearchType::Ip => "ip",
            SearchType::Hash => "hash",
            SearchType::Phone => "phone",
            SearchType::Uuid => "uuid",
        }
    }

    /// The API knows logins as emails.
    pub fn for_request(self) -> SearchType {
        match self {
            SearchType::Login => SearchType::Email,
            other => other,
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TypeTag> for SearchType {
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Uuid => SearchType::Uuid,
            TypeTag::Email => SearchType::Email,
            TypeTag::Url => SearchType::Url,
            TypeTag::Domain => SearchType::Domain,
        }
    }
}

/// Maps user-facing types to what the API expects.
pub fn request_types(types: &[SearchType]) -> Vec<SearchType> {
    types.iter().map(|t| t.for_request()).collect()
}

/// Joins types with `", "` for messages.
pub fn join_types(types: &[SearchType]) -> String {
    types.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
}

/// Optional paging for `/search`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pages: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Pagination {
    /// Builds paging parameters from the raw flags, clamping to what the API
    /// serves. Returns `None` when no paging flag was given.
    pub fn from_flags(page: Option<u32>, pages: Option<&str>, page_size: Option<u32>) -> Option<Self> {
        let pagination = Pagination {
            page: page.filter(|p| *p > 0).map(|p| p.min(MAX_PAGE)),
            pages: pages.map(parse_pages).unwrap_or_default(),
            page_size: page_size.filter(|s| *s > 0).map(|s| s.min(MAX_PAGE_SIZE)),
        };
        if pagination == Pagination::default() {
            None
        } else {
            Some(pagination)
        }
    }
}

/// Parses `"1,2,3"`, `"1-5"` or a mix of both. Pages outside `1..=MAX_PAGE`
/// and unparsable items are dropped; the result is sorted and deduplicated.
pub fn parse_pages(input: &str) -> Vec<u32> {
    let mut pages = Vec::new();
    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((start, end)) = item.split_once('-') {
            if let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>()) {
                pages.extend(start.max(1)..=end.min(MAX_PAGE));
            }
        } else if let Ok(page) = item.parse::<u32>() {
            pages.push(page);
        }
    }
    pages.retain(|p| (1..=MAX_PAGE).contains(p));
    pages.sort_unstable();
    pages.dedup();
    pages
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub terms: Vec<String>,
    pub types: Vec<SearchType>,
    pub wildcard: bool,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(flatten)]
    pub pagination: Option<Pagination>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CountRequest {
    pub terms: Vec<String>,
    pub types: Vec<SearchType>,
    pub wildcard: bool,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Map<String, Value>,
    #[serde(default)]
    pub pages: BTreeMap<String, Value>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

impl SearchResponse {
    pub fn is_paginated(&self) -> bool {
        !self.pages.is_empty()
    }

    /// Number of results reported by the API (paginated) or returned inline.
    pub fn result_count(&self) -> u64 {
        if self.is_paginated() {
            self.size.unwrap_or(0)
        } else {
            self.results.len() as u64
        }
    }

    /// Page numbers sorted numerically (`pages` is keyed by strings).
    pub fn page_numbers(&self) -> Vec<(u64, &Value)> {
        let mut pages: Vec<(u64, &Value)> = self
            .pages
            .iter()
            .filter_map(|(k, v)| k.parse::<u64>().ok().map(|n| (n, v)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);
        pages
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct DetailedCountResponse {
    #[serde(default)]
    pub counts: Map<String, Value>,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub took: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CreditsResponse {
    pub credits: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Normalized machine information attached to a log archive.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hwid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_threads: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gpus: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anti_viruses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_elevated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, rename = "netBIOS", skip_serializing_if = "Option::is_none")]
    pub net_bios: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyboard_layouts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_laptop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub process_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub installed_apps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_tree: Vec<String>,
    /// Fields this client does not model explicitly, kept so nothing the
    /// API sends is lost when printing or saving.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MachineInfoResponse {
    #[serde(default)]
    pub data: Option<MachineInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What the presenter is asked to print. The variant is chosen by the
/// endpoint that produced the value, never by inspecting its contents.
#[derive(Debug, Clone)]
pub enum Payload {
    MachineInfo(MachineInfo),
    Json(Value),
}

/// Formats numbers with thousands separators. Fractional values keep two
/// decimals; numeric strings are parsed first; anything else prints as is.
pub fn format_number(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                format_int(i)
            } else if let Some(u) = n.as_u64() {
                group_digits(&u.to_string())
            } else {
                format_float(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                format_int(i)
            } else if let Ok(f) = s.trim().parse::<f64>() {
                format_float(f)
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        format_int(f as i64)
    } else {
        format!("{:.2}", f)
    }
}

pub fn format_int(n: i64) -> String {
    let grouped = group_digits(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_is_sent_as_email() {
        let types = request_types(&[SearchType::Login, SearchType::Password, SearchType::EmailDomain]);
        assert_eq!(
            serde_json::to_value(&types).unwrap(),
            json!(["email", "password", "email_domain"])
        );
    }

    #[test]
    fn detector_tags_convert() {
        assert_eq!(SearchType::from(TypeTag::Domain), SearchType::Domain);
        assert_eq!(SearchType::from(TypeTag::Uuid).as_str(), "uuid");
    }

    #[test]
    fn search_request_flattens_pagination() {
        let req = SearchRequest {
            terms: vec!["example.com".into()],
            types: vec![SearchType::Domain],
            wildcard: false,
            source: "xkeyscore".into(),
            operator: None,
            pagination: Pagination::from_flags(Some(12), Some("1-3"), Some(50_000)),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "terms": ["example.com"],
                "types": ["domain"],
                "wildcard": false,
                "source": "xkeyscore",
                "page": 10,
                "pages": [1, 2, 3],
                "pageSize": 10000
            })
        );
    }

    #[test]
    fn no_paging_flags_means_no_pagination() {
        assert_eq!(Pagination::from_flags(None, None, None), None);
        assert_eq!(Pagination::from_flags(Some(0), Some(""), Some(0)), None);
    }

    #[test]
    fn parses_page_lists_and_ranges() {
        assert_eq!(parse_pages("1,2,3"), vec![1, 2, 3]);
        assert_eq!(parse_pages("1-5"), vec![1, 2, 3, 4, 5]);
        assert_eq!(parse_pages("3, 1-2, 3, x, 0, 11, 9-12"), vec![1, 2, 3, 9, 10]);
        assert!(parse_pages("5-1").is_empty());
        assert_eq!(parse_pages("1-4294967295"), (1..=10).collect::<Vec<_>>());
        assert_eq!(parse_pages("0-3, 8-4000000000"), vec![1, 2, 3, 8, 9, 10]);
        assert!(parse_pages("11-4294967295").is_empty());
    }

    #[test]
    fn search_response_orders_pages_numerically() {
        let resp: SearchResponse = serde_json::from_value(json!({
            "pages": {"10": [], "2": [], "1": []},
            "size": 42
        }))
        .unwrap();
        assert!(resp.is_paginated());
        assert_eq!(resp.result_count(), 42);
        let order: Vec<u64> = resp.page_numbers().into_iter().map(|(n, _)| n).collect();
        assert_eq!(order, vec![1, 2, 10]);
    }

    #[test]
    fn machine_info_keeps_unknown_fields() {
        let info: MachineInfo = serde_json::from_value(json!({
            "operatingSystem": "Windows 10",
            "netBIOS": "WORKGROUP",
            "fileTree": ["a/b.txt"],
            "monitors": [{"name": "DELL"}]
        }))
        .unwrap();
        assert_eq!(info.operating_system.as_deref(), Some("Windows 10"));
        assert_eq!(info.net_bios.as_deref(), Some("WORKGROUP"));
        assert_eq!(info.file_tree, vec!["a/b.txt"]);
        assert!(info.extra.contains_key("monitors"));
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(&json!(1234567)), "1,234,567");
        assert_eq!(format_number(&json!(999)), "999");
        assert_eq!(format_number(&json!(-1000)), "-1,000");
        assert_eq!(format_number(&json!(1.5)), "1.50");
        assert_eq!(format_number(&json!(2e6)), "2,000,000");
        assert_eq!(format_number(&json!("12345")), "12,345");
        assert_eq!(format_number(&json!("n/a")), "n/a");
        assert_eq!(format_number(&json!(null)), "null");
    }
}
