//! Query option normalizer.
//!
//! # Responsibility
//! - Convert a raw parameter bag into a canonical [`SearchOptions`].
//!
//! # Invariants
//! - Normalization never fails; garbage input falls back to defaults.
//! - `page >= 1` and `1 <= limit <= max_page_size`, so skip is never negative.
//! - Normalizing `options.to_raw()` returns `options` unchanged.

use crate::config::SearchConfig;
use crate::model::Document;
use crate::query::projection::Projection;
use serde::{Deserialize, Serialize};

/// Raw search parameters as received from the request layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSearchParams {
    /// JSON object text of equality terms.
    pub filter: Option<String>,
    /// Comma-separated field list.
    pub fields: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    /// Field name, `-` prefixed for descending order.
    pub sort: Option<String>,
}

/// Canonical search specification consumed by entity services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub filter: Document,
    /// Comma-joined projection; empty means all fields.
    pub fields: String,
    pub page: u32,
    pub limit: u32,
    pub sort: String,
}

impl SearchOptions {
    /// Number of records skipped before the page starts.
    pub fn skip(&self) -> u64 {
        u64::from(self.limit) * u64::from(self.page.saturating_sub(1))
    }

    pub fn projection(&self) -> Projection {
        Projection::parse(&self.fields)
    }

    /// Renders the options back into raw parameters.
    pub fn to_raw(&self) -> RawSearchParams {
        RawSearchParams {
            filter: Some(serde_json::Value::Object(self.filter.clone()).to_string()),
            fields: Some(self.fields.clone()),
            page: Some(self.page.to_string()),
            limit: Some(self.limit.to_string()),
            sort: Some(self.sort.clone()),
        }
    }
}

/// Normalizes raw search parameters against endpoint defaults and bounds.
///
/// - `filter`: non-object, blank or unparsable text becomes the empty matcher.
/// - `fields`: absent uses `default_fields`; present is trimmed per entry.
/// - `page`: absent, garbage or below 1 becomes 1.
/// - `limit`: absent, garbage or below 1 becomes the default page size;
///   values above the maximum clamp to it.
/// - `sort`: absent, blank or a bare `-` becomes the default sort key.
pub fn normalize_search_options(
    params: &RawSearchParams,
    default_fields: &[&str],
    config: &SearchConfig,
) -> SearchOptions {
    let max_page_size = config.max_page_size.max(1);
    let default_page_size = config.default_page_size.clamp(1, max_page_size);

    let limit = match parse_count(params.limit.as_deref()) {
        Some(limit) if limit >= 1 => limit.min(i64::from(max_page_size)) as u32,
        _ => default_page_size,
    };
    let page = match parse_count(params.page.as_deref()) {
        Some(page) if page >= 1 => page.min(i64::from(u32::MAX)) as u32,
        _ => 1,
    };

    SearchOptions {
        filter: normalize_filter(params.filter.as_deref()),
        fields: normalize_fields(params.fields.as_deref(), default_fields),
        page,
        limit,
        sort: normalize_sort(params.sort.as_deref(), &config.default_sort),
    }
}

fn normalize_filter(raw: Option<&str>) -> Document {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return Document::new();
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => Document::new(),
    }
}

fn normalize_fields(raw: Option<&str>, default_fields: &[&str]) -> String {
    match raw {
        None => default_fields.join(","),
        Some(text) => text
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join(","),
    }
}

fn normalize_sort(raw: Option<&str>, default_sort: &str) -> String {
    match raw.map(str::trim) {
        Some(sort) if !sort.trim_start_matches('-').trim().is_empty() => sort.to_string(),
        _ => default_sort.trim().to_string(),
    }
}

/// Parses an integer the lenient way: `"3"`, `" 3 "`, `"3.9"` all read as 3.
fn parse_count(raw: Option<&str>) -> Option<i64> {
    let text = raw?.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::{normalize_search_options, parse_count, RawSearchParams};
    use crate::config::SearchConfig;

    const DEFAULT_FIELDS: &[&str] = &["name", "field_of_study"];

    fn raw(
        page: Option<&str>,
        limit: Option<&str>,
        sort: Option<&str>,
    ) -> RawSearchParams {
        RawSearchParams {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
            sort: sort.map(str::to_string),
            ..RawSearchParams::default()
        }
    }

    #[test]
    fn absent_params_fall_back_to_defaults() {
        let config = SearchConfig::default();
        let options =
            normalize_search_options(&RawSearchParams::default(), DEFAULT_FIELDS, &config);

        assert!(options.filter.is_empty());
        assert_eq!(options.fields, "name,field_of_study");
        assert_eq!(options.page, 1);
        assert_eq!(options.limit, config.default_page_size);
        assert_eq!(options.sort, config.default_sort);
        assert_eq!(options.skip(), 0);
    }

    #[test]
    fn garbage_and_non_positive_numbers_never_reach_zero() {
        let config = SearchConfig::default();
        for (page, limit) in [("0", "0"), ("-4", "-1"), ("abc", "NaN"), ("", " ")] {
            let options =
                normalize_search_options(&raw(Some(page), Some(limit), None), DEFAULT_FIELDS, &config);
            assert_eq!(options.page, 1, "page input `{page}`");
            assert_eq!(options.limit, config.default_page_size, "limit input `{limit}`");
        }
    }

    #[test]
    fn limit_is_clamped_to_max_page_size() {
        let config = SearchConfig::default();
        let options =
            normalize_search_options(&raw(None, Some("5000"), None), DEFAULT_FIELDS, &config);
        assert_eq!(options.limit, config.max_page_size);
    }

    #[test]
    fn fractional_numbers_are_truncated() {
        assert_eq!(parse_count(Some("3.9")), Some(3));
        assert_eq!(parse_count(Some(" 12 ")), Some(12));
        assert_eq!(parse_count(Some("inf")), None);
    }

    #[test]
    fn non_object_filter_becomes_empty_matcher() {
        let config = SearchConfig::default();
        for text in ["[1, 2]", "\"name\"", "{not json", "   "] {
            let params = RawSearchParams {
                filter: Some(text.to_string()),
                ..RawSearchParams::default()
            };
            let options = normalize_search_options(&params, DEFAULT_FIELDS, &config);
            assert!(options.filter.is_empty(), "filter input `{text}`");
        }
    }

    #[test]
    fn explicit_empty_fields_means_all_fields() {
        let params = RawSearchParams {
            fields: Some(" , ".to_string()),
            ..RawSearchParams::default()
        };
        let options = normalize_search_options(&params, DEFAULT_FIELDS, &SearchConfig::default());
        assert_eq!(options.fields, "");
        assert!(options.projection().is_all());
    }

    #[test]
    fn bare_dash_sort_falls_back_to_default() {
        let config = SearchConfig::default();
        let options = normalize_search_options(&raw(None, None, Some(" - ")), DEFAULT_FIELDS, &config);
        assert_eq!(options.sort, config.default_sort);

        let options =
            normalize_search_options(&raw(None, None, Some(" -name ")), DEFAULT_FIELDS, &config);
        assert_eq!(options.sort, "-name");
    }

    #[test]
    fn skip_is_limit_times_previous_pages() {
        let config = SearchConfig::default();
        let options =
            normalize_search_options(&raw(Some("3"), Some("25"), None), DEFAULT_FIELDS, &config);
        assert_eq!(options.skip(), 50);
    }
}
