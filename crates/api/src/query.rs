//! Shared query parameter types for API handlers.

use std::collections::HashMap;

use atelier_core::filter::ListFilter;
use atelier_core::schema::EntitySchema;
use serde::Deserialize;

/// Parameters of list, stats and export endpoints.
///
/// `search` and `format` are reserved; every other parameter is a candidate
/// dropdown filter (`?status=issued`), kept only if the schema declares the
/// field filterable.
#[derive(Debug, Default)]
pub struct ListParams {
    pub search: Option<String>,
    pub format: Option<String>,
    pub filters: HashMap<String, String>,
}

impl From<HashMap<String, String>> for ListParams {
    fn from(mut params: HashMap<String, String>) -> Self {
        Self {
            search: params.remove("search"),
            format: params.remove("format"),
            filters: params,
        }
    }
}

impl ListParams {
    /// The in-memory filter these parameters describe for `schema`.
    pub fn to_filter(&self, schema: &EntitySchema) -> ListFilter {
        ListFilter::from_params(
            schema,
            self.search.as_deref(),
            self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }
}

/// `?path=` of object deletion.
#[derive(Debug, Deserialize)]
pub struct ObjectPathParams {
    pub path: String,
}

/// `?token=` of WebSocket upgrades (browsers cannot set headers there).
#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_parameters_are_split_out() {
        let raw: HashMap<String, String> = [
            ("search", "ada"),
            ("format", "json"),
            ("status", "issued"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let params = ListParams::from(raw);
        assert_eq!(params.search.as_deref(), Some("ada"));
        assert_eq!(params.format.as_deref(), Some("json"));
        assert_eq!(params.filters.len(), 1);
        assert_eq!(params.filters["status"], "issued");
    }
}
