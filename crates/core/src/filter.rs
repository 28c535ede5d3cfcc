//! In-memory list filtering (search box + dropdown filters).
//!
//! Lists are always fetched in full and narrowed here. [`apply`] is a pure
//! function of (documents, schema, filter): the same inputs always produce
//! the same subset in the same order.

use std::collections::BTreeMap;

use crate::document::Document;
use crate::schema::EntitySchema;

/// Dropdown value meaning "no filter".
pub const ALL: &str = "all";

/// The narrowing a list view applies to a full collection fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-insensitive substring matched against the schema's search fields.
    pub search: Option<String>,
    /// Exact-match dropdown filters keyed by field.
    pub equals: BTreeMap<String, String>,
}

impl ListFilter {
    /// Build a filter from raw request parameters.
    ///
    /// Blank search terms and `all`/blank dropdown values are dropped, as are
    /// parameters naming fields the schema does not declare filterable.
    pub fn from_params<'a>(
        schema: &EntitySchema,
        search: Option<&str>,
        params: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let equals = params
            .into_iter()
            .filter(|(field, _)| schema.is_filterable(field))
            .map(|(field, value)| (field, value.trim()))
            .filter(|(_, value)| !value.is_empty() && !value.eq_ignore_ascii_case(ALL))
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();

        Self { search, equals }
    }

    /// Whether this filter lets everything through.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.equals.is_empty()
    }

    /// Whether a single document passes the filter.
    pub fn matches(&self, schema: &EntitySchema, doc: &Document) -> bool {
        let dropdowns_match = self
            .equals
            .iter()
            .all(|(field, expected)| doc.text(field) == *expected);
        if !dropdowns_match {
            return false;
        }

        match &self.search {
            None => true,
            Some(term) => {
                let needle = term.to_lowercase();
                schema
                    .search_fields
                    .iter()
                    .any(|field| doc.text(field).to_lowercase().contains(&needle))
            }
        }
    }
}

/// Narrow `docs` to those matching `filter`, preserving input order.
pub fn apply(docs: &[Document], schema: &EntitySchema, filter: &ListFilter) -> Vec<Document> {
    docs.iter()
        .filter(|doc| filter.matches(schema, doc))
        .cloned()
        .collect()
}
