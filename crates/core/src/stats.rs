//! Per-collection aggregate counters.
//!
//! Stats are recomputed on every request by walking the full in-memory
//! result set. There is no server-side aggregation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::document::Document;
use crate::schema::EntitySchema;

/// Aggregate counters for one collection view.
///
/// Serializes flat: `{"total": 3, "issued": 1, "pending": 1, "revoked": 1}`,
/// plus `"revenue"` for schemas that declare one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    #[serde(flatten)]
    pub by_status: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
}

impl Stats {
    /// Count for one status value (0 when absent).
    pub fn count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }
}

/// Compute stats for `docs` according to `schema`.
///
/// Every declared status value appears in the output, zero when unused.
/// Documents with a missing or undeclared status only count towards `total`,
/// so the flattened keys never collide with `total` or `revenue`.
pub fn compute(docs: &[Document], schema: &EntitySchema) -> Stats {
    let mut by_status = BTreeMap::new();

    if let Some(spec) = schema.status {
        for value in spec.values {
            by_status.insert((*value).to_string(), 0);
        }
        for doc in docs {
            if let Some(count) = doc
                .str_field(spec.field)
                .and_then(|status| by_status.get_mut(status))
            {
                *count += 1;
            }
        }
    }

    let revenue = schema.revenue.map(|spec| {
        let status_field = schema.status.map(|s| s.field).unwrap_or("status");
        docs.iter()
            .filter(|doc| {
                doc.str_field(status_field)
                    .is_some_and(|status| spec.statuses.contains(&status))
            })
            .filter_map(|doc| doc.number_field(spec.amount_field))
            .sum::<f64>()
    });

    Stats {
        total: docs.len(),
        by_status,
        revenue,
    }
}
