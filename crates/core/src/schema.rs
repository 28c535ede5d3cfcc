//! Static descriptions of each admin collection.
//!
//! A schema tells the generic list machinery which fields free-text search
//! looks at, which fields can be used as dropdown filters, how statuses are
//! aggregated and which columns an export carries.

/// A status field and the values it may take.
#[derive(Debug, Clone, Copy)]
pub struct StatusSpec {
    pub field: &'static str,
    pub values: &'static [&'static str],
}

/// Revenue aggregation: sum `amount_field` over documents whose status is in
/// `statuses`.
#[derive(Debug, Clone, Copy)]
pub struct RevenueSpec {
    pub amount_field: &'static str,
    pub statuses: &'static [&'static str],
}

/// One export column: a header label and the document field it reads.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub header: &'static str,
    pub field: &'static str,
}

impl Column {
    pub const fn new(header: &'static str, field: &'static str) -> Self {
        Self { header, field }
    }
}

/// Everything the generic list, stats and export code needs to know about a
/// collection.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    /// Collection name in the document store.
    pub collection: &'static str,
    /// Human-readable singular label used in error messages.
    pub label: &'static str,
    /// Fields scanned by the `search` term.
    pub search_fields: &'static [&'static str],
    /// Fields accepted as equality dropdown filters.
    pub filter_fields: &'static [&'static str],
    pub status: Option<StatusSpec>,
    pub revenue: Option<RevenueSpec>,
    pub export_columns: &'static [Column],
}

impl EntitySchema {
    /// Whether `field` may be used as a dropdown filter.
    pub fn is_filterable(&self, field: &str) -> bool {
        self.filter_fields.contains(&field)
    }

    /// Whether `status` is a declared value of this schema's status field.
    /// Schemas without a status field accept nothing.
    pub fn is_valid_status(&self, status: &str) -> bool {
        self.status
            .map(|spec| spec.values.contains(&status))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAQS: EntitySchema = EntitySchema {
        collection: "faqs",
        label: "FAQ",
        search_fields: &["question"],
        filter_fields: &["status"],
        status: Some(StatusSpec {
            field: "status",
            values: &["draft", "published"],
        }),
        revenue: None,
        export_columns: &[],
    };

    #[test]
    fn only_declared_statuses_are_valid() {
        assert!(FAQS.is_valid_status("draft"));
        assert!(!FAQS.is_valid_status("archived"));
        assert!(!FAQS.is_valid_status(""));
    }

    #[test]
    fn schemas_without_a_status_field_accept_nothing() {
        let schema = EntitySchema { status: None, ..FAQS };
        assert!(!schema.is_valid_status("draft"));
        assert!(schema.is_filterable("status"));
        assert!(!schema.is_filterable("question"));
    }
}
