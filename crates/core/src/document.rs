//! Schema-less documents and the query vocabulary the document store speaks.
//!
//! A [`Document`] is a generated id, a free-form JSON object and two
//! convention timestamps. Queries support equality and range filters plus a
//! single ordering field, nothing more.

use std::cmp::Ordering;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{DocId, Timestamp};

/// Free-form document body.
pub type Fields = Map<String, Value>;

/// Pseudo-field naming the document id.
pub const FIELD_ID: &str = "id";
/// Pseudo-field naming the creation timestamp.
pub const FIELD_CREATED_AT: &str = "created_at";
/// Pseudo-field naming the last-update timestamp.
pub const FIELD_UPDATED_AT: &str = "updated_at";

/// Whether `field` is one of the metadata pseudo-fields rather than a body field.
pub fn is_meta_field(field: &str) -> bool {
    matches!(field, FIELD_ID | FIELD_CREATED_AT | FIELD_UPDATED_AT)
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub fields: Fields,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    /// Build a freshly created document; both timestamps are `now`.
    pub fn new(id: impl Into<DocId>, fields: Fields, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge `fields` into the body (last write wins per key) and bump
    /// `updated_at`. Metadata pseudo-fields in the input are ignored.
    pub fn merge(&mut self, fields: Fields, now: Timestamp) {
        for (key, value) in fields {
            if !is_meta_field(&key) {
                self.fields.insert(key, value);
            }
        }
        self.updated_at = now;
    }

    /// Look up a field value, resolving metadata pseudo-fields.
    pub fn value(&self, field: &str) -> Option<Value> {
        match field {
            FIELD_ID => Some(Value::String(self.id.clone())),
            FIELD_CREATED_AT => Some(Value::String(format_timestamp(&self.created_at))),
            FIELD_UPDATED_AT => Some(Value::String(format_timestamp(&self.updated_at))),
            _ => self.fields.get(field).cloned(),
        }
    }

    /// Borrow a string body field.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Read a numeric body field as `f64`. Numeric strings are accepted since
    /// older form submissions stored amounts as text.
    pub fn number_field(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Render a field as display text (used by search and CSV export).
    ///
    /// Missing and null values render as the empty string; arrays are joined
    /// with `"; "`; objects render as compact JSON.
    pub fn text(&self, field: &str) -> String {
        self.value(field).map(|v| value_text(&v)).unwrap_or_default()
    }

    /// Order two documents by `field`, resolving timestamps natively.
    /// Documents missing the field sort first.
    pub fn cmp_by(&self, other: &Document, field: &str) -> Ordering {
        match field {
            FIELD_CREATED_AT => self.created_at.cmp(&other.created_at),
            FIELD_UPDATED_AT => self.updated_at.cmp(&other.updated_at),
            FIELD_ID => self.id.cmp(&other.id),
            _ => match (self.fields.get(field), other.fields.get(field)) {
                (Some(a), Some(b)) => compare_values(a, b),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

/// RFC 3339 with fixed microsecond precision, so the text form sorts the same
/// way the timestamps do.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Display text for a JSON value.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(_) => value.to_string(),
    }
}

/// Total order over JSON values: null < bool < number < string < array < object.
/// Numbers compare numerically regardless of integer/float representation.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Comparison operator of a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl FilterOp {
    /// SQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

/// A single field predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Equality filter shorthand.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Evaluate the predicate against a document.
    ///
    /// Range operators only match values of the same JSON type as the
    /// operand; a missing field never matches.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.value(&self.field) else {
            return false;
        };
        let same_kind = matches!(
            (&actual, &self.value),
            (Value::Number(_), Value::Number(_))
                | (Value::String(_), Value::String(_))
                | (Value::Bool(_), Value::Bool(_))
        );
        let ord = compare_values(&actual, &self.value);
        match self.op {
            FilterOp::Eq => {
                if same_kind {
                    ord == Ordering::Equal
                } else {
                    actual == self.value
                }
            }
            FilterOp::Lt => same_kind && ord == Ordering::Less,
            FilterOp::Lte => same_kind && ord != Ordering::Greater,
            FilterOp::Gt => same_kind && ord == Ordering::Greater,
            FilterOp::Gte => same_kind && ord != Ordering::Less,
        }
    }
}

/// Sort direction of an [`OrderBy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Desc,
        }
    }
}

/// A collection query: conjunctive filters, optional ordering, optional limit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether every filter matches `doc`.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Apply the query to an in-memory set of documents: filter, sort,
    /// truncate. Ties on the ordering field fall back to the id.
    /// Store adapters without native query support use this.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut out: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(order) = &self.order_by {
            out.sort_by(|a, b| {
                let ord = a.cmp_by(b, &order.field).then_with(|| a.id.cmp(&b.id));
                match order.direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;

    fn doc(id: &str, body: Value, offset_secs: i64) -> Document {
        let Value::Object(fields) = body else {
            panic!("test body must be an object");
        };
        Document::new(id, fields, Utc::now() + Duration::seconds(offset_secs))
    }

    #[test]
    fn merge_keeps_unknown_fields_and_bumps_updated_at() {
        let mut d = doc("a", json!({"title": "Rust 101", "legacy": true}), 0);
        let later = d.created_at + Duration::seconds(5);
        let Value::Object(patch) = json!({"title": "Rust 102", "id": "hijack"}) else {
            unreachable!()
        };
        d.merge(patch, later);

        assert_eq!(d.id, "a");
        assert_eq!(d.str_field("title"), Some("Rust 102"));
        assert_eq!(d.fields["legacy"], json!(true));
        assert_eq!(d.updated_at, later);
        assert!(d.updated_at > d.created_at);
    }

    #[test]
    fn text_renders_each_json_kind() {
        let d = doc(
            "a",
            json!({"s": "x", "n": 12.5, "b": false, "tags": ["a", "b"], "none": null}),
            0,
        );
        assert_eq!(d.text("s"), "x");
        assert_eq!(d.text("n"), "12.5");
        assert_eq!(d.text("b"), "false");
        assert_eq!(d.text("tags"), "a; b");
        assert_eq!(d.text("none"), "");
        assert_eq!(d.text("missing"), "");
        assert_eq!(d.text("id"), "a");
    }

    #[test]
    fn numeric_equality_ignores_representation() {
        let d = doc("a", json!({"price": 10}), 0);
        assert!(Filter::eq("price", 10.0).matches(&d));
        assert!(!Filter::eq("price", "10").matches(&d));
    }

    #[test]
    fn range_filters_require_same_kind() {
        let d = doc("a", json!({"price": 25, "name": "m"}), 0);
        assert!(Filter::new("price", FilterOp::Gte, 25).matches(&d));
        assert!(Filter::new("price", FilterOp::Lt, 30).matches(&d));
        assert!(!Filter::new("price", FilterOp::Gt, "1").matches(&d));
        assert!(Filter::new("name", FilterOp::Gt, "a").matches(&d));
        assert!(!Filter::new("missing", FilterOp::Lte, 1).matches(&d));
    }

    #[test]
    fn apply_filters_orders_and_limits() {
        let docs = vec![
            doc("a", json!({"status": "issued", "rank": 3}), 0),
            doc("b", json!({"status": "pending", "rank": 1}), 1),
            doc("c", json!({"status": "issued", "rank": 2}), 2),
        ];

        let out = ListQuery::new()
            .filter(Filter::eq("status", "issued"))
            .order_by(OrderBy::asc("rank"))
            .apply(docs.clone());
        let ids: Vec<_> = out.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        let newest = ListQuery::new()
            .order_by(OrderBy::desc(FIELD_CREATED_AT))
            .limit(1)
            .apply(docs);
        assert_eq!(newest[0].id, "c");
    }

    #[test]
    fn timestamp_text_sorts_like_timestamps() {
        let early = doc("a", json!({}), 0);
        let late = doc("b", json!({}), 90);
        assert!(early.text(FIELD_CREATED_AT) < late.text(FIELD_CREATED_AT));
    }
}
