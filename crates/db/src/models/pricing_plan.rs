//! Pricing plans.

use atelier_core::schema::{Column, EntitySchema, StatusSpec};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Entity;

pub const PRICING_PLAN_STATUSES: &[&str] = &["active", "inactive"];

fn default_status() -> String {
    "active".into()
}

fn default_currency() -> String {
    "INR".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PricingPlan {
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    pub price: f64,
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "must be a 3-letter currency code"))]
    pub currency: String,
    /// Billing period label, e.g. `month` or `one-time`.
    pub period: Option<String>,
    pub features: Vec<String>,
    pub highlighted: bool,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Entity for PricingPlan {
    const SCHEMA: EntitySchema = EntitySchema {
        collection: "pricing_plans",
        label: "Pricing plan",
        search_fields: &["name", "features"],
        filter_fields: &["status", "period"],
        status: Some(StatusSpec {
            field: "status",
            values: PRICING_PLAN_STATUSES,
        }),
        revenue: None,
        export_columns: &[
            Column::new("Name", "name"),
            Column::new("Price", "price"),
            Column::new("Currency", "currency"),
            Column::new("Period", "period"),
            Column::new("Features", "features"),
            Column::new("Status", "status"),
        ],
    };
}
