//! Typed views over the schema-less documents of each admin collection.
//!
//! Each submodule contains:
//! - A `Serialize + Deserialize + Validate` body struct for the collection
//! - Its [`Entity`] impl: the collection schema, cross-field checks and the
//!   storage objects the record owns
//!
//! Bodies use `#[serde(default)]` so a missing required field surfaces as a
//! validation message instead of a deserialization error.

use atelier_core::document::{Document, Fields};
use atelier_core::error::CoreError;
use atelier_core::schema::EntitySchema;
use atelier_core::types::{DocId, Timestamp};
use atelier_core::validation;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::store::StoreError;

pub mod admin;
pub mod certificate;
pub mod chat;
pub mod company;
pub mod course_video;
pub mod faq;
pub mod feature;
pub mod journey;
pub mod login_request;
pub mod pricing_plan;
pub mod quiz;
pub mod registration;
pub mod scholarship;
pub mod student_project;
pub mod trainer;
pub mod workshop;

/// A collection managed by a generic CRUD screen.
pub trait Entity: Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static {
    const SCHEMA: EntitySchema;

    /// Whether managing this collection requires the `super_admin` role.
    const SUPER_ADMIN_ONLY: bool = false;

    /// Cross-field rules the derive attributes cannot express.
    fn check(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Object storage paths owned by this record, removed with it.
    fn object_paths(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Run every validation layer for `entity`: derive attributes, the
/// entity's own checks, then the status vocabulary of its schema.
pub fn validate_entity<E: Entity>(entity: &E) -> Result<(), CoreError> {
    validation::validate(entity)?;
    entity.check()?;

    if let Some(spec) = E::SCHEMA.status {
        let fields = to_fields(entity).map_err(|e| CoreError::Internal(e.to_string()))?;
        let status = fields.get(spec.field).and_then(Value::as_str).unwrap_or("");
        if !E::SCHEMA.is_valid_status(status) {
            return Err(CoreError::Validation(format!(
                "{}: must be one of {:?}",
                spec.field, spec.values
            )));
        }
    }
    Ok(())
}

/// Deserialize submitted form fields into an entity body.
///
/// Type mismatches (text in a numeric field, etc.) are validation failures.
pub fn parse_entity<E: Entity>(fields: Fields) -> Result<E, CoreError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| CoreError::Validation(format!("Invalid field value: {e}")))
}

/// Serialize an entity body into document fields.
pub fn to_fields<T: Serialize>(body: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(body)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::Serialization(<serde_json::Error as serde::ser::Error>::custom(
            "document bodies must serialize to a JSON object",
        ))),
    }
}

/// A stored document decoded into its typed body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: DocId,
    #[serde(flatten)]
    pub data: T,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl<T: DeserializeOwned> Record<T> {
    /// Decode `doc` under `collection` (used only for the error message).
    pub fn from_document(collection: &str, doc: Document) -> Result<Self, StoreError> {
        let data = serde_json::from_value(Value::Object(doc.fields)).map_err(|e| {
            StoreError::Malformed {
                collection: collection.to_string(),
                id: doc.id.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            id: doc.id,
            data,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}
