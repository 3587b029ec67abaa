//! Topic record schemas.
//!
//! Tuple topics carry an ordered list of typed fields; blob topics carry none.
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Bigint,
    String,
    Double,
    Boolean,
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    Tuple,
    Blob,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecordSchema {
    pub fields: Vec<Field>,
}

impl RecordSchema {
    /// Build a schema from parallel name and type lists.
    ///
    /// ```
    /// use datahub_common::{FieldType, RecordSchema};
    ///
    /// let schema = RecordSchema::from_lists(
    ///     &["id", "name"],
    ///     &[FieldType::Bigint, FieldType::String],
    /// )
    /// .expect("schema");
    /// assert_eq!(schema.field_names(), vec!["id", "name"]);
    /// ```
    pub fn from_lists<S: AsRef<str>>(names: &[S], types: &[FieldType]) -> Result<Self> {
        if names.len() != types.len() {
            return Err(Error::InvalidSchema(format!(
                "{} field names but {} field types",
                names.len(),
                types.len()
            )));
        }
        let schema = Self {
            fields: names
                .iter()
                .zip(types)
                .map(|(name, field_type)| Field::new(name.as_ref(), *field_type))
                .collect(),
        };
        schema.validate()?;
        Ok(schema)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }

    /// Reject empty schemas, blank field names and duplicates.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::InvalidSchema("schema has no fields".to_string()));
        }
        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::InvalidSchema("field name is empty".to_string()));
            }
            if !seen.insert(field.name.to_ascii_lowercase()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
        }
        Ok(())
    }
}
