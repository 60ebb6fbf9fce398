//! Record trait defining the abstraction every synchronized entity type implements

use crate::core::error::ClientError;
use crate::core::field::FieldValue;
use crate::core::query::RecordFilter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Base trait for every record type exchanged with the backend.
///
/// A record is a plain JSON-shaped struct whose fields are all optional: the
/// default value is the "empty record" a store focuses when nothing is
/// selected. The associated [`RecordFilter`] describes the criteria the
/// filtered list view accepts for this type.
pub trait Record:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Criteria accepted by the filtered list query
    type Filter: RecordFilter;

    /// The plural resource name used in URLs (e.g., "incidents")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "incident")
    fn resource_name_singular() -> &'static str;

    /// Server-assigned identifier, absent before creation
    fn id(&self) -> Option<i64>;

    /// Assign the identifier (used by the reference backend on create)
    fn set_id(&mut self, id: i64);

    /// Get the value of a specific field by its wire name
    ///
    /// Returns `None` when the field is unknown or unset.
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Check the constraints a full create or update must satisfy
    fn validate_record(&self) -> Result<(), ClientError> {
        Ok(())
    }

    /// Whether this is the empty/default record
    fn is_empty_record(&self) -> bool {
        *self == Self::default()
    }
}

/// Flatten `validator` output into a single client error
pub(crate) fn validation_error<R: Record>(errors: validator::ValidationErrors) -> ClientError {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let codes: Vec<&str> = errs.iter().map(|e| &*e.code).collect();
            format!("{} ({})", field, codes.join(", "))
        })
        .collect();
    fields.sort();

    ClientError::Validation {
        resource: R::resource_name_singular().to_string(),
        message: format!("invalid fields: {}", fields.join("; ")),
    }
}
