//! Incident records

use crate::core::entity::{Record, validation_error};
use crate::core::error::{ClientError, ClientResult};
use crate::core::field::FieldValue;
use crate::core::query::{Criteria, RecordFilter};
use crate::entities::patient::Patient;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A mass-casualty incident
///
/// An incident owns the patients triaged at it; the list is only populated
/// when the backend chooses to embed it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: Option<i64>,

    #[validate(required, length(min = 3, max = 255))]
    pub name: Option<String>,

    #[validate(required)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub patients: Option<Vec<Patient>>,
}

impl Incident {
    pub fn new(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: Some(name.into()),
            start_date: Some(start_date),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl Record for Incident {
    type Filter = IncidentFilter;

    fn resource_name() -> &'static str {
        "incidents"
    }

    fn resource_name_singular() -> &'static str {
        "incident"
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => self.id.map(FieldValue::from),
            "name" => self.name.clone().map(FieldValue::from),
            "startDate" => self.start_date.map(FieldValue::from),
            _ => None,
        }
    }

    fn validate_record(&self) -> Result<(), ClientError> {
        self.validate().map_err(validation_error::<Self>)?;

        match self.start_date {
            Some(start_date) if start_date > Utc::now().date_naive() => {
                Err(ClientError::Validation {
                    resource: Self::resource_name_singular().to_string(),
                    message: format!("startDate {} is in the future", start_date),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Filter form of the incident list view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    /// `id.equals`
    pub id: Option<i64>,
    /// `name.contains`
    pub name: Option<String>,
    /// `startDate.equals`
    pub start_date: Option<NaiveDate>,
}

impl IncidentFilter {
    /// Build a filter from raw form inputs; blank inputs mean "no predicate"
    pub fn from_inputs(id: &str, name: &str, start_date: &str) -> ClientResult<Self> {
        let id = match id.trim() {
            "" => None,
            raw => Some(raw.parse::<i64>().map_err(|_| invalid_input("id", raw))?),
        };
        let start_date = match start_date.trim() {
            "" => None,
            raw => Some(
                raw.parse::<NaiveDate>()
                    .map_err(|_| invalid_input("startDate", raw))?,
            ),
        };
        let name = Some(name.to_string()).filter(|n| !n.trim().is_empty());

        Ok(Self {
            id,
            name,
            start_date,
        })
    }
}

fn invalid_input(field: &str, raw: &str) -> ClientError {
    ClientError::Validation {
        resource: "incident filter".to_string(),
        message: format!("{} filter '{}' is not valid", field, raw),
    }
}

impl RecordFilter for IncidentFilter {
    fn criteria(&self) -> Criteria {
        Criteria::new()
            .equals("id", self.id)
            .contains("name", self.name.as_deref())
            .equals("startDate", self.start_date)
    }
}
