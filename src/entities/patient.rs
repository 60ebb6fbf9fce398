//! Patient records and triage categories

use crate::core::entity::{Record, validation_error};
use crate::core::error::ClientError;
use crate::core::field::FieldValue;
use crate::core::query::{Criteria, RecordFilter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Triage category assigned to a patient
///
/// The backend exchanges the upper-case enum names; the capitalized labels
/// are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "BLACK", alias = "Black")]
    Black,
    #[serde(rename = "RED", alias = "Red")]
    Red,
    #[serde(rename = "YELLOW", alias = "Yellow")]
    Yellow,
    #[serde(rename = "GREEN", alias = "Green")]
    Green,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Black,
        Category::Red,
        Category::Yellow,
        Category::Green,
    ];

    /// Name used on the wire and in `triageCategory.equals`
    pub fn wire_name(&self) -> &'static str {
        match self {
            Category::Black => "BLACK",
            Category::Red => "RED",
            Category::Yellow => "YELLOW",
            Category::Green => "GREEN",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Black => "Black",
            Category::Red => "Red",
            Category::Yellow => "Yellow",
            Category::Green => "Green",
        }
    }

    /// Categories whose name contains `filter`, ignoring case
    pub fn matching(filter: &str) -> Vec<Category> {
        let needle = filter.to_uppercase();
        Self::ALL
            .into_iter()
            .filter(|c| c.wire_name().contains(&needle))
            .collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.wire_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::Validation {
                resource: "patient".to_string(),
                message: format!("unknown triage category '{}'", s),
            })
    }
}

/// Reference from a patient to the incident it belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentRef {
    pub id: Option<i64>,
    pub name: Option<String>,
}

/// A patient triaged at an incident
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Option<i64>,

    #[validate(required, length(min = 2, max = 50))]
    pub first_name: Option<String>,

    #[validate(required, length(min = 2, max = 50))]
    pub last_name: Option<String>,

    pub triage_category: Option<Category>,

    pub incident: Option<IncidentRef>,
}

impl Patient {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.triage_category = Some(category);
        self
    }

    pub fn at_incident(mut self, id: i64, name: impl Into<String>) -> Self {
        self.incident = Some(IncidentRef {
            id: Some(id),
            name: Some(name.into()),
        });
        self
    }
}

impl Record for Patient {
    type Filter = PatientFilter;

    fn resource_name() -> &'static str {
        "patients"
    }

    fn resource_name_singular() -> &'static str {
        "patient"
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
            "firstName" => self.first_name.clone().map(FieldValue::from),
            "lastName" => self.last_name.clone().map(FieldValue::from),
            "triageCategory" => self.triage_category.map(|c| c.wire_name().into()),
            "incidentId" => self.incident.as_ref()?.id.map(FieldValue::from),
            "incidentName" => self.incident.as_ref()?.name.clone().map(FieldValue::from),
            _ => None,
        }
    }

    fn validate_record(&self) -> Result<(), ClientError> {
        self.validate().map_err(validation_error::<Self>)
    }
}

/// Filter form of the patient list view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientFilter {
    /// `id.equals`
    pub id: Option<i64>,
    /// `firstName.contains`
    pub first_name: Option<String>,
    /// `lastName.contains`
    pub last_name: Option<String>,
    /// `triageCategory.equals`
    pub triage_category: Option<Category>,
    /// `incidentId.equals`
    pub incident_id: Option<i64>,
    /// `incidentName.contains`
    pub incident_name: Option<String>,
}

impl PatientFilter {
    /// Build a filter from the raw inputs of the patient list view
    ///
    /// Blank inputs add no predicate. The category input accepts any
    /// fragment naming exactly one category (`"yel"` is yellow); the
    /// incident input matches incident names.
    pub fn from_inputs(
        id: &str,
        first_name: &str,
        last_name: &str,
        triage_category: &str,
        incident: &str,
    ) -> Result<Self, ClientError> {
        let id = match id.trim() {
            "" => None,
            raw => Some(raw.parse::<i64>().map_err(|_| invalid_input("id", raw))?),
        };
        let triage_category = match triage_category.trim() {
            "" => None,
            raw => Some(category_input(raw)?),
        };

        Ok(Self {
            id,
            first_name: non_blank(first_name),
            last_name: non_blank(last_name),
            triage_category,
            incident_id: None,
            incident_name: non_blank(incident),
        })
    }
}

fn category_input(raw: &str) -> Result<Category, ClientError> {
    if let Ok(category) = raw.parse::<Category>() {
        return Ok(category);
    }
    match Category::matching(raw).as_slice() {
        [only] => Ok(*only),
        _ => Err(invalid_input("triageCategory", raw)),
    }
}

fn non_blank(input: &str) -> Option<String> {
    Some(input.to_string()).filter(|s| !s.trim().is_empty())
}

fn invalid_input(field: &str, raw: &str) -> ClientError {
    ClientError::Validation {
        resource: "patient filter".to_string(),
        message: format!("{} filter '{}' is not valid", field, raw),
    }
}

impl RecordFilter for PatientFilter {
    fn criteria(&self) -> Criteria {
        Criteria::new()
            .equals("id", self.id)
            .contains("firstName", self.first_name.as_deref())
            .contains("lastName", self.last_name.as_deref())
            .equals("triageCategory", self.triage_category.map(|c| c.wire_name()))
            .equals("incidentId", self.incident_id)
            .contains("incidentName", self.incident_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_wire_names() {
        assert_eq!(serde_json::to_value(Category::Red).unwrap(), json!("RED"));
        let parsed: Category = serde_json::from_value(json!("Yellow")).unwrap();
        assert_eq!(parsed, Category::Yellow);
        let parsed: Category = serde_json::from_value(json!("GREEN")).unwrap();
        assert_eq!(parsed, Category::Green);
        assert_eq!(Category::Black.to_string(), "Black");
    }

    #[test]
    fn test_category_from_str_and_matching() {
        assert_eq!("black".parse::<Category>().unwrap(), Category::Black);
        assert!("purple".parse::<Category>().is_err());
        assert_eq!(Category::matching("re"), vec![Category::Red, Category::Green]);
        assert_eq!(Category::matching(""), Category::ALL.to_vec());
    }

    #[test]
    fn test_patient_wire_shape() {
        let patient: Patient = serde_json::from_value(json!({
            "id": 1,
            "firstName": "Ada",
            "lastName": "Smith",
            "triageCategory": "RED",
            "incident": {"id": 7, "name": "Flood"},
        }))
        .unwrap();

        assert_eq!(
            patient,
            Patient::new("Ada", "Smith")
                .with_id(1)
                .with_category(Category::Red)
                .at_incident(7, "Flood")
        );
        assert_eq!(patient.field_value("incidentId"), Some(FieldValue::Integer(7)));
        assert_eq!(patient.field_value("triageCategory"), Some(FieldValue::from("RED")));
    }

    #[test]
    fn test_patient_validation() {
        assert!(Patient::new("Ada", "Smith").validate_record().is_ok());
        assert!(Patient::new("A", "Smith").validate_record().is_err());
        assert!(Patient::new("Ada", "S".repeat(51)).validate_record().is_err());
        let nameless = Patient {
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        assert!(nameless.validate_record().is_err());
    }

    #[test]
    fn test_patient_filter_criteria() {
        let filter = PatientFilter {
            last_name: Some("Smith".to_string()),
            first_name: Some(String::new()),
            triage_category: Some(Category::Black),
            incident_id: Some(7),
            ..Default::default()
        };
        assert_eq!(
            filter.criteria().to_pairs(),
            vec![
                ("lastName.contains".to_string(), "Smith".to_string()),
                ("triageCategory.equals".to_string(), "BLACK".to_string()),
                ("incidentId.equals".to_string(), "7".to_string()),
            ]
        );
        assert!(PatientFilter::default().criteria().is_empty());
    }

    #[test]
    fn test_filter_from_blank_inputs_has_no_predicates() {
        let filter = PatientFilter::from_inputs("", "  ", "", "", "").unwrap();
        assert_eq!(filter, PatientFilter::default());
        assert!(filter.criteria().is_empty());
    }

    #[test]
    fn test_filter_from_inputs() {
        let filter = PatientFilter::from_inputs(" 3 ", "Ada", "", "yel", "flood")
            .unwrap();
        assert_eq!(
            filter.criteria().to_pairs(),
            vec![
                ("id.equals".to_string(), "3".to_string()),
                ("firstName.contains".to_string(), "Ada".to_string()),
                ("triageCategory.equals".to_string(), "YELLOW".to_string()),
                ("incidentName.contains".to_string(), "flood".to_string()),
            ]
        );

        let exact = PatientFilter::from_inputs("", "", "", "Red", "").unwrap();
        assert_eq!(exact.triage_category, Some(Category::Red));
    }

    #[test]
    fn test_filter_rejects_bad_inputs() {
        let err = PatientFilter::from_inputs("x1", "", "", "", "").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(PatientFilter::from_inputs("", "", "", "purple", "").is_err());
        // "re" names both red and green
        assert!(PatientFilter::from_inputs("", "", "", "re", "").is_err());
    }
}
