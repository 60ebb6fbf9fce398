//! Incident and patient record types with their list filters

pub mod incident;
pub mod patient;

pub use incident::{Incident, IncidentFilter};
pub use patient::{Category, IncidentRef, Patient, PatientFilter};
