//! # IPMS
//!
//! Client-side entity state synchronization for an incident and patient
//! management backend.
//!
//! ## Features
//!
//! - **Entity stores**: one list/detail cache per record type with
//!   `loading`/`updating` flags and a single serialized writer
//! - **Typed REST client**: paging, sorting, `field.equals`/`field.contains`
//!   predicates, cache busting and `x-total-count` handling
//! - **Stale list fence**: list responses that arrive out of order never
//!   overwrite a newer list
//! - **Lifecycle events**: every request is published on a broadcast bus
//! - **Reference backend**: an axum server speaking the same contract, used
//!   for local development and end-to-end tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ipms::prelude::*;
//!
//! let client = IpmsClient::connect(ClientConfig::from_yaml_file("ipms.yaml")?)?;
//!
//! client.incidents().fetch_list(QueryParams::page(0, 20)).await?;
//! let filter = IncidentFilter::from_inputs("", "Smith", "")?;
//! client.incidents().fetch_filtered(QueryParams::default(), &filter).await?;
//!
//! let state = client.incidents().snapshot();
//! println!("{} of {} incidents", state.entities.len(), state.total_items);
//! ```

pub mod app;
pub mod client;
pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod store;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::Record,
        error::{ClientError, ClientResult},
        events::{EventBus, EventEnvelope, Outcome, RequestKind, StoreEvent},
        field::FieldValue,
        query::{Criteria, QueryParams, RecordFilter, Sort, SortDirection},
    };

    // === Client ===
    pub use crate::app::IpmsClient;
    pub use crate::client::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

    // === Stores ===
    pub use crate::store::{EntityState, EntityStore};

    // === Entities ===
    pub use crate::entities::{Category, Incident, IncidentFilter, Patient, PatientFilter};

    // === Config ===
    pub use crate::config::{ClientConfig, RefreshPolicy, StoreConfig};

    // === Server ===
    pub use crate::server::Backend;

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::NaiveDate;
    pub use serde::{Deserialize, Serialize};
}
