//! Core module containing the record abstraction and request building blocks

pub mod clean;
pub mod entity;
pub mod error;
pub mod events;
pub mod field;
pub mod query;

pub use clean::{clean_record, clean_value};
pub use entity::Record;
pub use error::{ClientError, ClientResult, Problem};
pub use events::{EventBus, EventEnvelope, Outcome, RequestKind, StoreEvent};
pub use field::FieldValue;
pub use query::{Criteria, Predicate, PredicateOp, QueryParams, RecordFilter, Sort, SortDirection};
