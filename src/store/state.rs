//! Entity store state and its reducer
//!
//! The state is plain data. [`EntityState::apply`] is the only way it
//! changes, and every store operation is expressed as a pair of actions: a
//! `*Pending` one when the request is issued and a fulfilled/rejected one
//! when it settles.
//!
//! `loading` and `updating` are derived from in-flight counters, one for
//! reads (list, filtered list, single) and one for writes (create, update,
//! partial update, delete). A mutation's follow-up list fetch can therefore
//! overlap the mutation without either request clearing the other's flag.
//! A reset keeps the counters, so requests issued before it stay counted.

use crate::client::resource::Page;
use crate::core::error::ClientError;
use serde::Serialize;

/// A transition of the entity store state machine
#[derive(Debug, Clone)]
pub enum Action<R> {
    /// A list, filtered list or single fetch was issued
    ReadPending,
    /// A create, update, partial update or delete was issued
    WritePending,
    /// A list response arrived; `ticket` orders it against other list requests
    ListFulfilled { ticket: u64, page: Page<R> },
    /// A single fetch returned a record
    RecordFulfilled(R),
    /// A create, update or partial update returned the stored record
    MutationFulfilled(R),
    /// A delete succeeded
    DeleteFulfilled,
    /// A read failed
    ReadRejected(ClientError),
    /// A write failed
    WriteRejected(ClientError),
    /// Return cached data and flags to their defaults
    Reset,
}

/// Result of applying an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// A list response older than the last applied one was dropped
    Discarded { applied_ticket: u64 },
}

/// Cached list/detail data and lifecycle flags for one record type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState<R> {
    /// Current page of the list view, in server order
    pub entities: Vec<R>,
    /// Focused record; the default record when nothing is focused
    pub entity: R,
    /// Total records across all pages, from the last applied list response
    pub total_items: u64,
    /// A read is in flight
    pub loading: bool,
    /// A write is in flight
    pub updating: bool,
    /// The most recent mutation succeeded and no request was issued since
    pub update_success: bool,
    /// Last captured failure
    #[serde(rename = "errorMessage", serialize_with = "error_as_message")]
    pub error: Option<ClientError>,
    #[serde(skip)]
    reads_in_flight: u32,
    #[serde(skip)]
    writes_in_flight: u32,
    #[serde(skip)]
    applied_list_ticket: u64,
    #[serde(skip)]
    fence_stale_lists: bool,
}

fn error_as_message<S: serde::Serializer>(
    error: &Option<ClientError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl<R: Default> Default for EntityState<R> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<R: Default> EntityState<R> {
    /// Initial state; `fence_stale_lists` drops list responses that arrive
    /// after a newer list response was applied
    pub fn new(fence_stale_lists: bool) -> Self {
        Self {
            entities: Vec::new(),
            entity: R::default(),
            total_items: 0,
            loading: false,
            updating: false,
            update_success: false,
            error: None,
            reads_in_flight: 0,
            writes_in_flight: 0,
            applied_list_ticket: 0,
            fence_stale_lists,
        }
    }

    /// Apply one transition
    pub fn apply(&mut self, action: Action<R>) -> Applied {
        let mut outcome = Applied::Applied;

        match action {
            Action::ReadPending => {
                self.begin();
                self.reads_in_flight += 1;
            }
            Action::WritePending => {
                self.begin();
                self.writes_in_flight += 1;
            }
            Action::ListFulfilled { ticket, page } => {
                self.reads_in_flight = self.reads_in_flight.saturating_sub(1);
                if self.fence_stale_lists && ticket < self.applied_list_ticket {
                    outcome = Applied::Discarded {
                        applied_ticket: self.applied_list_ticket,
                    };
                } else {
                    self.applied_list_ticket = ticket;
                    self.entities = page.items;
                    self.total_items = page.total_items;
                }
            }
            Action::RecordFulfilled(record) => {
                self.reads_in_flight = self.reads_in_flight.saturating_sub(1);
                self.entity = record;
            }
            Action::MutationFulfilled(record) => {
                self.writes_in_flight = self.writes_in_flight.saturating_sub(1);
                self.entity = record;
                self.update_success = true;
            }
            Action::DeleteFulfilled => {
                self.writes_in_flight = self.writes_in_flight.saturating_sub(1);
                self.entity = R::default();
                self.update_success = true;
            }
            Action::ReadRejected(error) => {
                self.reads_in_flight = self.reads_in_flight.saturating_sub(1);
                self.fail(error);
            }
            Action::WriteRejected(error) => {
                self.writes_in_flight = self.writes_in_flight.saturating_sub(1);
                self.fail(error);
            }
            Action::Reset => {
                // Outstanding requests still settle into the reset state
                let mut reset = Self::new(self.fence_stale_lists);
                reset.reads_in_flight = self.reads_in_flight;
                reset.writes_in_flight = self.writes_in_flight;
                reset.applied_list_ticket = self.applied_list_ticket;
                *self = reset;
            }
        }

        self.loading = self.reads_in_flight > 0;
        self.updating = self.writes_in_flight > 0;
        outcome
    }

    fn begin(&mut self) {
        self.error = None;
        self.update_success = false;
    }

    fn fail(&mut self, error: ClientError) {
        self.error = Some(error);
        self.update_success = false;
    }
}

impl<R> EntityState<R> {
    /// Message of the last captured failure
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn reads_in_flight(&self) -> u32 {
        self.reads_in_flight
    }

    pub fn writes_in_flight(&self) -> u32 {
        self.writes_in_flight
    }

    /// No request of any kind is in flight
    pub fn is_idle(&self) -> bool {
        self.reads_in_flight == 0 && self.writes_in_flight == 0
    }

    /// Ticket of the last list response that was applied (0 before any)
    pub fn applied_list_ticket(&self) -> u64 {
        self.applied_list_ticket
    }
}
