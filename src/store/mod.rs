//! Entity store: the client-side cache of one record type
//!
//! An [`EntityStore`] owns the [`EntityState`] of one record type and is the
//! only writer of it. Presentation code reads snapshots (or subscribes to
//! changes) and drives the store through a fixed set of operations:
//!
//! | operation          | request                          | flag       |
//! |--------------------|----------------------------------|------------|
//! | `fetch_list`       | `GET /api/{res}?page&size&sort`  | `loading`  |
//! | `fetch_filtered`   | `GET /api/{res}?f.equals=..`     | `loading`  |
//! | `fetch_one`        | `GET /api/{res}/{id}`            | `loading`  |
//! | `create`           | `POST /api/{res}`                | `updating` |
//! | `update`           | `PUT /api/{res}/{id}`            | `updating` |
//! | `partial_update`   | `PATCH /api/{res}/{id}`          | `updating` |
//! | `delete`           | `DELETE /api/{res}/{id}`         | `updating` |
//!
//! Each operation applies a pending transition when the request is issued
//! and a fulfilled or rejected transition when it settles. Every successful
//! mutation is followed by an unfiltered list fetch, according to the
//! configured [`RefreshPolicy`].
//!
//! The state lives in a `tokio::sync::watch` channel: `send_modify` is the
//! single serialized writer, so concurrent operations on a cloned store
//! never interleave inside a transition.

pub mod state;

pub use state::{Action, Applied, EntityState};

use crate::client::resource::{Page, ResourceClient, require_id};
use crate::config::{RefreshPolicy, StoreConfig};
use crate::core::entity::Record;
use crate::core::error::{ClientError, ClientResult};
use crate::core::events::{EventBus, Outcome, RequestKind, StoreEvent};
use crate::core::query::QueryParams;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

struct StoreInner<R: Record> {
    client: ResourceClient<R>,
    state: watch::Sender<EntityState<R>>,
    next_ticket: AtomicU64,
    config: StoreConfig,
    events: EventBus,
}

/// Single-writer store for the list/detail state of record type `R`
///
/// Cloning is cheap and every clone drives the same state.
pub struct EntityStore<R: Record> {
    inner: Arc<StoreInner<R>>,
}

impl<R: Record> Clone for EntityStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Record> EntityStore<R> {
    pub fn new(client: ResourceClient<R>, config: StoreConfig, events: EventBus) -> Self {
        let state = watch::Sender::new(EntityState::new(config.fence_stale_lists));
        Self {
            inner: Arc::new(StoreInner {
                client,
                state,
                next_ticket: AtomicU64::new(0),
                config,
                events,
            }),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> EntityState<R> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every transition
    pub fn subscribe(&self) -> watch::Receiver<EntityState<R>> {
        self.inner.state.subscribe()
    }

    pub fn client(&self) -> &ResourceClient<R> {
        &self.inner.client
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    // === Reads ===

    /// Fetch a page without predicates and make it the cached list
    pub async fn fetch_list(&self, params: QueryParams) -> ClientResult<Vec<R>> {
        let ticket = self.issue(RequestKind::List);
        self.complete_list(ticket, params).await
    }

    /// Fetch a page matching `filter` and make it the cached list
    pub async fn fetch_filtered(
        &self,
        params: QueryParams,
        filter: &R::Filter,
    ) -> ClientResult<Vec<R>> {
        let ticket = self.issue(RequestKind::FilteredList);
        let result = self.inner.client.list_filtered(&params, filter).await;
        self.settle_list(RequestKind::FilteredList, ticket, result)
    }

    /// Fetch one record and focus it
    pub async fn fetch_one(&self, id: i64) -> ClientResult<R> {
        let ticket = self.issue(RequestKind::Single);
        match self.inner.client.get(id).await {
            Ok(record) => {
                self.dispatch(Action::RecordFulfilled(record.clone()));
                self.publish_settled(RequestKind::Single, ticket, Outcome::Success);
                Ok(record)
            }
            Err(error) => self.reject(RequestKind::Single, ticket, error),
        }
    }

    /// Count records matching `filter`; leaves the state untouched
    pub async fn count(&self, filter: &R::Filter) -> ClientResult<u64> {
        self.inner.client.count(filter).await
    }

    // === Mutations ===

    /// Create a record and focus the stored version
    pub async fn create(&self, record: R) -> ClientResult<R> {
        self.validate(&record)?;
        let ticket = self.issue(RequestKind::Create);
        let result = self.inner.client.create(&record).await;
        self.settle_mutation(RequestKind::Create, ticket, result)
            .await
    }

    /// Replace a record and focus the stored version
    pub async fn update(&self, record: R) -> ClientResult<R> {
        require_id(&record, "update")?;
        self.validate(&record)?;
        let ticket = self.issue(RequestKind::Update);
        let result = self.inner.client.update(&record).await;
        self.settle_mutation(RequestKind::Update, ticket, result)
            .await
    }

    /// Merge the set fields of `record` and focus the stored version
    pub async fn partial_update(&self, record: R) -> ClientResult<R> {
        require_id(&record, "partially update")?;
        let ticket = self.issue(RequestKind::PartialUpdate);
        let result = self.inner.client.partial_update(&record).await;
        self.settle_mutation(RequestKind::PartialUpdate, ticket, result)
            .await
    }

    /// Delete a record; the focus is cleared on success
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let ticket = self.issue(RequestKind::Delete);
        match self.inner.client.delete(id).await {
            Ok(()) => {
                let refresh = self.issue_refresh();
                self.dispatch(Action::DeleteFulfilled);
                self.publish_settled(RequestKind::Delete, ticket, Outcome::Success);
                self.run_refresh(refresh).await;
                Ok(())
            }
            Err(error) => self.reject(RequestKind::Delete, ticket, error),
        }
    }

    /// Return to the initial state
    ///
    /// Outstanding requests are not aborted; when they settle they still
    /// write into the (reset) state. `loading` and `updating` keep tracking
    /// them until they do.
    pub fn reset(&self) {
        self.dispatch(Action::Reset);
        self.inner.events.publish(StoreEvent::Reset {
            resource: R::resource_name().to_string(),
        });
    }

    // === Internals ===

    fn dispatch(&self, action: Action<R>) -> Applied {
        let mut applied = Applied::Applied;
        self.inner
            .state
            .send_modify(|state| applied = state.apply(action));
        applied
    }

    fn validate(&self, record: &R) -> ClientResult<()> {
        if self.inner.config.validate_before_send {
            record.validate_record().inspect_err(|error| {
                tracing::debug!(
                    resource = R::resource_name(),
                    error = %error,
                    "Record rejected before sending"
                );
            })?;
        }
        Ok(())
    }

    fn issue(&self, kind: RequestKind) -> u64 {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let action = if kind.is_mutation() {
            Action::WritePending
        } else {
            Action::ReadPending
        };
        self.dispatch(action);

        tracing::debug!(
            resource = R::resource_name(),
            kind = kind.as_str(),
            ticket,
            "Request issued"
        );
        self.inner.events.publish(StoreEvent::Issued {
            resource: R::resource_name().to_string(),
            kind,
            ticket,
        });
        ticket
    }

    fn settle_list(
        &self,
        kind: RequestKind,
        ticket: u64,
        result: ClientResult<Page<R>>,
    ) -> ClientResult<Vec<R>> {
        let page = match result {
            Ok(page) => page,
            Err(error) => return self.reject(kind, ticket, error),
        };

        let items = page.items.clone();
        if let Applied::Discarded { applied_ticket } =
            self.dispatch(Action::ListFulfilled { ticket, page })
        {
            tracing::warn!(
                resource = R::resource_name(),
                ticket,
                applied_ticket,
                "Discarded list response older than the applied one"
            );
            self.inner.events.publish(StoreEvent::Discarded {
                resource: R::resource_name().to_string(),
                ticket,
                applied_ticket,
            });
        }

        self.publish_settled(kind, ticket, Outcome::Success);
        Ok(items)
    }

    async fn settle_mutation(
        &self,
        kind: RequestKind,
        ticket: u64,
        result: ClientResult<R>,
    ) -> ClientResult<R> {
        match result {
            Ok(saved) => {
                let refresh = self.issue_refresh();
                self.dispatch(Action::MutationFulfilled(saved.clone()));
                self.publish_settled(kind, ticket, Outcome::Success);
                self.run_refresh(refresh).await;
                Ok(saved)
            }
            Err(error) => self.reject(kind, ticket, error),
        }
    }

    fn reject<T>(&self, kind: RequestKind, ticket: u64, error: ClientError) -> ClientResult<T> {
        tracing::warn!(
            resource = R::resource_name(),
            kind = kind.as_str(),
            ticket,
            error = %error,
            "Request failed"
        );

        let action = if kind.is_mutation() {
            Action::WriteRejected(error.clone())
        } else {
            Action::ReadRejected(error.clone())
        };
        self.dispatch(action);
        self.publish_settled(
            kind,
            ticket,
            Outcome::Failure {
                code: error.error_code().to_string(),
                message: error.to_string(),
            },
        );
        Err(error)
    }

    fn publish_settled(&self, kind: RequestKind, ticket: u64, outcome: Outcome) {
        tracing::debug!(
            resource = R::resource_name(),
            kind = kind.as_str(),
            ticket,
            "Request settled"
        );
        self.inner.events.publish(StoreEvent::Settled {
            resource: R::resource_name().to_string(),
            kind,
            ticket,
            outcome,
        });
    }

    async fn complete_list(&self, ticket: u64, params: QueryParams) -> ClientResult<Vec<R>> {
        let result = self.inner.client.list(&params).await;
        self.settle_list(RequestKind::List, ticket, result)
    }

    /// Issue the follow-up list fetch of a successful mutation
    ///
    /// Runs before the mutation's fulfilled transition so the refresh's
    /// pending transition cannot clear `update_success`.
    fn issue_refresh(&self) -> Option<u64> {
        match self.inner.config.refresh {
            RefreshPolicy::Manual => None,
            RefreshPolicy::Await | RefreshPolicy::Spawn => Some(self.issue(RequestKind::List)),
        }
    }

    async fn run_refresh(&self, ticket: Option<u64>) {
        let Some(ticket) = ticket else {
            return;
        };
        if self.inner.config.refresh == RefreshPolicy::Spawn {
            let store = self.clone();
            tokio::spawn(async move { store.finish_refresh(ticket).await });
        } else {
            self.finish_refresh(ticket).await;
        }
    }

    async fn finish_refresh(&self, ticket: u64) {
        if let Err(error) = self.complete_list(ticket, QueryParams::default()).await {
            tracing::warn!(
                resource = R::resource_name(),
                error = %error,
                "List refresh after mutation failed"
            );
        }
    }
}
