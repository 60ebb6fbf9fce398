//! Client facade wiring both entity stores to one backend

use crate::client::{CacheBuster, HttpTransport, ResourceClient, Transport};
use crate::config::ClientConfig;
use crate::core::error::ClientResult;
use crate::core::events::EventBus;
use crate::entities::{Incident, Patient};
use crate::store::EntityStore;
use std::sync::Arc;

/// Incident and patient stores sharing a transport, cache buster and event bus
#[derive(Clone)]
pub struct IpmsClient {
    incidents: EntityStore<Incident>,
    patients: EntityStore<Patient>,
    events: EventBus,
    config: ClientConfig,
}

impl IpmsClient {
    /// Connect to the backend named in `config` over HTTP
    pub fn connect(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(config.base_url.clone(), config.timeout())?;
        tracing::info!(base_url = %config.base_url, "Client configured");
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Build the client over any transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let cache_buster = Arc::new(CacheBuster::new());
        let events = EventBus::default();

        let incidents = EntityStore::new(
            ResourceClient::new(transport.clone(), cache_buster.clone(), &config.api_prefix),
            config.store.clone(),
            events.clone(),
        );
        let patients = EntityStore::new(
            ResourceClient::new(transport, cache_buster, &config.api_prefix),
            config.store.clone(),
            events.clone(),
        );

        Self {
            incidents,
            patients,
            events,
            config,
        }
    }

    pub fn incidents(&self) -> &EntityStore<Incident> {
        &self.incidents
    }

    pub fn patients(&self) -> &EntityStore<Patient> {
        &self.patients
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
