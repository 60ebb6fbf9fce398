//! End-to-end tests: entity stores over HTTP against the reference backend
//!
//! The backend is served on an ephemeral port and the client talks to it
//! through the `reqwest` transport.

use chrono::NaiveDate;
use ipms::config::{ClientConfig, RefreshPolicy};
use ipms::core::{ClientError, QueryParams, Sort};
use ipms::prelude::*;
use tokio::net::TcpListener;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn spawn_backend() -> (Backend, String) {
    let backend = Backend::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = backend.router();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (backend, format!("http://{}", addr))
}

async fn connect(refresh: RefreshPolicy) -> (Backend, IpmsClient) {
    let (backend, base_url) = spawn_backend().await;
    let mut config = ClientConfig::default_config();
    config.base_url = base_url;
    config.timeout_secs = 5;
    config.store.refresh = refresh;
    (backend, IpmsClient::connect(config).unwrap())
}

#[tokio::test]
async fn test_incident_lifecycle() {
    let (backend, client) = connect(RefreshPolicy::Await).await;
    let incidents = client.incidents();

    let created = incidents
        .create(Incident::new("Flood", date(2021, 5, 1)))
        .await
        .unwrap();
    let id = created.id.unwrap();

    let state = incidents.snapshot();
    assert_eq!(state.entity, created);
    assert_eq!(state.entities.len(), 1);
    assert_eq!(state.total_items, 1);
    assert!(state.is_idle());

    let renamed = incidents
        .partial_update(Incident {
            id: Some(id),
            name: Some("Flash flood".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(renamed.name.as_deref(), Some("Flash flood"));
    assert_eq!(renamed.start_date, Some(date(2021, 5, 1)));

    let mut replaced = renamed.clone();
    replaced.start_date = Some(date(2021, 4, 30));
    let replaced = incidents.update(replaced).await.unwrap();
    assert_eq!(
        backend.incidents().get(id).unwrap().unwrap().start_date,
        replaced.start_date
    );

    incidents.delete(id).await.unwrap();
    let state = incidents.snapshot();
    assert_eq!(state.entity, Incident::default());
    assert!(state.entities.is_empty());
    assert_eq!(state.total_items, 0);
}

#[tokio::test]
async fn test_filtered_paged_list() {
    let (backend, client) = connect(RefreshPolicy::Manual).await;
    for (name, day) in [("Flood", 1), ("Smithfield fire", 2), ("Smith St crash", 3)] {
        backend
            .incidents()
            .insert(Incident::new(name, date(2021, 5, day)))
            .unwrap();
    }

    let filter = IncidentFilter::from_inputs("", "Smith", "").unwrap();
    let items = client
        .incidents()
        .fetch_filtered(QueryParams::page(0, 1).sorted(Sort::desc("startDate")), &filter)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name.as_deref(), Some("Smith St crash"));
    assert_eq!(client.incidents().snapshot().total_items, 2);
    assert_eq!(client.incidents().count(&filter).await.unwrap(), 2);
}

#[tokio::test]
async fn test_patients_at_incident() {
    let (_backend, client) = connect(RefreshPolicy::Await).await;

    let flood = client
        .incidents()
        .create(Incident::new("Flood", date(2021, 5, 1)))
        .await
        .unwrap();
    let flood_id = flood.id.unwrap();

    client
        .patients()
        .create(
            Patient::new("Ada", "Smith")
                .with_category(Category::Black)
                .at_incident(flood_id, "Flood"),
        )
        .await
        .unwrap();
    client
        .patients()
        .create(Patient::new("Bob", "Jones").with_category(Category::Green))
        .await
        .unwrap();
    assert_eq!(client.patients().snapshot().total_items, 2);

    let filter = PatientFilter {
        incident_id: Some(flood_id),
        ..Default::default()
    };
    let at_flood = client
        .patients()
        .fetch_filtered(QueryParams::default(), &filter)
        .await
        .unwrap();
    assert_eq!(at_flood.len(), 1);
    assert_eq!(at_flood[0].triage_category, Some(Category::Black));

    let typed = PatientFilter::from_inputs("", "", "", "bla", "flo").unwrap();
    let by_name = client
        .patients()
        .fetch_filtered(QueryParams::default(), &typed)
        .await
        .unwrap();
    assert_eq!(by_name, at_flood);
    assert_eq!(client.patients().count(&typed).await.unwrap(), 1);
}

#[tokio::test]
async fn test_server_errors_reach_the_store() {
    let (_backend, client) = connect(RefreshPolicy::Await).await;

    let err = client.incidents().fetch_one(404).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    let state = client.incidents().snapshot();
    assert!(!state.loading);
    assert!(state.error_message().unwrap().contains("not found"));

    let err = client
        .incidents()
        .update(Incident::new("Ghost", date(2021, 5, 1)).with_id(9))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::Server {
            status: 400,
            message: "Entity not found".to_string(),
        }
    );
    assert!(!client.incidents().snapshot().updating);
}

#[tokio::test]
async fn test_unreachable_backend() {
    let mut config = ClientConfig::default_config();
    config.base_url = "http://127.0.0.1:9".to_string();
    config.timeout_secs = 2;
    let client = IpmsClient::connect(config).unwrap();

    let err = client
        .incidents()
        .fetch_list(QueryParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "TRANSPORT_ERROR");
    assert!(!client.incidents().snapshot().loading);
}
