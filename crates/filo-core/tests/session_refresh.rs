//! Integration tests for the authenticated request pipeline against a mock
//! backend: bearer attachment, refresh on 401, single replay, and session
//! teardown when the refresh fails.

use std::sync::Arc;
use std::time::Duration;

use filo_core::api::{ApiClient, ApiError};
use filo_core::auth::{FileTokenStore, MemoryTokenStore, Session, SharedTokenStore, TokenStore};
use filo_core::config::Config;
use filo_core::models::{Resource, Vehicle};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VEHICLES: &str = "/api/araclar/";
const REFRESH: &str = "/api/token/refresh/";
const TOKEN: &str = "/api/token/";

fn vehicles_body() -> serde_json::Value {
    json!([{
        "id": 1, "plaka": "34 ABC 123", "marka": "Ford", "model": "Transit", "yil": 2019,
        "tip": "Panelvan", "kaynak_tipi": "ozmal", "mevcut_durum": "havuzda", "aciklama": ""
    }])
}

fn client_for(server: &MockServer, store: SharedTokenStore) -> ApiClient {
    let config = Config {
        api_url: server.uri(),
        ..Config::default()
    };
    ApiClient::new(&config, store).unwrap()
}

fn store_with(access: &str, refresh: &str) -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_session(Session::new(access, refresh)))
}

#[tokio::test]
async fn test_attaches_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vehicles_body()))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, store_with("T1", "R1"));
    let vehicles: Vec<Vehicle> = api.list().await.unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].plate, "34 ABC 123");
}

#[tokio::test]
async fn test_refreshes_and_replays_after_401() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vehicles_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with("T1", "R1");
    let api = client_for(&server, store.clone());
    let vehicles: Vec<Vehicle> = api.list().await.unwrap();

    assert_eq!(vehicles.len(), 1);
    assert_eq!(store.get(), Some(Session::new("T2", "R1")));
}

#[tokio::test]
async fn test_refresh_request_carries_no_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .mount(&server)
        .await;

    let api = client_for(&server, store_with("T1", "R1"));
    let _: Vec<Vehicle> = api.list().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let refresh = requests
        .iter()
        .find(|r| r.url.path() == REFRESH)
        .unwrap();
    assert!(refresh.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_rotated_refresh_token_is_stored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "T2", "refresh": "R2"})),
        )
        .mount(&server)
        .await;

    let store = store_with("T1", "R1");
    let api = client_for(&server, store.clone());
    let _: Vec<Vehicle> = api.list().await.unwrap();

    assert_eq!(store.get(), Some(Session::new("T2", "R2")));
}

#[tokio::test]
async fn test_second_401_propagates_without_another_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with("T1", "R1");
    let api = client_for(&server, store.clone());
    let err = api.list::<Vehicle>().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    // The refresh itself succeeded, so the session stays.
    assert_eq!(store.get(), Some(Session::new("T2", "R1")));
}

#[tokio::test]
async fn test_failed_refresh_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is invalid or expired"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with("T1", "R1");
    let api = client_for(&server, store.clone());
    let err = api.list::<Vehicle>().await.unwrap_err();

    assert!(err.is_session_expired());
    assert!(store.get().is_none());
    assert!(!store.has_session());
}

#[tokio::test]
async fn test_refresh_timeout_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "T2"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = Config {
        api_url: server.uri(),
        request_timeout_secs: 1,
        ..Config::default()
    };
    let store = store_with("T1", "R1");
    let api = ApiClient::new(&config, store.clone()).unwrap();
    let err = api.list::<Vehicle>().await.unwrap_err();

    match err {
        ApiError::SessionExpired(source) => {
            assert!(matches!(*source, ApiError::NetworkError(_)))
        }
        other => panic!("expected SessionExpired, got {:?}", other),
    }
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_unparsable_refresh_body_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with("T1", "R1");
    let api = client_for(&server, store.clone());
    let err = api.list::<Vehicle>().await.unwrap_err();

    assert!(err.is_session_expired());
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_missing_session_expires_without_refresh_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .expect(0)
        .mount(&server)
        .await;

    let api = client_for(&server, Arc::new(MemoryTokenStore::new()));
    let err = api.list::<Vehicle>().await.unwrap_err();

    match err {
        ApiError::SessionExpired(source) => {
            assert!(matches!(*source, ApiError::MissingRefreshToken))
        }
        other => panic!("expected SessionExpired, got {:?}", other),
    }

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(VEHICLES))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"plaka": ["Bu plaka zaten kayıtlı."]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/suruculer/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = store_with("T1", "R1");
    let api = client_for(&server, store.clone());

    let vehicle: Vehicle = serde_json::from_value(vehicles_body()[0].clone()).unwrap();
    match api.create(&vehicle).await.unwrap_err() {
        ApiError::Validation { detail, .. } => assert_eq!(detail, "plaka: Bu plaka zaten kayıtlı."),
        other => panic!("expected Validation, got {:?}", other),
    }

    let err = api
        .list::<filo_core::models::Driver>()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ServerError(_)));
    assert_eq!(store.get(), Some(Session::new("T1", "R1")));
}

#[tokio::test]
async fn test_concurrent_401s_each_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .expect(2)
        .mount(&server)
        .await;

    let api = client_for(&server, store_with("T1", "R1"));
    let (vehicles, drivers) = futures::join!(
        api.list::<Vehicle>(),
        api.list::<filo_core::models::Driver>()
    );
    assert!(vehicles.unwrap().is_empty());
    assert!(drivers.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_stores_token_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .and(body_json(json!({"username": "admin", "password": "secret"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "T1", "refresh": "R1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let api = client_for(&server, store.clone());
    api.login("admin", "secret").await.unwrap();

    assert_eq!(store.get(), Some(Session::new("T1", "R1")));
}

#[tokio::test]
async fn test_rejected_login_is_not_session_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"detail": "No active account found with the given credentials"}),
        ))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let api = client_for(&server, store.clone());
    let err = api.login("admin", "wrong").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_delete_accepts_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/harcamalar/5/"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, store_with("T1", "R1"));
    api.delete(Resource::Expenses, 5).await.unwrap();
}

#[tokio::test]
async fn test_file_store_persists_refreshed_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(VEHICLES))
        .and(header("authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "T2"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::open(dir.path()).unwrap();
    store.set(Session::new("T1", "R1"));

    let api = client_for(&server, Arc::new(store));
    let _: Vec<Vehicle> = api.list().await.unwrap();

    let reopened = FileTokenStore::open(dir.path()).unwrap();
    assert_eq!(reopened.get(), Some(Session::new("T2", "R1")));
}

#[tokio::test]
async fn test_fetch_single_record() {
    let server = MockServer::start().await;
    let mut body = vehicles_body()[0].clone();
    body["id"] = json!(7);
    Mock::given(method("GET"))
        .and(path("/api/araclar/7/"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, store_with("T1", "R1"));
    let vehicle: Vehicle = api.fetch(7).await.unwrap();
    assert_eq!(vehicle.id, Some(7));
    assert_eq!(vehicle.plate, "34 ABC 123");
}
