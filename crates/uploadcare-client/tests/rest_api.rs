//! REST API behaviour against a mock server

use serde_json::json;
use std::time::{Duration, Instant};
use uploadcare_client::{
    auth, AuthScheme, ClientConfig, CopyResult, GroupOptions, Order, UploadcareClient,
    UploadcareError, WebhookOptions,
};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILE_ID: &str = "27c7846b-a019-4516-a5e4-de635f822161";

fn test_config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::demo()
        .with_api_base(server.uri())
        .with_upload_base(server.uri());
    config.retry_base_delay = Duration::from_millis(1);
    config
}

async fn setup() -> (MockServer, UploadcareClient) {
    let server = MockServer::start().await;
    let client = UploadcareClient::new(test_config(&server)).unwrap();
    (server, client)
}

#[tokio::test]
async fn test_signed_request_headers() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/project/"))
        .and(header("Accept", "application/vnd.uploadcare-v0.6+json"))
        .and(header("Content-Type", "application/json"))
        .and(header_exists("Date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "demo",
            "pub_key": "demopublickey",
            "collaborators": [{"name": "Ann", "email": "ann@example.com"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let project = client.get_project().await.unwrap();
    assert_eq!(project.name, "demo");
    assert_eq!(project.collaborators.len(), 1);

    let requests = server.received_requests().await.unwrap();
    let request = &requests[0];
    let date = request.headers.get("Date").unwrap().to_str().unwrap();
    let authorization = request.headers.get("Authorization").unwrap().to_str().unwrap();

    let expected = auth::make_signature(
        "demosecretkey",
        "GET",
        &auth::content_md5(b""),
        auth::JSON_CONTENT_TYPE,
        date,
        "/project/",
    )
    .unwrap();
    assert_eq!(authorization, format!("Uploadcare demopublickey:{}", expected));

    let user_agent = request.headers.get("User-Agent").unwrap().to_str().unwrap();
    assert!(user_agent.ends_with("/demopublickey"));
}

#[tokio::test]
async fn test_simple_auth_header() {
    let server = MockServer::start().await;
    let config = test_config(&server).with_simple_auth();
    assert_eq!(config.auth, AuthScheme::Simple);
    let client = UploadcareClient::new(config).unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/files/{}/", FILE_ID)))
        .and(header("Authorization", "Uploadcare.Simple demopublickey:demosecretkey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": FILE_ID})))
        .expect(1)
        .mount(&server)
        .await;

    let file = client.get_file(FILE_ID).await.unwrap();
    assert_eq!(file.uuid, FILE_ID);
}

#[tokio::test]
async fn test_status_mapping() {
    let (server, client) = setup().await;
    Mock::given(path("/files/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"detail":"Not found."}"#))
        .mount(&server)
        .await;
    Mock::given(path("/files/denied/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(path("/files/broken/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.get_file("missing").await.unwrap_err();
    assert!(err.is_not_found());
    match err {
        UploadcareError::InvalidRequest { body, .. } => assert!(body.contains("Not found")),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client.get_file("denied").await.unwrap_err();
    assert!(matches!(err, UploadcareError::Authentication(_)));

    let err = client.get_file("broken").await.unwrap_err();
    assert!(matches!(err, UploadcareError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_throttled_request_is_retried() {
    let (server, client) = setup().await;
    Mock::given(path("/project/"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(path("/project/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "demo"})))
        .mount(&server)
        .await;

    let project = client.get_project().await.unwrap();
    assert_eq!(project.name, "demo");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_throttling_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    let client = UploadcareClient::new(test_config(&server).with_max_retries(2)).unwrap();
    Mock::given(path("/project/"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let err = client.get_project().await.unwrap_err();
    assert!(matches!(err, UploadcareError::Throttled { .. }));
}

#[tokio::test]
async fn test_bad_gateway_is_retried() {
    let (server, client) = setup().await;
    Mock::given(path("/webhooks/"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(path("/webhooks/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let webhooks = client.list_webhooks().await.unwrap();
    assert!(webhooks.is_empty());
}

#[tokio::test]
async fn test_service_unavailable_honours_retry_after() {
    let (server, client) = setup().await;
    Mock::given(path("/project/"))
        .respond_with(ResponseTemplate::new(503).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(path("/project/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "demo"})))
        .mount(&server)
        .await;

    let started = Instant::now();
    client.get_project().await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_retry_after_is_not_capped() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.max_retry_delay = Duration::from_millis(10);
    let client = UploadcareClient::new(config).unwrap();
    Mock::given(path("/project/"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(path("/project/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "demo"})))
        .mount(&server)
        .await;

    let started = Instant::now();
    client.get_project().await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_connect_errors_are_retried_then_surface() {
    // Bind and release a port so nothing listens on it
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let mut config = ClientConfig::demo()
        .with_api_base(format!("http://{}", addr))
        .with_max_retries(2);
    config.retry_base_delay = Duration::from_millis(100);
    let client = UploadcareClient::new(config).unwrap();

    let started = Instant::now();
    let err = client.get_project().await.unwrap_err();
    match err {
        UploadcareError::Http(e) => assert!(e.is_connect()),
        other => panic!("unexpected error: {other:?}"),
    }
    // 100ms + 200ms of backoff between the three attempts
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_store_files_in_batches() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/files/storage/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(3)
        .mount(&server)
        .await;

    let ids: Vec<String> = (0..250).map(|i| format!("file-{}", i)).collect();
    client.store_files(&ids).await.unwrap();

    let sizes: Vec<usize> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice::<Vec<String>>(&r.body).unwrap().len())
        .collect();
    assert_eq!(sizes, vec![100, 100, 50]);
}

#[tokio::test]
async fn test_delete_files_single_batch() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/files/storage/"))
        .and(body_json(json!(["a", "b"])))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_files(&["a", "b"]).await.unwrap();
}

#[tokio::test]
async fn test_store_and_delete_file() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path(format!("/files/{}/storage/", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": FILE_ID})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/files/{}/", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": FILE_ID})))
        .expect(1)
        .mount(&server)
        .await;

    client.store_file(FILE_ID).await.unwrap();
    client.delete_file(FILE_ID).await.unwrap();
}

#[tokio::test]
async fn test_files_pagination() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/files/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": null,
            "total": 3,
            "results": [{"uuid": "c"}]
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/"))
        .and(query_param("stored", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": format!("{}/files/?page=2&stored=true", server.uri()),
            "total": 3,
            "results": [{"uuid": "a"}, {"uuid": "b"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = client
        .files()
        .stored(true)
        .ordering(Order::UploadTimeDesc)
        .collect()
        .await
        .unwrap();
    let ids: Vec<&str> = files.iter().map(|f| f.uuid.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_groups_listing_and_store() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/groups/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": null,
            "results": [{"id": "g~2", "files_count": 2}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/groups/g~2/storage/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "g~2"})))
        .expect(1)
        .mount(&server)
        .await;

    let groups = client.groups().collect().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].files_count, 2);
    client.store_group(&groups[0].id).await.unwrap();
}

#[tokio::test]
async fn test_create_group_form() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/group/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc~2",
            "files_count": 2,
            "files": [{"uuid": "one"}, null]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let group = client
        .create_group(&["one", "two"], GroupOptions::new().with_callback("cb"))
        .await
        .unwrap();
    assert_eq!(group.id, "abc~2");
    assert!(group.files[1].is_none());

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"files[0]\""));
    assert!(body.contains("name=\"files[1]\""));
    assert!(body.contains("name=\"pub_key\""));
    assert!(body.contains("name=\"callback\""));
    assert!(!body.contains("name=\"signature\""));
    // Upload API calls are not signed
    assert!(requests[0].headers.get("Authorization").is_none());
}

#[tokio::test]
async fn test_webhook_lifecycle() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/webhooks/"))
        .and(body_json(json!({
            "target_url": "https://example.com/hook",
            "event": "file.uploaded",
            "is_active": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7,
            "event": "file.uploaded",
            "target_url": "https://example.com/hook",
            "is_active": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/webhooks/7/"))
        .and(body_json(json!({"is_active": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "is_active": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/webhooks/unsubscribe/"))
        .and(body_json(json!({"target_url": "https://example.com/hook"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let hook = client
        .create_webhook("https://example.com/hook", uploadcare_client::EVENT_FILE_UPLOADED, true)
        .await
        .unwrap();
    assert_eq!(hook.id, 7);

    let hook = client
        .update_webhook(hook.id, WebhookOptions::new().with_active(false))
        .await
        .unwrap();
    assert!(!hook.is_active);

    client.delete_webhook("https://example.com/hook").await.unwrap();
}

#[tokio::test]
async fn test_copies() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/files/local_copy/"))
        .and(body_json(json!({"source": FILE_ID, "store": true, "make_public": false})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "type": "file",
            "result": {"uuid": "copy-id"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/files/remote_copy/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "type": "url",
            "result": "s3://bucket/copy.jpg"
        })))
        .mount(&server)
        .await;

    let copy = client.copy_file_local(FILE_ID, true, false).await.unwrap();
    assert_eq!(copy.file().map(|f| f.uuid.as_str()), Some("copy-id"));

    let copy = client
        .copy_file_remote(FILE_ID, "storage", true, Some("${uuid}${ext}"))
        .await
        .unwrap();
    assert_eq!(copy, CopyResult::Url("s3://bucket/copy.jpg".to_string()));
}

#[tokio::test]
async fn test_rekognition_fields() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{}/", FILE_ID)))
        .and(query_param("add_fields", "rekognition_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": FILE_ID,
            "rekognition_info": {"Dog": 0.9}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = client.get_file_with_rekognition_info(FILE_ID).await.unwrap();
    let labels = file.rekognition_info.unwrap();
    assert!(labels["Dog"] > 0.8);
}

#[tokio::test]
async fn test_uploaded_file_info_needs_no_secret() {
    let server = MockServer::start().await;
    let config = ClientConfig::demo_upload_only().with_upload_base(server.uri());
    let client = UploadcareClient::new(config).unwrap();
    Mock::given(method("GET"))
        .and(path("/info/"))
        .and(query_param("pub_key", "demopublickey"))
        .and(query_param("file_id", FILE_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"uuid": FILE_ID})))
        .expect(1)
        .mount(&server)
        .await;

    let file = client.get_uploaded_file(FILE_ID).await.unwrap();
    assert_eq!(file.uuid, FILE_ID);
}
