//! Upload → store → group → CDN flow across the REST API, Upload API and CDN

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde_json::json;
use std::time::Duration;
use uploadcare_client::{auth, ClientConfig, GroupOptions, UploadcareClient};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILE_ID: &str = "b2d1c6f8-2a47-4d0b-9a45-7bd1f4c8e5a1";

async fn mock_service() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/base/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file": FILE_ID})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/files/{}/", FILE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": FILE_ID,
            "size": 11,
            "is_image": true,
            "is_ready": true,
            "mime_type": "image/png",
            "original_filename": "pixel.png",
            "datetime_uploaded": "2024-05-01T10:00:00Z",
            "image_info": {"width": 1, "height": 1, "format": "PNG", "orientation": 6}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/files/storage/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/group/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": format!("{}~1", FILE_ID),
            "files_count": 1,
            "files": [{"uuid": FILE_ID}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/[0-9a-f-]+/-/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"image".to_vec()))
        .mount(&server)
        .await;

    server
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::demo()
        .with_api_base(server.uri())
        .with_upload_base(server.uri())
        .with_cdn_base(server.uri())
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_upload_store_group_and_transform() {
    let server = mock_service().await;
    let client = UploadcareClient::new(config_for(&server)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("pixel.png");
    std::fs::write(&file_path, b"fake pixels").unwrap();

    let file = client.upload_file(&file_path).await.unwrap();
    assert_eq!(file.uuid, FILE_ID);
    assert!(file.is_image);
    let image = file.image_info.as_ref().unwrap();
    assert_eq!(image.orientation().exif_code(), Some(6));

    client.store_files(&[file.uuid.as_str()]).await.unwrap();

    let group = client
        .create_group(&[file.uuid.as_str()], GroupOptions::new())
        .await
        .unwrap();
    assert_eq!(group.files_count, 1);

    let url = file
        .cdn_path()
        .scale_crop_center(200, 200)
        .grayscale()
        .url(client.urls())
        .unwrap();
    let response = reqwest::get(url.as_str()).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(&response.bytes().await.unwrap()[..], b"image");
}

#[tokio::test]
async fn test_store_request_is_signed_over_its_body() {
    let server = mock_service().await;
    let client = UploadcareClient::new(config_for(&server)).unwrap();

    client.store_files(&["one", "two"]).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = requests
        .iter()
        .find(|r| r.url.path() == "/files/storage/")
        .unwrap();

    let body_md5 = hex::encode(Md5::digest(&request.body));
    assert_eq!(body_md5, auth::content_md5(br#"["one","two"]"#));

    let date = request.headers.get("Date").unwrap().to_str().unwrap();
    let sent_at = DateTime::parse_from_rfc2822(date).unwrap().with_timezone(&Utc);
    assert!((Utc::now() - sent_at).num_seconds().abs() < 60);

    let signature = auth::make_signature(
        "demosecretkey",
        "PUT",
        &body_md5,
        auth::JSON_CONTENT_TYPE,
        date,
        "/files/storage/",
    )
    .unwrap();
    let authorization = request.headers.get("Authorization").unwrap().to_str().unwrap();
    assert_eq!(authorization, format!("Uploadcare demopublickey:{}", signature));
}
