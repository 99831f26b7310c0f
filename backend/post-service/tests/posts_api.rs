use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;

use post_service::config::UploadConfig;
use post_service::db::{InMemoryPostRepository, PostRepository};
use post_service::handlers::HealthState;
use post_service::routes;
use post_service::services::PostService;
use post_service::storage::{BlobStore, InMemoryBlobStore};

const BOUNDARY: &str = "----postsapiboundary";

struct Fixture {
    repo: Arc<InMemoryPostRepository>,
    blobs: Arc<InMemoryBlobStore>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryPostRepository::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
        }
    }

    fn posts(&self) -> Arc<dyn PostRepository> {
        self.repo.clone()
    }

    fn blob_store(&self) -> Arc<dyn BlobStore> {
        self.blobs.clone()
    }
}

macro_rules! init_app {
    ($fixture:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(PostService::new(
                    $fixture.posts(),
                    $fixture.blob_store(),
                )))
                .app_data(web::Data::new(HealthState::new(
                    $fixture.posts(),
                    $fixture.blob_store(),
                )))
                .app_data(web::Data::new(UploadConfig::default()))
                .configure(routes::configure),
        )
        .await
    };
}

/// JPEG of roughly `min_bytes` bytes (noise compresses poorly)
fn jpeg(min_bytes: usize) -> Vec<u8> {
    let mut side = 16u32;
    loop {
        let img = RgbImage::from_fn(side, side, |x, y| {
            let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104729)) as u8;
            image::Rgb([v, v.wrapping_mul(3), v.wrapping_add(91)])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageOutputFormat::Jpeg(95))
            .unwrap();
        let bytes = buf.into_inner();
        if bytes.len() >= min_bytes {
            return bytes;
        }
        side *= 2;
    }
}

fn png() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(8, 8))
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, Vec<u8>),
}

fn multipart(parts: Vec<Part<'_>>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

fn multipart_request(method: test::TestRequest, uri: &str, parts: Vec<Part<'_>>) -> test::TestRequest {
    let (content_type, body) = multipart(parts);
    method
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

fn create_request(title: &str, content: &str, image: Vec<u8>) -> test::TestRequest {
    multipart_request(
        test::TestRequest::post(),
        "/api/posts",
        vec![
            Part::Text("title", title),
            Part::Text("content", content),
            Part::File("image", "photo.jpg", image),
        ],
    )
}

fn object_keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default();
    keys.sort();
    keys
}

#[actix_web::test]
async fn create_stores_post_and_image() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let image = jpeg(10 * 1024);
    let resp = test::call_service(&app, create_request("Hello", "World", image.clone()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "Data Post Berhasil Ditambahkan!");
    assert_eq!(body["data"]["title"], "Hello");
    assert_eq!(body["data"]["content"], "World");

    let name = body["data"]["image"].as_str().unwrap().to_string();
    let (stem, ext) = name.split_once('.').unwrap();
    assert_eq!(stem.len(), 40);
    assert!(stem.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(ext, "jpeg");

    let stored = fixture
        .blobs
        .get(&format!("posts/{}", name))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, Bytes::from(image.clone()));

    let req = test::TestRequest::get()
        .uri(&format!("/storage/posts/{}", name))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    let served = test::read_body(resp).await;
    assert_eq!(served, Bytes::from(image));
}

#[actix_web::test]
async fn create_without_image_reports_image_only() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let req = multipart_request(
        test::TestRequest::post(),
        "/api/posts",
        vec![Part::Text("title", "Hello"), Part::Text("content", "World")],
    );
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(object_keys(&body), vec!["image"]);
    assert_eq!(body["image"][0], "The image field is required.");
    assert!(fixture.repo.is_empty().await);
    assert!(fixture.blobs.keys().await.is_empty());
}

#[actix_web::test]
async fn create_rejects_non_image_upload() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let resp = test::call_service(
        &app,
        create_request("Hello", "World", b"definitely not an image".to_vec()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    let messages: Vec<&str> = body["image"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(messages.contains(&"The image must be an image."));
    assert!(messages.contains(&"The image must be a file of type: jpeg, png, jpg, gif, svg."));
}

#[actix_web::test]
async fn create_rejects_overlong_title() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let title = "t".repeat(256);
    let resp = test::call_service(&app, create_request(&title, "World", png()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(object_keys(&body), vec!["title"]);
    assert_eq!(
        body["title"][0],
        "The title may not be greater than 255 characters."
    );
    assert!(fixture.repo.is_empty().await);
    assert!(fixture.blobs.keys().await.is_empty());
}

#[actix_web::test]
async fn list_returns_five_newest_per_page() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    for i in 0..7 {
        let title = format!("Post {}", i);
        let resp = test::call_service(&app, create_request(&title, "Body", png()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri("/api/posts").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "List Data Posts");

    let page = &body["data"];
    assert_eq!(page["current_page"], 1);
    assert_eq!(page["per_page"], 5);
    assert_eq!(page["total"], 7);
    assert_eq!(page["last_page"], 2);
    assert_eq!(page["from"], 1);
    assert_eq!(page["to"], 5);
    assert_eq!(page["prev_page_url"], Value::Null);
    assert!(page["next_page_url"]
        .as_str()
        .unwrap()
        .ends_with("/api/posts?page=2"));

    let titles: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Post 6", "Post 5", "Post 4", "Post 3", "Post 2"]);

    let req = test::TestRequest::get().uri("/api/posts?page=2").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);

    let req = test::TestRequest::get().uri("/api/posts?page=9").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["data"]["data"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn list_on_empty_store_succeeds() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let req = test::TestRequest::get().uri("/api/posts?page=abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["current_page"], 1);
}

#[actix_web::test]
async fn get_returns_title_projection() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], true);
    assert_eq!(body["message"], "Data Post Ditemukan!");
    assert_eq!(body["data"], serde_json::json!({"title": "Hello"}));
}

#[actix_web::test]
async fn get_missing_post_is_not_found() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    for uri in ["/api/posts/999", "/api/posts/not-a-number"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            serde_json::json!({"status": 404, "message": "Error: Data tidak ditemukan."})
        );
    }
}

#[actix_web::test]
async fn update_missing_post_is_checked_before_validation() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let req = test::TestRequest::put()
        .uri("/api/posts/999")
        .set_json(serde_json::json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, serde_json::json!({"message": "ID tidak ditemukan"}));
}

#[actix_web::test]
async fn update_missing_post_ignores_unreadable_body() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let requests = vec![
        test::TestRequest::put()
            .uri("/api/posts/999")
            .set_json(serde_json::json!({"title": 5, "content": "x"})),
        test::TestRequest::put()
            .uri("/api/posts/999")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"title\": "),
        test::TestRequest::patch()
            .uri("/api/posts/999")
            .insert_header((header::CONTENT_TYPE, "multipart/form-data; boundary=missing"))
            .set_payload("garbage"),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"message": "ID tidak ditemukan"}));
    }
}

#[actix_web::test]
async fn update_with_malformed_json_is_bad_request() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", id))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"title\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn update_accepts_long_urlencoded_content() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let content = "a".repeat(20 * 1024);
    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", id))
        .set_form([("title", "Long"), ("content", content.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["content"].as_str().map(str::len), Some(20 * 1024));
}

#[actix_web::test]
async fn update_reports_missing_fields() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/posts/{}", id))
        .set_json(serde_json::json!({"title": "Only title"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(object_keys(&body), vec!["content"]);
    assert_eq!(body["content"][0], "The content field is required.");
}

#[actix_web::test]
async fn update_with_image_replaces_blob() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();
    let old_image = created["data"]["image"].as_str().unwrap().to_string();

    let req = multipart_request(
        test::TestRequest::post(),
        &format!("/api/posts/{}", id),
        vec![
            Part::Text("title", "New title"),
            Part::Text("content", "New content"),
            Part::File("image", "new.jpg", jpeg(1024)),
        ],
    );
    let resp = test::call_service(&app, req.to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Data Post Berhasil Diubah!");
    assert!(body.get("status").is_none());
    assert_eq!(body["data"]["title"], "New title");
    assert_eq!(body["data"]["content"], "New content");

    let new_image = body["data"]["image"].as_str().unwrap().to_string();
    assert_ne!(new_image, old_image);
    assert!(new_image.ends_with(".jpeg"));
    assert_eq!(
        fixture.blobs.keys().await,
        vec![format!("posts/{}", new_image)]
    );
}

#[actix_web::test]
async fn update_without_image_keeps_blob() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();
    let image = created["data"]["image"].as_str().unwrap().to_string();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/posts/{}", id))
        .set_form([("title", "Edited"), ("content", "Text")])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["image"], image.as_str());
    assert!(fixture
        .blobs
        .exists(&format!("posts/{}", image))
        .await
        .unwrap());
}

#[actix_web::test]
async fn delete_removes_post_and_image() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        serde_json::json!({"status": true, "message": "Data Post Berhasil Dihapus!", "data": null})
    );
    assert!(fixture.blobs.keys().await.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/api/posts/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, serde_json::json!({"message": "Post not found"}));
}

#[actix_web::test]
async fn delete_tolerates_missing_blob() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let created: Value =
        test::read_body_json(test::call_service(&app, create_request("Hello", "World", png()).to_request()).await)
            .await;
    let id = created["data"]["id"].as_i64().unwrap();
    let image = created["data"]["image"].as_str().unwrap();
    fixture
        .blobs
        .delete(&format!("posts/{}", image))
        .await
        .unwrap();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/posts/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(fixture.repo.is_empty().await);
}

#[actix_web::test]
async fn image_route_rejects_unsafe_names() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    for uri in ["/storage/posts/missing.png", "/storage/posts/..secret"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[actix_web::test]
async fn health_endpoints_report_ready() {
    let fixture = Fixture::new();
    let app = init_app!(fixture);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");

    let req = test::TestRequest::get().uri("/api/health/ready").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["checks"]["record_store"]["status"], "healthy");

    let req = test::TestRequest::get().uri("/api/openapi.json").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["paths"].get("/api/posts").is_some());
}
