//! Router-level tests: every request goes through `app()` with the in-memory
//! backend behind it.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use s3_console::{
    routes::routes::app,
    services::{
        backend::StorageBackend,
        console_service::ConsoleService,
        memory_backend::{MemoryBackend, MemoryConnector},
    },
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const UPLOAD_LIMIT: usize = 1024 * 1024;

struct TestApp {
    router: Router,
    backend: MemoryBackend,
}

impl TestApp {
    fn new() -> Self {
        let backend = MemoryBackend::new();
        let service = ConsoleService::new(Arc::new(MemoryConnector::new(backend.clone())));
        Self {
            router: app(service, UPLOAD_LIMIT, None),
            backend,
        }
    }

    async fn connected() -> Self {
        let app = Self::new();
        let (status, _) = app.post_json("/api/connect", connect_body("minioadmin")).await;
        assert_eq!(status, StatusCode::OK);
        app
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(json_request("POST", uri, body)).await
    }

    async fn put_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(json_request("PUT", uri, body)).await
    }

    async fn seed(&self, bucket: &str, keys: &[&str]) {
        let (status, _) = self.post_json("/api/buckets", json!({ "name": bucket })).await;
        assert_eq!(status, StatusCode::OK);
        for (minute, key) in keys.iter().enumerate() {
            let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, minute as u32, 0).unwrap();
            self.backend
                .insert_object(bucket, key, format!("body of {key}"), at)
                .await
                .unwrap();
        }
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn connect_body(secret: &str) -> Value {
    json!({
        "endPoint": "localhost",
        "port": "9000",
        "accessKey": "minioadmin",
        "secretKey": secret,
        "useSSL": false
    })
}

fn multipart_upload(uri: &str, prefix: &str, file_name: &str, content: &str) -> Request<Body> {
    let boundary = "console-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"prefix\"\r\n\r\n{prefix}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
        b = boundary
    );
    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_endpoints_answer_without_connection() {
    let app = TestApp::new();
    let (status, body) = app.get("/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.get("/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn bucket_and_object_routes_require_a_connection() {
    let app = TestApp::new();
    for uri in [
        "/api/buckets",
        "/api/buckets/photos/objects",
        "/api/buckets/photos/stat/a.png",
        "/api/preview/photos/a.png",
    ] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["status"], 401);
        assert!(body["error"].as_str().unwrap().contains("not connected"));
    }

    let (status, body) = app.get("/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn bad_credentials_keep_previous_connection() {
    let app = TestApp::connected().await;
    let (_, before) = app.get("/api/status").await;

    let (status, body) = app.post_json("/api/connect", connect_body("wrong")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("authentication failed"));

    let (_, after) = app.get("/api/status").await;
    assert_eq!(before, after);
    assert_eq!(after["connected"], true);
    assert_eq!(after["config"]["endpoint"], "localhost");
    assert!(after["config"].get("secretKey").is_none());
}

#[tokio::test]
async fn disconnect_closes_the_session() {
    let app = TestApp::connected().await;
    let (status, _) = app.post_json("/api/disconnect", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/api/buckets").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bucket_lifecycle() {
    let app = TestApp::connected().await;

    let (status, _) = app.post_json("/api/buckets", json!({ "bucketName": "photos" })).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post_json("/api/buckets", json!({ "name": "photos" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = app.post_json("/api/buckets", json!({ "name": "Bad_Name" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, buckets) = app.get("/api/buckets").await;
    assert_eq!(buckets.as_array().unwrap().len(), 1);
    assert_eq!(buckets[0]["name"], "photos");

    app.backend
        .insert_object("photos", "a.png", "png", Utc::now())
        .await
        .unwrap();
    let (status, body) = app.delete("/api/buckets/photos").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (status, _) = app.delete("/api/buckets/photos/delete/a.png").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.delete("/api/buckets/photos").await;
    assert_eq!(status, StatusCode::OK);
    let (_, buckets) = app.get("/api/buckets").await;
    assert!(buckets.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn access_levels_round_trip_through_policy() {
    let app = TestApp::connected().await;
    app.seed("site", &[]).await;

    let (_, body) = app.get("/api/buckets/site/policy").await;
    assert_eq!(body, json!({ "policy": "", "access": "private" }));

    let (status, _) = app
        .put_json("/api/buckets/site/access", json!({ "access": "public-read" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/buckets/site/policy").await;
    assert_eq!(body["access"], "public-read");
    let doc: Value = serde_json::from_str(body["policy"].as_str().unwrap()).unwrap();
    assert_eq!(doc["Statement"][0]["Resource"][0], "arn:aws:s3:::site/*");

    app.put_json("/api/buckets/site/access", json!({ "access": "public-read-write" }))
        .await;
    let (_, body) = app.get("/api/buckets/site/policy").await;
    assert_eq!(body["access"], "public-read-write");

    let (status, _) = app
        .put_json("/api/buckets/site/access", json!({ "access": "custom" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.put_json("/api/buckets/site/access", json!({ "access": "private" }))
        .await;
    let (_, body) = app.get("/api/buckets/site/policy").await;
    assert_eq!(body["access"], "private");
    assert_eq!(body["policy"], "");
}

#[tokio::test]
async fn custom_policy_documents_are_kept_verbatim() {
    let app = TestApp::connected().await;
    app.seed("logs", &[]).await;

    let custom = json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "AWS": ["*"] },
            "Action": ["s3:ListBucket"],
            "Resource": ["arn:aws:s3:::logs"]
        }]
    })
    .to_string();
    let (status, _) = app
        .put_json("/api/buckets/logs/policy", json!({ "policy": custom }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/buckets/logs/policy").await;
    assert_eq!(body["access"], "custom");
    assert_eq!(body["policy"], custom);

    let (status, _) = app
        .put_json("/api/buckets/logs/policy", json!({ "policy": "{not json" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = app
        .send(Request::put("/api/buckets/logs/policy").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.0, StatusCode::OK);
    let (_, body) = app.get("/api/buckets/logs/policy").await;
    assert_eq!(body["access"], "private");
}

#[tokio::test]
async fn listing_groups_by_prefix() {
    let app = TestApp::connected().await;
    app.seed("docs", &["a/b.txt", "a/c/d.txt", "e.txt"]).await;

    let (status, body) = app.get("/api/buckets/docs/objects").await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], json!({ "kind": "prefix", "prefix": "a/" }));
    assert_eq!(entries[1]["kind"], "object");
    assert_eq!(entries[1]["key"], "e.txt");

    let (_, body) = app.get("/api/buckets/docs/objects?prefix=a/").await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["prefix"], "a/c/");
    assert_eq!(entries[1]["key"], "a/b.txt");

    let (_, body) = app.get("/api/buckets/docs/objects?recursive=true").await;
    let keys: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, ["a/b.txt", "a/c/d.txt", "e.txt"]);

    let (status, _) = app.get("/api/buckets/missing/objects").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_then_download_and_preview() {
    let app = TestApp::connected().await;
    app.seed("media", &[]).await;

    let (status, body) = app
        .json(multipart_upload(
            "/api/buckets/media/upload",
            "notes/",
            "hello.txt",
            "hello",
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["key"], "notes/hello.txt");
    assert_eq!(body["size"], 5);
    assert_eq!(body["etag"], "5d41402abc4b2a76b9719d911017c592");
    assert_eq!(body["contentType"], "text/plain");

    let (status, headers, bytes) = app
        .send(
            Request::get("/api/buckets/media/download/notes/hello.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"hello");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"hello.txt\""
    );
    assert_eq!(headers[header::CONTENT_LENGTH], "5");

    let (status, headers, bytes) = app
        .send(
            Request::get("/api/preview/media/notes/hello.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"hello");
    assert!(headers.get(header::CONTENT_DISPOSITION).is_none());
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");

    let (status, body) = app.get("/api/buckets/media/stat/notes/hello.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 5);

    let (status, _) = app.get("/api/buckets/media/download/notes/nope.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = TestApp::connected().await;
    app.seed("media", &[]).await;

    let boundary = "b";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"prefix\"\r\n\r\nx/\r\n--{boundary}--\r\n"
    );
    let request = Request::post("/api/buckets/media/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = app.json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no file provided");
}

#[tokio::test]
async fn batch_presign_reports_missing_keys_as_null() {
    let app = TestApp::connected().await;
    app.seed("pics", &["x.png"]).await;

    let (status, body) = app
        .post_json(
            "/api/buckets/pics/presigned-batch",
            json!({ "keys": ["x.png", "y.png"], "expiry": 3600 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let map = body.as_object().unwrap();
    assert_eq!(map.len(), 2);
    assert!(map["x.png"].as_str().unwrap().contains("x.png"));
    assert!(map["y.png"].is_null());

    let (status, body) = app.get("/api/buckets/pics/presigned/x.png?expiry=60").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["url"].as_str().unwrap().contains("X-Amz-Expires=60"));

    let (status, _) = app.get("/api/buckets/pics/presigned/y.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/buckets/pics/presigned/x.png?expiry=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_delete_and_folders() {
    let app = TestApp::connected().await;
    app.seed("docs", &["a.txt", "b.txt", "keep.txt"]).await;

    let (status, body) = app
        .post_json(
            "/api/buckets/docs/delete-objects",
            json!({ "objects": ["a.txt", "b.txt", ""] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);
    assert_eq!(body["failed"].as_object().unwrap().len(), 1);
    assert!(body["failed"].get("").is_some());

    let (status, _) = app
        .post_json("/api/buckets/docs/folder", json!({ "folderName": "reports" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let placeholder = app.backend.head_object("docs", "reports/").await.unwrap();
    assert_eq!(placeholder.size, 0);

    let (status, _) = app
        .post_json("/api/buckets/docs/folder", json!({ "folderName": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/buckets/docs/objects").await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries[0]["prefix"], "reports/");
    assert_eq!(entries[1]["key"], "keep.txt");
}
