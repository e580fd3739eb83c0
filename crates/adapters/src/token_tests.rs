// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn provider_for(server: &MockServer) -> HttpTokenProvider {
    HttpTokenProvider::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn http_provider_reads_token_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/user-1/github-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "ghp_abc" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = provider_for(&server).await.github_token("user-1").await.unwrap();
    assert_eq!(token, "ghp_abc");
}

#[tokio::test]
async fn http_provider_maps_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost/github-token"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = provider_for(&server).await.github_token("ghost").await.unwrap_err();
    assert!(matches!(err, TokenError::Status { status: 404, .. }), "{err:?}");
}

#[tokio::test]
async fn http_provider_rejects_empty_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/user-2/github-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let err = provider_for(&server).await.github_token("user-2").await.unwrap_err();
    assert!(matches!(err, TokenError::Empty(ref u) if u == "user-2"), "{err:?}");
}

#[tokio::test]
async fn no_provider_is_not_configured() {
    let err = NoTokenProvider.github_token("user-1").await.unwrap_err();
    assert!(matches!(err, TokenError::NotConfigured));
}

#[tokio::test]
async fn fake_provider_records_lookups() {
    let fake = FakeTokenProvider::new().with_token("user-1", "ghp_fake");
    assert_eq!(fake.github_token("user-1").await.unwrap(), "ghp_fake");
    assert!(fake.github_token("user-2").await.is_err());
    assert_eq!(fake.lookups(), vec!["user-1", "user-2"]);
}

#[tokio::test]
async fn http_provider_encodes_user_id_as_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/..%2Fadmin/github-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "ghp_odd" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/github-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let token = provider_for(&server).await.github_token("../admin").await.unwrap();
    assert_eq!(token, "ghp_odd");
}

#[test]
fn http_provider_rejects_unparseable_base_url() {
    let err = HttpTokenProvider::new("not a url", Duration::from_secs(1)).err().unwrap();
    assert!(matches!(err, TokenError::Http(_)), "{err:?}");
}
