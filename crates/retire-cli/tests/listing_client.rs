//! Live listing client tests against a wiremock server.

use std::time::Duration;

use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use retire_cli::{ListingClient, ListingError, RetryPolicy};

const RETRIES: u32 = 2;

fn client(server: &MockServer) -> ListingClient {
    let url = Url::parse(&format!("{}/files.txt", server.uri())).unwrap();
    ListingClient::with_timeout(url, Duration::from_secs(5))
        .unwrap()
        .with_retry(RetryPolicy {
            max_retries: RETRIES,
            base_delay: Duration::from_millis(1),
        })
}

#[tokio::test]
async fn fetch_keeps_basenames() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "pool/main/b/bash/bash_5.2_amd64.deb\r\n\npool/main/c/curl/curl_8.5_amd64.deb\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let live = client(&server).fetch().await.unwrap();

    assert_eq!(live.len(), 2);
    assert!(live.contains("bash_5.2_amd64.deb"));
    assert!(live.contains("curl_8.5_amd64.deb"));
}

#[tokio::test]
async fn empty_listing_is_empty_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let live = client(&server).fetch().await.unwrap();

    assert!(live.is_empty());
}

#[tokio::test]
async fn client_error_status_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such listing"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).fetch().await.unwrap_err();

    match err {
        ListingError::Status { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such listing");
        }
        other => panic!("expected status error, got {other}"),
    }
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files.txt"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(u64::from(RETRIES))
        .expect(u64::from(RETRIES))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pool/main/a/a_1_all.deb\n"))
        .expect(1)
        .mount(&server)
        .await;

    let live = client(&server).fetch().await.unwrap();

    assert!(live.contains("a_1_all.deb"));
}

#[tokio::test]
async fn persistent_server_error_gives_up_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files.txt"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(u64::from(RETRIES) + 1)
        .mount(&server)
        .await;

    let err = client(&server).fetch().await.unwrap_err();

    match err {
        ListingError::Status { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected status error, got {other}"),
    }
}
