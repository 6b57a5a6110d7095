//! Webhook delivery against a local mock server

use ddns_core::traits::Notifier;
use ddns_core::Error;
use ddns_notify_webhook::WebhookNotifier;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn message_lands_in_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/push/Domain%20www.example.com%20now%20resolves%20to%201.2.3.4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier =
        WebhookNotifier::new(format!("{}/push/{{msg}}", server.uri()), Duration::from_secs(2))
            .unwrap();

    notifier
        .notify("Domain www.example.com now resolves to 1.2.3.4")
        .await
        .unwrap();
}

#[tokio::test]
async fn message_lands_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/send"))
        .and(query_param("title", "ip changed & more"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(
        format!("{}/send?title={{msg}}", server.uri()),
        Duration::from_secs(2),
    )
    .unwrap();

    notifier.notify("ip changed & more").await.unwrap();
}

#[tokio::test]
async fn non_success_status_is_notify_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let notifier =
        WebhookNotifier::new(format!("{}/{{msg}}", server.uri()), Duration::from_secs(2)).unwrap();

    let err = notifier.notify("hello").await.unwrap_err();
    assert!(matches!(err, Error::Notify(_)), "got {:?}", err);
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(
        format!("{}/{{msg}}", server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();

    assert!(matches!(notifier.notify("hello").await, Err(Error::Notify(_))));
}
