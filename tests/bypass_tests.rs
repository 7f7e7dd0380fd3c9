use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{any, header, method, path},
    Mock, MockServer, ResponseTemplate,
};
use wp_recon::probe::ProbeClient;
use wp_recon::waf::BypassStrategy;

fn strategy() -> BypassStrategy {
    BypassStrategy::new(ProbeClient::new(4).unwrap(), Duration::from_secs(5), CancellationToken::new())
}

#[tokio::test]
async fn non_forbidden_status_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let url = format!("{}/secret.php", mock_server.uri());
    for status in [200, 301, 404, 500] {
        assert!(strategy().attempt(&url, status).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn header_family_stops_at_first_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secret.php"))
        .and(header("X-Forwarded-For", "127.0.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secret.php"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let url = format!("{}/secret.php", mock_server.uri());
    let methods = strategy().attempt(&url, 403).await.unwrap();
    assert_eq!(methods, vec!["Header bypass: X-Forwarded-For: 127.0.0.1".to_string()]);
}

#[tokio::test]
async fn path_family_mutates_the_path() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/..;/secret.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secret.php"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let url = format!("{}/secret.php", mock_server.uri());
    let methods = strategy().attempt(&url, 403).await.unwrap();
    assert_eq!(methods, vec!["Path bypass: /..;/".to_string()]);
}

#[tokio::test]
async fn both_families_can_contribute() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secret.php"))
        .and(header("X-Forwarded-For", "127.0.0.1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/..;/secret.php"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secret.php"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let url = format!("{}/secret.php", mock_server.uri());
    let methods = strategy().attempt(&url, 403).await.unwrap();
    assert_eq!(methods.len(), 2);
    assert!(methods[0].starts_with("Header bypass:"));
    assert!(methods[1].starts_with("Path bypass:"));
}

#[tokio::test]
async fn unreachable_target_is_not_an_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{}/secret.php", addr);
    let methods = strategy().attempt(&url, 403).await.unwrap();
    assert!(methods.is_empty());
}

#[tokio::test]
async fn cancelled_strategy_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let strategy = BypassStrategy::new(ProbeClient::new(4).unwrap(), Duration::from_secs(5), cancel);
    let url = format!("{}/secret.php", mock_server.uri());
    assert!(strategy.attempt(&url, 403).await.unwrap().is_empty());
}
