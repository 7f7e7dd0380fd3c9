use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};
use wp_recon::discover::crtsh::crtsh_subdomains;
use wp_recon::discover::{HostSet, StaticResolver, SubdomainDiscoverer};
use wp_recon::http_client::create_ct_client;
use wp_recon::output::EventSink;
use wp_recon::DiscoveryError;

const CT_BODY: &str = r#"[
    {"name_value": "api.example.com\nwww.example.com"},
    {"name_value": "*.example.com"},
    {"name_value": "evil-example.com"},
    {"name_value": "API.example.com"}
]"#;

async fn ct_server(status: u16, body: &str) -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", "%.example.com"))
        .and(query_param("output", "json"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&mock_server)
        .await;
    mock_server
}

fn discoverer(ct_url: Option<String>) -> SubdomainDiscoverer {
    SubdomainDiscoverer {
        ct_client: create_ct_client().unwrap(),
        resolver: Arc::new(StaticResolver::new(["www.example.com", "mail.example.com"])),
        words: vec!["www".into(), "mail".into(), "ftp".into()],
        threads: 4,
        ct_url,
        timeout: Duration::from_secs(5),
        events: EventSink::disabled(),
        cancel: CancellationToken::new(),
    }
}

#[tokio::test]
async fn ct_query_returns_scoped_names() {
    let mock_server = ct_server(200, CT_BODY).await;
    let client = create_ct_client().unwrap();
    let endpoint = format!("{}/", mock_server.uri());

    let names = crtsh_subdomains(&client, &endpoint, "example.com", Duration::from_secs(5)).await.unwrap();
    assert_eq!(names, vec!["api.example.com".to_string(), "www.example.com".to_string()]);
}

#[tokio::test]
async fn ct_error_status_is_reported() {
    let mock_server = ct_server(502, "bad gateway").await;
    let client = create_ct_client().unwrap();
    let endpoint = format!("{}/", mock_server.uri());

    let err = crtsh_subdomains(&client, &endpoint, "example.com", Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, DiscoveryError::Status(502)));
}

#[tokio::test]
async fn both_producers_merge_into_one_set() {
    let mock_server = ct_server(200, CT_BODY).await;
    let hosts = HostSet::new("example.com");
    let stats = discoverer(Some(format!("{}/", mock_server.uri()))).discover(&hosts).await;

    let frozen = hosts.freeze();
    for host in ["example.com", "www.example.com", "mail.example.com", "api.example.com"] {
        assert!(frozen.contains(host), "missing {}", host);
    }
    assert_eq!(frozen.len(), 4);
    // www is reported by both producers; whichever lands first counts it.
    assert_eq!(stats.dns + stats.ct, 3);
}

#[tokio::test]
async fn malformed_ct_body_degrades_to_dns_only() {
    let mock_server = ct_server(200, "<html>rate limited</html>").await;
    let hosts = HostSet::new("example.com");
    let stats = discoverer(Some(format!("{}/", mock_server.uri()))).discover(&hosts).await;

    assert_eq!(stats.ct, 0);
    assert_eq!(stats.dns, 2);
    assert_eq!(hosts.len(), 3);
}

#[tokio::test]
async fn snapshot_is_a_phase_barrier() {
    let hosts = HostSet::new("example.com");
    discoverer(None).discover(&hosts).await;
    let frozen = hosts.freeze();
    let before = frozen.to_vec();

    assert!(hosts.insert("late.example.com"));
    assert_eq!(frozen.to_vec(), before);
    assert!(!frozen.contains("late.example.com"));
    assert_eq!(hosts.len(), frozen.len() + 1);
}
