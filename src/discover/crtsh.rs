use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{DiscoveryError, ProbeError};
use crate::utils::{is_within_domain, normalize_host};

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: Option<String>,
}

/// Full query URL for `%.domain` against a crt.sh-compatible endpoint.
pub fn query_url(endpoint: &str, domain: &str) -> String {
    let q = format!("%.{}", domain);
    format!("{}?q={}&output=json", endpoint, urlencoding::encode(&q))
}

/// Extract proper subdomains of `domain` from a CT JSON array.
///
/// `name_value` may hold several newline-separated names; wildcard entries are dropped.
pub fn parse_names(body: &str, domain: &str) -> Result<Vec<String>, DiscoveryError> {
    let entries: Vec<CrtShEntry> = serde_json::from_str(body)?;
    let suffix = format!(".{}", domain);
    let mut out: Vec<String> = entries
        .into_iter()
        .filter_map(|e| e.name_value)
        .flat_map(|nv| nv.split('\n').map(normalize_host).collect::<Vec<_>>())
        .filter(|n| !n.starts_with('*') && n.ends_with(&suffix) && is_within_domain(n, domain))
        .collect();
    out.sort();
    out.dedup();
    Ok(out)
}

/// Query the CT log for names under `domain`.
pub async fn crtsh_subdomains(
    client: &Client,
    endpoint: &str,
    domain: &str,
    timeout: Duration,
) -> Result<Vec<String>, DiscoveryError> {
    let url = query_url(endpoint, domain);
    tracing::debug!("Querying CT log for domain: {}", domain);

    let resp = client
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ProbeError::from_reqwest(&url, e))?;
    if !resp.status().is_success() {
        return Err(DiscoveryError::Status(resp.status().as_u16()));
    }
    let body = resp.text().await.map_err(|e| ProbeError::from_reqwest(&url, e))?;
    let names = parse_names(&body, domain)?;
    tracing::info!("CT log found {} subdomains", names.len());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_name_records_and_drops_wildcards() {
        let body = r#"[
            {"name_value": "www.example.com\nmail.example.com"},
            {"name_value": "*.example.com"},
            {"name_value": "example.com"},
            {"name_value": "other.org"},
            {"name_value": "WWW.example.com"},
            {"common_name": "x.example.com"}
        ]"#;
        let names = parse_names(body, "example.com").unwrap();
        assert_eq!(names, vec!["mail.example.com".to_string(), "www.example.com".to_string()]);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_names("<html>rate limited</html>", "example.com").is_err());
    }

    #[test]
    fn query_is_encoded() {
        assert_eq!(
            query_url("https://crt.sh/", "example.com"),
            "https://crt.sh/?q=%25.example.com&output=json"
        );
    }
}
