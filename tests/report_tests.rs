use std::collections::{BTreeSet, HashSet};
use wp_recon::output::{
    read_report, write_report, Finding, FindingKind, HostOutcome, Report, SharedReport, WordPressSite,
};

fn sample_report() -> Report {
    let shared = SharedReport::new(Report::new("example.com"));
    shared.set_hosts(["example.com".to_string(), "blog.example.com".to_string()]);

    let mut config = Finding::new("https://blog.example.com/wp-config.php", 403, 0, FindingKind::WordpressFile);
    config.bypass_methods = Some(vec!["Path bypass: /..;/".into()]);
    let mut env = Finding::new("https://blog.example.com/.env", 200, 42, FindingKind::SensitiveFile);
    env.sensitive_content = Some(true);

    shared.merge(HostOutcome {
        wordpress_sites: vec![WordPressSite {
            url: "https://blog.example.com".into(),
            subdomain: "blog.example.com".into(),
            status: 200,
            wp_files_detected: BTreeSet::from(["wp-login.php".to_string(), "xmlrpc.php".to_string()]),
            findings: vec![config, env],
        }],
        findings: vec![Finding::new("http://example.com/robots.txt", 200, 10, FindingKind::SensitiveFile)],
    });
    shared.into_report()
}

#[test]
fn report_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let report = sample_report();

    let path = write_report(dir.path(), &report).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("wordpress_recon_example_com_"));
    assert!(name.ends_with(".json"));

    let back = read_report(&path).unwrap();
    assert_eq!(back, report);
    assert_eq!(back.total_findings, 3);
    assert_eq!(back.sensitive_findings().count(), 1);
    assert_eq!(back.bypassed_findings().count(), 1);
    assert_eq!(back.accessible_findings().count(), 1);
}

#[test]
fn report_json_field_names() {
    let json = serde_json::to_value(sample_report()).unwrap();
    for key in ["target_domain", "scan_timestamp", "subdomains_found", "wordpress_sites", "total_findings", "findings"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(json["findings"][0]["type"], "wordpress_file");
    assert_eq!(json["wordpress_sites"][0]["wp_files_detected"][1], "xmlrpc.php");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_merges_lose_nothing() {
    const TASKS: usize = 16;
    const PER_TASK: usize = 25;
    // One WordPress site with two findings plus one flat finding per merge.
    const FINDINGS_PER_MERGE: usize = 3;

    let shared = SharedReport::new(Report::new("example.com"));
    let mut handles = Vec::new();
    for t in 0..TASKS {
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..PER_TASK {
                let site_url = format!("http://h{}-{}.example.com", t, i);
                let site = WordPressSite {
                    url: site_url.clone(),
                    subdomain: format!("h{}-{}.example.com", t, i),
                    status: 200,
                    wp_files_detected: BTreeSet::from(["wp-login.php".to_string()]),
                    findings: vec![
                        Finding::new(format!("{}/wp-login.php", site_url), 200, i, FindingKind::WordpressFile),
                        Finding::new(format!("{}/.env", site_url), 403, i, FindingKind::SensitiveFile),
                    ],
                };
                shared.merge(HostOutcome {
                    wordpress_sites: vec![site],
                    findings: vec![Finding::new(format!("https://h{}-{}.example.com/robots.txt", t, i), 200, i, FindingKind::SensitiveFile)],
                });
                tokio::task::yield_now().await;
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let report = shared.into_report();
    assert_eq!(report.wordpress_sites.len(), TASKS * PER_TASK);
    assert_eq!(report.findings.len(), TASKS * PER_TASK * FINDINGS_PER_MERGE);
    assert_eq!(report.total_findings, report.findings.len());

    let flat: HashSet<&str> = report.findings.iter().map(|f| f.url.as_str()).collect();
    assert_eq!(flat.len(), report.findings.len());
    for site in &report.wordpress_sites {
        for f in &site.findings {
            assert!(flat.contains(f.url.as_str()), "{} missing from flat list", f.url);
        }
    }
}
