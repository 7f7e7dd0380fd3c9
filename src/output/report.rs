use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    WordpressFile,
    SensitiveFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub url: String,
    pub status: u16,
    pub size: usize,
    #[serde(rename = "type")]
    pub kind: FindingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitive_content: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_methods: Option<Vec<String>>,
}

impl Finding {
    pub fn new(url: impl Into<String>, status: u16, size: usize, kind: FindingKind) -> Self {
        Self {
            url: url.into(),
            status,
            size,
            kind,
            sensitive_content: None,
            bypass_methods: None,
        }
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive_content.unwrap_or(false)
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass_methods.as_ref().map_or(false, |m| !m.is_empty())
    }

    /// Console category of this finding.
    pub fn category(&self) -> FindingCategory {
        if self.is_sensitive() {
            FindingCategory::Sensitive
        } else if self.is_bypassed() {
            FindingCategory::Bypassed
        } else {
            match self.status {
                403 => FindingCategory::Forbidden,
                301 | 302 => FindingCategory::Redirect,
                _ => FindingCategory::Found,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Found,
    Forbidden,
    Redirect,
    Bypassed,
    Sensitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPressSite {
    pub url: String,
    pub subdomain: String,
    pub status: u16,
    pub wp_files_detected: BTreeSet<String>,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub target_domain: String,
    pub scan_timestamp: String,
    pub subdomains_found: BTreeSet<String>,
    pub wordpress_sites: Vec<WordPressSite>,
    pub total_findings: usize,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub interrupted: bool,
}

impl Report {
    pub fn new(target_domain: impl Into<String>) -> Self {
        Self {
            target_domain: target_domain.into(),
            scan_timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            subdomains_found: BTreeSet::new(),
            wordpress_sites: Vec::new(),
            total_findings: 0,
            findings: Vec::new(),
            interrupted: false,
        }
    }

    pub fn sensitive_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_sensitive())
    }

    pub fn bypassed_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_bypassed())
    }

    /// 200 responses not already listed as sensitive.
    pub fn accessible_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.status == 200 && !f.is_sensitive())
    }
}

/// What one host task produced, merged into the report in a single append.
#[derive(Debug, Default, Clone)]
pub struct HostOutcome {
    pub wordpress_sites: Vec<WordPressSite>,
    /// Findings from URLs that were not classified as WordPress.
    pub findings: Vec<Finding>,
}

impl HostOutcome {
    pub fn is_empty(&self) -> bool {
        self.wordpress_sites.is_empty() && self.findings.is_empty()
    }

    pub fn finding_count(&self) -> usize {
        self.wordpress_sites.iter().map(|s| s.findings.len()).sum::<usize>() + self.findings.len()
    }
}

/// The report aggregate shared by all scan tasks. Every mutation takes the lock.
#[derive(Debug, Clone)]
pub struct SharedReport {
    inner: Arc<Mutex<Report>>,
}

impl SharedReport {
    pub fn new(report: Report) -> Self {
        Self { inner: Arc::new(Mutex::new(report)) }
    }

    pub fn set_hosts<I: IntoIterator<Item = String>>(&self, hosts: I) {
        self.inner.lock().subdomains_found = hosts.into_iter().collect();
    }

    /// Merge a finished host task. WordPress findings land in both the site and the flat list.
    pub fn merge(&self, outcome: HostOutcome) {
        let mut report = self.inner.lock();
        for site in outcome.wordpress_sites {
            report.findings.extend(site.findings.iter().cloned());
            report.wordpress_sites.push(site);
        }
        report.findings.extend(outcome.findings);
        report.total_findings = report.findings.len();
    }

    pub fn mark_interrupted(&self) {
        self.inner.lock().interrupted = true;
    }

    /// Take the final report. Clones only if a task still holds a handle.
    pub fn into_report(self) -> Report {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(path: &str, status: u16) -> Finding {
        Finding::new(format!("http://a.example.com/{}", path), status, 10, FindingKind::SensitiveFile)
    }

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_value(finding(".env", 200)).unwrap();
        assert_eq!(json["type"], "sensitive_file");
        assert!(json.get("sensitive_content").is_none());
        assert!(json.get("bypass_methods").is_none());
    }

    #[test]
    fn merge_duplicates_wordpress_findings_into_flat_list() {
        let shared = SharedReport::new(Report::new("example.com"));
        let site = WordPressSite {
            url: "http://a.example.com".into(),
            subdomain: "a.example.com".into(),
            status: 200,
            wp_files_detected: BTreeSet::from(["wp-login.php".to_string()]),
            findings: vec![finding("wp-login.php", 200)],
        };
        shared.merge(HostOutcome {
            wordpress_sites: vec![site],
            findings: vec![finding(".env", 403)],
        });
        let report = shared.into_report();
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.total_findings, 2);
        assert!(report.findings.contains(&report.wordpress_sites[0].findings[0]));
    }

    #[test]
    fn categories() {
        let mut f = finding("admin/", 403);
        assert_eq!(f.category(), FindingCategory::Forbidden);
        f.bypass_methods = Some(vec!["Path bypass: /..;/".into()]);
        assert_eq!(f.category(), FindingCategory::Bypassed);
        assert_eq!(finding("old/", 301).category(), FindingCategory::Redirect);
        let mut f = finding(".env", 200);
        f.sensitive_content = Some(true);
        assert_eq!(f.category(), FindingCategory::Sensitive);
    }
}
