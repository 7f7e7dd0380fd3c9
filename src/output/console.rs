use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::sync::mpsc;

use crate::output::events::{HostSource, ScanEvent};
use crate::output::report::{FindingCategory, Report};

const RED: &str = "\x1b[91m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const BLUE: &str = "\x1b[94m";
const PURPLE: &str = "\x1b[95m";
const CYAN: &str = "\x1b[96m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn category_line(category: FindingCategory, url: &str, status: u16, methods: Option<&[String]>) -> String {
    match category {
        FindingCategory::Sensitive => format!("{RED}[!!!] SENSITIVE: {url} ({status}) - may contain credentials{RESET}"),
        FindingCategory::Bypassed => format!(
            "{GREEN}[✓] 403 Bypassed: {url} - {}{RESET}",
            methods.map(|m| m.join(", ")).unwrap_or_default()
        ),
        FindingCategory::Forbidden => format!("{YELLOW}[!] Forbidden: {url} (403){RESET}"),
        FindingCategory::Redirect => format!("{CYAN}[→] Redirect: {url} ({status}){RESET}"),
        FindingCategory::Found => format!("{GREEN}[✓] Found: {url} ({status}){RESET}"),
    }
}

/// One console line per event, or `None` for events that only move the progress bar.
pub fn render(event: &ScanEvent) -> Option<String> {
    let line = match event {
        ScanEvent::PhaseChanged { phase } => match *phase {
            "discovering" => format!("\n{BLUE}[+] Starting subdomain discovery (DNS + certificate transparency)...{RESET}"),
            "scanning" => format!("\n{BLUE}[+] Starting comprehensive scan of all subdomains...{RESET}"),
            _ => return None,
        },
        ScanEvent::HostFound { host, source } => {
            let via = match source {
                HostSource::Dns => "dns",
                HostSource::CertificateTransparency => "ct",
                HostSource::Target => "target",
            };
            format!("{GREEN}[✓] Found: {host} ({via}){RESET}")
        }
        ScanEvent::DiscoveryFinished { dns, ct, total } => {
            format!("{CYAN}[i] Total subdomains found: {total} (dns: {dns}, ct: {ct}){RESET}")
        }
        ScanEvent::HostLive { url, status, size } => {
            format!("{CYAN}[i] {url} - Status: {status}, Size: {size} bytes{RESET}")
        }
        ScanEvent::HostUnreachable { host } => format!("{RED}[!] No HTTP/HTTPS response from {host}{RESET}"),
        ScanEvent::WordPressDetected { url, files } => {
            let files = if files.is_empty() { "none".to_string() } else { files.join(", ") };
            format!("{GREEN}[WordPress] Detected on {url} (files: {files}){RESET}")
        }
        ScanEvent::NotWordPress { url } => format!("{YELLOW}[i] Not a WordPress site: {url}{RESET}"),
        ScanEvent::SweepStarted { url, list } => format!("{YELLOW}[+] Scanning {list} files for {url}...{RESET}"),
        ScanEvent::FindingRecorded { category, finding } => {
            category_line(*category, &finding.url, finding.status, finding.bypass_methods.as_deref())
        }
        ScanEvent::TaskFailed { host, error } => format!("{RED}[!] Scan of {host} failed: {error}{RESET}"),
        ScanEvent::HostScanned { .. } => return None,
        ScanEvent::ScanCompleted { interrupted: true, .. } => {
            format!("\n{RED}[!] Scan interrupted by user - reporting partial results{RESET}")
        }
        ScanEvent::ScanCompleted { .. } => return None,
    };
    Some(line)
}

/// Print events as they arrive, with a progress bar over the scan phase.
pub fn spawn_console(mut rx: mpsc::UnboundedReceiver<ScanEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        while let Some(event) = rx.recv().await {
            match &event {
                ScanEvent::DiscoveryFinished { total, .. } => {
                    let pb = ProgressBar::new(*total as u64);
                    if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} hosts") {
                        pb.set_style(style);
                    }
                    bar = Some(pb);
                }
                ScanEvent::HostScanned { .. } => {
                    if let Some(pb) = &bar {
                        pb.inc(1);
                    }
                }
                ScanEvent::ScanCompleted { .. } => {
                    if let Some(pb) = bar.take() {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
            if let Some(line) = render(&event) {
                match &bar {
                    Some(pb) => pb.println(line),
                    None => println!("{}", line),
                }
            }
        }
    })
}

pub fn print_banner(domain: &str, threads: usize, timeout_secs: u64) {
    println!("{CYAN}{BOLD}");
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║            WordPress Subdomain Scanner & Recon Tool              ║");
    println!("║               For Bug Bounty & Security Research                 ║");
    println!("╚══════════════════════════════════════════════════════════════════╝{RESET}");
    println!("{YELLOW}Target Domain: {RESET}{domain}");
    println!("{YELLOW}Threads: {RESET}{threads}");
    println!("{YELLOW}Timeout: {RESET}{timeout_secs}s");
}

pub fn print_disclaimer() {
    println!("\n{RED}{BOLD}LEGAL DISCLAIMER:{RESET}");
    println!("{YELLOW}This tool is for authorized security testing only.");
    println!("Ensure you have explicit permission before scanning any domain.");
    println!("Unauthorized scanning may violate laws and terms of service.{RESET}");
}

/// Final results block, grouped by category.
pub fn print_summary(report: &Report, report_path: Option<&Path>) {
    println!("\n{BOLD}{CYAN}{}", "=".repeat(60));
    println!("                    SCAN RESULTS SUMMARY");
    println!("{}{RESET}", "=".repeat(60));

    println!("\n{YELLOW}Target Domain: {RESET}{}", report.target_domain);
    println!("{YELLOW}Subdomains Found: {RESET}{}", report.subdomains_found.len());
    println!("{YELLOW}WordPress Sites: {RESET}{}", report.wordpress_sites.len());
    println!("{YELLOW}Total Findings: {RESET}{}", report.total_findings);

    if !report.wordpress_sites.is_empty() {
        println!("\n{GREEN}[WordPress Sites Found]{RESET}");
        for (i, site) in report.wordpress_sites.iter().enumerate() {
            let files: Vec<&str> = site.wp_files_detected.iter().map(String::as_str).collect();
            println!("\n{CYAN}  {}. {}{RESET}", i + 1, site.url);
            println!("     Status: {}", site.status);
            println!("     WP Files Detected: {}", if files.is_empty() { "None".to_string() } else { files.join(", ") });
            println!("     Findings: {}", site.findings.len());
        }
    }

    let sensitive: Vec<_> = report.sensitive_findings().collect();
    if !sensitive.is_empty() {
        println!("\n{RED}[!!!] CRITICAL FINDINGS - Potential Sensitive Data Exposure{RESET}");
        for f in sensitive {
            println!("  {RED}{}{RESET}", f.url);
        }
    }

    let bypassed: Vec<_> = report.bypassed_findings().collect();
    if !bypassed.is_empty() {
        println!("\n{YELLOW}[!] 403 BYPASS SUCCESSFUL{RESET}");
        for f in bypassed {
            let methods = f.bypass_methods.as_deref().unwrap_or_default().join(", ");
            println!("  {YELLOW}{} - {}{RESET}", f.url, methods);
        }
    }

    let accessible: Vec<_> = report.accessible_findings().collect();
    if !accessible.is_empty() {
        println!("\n{GREEN}[✓] ACCESSIBLE FILES/DIRECTORIES{RESET}");
        for f in accessible {
            println!("  {GREEN}{}{RESET}", f.url);
        }
    }

    if let Some(path) = report_path {
        println!("\n{CYAN}[i] Detailed report saved to: {}{RESET}", path.display());
    }
    if report.interrupted {
        println!("\n{PURPLE}{BOLD}Scan interrupted; report contains partial results.{RESET}");
    } else {
        println!("\n{BOLD}{GREEN}Scan completed successfully!{RESET}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::report::{Finding, FindingKind};

    #[test]
    fn renders_findings_by_category() {
        let mut finding = Finding::new("http://a.example.com/.env", 200, 12, FindingKind::SensitiveFile);
        finding.sensitive_content = Some(true);
        let line = render(&ScanEvent::FindingRecorded { category: finding.category(), finding }).unwrap();
        assert!(line.contains("SENSITIVE"));
        assert!(line.contains("/.env"));
    }

    #[test]
    fn progress_only_events_render_nothing() {
        assert!(render(&ScanEvent::HostScanned { host: "a.example.com".into(), findings: 0 }).is_none());
    }
}
