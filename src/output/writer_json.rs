use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::output::report::Report;

/// `wordpress_recon_<domain>_<epoch>.json`, dots in the domain replaced by underscores.
pub fn report_file_name(domain: &str, epoch_secs: i64) -> String {
    let safe: String = domain
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("wordpress_recon_{}_{}.json", safe, epoch_secs)
}

/// Write the report as pretty JSON into `out_dir`, creating the directory if needed.
///
/// The file is written to a temporary sibling first and renamed into place, so an
/// interrupted write never leaves a truncated report behind.
pub fn write_report(out_dir: &Path, report: &Report) -> Result<PathBuf, ScanError> {
    crate::utils::ensure_dir(out_dir).map_err(|source| ScanError::ReportWrite {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let name = report_file_name(&report.target_domain, chrono::Utc::now().timestamp());
    let path = out_dir.join(name);
    let tmp = path.with_extension("json.partial");

    let data = serde_json::to_vec_pretty(report)?;
    std::fs::write(&tmp, data).map_err(|source| ScanError::ReportWrite { path: tmp.clone(), source })?;
    std::fs::rename(&tmp, &path).map_err(|source| ScanError::ReportWrite { path: path.clone(), source })?;
    Ok(path)
}

pub fn read_report(path: &Path) -> anyhow::Result<Report> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
