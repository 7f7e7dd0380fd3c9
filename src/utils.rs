use std::fs;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Lower-case a host name and strip a trailing root dot.
pub fn normalize_host(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}

/// True when `name` is `domain` itself or a proper subdomain of it.
pub fn is_within_domain(name: &str, domain: &str) -> bool {
    if name.is_empty() || name.starts_with('*') {
        return false;
    }
    name == domain || name.ends_with(&format!(".{}", domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_membership() {
        assert!(is_within_domain("example.com", "example.com"));
        assert!(is_within_domain("a.b.example.com", "example.com"));
        assert!(!is_within_domain("badexample.com", "example.com"));
        assert!(!is_within_domain("*.example.com", "example.com"));
        assert!(!is_within_domain("example.com.evil.net", "example.com"));
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_host(" WWW.Example.com. "), "www.example.com");
    }
}
