use std::path::Path;

use crate::error::DiscoveryError;

/// Subdomain prefixes tried by the DNS bruteforce.
pub const SUBDOMAIN_WORDS: &[&str] = &[
    "www", "mail", "remote", "blog", "webmail", "server", "ns1", "ns2",
    "smtp", "secure", "vpn", "admin", "www2", "test", "dev", "staging",
    "api", "app", "forum", "ftp", "shop", "news", "portal", "demo",
    "old", "backup", "mobile", "cdn", "static", "beta", "alpha",
    "login", "panel", "control", "wp", "wordpress", "cms", "support",
    "help", "assets", "media", "files", "docs", "download", "uploads",
];

/// WordPress-specific files and directories.
pub const WORDPRESS_PATHS: &[&str] = &[
    "wp-admin/", "wp-content/", "wp-includes/", "wp-config.php",
    "wp-login.php", "wp-cron.php", "wp-load.php", "wp-blog-header.php",
    "wp-config.php.bak", "wp-config.txt", "wp-config.old",
    "wp-content/uploads/", "wp-content/themes/", "wp-content/plugins/",
    "wp-content/debug.log", "wp-content/backup-db/", "wp-content/cache/",
    "xmlrpc.php", "readme.html", "license.txt", "wp-trackback.php",
    "wp-admin/admin-ajax.php", "wp-admin/install.php",
];

/// Config, backup, log and admin paths common to any web application.
pub const SENSITIVE_PATHS: &[&str] = &[
    ".env", ".env.local", ".env.production", ".env.development",
    "config.php", "configuration.php", "settings.php", "config.ini",
    "database.php", "db.php", "connect.php", "connection.php",
    "backup.sql", "dump.sql", "database.sql", "db_backup.sql",
    "robots.txt", "sitemap.xml", "crossdomain.xml", "phpinfo.php",
    "info.php", "test.php", "debug.php", "error_log", "access.log",
    ".htaccess", ".htpasswd", "web.config", "server-status",
    "server-info", "admin/", "administrator/", "manager/", "control/",
    "cpanel/", "plesk/", "phpmyadmin/", "pma/", "mysql/",
    "adminer.php", "sql.php", "backup/", "backups/", "old/",
    "temp/", "tmp/", "cache/", "logs/", "log/", "uploads/",
    "files/", "documents/", "docs/", "downloads/", "images/",
    "private/", "conf/", "config/", "include/", "inc/",
    "application.yml", "application.properties", "app.properties",
];

/// Endpoints whose presence marks a WordPress install.
pub const WORDPRESS_PROBES: [&str; 3] = ["wp-login.php", "xmlrpc.php", "wp-admin/"];

/// Page-body markers of a WordPress install.
pub const WORDPRESS_INDICATORS: &[&str] = &[
    "/wp-content/",
    "/wp-includes/",
    "wp-json",
    "wordpress",
    "wp-admin",
    "xmlrpc.php",
];

/// Keywords that flag a readable file as possibly holding credentials.
pub const SENSITIVE_KEYWORDS: &[&str] =
    &["password", "secret", "key", "token", "database", "mysql", "postgres"];

/// Load a newline-delimited wordlist, skipping blanks and `#` comments.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, DiscoveryError> {
    let data = std::fs::read_to_string(path).map_err(|source| DiscoveryError::Wordlist {
        path: path.to_path_buf(),
        source,
    })?;
    let mut words: Vec<String> = data
        .lines()
        .map(|l| l.trim().trim_matches('.').to_lowercase())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();
    words.sort();
    words.dedup();
    Ok(words)
}

pub fn default_subdomain_words() -> Vec<String> {
    SUBDOMAIN_WORDS.iter().map(|s| s.to_string()).collect()
}
