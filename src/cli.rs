use clap::Parser;
use std::path::PathBuf;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "WordPress subdomain scanner and recon tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Discover subdomains of a domain and scan them for WordPress and exposed files
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Target domain (e.g. example.com)
    pub domain: String,

    /// Workers for DNS bruteforce (default: 50)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Timeout in seconds for liveness checks and CT queries (default: 10)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Concurrent host scans (default: 10)
    #[arg(long)]
    pub scan_workers: Option<usize>,

    /// Timeout in seconds for file probes and bypass attempts (default: 5)
    #[arg(long)]
    pub file_timeout: Option<u64>,

    /// Output directory for the JSON report (default: ./results)
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Subdomain wordlist, one word per line
    #[arg(short = 'w', long)]
    pub wordlist: Option<PathBuf>,

    /// Skip the certificate transparency lookup
    #[arg(long, default_value_t = false)]
    pub no_ct: bool,

    /// Certificate transparency endpoint
    #[arg(long)]
    pub ct_url: Option<String>,

    /// Load base settings from a JSON config file; flags override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Confirm authorization to scan the target and skip the prompt
    #[arg(short = 'y', long, default_value_t = false)]
    pub yes: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
