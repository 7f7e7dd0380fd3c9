use anyhow::Context;
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands, ScanArgs};
use wp_recon::config::ScanConfig;
use wp_recon::discover::SystemResolver;
use wp_recon::output::{console, write_report, EventSink};
use wp_recon::scan::ScanOrchestrator;

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Keep reqwest/hyper/hickory quiet so console events stay readable.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!(
        "wp_recon={crate},reqwest=info,hyper=info,hickory_resolver=warn,hickory_proto=warn",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan(args) => run_scan(args).await,
    }
}

/// Layer CLI flags over the config file (or defaults).
fn build_config(args: &ScanArgs) -> anyhow::Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?,
        None => ScanConfig::default(),
    };
    config.domain = args.domain.clone();
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(workers) = args.scan_workers {
        config.scan_workers = workers;
    }
    if let Some(timeout) = args.file_timeout {
        config.file_timeout_secs = timeout;
    }
    if let Some(out) = &args.out {
        config.out_dir = out.clone();
    }
    if let Some(wordlist) = &args.wordlist {
        config.wordlist = Some(wordlist.clone());
    }
    if let Some(ct_url) = &args.ct_url {
        config.ct_url = ct_url.clone();
    }
    if args.no_ct {
        config.enable_ct = false;
    }
    Ok(config)
}

async fn confirm_authorization() -> anyhow::Result<bool> {
    print!("\nDo you have authorization to scan this domain? (y/N): ");
    std::io::stdout().flush()?;
    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

async fn run_scan(args: ScanArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;

    console::print_banner(&config.domain, config.threads, config.timeout_secs);
    console::print_disclaimer();

    if !args.yes && !confirm_authorization().await? {
        anyhow::bail!("scan aborted: authorization not confirmed");
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n[!] Interrupt received, finishing with partial results (Ctrl-C again to quit)...");
                cancel.cancel();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n[!] Second interrupt, exiting without a report");
                std::process::exit(130);
            }
        });
    }

    let (sink, rx) = EventSink::channel();
    let console_task = console::spawn_console(rx);

    let resolver = Arc::new(SystemResolver::new(config.timeout()));
    let orchestrator = ScanOrchestrator::new(config, resolver, sink, cancel)
        .context("invalid scan configuration")?;
    let out_dir = orchestrator.config().out_dir.clone();
    tracing::info!(domain = %orchestrator.config().domain, "Starting scan");

    let report = orchestrator.run().await.context("scan failed")?;

    // Drop the last event sender so the console drains and exits.
    drop(orchestrator);
    let _ = console_task.await;

    let path = write_report(&out_dir, &report).context("failed to write report")?;
    console::print_summary(&report, Some(&path));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from(["wp_recon", "scan", "Example.com", "--scan-workers", "4", "--no-ct", "--out", "/tmp/r"]);
        let Commands::Scan(args) = cli.command;
        let config = build_config(&args).unwrap();
        assert_eq!(config.domain, "Example.com");
        assert_eq!(config.scan_workers, 4);
        assert_eq!(config.threads, 50);
        assert!(!config.enable_ct);
        assert_eq!(config.out_dir, std::path::PathBuf::from("/tmp/r"));
    }
}
