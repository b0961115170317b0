// Command-line front end for the site mirroring engine.
//
// Crawls a site in a headless Chromium session, prints the manifest summary
// and downloads everything into the mirror root. Ctrl-C cancels the run.

use anyhow::{Context, Result};
use clap::Parser;
use kodegen_tools_sitemirror::{
    CancellationToken, DownloadOptions, MirrorConfig, MirrorEventBus, SiteMirror,
    list_mirrored_sites, mirror_events::log_progress, remove_mirrored_site,
    utils::DEFAULT_EVENT_BUS_CAPACITY,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "kodegen-sitemirror",
    version,
    about = "Mirror a website into a self-contained local copy"
)]
struct Cli {
    /// Site to mirror (scheme defaults to https)
    #[arg(required_unless_present_any = ["list", "remove"])]
    url: Option<String>,

    /// Mirror root directory
    #[arg(long, short, default_value = "sites")]
    out: PathBuf,

    /// JSON download policy file
    #[arg(long)]
    options: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Stop crawling after this many pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Downloads in flight per category
    #[arg(long)]
    concurrency: Option<usize>,

    /// List mirrored sites under the mirror root and exit
    #[arg(long)]
    list: bool,

    /// Delete one mirrored site directory and exit
    #[arg(long, value_name = "NAME")]
    remove: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("chromiumoxide::handler", log::LevelFilter::Off)
        .filter_module("chromiumoxide::conn", log::LevelFilter::Off)
        .init();

    let cli = Cli::parse();

    if cli.list {
        for site in list_mirrored_sites(&cli.out).await? {
            println!("{}\t{} bytes\t{}", site.name, site.size, site.path.display());
        }
        return Ok(());
    }
    if let Some(name) = &cli.remove {
        if remove_mirrored_site(&cli.out, name).await? {
            println!("Removed {name}");
        } else {
            println!("No mirrored site named {name}");
        }
        return Ok(());
    }

    let url = cli.url.clone().context("A URL is required")?;
    let download_options = cli
        .options
        .as_deref()
        .map(DownloadOptions::load_or_default)
        .unwrap_or_default();

    let mut builder = MirrorConfig::builder()
        .mirror_root(&cli.out)
        .headless(!cli.headful)
        .max_pages(cli.max_pages)
        .download_options(download_options);
    if let Some(workers) = cli.concurrency {
        builder = builder.download_concurrency(workers);
    }
    let config = builder.build()?;

    let bus = Arc::new(MirrorEventBus::new(DEFAULT_EVENT_BUS_CAPACITY));
    let printer = tokio::spawn(log_progress(bus.subscribe()));

    let mirror = SiteMirror::new(config)?.with_event_bus(Arc::clone(&bus));

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling run");
            ctrl_c.cancel();
        }
    });

    let result = mirror.mirror_site(&url, &cancel).await;
    mirror.shutdown().await;
    // Dropping the last bus handle lets the printer drain and stop
    drop(mirror);
    drop(bus);
    if let Err(e) = printer.await {
        log::debug!("Progress printer ended abnormally: {e}");
    }

    let summary = result?;
    println!(
        "Crawled {} pages ({} faults), fetched {}, skipped {}, failed {}",
        summary.crawl.visited.len(),
        summary.crawl.faults.len(),
        summary.download.fetched,
        summary.download.skipped,
        summary.download.failed.len()
    );
    for (url, error) in &summary.download.failed {
        println!("  failed: {url}: {error}");
    }

    Ok(())
}
