//! Binary entrypoint for the scroll-driven frame animation viewer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use praline_reel::config::Configuration;
use praline_reel::events::FramesReady;
use praline_reel::region::RegionKind;
use praline_reel::tasks::{self, loader::DiskFetcher, loader::PreloadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "praline-reel",
    version,
    about = "Scroll-driven image-sequence animation viewer"
)]
struct Cli {
    /// Path to YAML config; built-in defaults apply when omitted
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory frame templates are resolved against
    #[arg(long, value_name = "DIR")]
    asset_root: Option<PathBuf>,

    /// Preload both frame sequences, print their reports and exit
    #[arg(long)]
    preload_only: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("praline_reel={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("wgpu_core=warn".parse()?)
        .add_directive("naga=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Configuration> {
    let mut cfg = match cli.config.as_ref() {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(root) = cli.asset_root.clone() {
        cfg.asset_root = root;
    }
    cfg.validated().context("invalid configuration values")
}

fn preload_options(cfg: &Configuration, kind: RegionKind) -> PreloadOptions {
    let region = cfg.region(kind);
    PreloadOptions {
        frame_count: region.frame_count,
        timeout: region.preload_timeout,
        policy: region.dimension_policy,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = load_config(&cli)?;
    info!(
        asset_root = %cfg.asset_root.display(),
        main = %cfg.main.frames,
        footer = %cfg.footer.frames,
        "configuration loaded"
    );

    if cli.preload_only {
        return run_preload_only(&cfg).await;
    }

    let (ready_tx, ready_rx) = mpsc::channel::<FramesReady>(RegionKind::ALL.len());
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();
    for kind in RegionKind::ALL {
        let fetcher = Arc::new(DiskFetcher::new(cfg.frame_source(kind)));
        let opts = preload_options(&cfg, kind);
        let ready_tx = ready_tx.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            tasks::loader::run(kind, fetcher, opts, ready_tx, cancel)
                .await
                .with_context(|| format!("{kind} loader task failed"))
        });
    }
    drop(ready_tx);

    // Runs on the main thread until the window closes or cancellation occurs.
    if let Err(e) =
        tasks::viewer::run_windowed(cfg, ready_rx, cancel.clone()).context("viewer failed")
    {
        tracing::error!("{e:?}");
    }
    cancel.cancel();

    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

async fn run_preload_only(cfg: &Configuration) -> Result<()> {
    for kind in RegionKind::ALL {
        let source = cfg.frame_source(kind);
        let fetcher = Arc::new(DiskFetcher::new(source.clone()));
        let (_, report) = tasks::loader::preload(fetcher, &preload_options(cfg, kind)).await;
        println!(
            "{kind}: {}/{} loaded, {} failed, {} pending{} in {} ({})",
            report.loaded,
            report.total,
            report.failed,
            report.pending,
            if report.timed_out { " (timed out)" } else { "" },
            humantime::format_duration(Duration::from_millis(report.elapsed.as_millis() as u64)),
            source.root().join(source.template().trim_start_matches('/')).display(),
        );
    }
    Ok(())
}
