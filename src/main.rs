// src/main.rs

use colored::*;
use env_logger::Builder;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn, LevelFilter};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use torro::cli::build_cli;
use torro::record::{DownloadStatus, JobId};
use torro::utils::initialize_download_dir;
use torro::{AppError, DownloadManager, DownloadRegistry, OutputPolicy, YtDlpFetcher, VERSION};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logger();
    info!("Torro starting up - version {}", VERSION);

    let matches = build_cli().get_matches();

    println!(
        "{}",
        "TORRO - Professional Video Downloader".bright_red().bold()
    );
    println!("{}", format!("Version: {}", VERSION).cyan());

    let urls: Vec<String> = matches
        .get_many::<String>("urls")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();
    let quiet = matches.get_flag("quiet");

    let output_dir = initialize_download_dir(
        matches.get_one::<String>("output-dir").map(|s| s.as_str()),
    )?;
    info!("Saving downloads to {:?}", output_dir);

    let mut policy = OutputPolicy {
        output_dir,
        ..OutputPolicy::default()
    };
    if let Some(chain) = matches.get_one::<String>("format") {
        policy.format_chain = chain.clone();
    }
    if matches.get_flag("playlist") {
        policy.no_playlist = false;
    }

    let registry = Arc::new(DownloadRegistry::new());
    let manager = DownloadManager::new(
        Arc::clone(&registry),
        Arc::new(YtDlpFetcher::new()),
        policy,
    );

    let mut submitted = 0usize;
    for url in &urls {
        match manager.submit(url) {
            Ok(id) => {
                debug!("Queued {} as job {}", url, id);
                submitted += 1;
            }
            Err(e) => {
                error!("Rejected submission {:?}: {}", url, e);
                eprintln!("{}: {}", "Rejected".red(), e);
            }
        }
    }

    if submitted == 0 {
        warn!("No valid URLs submitted, exiting");
        return Err(AppError::EmptyUrl);
    }

    render_until_done(&registry, quiet).await;

    let mut failures = 0usize;
    for record in registry.snapshot().iter().rev() {
        match record.status {
            DownloadStatus::Completed => {
                println!("{} {}", "Completed:".green(), record.title);
            }
            DownloadStatus::Error => {
                failures += 1;
                println!(
                    "{} {} ({})",
                    "Failed:".red(),
                    record.url,
                    record.error_message.as_deref().unwrap_or("unknown error")
                );
            }
            DownloadStatus::Cancelled => {
                println!("{} {}", "Cancelled:".yellow(), record.url);
            }
            _ => {}
        }
    }

    if failures > 0 {
        return Err(AppError::General(format!(
            "{} download(s) failed",
            failures
        )));
    }

    info!("All downloads finished");
    Ok(())
}

/// Poll registry snapshots and keep one progress bar per job until every
/// record reaches a terminal state. Rendering only ever reads snapshots;
/// the workers never wait on the display.
async fn render_until_done(registry: &Arc<DownloadRegistry>, quiet: bool) {
    let multi = MultiProgress::new();
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {percent}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let mut bars: HashMap<JobId, ProgressBar> = HashMap::new();
    let mut notify_rx = registry.subscribe();
    let mut tick = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            res = notify_rx.recv() => {
                if res.is_err() {
                    // Lagged notifications just mean we re-render from a
                    // fresh snapshot, which happens below anyway.
                    notify_rx = registry.subscribe();
                }
            }
        }

        let snapshot = registry.snapshot();
        if !quiet {
            for record in &snapshot {
                let bar = bars.entry(record.id).or_insert_with(|| {
                    let bar = multi.add(ProgressBar::new(100));
                    bar.set_style(style.clone());
                    bar
                });
                bar.set_position(record.progress as u64);
                let speed = if record.speed.is_empty() {
                    String::new()
                } else {
                    format!(" @ {}", record.speed)
                };
                bar.set_message(format!("{} [{}]{}", record.title, record.status, speed));
                if record.is_finished() && !bar.is_finished() {
                    bar.finish();
                }
            }
        }

        if !snapshot.is_empty() && snapshot.iter().all(|r| r.is_finished()) {
            break;
        }
    }
}

/// Initialize the logger with a custom format and configuration
fn init_logger() {
    // Create a custom logger builder
    let mut builder = Builder::from_default_env();

    // Set the default level based on debug/release mode
    if cfg!(debug_assertions) {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }

    // Define a custom format with timestamp, level, module, and message
    builder.format(|buf, record| {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(
            buf,
            "[{} {} {}] {}",
            timestamp,
            record.level().to_string().to_uppercase(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    // Allow override through RUST_LOG environment variable
    builder.parse_env("RUST_LOG");

    builder.init();
}
