use anyhow::{Context, Result};
use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

use splitdl::probe::probe;
use splitdl::{Downloader, DownloaderConfig, ProgressObserver, QualityChoice, VideoVariants};

use crate::cli::Strategy;
use crate::utils::default_output_name;

/// Shows the tracker's status line on a spinner.
struct SpinnerObserver {
    pb: ProgressBar,
}

impl ProgressObserver for SpinnerObserver {
    fn on_progress(&self, status: &str) {
        self.pb.set_message(status.to_string());
    }
}

pub async fn load_variants(path: &Path) -> Result<VideoVariants> {
    let content = fs::read_to_string(path)
        .await
        .context(format!("Failed to read target file: {:?}", path))?;
    VideoVariants::from_json(&content).context(format!("Invalid target file: {:?}", path))
}

pub async fn run_single_download(
    url: Option<String>,
    target_file: Option<PathBuf>,
    quality: QualityChoice,
    output: Option<PathBuf>,
    threads: usize,
    strategy: Strategy,
    config: DownloaderConfig,
) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(200));

    let downloader = Downloader::new(&config)
        .context("Failed to set up downloader")?
        .with_observer(Arc::new(SpinnerObserver { pb: pb.clone() }));

    let variants = match (target_file, url) {
        (Some(path), _) => load_variants(&path).await?,
        (None, Some(url)) => {
            pb.set_message("Preparing download...");
            let target = probe(downloader.client(), &url)
                .await
                .context("Failed to retrieve file details")?;
            VideoVariants::single(target)
        }
        (None, None) => anyhow::bail!("Please pass a URL or a --target file."),
    };

    if let Some(title) = &variants.title {
        info!(title = %title, "resolved video");
    }
    for (name, variant) in &variants.qualities {
        debug!(
            quality = %name,
            size = %HumanBytes(variant.total_size),
            ranges = variant.supports_ranges,
            "available"
        );
    }
    let (selected, target) = variants.select(&quality)?;
    info!(quality = %selected, "selected quality");

    let mut target = target.clone();
    target.supports_ranges = strategy.supports_ranges(target.supports_ranges);

    let output = match output {
        Some(path) => path,
        None => PathBuf::from(default_output_name(&target.url)?),
    };
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create output directory")?;
        }
    }

    info!(
        url = %target.url,
        size = %HumanBytes(target.total_size),
        ranges = target.supports_ranges,
        output = %output.display(),
        "starting download"
    );

    let result = downloader.download(&target, &output, threads).await;
    pb.finish_and_clear();
    let path = result.context(format!("Failed to download {}", target.url))?;

    let size = fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
    println!("Done! {} ({})", path.display(), HumanBytes(size));
    Ok(())
}
