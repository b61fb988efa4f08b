mod cli;
mod commands;
mod utils;

use anyhow::Result;
use clap::Parser;
use crate::cli::Strategy;
use splitdl::{DownloaderConfig, ProxyConfig, QualityChoice};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Direct URL of the file to download
    #[arg(index = 1)]
    url: Option<String>,

    /// Resolver JSON: one target or {"qualities": {"720": target, ...}}; skips probing
    #[arg(long)]
    target: Option<PathBuf>,

    /// Quality to download: 'highest' or a number such as 720
    #[arg(short = 'q', long, default_value = "highest")]
    quality: QualityChoice,

    /// Where to save the file (defaults to the URL's file name)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Number of concurrent range requests
    #[arg(short = 't', long, default_value_t = 5)]
    threads: usize,

    /// Download strategy
    #[arg(short = 's', long, value_enum, default_value = "auto")]
    strategy: Strategy,

    /// SOCKS5 proxy address (host:port)
    #[arg(long)]
    socks5: Option<String>,

    /// SOCKS5 proxy username
    #[arg(long = "socks5-user", requires = "socks5")]
    socks5_user: Option<String>,

    /// SOCKS5 proxy password
    #[arg(long = "socks5-pass", requires = "socks5")]
    socks5_pass: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = DownloaderConfig {
        request_timeout: args.timeout.map(Duration::from_secs),
        proxy: args.socks5.map(|address| ProxyConfig {
            address,
            username: args.socks5_user,
            password: args.socks5_pass,
        }),
        ..DownloaderConfig::default()
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        crate::commands::run_single_download(
            args.url,
            args.target,
            args.quality,
            args.output,
            args.threads,
            args.strategy,
            config,
        )
        .await
    })
}
