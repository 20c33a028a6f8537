//! Print the canonical text and digest of a page, for checking what the
//! watcher will compare.
//!
//! Usage: `canonicalize <URL | FILE>`

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use site_watcher::config::DEFAULT_TIMEOUT_SECONDS;
use site_watcher::models::ContentHash;
use site_watcher::parsers::{canonical_text, extract_visible_text};
use site_watcher::utils::http::{Fetcher, HttpFetcher};

#[derive(Parser, Debug)]
#[command(name = "canonicalize", about = "Show the canonical text of a page")]
struct Args {
    /// http(s) URL to fetch, or path to a saved HTML file
    source: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    timeout: u64,

    /// Print raw visible fragments before normalization
    #[arg(long)]
    fragments: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let html = match url::Url::parse(&args.source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout.max(1)))?;
            fetcher
                .fetch(&url)
                .await
                .with_context(|| format!("Failed to fetch {}", url))?
        }
        _ => {
            let path = PathBuf::from(&args.source);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
    };

    if args.fragments {
        for fragment in extract_visible_text(&html) {
            println!("| {}", fragment);
        }
        println!();
    }

    let text = canonical_text(&html);
    println!("{}", text);
    println!();
    println!("lines: {}", text.lines().count());
    println!("hash:  {}", ContentHash::of(&text));

    Ok(())
}
