//! CLI binary for img2alt.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use img2alt::{process_image, Dictionary, PipelineConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Generate accessibility alt text for an image.
#[derive(Parser, Debug)]
#[command(name = "img2alt", version, about, long_about = None)]
struct Cli {
    /// Path to the image file.
    image: PathBuf,

    /// Vision-language model identifier.
    #[arg(long, env = "IMG2ALT_MODEL")]
    model: Option<String>,

    /// Chat-completions endpoint URL.
    #[arg(long, env = "IMG2ALT_API_BASE")]
    api_base: Option<String>,

    /// API key for the caption endpoint.
    #[arg(long, env = "IMG2ALT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OCR service endpoint (omit to skip text extraction).
    #[arg(long, env = "IMG2ALT_OCR_URL")]
    ocr_endpoint: Option<String>,

    /// Skip the OCR stage even when an endpoint is configured.
    #[arg(long)]
    no_ocr: bool,

    /// Dictionary entry for fuzzy correction (repeatable; replaces the default set).
    #[arg(long = "dict", value_name = "ENTRY")]
    dictionary: Vec<String>,

    /// Similarity threshold for dictionary correction (0.0–1.0).
    #[arg(long, default_value_t = 0.7)]
    threshold: f64,

    /// Maximum normalized image width in pixels.
    #[arg(long, default_value_t = 512)]
    max_width: u32,

    /// Print the full result as JSON (wire shape) instead of plain text.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = PipelineConfig::builder()
        .max_width(cli.max_width)
        .similarity_threshold(cli.threshold);

    if let Some(model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(api_base) = cli.api_base {
        builder = builder.api_base(api_base);
    }
    if let Some(api_key) = cli.api_key {
        builder = builder.api_key(api_key);
    }
    if let Some(endpoint) = cli.ocr_endpoint {
        if !cli.no_ocr {
            builder = builder.ocr_endpoint(endpoint);
        }
    }
    if !cli.dictionary.is_empty() {
        builder = builder.dictionary(Dictionary::new(cli.dictionary));
    }

    let config = builder.build()?;

    let bytes = std::fs::read(&cli.image)
        .with_context(|| format!("failed to read {}", cli.image.display()))?;
    let media_type = guess_media_type(&cli.image);

    let result = process_image(&bytes, media_type, &config)
        .await
        .with_context(|| format!("alt-text generation failed for {}", cli.image.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.alt_tag);
        if let Some(texts) = &result.ocr_texts {
            if !texts.is_empty() {
                eprintln!("recognized text:");
                for t in texts {
                    eprintln!("  {t}");
                }
            }
        }
        eprintln!(
            "({} ms total: normalize {} ms, ocr {} ms, caption {} ms)",
            result.stats.total_ms,
            result.stats.normalize_ms,
            result.stats.ocr_ms,
            result.stats.caption_ms
        );
    }

    Ok(())
}

/// Map the file extension to a media type; the pipeline only uses it as a
/// hint for the OCR upload.
fn guess_media_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
