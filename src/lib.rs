//! ytfetch - A Rust CLI tool for downloading media and caption transcripts
//!
//! This library drives yt-dlp to fetch a video, its audio track, and its
//! captions, then rewrites the caption file into a plain-text transcript
//! with timing and cue metadata stripped.

pub mod captions;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod output;
pub mod pipeline;
pub mod utils;

pub use captions::{extract_plain_text, strip_caption_markup, CaptionFormat};
pub use cli::Cli;
pub use config::Config;
pub use fetcher::{MediaFetcher, YtDlpFetcher};
pub use pipeline::{DownloadPipeline, FetchReport};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the fetcher
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Unsupported URL format: {0}")]
    UnsupportedUrl(String),

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}
