use async_trait::async_trait;
use std::path::Path;

pub mod ytdlp;

pub use ytdlp::YtDlpFetcher;

use crate::Result;

/// Trait for the external downloader, one method per operation. The
/// pipeline drives these in a fixed sequence; implementations decide how
/// the underlying tool is invoked.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Resolve the media title used to name downloaded files.
    async fn fetch_title(&self, url: &str) -> Result<String>;

    /// Download the video stream to `output_path`.
    async fn fetch_video(&self, url: &str, output_path: &Path) -> Result<()>;

    /// Extract the audio track to `output_path`.
    async fn fetch_audio(&self, url: &str, output_path: &Path) -> Result<()>;

    /// Download captions next to `output_base`; the downloader appends the
    /// language tag and subtitle extension itself. A `language` of `None`
    /// requests captions in whatever language is available.
    async fn fetch_captions(
        &self,
        url: &str,
        output_base: &Path,
        language: Option<&str>,
    ) -> Result<()>;
}
