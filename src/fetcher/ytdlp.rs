use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::MediaFetcher;
use crate::config::DownloaderConfig;
use crate::{FetchError, Result};

/// Media fetcher backed by the yt-dlp binary. Every transfer is delegated
/// to the external tool; this type only assembles argument lists and
/// interprets exit codes.
pub struct YtDlpFetcher {
    binary: String,
    video_format: String,
    audio_format: String,
    audio_quality: String,
    caption_format: String,
}

impl YtDlpFetcher {
    pub fn new(config: &DownloaderConfig) -> Self {
        Self {
            binary: config.yt_dlp_path.clone(),
            video_format: config.video_format.clone(),
            audio_format: config.audio_format.clone(),
            audio_quality: config.audio_quality.clone(),
            caption_format: config.caption_format.clone(),
        }
    }

    fn title_args(&self, url: &str) -> Vec<String> {
        vec![
            "--print".to_string(),
            "title".to_string(),
            "--no-playlist".to_string(),
            url.to_string(),
        ]
    }

    fn video_args(&self, url: &str, output_path: &Path) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.video_format.clone(),
            "-o".to_string(),
            output_path.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            url.to_string(),
        ]
    }

    fn audio_args(&self, url: &str, output_path: &Path) -> Vec<String> {
        vec![
            "-x".to_string(),
            "--audio-format".to_string(),
            self.audio_format.clone(),
            "--audio-quality".to_string(),
            self.audio_quality.clone(),
            "-o".to_string(),
            output_path.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            url.to_string(),
        ]
    }

    fn caption_args(&self, url: &str, output_base: &Path, language: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "--write-subs".to_string(),
            "--sub-format".to_string(),
            self.caption_format.clone(),
        ];

        if let Some(language) = language {
            args.push("--sub-lang".to_string());
            args.push(language.to_string());
        }

        args.extend([
            "--skip-download".to_string(),
            "-o".to_string(),
            output_base.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            url.to_string(),
        ]);

        args
    }

    /// Run the downloader and capture its output, mapping a non-zero exit
    /// to `FetchError::CommandFailed` with the captured stderr.
    async fn run(&self, operation: &str, args: &[String]) -> Result<std::process::Output> {
        tracing::debug!("{}: {} {}", operation, self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(FetchError::CommandFailed {
                program: self.binary.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch_title(&self, url: &str) -> Result<String> {
        let output = self.run("title lookup", &self.title_args(url)).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn fetch_video(&self, url: &str, output_path: &Path) -> Result<()> {
        self.run("video download", &self.video_args(url, output_path))
            .await?;
        Ok(())
    }

    async fn fetch_audio(&self, url: &str, output_path: &Path) -> Result<()> {
        self.run("audio extraction", &self.audio_args(url, output_path))
            .await?;
        Ok(())
    }

    async fn fetch_captions(
        &self,
        url: &str,
        output_base: &Path,
        language: Option<&str>,
    ) -> Result<()> {
        self.run(
            "caption download",
            &self.caption_args(url, output_base, language),
        )
        .await?;
        Ok(())
    }
}
