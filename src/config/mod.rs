use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External downloader configuration
    pub downloader: DownloaderConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// yt-dlp binary to invoke
    pub yt_dlp_path: String,

    /// Format selector passed to `-f` for video downloads
    pub video_format: String,

    /// Target codec for audio extraction
    pub audio_format: String,

    /// Audio quality passed to `--audio-quality` (0 is best)
    pub audio_quality: String,

    /// Subtitle format requested with `--sub-format`
    pub caption_format: String,

    /// Caption language tried before falling back to any language
    pub caption_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output directory used when none is given on the command line
    pub output_dir: PathBuf,

    /// Reuse files that already exist instead of downloading again
    pub skip_existing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downloader: DownloaderConfig {
                yt_dlp_path: "yt-dlp".to_string(),
                video_format: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"
                    .to_string(),
                audio_format: "mp3".to_string(),
                audio_quality: "0".to_string(),
                caption_format: "vtt".to_string(),
                caption_language: "en".to_string(),
            },
            app: AppConfig {
                output_dir: PathBuf::from("downloads"),
                skip_existing: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("ytfetch").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.downloader.yt_dlp_path.is_empty() {
            anyhow::bail!("yt-dlp path must not be empty");
        }

        if !matches!(self.downloader.caption_format.as_str(), "vtt" | "srt") {
            anyhow::bail!(
                "Unsupported caption format '{}' (expected vtt or srt)",
                self.downloader.caption_format
            );
        }

        Ok(())
    }
}
