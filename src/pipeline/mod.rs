use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::captions;
use crate::config::Config;
use crate::fetcher::MediaFetcher;
use crate::utils;
use crate::{FetchError, Result};

// The video container the default format selector resolves to.
const VIDEO_SUFFIX: &str = ".mp4";

/// Everything one invocation produced. Fields are filled in as stages
/// finish, so artifacts fetched before a failure stay in the report next
/// to the error message.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Absolute path of the downloaded video, if that stage completed
    pub video_path: Option<PathBuf>,

    /// Absolute path of the extracted audio track
    pub audio_path: Option<PathBuf>,

    /// Absolute path of the raw caption file, if any were available
    pub caption_path: Option<PathBuf>,

    /// Absolute path of the plain-text transcript derived from the captions
    pub transcript_path: Option<PathBuf>,

    /// User-facing description of the failure that stopped the run, if any
    pub error: Option<String>,
}

/// Main download pipeline: title, video, audio, captions, transcript, in
/// that order.
pub struct DownloadPipeline {
    config: Config,
    fetcher: Box<dyn MediaFetcher>,
    show_progress: bool,
}

impl DownloadPipeline {
    pub fn new(config: Config, fetcher: Box<dyn MediaFetcher>, show_progress: bool) -> Self {
        Self {
            config,
            fetcher,
            show_progress,
        }
    }

    /// Run the full sequence for one URL. This never returns an error:
    /// failures land in the report's `error` field and the artifact paths
    /// gathered up to that point stay set.
    pub async fn run(&self, url: &str, output_dir: &Path, skip_existing: bool) -> FetchReport {
        let mut report = FetchReport::default();

        if let Err(err) = self
            .execute(url, output_dir, skip_existing, &mut report)
            .await
        {
            let message = match err.downcast_ref::<FetchError>() {
                Some(FetchError::CommandFailed { .. }) => format!("Command failed: {}", err),
                _ => format!("An error occurred: {}", err),
            };
            println!("{}", message);
            report.error = Some(message);
        }

        report
    }

    async fn execute(
        &self,
        url: &str,
        output_dir: &Path,
        skip_existing: bool,
        report: &mut FetchReport,
    ) -> Result<()> {
        utils::validate_and_normalize_url(url)?;

        if let Some(domain) = utils::extract_domain(url) {
            tracing::debug!("Fetching from {}", domain);
        }

        if !output_dir.exists() {
            fs_err::create_dir_all(output_dir)?;
        }

        let title = self.fetcher.fetch_title(url).await?;
        let base = output_dir.join(utils::sanitize_filename(&title));
        println!("Processing: {}", title);

        self.video_stage(url, &base, skip_existing, report).await?;
        self.audio_stage(url, &base, skip_existing, report).await?;
        self.caption_stage(url, output_dir, &base, skip_existing, report)
            .await?;

        Ok(())
    }

    async fn video_stage(
        &self,
        url: &str,
        base: &Path,
        skip_existing: bool,
        report: &mut FetchReport,
    ) -> Result<()> {
        let video_path = path_with_suffix(base, VIDEO_SUFFIX);

        if !video_path.exists() || !skip_existing {
            println!("Downloading video...");
            let spinner = self.spinner("yt-dlp: downloading video stream");
            let result = self.fetcher.fetch_video(url, &video_path).await;
            finish(spinner);
            result?;
            println!("Video downloaded to: {}", video_path.display());
        } else {
            log_existing(&video_path);
            println!("Video already exists at: {}", video_path.display());
        }

        report.video_path = Some(std::path::absolute(&video_path)?);
        Ok(())
    }

    async fn audio_stage(
        &self,
        url: &str,
        base: &Path,
        skip_existing: bool,
        report: &mut FetchReport,
    ) -> Result<()> {
        let audio_path = path_with_suffix(base, &format!(".{}", self.config.downloader.audio_format));

        if !audio_path.exists() || !skip_existing {
            println!("Extracting audio...");
            let spinner = self.spinner("yt-dlp: extracting audio track");
            let result = self.fetcher.fetch_audio(url, &audio_path).await;
            finish(spinner);
            result?;
            println!("Audio extracted to: {}", audio_path.display());
        } else {
            log_existing(&audio_path);
            println!("Audio already exists at: {}", audio_path.display());
        }

        report.audio_path = Some(std::path::absolute(&audio_path)?);
        Ok(())
    }

    async fn caption_stage(
        &self,
        url: &str,
        output_dir: &Path,
        base: &Path,
        skip_existing: bool,
        report: &mut FetchReport,
    ) -> Result<()> {
        let mut caption_path = self.existing_caption(base);

        if caption_path.is_none() || !skip_existing {
            println!("Downloading captions...");
            let spinner = self.spinner("yt-dlp: downloading captions");
            let outcome = self.caption_tiers(url, output_dir, base).await;
            finish(spinner);

            match outcome {
                Ok(Some(found)) => caption_path = Some(found),
                // Succeeded but produced nothing; keep whatever was already
                // on disk.
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!("Caption download failed: {:#}", err);
                }
            }
        }

        match caption_path {
            Some(path) => {
                let absolute = std::path::absolute(&path)?;
                println!("Captions available at: {}", absolute.display());
                report.caption_path = Some(absolute);

                if let Some(transcript) = captions::extract_plain_text(&path)? {
                    let transcript = std::path::absolute(&transcript)?;
                    println!("Text-only captions extracted to: {}", transcript.display());
                    report.transcript_path = Some(transcript);
                }
            }
            None => println!("No captions available for this video."),
        }

        Ok(())
    }

    /// Two caption attempts: the preferred language first, then captions in
    /// any language. After the second attempt the produced file name's
    /// language tag is unpredictable, so the output directory is scanned by
    /// prefix instead of probing candidate names.
    async fn caption_tiers(
        &self,
        url: &str,
        output_dir: &Path,
        base: &Path,
    ) -> Result<Option<PathBuf>> {
        let language = self.config.downloader.caption_language.as_str();

        self.fetcher.fetch_captions(url, base, Some(language)).await?;
        if let Some(path) = self.existing_caption(base) {
            return Ok(Some(path));
        }

        tracing::debug!("No {} captions produced, retrying without a language filter", language);
        self.fetcher.fetch_captions(url, base, None).await?;
        self.scan_for_captions(output_dir, base)
    }

    /// First caption file already on disk among the candidate names, in
    /// preference order: tagged with the configured language first, then
    /// untagged.
    fn existing_caption(&self, base: &Path) -> Option<PathBuf> {
        let language = &self.config.downloader.caption_language;
        let candidates = [
            format!(".{}.vtt", language),
            format!(".{}.srt", language),
            ".vtt".to_string(),
            ".srt".to_string(),
        ];

        candidates
            .iter()
            .map(|suffix| path_with_suffix(base, suffix))
            .find(|path| path.exists())
    }

    /// Any caption file in `output_dir` named after `base`, whatever its
    /// language tag. Names are sorted so the pick is deterministic when
    /// several languages were written.
    fn scan_for_captions(&self, output_dir: &Path, base: &Path) -> Result<Option<PathBuf>> {
        let prefix = base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut names: Vec<String> = Vec::new();
        for entry in fs_err::read_dir(output_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) && (name.ends_with(".vtt") || name.ends_with(".srt")) {
                names.push(name);
            }
        }
        names.sort();

        Ok(names.first().map(|name| output_dir.join(name)))
    }

    fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        Some(spinner)
    }
}

fn finish(spinner: Option<ProgressBar>) {
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}

fn log_existing(path: &Path) {
    if let Ok(metadata) = fs_err::metadata(path) {
        tracing::debug!(
            "Keeping existing {} ({})",
            path.display(),
            utils::format_file_size(metadata.len())
        );
    }
}

/// Append `suffix` to `base` as-is; the suffix carries its own dots, e.g.
/// `.en.vtt`.
fn path_with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    const URL: &str = "https://example.com/watch?v=abc123";

    #[derive(Clone, Default)]
    struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Scripted fetcher: records calls and writes marker files where the
    /// real downloader would put its output.
    struct StubFetcher {
        log: CallLog,
        title: &'static str,
        fail_video: bool,
        fail_audio: bool,
        fail_captions: bool,
        /// Caption suffix written when a language is requested
        language_caption: Option<&'static str>,
        /// Caption suffix written on the any-language retry
        any_caption: Option<&'static str>,
    }

    impl StubFetcher {
        fn new(title: &'static str, log: CallLog) -> Self {
            Self {
                log,
                title,
                fail_video: false,
                fail_audio: false,
                fail_captions: false,
                language_caption: None,
                any_caption: None,
            }
        }

        fn command_failure() -> anyhow::Error {
            FetchError::CommandFailed {
                program: "yt-dlp".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "boom".to_string(),
            }
            .into()
        }
    }

    #[async_trait]
    impl MediaFetcher for StubFetcher {
        async fn fetch_title(&self, _url: &str) -> Result<String> {
            self.log.push("title");
            Ok(self.title.to_string())
        }

        async fn fetch_video(&self, _url: &str, output_path: &Path) -> Result<()> {
            self.log.push("video");
            if self.fail_video {
                return Err(Self::command_failure());
            }
            fs_err::write(output_path, b"stub")?;
            Ok(())
        }

        async fn fetch_audio(&self, _url: &str, output_path: &Path) -> Result<()> {
            self.log.push("audio");
            if self.fail_audio {
                return Err(Self::command_failure());
            }
            fs_err::write(output_path, b"stub")?;
            Ok(())
        }

        async fn fetch_captions(
            &self,
            _url: &str,
            output_base: &Path,
            language: Option<&str>,
        ) -> Result<()> {
            match language {
                Some(lang) => self.log.push(format!("captions:{}", lang)),
                None => self.log.push("captions:any"),
            }
            if self.fail_captions {
                return Err(Self::command_failure());
            }
            let suffix = match language {
                Some(_) => self.language_caption,
                None => self.any_caption,
            };
            if let Some(suffix) = suffix {
                fs_err::write(path_with_suffix(output_base, suffix), b"stub")?;
            }
            Ok(())
        }
    }

    fn pipeline(stub: StubFetcher) -> DownloadPipeline {
        DownloadPipeline::new(Config::default(), Box::new(stub), false)
    }

    #[tokio::test]
    async fn full_run_reports_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::default();
        let mut stub = StubFetcher::new("My Clip: Part 1!", log.clone());
        stub.language_caption = Some(".en.vtt");

        let report = pipeline(stub).run(URL, dir.path(), true).await;

        assert_eq!(report.error, None);
        let expected_base = dir.path().join("My Clip_ Part 1_");
        assert_eq!(
            report.video_path,
            Some(std::path::absolute(path_with_suffix(&expected_base, ".mp4")).unwrap())
        );
        assert_eq!(
            report.audio_path,
            Some(std::path::absolute(path_with_suffix(&expected_base, ".mp3")).unwrap())
        );
        assert_eq!(
            report.caption_path,
            Some(std::path::absolute(path_with_suffix(&expected_base, ".en.vtt")).unwrap())
        );
        let transcript = report.transcript_path.clone().unwrap();
        assert_eq!(
            transcript,
            std::path::absolute(path_with_suffix(&expected_base, ".en.txt")).unwrap()
        );
        assert_eq!(fs_err::read_to_string(&transcript).unwrap(), "stub");
        assert_eq!(log.calls(), ["title", "video", "audio", "captions:en"]);
    }

    #[tokio::test]
    async fn existing_artifacts_are_reused_when_skipping() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("Stable.mp4"), b"old video").unwrap();
        fs_err::write(dir.path().join("Stable.mp3"), b"old audio").unwrap();
        fs_err::write(dir.path().join("Stable.en.vtt"), "WEBVTT\n\nHello\n").unwrap();

        let log = CallLog::default();
        let stub = StubFetcher::new("Stable", log.clone());

        let report = pipeline(stub).run(URL, dir.path(), true).await;

        assert_eq!(log.calls(), ["title"]);
        assert_eq!(report.error, None);
        assert_eq!(
            report.video_path,
            Some(std::path::absolute(dir.path().join("Stable.mp4")).unwrap())
        );
        assert_eq!(
            report.caption_path,
            Some(std::path::absolute(dir.path().join("Stable.en.vtt")).unwrap())
        );
        let transcript = report.transcript_path.unwrap();
        assert_eq!(fs_err::read_to_string(transcript).unwrap(), "Hello");
    }

    #[tokio::test]
    async fn force_mode_redownloads_existing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("Stable.mp4"), b"old video").unwrap();
        fs_err::write(dir.path().join("Stable.mp3"), b"old audio").unwrap();

        let log = CallLog::default();
        let mut stub = StubFetcher::new("Stable", log.clone());
        stub.language_caption = Some(".en.vtt");

        let report = pipeline(stub).run(URL, dir.path(), false).await;

        assert_eq!(report.error, None);
        assert_eq!(log.calls(), ["title", "video", "audio", "captions:en"]);
        assert_eq!(
            fs_err::read_to_string(dir.path().join("Stable.mp4")).unwrap(),
            "stub"
        );
    }

    #[tokio::test]
    async fn caption_fallback_takes_any_language() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::default();
        let mut stub = StubFetcher::new("Clip", log.clone());
        stub.any_caption = Some(".fr.vtt");

        let report = pipeline(stub).run(URL, dir.path(), true).await;

        assert_eq!(report.error, None);
        assert_eq!(
            log.calls(),
            ["title", "video", "audio", "captions:en", "captions:any"]
        );
        assert_eq!(
            report.caption_path,
            Some(std::path::absolute(dir.path().join("Clip.fr.vtt")).unwrap())
        );
        assert_eq!(
            report.transcript_path,
            Some(std::path::absolute(dir.path().join("Clip.fr.txt")).unwrap())
        );
    }

    #[tokio::test]
    async fn caption_failure_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::default();
        let mut stub = StubFetcher::new("Clip", log.clone());
        stub.fail_captions = true;

        let report = pipeline(stub).run(URL, dir.path(), true).await;

        assert_eq!(report.error, None);
        assert!(report.video_path.is_some());
        assert!(report.audio_path.is_some());
        assert_eq!(report.caption_path, None);
        assert_eq!(report.transcript_path, None);
        assert_eq!(log.calls(), ["title", "video", "audio", "captions:en"]);
    }

    #[tokio::test]
    async fn video_failure_stops_the_run_with_a_command_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::default();
        let mut stub = StubFetcher::new("Clip", log.clone());
        stub.fail_video = true;

        let report = pipeline(stub).run(URL, dir.path(), true).await;

        let error = report.error.unwrap();
        assert!(error.starts_with("Command failed:"), "{}", error);
        assert!(error.contains("boom"), "{}", error);
        assert_eq!(report.video_path, None);
        assert_eq!(report.audio_path, None);
        assert_eq!(log.calls(), ["title", "video"]);
    }

    #[tokio::test]
    async fn audio_failure_keeps_the_downloaded_video_in_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::default();
        let mut stub = StubFetcher::new("Clip", log.clone());
        stub.fail_audio = true;

        let report = pipeline(stub).run(URL, dir.path(), true).await;

        assert!(report.error.unwrap().starts_with("Command failed:"));
        assert!(report.video_path.is_some());
        assert_eq!(report.audio_path, None);
        assert_eq!(report.caption_path, None);
        assert_eq!(log.calls(), ["title", "video", "audio"]);
    }

    #[tokio::test]
    async fn rejected_url_reports_a_generic_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = CallLog::default();
        let stub = StubFetcher::new("Clip", log.clone());

        let report = pipeline(stub).run("not a url", dir.path(), true).await;

        let error = report.error.unwrap();
        assert!(error.starts_with("An error occurred:"), "{}", error);
        assert_eq!(log.calls(), Vec::<String>::new());
        assert_eq!(report.video_path, None);
    }

    #[tokio::test]
    async fn missing_output_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("media").join("downloads");
        let log = CallLog::default();
        let stub = StubFetcher::new("Clip", log.clone());

        let report = pipeline(stub).run(URL, &nested, true).await;

        assert_eq!(report.error, None);
        assert!(nested.is_dir());
        assert!(nested.join("Clip.mp4").exists());
    }

    #[test]
    fn caption_scan_picks_the_first_name_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs_err::write(dir.path().join("Clip.fr.srt"), b"x").unwrap();
        fs_err::write(dir.path().join("Clip.de.vtt"), b"x").unwrap();
        fs_err::write(dir.path().join("Unrelated.vtt"), b"x").unwrap();
        fs_err::write(dir.path().join("Clip.mp4"), b"x").unwrap();

        let subject = pipeline(StubFetcher::new("Clip", CallLog::default()));
        let found = subject
            .scan_for_captions(dir.path(), &dir.path().join("Clip"))
            .unwrap();

        assert_eq!(found, Some(dir.path().join("Clip.de.vtt")));
    }

    #[test]
    fn suffixes_append_without_touching_existing_dots() {
        assert_eq!(
            path_with_suffix(Path::new("downloads/My Clip_ v2_1"), ".en.vtt"),
            PathBuf::from("downloads/My Clip_ v2_1.en.vtt")
        );
    }
}
