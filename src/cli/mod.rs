use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ytfetch",
    about = "ytfetch - Download a video, its audio track, and a plain-text caption transcript using yt-dlp",
    version,
    long_about = "A CLI tool that drives yt-dlp to download a video, extract its audio track, and fetch its captions, then strips the caption file down to a plain-text transcript. Artifacts are named after the video title and reused on later runs unless --force is given."
)]
pub struct Cli {
    /// Source URL to download (anything yt-dlp accepts)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Directory for downloaded files (defaults to the configured output directory)
    #[arg(value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Redownload files even when they already exist locally
    #[arg(long)]
    pub force: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_alone_parses_with_defaults() {
        let cli = Cli::try_parse_from(["ytfetch", "https://example.com/v/1"]).unwrap();
        assert_eq!(cli.url, "https://example.com/v/1");
        assert_eq!(cli.output_dir, None);
        assert!(!cli.force);
        assert!(!cli.verbose);
        assert!(!cli.quiet);
    }

    #[test]
    fn second_positional_is_the_output_directory() {
        let cli = Cli::try_parse_from(["ytfetch", "https://example.com/v/1", "media/out"]).unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("media/out")));
    }

    #[test]
    fn force_flag_is_recognized() {
        let cli = Cli::try_parse_from(["ytfetch", "--force", "https://example.com/v/1"]).unwrap();
        assert!(cli.force);
    }

    #[test]
    fn missing_url_is_rejected() {
        assert!(Cli::try_parse_from(["ytfetch"]).is_err());
    }
}
