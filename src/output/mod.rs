use console::style;
use std::path::PathBuf;

use crate::pipeline::FetchReport;

/// Render the summary block: one line per artifact, with `Not available`
/// standing in for anything the run could not produce.
pub fn format_summary(report: &FetchReport) -> String {
    format!(
        "Video: {}\nAudio: {}\nCaptions: {}\nText-only captions: {}",
        display_path(&report.video_path),
        display_path(&report.audio_path),
        display_path(&report.caption_path),
        display_path(&report.transcript_path),
    )
}

/// Print the summary to the console
pub fn print_summary(report: &FetchReport) {
    println!();
    println!("{}", style("Download Summary:").bold());
    println!("{}", format_summary(report));
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "Not available".to_string(),
    }
}
