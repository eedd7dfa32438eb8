//! Caption cleanup: turn a WebVTT or SubRip file into plain transcript text.
//!
//! The cleaner is deliberately not a parser. It runs a fixed sequence of
//! regex passes over the whole document, each removing one kind of
//! structural metadata, and leaves anything it does not recognize alone.
//! Malformed cues therefore never fail; at worst they pass through.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;

/// Caption conventions produced by yt-dlp. WebVTT carries a file-level
/// `WEBVTT` header block; SubRip does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    Vtt,
    Srt,
}

impl CaptionFormat {
    /// Picks the format from the file extension. Only a literal `vtt`
    /// extension selects WebVTT; everything else is treated as SubRip,
    /// whose passes are a subset of the WebVTT ones.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("vtt") => CaptionFormat::Vtt,
            _ => CaptionFormat::Srt,
        }
    }
}

// The `WEBVTT` header and any metadata lines after it, through the first
// blank line.
static VTT_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)WEBVTT.*?\n\n").unwrap());

// A cue index line paired with its timing line, including any styling
// directives trailing the timestamps.
static INDEXED_TIMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*\n\s*\d{2}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[,.]\d{3}.*?\n")
        .unwrap()
});

// A timing line with no index in front of it.
static BARE_TIMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{2}:\d{2}:\d{2}[,.]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[,.]\d{3}.*?\n").unwrap()
});

// A run of blank lines, trailing whitespace included.
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

// Empty parentheses left behind where a sound description was dropped.
static EMPTY_PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s*\)").unwrap());

// A leftover cue number alone on its line.
static BARE_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\d+$").unwrap());

/// Strips timing and structural metadata from caption text, keeping the
/// displayed lines in their original order.
///
/// The passes run in a fixed order. Paired index/timing removal has to
/// precede the bare-index pass, otherwise the index line of a pair would
/// be consumed on its own and the pair pattern would no longer match the
/// remaining timing line.
pub fn strip_caption_markup(content: &str, format: CaptionFormat) -> String {
    let mut text = match format {
        CaptionFormat::Vtt => VTT_HEADER.replace_all(content, "").into_owned(),
        CaptionFormat::Srt => content.to_owned(),
    };

    text = INDEXED_TIMING.replace_all(&text, "\n").into_owned();
    text = BARE_TIMING.replace_all(&text, "\n").into_owned();
    text = BLANK_RUN.replace_all(&text, "\n").into_owned();
    text = EMPTY_PARENS.replace_all(&text, "").into_owned();
    text = BARE_INDEX.replace_all(&text, "").into_owned();

    text.trim().to_string()
}

/// Derives a plain-text transcript from a caption file.
///
/// Reads `caption_path`, strips the markup, and writes the result beside
/// the input with a `.txt` extension, replacing any previous transcript.
/// Returns the transcript path, or `None` when the caption file does not
/// exist. Caption content never causes an error here; only I/O can.
pub fn extract_plain_text(caption_path: &Path) -> Result<Option<PathBuf>> {
    if !caption_path.exists() {
        return Ok(None);
    }

    let raw = fs_err::read_to_string(caption_path)?;
    // The patterns expect `\n` line endings, whatever the file used.
    let raw = raw.replace("\r\n", "\n").replace('\r', "\n");

    let text = strip_caption_markup(&raw, CaptionFormat::from_path(caption_path));

    let transcript_path = caption_path.with_extension("txt");
    fs_err::write(&transcript_path, &text)?;

    Ok(Some(transcript_path))
}
