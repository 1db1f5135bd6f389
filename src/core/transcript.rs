use crate::core::locator::VideoReference;
use crate::error::{Error, Result};
use yt_transcript_rs::{FetchedTranscript, api::YouTubeTranscriptApi};

/// Korean first, then English.
pub const DEFAULT_LANGUAGES: &str = "ko,en";

#[derive(Clone)]
pub struct TranscriptService {
    api: YouTubeTranscriptApi,
}

impl TranscriptService {
    pub fn new() -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| Error::custom(format!("Failed to initialise transcript client: {e}")))?;
        Ok(Self { api })
    }

    /// Fetches the first transcript available in `languages`, in order of preference.
    pub async fn fetch_transcript(
        &self,
        video: &VideoReference,
        languages: &[String],
    ) -> Result<FetchedTranscript> {
        let languages: Vec<&str> = languages.iter().map(String::as_str).collect();

        match self
            .api
            .fetch_transcript(video.as_str(), &languages, false)
            .await
        {
            Ok(transcript) => Ok(transcript),
            Err(e) => Err(Error::custom(format!(
                "No usable transcript for this video ({}): {e}",
                languages.join("/")
            ))),
        }
    }

    pub fn format_transcript(transcript: &FetchedTranscript) -> Vec<String> {
        transcript
            .snippets
            .iter()
            .map(|snippet| format_line(&snippet.text, snippet.start, snippet.duration))
            .collect()
    }

    /// Snippet texts joined by spaces, without timestamps.
    pub fn plain_text(transcript: &FetchedTranscript) -> String {
        let parts: Vec<&str> = transcript
            .snippets
            .iter()
            .map(|snippet| snippet.text.trim())
            .filter(|text| !text.is_empty())
            .collect();
        parts.join(" ")
    }
}

pub fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Recovers the plain text of a transcript saved by [`TranscriptService::format_transcript`].
pub fn plain_text_from_saved(content: &str) -> String {
    let parts: Vec<&str> = content
        .lines()
        .map(|line| {
            let line = line.trim();
            match (line.starts_with('['), line.find("] ")) {
                (true, Some(end)) => line[end + 2..].trim(),
                _ => line,
            }
        })
        .filter(|text| !text.is_empty())
        .collect();
    parts.join(" ")
}

/// The first `max_chars` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() < text.len() {
        format!("{head}...")
    } else {
        head.to_string()
    }
}

fn format_line(text: &str, start: f64, duration: f64) -> String {
    let from = format_timestamp(start);
    let to = format_timestamp(start + duration);
    format!("[{from} - {to}] {}", text.trim())
}

fn format_timestamp(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1_000;
    let millis = total_millis % 1_000;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
    } else {
        format!("{minutes:02}:{secs:02}.{millis:03}")
    }
}
