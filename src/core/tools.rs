use crate::config::Config;
use crate::core::analysis;
use crate::core::comments::{
    CommentBatch, CommentOrder, CommentRecord, CommentRetriever, PageProgress, RetrievalOptions,
    TextFormat,
};
use crate::core::locator::{Resolver, VideoReference, thumbnail_url};
use crate::core::storage::StorageService;
use crate::core::summary::SummaryService;
use crate::core::transcript::{TranscriptService, plain_text_from_saved, preview};
use crate::core::youtube::{YouTubeDataApi, fetch_thumbnail, http_client};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use tracing::{info, warn};
use unicode_width::UnicodeWidthStr;

pub const BEST_PAGE_SIZE: u32 = 50;
pub const BEST_TOP_RANGE: RangeInclusive<u32> = 1..=50;
pub const DEFAULT_BEST_TOP: u32 = 3;
pub const PAGE_RANGE: RangeInclusive<u32> = 1..=10;
pub const DEFAULT_SEARCH_PAGES: u32 = 3;
pub const DEFAULT_WORD_PAGES: u32 = 5;
pub const DEFAULT_WORD_TOP: u32 = 30;
pub const TRANSCRIPT_PREVIEW_CHARS: usize = 1000;

const LISTING_PAGE_SIZE: u32 = 100;
const WRAP_WIDTH: usize = 88;
const BAR_WIDTH: usize = 30;

/// One invocation of a tool, as entered on the command line or in a TUI form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    Best {
        link: String,
        top: u32,
    },
    Search {
        link: String,
        keyword: String,
        pages: u32,
        order: CommentOrder,
        save: bool,
        keep_partial: bool,
    },
    Words {
        link: String,
        pages: u32,
        top: u32,
        keep_partial: bool,
    },
    Thumbnail {
        link: String,
        download: bool,
    },
    Summarize {
        link: String,
        languages: Vec<String>,
        refresh: bool,
    },
}

/// Intermediate steps reported while a tool runs.
#[derive(Debug, Clone)]
pub enum ToolEvent {
    Status(String),
    Page { progress: PageProgress, ceiling: u32 },
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub title: String,
    pub body: String,
    pub saved: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CommentExport<'a> {
    video_id: &'a VideoReference,
    keyword: &'a str,
    order: CommentOrder,
    exported_at: DateTime<Utc>,
    scanned: usize,
    comments: &'a [CommentRecord],
}

#[derive(Clone)]
pub struct Toolkit {
    config: Config,
    client: Client,
    storage: StorageService,
    resolver: Resolver,
}

impl Toolkit {
    pub fn new(config: Config, storage: StorageService) -> Result<Self> {
        Ok(Self {
            resolver: if config.links_only {
                Resolver::links_only()
            } else {
                Resolver::default()
            },
            config,
            client: http_client()?,
            storage,
        })
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub async fn run<F>(&self, request: &ToolRequest, mut events: F) -> Result<ToolOutput>
    where
        F: FnMut(ToolEvent) + Send,
    {
        match request {
            ToolRequest::Best { link, top } => self.best(link, *top, &mut events).await,
            ToolRequest::Search {
                link,
                keyword,
                pages,
                order,
                save,
                keep_partial,
            } => {
                let options = listing_options(*pages, *keep_partial)?.ordered_by(*order);
                self.search(link, keyword, options, *save, &mut events)
                    .await
            }
            ToolRequest::Words {
                link,
                pages,
                top,
                keep_partial,
            } => {
                let options = listing_options(*pages, *keep_partial)?;
                self.words(link, options, *top, &mut events).await
            }
            ToolRequest::Thumbnail { link, download } => {
                self.thumbnail(link, *download, &mut events).await
            }
            ToolRequest::Summarize {
                link,
                languages,
                refresh,
            } => {
                self.summarize(link, languages, *refresh, &mut events)
                    .await
            }
        }
    }

    fn video(&self, link: &str) -> Result<VideoReference> {
        Ok(self.resolver.resolve(link)?)
    }

    fn youtube(&self) -> Result<YouTubeDataApi> {
        let key = self.config.credentials.youtube()?;
        Ok(YouTubeDataApi::new(
            self.client.clone(),
            self.config.api_base_url.as_str(),
            key,
        ))
    }

    async fn collect<F>(
        &self,
        video: &VideoReference,
        options: &RetrievalOptions,
        events: &mut F,
    ) -> Result<CommentBatch>
    where
        F: FnMut(ToolEvent) + Send,
    {
        let retriever = CommentRetriever::new(self.youtube()?);
        let ceiling = options.page_ceiling;

        events(ToolEvent::Status(format!("Fetching comments for {video}")));
        let batch = retriever
            .fetch_comments_with_progress(video, options, |progress| {
                events(ToolEvent::Page { progress, ceiling })
            })
            .await?;

        Ok(batch)
    }

    async fn best<F>(&self, link: &str, top: u32, events: &mut F) -> Result<ToolOutput>
    where
        F: FnMut(ToolEvent) + Send,
    {
        let video = self.video(link)?;
        if !BEST_TOP_RANGE.contains(&top) {
            return Err(Error::custom(format!(
                "Number of comments must be between {} and {}",
                BEST_TOP_RANGE.start(),
                BEST_TOP_RANGE.end()
            )));
        }

        let options = RetrievalOptions::pages(1)
            .with_page_size(BEST_PAGE_SIZE)
            .ordered_by(CommentOrder::Relevance)
            .with_text_format(TextFormat::Html);

        events(ToolEvent::Status(format!("Fetching comments for {video}")));
        let batch = CommentRetriever::new(self.youtube()?)
            .fetch_comments(&video, &options)
            .await?;

        let records: Vec<CommentRecord> = batch
            .records
            .into_iter()
            .map(|mut record| {
                record.text = analysis::to_plain_text(&record.text);
                record
            })
            .collect();
        let best = analysis::top_by_popularity(records, top as usize);

        let body = if best.is_empty() {
            "No comments found.".to_string()
        } else {
            render_comments(&best)
        };

        Ok(ToolOutput {
            title: format!("Top {} comments for {video}", best.len()),
            body,
            saved: Vec::new(),
        })
    }

    async fn search<F>(
        &self,
        link: &str,
        keyword: &str,
        options: RetrievalOptions,
        save: bool,
        events: &mut F,
    ) -> Result<ToolOutput>
    where
        F: FnMut(ToolEvent) + Send,
    {
        let video = self.video(link)?;
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::custom("Enter a keyword to search for"));
        }

        let batch = self.collect(&video, &options, events).await?;
        let scanned = batch.records.len();

        let mut matches = analysis::filter_by_keyword(&batch.records, keyword);
        analysis::sort_by_popularity(&mut matches);
        info!(video_id = %video, keyword, scanned, matched = matches.len(), "Comment search finished");

        let mut body = match_headline(scanned, matches.len(), keyword);
        if let Some(note) = interruption_note(&batch) {
            body.push_str(&format!("\n{note}"));
        }
        if !matches.is_empty() {
            body.push_str("\n\n");
            body.push_str(&render_comments(&matches));
        }

        let mut saved = Vec::new();
        if save {
            let export = CommentExport {
                video_id: &video,
                keyword,
                order: options.order,
                exported_at: Utc::now(),
                scanned,
                comments: &matches,
            };
            let path = self.storage.save_comments(&video, &export).await?;
            body.push_str(&format!("\n\nSaved to {}", path.display()));
            saved.push(path);
        }

        Ok(ToolOutput {
            title: format!("Comments about \"{keyword}\" on {video}"),
            body,
            saved,
        })
    }

    async fn words<F>(
        &self,
        link: &str,
        options: RetrievalOptions,
        top: u32,
        events: &mut F,
    ) -> Result<ToolOutput>
    where
        F: FnMut(ToolEvent) + Send,
    {
        let video = self.video(link)?;
        if top == 0 {
            return Err(Error::custom("Number of words must be at least 1"));
        }
        let batch = self.collect(&video, &options, events).await?;

        let frequencies = analysis::word_frequencies(
            batch.records.iter().map(|record| record.text.as_str()),
            top as usize,
        );

        let mut body = String::new();
        if let Some(note) = interruption_note(&batch) {
            body.push_str(&note);
            body.push_str("\n\n");
        }
        if frequencies.is_empty() {
            body.push_str("No words to count.");
        } else {
            body.push_str(&render_word_table(&frequencies));
        }

        Ok(ToolOutput {
            title: format!(
                "Most frequent words in {} comments on {video}",
                batch.records.len()
            ),
            body,
            saved: Vec::new(),
        })
    }

    async fn thumbnail<F>(&self, link: &str, download: bool, events: &mut F) -> Result<ToolOutput>
    where
        F: FnMut(ToolEvent) + Send,
    {
        let video = self.video(link)?;
        let url = thumbnail_url(&video);
        let mut body = url.clone();
        let mut saved = Vec::new();

        if download {
            events(ToolEvent::Status("Downloading thumbnail".to_string()));
            let image = fetch_thumbnail(&self.client, &video).await?;
            let path = self.storage.save_thumbnail(&video, &image).await?;
            body.push_str(&format!("\n\nSaved to {}", path.display()));
            saved.push(path);
        }

        Ok(ToolOutput {
            title: format!("Thumbnail for {video}"),
            body,
            saved,
        })
    }

    async fn summarize<F>(
        &self,
        link: &str,
        languages: &[String],
        refresh: bool,
        events: &mut F,
    ) -> Result<ToolOutput>
    where
        F: FnMut(ToolEvent) + Send,
    {
        let video = self.video(link)?;
        let youtube = self.youtube()?;
        let openai_key = self.config.credentials.openai()?;
        let mut saved = Vec::new();

        events(ToolEvent::Status("Looking up the video title".to_string()));
        let title = match youtube.video_title(&video).await {
            Ok(title) => title,
            Err(err) => {
                warn!(video_id = %video, error = %err, "Could not fetch video title");
                None
            }
        };

        let transcript = if !refresh && self.storage.transcript_exists(&video) {
            events(ToolEvent::Status("Using the saved transcript".to_string()));
            plain_text_from_saved(&self.storage.load_transcript(&video).await?)
        } else {
            events(ToolEvent::Status("Fetching transcript".to_string()));
            let fetched = TranscriptService::new()?
                .fetch_transcript(&video, languages)
                .await?;
            let path = self
                .storage
                .save_transcript(&video, &TranscriptService::format_transcript(&fetched))
                .await?;
            saved.push(path);
            TranscriptService::plain_text(&fetched)
        };

        if transcript.trim().is_empty() {
            return Err(Error::custom("The transcript for this video is empty"));
        }

        events(ToolEvent::Status(format!(
            "Summarizing with {}",
            self.config.model
        )));
        let summary = SummaryService::new(
            openai_key,
            self.config.model.as_str(),
            self.config.summary_language.as_str(),
        )
        .summarize(&transcript, title.as_deref())
        .await?;

        let document = render_summary_document(&video, title.as_deref(), &summary);
        let path = self.storage.save_summary(&video, &document).await?;

        let body = format!(
            "Title: {}\n\nTranscript preview\n{}\n\n{summary}\n\nSaved to {}",
            title.as_deref().unwrap_or("(unavailable)"),
            preview(&transcript, TRANSCRIPT_PREVIEW_CHARS),
            path.display()
        );
        saved.push(path);

        Ok(ToolOutput {
            title: format!("Summary of {}", title.as_deref().unwrap_or(video.as_str())),
            body,
            saved,
        })
    }
}

fn listing_options(pages: u32, keep_partial: bool) -> Result<RetrievalOptions> {
    if !PAGE_RANGE.contains(&pages) {
        return Err(Error::custom(format!(
            "Number of pages must be between {} and {}",
            PAGE_RANGE.start(),
            PAGE_RANGE.end()
        )));
    }

    Ok(RetrievalOptions::pages(pages)
        .with_page_size(LISTING_PAGE_SIZE)
        .with_text_format(TextFormat::PlainText)
        .keep_partial(keep_partial))
}

fn match_headline(scanned: usize, matched: usize, keyword: &str) -> String {
    match (scanned, matched) {
        (0, _) => "No comments found.".to_string(),
        (_, 0) => format!("None of the {scanned} comments mention \"{keyword}\"."),
        _ => format!("{matched} of {scanned} comments mention \"{keyword}\"."),
    }
}

fn interruption_note(batch: &CommentBatch) -> Option<String> {
    batch.interrupted.as_ref().map(|err| {
        format!(
            "Stopped after {} page(s): {err}",
            batch.pages_fetched
        )
    })
}

pub fn render_comments(records: &[CommentRecord]) -> String {
    let indent = "    ";
    let options = textwrap::Options::new(WRAP_WIDTH)
        .initial_indent(indent)
        .subsequent_indent(indent);

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "#{} {} · 👍 {} · {}\n{}",
                i + 1,
                record.author,
                record.popularity,
                format_published(&record.published_at),
                textwrap::fill(&record.text, &options)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_word_table(words: &[(String, usize)]) -> String {
    let width = words.iter().map(|(word, _)| word.width()).max().unwrap_or(0);
    let max = words.first().map(|(_, count)| *count).unwrap_or(1).max(1);

    words
        .iter()
        .enumerate()
        .map(|(i, (word, count))| {
            let pad = " ".repeat(width - word.width());
            let bar = "█".repeat((count * BAR_WIDTH).div_ceil(max));
            format!("{:>3}. {word}{pad}  {count:>5}  {bar}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_summary_document(video: &VideoReference, title: Option<&str>, summary: &str) -> String {
    format!(
        "# {}\n\n- Video: https://www.youtube.com/watch?v={video}\n- Generated: {}\n\n{summary}\n",
        title.unwrap_or("Video summary"),
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    )
}

fn format_published(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, OPENAI_API_KEY_ENV, YT_API_KEY_ENV};
    use crate::core::comments::RetrievalError;

    fn toolkit(youtube: Option<&str>, openai: Option<&str>) -> (Toolkit, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            credentials: Credentials::new(youtube.map(String::from), openai.map(String::from)),
            ..Config::default()
        };
        let toolkit = Toolkit::new(config, StorageService::new(dir.path())).unwrap();
        (toolkit, dir)
    }

    fn record(author: &str, text: &str, likes: u64) -> CommentRecord {
        CommentRecord {
            author: author.to_string(),
            text: text.to_string(),
            popularity: likes,
            published_at: "2024-03-01T10:15:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn invalid_links_fail_before_credentials() {
        let (toolkit, _dir) = toolkit(None, None);
        let request = ToolRequest::Best {
            link: "https://vimeo.com/123".to_string(),
            top: 3,
        };
        let err = toolkit.run(&request, |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::Unresolved(_)));
    }

    #[tokio::test]
    async fn missing_youtube_key_is_reported() {
        let (toolkit, _dir) = toolkit(None, None);
        let request = ToolRequest::Words {
            link: "https://youtu.be/abc12345678".to_string(),
            pages: 2,
            top: 10,
            keep_partial: false,
        };
        let err = toolkit.run(&request, |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(YT_API_KEY_ENV)));
    }

    #[tokio::test]
    async fn summaries_need_both_keys() {
        let (toolkit, _dir) = toolkit(Some("yt-key"), None);
        let request = ToolRequest::Summarize {
            link: "https://youtu.be/abc12345678".to_string(),
            languages: vec!["ko".to_string()],
            refresh: false,
        };
        let err = toolkit.run(&request, |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(OPENAI_API_KEY_ENV)));
    }

    #[tokio::test]
    async fn blank_keyword_is_rejected_before_any_request() {
        let (toolkit, _dir) = toolkit(None, None);
        let request = ToolRequest::Search {
            link: "https://youtu.be/abc12345678".to_string(),
            keyword: "   ".to_string(),
            pages: 3,
            order: CommentOrder::Relevance,
            save: false,
            keep_partial: false,
        };
        let err = toolkit.run(&request, |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::Custom(_)));
    }

    #[tokio::test]
    async fn out_of_range_arguments_are_rejected() {
        let (toolkit, _dir) = toolkit(Some("yt-key"), None);
        let best = ToolRequest::Best {
            link: "abc12345678".to_string(),
            top: 51,
        };
        assert!(matches!(
            toolkit.run(&best, |_| {}).await,
            Err(Error::Custom(_))
        ));

        let words = ToolRequest::Words {
            link: "abc12345678".to_string(),
            pages: 0,
            top: 10,
            keep_partial: false,
        };
        assert!(matches!(
            toolkit.run(&words, |_| {}).await,
            Err(Error::Custom(_))
        ));
    }

    #[tokio::test]
    async fn zero_words_is_rejected_before_any_request() {
        let (toolkit, _dir) = toolkit(None, None);
        let request = ToolRequest::Words {
            link: "abc12345678".to_string(),
            pages: 2,
            top: 0,
            keep_partial: false,
        };
        let err = toolkit.run(&request, |_| {}).await.unwrap_err();
        assert_eq!(err.to_string(), "Number of words must be at least 1");
    }

    #[tokio::test]
    async fn links_only_config_rejects_bare_ids() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            links_only: true,
            ..Config::default()
        };
        let toolkit = Toolkit::new(config, StorageService::new(dir.path())).unwrap();

        let bare = ToolRequest::Thumbnail {
            link: "abc12345678".to_string(),
            download: false,
        };
        assert!(matches!(
            toolkit.run(&bare, |_| {}).await,
            Err(Error::Unresolved(_))
        ));

        let link = ToolRequest::Thumbnail {
            link: "https://youtu.be/abc12345678".to_string(),
            download: false,
        };
        assert!(toolkit.run(&link, |_| {}).await.is_ok());
    }

    #[tokio::test]
    async fn thumbnail_link_needs_no_key() {
        let (toolkit, _dir) = toolkit(None, None);
        let request = ToolRequest::Thumbnail {
            link: "https://www.youtube.com/shorts/abc12345678".to_string(),
            download: false,
        };
        let output = toolkit.run(&request, |_| {}).await.unwrap();
        assert_eq!(
            output.body,
            "https://img.youtube.com/vi/abc12345678/maxresdefault.jpg"
        );
        assert!(output.saved.is_empty());
    }

    #[test]
    fn comments_render_with_rank_and_wrapped_text() {
        let long = "word ".repeat(40);
        let rendered = render_comments(&[record("Kim", "short", 12), record("Lee", &long, 3)]);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "#1 Kim · 👍 12 · 2024-03-01 10:15");
        assert_eq!(lines[1], "    short");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "#2 Lee · 👍 3 · 2024-03-01 10:15");
        assert!(lines[4..].len() > 1);
        assert!(lines[4..].iter().all(|line| line.starts_with("    word")));
        assert!(lines.iter().all(|line| line.width() <= WRAP_WIDTH));
    }

    #[test]
    fn unparsable_dates_are_shown_verbatim() {
        assert_eq!(format_published("yesterday"), "yesterday");
        assert_eq!(format_published(""), "");
    }

    #[test]
    fn word_table_aligns_wide_characters() {
        let table = render_word_table(&[("안녕".to_string(), 4), ("hi".to_string(), 2)]);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("  1. 안녕      4  "));
        assert!(lines[1].starts_with("  2. hi        2  "));
        assert_eq!(lines[0].matches('█').count(), BAR_WIDTH);
        assert_eq!(lines[1].matches('█').count(), BAR_WIDTH / 2);
    }

    #[test]
    fn search_headline_distinguishes_empty_listings() {
        assert_eq!(match_headline(0, 0, "fractions"), "No comments found.");
        assert_eq!(
            match_headline(120, 0, "fractions"),
            "None of the 120 comments mention \"fractions\"."
        );
        assert_eq!(
            match_headline(120, 4, "fractions"),
            "4 of 120 comments mention \"fractions\"."
        );
    }

    #[test]
    fn interrupted_batches_get_a_note() {
        let batch = CommentBatch {
            records: vec![record("a", "b", 1)],
            pages_fetched: 2,
            interrupted: Some(RetrievalError::upstream("HTTP 500: boom")),
        };
        assert_eq!(
            interruption_note(&batch).as_deref(),
            Some("Stopped after 2 page(s): YouTube request failed: HTTP 500: boom")
        );
        assert!(interruption_note(&CommentBatch::default()).is_none());
    }

    #[test]
    fn listing_options_follow_arguments() {
        let options = listing_options(4, true).unwrap();
        assert_eq!(options.page_ceiling, 4);
        assert_eq!(options.page_size, LISTING_PAGE_SIZE);
        assert_eq!(options.text_format, TextFormat::PlainText);
        assert!(options.return_partial_on_failure);
        assert!(listing_options(11, false).is_err());
    }
}
